//! Request signing seam.
//!
//! Open Payments servers authenticate clients with HTTP message signatures
//! over the method, target URI, `Authorization` and `Content-Digest`. The
//! signature itself is produced by a [`RequestSigner`] implementation that
//! holds the client's key; [`ContentDigestSigner`] only supplies the digest.

use base64::Engine;
use sha2::{Digest, Sha256};

use crate::error::OpenPaymentsError;

/// The parts of an outgoing request covered by a signature.
#[derive(Debug, Clone, Copy)]
pub struct SignatureRequest<'a> {
    pub method: &'a str,
    pub url: &'a str,
    pub authorization: Option<&'a str>,
    pub body: Option<&'a [u8]>,
}

/// Produces the headers that authenticate a request.
pub trait RequestSigner: Send + Sync {
    fn signature_headers(
        &self,
        request: &SignatureRequest<'_>,
    ) -> Result<Vec<(&'static str, String)>, OpenPaymentsError>;
}

/// Attaches `Content-Digest` to requests with a body.
#[derive(Debug, Clone, Copy, Default)]
pub struct ContentDigestSigner;

impl RequestSigner for ContentDigestSigner {
    fn signature_headers(
        &self,
        request: &SignatureRequest<'_>,
    ) -> Result<Vec<(&'static str, String)>, OpenPaymentsError> {
        Ok(request
            .body
            .map(|body| vec![("Content-Digest", content_digest(body))])
            .unwrap_or_default())
    }
}

/// RFC 9530 `Content-Digest` value: `sha-256=:<base64 digest>:`.
pub fn content_digest(body: &[u8]) -> String {
    let digest = Sha256::digest(body);
    format!(
        "sha-256=:{}:",
        base64::engine::general_purpose::STANDARD.encode(digest)
    )
}
