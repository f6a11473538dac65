//! Wallet addresses and payment pointers.
//!
//! A payment pointer (`$ilp.example/alice`) is shorthand for the HTTPS wallet
//! address URL (`https://ilp.example/alice`). Every operation that accepts a
//! wallet address from a caller normalizes it with [`normalize_wallet_address`]
//! before use.

use serde::{Deserialize, Serialize};
use url::Url;

use crate::client::OpenPaymentsClient;
use crate::constants::PAYMENT_POINTER_SCHEME;
use crate::error::OpenPaymentsError;

/// Metadata published at a wallet address URL.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WalletAddress {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub public_name: Option<String>,
    pub asset_code: String,
    pub asset_scale: u8,
    pub auth_server: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resource_server: Option<String>,
}

impl WalletAddress {
    /// Origin of the wallet address URL, where its resource server lives.
    pub fn resource_origin(&self) -> Result<String, OpenPaymentsError> {
        let url = Url::parse(&self.id).map_err(|e| {
            OpenPaymentsError::invalid(format!("wallet address id is not a URL: {e}"))
        })?;
        Ok(origin_of(&url))
    }
}

/// Expand a leading `$` into `https://`. Anything else passes through unchanged.
pub fn normalize_wallet_address(raw: &str) -> String {
    match raw.strip_prefix('$') {
        Some(rest) => format!("{PAYMENT_POINTER_SCHEME}{rest}"),
        None => raw.to_string(),
    }
}

/// Validate and normalize a caller-supplied wallet address into a URL.
pub fn parse_wallet_address(raw: &str) -> Result<Url, OpenPaymentsError> {
    if raw.trim().is_empty() {
        return Err(OpenPaymentsError::invalid("wallet address is required"));
    }

    let normalized = normalize_wallet_address(raw);
    let url = Url::parse(&normalized)
        .map_err(|e| OpenPaymentsError::invalid(format!("malformed wallet address {raw:?}: {e}")))?;

    if !matches!(url.scheme(), "http" | "https") {
        return Err(OpenPaymentsError::invalid(format!(
            "wallet address must be an http(s) URL, got scheme {:?}",
            url.scheme()
        )));
    }
    if url.host_str().is_none() {
        return Err(OpenPaymentsError::invalid("wallet address must have a host"));
    }

    Ok(url)
}

/// `scheme://host[:port]` of a URL.
pub fn origin_of(url: &Url) -> String {
    url.origin().ascii_serialization()
}

/// Validate, normalize and resolve a wallet address to its published metadata.
///
/// Metadata is fetched on every call.
pub async fn resolve_wallet_address<C>(
    client: &C,
    raw: &str,
) -> Result<WalletAddress, OpenPaymentsError>
where
    C: OpenPaymentsClient + ?Sized,
{
    let url = parse_wallet_address(raw)?;
    let wallet = client.resolve_wallet(&url).await?;
    tracing::debug!(
        wallet = %wallet.id,
        auth_server = %wallet.auth_server,
        asset = %wallet.asset_code,
        "resolved wallet address"
    );
    Ok(wallet)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_payment_pointer() {
        assert_eq!(
            normalize_wallet_address("$ilp.example/alice"),
            "https://ilp.example/alice"
        );
    }

    #[test]
    fn test_normalize_replaces_only_leading_dollar() {
        assert_eq!(
            normalize_wallet_address("$ilp.example/$alice"),
            "https://ilp.example/$alice"
        );
        assert_eq!(normalize_wallet_address("$$x.example"), "https://$x.example");
    }

    #[test]
    fn test_normalize_passes_through_urls() {
        for input in [
            "https://ilp.example/alice",
            "http://localhost:3000/bob",
            "ilp.example/$carol",
            "",
        ] {
            assert_eq!(normalize_wallet_address(input), input);
        }
    }

    #[test]
    fn test_parse_rejects_empty_and_blank() {
        assert!(matches!(
            parse_wallet_address(""),
            Err(OpenPaymentsError::InvalidInput(_))
        ));
        assert!(matches!(
            parse_wallet_address("   "),
            Err(OpenPaymentsError::InvalidInput(_))
        ));
    }

    #[test]
    fn test_parse_rejects_non_http_schemes() {
        assert!(parse_wallet_address("ftp://ilp.example/alice").is_err());
        assert!(parse_wallet_address("not a url").is_err());
    }

    #[test]
    fn test_parse_accepts_pointer() {
        let url = parse_wallet_address("$wallet.example/payer").unwrap();
        assert_eq!(url.as_str(), "https://wallet.example/payer");
        assert_eq!(origin_of(&url), "https://wallet.example");
    }

    #[test]
    fn test_resource_origin_keeps_port() {
        let wallet = WalletAddress {
            id: "http://localhost:4000/accounts/alice".to_string(),
            public_name: None,
            asset_code: "USD".to_string(),
            asset_scale: 2,
            auth_server: "http://localhost:4006".to_string(),
            resource_server: None,
        };
        assert_eq!(wallet.resource_origin().unwrap(), "http://localhost:4000");
    }

    #[test]
    fn test_wallet_address_deserializes_wire_format() {
        let wallet: WalletAddress = serde_json::from_value(serde_json::json!({
            "id": "https://ilp.example/alice",
            "publicName": "Alice",
            "assetCode": "EUR",
            "assetScale": 2,
            "authServer": "https://auth.ilp.example",
            "resourceServer": "https://ilp.example"
        }))
        .unwrap();
        assert_eq!(wallet.asset_code, "EUR");
        assert_eq!(wallet.public_name.as_deref(), Some("Alice"));
        assert_eq!(wallet.auth_server, "https://auth.ilp.example");
    }
}
