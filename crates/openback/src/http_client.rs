use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Method, StatusCode};
use serde::de::DeserializeOwned;
use serde::Serialize;
use url::Url;

use crate::client::OpenPaymentsClient;
use crate::config::ClientCredentials;
use crate::constants::{DEFAULT_UPSTREAM_TIMEOUT_SECS, GNAP_AUTH_SCHEME};
use crate::error::OpenPaymentsError;
use crate::grant::{AccessToken, ContinueRequest, GrantContinuation, GrantRequest, GrantResponse};
use crate::payment::{
    CreateIncomingPayment, CreateOutgoingPayment, CreateQuote, IncomingPayment, OutgoingPayment,
    Quote,
};
use crate::signer::{RequestSigner, SignatureRequest};
use crate::wallet::WalletAddress;

/// Longest upstream error body echoed into an error message.
const MAX_ERROR_MESSAGE_LEN: usize = 200;

/// Maps a 4xx status and its message to an operation-specific error.
type Classifier = fn(StatusCode, String) -> OpenPaymentsError;

/// Grant request body as sent on the wire: the caller's request plus our identity.
#[derive(Serialize)]
struct ClientGrantRequest<'a> {
    #[serde(flatten)]
    request: &'a GrantRequest,
    client: &'a str,
}

/// Open Payments client over HTTP.
///
/// Every call is a single request with a timeout and no retries. Transport
/// failures and 5xx responses become [`OpenPaymentsError::UpstreamUnavailable`];
/// 4xx responses are classified per operation.
pub struct HttpOpenPaymentsClient {
    http: reqwest::Client,
    credentials: ClientCredentials,
    signer: Box<dyn RequestSigner>,
    timeout: Duration,
    plain_http: bool,
}

impl HttpOpenPaymentsClient {
    pub fn new(credentials: ClientCredentials, signer: impl RequestSigner + 'static) -> Self {
        Self {
            http: reqwest::Client::new(),
            credentials,
            signer: Box::new(signer),
            timeout: Duration::from_secs(DEFAULT_UPSTREAM_TIMEOUT_SECS),
            plain_http: false,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Rewrite `https://` targets to `http://` (local development servers).
    pub fn with_plain_http(mut self, plain_http: bool) -> Self {
        self.plain_http = plain_http;
        self
    }

    fn outbound_url(&self, url: &str) -> String {
        match url.strip_prefix("https://") {
            Some(rest) if self.plain_http => format!("http://{rest}"),
            _ => url.to_string(),
        }
    }

    async fn send<B, T>(
        &self,
        method: Method,
        url: &str,
        access_token: Option<&str>,
        body: Option<&B>,
        classify: Classifier,
    ) -> Result<T, OpenPaymentsError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let url = self.outbound_url(url);
        let body_bytes = body.map(serde_json::to_vec).transpose()?;
        let authorization = access_token.map(|t| format!("{GNAP_AUTH_SCHEME} {t}"));

        let mut request = self
            .http
            .request(method.clone(), &url)
            .header("Accept", "application/json")
            .timeout(self.timeout);

        if authorization.is_some() || body_bytes.is_some() {
            let headers = self.signer.signature_headers(&SignatureRequest {
                method: method.as_str(),
                url: &url,
                authorization: authorization.as_deref(),
                body: body_bytes.as_deref(),
            })?;
            for (name, value) in headers {
                request = request.header(name, value);
            }
            tracing::trace!(key_id = %self.credentials.key_id, %url, "signed request");
        }
        if let Some(ref auth) = authorization {
            request = request.header("Authorization", auth);
        }
        if let Some(bytes) = body_bytes {
            request = request
                .header("Content-Type", "application/json")
                .body(bytes);
        }

        let resp = request.send().await.map_err(|e| {
            tracing::warn!(error = %e, %url, "upstream request failed");
            OpenPaymentsError::UpstreamUnavailable(format!("{method} {url}: {e}"))
        })?;

        let status = resp.status();
        if status.is_success() {
            return resp.json::<T>().await.map_err(|e| {
                tracing::warn!(error = %e, status = status.as_u16(), %url, "undecodable upstream response");
                OpenPaymentsError::ProtocolMismatch(format!(
                    "{method} {url} returned {status} with an unexpected body: {e}"
                ))
            });
        }

        let text = match resp.text().await {
            Ok(text) => text,
            Err(e) => {
                tracing::debug!(error = %e, %url, "failed to read upstream error body");
                String::new()
            }
        };
        let message = error_message(&text);
        tracing::warn!(status = status.as_u16(), %url, %message, "upstream returned error");

        if status.is_server_error() {
            return Err(OpenPaymentsError::UpstreamUnavailable(format!(
                "{method} {url} returned {status}: {message}"
            )));
        }
        Err(classify(status, message))
    }
}

#[async_trait]
impl OpenPaymentsClient for HttpOpenPaymentsClient {
    async fn resolve_wallet(&self, url: &Url) -> Result<WalletAddress, OpenPaymentsError> {
        self.send::<(), _>(Method::GET, url.as_str(), None, None, classify_wallet)
            .await
    }

    async fn request_grant(
        &self,
        auth_server: &str,
        request: &GrantRequest,
    ) -> Result<GrantResponse, OpenPaymentsError> {
        let body = ClientGrantRequest {
            request,
            client: &self.credentials.wallet_address_url,
        };
        self.send(Method::POST, auth_server, None, Some(&body), classify_rejected)
            .await
    }

    async fn continue_grant(
        &self,
        continuation: &GrantContinuation,
        interact_ref: &str,
    ) -> Result<GrantResponse, OpenPaymentsError> {
        let body = ContinueRequest {
            interact_ref: interact_ref.to_string(),
        };
        self.send(
            Method::POST,
            &continuation.uri,
            Some(continuation.access_token.as_str()),
            Some(&body),
            classify_continuation,
        )
        .await
    }

    async fn create_outgoing_payment(
        &self,
        resource_server: &str,
        access_token: &AccessToken,
        request: &CreateOutgoingPayment,
    ) -> Result<OutgoingPayment, OpenPaymentsError> {
        self.send(
            Method::POST,
            &resource_url(resource_server, "outgoing-payments"),
            Some(access_token.as_str()),
            Some(request),
            classify_outgoing_payment,
        )
        .await
    }

    async fn create_incoming_payment(
        &self,
        resource_server: &str,
        access_token: &AccessToken,
        request: &CreateIncomingPayment,
    ) -> Result<IncomingPayment, OpenPaymentsError> {
        self.send(
            Method::POST,
            &resource_url(resource_server, "incoming-payments"),
            Some(access_token.as_str()),
            Some(request),
            classify_resource,
        )
        .await
    }

    async fn create_quote(
        &self,
        resource_server: &str,
        access_token: &AccessToken,
        request: &CreateQuote,
    ) -> Result<Quote, OpenPaymentsError> {
        self.send(
            Method::POST,
            &resource_url(resource_server, "quotes"),
            Some(access_token.as_str()),
            Some(request),
            classify_resource,
        )
        .await
    }
}

fn resource_url(resource_server: &str, collection: &str) -> String {
    format!("{}/{collection}", resource_server.trim_end_matches('/'))
}

fn classify_wallet(status: StatusCode, message: String) -> OpenPaymentsError {
    let message = if status == StatusCode::NOT_FOUND {
        "wallet address not found".to_string()
    } else {
        message
    };
    OpenPaymentsError::UpstreamRejected {
        status: status.as_u16(),
        message,
    }
}

fn classify_rejected(status: StatusCode, message: String) -> OpenPaymentsError {
    OpenPaymentsError::UpstreamRejected {
        status: status.as_u16(),
        message,
    }
}

fn classify_continuation(status: StatusCode, message: String) -> OpenPaymentsError {
    OpenPaymentsError::GrantContinuationFailed(format!("{}: {message}", status.as_u16()))
}

fn classify_outgoing_payment(status: StatusCode, message: String) -> OpenPaymentsError {
    match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
            OpenPaymentsError::Unauthorized(message)
        }
        StatusCode::BAD_REQUEST
        | StatusCode::NOT_FOUND
        | StatusCode::CONFLICT
        | StatusCode::UNPROCESSABLE_ENTITY => OpenPaymentsError::QuoteInvalid(message),
        _ => classify_rejected(status, message),
    }
}

fn classify_resource(status: StatusCode, message: String) -> OpenPaymentsError {
    match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
            OpenPaymentsError::Unauthorized(message)
        }
        _ => classify_rejected(status, message),
    }
}

/// Pull a readable message out of an upstream error body.
///
/// GNAP servers answer `{"error": {"code", "description"}}` or
/// `{"error": "code"}`; resource servers usually `{"message": ...}`.
fn error_message(body: &str) -> String {
    if let Ok(value) = serde_json::from_str::<serde_json::Value>(body) {
        let candidates = [
            value.pointer("/error/description"),
            value.pointer("/error/code"),
            value.get("message"),
            value.get("error"),
        ];
        if let Some(msg) = candidates.into_iter().flatten().find_map(|v| v.as_str()) {
            return msg.to_string();
        }
    }

    let trimmed = body.trim();
    if trimmed.is_empty() {
        return "no response body".to_string();
    }
    trimmed.chars().take(MAX_ERROR_MESSAGE_LEN).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grant::{AccessType, Action};
    use crate::signer::ContentDigestSigner;

    fn client() -> HttpOpenPaymentsClient {
        HttpOpenPaymentsClient::new(
            ClientCredentials {
                wallet_address_url: "https://ilp.example/merchant".to_string(),
                key_id: "key-1".to_string(),
                private_key: vec![1, 2, 3],
            },
            ContentDigestSigner,
        )
    }

    #[test]
    fn test_error_message_shapes() {
        assert_eq!(
            error_message(r#"{"error":{"code":"invalid_continuation","description":"bad ref"}}"#),
            "bad ref"
        );
        assert_eq!(error_message(r#"{"error":{"code":"invalid_client"}}"#), "invalid_client");
        assert_eq!(error_message(r#"{"message":"quote expired"}"#), "quote expired");
        assert_eq!(error_message(r#"{"error":"request_denied"}"#), "request_denied");
        assert_eq!(error_message("  "), "no response body");
        assert_eq!(error_message(&"x".repeat(500)).len(), MAX_ERROR_MESSAGE_LEN);
    }

    #[test]
    fn test_outgoing_payment_classification() {
        assert!(matches!(
            classify_outgoing_payment(StatusCode::UNAUTHORIZED, String::new()),
            OpenPaymentsError::Unauthorized(_)
        ));
        assert!(matches!(
            classify_outgoing_payment(StatusCode::FORBIDDEN, String::new()),
            OpenPaymentsError::Unauthorized(_)
        ));
        assert!(matches!(
            classify_outgoing_payment(StatusCode::NOT_FOUND, String::new()),
            OpenPaymentsError::QuoteInvalid(_)
        ));
        assert!(matches!(
            classify_outgoing_payment(StatusCode::BAD_REQUEST, String::new()),
            OpenPaymentsError::QuoteInvalid(_)
        ));
        assert!(matches!(
            classify_outgoing_payment(StatusCode::TOO_MANY_REQUESTS, String::new()),
            OpenPaymentsError::UpstreamRejected { status: 429, .. }
        ));
    }

    #[test]
    fn test_continuation_rejections_are_continuation_failures() {
        for status in [StatusCode::BAD_REQUEST, StatusCode::UNAUTHORIZED, StatusCode::NOT_FOUND] {
            assert!(matches!(
                classify_continuation(status, "nope".to_string()),
                OpenPaymentsError::GrantContinuationFailed(_)
            ));
        }
    }

    #[test]
    fn test_wallet_not_found_message() {
        let err = classify_wallet(StatusCode::NOT_FOUND, "<html>".to_string());
        assert_eq!(err.to_string(), "upstream rejected request (404): wallet address not found");
    }

    #[test]
    fn test_grant_request_carries_client_identity() {
        let request = GrantRequest::non_interactive(AccessType::Quote, &[Action::Create]);
        let body = ClientGrantRequest {
            request: &request,
            client: "https://ilp.example/merchant",
        };
        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(json["client"], "https://ilp.example/merchant");
        assert_eq!(json["access_token"]["access"][0]["type"], "quote");
    }

    #[test]
    fn test_outbound_url_rewrite() {
        let c = client();
        assert_eq!(c.outbound_url("https://a.example/x"), "https://a.example/x");
        let c = client().with_plain_http(true);
        assert_eq!(c.outbound_url("https://a.example/x"), "http://a.example/x");
        assert_eq!(c.outbound_url("http://a.example/x"), "http://a.example/x");
    }

    #[test]
    fn test_resource_url_joins_without_double_slash() {
        assert_eq!(
            resource_url("https://wallet.example/", "outgoing-payments"),
            "https://wallet.example/outgoing-payments"
        );
        assert_eq!(resource_url("https://wallet.example", "quotes"), "https://wallet.example/quotes");
    }

    #[tokio::test]
    async fn test_unreachable_server_is_upstream_unavailable() {
        let c = client().with_timeout(Duration::from_millis(500));
        let url = Url::parse("http://127.0.0.1:1/alice").unwrap();
        let err = c.resolve_wallet(&url).await.unwrap_err();
        assert!(matches!(err, OpenPaymentsError::UpstreamUnavailable(_)));
    }

    /// A request as the stub server saw it.
    #[derive(Debug, Clone)]
    struct Received {
        method: String,
        path: String,
        authorization: Option<String>,
        content_digest: Option<String>,
        body: Vec<u8>,
    }

    impl Received {
        fn json(&self) -> serde_json::Value {
            serde_json::from_slice(&self.body).unwrap()
        }
    }

    struct StubServer {
        base: String,
        received: std::sync::Arc<std::sync::Mutex<Vec<Received>>>,
        handle: actix_web::dev::ServerHandle,
    }

    impl StubServer {
        fn received(&self) -> Vec<Received> {
            self.received.lock().unwrap().clone()
        }

        async fn stop(self) {
            self.handle.stop(false).await;
        }
    }

    /// Serve every request with `status` and `body`, recording what arrives.
    fn stub(status: u16, body: &'static str) -> StubServer {
        use actix_web::{web, App, HttpRequest, HttpResponse, HttpServer};
        use std::sync::{Arc, Mutex};

        let received = Arc::new(Mutex::new(Vec::new()));
        let log = received.clone();
        let server = HttpServer::new(move || {
            let log = log.clone();
            App::new().default_service(web::to(move |req: HttpRequest, bytes: web::Bytes| {
                let log = log.clone();
                async move {
                    let header = |name: &str| {
                        req.headers()
                            .get(name)
                            .and_then(|v| v.to_str().ok())
                            .map(str::to_string)
                    };
                    log.lock().unwrap().push(Received {
                        method: req.method().to_string(),
                        path: req.path().to_string(),
                        authorization: header("authorization"),
                        content_digest: header("content-digest"),
                        body: bytes.to_vec(),
                    });
                    HttpResponse::build(actix_web::http::StatusCode::from_u16(status).unwrap())
                        .content_type("application/json")
                        .body(body)
                }
            }))
        })
        .workers(1)
        .bind(("127.0.0.1", 0))
        .unwrap();

        let base = format!("http://{}", server.addrs()[0]);
        let server = server.run();
        let handle = server.handle();
        actix_rt::spawn(server);
        StubServer {
            base,
            received,
            handle,
        }
    }

    fn outgoing_payment_request() -> CreateOutgoingPayment {
        CreateOutgoingPayment {
            wallet_address: "https://wallet.example/payer".to_string(),
            quote_id: "https://wallet.example/quotes/q-1".to_string(),
            metadata: None,
        }
    }

    #[actix_rt::test]
    async fn test_grant_request_sends_client_and_digest() {
        let server = stub(200, r#"{"access_token":{"value":"at-1"}}"#);
        let request = GrantRequest::non_interactive(AccessType::IncomingPayment, &[Action::Create]);

        let response = client()
            .request_grant(&server.base, &request)
            .await
            .unwrap();
        assert_eq!(response.kind(), "approved");

        let received = server.received();
        assert_eq!(received.len(), 1);
        let sent = &received[0];
        assert_eq!(sent.method, "POST");
        assert!(sent.authorization.is_none());
        assert_eq!(
            sent.content_digest.as_deref(),
            Some(crate::signer::content_digest(&sent.body).as_str())
        );
        let json = sent.json();
        assert_eq!(json["client"], "https://ilp.example/merchant");
        assert_eq!(json["access_token"]["access"][0]["type"], "incoming-payment");
        server.stop().await;
    }

    #[actix_rt::test]
    async fn test_continuation_sends_gnap_authorization() {
        let server = stub(200, r#"{"access_token":{"value":"at-2"}}"#);
        let continuation = GrantContinuation {
            access_token: crate::grant::ContinuationToken::new("cont-1"),
            uri: format!("{}/continue/1", server.base),
        };

        let response = client()
            .continue_grant(&continuation, "ref-1")
            .await
            .unwrap();
        assert_eq!(response.kind(), "approved");

        let sent = &server.received()[0];
        assert_eq!(sent.path, "/continue/1");
        assert_eq!(sent.authorization.as_deref(), Some("GNAP cont-1"));
        assert!(sent.content_digest.is_some());
        assert_eq!(sent.json()["interact_ref"], "ref-1");
        server.stop().await;
    }

    #[actix_rt::test]
    async fn test_rejected_continuation_is_continuation_failure() {
        let server = stub(401, r#"{"error":{"code":"invalid_continuation"}}"#);
        let continuation = GrantContinuation {
            access_token: crate::grant::ContinuationToken::new("cont-1"),
            uri: format!("{}/continue/1", server.base),
        };

        let err = client()
            .continue_grant(&continuation, "ref-1")
            .await
            .unwrap_err();
        assert!(
            matches!(err, OpenPaymentsError::GrantContinuationFailed(ref m) if m.contains("invalid_continuation"))
        );
        server.stop().await;
    }

    #[actix_rt::test]
    async fn test_server_error_is_upstream_unavailable() {
        let server = stub(503, r#"{"message":"maintenance"}"#);
        let request = GrantRequest::non_interactive(AccessType::Quote, &[Action::Create]);

        let err = client()
            .request_grant(&server.base, &request)
            .await
            .unwrap_err();
        assert!(matches!(err, OpenPaymentsError::UpstreamUnavailable(ref m) if m.contains("maintenance")));
        assert_eq!(server.received().len(), 1);
        server.stop().await;
    }

    #[actix_rt::test]
    async fn test_outgoing_payment_rejections() {
        let server = stub(401, r#"{"message":"token expired"}"#);
        let err = client()
            .create_outgoing_payment(&server.base, &AccessToken::new("at-1"), &outgoing_payment_request())
            .await
            .unwrap_err();
        assert!(matches!(err, OpenPaymentsError::Unauthorized(ref m) if m == "token expired"));

        let sent = &server.received()[0];
        assert_eq!(sent.path, "/outgoing-payments");
        assert_eq!(sent.authorization.as_deref(), Some("GNAP at-1"));
        assert_eq!(sent.json()["walletAddress"], "https://wallet.example/payer");
        assert_eq!(sent.json()["quoteId"], "https://wallet.example/quotes/q-1");
        server.stop().await;

        let server = stub(404, r#"{"message":"quote not found"}"#);
        let err = client()
            .create_outgoing_payment(&server.base, &AccessToken::new("at-1"), &outgoing_payment_request())
            .await
            .unwrap_err();
        assert!(matches!(err, OpenPaymentsError::QuoteInvalid(ref m) if m == "quote not found"));
        server.stop().await;
    }

    #[actix_rt::test]
    async fn test_undecodable_success_is_protocol_mismatch() {
        let server = stub(200, "<html>ok</html>");
        let err = client()
            .create_outgoing_payment(&server.base, &AccessToken::new("at-1"), &outgoing_payment_request())
            .await
            .unwrap_err();
        assert!(matches!(err, OpenPaymentsError::ProtocolMismatch(_)));
        server.stop().await;
    }

    #[actix_rt::test]
    async fn test_plain_http_reaches_https_wallet_address() {
        let server = stub(
            200,
            r#"{"id":"https://wallet.example/alice","assetCode":"USD","assetScale":2,"authServer":"https://auth.wallet.example"}"#,
        );
        let https_url = Url::parse(&server.base.replacen("http://", "https://", 1))
            .unwrap()
            .join("/alice")
            .unwrap();

        let wallet = client()
            .with_plain_http(true)
            .resolve_wallet(&https_url)
            .await
            .unwrap();
        assert_eq!(wallet.asset_code, "USD");

        let sent = &server.received()[0];
        assert_eq!(sent.method, "GET");
        assert_eq!(sent.path, "/alice");
        assert!(sent.authorization.is_none());
        assert!(sent.content_digest.is_none());
        server.stop().await;
    }
}
