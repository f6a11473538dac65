//! The narrow interface this crate needs from an Open Payments client.
//!
//! - [`HttpOpenPaymentsClient`](crate::http_client::HttpOpenPaymentsClient) talks to real wallet,
//!   authorization and resource servers over HTTP.
//! - `FakeOpenPayments` (feature `test-utils`) simulates all three in memory.

use async_trait::async_trait;
use url::Url;

use crate::error::OpenPaymentsError;
use crate::grant::{AccessToken, GrantContinuation, GrantRequest, GrantResponse};
use crate::payment::{
    CreateIncomingPayment, CreateOutgoingPayment, CreateQuote, IncomingPayment, OutgoingPayment,
    Quote,
};
use crate::wallet::WalletAddress;

#[async_trait]
pub trait OpenPaymentsClient: Send + Sync {
    /// Fetch wallet address metadata from its (already normalized) URL.
    async fn resolve_wallet(&self, url: &Url) -> Result<WalletAddress, OpenPaymentsError>;

    /// Send a grant request to an authorization server.
    async fn request_grant(
        &self,
        auth_server: &str,
        request: &GrantRequest,
    ) -> Result<GrantResponse, OpenPaymentsError>;

    /// Continue a pending grant with the interaction reference from the redirect.
    async fn continue_grant(
        &self,
        continuation: &GrantContinuation,
        interact_ref: &str,
    ) -> Result<GrantResponse, OpenPaymentsError>;

    async fn create_outgoing_payment(
        &self,
        resource_server: &str,
        access_token: &AccessToken,
        request: &CreateOutgoingPayment,
    ) -> Result<OutgoingPayment, OpenPaymentsError>;

    async fn create_incoming_payment(
        &self,
        resource_server: &str,
        access_token: &AccessToken,
        request: &CreateIncomingPayment,
    ) -> Result<IncomingPayment, OpenPaymentsError>;

    async fn create_quote(
        &self,
        resource_server: &str,
        access_token: &AccessToken,
        request: &CreateQuote,
    ) -> Result<Quote, OpenPaymentsError>;
}
