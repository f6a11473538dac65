//! Open Payments flows for a backend acting on behalf of its users.
//!
//! Resolves wallet addresses (including `$` payment pointers), negotiates
//! GNAP grants with authorization servers and creates incoming payments,
//! quotes and outgoing payments at resource servers.
//!
//! # Outgoing payment flow
//!
//! - **Negotiate** ([`GrantNegotiator`]): request an interactive grant bounded
//!   by debit/receive limits. The user is sent to the returned redirect URI.
//! - **Continue** ([`GrantContinuationHandler`]): exchange the continuation
//!   token and interaction reference for an access token.
//! - **Execute** ([`PaymentExecutor`]): spend the access token on an
//!   outgoing payment against an existing quote.
//!
//! [`PaymentReceiver`] covers the receiving side (incoming payments and
//! quotes) with non-interactive grants.
//!
//! # Quick example
//!
//! ```no_run
//! use openback::{
//!     ClientCredentials, ContentDigestSigner, GrantNegotiator, HttpOpenPaymentsClient,
//!     OutgoingPaymentGrantRequest,
//! };
//!
//! # #[tokio::main]
//! # async fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let client = HttpOpenPaymentsClient::new(ClientCredentials::from_env()?, ContentDigestSigner);
//! let request: OutgoingPaymentGrantRequest = serde_json::from_str(
//!     r#"{"walletAddress":"$ilp.example/alice","debitAmount":"1000",
//!         "receiveAmount":"1000","redirectUrl":"https://app.example/done"}"#,
//! )?;
//! let pending = GrantNegotiator::new(&client)
//!     .request_outgoing_payment_grant(&request)
//!     .await?;
//! println!("send the user to {}", pending.interaction_redirect_uri);
//! # Ok(())
//! # }
//! ```

// Core types
pub mod amount;
pub mod constants;
pub mod error;
pub mod grant;
pub mod payment;
pub mod wallet;

// Protocol flows
pub mod continuation;
pub mod executor;
pub mod negotiator;
pub mod receiving;

// Transport
pub mod client;
pub mod config;
pub mod http_client;
pub mod signer;

#[cfg(any(test, feature = "test-utils"))]
pub mod fake;

// Re-exports
pub use amount::{Amount, LimitAmount};
pub use client::OpenPaymentsClient;
pub use config::{ClientCredentials, ConfigError};
pub use continuation::GrantContinuationHandler;
pub use error::OpenPaymentsError;
pub use executor::PaymentExecutor;
pub use grant::{
    AccessToken, ContinuationToken, FinalizedGrant, GrantContinuation, GrantRequest,
    GrantResponse, PendingGrant,
};
pub use http_client::HttpOpenPaymentsClient;
pub use negotiator::{GrantNegotiator, OutgoingPaymentGrantRequest};
pub use payment::{IncomingPayment, OutgoingPayment, PaymentStatus, Quote};
pub use receiving::PaymentReceiver;
pub use signer::{ContentDigestSigner, RequestSigner};
pub use wallet::{normalize_wallet_address, resolve_wallet_address, WalletAddress};
