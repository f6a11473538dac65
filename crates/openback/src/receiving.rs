//! Receiving side of a payment: incoming payments and quotes.
//!
//! Both operations use non-interactive grants issued straight to this
//! service. A pending grant here means the authorization server wants user
//! interaction the flow cannot provide.

use chrono::{DateTime, Utc};
use url::Url;

use crate::amount::{validate_amount_value, Amount};
use crate::client::OpenPaymentsClient;
use crate::constants::{ILP_QUOTE_METHOD, INCOMING_PAYMENT_ACTIONS, QUOTE_ACTIONS};
use crate::error::OpenPaymentsError;
use crate::grant::{AccessToken, AccessType, Action, GrantRequest, GrantResponse};
use crate::payment::{CreateIncomingPayment, CreateQuote, IncomingPayment, Quote};
use crate::wallet::WalletAddress;

pub struct PaymentReceiver<'a, C: ?Sized> {
    client: &'a C,
}

impl<'a, C> PaymentReceiver<'a, C>
where
    C: OpenPaymentsClient + ?Sized,
{
    pub fn new(client: &'a C) -> Self {
        Self { client }
    }

    /// Create an incoming payment for `value` (in the wallet's asset) on the
    /// receiving wallet.
    pub async fn create_incoming_payment(
        &self,
        wallet: &WalletAddress,
        value: &str,
        expires_at: Option<DateTime<Utc>>,
    ) -> Result<IncomingPayment, OpenPaymentsError> {
        validate_amount_value("value", value)?;
        if let Some(expiry) = expires_at {
            if expiry <= Utc::now() {
                return Err(OpenPaymentsError::invalid("expiresAt must be in the future"));
            }
        }
        let resource_server = wallet.resource_origin()?;

        let token = self
            .non_interactive_token(wallet, AccessType::IncomingPayment, INCOMING_PAYMENT_ACTIONS)
            .await?;

        let request = CreateIncomingPayment {
            wallet_address: wallet.id.clone(),
            incoming_amount: Some(Amount::in_wallet_asset(value, wallet)),
            expires_at,
        };
        let incoming = self
            .client
            .create_incoming_payment(&resource_server, &token, &request)
            .await?;

        tracing::info!(incoming = %incoming.id, wallet = %wallet.id, value, "incoming payment created");
        Ok(incoming)
    }

    /// Quote sending from `wallet` to `receiver` (an incoming payment URL).
    pub async fn create_quote(
        &self,
        wallet: &WalletAddress,
        receiver: &str,
    ) -> Result<Quote, OpenPaymentsError> {
        Url::parse(receiver)
            .map_err(|e| OpenPaymentsError::invalid(format!("malformed receiver {receiver:?}: {e}")))?;
        let resource_server = wallet.resource_origin()?;

        let token = self
            .non_interactive_token(wallet, AccessType::Quote, QUOTE_ACTIONS)
            .await?;

        let request = CreateQuote {
            method: ILP_QUOTE_METHOD.to_string(),
            wallet_address: wallet.id.clone(),
            receiver: receiver.to_string(),
        };
        let quote = self
            .client
            .create_quote(&resource_server, &token, &request)
            .await?;

        tracing::info!(
            quote = %quote.id,
            wallet = %wallet.id,
            debit = %quote.debit_amount.value,
            receive = %quote.receive_amount.value,
            "quote created"
        );
        Ok(quote)
    }

    async fn non_interactive_token(
        &self,
        wallet: &WalletAddress,
        access_type: AccessType,
        actions: &[Action],
    ) -> Result<AccessToken, OpenPaymentsError> {
        let request = GrantRequest::non_interactive(access_type, actions);
        match self.client.request_grant(&wallet.auth_server, &request).await? {
            GrantResponse::Approved(approved) => Ok(approved.access_token.value),
            other => {
                tracing::warn!(
                    auth_server = %wallet.auth_server,
                    ?access_type,
                    kind = other.kind(),
                    "expected a non-interactive grant"
                );
                Err(OpenPaymentsError::ProtocolMismatch(format!(
                    "expected a non-interactive {access_type:?} grant, authorization server returned {}",
                    other.kind()
                )))
            }
        }
    }
}
