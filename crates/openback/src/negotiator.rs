use serde::{Deserialize, Serialize};
use url::Url;
use uuid::Uuid;

use crate::amount::LimitAmount;
use crate::client::OpenPaymentsClient;
use crate::constants::OUTGOING_PAYMENT_ACTIONS;
use crate::error::OpenPaymentsError;
use crate::grant::{
    AccessItem, AccessTokenRequest, AccessType, GrantRequest, GrantResponse, InteractRequest,
    Limits, PendingGrant,
};
use crate::wallet::{parse_wallet_address, WalletAddress};

/// Caller input for an interactive outgoing-payment grant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OutgoingPaymentGrantRequest {
    pub wallet_address: String,
    pub debit_amount: LimitAmount,
    pub receive_amount: LimitAmount,
    pub redirect_url: String,
}

/// Requests interactive outgoing-payment grants on behalf of a payer wallet.
pub struct GrantNegotiator<'a, C: ?Sized> {
    client: &'a C,
}

impl<'a, C> GrantNegotiator<'a, C>
where
    C: OpenPaymentsClient + ?Sized,
{
    pub fn new(client: &'a C) -> Self {
        Self { client }
    }

    /// Ask the payer's authorization server for permission to create
    /// outgoing payments within the given limits.
    ///
    /// Input is validated before anything is sent. The result is always a
    /// pending grant: an immediately approved grant means no redirect can
    /// happen, and fails with [`OpenPaymentsError::ProtocolMismatch`].
    pub async fn request_outgoing_payment_grant(
        &self,
        request: &OutgoingPaymentGrantRequest,
    ) -> Result<PendingGrant, OpenPaymentsError> {
        let wallet_url = parse_wallet_address(&request.wallet_address)?;
        request.debit_amount.validate("debitAmount")?;
        request.receive_amount.validate("receiveAmount")?;
        Url::parse(&request.redirect_url).map_err(|e| {
            OpenPaymentsError::invalid(format!("malformed redirectUrl {:?}: {e}", request.redirect_url))
        })?;

        let wallet = self.client.resolve_wallet(&wallet_url).await?;
        let limits = Limits {
            debit_amount: Some(request.debit_amount.resolve("debitAmount", &wallet)?),
            receive_amount: Some(request.receive_amount.resolve("receiveAmount", &wallet)?),
        };

        let nonce = Uuid::new_v4().to_string();
        let grant_request = outgoing_payment_grant(&wallet, limits, &request.redirect_url, &nonce);

        match self
            .client
            .request_grant(&wallet.auth_server, &grant_request)
            .await?
        {
            GrantResponse::Pending(pending) => {
                tracing::info!(
                    wallet = %wallet.id,
                    auth_server = %wallet.auth_server,
                    "outgoing payment grant pending user interaction"
                );
                Ok(PendingGrant::from_response(pending, nonce))
            }
            other => {
                tracing::warn!(
                    wallet = %wallet.id,
                    kind = other.kind(),
                    "authorization server did not return an interactive grant"
                );
                Err(OpenPaymentsError::ProtocolMismatch(format!(
                    "expected an interactive grant, authorization server returned {}",
                    other.kind()
                )))
            }
        }
    }
}

/// Interactive grant request for creating outgoing payments from `wallet`.
pub fn outgoing_payment_grant(
    wallet: &WalletAddress,
    limits: Limits,
    redirect_url: &str,
    nonce: &str,
) -> GrantRequest {
    GrantRequest {
        access_token: AccessTokenRequest {
            access: vec![AccessItem {
                access_type: AccessType::OutgoingPayment,
                actions: OUTGOING_PAYMENT_ACTIONS.to_vec(),
                identifier: Some(wallet.id.clone()),
                limits: Some(limits),
            }],
        },
        interact: Some(InteractRequest::redirect(redirect_url, nonce)),
    }
}
