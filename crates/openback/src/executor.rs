use crate::client::OpenPaymentsClient;
use crate::error::OpenPaymentsError;
use crate::grant::FinalizedGrant;
use crate::payment::{CreateOutgoingPayment, OutgoingPayment};
use crate::wallet::{normalize_wallet_address, origin_of, parse_wallet_address};

/// Submits outgoing payments against previously created quotes.
pub struct PaymentExecutor<'a, C: ?Sized> {
    client: &'a C,
}

impl<'a, C> PaymentExecutor<'a, C>
where
    C: OpenPaymentsClient + ?Sized,
{
    pub fn new(client: &'a C) -> Self {
        Self { client }
    }

    /// Create an outgoing payment at the wallet's resource server.
    ///
    /// Takes the grant by value: the payment spends the permission it carries.
    pub async fn create_outgoing_payment(
        &self,
        grant: FinalizedGrant,
        wallet_address: &str,
        quote_id: &str,
    ) -> Result<OutgoingPayment, OpenPaymentsError> {
        // The URL form is only for validation and the origin. The caller's
        // address goes on the wire as written, apart from `$` expansion.
        let wallet_url = parse_wallet_address(wallet_address)?;
        if quote_id.trim().is_empty() {
            return Err(OpenPaymentsError::invalid("quoteId is required"));
        }

        let resource_server = origin_of(&wallet_url);
        let request = CreateOutgoingPayment {
            wallet_address: normalize_wallet_address(wallet_address),
            quote_id: quote_id.to_string(),
            metadata: None,
        };

        let payment = self
            .client
            .create_outgoing_payment(&resource_server, &grant.access_token, &request)
            .await?;

        tracing::info!(
            payment = %payment.id,
            wallet = %payment.wallet_address,
            quote = %quote_id,
            status = ?payment.status(),
            "outgoing payment created"
        );
        Ok(payment)
    }
}
