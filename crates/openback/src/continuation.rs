use crate::client::OpenPaymentsClient;
use crate::error::OpenPaymentsError;
use crate::grant::{FinalizedGrant, GrantContinuation, GrantResponse};

/// Finalizes pending grants once the user has completed the redirect.
pub struct GrantContinuationHandler<'a, C: ?Sized> {
    client: &'a C,
}

impl<'a, C> GrantContinuationHandler<'a, C>
where
    C: OpenPaymentsClient + ?Sized,
{
    pub fn new(client: &'a C) -> Self {
        Self { client }
    }

    /// Exchange a continuation token and interaction reference for an access token.
    ///
    /// "Consumed once" is enforced by the authorization server; a second
    /// continuation with the same values fails there.
    pub async fn continue_grant(
        &self,
        continuation: &GrantContinuation,
        interact_ref: &str,
    ) -> Result<FinalizedGrant, OpenPaymentsError> {
        if continuation.access_token.as_str().trim().is_empty() {
            return Err(OpenPaymentsError::invalid("continuation access token is required"));
        }
        if continuation.uri.trim().is_empty() {
            return Err(OpenPaymentsError::invalid("continuation URI is required"));
        }
        if interact_ref.trim().is_empty() {
            return Err(OpenPaymentsError::invalid("interaction reference is required"));
        }

        match self.client.continue_grant(continuation, interact_ref).await? {
            GrantResponse::Approved(approved) if !approved.access_token.value.as_str().is_empty() => {
                tracing::info!(uri = %continuation.uri, "grant finalized");
                Ok(FinalizedGrant::from(approved.access_token))
            }
            other => {
                tracing::warn!(
                    uri = %continuation.uri,
                    kind = other.kind(),
                    "grant continuation did not issue an access token"
                );
                Err(OpenPaymentsError::GrantContinuationFailed(format!(
                    "continuation returned a {} grant without an access token",
                    other.kind()
                )))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::amount::LimitAmount;
    use crate::fake::FakeOpenPayments;
    use crate::grant::{ContinuationToken, PendingGrant};
    use crate::negotiator::{GrantNegotiator, OutgoingPaymentGrantRequest};

    const PAYER: &str = "https://wallet.example/payer";

    async fn pending(fake: &FakeOpenPayments) -> PendingGrant {
        GrantNegotiator::new(fake)
            .request_outgoing_payment_grant(&OutgoingPaymentGrantRequest {
                wallet_address: PAYER.to_string(),
                debit_amount: LimitAmount::Value("100".to_string()),
                receive_amount: LimitAmount::Value("100".to_string()),
                redirect_url: "https://app.example/done".to_string(),
            })
            .await
            .unwrap()
    }

    fn fake() -> FakeOpenPayments {
        FakeOpenPayments::new().with_wallet(FakeOpenPayments::wallet(PAYER, "USD", 2))
    }

    #[tokio::test]
    async fn test_continue_after_interaction() {
        let fake = fake();
        let pending = pending(&fake).await;
        let interact_ref = fake.complete_interaction(&pending.continuation_uri).unwrap();

        let grant = GrantContinuationHandler::new(&fake)
            .continue_grant(&pending.continuation(), &interact_ref)
            .await
            .unwrap();
        assert!(!grant.access_token.as_str().is_empty());
        assert_ne!(grant.access_token.as_str(), pending.continuation_access_token.as_str());
    }

    #[tokio::test]
    async fn test_continuation_is_consumed_once() {
        let fake = fake();
        let pending = pending(&fake).await;
        let interact_ref = fake.complete_interaction(&pending.continuation_uri).unwrap();
        let handler = GrantContinuationHandler::new(&fake);

        handler
            .continue_grant(&pending.continuation(), &interact_ref)
            .await
            .unwrap();
        let err = handler
            .continue_grant(&pending.continuation(), &interact_ref)
            .await
            .unwrap_err();
        assert!(matches!(err, OpenPaymentsError::GrantContinuationFailed(_)));
    }

    #[tokio::test]
    async fn test_continue_before_interaction_fails() {
        let fake = fake();
        let pending = pending(&fake).await;
        let err = GrantContinuationHandler::new(&fake)
            .continue_grant(&pending.continuation(), "guessed-ref")
            .await
            .unwrap_err();
        assert!(matches!(err, OpenPaymentsError::GrantContinuationFailed(_)));
    }

    #[tokio::test]
    async fn test_wrong_continuation_token_fails() {
        let fake = fake();
        let pending = pending(&fake).await;
        let interact_ref = fake.complete_interaction(&pending.continuation_uri).unwrap();
        let forged = GrantContinuation {
            access_token: ContinuationToken::new("forged"),
            uri: pending.continuation_uri.clone(),
        };
        let err = GrantContinuationHandler::new(&fake)
            .continue_grant(&forged, &interact_ref)
            .await
            .unwrap_err();
        assert!(matches!(err, OpenPaymentsError::GrantContinuationFailed(_)));
    }

    #[tokio::test]
    async fn test_blank_inputs_rejected_locally() {
        let fake = fake();
        let handler = GrantContinuationHandler::new(&fake);
        let continuation = GrantContinuation {
            access_token: ContinuationToken::new("cont-1"),
            uri: "https://auth.wallet.example/continue/1".to_string(),
        };

        let err = handler.continue_grant(&continuation, " ").await.unwrap_err();
        assert!(matches!(err, OpenPaymentsError::InvalidInput(_)));

        let no_token = GrantContinuation {
            access_token: ContinuationToken::new(""),
            ..continuation
        };
        let err = handler.continue_grant(&no_token, "ref-1").await.unwrap_err();
        assert!(matches!(err, OpenPaymentsError::InvalidInput(_)));
        assert_eq!(fake.remote_calls(), 0);
    }

    #[tokio::test]
    async fn test_unreachable_auth_server_is_upstream_unavailable() {
        let fake = fake().unavailable();
        let continuation = GrantContinuation {
            access_token: ContinuationToken::new("cont-1"),
            uri: "https://auth.wallet.example/continue/1".to_string(),
        };
        let err = GrantContinuationHandler::new(&fake)
            .continue_grant(&continuation, "ref-1")
            .await
            .unwrap_err();
        assert!(matches!(err, OpenPaymentsError::UpstreamUnavailable(_)));
        assert_eq!(fake.remote_calls(), 1);
    }
}
