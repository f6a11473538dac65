//! In-memory Open Payments servers for tests.
//!
//! [`FakeOpenPayments`] plays wallet, authorization and resource server at
//! once. Interactive grants stay pending until a test calls
//! [`FakeOpenPayments::complete_interaction`], standing in for the user's
//! browser redirect. Access tokens for outgoing payments are spent on use.

use std::collections::{HashMap, HashSet};
use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;
use chrono::Utc;
use url::Url;

use crate::amount::Amount;
use crate::client::OpenPaymentsClient;
use crate::error::OpenPaymentsError;
use crate::grant::{
    AccessToken, AccessTokenResponse, ApprovedGrantResponse, Continue, ContinueAccessToken,
    ContinuationToken, GrantContinuation, GrantRequest, GrantResponse, InteractResponse,
    PendingGrantResponse,
};
use crate::payment::{
    CreateIncomingPayment, CreateOutgoingPayment, CreateQuote, IncomingPayment, OutgoingPayment,
    Quote,
};
use crate::wallet::{origin_of, WalletAddress};

struct PendingEntry {
    token: String,
    interact_ref: String,
    interacted: bool,
    consumed: bool,
}

#[derive(Default)]
struct FakeState {
    wallets: HashMap<String, WalletAddress>,
    grant_requests: Vec<GrantRequest>,
    payment_requests: Vec<(String, CreateOutgoingPayment)>,
    pending: HashMap<String, PendingEntry>,
    access_tokens: HashSet<String>,
    quotes: HashMap<String, Quote>,
    remote_calls: usize,
    counter: u64,
    approve_interactive: bool,
    unavailable: bool,
}

impl FakeState {
    fn next_id(&mut self) -> u64 {
        self.counter += 1;
        self.counter
    }

    /// Count a remote call, failing it if the fake is offline.
    fn call(&mut self) -> Result<(), OpenPaymentsError> {
        self.remote_calls += 1;
        if self.unavailable {
            return Err(OpenPaymentsError::UpstreamUnavailable(
                "connection refused".to_string(),
            ));
        }
        Ok(())
    }

    fn wallet(&self, id: &str) -> Result<WalletAddress, OpenPaymentsError> {
        self.wallets
            .get(id)
            .cloned()
            .ok_or_else(|| OpenPaymentsError::UpstreamRejected {
                status: 404,
                message: "wallet address not found".to_string(),
            })
    }

    fn check_token(&self, token: &AccessToken) -> Result<(), OpenPaymentsError> {
        if self.access_tokens.contains(token.as_str()) {
            Ok(())
        } else {
            Err(OpenPaymentsError::Unauthorized(
                "invalid or expired access token".to_string(),
            ))
        }
    }

    fn issue_token(&mut self) -> AccessTokenResponse {
        let value = format!("at-{}", self.next_id());
        self.access_tokens.insert(value.clone());
        AccessTokenResponse {
            value: AccessToken::new(value),
            manage: None,
            expires_in: Some(600),
        }
    }
}

#[derive(Default)]
pub struct FakeOpenPayments {
    state: Mutex<FakeState>,
}

impl FakeOpenPayments {
    pub fn new() -> Self {
        Self::default()
    }

    /// Wallet metadata with an authorization server at `https://auth.<host>`.
    pub fn wallet(id: &str, asset_code: &str, asset_scale: u8) -> WalletAddress {
        let url = Url::parse(id).expect("fake wallet id must be a URL");
        let auth_server = format!(
            "{}://auth.{}",
            url.scheme(),
            url.host_str().unwrap_or("localhost")
        );
        WalletAddress {
            id: url.to_string(),
            public_name: None,
            asset_code: asset_code.to_string(),
            asset_scale,
            auth_server,
            resource_server: Some(origin_of(&url)),
        }
    }

    pub fn with_wallet(self, wallet: WalletAddress) -> Self {
        self.lock().wallets.insert(wallet.id.clone(), wallet);
        self
    }

    /// Register a quote created against `wallet_id` for 100 → 95 in its asset.
    pub fn with_quote(self, quote_id: &str, wallet_id: &str) -> Self {
        {
            let mut state = self.lock();
            let wallet = state
                .wallet(wallet_id)
                .expect("register the wallet before its quotes");
            let quote = Quote {
                id: quote_id.to_string(),
                wallet_address: wallet.id.clone(),
                receiver: "https://receiver.example/incoming-payments/1".to_string(),
                debit_amount: Amount::in_wallet_asset("100", &wallet),
                receive_amount: Amount::in_wallet_asset("95", &wallet),
                method: "ilp".to_string(),
                created_at: Utc::now(),
                expires_at: None,
            };
            state.quotes.insert(quote_id.to_string(), quote);
        }
        self
    }

    /// Answer interactive grant requests with an approved grant.
    pub fn approving_interactive_grants(self) -> Self {
        self.lock().approve_interactive = true;
        self
    }

    /// Fail every call as if the servers were unreachable.
    pub fn unavailable(self) -> Self {
        self.lock().unavailable = true;
        self
    }

    /// Simulate the user approving the grant behind `continuation_uri`.
    /// Returns the interaction reference the redirect would deliver.
    pub fn complete_interaction(&self, continuation_uri: &str) -> Option<String> {
        let mut state = self.lock();
        let entry = state.pending.get_mut(continuation_uri)?;
        entry.interacted = true;
        Some(entry.interact_ref.clone())
    }

    pub fn remote_calls(&self) -> usize {
        self.lock().remote_calls
    }

    pub fn grant_requests(&self) -> Vec<GrantRequest> {
        self.lock().grant_requests.clone()
    }

    /// Outgoing payment requests received, with the resource server each was sent to.
    pub fn payment_requests(&self) -> Vec<(String, CreateOutgoingPayment)> {
        self.lock().payment_requests.clone()
    }

    fn lock(&self) -> MutexGuard<'_, FakeState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }
}

#[async_trait]
impl OpenPaymentsClient for FakeOpenPayments {
    async fn resolve_wallet(&self, url: &Url) -> Result<WalletAddress, OpenPaymentsError> {
        let mut state = self.lock();
        state.call()?;
        state.wallet(url.as_str())
    }

    async fn request_grant(
        &self,
        auth_server: &str,
        request: &GrantRequest,
    ) -> Result<GrantResponse, OpenPaymentsError> {
        let mut state = self.lock();
        state.call()?;
        state.grant_requests.push(request.clone());

        if !request.is_interactive() || state.approve_interactive {
            let access_token = state.issue_token();
            return Ok(GrantResponse::Approved(ApprovedGrantResponse {
                access_token,
                continuation: None,
            }));
        }

        let id = state.next_id();
        let token = format!("cont-{id}");
        let uri = format!("{auth_server}/continue/{id}");
        state.pending.insert(
            uri.clone(),
            PendingEntry {
                token: token.clone(),
                interact_ref: format!("ref-{id}"),
                interacted: false,
                consumed: false,
            },
        );

        Ok(GrantResponse::Pending(PendingGrantResponse {
            interact: InteractResponse {
                redirect: format!("{auth_server}/interact/{id}"),
                finish: Some(format!("finish-{id}")),
            },
            continuation: Continue {
                access_token: ContinueAccessToken {
                    value: ContinuationToken::new(token),
                },
                uri,
                wait: None,
            },
        }))
    }

    async fn continue_grant(
        &self,
        continuation: &GrantContinuation,
        interact_ref: &str,
    ) -> Result<GrantResponse, OpenPaymentsError> {
        let mut state = self.lock();
        state.call()?;

        let failed = |msg: &str| Err(OpenPaymentsError::GrantContinuationFailed(msg.to_string()));
        let Some(entry) = state.pending.get_mut(&continuation.uri) else {
            return failed("unknown continuation");
        };
        if entry.token != continuation.access_token.as_str() {
            return failed("invalid continuation access token");
        }
        if entry.consumed {
            return failed("grant already continued");
        }
        if !entry.interacted || entry.interact_ref != interact_ref {
            return failed("interaction reference mismatch");
        }
        entry.consumed = true;

        let access_token = state.issue_token();
        Ok(GrantResponse::Approved(ApprovedGrantResponse {
            access_token,
            continuation: None,
        }))
    }

    async fn create_outgoing_payment(
        &self,
        resource_server: &str,
        access_token: &AccessToken,
        request: &CreateOutgoingPayment,
    ) -> Result<OutgoingPayment, OpenPaymentsError> {
        let mut state = self.lock();
        state.call()?;
        state
            .payment_requests
            .push((resource_server.to_string(), request.clone()));
        state.check_token(access_token)?;

        let quote = state
            .quotes
            .get(&request.quote_id)
            .filter(|q| q.wallet_address == request.wallet_address)
            .cloned()
            .ok_or_else(|| {
                OpenPaymentsError::QuoteInvalid(format!("quote {} not found", request.quote_id))
            })?;

        state.access_tokens.remove(access_token.as_str());
        let id = state.next_id();
        let now = Utc::now();
        let sent_amount = Amount {
            value: "0".to_string(),
            ..quote.debit_amount.clone()
        };
        Ok(OutgoingPayment {
            id: format!("{resource_server}/outgoing-payments/{id}"),
            wallet_address: request.wallet_address.clone(),
            quote_id: Some(quote.id),
            receiver: quote.receiver,
            debit_amount: quote.debit_amount,
            receive_amount: quote.receive_amount,
            sent_amount,
            failed: false,
            metadata: request.metadata.clone(),
            created_at: now,
            updated_at: now,
        })
    }

    async fn create_incoming_payment(
        &self,
        resource_server: &str,
        access_token: &AccessToken,
        request: &CreateIncomingPayment,
    ) -> Result<IncomingPayment, OpenPaymentsError> {
        let mut state = self.lock();
        state.call()?;
        state.check_token(access_token)?;
        let wallet = state.wallet(&request.wallet_address)?;

        let id = state.next_id();
        let now = Utc::now();
        Ok(IncomingPayment {
            id: format!("{resource_server}/incoming-payments/{id}"),
            wallet_address: wallet.id.clone(),
            completed: false,
            incoming_amount: request.incoming_amount.clone(),
            received_amount: Amount::in_wallet_asset("0", &wallet),
            expires_at: request.expires_at,
            created_at: now,
            updated_at: now,
        })
    }

    async fn create_quote(
        &self,
        resource_server: &str,
        access_token: &AccessToken,
        request: &CreateQuote,
    ) -> Result<Quote, OpenPaymentsError> {
        let mut state = self.lock();
        state.call()?;
        state.check_token(access_token)?;
        let wallet = state.wallet(&request.wallet_address)?;

        let id = state.next_id();
        let quote = Quote {
            id: format!("{resource_server}/quotes/{id}"),
            wallet_address: wallet.id.clone(),
            receiver: request.receiver.clone(),
            debit_amount: Amount::in_wallet_asset("100", &wallet),
            receive_amount: Amount::in_wallet_asset("100", &wallet),
            method: request.method.clone(),
            created_at: Utc::now(),
            expires_at: None,
        };
        state.quotes.insert(quote.id.clone(), quote.clone());
        Ok(quote)
    }
}
