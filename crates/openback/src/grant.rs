//! GNAP grant wire types and the grant states handed between HTTP requests.
//!
//! A grant request either comes back **pending** (the user must complete an
//! interactive redirect) or **approved** (an access token is issued at once).
//! The continuation token of a pending grant and the access token of a
//! finalized grant are distinct types so one cannot be spent as the other.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::amount::Amount;
use crate::constants::REDIRECT_INTERACTION;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum AccessType {
    IncomingPayment,
    OutgoingPayment,
    Quote,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Action {
    Create,
    Complete,
    Read,
    ReadAll,
    List,
    ListAll,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Limits {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub debit_amount: Option<Amount>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub receive_amount: Option<Amount>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccessItem {
    #[serde(rename = "type")]
    pub access_type: AccessType,
    pub actions: Vec<Action>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub identifier: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub limits: Option<Limits>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccessTokenRequest {
    pub access: Vec<AccessItem>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InteractFinish {
    pub method: String,
    pub uri: String,
    pub nonce: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InteractRequest {
    pub start: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub finish: Option<InteractFinish>,
}

impl InteractRequest {
    /// Redirect-start, redirect-finish interaction back to `uri`.
    pub fn redirect(uri: impl Into<String>, nonce: impl Into<String>) -> Self {
        Self {
            start: vec![REDIRECT_INTERACTION.to_string()],
            finish: Some(InteractFinish {
                method: REDIRECT_INTERACTION.to_string(),
                uri: uri.into(),
                nonce: nonce.into(),
            }),
        }
    }
}

/// Body of a grant request. The sending client adds its own `client` field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GrantRequest {
    pub access_token: AccessTokenRequest,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub interact: Option<InteractRequest>,
}

impl GrantRequest {
    /// Grant for a single access type with no interaction.
    pub fn non_interactive(access_type: AccessType, actions: &[Action]) -> Self {
        Self {
            access_token: AccessTokenRequest {
                access: vec![AccessItem {
                    access_type,
                    actions: actions.to_vec(),
                    identifier: None,
                    limits: None,
                }],
            },
            interact: None,
        }
    }

    pub fn is_interactive(&self) -> bool {
        self.interact.is_some()
    }

    /// Client nonce of the redirect-finish interaction, if any.
    pub fn finish_nonce(&self) -> Option<&str> {
        self.interact
            .as_ref()
            .and_then(|i| i.finish.as_ref())
            .map(|f| f.nonce.as_str())
    }
}

/// Token authorizing grant continuation. Never valid against a resource server.
#[derive(Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ContinuationToken(String);

impl ContinuationToken {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for ContinuationToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("ContinuationToken([REDACTED])")
    }
}

/// Access token for a resource server.
#[derive(Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AccessToken(String);

impl AccessToken {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for AccessToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("AccessToken([REDACTED])")
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContinueAccessToken {
    pub value: ContinuationToken,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Continue {
    pub access_token: ContinueAccessToken,
    pub uri: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub wait: Option<u64>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InteractResponse {
    pub redirect: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub finish: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccessTokenResponse {
    pub value: AccessToken,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub manage: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expires_in: Option<u64>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PendingGrantResponse {
    pub interact: InteractResponse,
    #[serde(rename = "continue")]
    pub continuation: Continue,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApprovedGrantResponse {
    pub access_token: AccessTokenResponse,
    #[serde(rename = "continue", default, skip_serializing_if = "Option::is_none")]
    pub continuation: Option<Continue>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WaitingGrantResponse {
    #[serde(rename = "continue")]
    pub continuation: Continue,
}

/// Response to a grant request or a grant continuation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum GrantResponse {
    /// Interaction required before a token is issued.
    Pending(PendingGrantResponse),
    Approved(ApprovedGrantResponse),
    /// Continuation accepted but the grant is not yet decided.
    Waiting(WaitingGrantResponse),
}

impl GrantResponse {
    pub fn kind(&self) -> &'static str {
        match self {
            GrantResponse::Pending(_) => "pending",
            GrantResponse::Approved(_) => "approved",
            GrantResponse::Waiting(_) => "waiting",
        }
    }
}

/// Body of a grant continuation request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContinueRequest {
    pub interact_ref: String,
}

/// Everything needed to continue a pending grant later.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GrantContinuation {
    pub access_token: ContinuationToken,
    pub uri: String,
}

/// An interactive grant awaiting user consent. Returned to the HTTP caller,
/// who must send the continuation values back with the interaction reference.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PendingGrant {
    pub interaction_redirect_uri: String,
    pub continuation_access_token: ContinuationToken,
    pub continuation_uri: String,
    /// Nonce this service sent in the finish request.
    pub client_nonce: String,
    /// Nonce the authorization server returned for the finish hash.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub finish_nonce: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub wait_seconds: Option<u64>,
}

impl PendingGrant {
    pub fn from_response(response: PendingGrantResponse, client_nonce: String) -> Self {
        Self {
            interaction_redirect_uri: response.interact.redirect,
            continuation_access_token: response.continuation.access_token.value,
            continuation_uri: response.continuation.uri,
            client_nonce,
            finish_nonce: response.interact.finish,
            wait_seconds: response.continuation.wait,
        }
    }

    pub fn continuation(&self) -> GrantContinuation {
        GrantContinuation {
            access_token: self.continuation_access_token.clone(),
            uri: self.continuation_uri.clone(),
        }
    }
}

/// A grant with a usable access token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FinalizedGrant {
    pub access_token: AccessToken,
    pub manage_uri: Option<String>,
    pub expires_in: Option<u64>,
}

impl From<AccessTokenResponse> for FinalizedGrant {
    fn from(token: AccessTokenResponse) -> Self {
        Self {
            access_token: token.value,
            manage_uri: token.manage,
            expires_in: token.expires_in,
        }
    }
}
