use base64::Engine;

use crate::wallet::parse_wallet_address;

pub const CLIENT_ADDRESS_VAR: &str = "OPEN_PAYMENTS_CLIENT_ADDRESS";
pub const PRIVATE_KEY_VAR: &str = "OPEN_PAYMENTS_KEY_64";
pub const KEY_ID_VAR: &str = "OPEN_PAYMENTS_KEY_ID";

/// Identity this service presents to Open Payments servers.
///
/// Read once at startup and handed to the client; never re-read per request.
#[derive(Clone)]
pub struct ClientCredentials {
    /// The client's own wallet address, sent as `client` in grant requests.
    pub wallet_address_url: String,
    /// Identifier of the client's key in its published JWKS.
    pub key_id: String,
    /// Decoded private key material for a signing [`RequestSigner`](crate::signer::RequestSigner).
    pub private_key: Vec<u8>,
}

impl std::fmt::Debug for ClientCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClientCredentials")
            .field("wallet_address_url", &self.wallet_address_url)
            .field("key_id", &self.key_id)
            .field("private_key", &"[REDACTED]")
            .finish()
    }
}

impl ClientCredentials {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Build credentials from an arbitrary variable source.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let required = |name: &'static str| {
            lookup(name)
                .filter(|v| !v.trim().is_empty())
                .ok_or(ConfigError::MissingRequired(name))
        };

        let wallet_address = required(CLIENT_ADDRESS_VAR)?;
        let wallet_address_url = parse_wallet_address(&wallet_address)
            .map_err(|_| ConfigError::InvalidUrl(wallet_address.clone()))?
            .to_string();

        let encoded_key = required(PRIVATE_KEY_VAR)?;
        let private_key = base64::engine::general_purpose::STANDARD
            .decode(encoded_key.trim())
            .map_err(|e| ConfigError::InvalidKey(format!("{PRIVATE_KEY_VAR} is not base64: {e}")))?;
        if private_key.is_empty() {
            return Err(ConfigError::InvalidKey(format!("{PRIVATE_KEY_VAR} is empty")));
        }

        let key_id = required(KEY_ID_VAR)?;

        Ok(Self {
            wallet_address_url,
            key_id,
            private_key,
        })
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("missing required environment variable: {0}")]
    MissingRequired(&'static str),

    #[error("invalid URL: {0}")]
    InvalidUrl(String),

    #[error("invalid key: {0}")]
    InvalidKey(String),
}
