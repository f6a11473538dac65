use serde::{Deserialize, Serialize};

use crate::error::OpenPaymentsError;
use crate::wallet::WalletAddress;

/// An amount in a wallet's asset. `value` is an unsigned integer in the
/// asset's smallest unit, carried as a string on the wire.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Amount {
    pub value: String,
    pub asset_code: String,
    pub asset_scale: u8,
}

impl Amount {
    pub fn in_wallet_asset(value: impl Into<String>, wallet: &WalletAddress) -> Self {
        Self {
            value: value.into(),
            asset_code: wallet.asset_code.clone(),
            asset_scale: wallet.asset_scale,
        }
    }

    /// Numeric value, if it fits.
    pub fn as_u128(&self) -> Option<u128> {
        self.value.parse().ok()
    }
}

/// Check that `value` is a non-empty string of ASCII digits.
pub fn validate_amount_value(field: &str, value: &str) -> Result<(), OpenPaymentsError> {
    if value.is_empty() {
        return Err(OpenPaymentsError::invalid(format!("{field} is required")));
    }
    if !value.bytes().all(|b| b.is_ascii_digit()) {
        return Err(OpenPaymentsError::invalid(format!(
            "{field} must be an unsigned integer string, got {value:?}"
        )));
    }
    Ok(())
}

/// A grant limit as supplied by a caller: either a bare value in the payer's
/// asset, or a full amount whose asset must match the payer's wallet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum LimitAmount {
    Value(String),
    Full(Amount),
}

impl LimitAmount {
    pub fn value(&self) -> &str {
        match self {
            LimitAmount::Value(v) => v,
            LimitAmount::Full(a) => &a.value,
        }
    }

    /// Syntactic checks that need no wallet metadata.
    pub fn validate(&self, field: &str) -> Result<(), OpenPaymentsError> {
        validate_amount_value(field, self.value())
    }

    /// Produce the limit amount in the payer wallet's asset.
    pub fn resolve(&self, field: &str, wallet: &WalletAddress) -> Result<Amount, OpenPaymentsError> {
        match self {
            LimitAmount::Value(v) => Ok(Amount::in_wallet_asset(v.clone(), wallet)),
            LimitAmount::Full(amount) => {
                if amount.asset_code != wallet.asset_code || amount.asset_scale != wallet.asset_scale
                {
                    return Err(OpenPaymentsError::invalid(format!(
                        "{field} is in {}/{} but wallet {} holds {}/{}",
                        amount.asset_code,
                        amount.asset_scale,
                        wallet.id,
                        wallet.asset_code,
                        wallet.asset_scale
                    )));
                }
                Ok(amount.clone())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn usd_wallet() -> WalletAddress {
        WalletAddress {
            id: "https://wallet.example/payer".to_string(),
            public_name: None,
            asset_code: "USD".to_string(),
            asset_scale: 2,
            auth_server: "https://auth.wallet.example".to_string(),
            resource_server: None,
        }
    }

    #[test]
    fn test_validate_amount_value() {
        assert!(validate_amount_value("debitAmount", "100").is_ok());
        assert!(validate_amount_value("debitAmount", "0").is_ok());
        assert!(validate_amount_value("debitAmount", "").is_err());
        assert!(validate_amount_value("debitAmount", "-5").is_err());
        assert!(validate_amount_value("debitAmount", "1.50").is_err());
        assert!(validate_amount_value("debitAmount", " 10").is_err());
    }

    #[test]
    fn test_limit_deserializes_both_forms() {
        let bare: LimitAmount = serde_json::from_str(r#""100""#).unwrap();
        assert_eq!(bare, LimitAmount::Value("100".to_string()));

        let full: LimitAmount =
            serde_json::from_str(r#"{"value":"95","assetCode":"USD","assetScale":2}"#).unwrap();
        assert_eq!(full.value(), "95");
        assert!(matches!(full, LimitAmount::Full(_)));
    }

    #[test]
    fn test_bare_limit_inherits_wallet_asset() {
        let amount = LimitAmount::Value("100".to_string())
            .resolve("debitAmount", &usd_wallet())
            .unwrap();
        assert_eq!(amount.asset_code, "USD");
        assert_eq!(amount.asset_scale, 2);
        assert_eq!(amount.as_u128(), Some(100));
    }

    #[test]
    fn test_full_limit_must_match_wallet() {
        let eur = LimitAmount::Full(Amount {
            value: "100".to_string(),
            asset_code: "EUR".to_string(),
            asset_scale: 2,
        });
        assert!(matches!(
            eur.resolve("debitAmount", &usd_wallet()),
            Err(OpenPaymentsError::InvalidInput(_))
        ));

        let wrong_scale = LimitAmount::Full(Amount {
            value: "100".to_string(),
            asset_code: "USD".to_string(),
            asset_scale: 9,
        });
        assert!(wrong_scale.resolve("debitAmount", &usd_wallet()).is_err());
    }
}
