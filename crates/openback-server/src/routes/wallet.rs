use actix_web::{web, HttpResponse};
use serde::Deserialize;

use openback::resolve_wallet_address;

use crate::error::ApiError;
use crate::metrics::REQUESTS_TOTAL;
use crate::routes::success;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WalletQuery {
    #[serde(default)]
    pub wallet_address: String,
}

/// GET /wallet-details?walletAddress=
pub async fn wallet_details(
    query: web::Query<WalletQuery>,
    state: web::Data<AppState>,
) -> Result<HttpResponse, ApiError> {
    REQUESTS_TOTAL.with_label_values(&["wallet_details"]).inc();
    let wallet = resolve_wallet_address(state.client.as_ref(), &query.wallet_address).await?;
    Ok(success(wallet))
}

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.route("/wallet-details", web::get().to(wallet_details));
}
