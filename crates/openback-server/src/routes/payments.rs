use actix_web::{web, HttpResponse};
use chrono::{DateTime, Utc};
use serde::Deserialize;

use openback::wallet::parse_wallet_address;
use openback::{
    resolve_wallet_address, ContinuationToken, GrantContinuation, GrantContinuationHandler,
    GrantNegotiator, OpenPaymentsError, OutgoingPaymentGrantRequest, PaymentExecutor,
    PaymentReceiver,
};

use crate::error::ApiError;
use crate::metrics::{GRANTS_FINALIZED, GRANTS_REQUESTED, PAYMENTS_CREATED, REQUESTS_TOTAL};
use crate::routes::success;
use crate::state::AppState;

/// Values the caller carries back after the user returns from the
/// authorization server.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateOutgoingPaymentBody {
    pub wallet_address: String,
    pub continue_access_token: String,
    pub continue_uri: String,
    pub interact_ref: String,
    #[serde(alias = "qouteId")]
    pub quote_id: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateIncomingBody {
    pub wallet_address: String,
    pub value: String,
    #[serde(default)]
    pub expires_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateQuoteBody {
    pub wallet_address: String,
    #[serde(alias = "incomingPaymentUrl")]
    pub receiver: String,
}

/// POST /outgoing-payment-authorization - Start an interactive grant
pub async fn outgoing_payment_authorization(
    body: web::Json<OutgoingPaymentGrantRequest>,
    state: web::Data<AppState>,
) -> Result<HttpResponse, ApiError> {
    REQUESTS_TOTAL
        .with_label_values(&["outgoing_payment_authorization"])
        .inc();

    let pending = GrantNegotiator::new(state.client.as_ref())
        .request_outgoing_payment_grant(&body)
        .await?;

    GRANTS_REQUESTED.inc();
    Ok(success(pending))
}

/// POST /create-outgoing-payment - Continue the grant, then pay against the quote
pub async fn create_outgoing_payment(
    body: web::Json<CreateOutgoingPaymentBody>,
    state: web::Data<AppState>,
) -> Result<HttpResponse, ApiError> {
    REQUESTS_TOTAL
        .with_label_values(&["create_outgoing_payment"])
        .inc();
    let body = body.into_inner();

    // Continuation can only be redeemed once, so reject bad payment input first.
    parse_wallet_address(&body.wallet_address)?;
    if body.quote_id.trim().is_empty() {
        return Err(OpenPaymentsError::InvalidInput("quoteId is required".to_string()).into());
    }

    let continuation = GrantContinuation {
        access_token: ContinuationToken::new(body.continue_access_token),
        uri: body.continue_uri,
    };
    let grant = GrantContinuationHandler::new(state.client.as_ref())
        .continue_grant(&continuation, &body.interact_ref)
        .await?;
    GRANTS_FINALIZED.inc();

    let payment = PaymentExecutor::new(state.client.as_ref())
        .create_outgoing_payment(grant, &body.wallet_address, &body.quote_id)
        .await?;

    PAYMENTS_CREATED.with_label_values(&["outgoing"]).inc();
    Ok(success(payment))
}

/// POST /create-incoming - Incoming payment on the receiving wallet
pub async fn create_incoming(
    body: web::Json<CreateIncomingBody>,
    state: web::Data<AppState>,
) -> Result<HttpResponse, ApiError> {
    REQUESTS_TOTAL.with_label_values(&["create_incoming"]).inc();
    let client = state.client.as_ref();

    let wallet = resolve_wallet_address(client, &body.wallet_address).await?;
    let incoming = PaymentReceiver::new(client)
        .create_incoming_payment(&wallet, &body.value, body.expires_at)
        .await?;

    PAYMENTS_CREATED.with_label_values(&["incoming"]).inc();
    Ok(success(incoming))
}

/// POST /create-quote - Quote paying `receiver` from the sending wallet
pub async fn create_quote(
    body: web::Json<CreateQuoteBody>,
    state: web::Data<AppState>,
) -> Result<HttpResponse, ApiError> {
    REQUESTS_TOTAL.with_label_values(&["create_quote"]).inc();
    let client = state.client.as_ref();

    let wallet = resolve_wallet_address(client, &body.wallet_address).await?;
    let quote = PaymentReceiver::new(client)
        .create_quote(&wallet, &body.receiver)
        .await?;

    PAYMENTS_CREATED.with_label_values(&["quote"]).inc();
    Ok(success(quote))
}

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.route(
        "/outgoing-payment-authorization",
        web::post().to(outgoing_payment_authorization),
    )
    .route(
        "/create-outgoing-payment",
        web::post().to(create_outgoing_payment),
    )
    .route("/create-incoming", web::post().to(create_incoming))
    .route("/create-quote", web::post().to(create_quote));
}
