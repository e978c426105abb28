//! http api

use crate::{AppState, Error, Result, SubmissionRequest, WebhookOutcome};
use actix_web::{get, post, web, HttpResponse, Responder, Scope};
use sea_orm::ActiveEnum;
use serde::{Deserialize, Serialize};
use serde_json::json;

pub const CARGO_PKG_VERSION: Option<&'static str> = option_env!("CARGO_PKG_VERSION");

fn version() -> String {
    CARGO_PKG_VERSION.map(ToOwned::to_owned).unwrap_or_default()
}

pub fn scope() -> Scope {
    web::scope("/v1")
        .service(info)
        .service(create_payment)
        .service(webhook)
        .service(cancel_subscription)
        .service(refund_transaction)
        .service(campaign_total)
        .service(methods)
}

#[get("/info")]
pub async fn info(state: web::Data<AppState>) -> Result<HttpResponse, Error> {
    Ok(HttpResponse::Ok().json(json!({
        "version": version(),
        "mode": state.service.mode().to_value(),
    })))
}

/// donation form submission
#[post("/payments")]
pub async fn create_payment(
    state: web::Data<AppState>,
    data: web::Json<SubmissionRequest>,
) -> Result<impl Responder, Error> {
    match state.service.submit_donation(&data).await {
        Ok(res) => Ok(web::Json(json!({
            "success": true,
            "url": res.url,
            "transaction_id": res.transaction_id,
        }))),
        // the donor gets a generic message, never which check failed
        Err(Error::InvalidRequest(_)) | Err(Error::Vendor(_)) => Ok(web::Json(json!({
            "success": false,
            "message": "The donation could not be processed",
        }))),
        Err(e) => Err(e),
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct WebhookReq {
    id: String,
}

/// vendor webhook ping, form encoded `id=<vendor payment id>`
#[post("/webhook")]
pub async fn webhook(
    state: web::Data<AppState>,
    data: web::Form<WebhookReq>,
) -> Result<impl Responder, Error> {
    // local failure propagates as 500 so the vendor retries
    let _outcome: WebhookOutcome = state.service.handle_webhook(&data.id).await?;
    Ok(HttpResponse::Ok().finish())
}

#[post("/subscriptions/{id}/cancel")]
pub async fn cancel_subscription(
    state: web::Data<AppState>,
    path: web::Path<i32>,
) -> Result<impl Responder, Error> {
    state.service.cancel_subscription(path.into_inner()).await?;
    Ok(web::Json(json!({"success": true})))
}

#[post("/transactions/{id}/refund")]
pub async fn refund_transaction(
    state: web::Data<AppState>,
    path: web::Path<i32>,
) -> Result<impl Responder, Error> {
    state.service.refund_transaction(path.into_inner()).await?;
    Ok(web::Json(json!({"success": true})))
}

#[get("/campaigns/{id}/total")]
pub async fn campaign_total(
    state: web::Data<AppState>,
    path: web::Path<i32>,
) -> Result<impl Responder, Error> {
    let total = state.service.campaign_total(path.into_inner()).await?;
    Ok(web::Json(json!({ "total": total })))
}

#[get("/methods")]
pub async fn methods(state: web::Data<AppState>) -> Result<impl Responder, Error> {
    let methods = state.service.active_methods().await?;
    Ok(web::Json(json!({ "methods": methods })))
}
