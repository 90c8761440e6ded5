use actix_web::{HttpResponse, Responder, get, post, web};
use serde_json::json;

use crate::forms::checkout::QuoteRequest;
use crate::forms::receipts::{ReceiptAck, ReceiptPayload};
use crate::repository::DieselRepository;
use crate::services::{ServiceError, checkout as checkout_service, pricing, receipts};

#[post("/v1/quote")]
/// Price the selection held by the calling form, optionally toggling one unit first.
pub async fn api_v1_quote(web::Json(request): web::Json<QuoteRequest>) -> impl Responder {
    match pricing::quote(request) {
        Ok(quote) => HttpResponse::Ok().json(quote),
        Err(ServiceError::Form(message)) => {
            HttpResponse::BadRequest().json(json!({ "error": message }))
        }
        Err(err) => {
            log::error!("Failed to price selection: {err}");
            HttpResponse::InternalServerError().finish()
        }
    }
}

#[post("/v1/receipts")]
/// Record a payment receipt. Repeated notifications for a reference succeed without a new record.
pub async fn api_v1_receipts(
    web::Json(payload): web::Json<ReceiptPayload>,
    repo: web::Data<DieselRepository>,
) -> impl Responder {
    let repo = repo.get_ref().clone();

    match web::block(move || receipts::record_receipt(&repo, payload)).await {
        Ok(Ok(ack)) => HttpResponse::Ok().json(ack),
        Ok(Err(ServiceError::Form(message))) => {
            HttpResponse::BadRequest().json(ReceiptAck::rejected(message))
        }
        Ok(Err(err)) => {
            log::error!("Failed to record receipt: {err}");
            HttpResponse::InternalServerError().json(ReceiptAck::rejected("Receipt not recorded"))
        }
        Err(err) => {
            log::error!("Receipt worker failed: {err}");
            HttpResponse::InternalServerError().json(ReceiptAck::rejected("Receipt not recorded"))
        }
    }
}

#[get("/v1/checkouts/{reference}")]
/// Status, amount and result page of a checkout attempt. Payer details are not returned.
pub async fn api_v1_checkout(
    reference: web::Path<String>,
    repo: web::Data<DieselRepository>,
) -> impl Responder {
    let reference = reference.into_inner();
    let lookup = reference.clone();
    let repo = repo.get_ref().clone();

    match web::block(move || checkout_service::load_checkout_status(&repo, &lookup)).await {
        Ok(Ok(status)) => HttpResponse::Ok().json(status),
        Ok(Err(ServiceError::NotFound)) => HttpResponse::NotFound().finish(),
        Ok(Err(err)) => {
            log::error!("Failed to load checkout {reference}: {err}");
            HttpResponse::InternalServerError().finish()
        }
        Err(err) => {
            log::error!("Checkout lookup worker failed: {err}");
            HttpResponse::InternalServerError().finish()
        }
    }
}
