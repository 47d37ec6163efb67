use actix_web::{
    HttpResponse, post,
    http::header::ContentType,
    web::{Bytes, Data},
};

use crate::admission::AdmissionGate;

/// Validating webhook endpoint for etcd pod deletions.
///
/// Always answers `200 OK` with an `AdmissionReview`: failures are expressed as
/// a denial inside the review, never as an HTTP error the API server would
/// have to interpret through the webhook's failure policy.
#[post("/etcd")]
pub async fn validate_etcd_pod(gate: Data<AdmissionGate>, body: Bytes) -> HttpResponse {
    let response = gate.review(&body).await;

    HttpResponse::Ok()
        .insert_header(ContentType::json())
        .body(response)
}
