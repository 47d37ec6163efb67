use actix_web::{Responder, get, web};
use metrics_exporter_prometheus::PrometheusHandle;

#[get("/metrics")]
pub async fn metrics(metrics_handle: web::ThinData<PrometheusHandle>) -> impl Responder {
    metrics_handle.render()
}
