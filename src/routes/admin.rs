/// Admin Routes
///
/// File server hit metrics.

use actix_web::{web, HttpResponse};
use serde::{Deserialize, Serialize};

use crate::metrics::Metrics;

#[derive(Serialize, Deserialize)]
pub struct MetricsResponse {
    pub file_server_hits: u64,
}

/// GET /admin/metrics
pub async fn get_metrics(metrics: web::Data<Metrics>) -> HttpResponse {
    HttpResponse::Ok().json(MetricsResponse {
        file_server_hits: metrics.file_server_hits(),
    })
}

/// POST /admin/reset
pub async fn reset_metrics(metrics: web::Data<Metrics>) -> HttpResponse {
    metrics.reset();
    tracing::info!("File server hit counter reset");
    HttpResponse::Ok().json(MetricsResponse { file_server_hits: 0 })
}
