pub mod orders;

use actix_web::HttpResponse;
use chrono::Utc;
use serde_json::json;

/// GET /api/v1/health
#[utoipa::path(
    get,
    path = "/api/v1/health",
    responses((status = 200, description = "Service is up")),
    tag = "health"
)]
pub async fn health() -> HttpResponse {
    HttpResponse::Ok().json(json!({
        "status": "UP",
        "service": "order-service",
        "timestamp": Utc::now().timestamp(),
    }))
}
