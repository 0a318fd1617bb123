use actix_web::HttpResponse;
use serde_json::json;

use crate::error::ApiError;
use crate::utils::ApiResponse;

/// Health check endpoint
pub async fn health() -> Result<HttpResponse, ApiError> {
    Ok(ApiResponse::ok(
        json!({
            "status": "healthy",
            "service": "videotube",
            "timestamp": chrono::Utc::now().to_rfc3339()
        }),
        "OK",
    ))
}
