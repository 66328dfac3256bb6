use crate::models::{FeedbackRequest, FeedbackResponse, RouteRequest, RouteResponse};
use crate::routes::{error_response, AppState};
use crate::services::{FeedbackError, RoutingError};
use actix_web::{http::StatusCode, web, HttpResponse, Responder};
use serde::Deserialize;
use validator::Validate;

/// Configure feedback and routing routes
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg
        .route("/feedback", web::post().to(submit_feedback))
        .route("/feedback/summary", web::get().to(feedback_summary))
        .route("/feedback/{hospital_id}", web::get().to(recent_feedback))
        .route("/routes", web::post().to(route));
}

fn feedback_error_response(err: &FeedbackError) -> HttpResponse {
    match err {
        FeedbackError::InvalidInput(message) => {
            error_response(StatusCode::BAD_REQUEST, "Validation failed", message.clone())
        }
        _ => {
            tracing::error!("Feedback database error: {}", err);
            error_response(StatusCode::INTERNAL_SERVER_ERROR, "Feedback unavailable", err.to_string())
        }
    }
}

/// Record a rating
///
/// POST /api/v1/feedback
async fn submit_feedback(state: web::Data<AppState>, req: web::Json<FeedbackRequest>) -> impl Responder {
    if let Err(errors) = req.validate() {
        tracing::info!("Validation failed for feedback request: {:?}", errors);
        return error_response(StatusCode::BAD_REQUEST, "Validation failed", errors.to_string());
    }

    match state.feedback.save(&req.hospital_id, req.rating, &req.comment).await {
        Ok(feedback_id) => {
            tracing::info!("Recorded feedback {} for hospital {}", feedback_id, req.hospital_id);
            HttpResponse::Ok().json(FeedbackResponse {
                success: true,
                feedback_id,
            })
        }
        Err(e) => feedback_error_response(&e),
    }
}

async fn feedback_summary(state: web::Data<AppState>) -> impl Responder {
    match state.feedback.summary().await {
        Ok(summary) => HttpResponse::Ok().json(summary),
        Err(e) => feedback_error_response(&e),
    }
}

#[derive(Debug, Deserialize)]
struct RecentQuery {
    #[serde(default = "default_recent_limit")]
    limit: u32,
}

fn default_recent_limit() -> u32 {
    20
}

/// Latest feedback for one hospital
async fn recent_feedback(
    state: web::Data<AppState>,
    path: web::Path<String>,
    query: web::Query<RecentQuery>,
) -> impl Responder {
    let limit = query.limit.min(100);
    match state.feedback.recent(&path, limit).await {
        Ok(entries) => HttpResponse::Ok().json(entries),
        Err(e) => feedback_error_response(&e),
    }
}

/// Driving route between two points
///
/// Routing failures are reported in the body with `available: false`;
/// the recommendation itself never depends on them.
async fn route(state: web::Data<AppState>, req: web::Json<RouteRequest>) -> impl Responder {
    if let Err(errors) = req.validate() {
        return error_response(StatusCode::BAD_REQUEST, "Validation failed", errors.to_string());
    }

    let (from, to) = match (req.from.to_position(), req.to.to_position()) {
        (Ok(from), Ok(to)) => (from, to),
        (Err(e), _) | (_, Err(e)) => {
            return error_response(StatusCode::BAD_REQUEST, "Validation failed", e.to_string())
        }
    };

    let response = match state.routing.route(&from, &to).await {
        Ok(geometry) => RouteResponse {
            available: true,
            geometry: Some(geometry),
            reason: None,
        },
        Err(e) => {
            match &e {
                RoutingError::ApiKeyNotConfigured => tracing::debug!("Routing skipped: {}", e),
                _ => tracing::warn!("Routing failed: {}", e),
            }
            RouteResponse {
                available: false,
                geometry: None,
                reason: Some(e.to_string()),
            }
        }
    };

    HttpResponse::Ok().json(response)
}
