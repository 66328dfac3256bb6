use crate::core::{load_table, project_markers, project_table, rows_to_csv, vulnerability_report, IngestError, LoadedTable};
use crate::models::{
    HealthResponse, RecommendRequest, RecommendResponse, SearchContext, StatusUpdateRequest,
    StatusUpdateResponse,
};
use crate::routes::{error_response, AppState};
use crate::services::StoreError;
use actix_web::{http::StatusCode, web, HttpResponse, Responder};
use validator::Validate;

const CSV_CONTENT_TYPE: &str = "text/csv; charset=utf-8";

/// Configure hospital, report and health routes
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg
        .route("/health", web::get().to(health_check))
        .route("/hospitals/recommend", web::post().to(recommend))
        .route("/hospitals/recommend.csv", web::post().to(recommend_csv))
        .route("/hospitals/upload", web::post().to(recommend_upload))
        .route("/hospitals/{id}/status", web::put().to(update_status))
        .route("/reports/vulnerability", web::get().to(vulnerability))
        .route("/reports/vulnerability.csv", web::get().to(vulnerability_csv));
}

/// Health check endpoint
async fn health_check(state: web::Data<AppState>) -> impl Responder {
    let db_healthy = state.feedback.health_check().await.unwrap_or(false);
    if !db_healthy {
        tracing::warn!("Feedback database is unavailable");
    }

    let status = if db_healthy { "healthy" } else { "degraded" };

    HttpResponse::Ok().json(HealthResponse {
        status: status.to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        timestamp: chrono::Utc::now(),
        routing_configured: state.routing.is_configured(),
        route_cache: state.routing.cache_stats(),
    })
}

fn store_error_response(err: &StoreError) -> HttpResponse {
    match err {
        StoreError::Ingest(e) => ingest_error_response(e),
        StoreError::Io { .. } | StoreError::Csv(_) => {
            tracing::error!("Hospital dataset error: {}", err);
            error_response(StatusCode::INTERNAL_SERVER_ERROR, "Dataset unavailable", err.to_string())
        }
    }
}

fn ingest_error_response(err: &IngestError) -> HttpResponse {
    tracing::info!("Rejected hospital dataset: {}", err);
    error_response(StatusCode::UNPROCESSABLE_ENTITY, "Unreadable dataset", err.to_string())
}

/// Validate a recommendation request and turn it into a search context
fn search_context(state: &AppState, req: &RecommendRequest) -> Result<SearchContext, HttpResponse> {
    if let Err(errors) = req.validate() {
        tracing::info!("Validation failed for recommend request: {:?}", errors);
        return Err(error_response(StatusCode::BAD_REQUEST, "Validation failed", errors.to_string()));
    }

    req.to_context(state.default_top_n, state.max_top_n)
        .map_err(|e| error_response(StatusCode::BAD_REQUEST, "Validation failed", e.to_string()))
}

/// Rank, then project into table rows and map markers
fn build_recommendation(state: &AppState, context: &SearchContext, table: LoadedTable) -> RecommendResponse {
    let total_hospitals = table.records.len();
    let result = state.ranker.rank(context, table.records);

    tracing::info!(
        "Ranked {} of {} hospitals around ({:.4}, {:.4}), {} outside radius",
        result.candidates.len(),
        total_hospitals,
        context.position.lat(),
        context.position.lon(),
        result.outside_radius
    );

    RecommendResponse {
        table: project_table(&result.candidates),
        markers: project_markers(&context.position, &result.candidates),
        candidates: result.candidates,
        total_hospitals,
        rows_in: table.report.rows_in,
        rows_dropped: table.report.rows_dropped(),
        outside_radius: result.outside_radius,
        encoding: table.encoding.label().to_string(),
    }
}

async fn recommend_from_store(state: &AppState, req: &RecommendRequest) -> Result<RecommendResponse, HttpResponse> {
    let context = search_context(state, req)?;
    let table = state.store.load().await.map_err(|e| store_error_response(&e))?;
    Ok(build_recommendation(state, &context, table))
}

/// Recommend hospitals from the stored dataset
///
/// POST /api/v1/hospitals/recommend
///
/// Request body:
/// ```json
/// {
///   "lat": 37.5665,
///   "lon": 126.978,
///   "radiusKm": 10.0,
///   "topN": 5
/// }
/// ```
async fn recommend(state: web::Data<AppState>, req: web::Json<RecommendRequest>) -> impl Responder {
    match recommend_from_store(&state, &req).await {
        Ok(response) => HttpResponse::Ok().json(response),
        Err(response) => response,
    }
}

/// Same as `recommend`, exported as CSV
async fn recommend_csv(state: web::Data<AppState>, req: web::Json<RecommendRequest>) -> impl Responder {
    let response = match recommend_from_store(&state, &req).await {
        Ok(response) => response,
        Err(response) => return response,
    };

    match rows_to_csv(&response.table) {
        Ok(body) => HttpResponse::Ok().content_type(CSV_CONTENT_TYPE).body(body),
        Err(e) => {
            tracing::error!("Failed to export recommendation table: {}", e);
            error_response(StatusCode::INTERNAL_SERVER_ERROR, "Export failed", e.to_string())
        }
    }
}

/// Recommend hospitals from an uploaded CSV file
///
/// POST /api/v1/hospitals/upload?lat=37.5665&lon=126.978&radiusKm=10&topN=5
///
/// The body is the raw file in any configured encoding. Nothing is stored.
async fn recommend_upload(
    state: web::Data<AppState>,
    query: web::Query<RecommendRequest>,
    body: web::Bytes,
) -> impl Responder {
    let context = match search_context(&state, &query) {
        Ok(context) => context,
        Err(response) => return response,
    };

    tracing::info!("Received hospital upload of {} bytes", body.len());

    let table = match load_table(&body, state.store.encodings(), state.store.aliases()) {
        Ok(table) => table,
        Err(e) => return ingest_error_response(&e),
    };

    HttpResponse::Ok().json(build_recommendation(&state, &context, table))
}

/// Administrative status update
///
/// PUT /api/v1/hospitals/{id}/status
async fn update_status(
    state: web::Data<AppState>,
    path: web::Path<String>,
    req: web::Json<StatusUpdateRequest>,
) -> impl Responder {
    let id = path.into_inner();
    let req = req.into_inner();

    if req.is_empty() {
        return error_response(
            StatusCode::BAD_REQUEST,
            "Validation failed",
            "at least one of accepting, waiting, capacityResource is required",
        );
    }

    let update = req.into_update(id.clone());
    match state.store.update_status(&update).await {
        Ok(true) => {
            tracing::info!("Updated status of hospital {}: {:?}", id, update);
            HttpResponse::Ok().json(StatusUpdateResponse { success: true, id })
        }
        Ok(false) => HttpResponse::NotFound().json(StatusUpdateResponse { success: false, id }),
        Err(e) => store_error_response(&e),
    }
}

async fn vulnerability_rows(state: &AppState) -> Result<Vec<crate::models::VulnerabilityRow>, HttpResponse> {
    let table = state.store.load().await.map_err(|e| store_error_response(&e))?;
    let summary = state.feedback.summary().await.map_err(|e| {
        tracing::error!("Failed to read feedback summary: {}", e);
        error_response(StatusCode::INTERNAL_SERVER_ERROR, "Feedback unavailable", e.to_string())
    })?;

    Ok(vulnerability_report(&table.records, &summary, &state.vulnerability))
}

/// Per-hospital vulnerability report
async fn vulnerability(state: web::Data<AppState>) -> impl Responder {
    match vulnerability_rows(&state).await {
        Ok(rows) => HttpResponse::Ok().json(rows),
        Err(response) => response,
    }
}

async fn vulnerability_csv(state: web::Data<AppState>) -> impl Responder {
    let rows = match vulnerability_rows(&state).await {
        Ok(rows) => rows,
        Err(response) => return response,
    };

    match rows_to_csv(&rows) {
        Ok(body) => HttpResponse::Ok().content_type(CSV_CONTENT_TYPE).body(body),
        Err(e) => {
            tracing::error!("Failed to export vulnerability report: {}", e);
            error_response(StatusCode::INTERNAL_SERVER_ERROR, "Export failed", e.to_string())
        }
    }
}
