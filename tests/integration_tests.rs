// Integration tests for the HTTP surface

use actix_web::{http::StatusCode, test, web, App};
use ob_match::core::Ranker;
use ob_match::models::VulnerabilityWeights;
use ob_match::routes::{self, handle_json_payload_error, handle_query_payload_error, AppState};
use ob_match::services::{
    FeedbackStore, HospitalStore, RouteCache, RoutingClient, DEFAULT_ROUTING_ENDPOINT, SAMPLE_HOSPITALS_CSV,
};
use ob_match::core::ingest::DEFAULT_ENCODINGS;
use serde_json::{json, Value};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

fn temp_dataset(contents: &str) -> PathBuf {
    let path = std::env::temp_dir().join(format!("ob-match-it-{}.csv", uuid::Uuid::new_v4()));
    std::fs::write(&path, contents).unwrap();
    path
}

async fn test_state(path: &PathBuf) -> AppState {
    AppState {
        store: Arc::new(HospitalStore::new(path, DEFAULT_ENCODINGS.to_vec(), false)),
        feedback: Arc::new(FeedbackStore::in_memory().await.unwrap()),
        routing: Arc::new(
            RoutingClient::new(DEFAULT_ROUTING_ENDPOINT, None, Duration::from_secs(1))
                .unwrap()
                .with_cache(RouteCache::new(10, 60)),
        ),
        ranker: Ranker::with_default_weights(),
        vulnerability: VulnerabilityWeights::default(),
        default_top_n: 5,
        max_top_n: 100,
    }
}

macro_rules! app {
    ($state:expr) => {
        test::init_service(
            App::new()
                .app_data(web::Data::new($state))
                .app_data(web::JsonConfig::default().error_handler(handle_json_payload_error))
                .app_data(web::QueryConfig::default().error_handler(handle_query_payload_error))
                .configure(routes::configure_routes),
        )
        .await
    };
}

fn ids(body: &Value) -> Vec<String> {
    body["candidates"]
        .as_array()
        .unwrap()
        .iter()
        .map(|c| c["id"].as_str().unwrap().to_string())
        .collect()
}

#[actix_web::test]
async fn test_health_check() {
    let path = temp_dataset(SAMPLE_HOSPITALS_CSV);
    let app = app!(test_state(&path).await);

    let req = test::TestRequest::get().uri("/api/v1/health").to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;

    assert_eq!(body["status"], "healthy");
    assert_eq!(body["routingConfigured"], false);
    assert_eq!(body["routeCache"]["entries"], 0);
    std::fs::remove_file(path).ok();
}

#[actix_web::test]
async fn test_recommend_sample_dataset() {
    let path = temp_dataset(SAMPLE_HOSPITALS_CSV);
    let app = app!(test_state(&path).await);

    let req = test::TestRequest::post()
        .uri("/api/v1/hospitals/recommend")
        .set_json(json!({"lat": 37.5665, "lon": 126.978}))
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;

    // H001 is co-located; H003 is not accepting and sinks to the bottom
    assert_eq!(ids(&body), vec!["H001", "H004", "H002", "H003"]);
    assert_eq!(body["candidates"][0]["distanceKm"], 0.0);
    assert_eq!(body["candidates"][0]["score"], 4.0);
    assert_eq!(body["rowsIn"], 4);
    assert_eq!(body["rowsDropped"], 0);
    assert_eq!(body["encoding"], "utf-8");
    assert_eq!(body["table"].as_array().unwrap().len(), 4);
    assert_eq!(body["markers"].as_array().unwrap().len(), 5);
    assert_eq!(body["markers"][0]["kind"], "user");
    std::fs::remove_file(path).ok();
}

#[actix_web::test]
async fn test_recommend_radius_and_top_n() {
    let path = temp_dataset(SAMPLE_HOSPITALS_CSV);
    let app = app!(test_state(&path).await);

    let req = test::TestRequest::post()
        .uri("/api/v1/hospitals/recommend")
        .set_json(json!({"lat": 37.5665, "lon": 126.978, "radiusKm": 5.0, "topN": 1}))
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;

    assert_eq!(ids(&body), vec!["H001"]);
    assert_eq!(body["totalHospitals"], 4);
    std::fs::remove_file(path).ok();
}

#[actix_web::test]
async fn test_upload_radius_only_lists_every_hospital_inside() {
    let path = temp_dataset(SAMPLE_HOSPITALS_CSV);
    let app = app!(test_state(&path).await);

    // Ten hospitals, all well within 1 km of the user
    let mut csv = String::from("id,lat,lon\n");
    for i in 0..10 {
        csv.push_str(&format!("N{},{},126.978\n", i, 37.5665 + i as f64 * 0.0005));
    }

    let req = test::TestRequest::post()
        .uri("/api/v1/hospitals/upload?lat=37.5665&lon=126.978&radiusKm=10")
        .set_payload(csv)
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;

    assert_eq!(body["candidates"].as_array().unwrap().len(), 10);
    assert_eq!(body["outsideRadius"], 0);
    std::fs::remove_file(path).ok();
}

#[actix_web::test]
async fn test_upload_rejects_nan_radius() {
    let path = temp_dataset(SAMPLE_HOSPITALS_CSV);
    let app = app!(test_state(&path).await);

    let req = test::TestRequest::post()
        .uri("/api/v1/hospitals/upload?lat=37.5665&lon=126.978&radiusKm=NaN")
        .set_payload(SAMPLE_HOSPITALS_CSV)
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    std::fs::remove_file(path).ok();
}

#[actix_web::test]
async fn test_recommend_rejects_invalid_position() {
    let path = temp_dataset(SAMPLE_HOSPITALS_CSV);
    let app = app!(test_state(&path).await);

    let req = test::TestRequest::post()
        .uri("/api/v1/hospitals/recommend")
        .set_json(json!({"lat": 120.0, "lon": 126.978}))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    let req = test::TestRequest::post()
        .uri("/api/v1/hospitals/recommend")
        .insert_header(("content-type", "application/json"))
        .set_payload("{not json")
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["error"], "invalid_json");
    std::fs::remove_file(path).ok();
}

#[actix_web::test]
async fn test_recommend_csv_export() {
    let path = temp_dataset(SAMPLE_HOSPITALS_CSV);
    let app = app!(test_state(&path).await);

    let req = test::TestRequest::post()
        .uri("/api/v1/hospitals/recommend.csv")
        .set_json(json!({"lat": 37.5665, "lon": 126.978, "topN": 2}))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);
    assert!(resp.headers().get("content-type").unwrap().to_str().unwrap().starts_with("text/csv"));

    let body = test::read_body(resp).await;
    let text = std::str::from_utf8(&body).unwrap();
    let lines: Vec<&str> = text.lines().collect();
    assert_eq!(lines.len(), 3);
    assert!(lines[0].starts_with("rank,id,name,distanceKm,score"));
    assert!(lines[1].starts_with("1,H001,"));

    // Nothing within 1 km of Busan: header only
    let req = test::TestRequest::post()
        .uri("/api/v1/hospitals/recommend.csv")
        .set_json(json!({"lat": 35.1796, "lon": 129.0756, "radiusKm": 1.0}))
        .to_request();
    let body = test::call_and_read_body(&app, req).await;
    let text = std::str::from_utf8(&body).unwrap();
    assert_eq!(text.lines().count(), 1);
    assert!(text.starts_with("rank,id,name,distanceKm,score"));
    std::fs::remove_file(path).ok();
}

#[actix_web::test]
async fn test_upload_cp949_dataset() {
    let path = temp_dataset(SAMPLE_HOSPITALS_CSV);
    let app = app!(test_state(&path).await);

    let text = "기관명,병원위도,병원경도,대표전화\n성북모자병원,37.5891,127.0164,02-123-4567\n잘못된행,,127.0\n";
    let (bytes, _, _) = encoding_rs::EUC_KR.encode(text);

    let req = test::TestRequest::post()
        .uri("/api/v1/hospitals/upload?lat=37.5665&lon=126.978")
        .insert_header(("content-type", "text/csv"))
        .set_payload(bytes.into_owned())
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;

    assert_eq!(body["encoding"], "cp949");
    assert_eq!(body["rowsIn"], 2);
    assert_eq!(body["rowsDropped"], 1);
    assert_eq!(body["candidates"][0]["name"], "성북모자병원");
    assert_eq!(body["table"][0]["telLink"], "tel:02-123-4567");
    std::fs::remove_file(path).ok();
}

#[actix_web::test]
async fn test_upload_without_coordinates_is_unprocessable() {
    let path = temp_dataset(SAMPLE_HOSPITALS_CSV);
    let app = app!(test_state(&path).await);

    let req = test::TestRequest::post()
        .uri("/api/v1/hospitals/upload?lat=37.5665&lon=126.978")
        .set_payload("name,tel\nA,02-000-0000\n")
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);

    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["statusCode"], 422);
    std::fs::remove_file(path).ok();
}

#[actix_web::test]
async fn test_status_update_changes_ranking() {
    let path = temp_dataset(SAMPLE_HOSPITALS_CSV);
    let app = app!(test_state(&path).await);

    let req = test::TestRequest::put()
        .uri("/api/v1/hospitals/H001/status")
        .set_json(json!({"accepting": false}))
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["success"], true);

    let req = test::TestRequest::post()
        .uri("/api/v1/hospitals/recommend")
        .set_json(json!({"lat": 37.5665, "lon": 126.978}))
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(ids(&body)[0], "H004");

    let req = test::TestRequest::put()
        .uri("/api/v1/hospitals/H999/status")
        .set_json(json!({"waiting": 1}))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    std::fs::remove_file(path).ok();
}

#[actix_web::test]
async fn test_feedback_and_vulnerability_report() {
    let path = temp_dataset(SAMPLE_HOSPITALS_CSV);
    let app = app!(test_state(&path).await);

    for rating in [5, 3] {
        let req = test::TestRequest::post()
            .uri("/api/v1/feedback")
            .set_json(json!({"hospitalId": "H001", "rating": rating, "comment": "ok"}))
            .to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["success"], true);
    }

    let req = test::TestRequest::post()
        .uri("/api/v1/feedback")
        .set_json(json!({"hospitalId": "H001", "rating": 6}))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    let req = test::TestRequest::get().uri("/api/v1/feedback/summary").to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body[0]["hospitalId"], "H001");
    assert_eq!(body[0]["avgRating"], 4.0);
    assert_eq!(body[0]["count"], 2);

    let req = test::TestRequest::get().uri("/api/v1/feedback/H001?limit=1").to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body.as_array().unwrap().len(), 1);
    assert_eq!(body[0]["rating"], 3);

    let req = test::TestRequest::get().uri("/api/v1/reports/vulnerability").to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    let rows = body.as_array().unwrap();
    assert_eq!(rows.len(), 4);
    // H001: rating gap (5 - 4) * 5 + waiting 2 * 2
    assert_eq!(rows[0]["vulnerability"], 9.0);
    // H003: closed, no beds, no feedback: 50 + 25 + 20
    assert_eq!(rows[2]["vulnerability"], 95.0);

    let req = test::TestRequest::get().uri("/api/v1/reports/vulnerability.csv").to_request();
    let body = test::call_and_read_body(&app, req).await;
    assert_eq!(std::str::from_utf8(&body).unwrap().lines().count(), 5);
    std::fs::remove_file(path).ok();
}

#[actix_web::test]
async fn test_route_without_key_degrades() {
    let path = temp_dataset(SAMPLE_HOSPITALS_CSV);
    let app = app!(test_state(&path).await);

    let req = test::TestRequest::post()
        .uri("/api/v1/routes")
        .set_json(json!({
            "from": {"lat": 37.5665, "lon": 126.978},
            "to": {"lat": 37.5891, "lon": 127.0164}
        }))
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;

    assert_eq!(body["available"], false);
    assert!(body["geometry"].is_null());
    assert!(body["reason"].as_str().unwrap().contains("not configured"));
    std::fs::remove_file(path).ok();
}

#[actix_web::test]
async fn test_missing_dataset_is_server_error() {
    let path = std::env::temp_dir().join(format!("ob-match-missing-{}.csv", uuid::Uuid::new_v4()));
    let app = app!(test_state(&path).await);

    let req = test::TestRequest::post()
        .uri("/api/v1/hospitals/recommend")
        .set_json(json!({"lat": 37.5665, "lon": 126.978}))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
}
