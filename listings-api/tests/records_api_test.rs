//! Records API Integration Tests
//!
//! Tests full HTTP request/response cycles for the listings endpoints

use axum::body::Body;
use axum::http::{Request, StatusCode};
use http_body_util::BodyExt;
use serde_json::{json, Value};
use tower::ServiceExt;

use listings_api::api;
use listings_api::db;

async fn setup_test_app() -> (axum::Router, tempfile::TempDir) {
    let temp_dir = tempfile::tempdir().expect("Failed to create temp directory");
    let db_path = temp_dir.path().join("test_listings.db");
    let db_url = format!("sqlite:{}", db_path.display());

    let pool = db::connect(&db_url)
        .await
        .expect("Failed to open listings database");

    let app = api::router().with_state(api::ApiState { db: pool });
    (app, temp_dir)
}

async fn json_response(app: &axum::Router, req: Request<Body>) -> (StatusCode, Value) {
    let response = app.clone().oneshot(req).await.expect("Request failed");
    let status = response.status();
    let body = response
        .into_body()
        .collect()
        .await
        .expect("Failed to read body")
        .to_bytes();
    let value: Value = serde_json::from_slice(&body).expect("Invalid JSON response");
    (status, value)
}

fn get(uri: &str) -> Request<Body> {
    Request::builder()
        .method("GET")
        .uri(uri)
        .body(Body::empty())
        .unwrap()
}

fn with_json(method: &str, uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

async fn create(app: &axum::Router, body: Value) -> Value {
    let (status, created) = json_response(app, with_json("POST", "/records", body)).await;
    assert_eq!(status, StatusCode::CREATED);
    created
}

async fn seed(app: &axum::Router) {
    create(
        app,
        json!({"name": "Sunrise PG", "price": 4000, "lat": 28.61, "lng": 77.20, "location": "South Delhi"}),
    )
    .await;
    create(
        app,
        json!({"name": "Lakeview PG", "price": 7500, "lat": 28.53, "lng": 77.39, "location": "Noida", "available": false}),
    )
    .await;
    create(
        app,
        json!({"name": "Draft PG", "price": 3000, "lat": null, "lng": null, "location": "delhi cantt"}),
    )
    .await;
}

#[tokio::test]
async fn test_health_check() {
    let (app, _temp_dir) = setup_test_app().await;

    let (status, body) = json_response(&app, get("/health")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["service"], "listings-api");
}

#[tokio::test]
async fn test_list_records_empty() {
    let (app, _temp_dir) = setup_test_app().await;

    let (status, body) = json_response(&app, get("/records")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!([]));
}

#[tokio::test]
async fn test_create_record_assigns_id() {
    let (app, _temp_dir) = setup_test_app().await;

    let created = create(
        &app,
        json!({"name": "Sunrise PG", "price": 4000, "lat": 28.61, "lng": 77.20, "location": "Delhi"}),
    )
    .await;
    let id = created["id"].as_str().expect("id should be a string");
    assert_eq!(id.len(), 26); // ULID length
    assert_eq!(created["name"], "Sunrise PG");
    assert_eq!(created["price"], 4000.0);
    assert_eq!(created["available"], true);

    let (_, all) = json_response(&app, get("/records")).await;
    let all = all.as_array().unwrap();
    assert_eq!(all.len(), 1);
    assert_eq!(all[0]["id"], id);
}

#[tokio::test]
async fn test_create_record_rejects_invalid_price() {
    let (app, _temp_dir) = setup_test_app().await;

    let (status, body) = json_response(
        &app,
        with_json("POST", "/records", json!({"name": "Bad PG", "price": -5})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["success"], false);
    assert!(body["error"].as_str().unwrap().contains("price"));
}

#[tokio::test]
async fn test_list_records_availability_filter() {
    let (app, _temp_dir) = setup_test_app().await;
    seed(&app).await;

    let (_, all) = json_response(&app, get("/records")).await;
    assert_eq!(all.as_array().unwrap().len(), 3);

    let (_, available) = json_response(&app, get("/records?available=true")).await;
    let names: Vec<&str> = available
        .as_array()
        .unwrap()
        .iter()
        .map(|r| r["name"].as_str().unwrap())
        .collect();
    assert_eq!(names, vec!["Sunrise PG", "Draft PG"]);
}

#[tokio::test]
async fn test_search_by_max_price() {
    let (app, _temp_dir) = setup_test_app().await;
    seed(&app).await;

    let (status, body) = json_response(&app, get("/records/search?maxPrice=5000")).await;
    assert_eq!(status, StatusCode::OK);
    let records = body.as_array().unwrap();
    assert_eq!(records.len(), 2);
    assert!(records.iter().all(|r| r["price"].as_f64().unwrap() <= 5000.0));
}

#[tokio::test]
async fn test_search_location_is_case_insensitive_substring() {
    let (app, _temp_dir) = setup_test_app().await;
    seed(&app).await;

    let (_, body) = json_response(&app, get("/records/search?location=DELHI")).await;
    let names: Vec<&str> = body
        .as_array()
        .unwrap()
        .iter()
        .map(|r| r["name"].as_str().unwrap())
        .collect();
    assert_eq!(names, vec!["Sunrise PG", "Draft PG"]);

    let (_, body) =
        json_response(&app, get("/records/search?location=delhi&maxPrice=3500")).await;
    assert_eq!(body.as_array().unwrap().len(), 1);
    assert_eq!(body[0]["name"], "Draft PG");
}

#[tokio::test]
async fn test_search_location_folds_non_ascii_case() {
    let (app, _temp_dir) = setup_test_app().await;
    create(
        &app,
        json!({"name": "Grenzhaus PG", "price": 5200, "lat": 47.37, "lng": 8.54, "location": "ÜBERSTADT"}),
    )
    .await;
    seed(&app).await;

    // "überstadt", percent-encoded
    let (status, body) =
        json_response(&app, get("/records/search?location=%C3%BCberstadt")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body.as_array().unwrap().len(), 1);
    assert_eq!(body[0]["name"], "Grenzhaus PG");
    assert_eq!(body[0]["location"], "ÜBERSTADT");

    // A renamed location is matched by its new label only.
    let id = body[0]["id"].as_str().unwrap().to_string();
    let (status, _) = json_response(
        &app,
        with_json("PUT", &format!("/records/{id}"), json!({"location": "Ödland"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let (_, body) = json_response(&app, get("/records/search?location=%C3%B6dland")).await;
    assert_eq!(body.as_array().unwrap().len(), 1);
    let (_, body) = json_response(&app, get("/records/search?location=%C3%BCberstadt")).await;
    assert_eq!(body, json!([]));
}

#[tokio::test]
async fn test_search_rejects_malformed_query_values() {
    let (app, _temp_dir) = setup_test_app().await;
    seed(&app).await;

    let (status, body) = json_response(&app, get("/records/search?maxPrice=abc")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["success"], false);
    assert!(body["error"].as_str().unwrap().contains("maxPrice"));

    let (status, body) = json_response(&app, get("/records?available=maybe")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["success"], false);

    // An empty maxPrice is treated as absent.
    let (status, body) = json_response(&app, get("/records/search?maxPrice=")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body.as_array().unwrap().len(), 3);
}

#[tokio::test]
async fn test_search_without_criteria_returns_everything() {
    let (app, _temp_dir) = setup_test_app().await;
    seed(&app).await;

    let (_, all) = json_response(&app, get("/records")).await;
    let (_, searched) = json_response(&app, get("/records/search")).await;
    assert_eq!(all, searched);
}

#[tokio::test]
async fn test_update_record_partial() {
    let (app, _temp_dir) = setup_test_app().await;
    let created = create(
        &app,
        json!({"name": "Sunrise PG", "price": 4000, "lat": 28.61, "lng": 77.20, "location": "Delhi"}),
    )
    .await;
    let id = created["id"].as_str().unwrap();

    let (status, updated) = json_response(
        &app,
        with_json(
            "PUT",
            &format!("/records/{id}"),
            json!({"price": 4500, "available": false}),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(updated["id"], id);
    assert_eq!(updated["price"], 4500.0);
    assert_eq!(updated["available"], false);
    assert_eq!(updated["name"], "Sunrise PG");
    assert_eq!(updated["lat"], 28.61);

    let (_, all) = json_response(&app, get("/records")).await;
    assert_eq!(all[0], updated);
}

#[tokio::test]
async fn test_update_unknown_record_is_not_found() {
    let (app, _temp_dir) = setup_test_app().await;

    let (status, body) = json_response(
        &app,
        with_json("PUT", "/records/does-not-exist", json!({"price": 1})),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["success"], false);
}
