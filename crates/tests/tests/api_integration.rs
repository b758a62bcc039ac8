use std::path::PathBuf;

use axum::body::{to_bytes, Body};
use axum::http::{Request, StatusCode};
use axum::Router;
use serde_json::{json, Value};
use tower::ServiceExt;
use walks_api::{build_router, ApiState};
use walks_catalog::Catalog;
use walks_core::AppConfig;
use walks_recommender::RecommenderBackend;

fn fixture_catalog() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("fixtures/places.jsonl")
}

fn app() -> Router {
    let mut config = AppConfig::default();
    config.catalog.path = fixture_catalog().display().to_string();

    let catalog = Catalog::load(fixture_catalog(), &config.catalog.strip_prefixes)
        .expect("fixture catalog should load");

    build_router(ApiState::new(config, catalog, RecommenderBackend::proximity()))
}

async fn read_json(response: axum::response::Response) -> Value {
    let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&body).unwrap()
}

fn post_route(body: String) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/api/generate-route")
        .header("content-type", "application/json")
        .body(Body::from(body))
        .unwrap()
}

#[tokio::test]
async fn health_reports_catalog_and_backend() {
    let response = app()
        .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert!(response.headers().contains_key("x-request-id"));

    let parsed = read_json(response).await;
    assert_eq!(parsed["status"], "ok");
    assert_eq!(parsed["recommender"], "proximity");
    assert_eq!(parsed["catalog"]["places_loaded"], 7);
    assert_eq!(parsed["catalog"]["records_skipped"], 1);
    assert_eq!(parsed["metrics"]["route_requests_total"], 0);
    assert_eq!(parsed["metrics"]["recommender_failures"]["timeout"], 0);
}

#[tokio::test]
async fn config_exposes_public_settings_only() {
    let response = app()
        .oneshot(Request::builder().uri("/api/config").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let parsed = read_json(response).await;
    assert_eq!(parsed["app_name"], "Volga Vibes");
    assert_eq!(parsed["walk_settings"]["places_count"]["default"], 5);
    assert_eq!(parsed["map"]["default_zoom"], 13);
    assert!(parsed.get("api").is_none());
    assert!(parsed.get("catalog").is_none());
}

#[tokio::test]
async fn places_lists_catalog_with_display_names() {
    let response = app()
        .oneshot(Request::builder().uri("/api/places").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let parsed = read_json(response).await;
    let places = parsed.as_array().unwrap();
    assert_eq!(places.len(), 7);
    assert_eq!(places[0]["name"], "Кремль");
    assert_eq!(places[0]["address"], "г. Нижний Новгород, Кремль");
    assert_eq!(places[2]["id"], 3);
    assert_eq!(places[6]["name"], "Дзержинск, площадь Ленина");
}

#[tokio::test]
async fn nearby_is_sorted_and_bounded() {
    let response = app()
        .oneshot(
            Request::builder()
                .uri("/api/places/nearby?lat=56.3269&lon=44.0059&radius=3")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let parsed = read_json(response).await;
    let places = parsed.as_array().unwrap();
    assert_eq!(places.len(), 5);
    assert_eq!(places[0]["id"], 1);

    let distances = places
        .iter()
        .map(|place| place["distance_from_user"].as_f64().unwrap())
        .collect::<Vec<_>>();
    assert!(distances.windows(2).all(|pair| pair[0] <= pair[1]));
    assert!(distances.iter().all(|distance| *distance <= 3.0));
}

#[tokio::test]
async fn generate_route_returns_exact_count() {
    let request = post_route(
        json!({
            "name": "Анна",
            "age": 31,
            "interests": "история, архитектура",
            "latitude": 56.3269,
            "longitude": 44.0059,
            "radius": 3,
            "places_count": 3,
            "return_to_start": true
        })
        .to_string(),
    );

    let response = app().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let parsed = read_json(response).await;
    let route = parsed["route"].as_array().unwrap();
    assert_eq!(route.len(), 3);
    assert!(route
        .iter()
        .all(|stop| !stop["selection_reason"].as_str().unwrap().is_empty()));
    assert!(parsed["total_distance_km"].as_f64().unwrap() > 0.0);
    assert!(parsed["estimated_time_hours"].as_f64().unwrap() >= 1.5);
    assert_eq!(parsed["user_location"]["lat"], 56.3269);
}

#[tokio::test]
async fn generate_route_uses_defaults_for_missing_fields() {
    let response = app()
        .oneshot(post_route(json!({ "places_count": 2 }).to_string()))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let parsed = read_json(response).await;
    assert_eq!(parsed["route"].as_array().unwrap().len(), 2);
    assert_eq!(parsed["user_location"]["lon"], 44.0059);
}

#[tokio::test]
async fn too_many_places_is_a_client_error() {
    let request = post_route(
        json!({
            "latitude": 56.3269,
            "longitude": 44.0059,
            "radius": 3,
            "places_count": 8
        })
        .to_string(),
    );

    let response = app().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let parsed = read_json(response).await;
    assert_eq!(parsed["error"], "insufficient_candidates");
    let message = parsed["message"].as_str().unwrap();
    assert!(message.contains('5'));
    assert!(message.contains('8'));
}

#[tokio::test]
async fn invalid_input_is_rejected() {
    let out_of_range = app()
        .oneshot(post_route(json!({ "latitude": 123.0, "longitude": 44.0 }).to_string()))
        .await
        .unwrap();
    assert_eq!(out_of_range.status(), StatusCode::BAD_REQUEST);
    assert_eq!(read_json(out_of_range).await["error"], "invalid_request");

    let not_json = app()
        .oneshot(post_route("{ not json".to_string()))
        .await
        .unwrap();
    assert_eq!(not_json.status(), StatusCode::BAD_REQUEST);
    assert_eq!(read_json(not_json).await["error"], "invalid_request");
}
