use axum::{
    body::Body,
    http::{Request, StatusCode},
    Router,
};
use chrono::{Duration, Utc};
use serde_json::{json, Value};
use skyline_api::{app, AppState};
use skyline_core::memory::InMemoryStore;
use skyline_core::models::{Flight, Schedule};
use skyline_store::app_config::RateLimitConfig;
use skyline_store::RedisClient;
use std::sync::Arc;
use tower::ServiceExt;
use uuid::Uuid;

struct Fixture {
    app: Router,
    flight_id: Uuid,
    open_schedule: Uuid,
    sold_out_schedule: Uuid,
}

fn setup() -> Fixture {
    setup_with(|state| state)
}

fn setup_with(configure: impl FnOnce(AppState) -> AppState) -> Fixture {
    let store = InMemoryStore::new();

    let flight = Flight::new("SK300", "LHR", "JFK", 470);
    store.insert_flight(flight.clone());
    store.insert_flight(Flight::new("SK100", "CDG", "FRA", 75));
    store.insert_flight(Flight::new("SK200", "SIN", "HND", 410));

    let now = Utc::now();
    let past = Schedule::new(flight.id, now - Duration::days(2), now - Duration::days(2) + Duration::hours(8), 10);
    let open = Schedule::new(flight.id, now + Duration::days(3), now + Duration::days(3) + Duration::hours(8), 10);
    let sold_out = Schedule::new(flight.id, now + Duration::days(5), now + Duration::days(5) + Duration::hours(8), 0);

    let fixture_ids = (open.id, sold_out.id);
    store.insert_schedule(past);
    store.insert_schedule(open);
    store.insert_schedule(sold_out);

    Fixture {
        app: app(configure(AppState::in_memory(store))),
        flight_id: flight.id,
        open_schedule: fixture_ids.0,
        sold_out_schedule: fixture_ids.1,
    }
}

async fn send(app: &Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, body)
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

fn post_json(uri: &str, payload: Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(payload.to_string()))
        .unwrap()
}

fn post(uri: &str) -> Request<Body> {
    Request::builder().method("POST").uri(uri).body(Body::empty()).unwrap()
}

fn booking(schedule_id: Uuid, email: &str) -> Value {
    json!({
        "schedule_id": schedule_id,
        "passenger_name": "Jane Doe",
        "passenger_email": email,
    })
}

async fn open_seats(fixture: &Fixture) -> i64 {
    let (_, schedules) = send(
        &fixture.app,
        get(&format!("/api/flights/{}/schedules", fixture.flight_id)),
    )
    .await;
    schedules
        .as_array()
        .unwrap()
        .iter()
        .find(|s| s["id"] == json!(fixture.open_schedule))
        .map(|s| s["available_seats"].as_i64().unwrap())
        .unwrap()
}

#[tokio::test]
async fn test_health() {
    let fixture = setup();
    let (status, body) = send(&fixture.app, get("/health")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
}

#[tokio::test]
async fn test_list_flights_sorted_ascending() {
    let fixture = setup();
    let (status, body) = send(&fixture.app, get("/api/flights?sort=asc")).await;

    assert_eq!(status, StatusCode::OK);
    let numbers: Vec<&str> = body
        .as_array()
        .unwrap()
        .iter()
        .map(|f| f["flight_number"].as_str().unwrap())
        .collect();
    assert_eq!(numbers, vec!["SK100", "SK200", "SK300"]);
}

#[tokio::test]
async fn test_list_flights_unknown_sort_returns_all() {
    let fixture = setup();
    let (status, body) = send(&fixture.app, get("/api/flights?sort=desc")).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body.as_array().unwrap().len(), 3);
}

#[tokio::test]
async fn test_get_flight() {
    let fixture = setup();

    let (status, body) = send(&fixture.app, get(&format!("/api/flights/{}", fixture.flight_id))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["flight_number"], "SK300");
    assert_eq!(body["origin"], "LHR");

    let (status, body) = send(&fixture.app, get(&format!("/api/flights/{}", Uuid::new_v4()))).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert!(body["error"].as_str().unwrap().contains("Flight"));
}

#[tokio::test]
async fn test_schedules_default_to_future_departures() {
    let fixture = setup();
    let (status, body) = send(
        &fixture.app,
        get(&format!("/api/flights/{}/schedules", fixture.flight_id)),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    let schedules = body.as_array().unwrap();
    assert_eq!(schedules.len(), 2);
    assert_eq!(schedules[0]["id"], json!(fixture.open_schedule));
    assert!(schedules[0].get("version").is_none());
}

#[tokio::test]
async fn test_schedules_after_explicit_date() {
    let fixture = setup();
    let after = (Utc::now() + Duration::days(4)).format("%Y-%m-%dT%H:%M:%S");
    let (status, body) = send(
        &fixture.app,
        get(&format!("/api/flights/{}/schedules?date={}", fixture.flight_id, after)),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    let schedules = body.as_array().unwrap();
    assert_eq!(schedules.len(), 1);
    assert_eq!(schedules[0]["id"], json!(fixture.sold_out_schedule));
}

#[tokio::test]
async fn test_schedules_malformed_date_is_bad_request() {
    let fixture = setup();
    let (status, body) = send(
        &fixture.app,
        get(&format!("/api/flights/{}/schedules?date=next-tuesday", fixture.flight_id)),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().contains("next-tuesday"));
}

#[tokio::test]
async fn test_create_ticket_takes_a_seat() {
    let fixture = setup();
    let (status, body) = send(
        &fixture.app,
        post_json("/api/tickets", booking(fixture.open_schedule, "jane.doe@example.com")),
    )
    .await;

    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["status"], "BOOKED");
    assert_eq!(body["schedule_id"], json!(fixture.open_schedule));
    assert_eq!(open_seats(&fixture).await, 9);
}

#[tokio::test]
async fn test_create_ticket_rejects_invalid_email() {
    let fixture = setup();
    let (status, body) = send(
        &fixture.app,
        post_json("/api/tickets", booking(fixture.open_schedule, "not-an-email")),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Invalid email format");
    assert_eq!(open_seats(&fixture).await, 10);
}

#[tokio::test]
async fn test_create_ticket_unknown_schedule() {
    let fixture = setup();
    let (status, _) = send(
        &fixture.app,
        post_json("/api/tickets", booking(Uuid::new_v4(), "jane.doe@example.com")),
    )
    .await;

    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_create_ticket_sold_out() {
    let fixture = setup();
    let (status, body) = send(
        &fixture.app,
        post_json("/api/tickets", booking(fixture.sold_out_schedule, "jane.doe@example.com")),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().contains("No seats available"));
}

#[tokio::test]
async fn test_get_ticket() {
    let fixture = setup();
    let (_, created) = send(
        &fixture.app,
        post_json("/api/tickets", booking(fixture.open_schedule, "jane.doe@example.com")),
    )
    .await;
    let ticket_id = created["id"].as_str().unwrap();

    let (status, body) = send(&fixture.app, get(&format!("/api/tickets/{}", ticket_id))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["passenger_name"], "Jane Doe");
    assert_eq!(body["status"], "BOOKED");

    let (status, _) = send(&fixture.app, get(&format!("/api/tickets/{}", Uuid::new_v4()))).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_cancel_ticket_releases_seat_once() {
    let fixture = setup();
    let (_, created) = send(
        &fixture.app,
        post_json("/api/tickets", booking(fixture.open_schedule, "jane.doe@example.com")),
    )
    .await;
    let ticket_id = created["id"].as_str().unwrap();
    assert_eq!(open_seats(&fixture).await, 9);

    let (status, body) = send(&fixture.app, post(&format!("/api/tickets/{}/cancel", ticket_id))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "CANCELLED");
    assert_eq!(open_seats(&fixture).await, 10);

    let (status, body) = send(&fixture.app, post(&format!("/api/tickets/{}/cancel", ticket_id))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().contains("already cancelled"));
    assert_eq!(open_seats(&fixture).await, 10);
}

#[tokio::test]
async fn test_cancel_unknown_ticket() {
    let fixture = setup();
    let (status, _) = send(&fixture.app, post(&format!("/api/tickets/{}/cancel", Uuid::new_v4()))).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_create_ticket_missing_field_is_json_bad_request() {
    let fixture = setup();
    let payload = json!({
        "schedule_id": fixture.open_schedule,
        "passenger_name": "Jane Doe",
    });
    let (status, body) = send(&fixture.app, post_json("/api/tickets", payload)).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().contains("passenger_email"));
    assert_eq!(open_seats(&fixture).await, 10);
}

#[tokio::test]
async fn test_create_ticket_without_json_content_type() {
    let fixture = setup();
    let request = Request::builder()
        .method("POST")
        .uri("/api/tickets")
        .body(Body::from(booking(fixture.open_schedule, "jane.doe@example.com").to_string()))
        .unwrap();
    let (status, body) = send(&fixture.app, request).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].is_string());
}

#[tokio::test]
async fn test_malformed_ids_are_json_bad_requests() {
    let fixture = setup();

    for request in [
        get("/api/tickets/not-a-uuid"),
        get("/api/flights/not-a-uuid"),
        get("/api/flights/not-a-uuid/schedules"),
        post("/api/tickets/not-a-uuid/cancel"),
    ] {
        let (status, body) = send(&fixture.app, request).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["error"].is_string());
    }
}

#[tokio::test]
async fn test_rate_limiter_fails_open_when_redis_is_down() {
    // Nothing listens on port 1, so every limiter check errors.
    let redis = RedisClient::new("redis://127.0.0.1:1/").unwrap();
    let fixture = setup_with(|state| {
        state.with_rate_limiter(
            Arc::new(redis),
            RateLimitConfig {
                max_requests: 1,
                window_seconds: 60,
            },
        )
    });

    for _ in 0..3 {
        let (status, body) = send(&fixture.app, get("/api/flights")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body.as_array().unwrap().len(), 3);
    }
}
