//! Router-level tests for the stub backend.

use axum::body::Body;
use axum::http::{Request, StatusCode};
use mock_backend::MockBackend;
use serde_json::{Value, json};
use tower::ServiceExt;

fn booking_json() -> Value {
    json!({
        "parentName": "Asha",
        "parentEmail": "asha@example.com",
        "parentPhone": "+91-9800000000",
        "childName": "Ravi",
        "childDob": "2023-04-18",
        "eventId": 12,
        "gameIds": [3, 7],
        "addOns": [],
        "totalAmount": 180000,
        "paymentMethod": "phonepe"
    })
}

fn post(uri: &str, body: &Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(serde_json::to_string(body).unwrap()))
        .unwrap()
}

async fn body_json(response: axum::response::Response) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

async fn create(backend: &MockBackend) -> String {
    let response = backend
        .router()
        .oneshot(post("/api/pending-bookings/create", &booking_json()))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    json["transactionId"].as_str().unwrap().to_string()
}

#[tokio::test]
async fn create_returns_receipt() {
    let backend = MockBackend::new();
    let response = backend
        .router()
        .oneshot(post("/api/pending-bookings/create", &booking_json()))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert!(json["transactionId"].as_str().unwrap().starts_with("TXN-"));
    assert_eq!(json["pendingBookingId"], 1);
    assert!(json["expiresAt"].as_str().is_some());
    assert_eq!(backend.record_count().await, 1);
}

#[tokio::test]
async fn create_then_get_roundtrips() {
    let backend = MockBackend::new();
    let transaction_id = create(&backend).await;

    let response = backend
        .router()
        .oneshot(post(
            "/api/pending-bookings/get",
            &json!({ "transaction_id": transaction_id }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["bookingData"], booking_json());
}

#[tokio::test]
async fn get_unknown_returns_404() {
    let backend = MockBackend::new();
    let response = backend
        .router()
        .oneshot(post(
            "/api/pending-bookings/get",
            &json!({ "transaction_id": "TXN-missing" }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn expired_record_returns_410_and_is_purged() {
    let backend = MockBackend::new();
    let transaction_id = create(&backend).await;
    backend.force_expire(&transaction_id).await;

    let lookup = json!({ "transaction_id": transaction_id });
    let response = backend
        .router()
        .oneshot(post("/api/pending-bookings/get", &lookup))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::GONE);
    assert_eq!(backend.record_count().await, 0);

    // A second read cannot tell the record ever existed.
    let response = backend
        .router()
        .oneshot(post("/api/pending-bookings/get", &lookup))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn recoverable_corruption_returns_207_with_raw_payload() {
    let backend = MockBackend::new();
    let transaction_id = create(&backend).await;
    backend.corrupt(&transaction_id, true).await;

    let response = backend
        .router()
        .oneshot(post(
            "/api/pending-bookings/get",
            &json!({ "transaction_id": transaction_id }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::MULTI_STATUS);
    let json = body_json(response).await;
    assert_eq!(json["needsCleanup"], true);
    let raw: Value = serde_json::from_str(json["rawBookingData"].as_str().unwrap()).unwrap();
    assert_eq!(raw, booking_json());
}

#[tokio::test]
async fn unrecoverable_corruption_returns_207_fragment() {
    let backend = MockBackend::new();
    let transaction_id = create(&backend).await;
    backend.corrupt(&transaction_id, false).await;

    let response = backend
        .router()
        .oneshot(post(
            "/api/pending-bookings/get",
            &json!({ "transaction_id": transaction_id }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::MULTI_STATUS);
    let json = body_json(response).await;
    assert_eq!(json["needsCleanup"], true);
    assert!(json.get("rawBookingData").is_none());
    assert_eq!(json["partialData"]["parentName"], "Asha");
}

#[tokio::test]
async fn delete_removes_the_record() {
    let backend = MockBackend::new();
    let transaction_id = create(&backend).await;
    let lookup = json!({ "transaction_id": transaction_id });

    let response = backend
        .router()
        .oneshot(post("/api/pending-bookings/delete", &lookup))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(backend.record_count().await, 0);

    let response = backend
        .router()
        .oneshot(post("/api/pending-bookings/delete", &lookup))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn injected_failures_drain() {
    let backend = MockBackend::new();
    backend.fail_next(1).await;

    let lookup = json!({ "transaction_id": "TXN-missing" });
    let response = backend
        .router()
        .oneshot(post("/api/pending-bookings/get", &lookup))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

    let response = backend
        .router()
        .oneshot(post("/api/pending-bookings/get", &lookup))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn requests_are_counted_per_route() {
    let backend = MockBackend::new();
    let transaction_id = create(&backend).await;
    let lookup = json!({ "transaction_id": transaction_id });

    backend
        .router()
        .oneshot(post("/api/pending-bookings/get", &lookup))
        .await
        .unwrap();
    backend
        .router()
        .oneshot(post("/api/pending-bookings/delete", &lookup))
        .await
        .unwrap();

    let hits = backend.hits().await;
    assert_eq!(hits.create, 1);
    assert_eq!(hits.get, 1);
    assert_eq!(hits.delete, 1);
}
