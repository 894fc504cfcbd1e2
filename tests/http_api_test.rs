mod common;

use axum::Router;
use axum::body::Body;
use axum::http::{Method, Request, StatusCode};
use common::{FakeGateway, charge_with_status, redirect_charge, scan_code_charge, server_config};
use http_body_util::BodyExt;
use ppro_checkout::domain::ports::PaymentGatewayRef;
use ppro_checkout::interfaces::http::{AppState, router};
use serde_json::{Value, json};
use std::sync::Arc;
use tower::ServiceExt;

fn app(gateway: &Arc<FakeGateway>) -> Router {
    let gateway_ref: PaymentGatewayRef = gateway.clone();
    router(AppState::with_gateway(&server_config(), gateway_ref))
}

async fn send(
    app: &Router,
    method: Method,
    uri: &str,
    body: Option<Value>,
    idempotency_key: Option<&str>,
) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    if body.is_some() {
        builder = builder.header("content-type", "application/json");
    }
    if let Some(key) = idempotency_key {
        builder = builder.header("x-idempotency-key", key);
    }
    let body = body
        .map(|v| Body::from(serde_json::to_vec(&v).unwrap()))
        .unwrap_or_else(Body::empty);

    let response = app
        .clone()
        .oneshot(builder.body(body).unwrap())
        .await
        .unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let json = if bytes.is_empty() {
        json!({})
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, json)
}

#[tokio::test]
async fn test_create_ideal_payment() {
    let gateway = Arc::new(FakeGateway::with_charge(redirect_charge(
        "charge_1",
        "https://bank.example/auth",
    )));
    let app = app(&gateway);

    let (status, body) = send(
        &app,
        Method::POST,
        "/api/payments/create",
        Some(json!({ "method": "ideal", "currency": "EUR", "amount": 11979 })),
        None,
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);
    assert_eq!(body["chargeId"], "charge_1");
    assert_eq!(body["redirectUrl"], "https://bank.example/auth");
    assert!(body.get("qrCode").is_none());
    assert_eq!(body["amount"], 11979);
    assert_eq!(body["currency"], "EUR");
}

#[tokio::test]
async fn test_create_bancontact_qr_payment() {
    let gateway = Arc::new(FakeGateway::with_charge(scan_code_charge(
        "charge_qr",
        "BEP://1+qr",
    )));
    let app = app(&gateway);

    let (status, body) = send(
        &app,
        Method::POST,
        "/api/payments/create",
        Some(json!({ "method": "bancontactqr", "currency": "EUR", "amount": 11979 })),
        None,
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["qrCode"], "BEP://1+qr");
    assert!(body.get("redirectUrl").is_none());
}

#[tokio::test]
async fn test_idempotency_header_replays_response() {
    let gateway = Arc::new(FakeGateway::with_charge(redirect_charge(
        "charge_1",
        "https://bank.example/auth",
    )));
    let app = app(&gateway);
    let body = json!({ "method": "ideal", "currency": "EUR", "amount": 11979 });

    let (_, first) = send(&app, Method::POST, "/api/payments/create", Some(body.clone()), Some("k1")).await;
    let (_, second) = send(&app, Method::POST, "/api/payments/create", Some(body), Some("k1")).await;

    assert_eq!(first, second);
    assert_eq!(gateway.charge_calls(), 1);
}

#[tokio::test]
async fn test_missing_fields_is_bad_request() {
    let gateway = Arc::new(FakeGateway::default());
    let app = app(&gateway);

    let (status, body) = send(
        &app,
        Method::POST,
        "/api/payments/create",
        Some(json!({ "method": "ideal", "currency": "EUR" })),
        None,
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Missing required fields");
    assert!(body.get("details").is_none());
}

#[tokio::test]
async fn test_invalid_method_is_bad_request() {
    let gateway = Arc::new(FakeGateway::default());
    let app = app(&gateway);

    let (status, body) = send(
        &app,
        Method::POST,
        "/api/payments/create",
        Some(json!({ "method": "sofort", "currency": "EUR", "amount": 100 })),
        None,
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Invalid payment method");
}

#[tokio::test]
async fn test_unparseable_body_is_bad_request() {
    let gateway = Arc::new(FakeGateway::default());
    let app = app(&gateway);

    let request = Request::builder()
        .method(Method::POST)
        .uri("/api/payments/create")
        .header("content-type", "application/json")
        .body(Body::from("{not json"))
        .unwrap();
    let response = app.oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_gateway_failure_is_server_error() {
    let gateway = Arc::new(FakeGateway::failing(422, "Unsupported currency for method"));
    let app = app(&gateway);

    let (status, body) = send(
        &app,
        Method::POST,
        "/api/payments/create",
        Some(json!({ "method": "blik", "currency": "PLN", "amount": 11979 })),
        None,
    )
    .await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["error"], "Unsupported currency for method");
    assert!(body["details"].is_string());
}

#[tokio::test]
async fn test_payment_status() {
    let gateway = Arc::new(FakeGateway::with_charge(charge_with_status(
        "charge_1",
        "CAPTURED",
    )));
    let app = app(&gateway);

    let (status, body) = send(
        &app,
        Method::GET,
        "/api/payments/status/charge_1?orderId=ORDER-1",
        None,
        None,
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["chargeId"], "charge_1");
    assert_eq!(body["status"], "CAPTURED");
    assert_eq!(body["category"], "success");
    assert_eq!(body["amount"], 11979);
    assert_eq!(body["currency"], "EUR");
    let redirect = body["redirectUrl"].as_str().unwrap();
    assert!(redirect.starts_with("https://shop.example/payment-return?"));
    assert!(redirect.contains("orderId=ORDER-1"));
    assert!(redirect.contains("status=CAPTURED"));
    assert!(redirect.contains("chargeId=charge_1"));
}

#[tokio::test]
async fn test_payment_status_gateway_error() {
    let gateway = Arc::new(FakeGateway::failing(404, "Charge not found"));
    let app = app(&gateway);

    let (status, body) = send(&app, Method::GET, "/api/payments/status/nope", None, None).await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["error"], "Charge not found");
}

#[tokio::test]
async fn test_health() {
    let gateway = Arc::new(FakeGateway::default());
    let app = app(&gateway);

    let (status, body) = send(&app, Method::GET, "/health", None, None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
    assert_eq!(body["ppro"]["merchantId"], "merchant-test");
    assert!(body["timestamp"].is_string());
}

#[tokio::test]
async fn test_api_index_lists_methods() {
    let gateway = Arc::new(FakeGateway::default());
    let app = app(&gateway);

    let (status, body) = send(&app, Method::GET, "/api", None, None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        body["supportedMethods"],
        json!(["IDEAL", "BLIK", "BANCONTACT", "BANCONTACTQR"])
    );
}

#[tokio::test]
async fn test_payment_return_classifies_status() {
    let gateway = Arc::new(FakeGateway::default());
    let app = app(&gateway);

    let (status, body) = send(
        &app,
        Method::GET,
        "/payment-return?orderId=ORDER-1&status=AUTHENTICATION_PENDING&method=IDEAL",
        None,
        None,
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["orderId"], "ORDER-1");
    assert_eq!(body["category"], "pending");
}
