mod common;

use common::{FakeGateway, charge_with_status, redirect_charge, scan_code_charge, server_config};
use ppro_checkout::domain::method::{Currency, PaymentMethod};
use ppro_checkout::domain::payment::PaymentRequest;
use ppro_checkout::domain::ports::PaymentGatewayRef;
use ppro_checkout::error::CheckoutError;
use ppro_checkout::interfaces::checkout::api::{CheckoutApi, HttpCheckoutApi};
use ppro_checkout::interfaces::checkout::checkout_page::{
    CheckoutController, CheckoutForm, CheckoutNext,
};
use ppro_checkout::interfaces::checkout::qr_page::QrPageParams;
use ppro_checkout::interfaces::http::{AppState, router};
use std::sync::Arc;
use std::sync::atomic::Ordering;

/// Serves the router on an ephemeral port and returns the API base URL.
async fn spawn_server(gateway: &Arc<FakeGateway>) -> String {
    let gateway_ref: PaymentGatewayRef = gateway.clone();
    let app = router(AppState::with_gateway(&server_config(), gateway_ref));
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{addr}/api")
}

fn form(method: PaymentMethod) -> CheckoutForm {
    let mut form = CheckoutForm::default();
    form.select_currency(method.currency());
    form.select_method(method).unwrap();
    form
}

#[tokio::test]
async fn test_redirect_placeholder_is_replaced() {
    let gateway = Arc::new(FakeGateway::with_charge(redirect_charge(
        "charge_42",
        "https://bank.example/auth?charge={{chargeId}}",
    )));
    let api = Arc::new(HttpCheckoutApi::new(spawn_server(&gateway).await));

    let next = CheckoutController::new(api)
        .with_form(form(PaymentMethod::Ideal))
        .submit()
        .await
        .unwrap();

    assert_eq!(
        next,
        CheckoutNext::Redirect {
            url: "https://bank.example/auth?charge=charge_42".into()
        }
    );
    let keys = gateway.idempotency_keys.lock().unwrap().clone();
    assert_eq!(keys.len(), 1);
    assert!(keys[0].as_deref().is_some_and(|k| k.contains('-')));
}

#[tokio::test]
async fn test_qr_response_opens_qr_page() {
    let gateway = Arc::new(FakeGateway::with_charge(scan_code_charge("charge_qr", "BEP://1+qr")));
    let api = Arc::new(HttpCheckoutApi::new(spawn_server(&gateway).await));

    let next = CheckoutController::new(api)
        .with_form(form(PaymentMethod::BancontactQr))
        .submit()
        .await
        .unwrap();

    let order_id = match &next {
        CheckoutNext::QrPage { params, .. } => params.order_id.clone(),
        other => panic!("expected the QR page, got {other:?}"),
    };
    assert!(order_id.as_deref().is_some_and(|o| o.starts_with("ORDER-")));

    let expected = QrPageParams {
        order_id,
        charge_id: Some("charge_qr".into()),
        qr_data: Some("BEP://1+qr".into()),
        payment_method: Some("bancontactqr".into()),
        amount: Some(11979),
        currency: Some("EUR".into()),
    };
    assert_eq!(
        next,
        CheckoutNext::QrPage {
            url: expected.to_url(),
            params: expected,
        }
    );
    assert!(next.url().starts_with("/qr-payment?"));
}

#[tokio::test]
async fn test_each_submit_uses_a_fresh_key() {
    let gateway = Arc::new(FakeGateway::with_charge(redirect_charge(
        "charge_1",
        "https://bank.example/auth",
    )));
    let api = Arc::new(HttpCheckoutApi::new(spawn_server(&gateway).await));
    let controller = CheckoutController::new(api).with_form(form(PaymentMethod::Blik));

    controller.submit().await.unwrap();
    controller.submit().await.unwrap();

    assert_eq!(gateway.charge_calls(), 2);
    let payload = gateway.last_payload().unwrap();
    assert_eq!(payload["paymentMethod"], "BLIK");
    assert_eq!(payload["amount"]["currency"], "PLN");
}

#[tokio::test]
async fn test_backend_error_message_surfaces() {
    let gateway = Arc::new(FakeGateway::failing(400, "Invalid bank code"));
    let api = Arc::new(HttpCheckoutApi::new(spawn_server(&gateway).await));

    let err = CheckoutController::new(api)
        .with_form(form(PaymentMethod::Ideal))
        .submit()
        .await
        .unwrap_err();

    assert!(matches!(&err, CheckoutError::Api(m) if m == "Invalid bank code"));
}

#[tokio::test]
async fn test_http_api_replays_with_same_key() {
    let gateway = Arc::new(FakeGateway::with_charge(redirect_charge(
        "charge_1",
        "https://bank.example/auth",
    )));
    let api = HttpCheckoutApi::new(spawn_server(&gateway).await);
    let request = PaymentRequest {
        method: Some("ideal".into()),
        currency: Some(Currency::Eur.code().into()),
        amount: Some(11979),
        recurring: false,
        idempotency_key: Some("1719051862000-k3y9abc".into()),
    };

    let first = api.create_payment(&request).await.unwrap();
    let second = api.create_payment(&request).await.unwrap();

    assert_eq!(first, second);
    assert_eq!(gateway.charge_calls(), 1);
}

#[tokio::test]
async fn test_http_api_status() {
    let gateway = Arc::new(FakeGateway::with_charge(charge_with_status("charge_1", "SUCCESSFUL")));
    let api = HttpCheckoutApi::new(spawn_server(&gateway).await);

    let status = api.payment_status("charge_1").await.unwrap();

    assert_eq!(status.status, "SUCCESSFUL");
    assert_eq!(status.charge_id, "charge_1");
}

#[tokio::test]
async fn test_http_api_status_keeps_charge_id_in_one_segment() {
    let gateway = Arc::new(FakeGateway::with_charge(charge_with_status("charge_1", "SUCCESSFUL")));
    let api = HttpCheckoutApi::new(spawn_server(&gateway).await);

    let status = api.payment_status("../create?x=1").await.unwrap();

    assert_eq!(status.charge_id, "../create?x=1");
    assert_eq!(gateway.status_calls.load(Ordering::SeqCst), 1);
    assert_eq!(gateway.charge_calls(), 0);
    assert!(matches!(
        api.payment_status("..").await,
        Err(CheckoutError::InvalidRequest(_))
    ));
}
