//! Order follow-up: PayPal confirmation, payment status and payment receipts.

#![allow(clippy::unwrap_used, clippy::expect_used)]

use heirloom_core::{OrderId, OrderStatus};
use heirloom_integration_tests::{TestBackend, fixtures};
use heirloom_storefront::api::{ApiError, PaymentResult};
use heirloom_storefront::state::Storefront;
use serde_json::json;
use wiremock::matchers::{body_json, header, method, path, query_param};
use wiremock::{Mock, ResponseTemplate};

async fn signed_in(backend: &TestBackend) -> Storefront {
    Mock::given(method("POST"))
        .and(path("/api/auth/login"))
        .respond_with(ResponseTemplate::new(200).set_body_json(fixtures::auth_success("tok")))
        .mount(&backend.server)
        .await;

    let storefront = backend.storefront();
    storefront
        .auth()
        .login("collector@example.com", "correct horse")
        .await
        .unwrap();
    storefront
}

#[tokio::test]
async fn test_confirm_passes_return_url_parameters() {
    let backend = TestBackend::start().await;
    let mut order = fixtures::order("order-1", 47.45);
    order["isPaid"] = json!(true);
    order["status"] = json!("PROCESSING");
    Mock::given(method("GET"))
        .and(path("/api/orders/confirm"))
        .and(query_param("paymentId", "PAYID-123"))
        .and(query_param("PayerID", "PAYER-9"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "success": true,
            "message": "Payment completed",
            "order": order,
        })))
        .expect(1)
        .mount(&backend.server)
        .await;

    let status = backend
        .client()
        .confirm_paypal_payment("PAYID-123", "PAYER-9")
        .await
        .unwrap();

    assert!(status.paid());
    assert_eq!(status.message.as_deref(), Some("Payment completed"));
    let order = status.order.unwrap();
    assert_eq!(order.id.as_str(), "order-1");
    assert_eq!(order.status, OrderStatus::Processing);
}

#[tokio::test]
async fn test_declined_confirmation_surfaces_message() {
    let backend = TestBackend::start().await;
    Mock::given(method("GET"))
        .and(path("/api/orders/confirm"))
        .respond_with(
            ResponseTemplate::new(400).set_body_json(json!({ "message": "Payment not approved" })),
        )
        .mount(&backend.server)
        .await;

    let err = backend
        .client()
        .confirm_paypal_payment("PAYID-123", "PAYER-9")
        .await
        .unwrap_err();

    assert!(matches!(err, ApiError::Api { status: 400, .. }));
    assert_eq!(err.server_message(), "Payment not approved");
}

#[tokio::test]
async fn test_paypal_status_is_authenticated() {
    let backend = TestBackend::start().await;
    let storefront = signed_in(&backend).await;
    Mock::given(method("GET"))
        .and(path("/api/orders/order-1/paypal/status"))
        .and(header("authorization", "Bearer tok"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "status": "CREATED",
            "isPaid": false,
        })))
        .expect(1)
        .mount(&backend.server)
        .await;

    let status = storefront
        .client()
        .paypal_payment_status(&OrderId::new("order-1"))
        .await
        .unwrap();

    assert!(!status.paid());
    assert_eq!(status.status.as_deref(), Some("CREATED"));
    assert!(status.order.is_none());
}

#[tokio::test]
async fn test_mark_paid_posts_receipt() {
    let backend = TestBackend::start().await;
    let storefront = signed_in(&backend).await;
    let mut paid = fixtures::order("order-2", 120.0);
    paid["isPaid"] = json!(true);
    paid["paidAt"] = json!("2026-03-01T12:30:00Z");
    Mock::given(method("POST"))
        .and(path("/api/orders/order-2/pay"))
        .and(header("authorization", "Bearer tok"))
        .and(body_json(json!({
            "id": "PAY-77",
            "status": "COMPLETED",
            "update_time": "2026-03-01T12:30:00Z",
            "email_address": "collector@example.com",
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(paid))
        .expect(1)
        .mount(&backend.server)
        .await;

    let receipt = PaymentResult {
        id: "PAY-77".to_string(),
        status: "COMPLETED".to_string(),
        update_time: "2026-03-01T12:30:00Z".parse().unwrap(),
        email_address: Some("collector@example.com".to_string()),
    };
    let order = storefront
        .client()
        .mark_order_paid(&OrderId::new("order-2"), &receipt)
        .await
        .unwrap();

    assert!(order.is_paid);
    assert!(order.paid_at.is_some());
}
