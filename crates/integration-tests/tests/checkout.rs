//! Checkout end to end: login, shipping, payment, review and order placement.

#![allow(clippy::unwrap_used, clippy::expect_used)]

use heirloom_integration_tests::{CART_ID, SESSION_ID, TestBackend, fixtures};
use heirloom_storefront::api::PaymentNext;
use heirloom_storefront::checkout::{CheckoutError, CheckoutStep, PaymentForm, ShippingForm};
use heirloom_storefront::state::Storefront;
use serde_json::json;
use wiremock::matchers::{body_partial_json, header, method, path};
use wiremock::{Mock, ResponseTemplate};

fn shipping() -> ShippingForm {
    ShippingForm {
        full_name: "Ada Collector".to_string(),
        address: "12 Gallery Row".to_string(),
        city: "Santa Fe".to_string(),
        postal_code: "87501".to_string(),
        country: "US".to_string(),
        phone: "555-0100".to_string(),
    }
}

/// Login plus a cart worth $35 that empties after `DELETE /carts/{id}`.
async fn signed_in_with_cart(backend: &TestBackend) -> Storefront {
    Mock::given(method("POST"))
        .and(path("/api/auth/login"))
        .respond_with(ResponseTemplate::new(200).set_body_json(fixtures::auth_success("tok")))
        .mount(&backend.server)
        .await;
    Mock::given(method("GET"))
        .and(path(format!("/api/carts/{SESSION_ID}")))
        .respond_with(ResponseTemplate::new(200).set_body_json(fixtures::cart(&[
            fixtures::line("item-1", "prod-1", 2, 10.0, Some(5)),
            fixtures::line("item-2", "prod-2", 3, 5.0, None),
        ])))
        .up_to_n_times(1)
        .mount(&backend.server)
        .await;

    let storefront = backend.storefront();
    storefront.init().await;
    storefront
        .auth()
        .login("collector@example.com", "correct horse")
        .await
        .unwrap();
    storefront
}

#[tokio::test]
async fn test_paypal_checkout_places_order_and_clears_cart() {
    let backend = TestBackend::start().await;
    let storefront = signed_in_with_cart(&backend).await;

    Mock::given(method("POST"))
        .and(path("/api/orders"))
        .and(header("authorization", "Bearer tok"))
        .and(body_partial_json(json!({
            "paymentMethod": "paypal",
            "itemsPrice": 35.0,
            "taxPrice": 2.45,
            "shippingPrice": 10.0,
            "totalPrice": 47.45,
            "shippingAddress": { "city": "Santa Fe" },
        })))
        .respond_with(ResponseTemplate::new(201).set_body_json(fixtures::order("order-1", 47.45)))
        .expect(1)
        .mount(&backend.server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/orders/order-1/paypal"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({ "approvalUrl": "https://paypal.example/approve/1" })),
        )
        .expect(1)
        .mount(&backend.server)
        .await;
    Mock::given(method("DELETE"))
        .and(path(format!("/api/carts/{CART_ID}")))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&backend.server)
        .await;
    Mock::given(method("GET"))
        .and(path(format!("/api/carts/{SESSION_ID}")))
        .respond_with(ResponseTemplate::new(200).set_body_json(fixtures::cart(&[])))
        .mount(&backend.server)
        .await;

    let flow = storefront.checkout();
    assert!(flow.can_checkout());

    flow.submit_shipping(&shipping()).unwrap();
    flow.submit_payment(&PaymentForm::paypal()).unwrap();
    assert_eq!(flow.step(), CheckoutStep::Review);

    let review = flow.review().unwrap();
    assert_eq!(review.lines().len(), 2);

    let placement = flow.place_order().await.unwrap();
    assert_eq!(placement.order.id.as_str(), "order-1");
    assert_eq!(
        placement.next,
        PaymentNext::RedirectToPaypal {
            approval_url: "https://paypal.example/approve/1".to_string()
        }
    );
    assert!(flow.placed().is_some());
    assert!(flow.error().is_none());
    assert_eq!(storefront.cart().item_count(), 0);

    let again = flow.place_order().await.unwrap_err();
    assert!(matches!(again, CheckoutError::AlreadyPlaced));
}

#[tokio::test]
async fn test_card_checkout_never_sends_card_data() {
    let backend = TestBackend::start().await;
    let storefront = signed_in_with_cart(&backend).await;

    Mock::given(method("POST"))
        .and(path("/api/orders"))
        .and(body_partial_json(json!({ "paymentMethod": "card" })))
        .respond_with(ResponseTemplate::new(201).set_body_json(fixtures::order("order-2", 47.45)))
        .expect(1)
        .mount(&backend.server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/orders/order-2/paypal"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&backend.server)
        .await;
    Mock::given(method("DELETE"))
        .and(path(format!("/api/carts/{CART_ID}")))
        .respond_with(ResponseTemplate::new(200))
        .mount(&backend.server)
        .await;
    Mock::given(method("GET"))
        .and(path(format!("/api/carts/{SESSION_ID}")))
        .respond_with(ResponseTemplate::new(200).set_body_json(fixtures::cart(&[])))
        .mount(&backend.server)
        .await;

    let flow = storefront.checkout();
    flow.submit_shipping(&shipping()).unwrap();
    flow.submit_payment(&PaymentForm::card(
        "Ada Collector",
        "4111 1111 1111 1111",
        "12/30",
        "123",
    ))
    .unwrap();

    let placement = flow.place_order().await.unwrap();
    assert_eq!(placement.next, PaymentNext::CardCapturePending);

    let requests = backend.server.received_requests().await.unwrap();
    let order_body = requests
        .iter()
        .find(|r| r.url.path() == "/api/orders")
        .map(|r| String::from_utf8_lossy(&r.body).into_owned())
        .unwrap();
    assert!(!order_body.contains("4111"));
    assert!(!order_body.contains("\"123\""));
    assert!(!order_body.contains("12/30"));
}

#[tokio::test]
async fn test_failed_submission_stays_on_review() {
    let backend = TestBackend::start().await;
    let storefront = signed_in_with_cart(&backend).await;

    Mock::given(method("POST"))
        .and(path("/api/orders"))
        .respond_with(ResponseTemplate::new(500).set_body_string("upstream exploded"))
        .expect(1)
        .mount(&backend.server)
        .await;
    Mock::given(method("DELETE"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&backend.server)
        .await;

    let flow = storefront.checkout();
    flow.submit_shipping(&shipping()).unwrap();
    flow.submit_payment(&PaymentForm::paypal()).unwrap();

    let err = flow.place_order().await.unwrap_err();
    assert!(matches!(err, CheckoutError::Submit(_)));
    assert_eq!(flow.step(), CheckoutStep::Review);
    assert_eq!(flow.error().as_deref(), Some("Failed to create order"));
    assert!(flow.placed().is_none());
    assert_eq!(storefront.cart().item_count(), 5);
}

#[tokio::test]
async fn test_rejected_order_surfaces_backend_message() {
    let backend = TestBackend::start().await;
    let storefront = signed_in_with_cart(&backend).await;

    Mock::given(method("POST"))
        .and(path("/api/orders"))
        .respond_with(
            ResponseTemplate::new(400)
                .set_body_json(json!({ "message": "Artifact prod-1 is no longer available" })),
        )
        .mount(&backend.server)
        .await;

    let flow = storefront.checkout();
    flow.submit_shipping(&shipping()).unwrap();
    flow.submit_payment(&PaymentForm::paypal()).unwrap();

    flow.place_order().await.unwrap_err();
    assert_eq!(
        flow.error().as_deref(),
        Some("Artifact prod-1 is no longer available")
    );
}
