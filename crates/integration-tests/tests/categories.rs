//! Category gateway: payload shapes, caching and the featured filter.

#![allow(clippy::unwrap_used, clippy::expect_used)]

use heirloom_core::CategoryId;
use heirloom_integration_tests::{TestBackend, fixtures};
use heirloom_storefront::api::ApiError;
use serde_json::json;
use wiremock::matchers::{method, path};
use wiremock::{Mock, ResponseTemplate};

#[tokio::test]
async fn test_category_list_is_cached_and_featured_filters_it() {
    let backend = TestBackend::start().await;
    Mock::given(method("GET"))
        .and(path("/api/categories"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "success": true,
            "data": [
                fixtures::category("c-1", "Sculpture", true),
                fixtures::category("c-2", "Textiles", false),
                { "id": "c-3", "name": "Beadwork", "imageUrl": "https://cdn.example/c-3.jpg" },
            ],
        })))
        .expect(1)
        .mount(&backend.server)
        .await;

    let client = backend.client();
    let all = client.get_categories().await.unwrap();
    assert_eq!(all.len(), 3);
    assert_eq!(
        all[0].image_url.as_deref(),
        Some("https://cdn.example/categories/c-1.jpg")
    );
    assert_eq!(all[2].image_url.as_deref(), Some("https://cdn.example/c-3.jpg"));
    assert!(!all[2].featured);

    let featured = client.featured_categories().await.unwrap();
    assert_eq!(featured.len(), 1);
    assert_eq!(featured[0].name, "Sculpture");
}

#[tokio::test]
async fn test_bare_category_list_is_accepted() {
    let backend = TestBackend::start().await;
    Mock::given(method("GET"))
        .and(path("/api/categories"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            fixtures::category("c-1", "Sculpture", false),
        ])))
        .mount(&backend.server)
        .await;

    let categories = backend.client().get_categories().await.unwrap();
    assert_eq!(categories.len(), 1);
    assert_eq!(categories[0].slug, "sculpture");
}

#[tokio::test]
async fn test_category_by_id_is_cached() {
    let backend = TestBackend::start().await;
    Mock::given(method("GET"))
        .and(path("/api/categories/c-2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "success": true,
            "data": fixtures::category("c-2", "Textiles", false),
        })))
        .expect(1)
        .mount(&backend.server)
        .await;

    let client = backend.client();
    let id = CategoryId::new("c-2");
    let first = client.get_category(&id).await.unwrap();
    let second = client.get_category(&id).await.unwrap();
    assert_eq!(first, second);
    assert_eq!(first.name, "Textiles");
}

#[tokio::test]
async fn test_category_by_slug_is_never_cached() {
    let backend = TestBackend::start().await;
    Mock::given(method("GET"))
        .and(path("/api/categories/slug/sculpture"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(fixtures::category("c-1", "Sculpture", true)),
        )
        .expect(2)
        .mount(&backend.server)
        .await;

    let client = backend.client();
    client.get_category_by_slug("sculpture").await.unwrap();
    let category = client.get_category_by_slug("sculpture").await.unwrap();
    assert_eq!(category.id.as_str(), "c-1");
}

#[tokio::test]
async fn test_missing_category_is_not_found() {
    let backend = TestBackend::start().await;
    Mock::given(method("GET"))
        .and(path("/api/categories/nope"))
        .respond_with(
            ResponseTemplate::new(404).set_body_json(json!({ "message": "Category not found" })),
        )
        .mount(&backend.server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/categories/slug/gone"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "success": true })))
        .mount(&backend.server)
        .await;

    let client = backend.client();
    let err = client.get_category(&CategoryId::new("nope")).await.unwrap_err();
    assert!(matches!(err, ApiError::NotFound(_)));
    assert_eq!(err.server_message(), "Category not found");

    let err = client.get_category_by_slug("gone").await.unwrap_err();
    assert!(matches!(err, ApiError::NotFound(_)));
}
