use actix_web::{
    http::{header, StatusCode},
    test, web, App,
};
use bytes::Bytes;
use serde_json::{json, Value};
use std::sync::Arc;

use crate::api::configure_routes;
use crate::config::Settings;
use crate::db::testing::UnavailableStore;
use crate::db::{MemoryProductStore, ProductStore};
use crate::domain::{ImageReference, NewProduct, PLACEHOLDER_PRODUCT_NAME};
use crate::images::Placeholder;
use crate::storage::{ImageStores, InlineStorage, LocalStorage};
use crate::AppState;

const PLACEHOLDER_BYTES: &[u8] = b"placeholder-png";
const BOUNDARY: &str = "storefront-test-boundary";

fn state(store: Arc<dyn ProductStore>, with_placeholder: bool) -> web::Data<AppState> {
    let root = std::env::temp_dir().join(format!("storefront-api-{}", uuid::Uuid::new_v4()));
    let local = Arc::new(LocalStorage::new(root, "/uploads".to_string()));
    let stores = ImageStores::single(Arc::new(InlineStorage), local);
    let placeholder = with_placeholder.then(|| Placeholder {
        data: Bytes::from_static(PLACEHOLDER_BYTES),
        content_type: "image/png".to_string(),
    });
    web::Data::new(AppState::new(&Settings::default(), store, None, stores, placeholder))
}

macro_rules! app {
    ($state:expr) => {
        test::init_service(App::new().app_data($state.clone()).configure(configure_routes)).await
    };
}

fn file_part(body: &mut Vec<u8>, field: &str, filename: &str, content_type: &str, data: &[u8]) {
    body.extend_from_slice(
        format!(
            "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"{field}\"; filename=\"{filename}\"\r\nContent-Type: {content_type}\r\n\r\n"
        )
        .as_bytes(),
    );
    body.extend_from_slice(data);
    body.extend_from_slice(b"\r\n");
}

fn text_part(body: &mut Vec<u8>, field: &str, value: &str) {
    body.extend_from_slice(
        format!("--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"{field}\"\r\n\r\n{value}\r\n").as_bytes(),
    );
}

fn multipart_request(uri: &str, mut body: Vec<u8>) -> test::TestRequest {
    body.extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());
    test::TestRequest::post()
        .uri(uri)
        .insert_header((header::CONTENT_TYPE, format!("multipart/form-data; boundary={BOUNDARY}")))
        .set_payload(body)
}

#[actix_web::test]
async fn test_create_then_get_product() {
    let state = state(Arc::new(MemoryProductStore::new()), true);
    let app = app!(state);

    let req = test::TestRequest::post()
        .uri("/api/products")
        .set_json(json!({ "name": "Cat Treats", "price": "9.99" }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::CREATED);
    let created: Value = test::read_body_json(resp).await;
    assert_eq!(created["success"], true);
    assert_eq!(created["data"]["name"], "Cat Treats");
    assert_eq!(created["data"]["price"], "9.99");
    let id = created["data"]["id"].as_i64().unwrap();

    let req = test::TestRequest::get().uri(&format!("/api/products/{}", id)).to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let fetched: Value = test::read_body_json(resp).await;
    assert_eq!(fetched["data"]["id"], id);
    assert_eq!(fetched["data"]["name"], "Cat Treats");
    assert_eq!(fetched["data"]["price"], "9.99");
    assert_eq!(fetched["data"]["hasImage"], false);
}

#[actix_web::test]
async fn test_create_accepts_numeric_price_and_image_url() {
    let state = state(Arc::new(MemoryProductStore::new()), false);
    let app = app!(state);

    let req = test::TestRequest::post()
        .uri("/api/products")
        .set_json(json!({
            "name": "Poster",
            "price": 10,
            "image": "https://cdn.example.com/poster.png"
        }))
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["data"]["price"], "10.00");
    assert_eq!(body["data"]["hasImage"], true);
    assert_eq!(body["data"]["imageUrl"], "https://cdn.example.com/poster.png");
}

#[actix_web::test]
async fn test_create_rejects_invalid_input() {
    let store = Arc::new(MemoryProductStore::new());
    let state = state(store.clone(), false);
    let app = app!(state);

    for payload in [
        json!({ "price": "9.99" }),
        json!({ "name": "   ", "price": "9.99" }),
        json!({ "name": "Cat Treats" }),
        json!({ "name": "Cat Treats", "price": "-1" }),
        json!({ "name": "Cat Treats", "price": "abc" }),
        json!({ "name": "x".repeat(256), "price": "1.00" }),
    ] {
        let req = test::TestRequest::post().uri("/api/products").set_json(&payload).to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST, "payload {}", payload);
        let body: Value = test::read_body_json(resp).await;
        assert_eq!(body["success"], false);
        assert_eq!(body["error"], "VALIDATION_ERROR");
    }

    // Malformed JSON gets the same envelope
    let req = test::TestRequest::post()
        .uri("/api/products")
        .insert_header((header::CONTENT_TYPE, "application/json"))
        .set_payload("{not json")
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["error"], "VALIDATION_ERROR");

    assert_eq!(store.count().await.unwrap(), 0);
}

#[actix_web::test]
async fn test_list_excludes_image_bytes() {
    let store = Arc::new(MemoryProductStore::new());
    store
        .create(NewProduct::new("Mic", "99.99", None).unwrap().with_image(ImageReference::Inline {
            data: Bytes::from_static(b"jpeg-bytes"),
            content_type: Some("image/jpeg".to_string()),
        }))
        .await
        .unwrap();
    store.create(NewProduct::new("Roll", "79.99", None).unwrap()).await.unwrap();
    let state = state(store, false);
    let app = app!(state);

    let req = test::TestRequest::get().uri("/api/products").to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["success"], true);
    assert_eq!(body["count"], 2);

    let items = body["data"].as_array().unwrap();
    // Newest first
    assert_eq!(items[0]["name"], "Roll");
    assert_eq!(items[0]["hasImage"], false);
    assert_eq!(items[1]["name"], "Mic");
    assert_eq!(items[1]["hasImage"], true);
    for item in items {
        assert!(item.get("imageData").is_none());
        assert!(item["imageUrl"].as_str().unwrap().starts_with("/api/images/"));
    }
}

#[actix_web::test]
async fn test_get_includes_inline_image_data() {
    let store = Arc::new(MemoryProductStore::new());
    let product = store
        .create(NewProduct::new("Mic", "99.99", None).unwrap().with_image(ImageReference::Inline {
            data: Bytes::from_static(b"abc"),
            content_type: Some("image/png".to_string()),
        }))
        .await
        .unwrap();
    let state = state(store, false);
    let app = app!(state);

    let req = test::TestRequest::get().uri(&format!("/api/products/{}", product.id)).to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["data"]["imageData"], "YWJj");
    assert_eq!(body["data"]["imageType"], "image/png");
    assert_eq!(body["data"]["imageUrl"], format!("/api/images/{}", product.id));
}

#[actix_web::test]
async fn test_unknown_ids_are_not_found() {
    let state = state(Arc::new(MemoryProductStore::new()), true);
    let app = app!(state);

    for uri in ["/api/products/999", "/api/products/abc", "/api/images/999", "/api/images/abc"] {
        let req = test::TestRequest::get().uri(uri).to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::NOT_FOUND, "{}", uri);
        let body: Value = test::read_body_json(resp).await;
        assert_eq!(body["error"], "NOT_FOUND");
    }

    let req = test::TestRequest::put()
        .uri("/api/products/999")
        .set_json(json!({ "name": "Ghost" }))
        .to_request();
    assert_eq!(test::call_service(&app, req).await.status(), StatusCode::NOT_FOUND);

    let req = test::TestRequest::delete().uri("/api/products/999").to_request();
    assert_eq!(test::call_service(&app, req).await.status(), StatusCode::NOT_FOUND);
}

#[actix_web::test]
async fn test_partial_update() {
    let store = Arc::new(MemoryProductStore::new());
    let product = store
        .create(NewProduct::new("Tail", "149.99", Some("Stylish".to_string())).unwrap())
        .await
        .unwrap();
    let state = state(store, false);
    let app = app!(state);

    let req = test::TestRequest::put()
        .uri(&format!("/api/products/{}", product.id))
        .set_json(json!({ "price": "129.5", "description": "" }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["data"]["name"], "Tail");
    assert_eq!(body["data"]["price"], "129.50");
    assert_eq!(body["data"]["description"], Value::Null);

    let req = test::TestRequest::put()
        .uri(&format!("/api/products/{}", product.id))
        .set_json(json!({}))
        .to_request();
    assert_eq!(test::call_service(&app, req).await.status(), StatusCode::BAD_REQUEST);
}

#[actix_web::test]
async fn test_delete_returns_record() {
    let store = Arc::new(MemoryProductStore::new());
    let product = store.create(NewProduct::new("Roll", "79.99", None).unwrap()).await.unwrap();
    let state = state(store.clone(), false);
    let app = app!(state);

    let req = test::TestRequest::delete().uri(&format!("/api/products/{}", product.id)).to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["success"], true);
    assert_eq!(body["data"]["id"], product.id);
    assert_eq!(store.count().await.unwrap(), 0);

    let req = test::TestRequest::delete().uri(&format!("/api/products/{}", product.id)).to_request();
    assert_eq!(test::call_service(&app, req).await.status(), StatusCode::NOT_FOUND);
}

#[actix_web::test]
async fn test_image_placeholder_and_missing() {
    let store = Arc::new(MemoryProductStore::new());
    let product = store.create(NewProduct::new("Roll", "79.99", None).unwrap()).await.unwrap();
    let uri = format!("/api/images/{}", product.id);

    let with_placeholder = state(store.clone(), true);
    let app = app!(with_placeholder);
    let resp = test::call_service(&app, test::TestRequest::get().uri(&uri).to_request()).await;
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(resp.headers().get(header::CACHE_CONTROL).unwrap(), "public, max-age=86400");
    assert_eq!(resp.headers().get(header::CONTENT_TYPE).unwrap(), "image/png");
    assert_eq!(&test::read_body(resp).await[..], PLACEHOLDER_BYTES);

    let without_placeholder = state(store, false);
    let app = app!(without_placeholder);
    let resp = test::call_service(&app, test::TestRequest::get().uri(&uri).to_request()).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

#[actix_web::test]
async fn test_image_conditional_request() {
    let store = Arc::new(MemoryProductStore::new());
    let product = store
        .create(NewProduct::new("Mic", "99.99", None).unwrap().with_image(ImageReference::Inline {
            data: Bytes::from_static(b"jpeg-bytes"),
            content_type: None,
        }))
        .await
        .unwrap();
    let state = state(store, true);
    let app = app!(state);
    let uri = format!("/api/images/{}", product.id);

    let resp = test::call_service(&app, test::TestRequest::get().uri(&uri).to_request()).await;
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(resp.headers().get(header::CONTENT_TYPE).unwrap(), "image/jpeg");
    assert_eq!(
        resp.headers().get(header::CACHE_CONTROL).unwrap(),
        "public, max-age=31536000, immutable"
    );
    let etag = resp.headers().get(header::ETAG).unwrap().to_str().unwrap().to_string();

    let req = test::TestRequest::get()
        .uri(&uri)
        .insert_header((header::IF_NONE_MATCH, etag))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::NOT_MODIFIED);
    assert!(test::read_body(resp).await.is_empty());
}

#[actix_web::test]
async fn test_external_image_redirects() {
    let store = Arc::new(MemoryProductStore::new());
    let product = store
        .create(
            NewProduct::new("Poster", "5.00", None)
                .unwrap()
                .with_image(ImageReference::from_client_value("https://cdn.example.com/poster.png")),
        )
        .await
        .unwrap();
    let state = state(store, true);
    let app = app!(state);

    let req = test::TestRequest::get().uri(&format!("/api/images/{}", product.id)).to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::FOUND);
    assert_eq!(resp.headers().get(header::LOCATION).unwrap(), "https://cdn.example.com/poster.png");
}

#[actix_web::test]
async fn test_upload_round_trip() {
    let store = Arc::new(MemoryProductStore::new());
    let product = store.create(NewProduct::new("Cat Treats", "9.99", None).unwrap()).await.unwrap();
    let state = state(store, true);
    let app = app!(state);

    let payload: Vec<u8> = (0..=255u8).cycle().take(2048).collect();
    let mut body = Vec::new();
    text_part(&mut body, "productId", &product.id.to_string());
    file_part(&mut body, "file", "treats.png", "image/png", &payload);

    let resp = test::call_service(&app, multipart_request("/api/upload", body).to_request()).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let result: Value = test::read_body_json(resp).await;
    assert_eq!(result["success"], true);
    assert_eq!(result["data"]["productId"], product.id);
    assert_eq!(result["data"]["url"], format!("/api/images/{}", product.id));
    assert_eq!(result["data"]["contentType"], "image/png");
    assert_eq!(result["data"]["size"], 2048);

    let req = test::TestRequest::get().uri(&format!("/api/images/{}", product.id)).to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(resp.headers().get(header::CONTENT_TYPE).unwrap(), "image/png");
    assert_eq!(&test::read_body(resp).await[..], &payload[..]);
}

#[actix_web::test]
async fn test_upload_to_product_route() {
    let store = Arc::new(MemoryProductStore::new());
    let product = store.create(NewProduct::new("Mic", "99.99", None).unwrap()).await.unwrap();
    let state = state(store.clone(), false);
    let app = app!(state);

    let mut body = Vec::new();
    file_part(&mut body, "image", "mic.jpg", "image/jpeg", b"mic-jpeg");
    let uri = format!("/api/products/{}/image", product.id);
    let resp = test::call_service(&app, multipart_request(&uri, body).to_request()).await;
    assert_eq!(resp.status(), StatusCode::OK);

    let updated = store.get(product.id).await.unwrap().unwrap();
    assert!(matches!(updated.image, ImageReference::Inline { .. }));
}

#[actix_web::test]
async fn test_upload_rejections() {
    let store = Arc::new(MemoryProductStore::new());
    let state = state(store.clone(), false);
    let app = app!(state);

    // No file part
    let mut body = Vec::new();
    text_part(&mut body, "productId", "");
    let resp = test::call_service(&app, multipart_request("/api/upload", body).to_request()).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let result: Value = test::read_body_json(resp).await;
    assert_eq!(result["error"], "MISSING_FILE");

    // Not an image
    let mut body = Vec::new();
    file_part(&mut body, "file", "notes.pdf", "application/pdf", b"%PDF-1.4");
    let resp = test::call_service(&app, multipart_request("/api/upload", body).to_request()).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let result: Value = test::read_body_json(resp).await;
    assert_eq!(result["error"], "UNSUPPORTED_TYPE");

    // Over the 1 MiB default
    let mut body = Vec::new();
    file_part(&mut body, "file", "huge.jpg", "image/jpeg", &vec![0xFFu8; 2 * 1024 * 1024]);
    let resp = test::call_service(&app, multipart_request("/api/upload", body).to_request()).await;
    assert_eq!(resp.status(), StatusCode::PAYLOAD_TOO_LARGE);
    let result: Value = test::read_body_json(resp).await;
    assert_eq!(result["error"], "FILE_TOO_LARGE");

    // Unknown target product
    let mut body = Vec::new();
    file_part(&mut body, "image", "mic.jpg", "image/jpeg", b"mic-jpeg");
    let resp = test::call_service(&app, multipart_request("/api/products/77/image", body).to_request()).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);

    assert_eq!(store.count().await.unwrap(), 0);
}

#[actix_web::test]
async fn test_health_and_migrate() {
    let store = Arc::new(MemoryProductStore::new());
    store.create(NewProduct::new("Roll", "79.99", None).unwrap()).await.unwrap();
    let state = state(store, true);
    let app = app!(state);

    let req = test::TestRequest::get().uri("/health").to_request();
    let health: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(health["status"], "healthy");
    assert_eq!(health["database"], "memory");
    assert_eq!(health["storageBackend"], "inline");
    assert_eq!(health["productCount"], 1);

    let req = test::TestRequest::post().uri("/api/images/migrate").to_request();
    let report: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(report["success"], true);
    assert_eq!(report["data"]["scanned"], 0);
    assert_eq!(report["data"]["backend"], "inline");
}

#[actix_web::test]
async fn test_store_failures_are_database_errors() {
    let state = state(Arc::new(UnavailableStore), true);
    let app = app!(state);

    for uri in ["/api/images/1", "/api/products/1", "/api/products"] {
        let resp = test::call_service(&app, test::TestRequest::get().uri(uri).to_request()).await;
        assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR, "{}", uri);
        let body: Value = test::read_body_json(resp).await;
        assert_eq!(body["success"], false);
        assert_eq!(body["error"], "DATABASE_ERROR");
        assert!(!body["message"].as_str().unwrap().contains("unreachable"));
    }
}

#[actix_web::test]
async fn test_image_responses_carry_security_headers() {
    let store = Arc::new(MemoryProductStore::new());
    let state = state(store, false);
    let app = app!(state);

    let svg = br#"<svg xmlns="http://www.w3.org/2000/svg"><script>alert(1)</script></svg>"#;
    let mut body = Vec::new();
    file_part(&mut body, "file", "logo.svg", "image/svg+xml", svg);
    let result: Value = test::call_and_read_body_json(&app, multipart_request("/api/upload", body).to_request()).await;
    let uri = result["data"]["url"].as_str().unwrap().to_string();

    let resp = test::call_service(&app, test::TestRequest::get().uri(&uri).to_request()).await;
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(resp.headers().get(header::X_CONTENT_TYPE_OPTIONS).unwrap(), "nosniff");
    assert_eq!(
        resp.headers().get(header::CONTENT_SECURITY_POLICY).unwrap(),
        "default-src 'none'; sandbox"
    );
    let etag = resp.headers().get(header::ETAG).unwrap().to_str().unwrap().to_string();

    let req = test::TestRequest::get()
        .uri(&uri)
        .insert_header((header::IF_NONE_MATCH, etag))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::NOT_MODIFIED);
    assert_eq!(resp.headers().get(header::X_CONTENT_TYPE_OPTIONS).unwrap(), "nosniff");
    assert!(resp.headers().contains_key(header::CONTENT_SECURITY_POLICY));
}

#[actix_web::test]
async fn test_upload_rejects_oversized_form_values() {
    let store = Arc::new(MemoryProductStore::new());
    let state = state(store.clone(), false);
    let app = app!(state);

    // Content type longer than the image_type column
    let mut body = Vec::new();
    let long_type = format!("image/{}", "x".repeat(300));
    file_part(&mut body, "file", "cat.png", &long_type, b"png-bytes");
    let resp = test::call_service(&app, multipart_request("/api/upload", body).to_request()).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let result: Value = test::read_body_json(resp).await;
    assert_eq!(result["error"], "UNSUPPORTED_TYPE");

    let mut body = Vec::new();
    text_part(&mut body, "productId", &"1".repeat(10_000));
    file_part(&mut body, "file", "cat.png", "image/png", b"png-bytes");
    let resp = test::call_service(&app, multipart_request("/api/upload", body).to_request()).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let result: Value = test::read_body_json(resp).await;
    assert_eq!(result["error"], "VALIDATION_ERROR");

    assert_eq!(store.count().await.unwrap(), 0);
}

#[actix_web::test]
async fn test_create_with_image_id_consumes_placeholder() {
    let store = Arc::new(MemoryProductStore::new());
    let state = state(store.clone(), false);
    let app = app!(state);

    let mut body = Vec::new();
    file_part(&mut body, "file", "treats.png", "image/png", b"treats-png");
    let uploaded: Value = test::call_and_read_body_json(&app, multipart_request("/api/upload", body).to_request()).await;
    let placeholder_id = uploaded["data"]["productId"].as_i64().unwrap();
    let placeholder = store.get(placeholder_id as i32).await.unwrap().unwrap();
    assert_eq!(placeholder.name, PLACEHOLDER_PRODUCT_NAME);

    let req = test::TestRequest::post()
        .uri("/api/products")
        .set_json(json!({ "name": "Cat Treats", "price": "9.99", "imageId": placeholder_id }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::CREATED);
    let created: Value = test::read_body_json(resp).await;
    assert_eq!(created["data"]["hasImage"], true);
    let id = created["data"]["id"].as_i64().unwrap() as i32;

    assert_eq!(store.get(id).await.unwrap().unwrap().image, placeholder.image);
    assert!(store.get(placeholder_id as i32).await.unwrap().is_none());

    let list: Value = test::call_and_read_body_json(&app, test::TestRequest::get().uri("/api/products").to_request()).await;
    assert_eq!(list["count"], 1);
    assert_eq!(list["data"][0]["name"], "Cat Treats");

    let resp = test::call_service(&app, test::TestRequest::get().uri(&format!("/api/images/{}", id)).to_request()).await;
    assert_eq!(&test::read_body(resp).await[..], b"treats-png");
}

#[actix_web::test]
async fn test_create_with_image_id_keeps_real_products() {
    let store = Arc::new(MemoryProductStore::new());
    let poster = store
        .create(
            NewProduct::new("Poster", "5.00", None)
                .unwrap()
                .with_image(ImageReference::from_client_value("https://cdn.example.com/poster.png")),
        )
        .await
        .unwrap();
    let state = state(store.clone(), false);
    let app = app!(state);

    let req = test::TestRequest::post()
        .uri("/api/products")
        .set_json(json!({ "name": "Poster (framed)", "price": "25.00", "imageId": poster.id }))
        .to_request();
    let created: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(created["data"]["imageUrl"], "https://cdn.example.com/poster.png");

    assert_eq!(store.get(poster.id).await.unwrap().unwrap(), poster);
    assert_eq!(store.count().await.unwrap(), 2);
}

#[actix_web::test]
async fn test_create_with_image_id_without_image() {
    let store = Arc::new(MemoryProductStore::new());
    let bare = store.create(NewProduct::new("Roll", "79.99", None).unwrap()).await.unwrap();
    let state = state(store.clone(), false);
    let app = app!(state);

    for image_id in [bare.id, 99] {
        let req = test::TestRequest::post()
            .uri("/api/products")
            .set_json(json!({ "name": "Cat Treats", "price": "9.99", "imageId": image_id }))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        let body: Value = test::read_body_json(resp).await;
        assert_eq!(body["error"], "VALIDATION_ERROR");
    }

    assert_eq!(store.count().await.unwrap(), 1);
}
