use chrono::{Duration as ChronoDuration, Utc};
use jsonwebtoken::{Algorithm, EncodingKey, Header};
use reqwest::StatusCode;
use reqwest::multipart::{Form, Part};
use serde_json::json;

use agristore_api::config::AppConfig;
use agristore_auth::{Role, SessionClaims};
use agristore_core::UserId;

struct TestServer {
    base_url: String,
    handle: tokio::task::JoinHandle<()>,
    _uploads: tempfile::TempDir,
}

impl TestServer {
    async fn spawn(jwt_secret: &str) -> Self {
        let uploads = tempfile::tempdir().expect("failed to create upload dir");
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("failed to bind ephemeral port");
        let addr = listener.local_addr().unwrap();
        let base_url = format!("http://{}", addr);

        // Same router as prod, in-memory storage.
        let config = AppConfig {
            jwt_secret: Some(jwt_secret.to_string()),
            upload_root: uploads.path().to_path_buf(),
            public_base_url: base_url.clone(),
            ..AppConfig::defaults()
        };
        let app = agristore_api::app::build_app(&config)
            .await
            .expect("failed to build app");

        let handle = tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self {
            base_url,
            handle,
            _uploads: uploads,
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

fn mint_jwt(jwt_secret: &str, role: Role) -> String {
    let claims = SessionClaims::new(
        UserId::new(),
        "someone@farm.test",
        role,
        Utc::now(),
        ChronoDuration::minutes(10),
    );

    jsonwebtoken::encode(
        &Header::new(Algorithm::HS256),
        &claims,
        &EncodingKey::from_secret(jwt_secret.as_bytes()),
    )
    .expect("failed to encode jwt")
}

async fn create_product(
    client: &reqwest::Client,
    srv: &TestServer,
    token: &str,
    body: serde_json::Value,
) -> serde_json::Value {
    let res = client
        .post(srv.url("/api/products"))
        .bearer_auth(token)
        .json(&body)
        .send()
        .await
        .unwrap();
    if res.status() != StatusCode::CREATED {
        let status = res.status();
        let body = res.text().await.unwrap_or_default();
        panic!("expected 201 Created from create product, got {status} body={body}");
    }
    res.json().await.unwrap()
}

#[tokio::test]
async fn health_is_public() {
    let srv = TestServer::spawn("test-secret").await;

    let res = reqwest::get(srv.url("/health")).await.unwrap();

    assert_eq!(res.status(), StatusCode::OK);
    let body: serde_json::Value = res.json().await.unwrap();
    assert_eq!(body["status"], "ok");
}

#[tokio::test]
async fn auth_required_for_admin_endpoints() {
    let jwt_secret = "test-secret";
    let srv = TestServer::spawn(jwt_secret).await;
    let client = reqwest::Client::new();

    let res = client.get(srv.url("/api/sales")).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);

    let res = client
        .get(srv.url("/api/sales"))
        .bearer_auth("not-a-token")
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);

    let forged = mint_jwt("some-other-secret", Role::Admin);
    let res = client
        .get(srv.url("/api/inventories/summary"))
        .bearer_auth(forged)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn regular_user_is_forbidden_from_admin_endpoints() {
    let jwt_secret = "test-secret";
    let srv = TestServer::spawn(jwt_secret).await;
    let token = mint_jwt(jwt_secret, Role::User);

    let client = reqwest::Client::new();
    let res = client
        .post(srv.url("/api/products"))
        .bearer_auth(&token)
        .json(&json!({ "name": "Plough", "price": 100.0, "category": "Tillage", "stock": 1 }))
        .send()
        .await
        .unwrap();

    assert_eq!(res.status(), StatusCode::FORBIDDEN);
    let body: serde_json::Value = res.json().await.unwrap();
    assert_eq!(body["error"], "forbidden");
}

#[tokio::test]
async fn register_login_and_profile() {
    let srv = TestServer::spawn("test-secret").await;
    let client = reqwest::Client::new();

    let res = client
        .post(srv.url("/api/auth/register"))
        .json(&json!({ "email": " Grower@Farm.test ", "password": "secret12", "name": "Grower" }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::CREATED);
    let user: serde_json::Value = res.json().await.unwrap();
    assert_eq!(user["email"], "grower@farm.test");
    assert_eq!(user["role"], "user");
    assert!(user.get("password_hash").is_none());

    let res = client
        .post(srv.url("/api/auth/register"))
        .json(&json!({ "email": "grower@farm.test", "password": "secret12", "name": "Again" }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::CONFLICT);

    let res = client
        .post(srv.url("/api/auth/login"))
        .json(&json!({ "email": "grower@farm.test", "password": "wrong-password" }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);

    let res = client
        .post(srv.url("/api/auth/login"))
        .json(&json!({ "email": "grower@farm.test", "password": "secret12" }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let session: serde_json::Value = res.json().await.unwrap();
    let token = session["token"].as_str().unwrap().to_string();

    let res = client
        .get(srv.url("/api/auth/profile"))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let profile: serde_json::Value = res.json().await.unwrap();
    assert_eq!(profile["id"], user["id"]);
}

#[tokio::test]
async fn short_password_is_a_validation_error() {
    let srv = TestServer::spawn("test-secret").await;

    let res = reqwest::Client::new()
        .post(srv.url("/api/auth/register"))
        .json(&json!({ "email": "a@farm.test", "password": "123", "name": "A" }))
        .send()
        .await
        .unwrap();

    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    let body: serde_json::Value = res.json().await.unwrap();
    assert_eq!(body["error"], "validation_error");
}

#[tokio::test]
async fn product_lifecycle_and_visibility() {
    let jwt_secret = "test-secret";
    let srv = TestServer::spawn(jwt_secret).await;
    let admin = mint_jwt(jwt_secret, Role::Admin);
    let client = reqwest::Client::new();

    let active = create_product(
        &client,
        &srv,
        &admin,
        json!({
            "name": "Hay Baler",
            "price": 8900.0,
            "category": "Harvesting",
            "stock": 2,
            "image_urls": ["https://cdn.test/baler.jpg"]
        }),
    )
    .await;
    assert_eq!(active["image_url"], "https://cdn.test/baler.jpg");
    assert_eq!(active["images"][0]["is_primary"], true);

    create_product(
        &client,
        &srv,
        &admin,
        json!({ "name": "Old Harrow", "price": 50.0, "category": "Tillage", "stock": 1, "is_active": false }),
    )
    .await;

    // Anonymous callers only see active products, even when asking for inactive ones.
    let res = client
        .get(srv.url("/api/products?is_active=false"))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let list: serde_json::Value = res.json().await.unwrap();
    assert_eq!(list["total"], 1);
    assert_eq!(list["products"][0]["name"], "Hay Baler");

    let res = client
        .get(srv.url("/api/products"))
        .bearer_auth(&admin)
        .send()
        .await
        .unwrap();
    let list: serde_json::Value = res.json().await.unwrap();
    assert_eq!(list["total"], 2);
    assert_eq!(list["page"], 1);
    assert_eq!(list["limit"], 10);
    assert_eq!(list["total_pages"], 1);

    let id = active["id"].as_str().unwrap();
    let res = client
        .put(srv.url(&format!("/api/products/{id}")))
        .bearer_auth(&admin)
        .json(&json!({ "price": 8500.0, "description": "" }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let updated: serde_json::Value = res.json().await.unwrap();
    assert_eq!(updated["price"], 8500.0);
    assert_eq!(updated["name"], "Hay Baler");

    let res = client
        .delete(srv.url(&format!("/api/products/{id}")))
        .bearer_auth(&admin)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);

    let res = client
        .get(srv.url(&format!("/api/products/{id}")))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn malformed_id_is_rejected() {
    let srv = TestServer::spawn("test-secret").await;

    let res = reqwest::get(srv.url("/api/products/not-a-uuid")).await.unwrap();

    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    let body: serde_json::Value = res.json().await.unwrap();
    assert_eq!(body["error"], "invalid_id");
}

#[tokio::test]
async fn sale_cannot_oversell_and_decrements_stock() {
    let jwt_secret = "test-secret";
    let srv = TestServer::spawn(jwt_secret).await;
    let admin = mint_jwt(jwt_secret, Role::Admin);
    let client = reqwest::Client::new();

    let product = create_product(
        &client,
        &srv,
        &admin,
        json!({ "name": "Pruning Shears", "price": 10.0, "category": "Tools", "stock": 5 }),
    )
    .await;
    let id = product["id"].as_str().unwrap();

    let res = client
        .post(srv.url("/api/sales"))
        .bearer_auth(&admin)
        .json(&json!({ "product_id": id, "quantity": 6, "price": 10.0 }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    let body: serde_json::Value = res.json().await.unwrap();
    assert_eq!(body["error"], "insufficient_stock");

    let res = client
        .post(srv.url("/api/sales"))
        .bearer_auth(&admin)
        .json(&json!({ "product_id": id, "quantity": 5, "price": 10.0 }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::CREATED);
    let sale: serde_json::Value = res.json().await.unwrap();
    assert_eq!(sale["total"], 50.0);

    let sale_id = sale["id"].as_str().unwrap();
    let res = client
        .get(srv.url(&format!("/api/sales/{sale_id}")))
        .bearer_auth(&admin)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let fetched: serde_json::Value = res.json().await.unwrap();
    assert_eq!(fetched, sale);

    let res = client
        .get(srv.url(&format!("/api/sales/{}", UserId::new())))
        .bearer_auth(&admin)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::NOT_FOUND);

    let res = client
        .get(srv.url(&format!("/api/products/{id}")))
        .send()
        .await
        .unwrap();
    let product: serde_json::Value = res.json().await.unwrap();
    assert_eq!(product["stock"], 0);

    let res = client
        .get(srv.url("/api/sales/summary"))
        .bearer_auth(&admin)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let summary: serde_json::Value = res.json().await.unwrap();
    assert_eq!(summary["total_revenue"], 50.0);
    assert_eq!(summary["total_items"], 5);

    let res = client
        .get(srv.url(&format!("/api/sales?product_id={id}")))
        .bearer_auth(&admin)
        .send()
        .await
        .unwrap();
    let list: serde_json::Value = res.json().await.unwrap();
    assert_eq!(list["total"], 1);
    assert_eq!(list["sales"][0]["quantity"], 5);
}

#[tokio::test]
async fn export_of_empty_period_is_header_only() {
    let jwt_secret = "test-secret";
    let srv = TestServer::spawn(jwt_secret).await;
    let admin = mint_jwt(jwt_secret, Role::Admin);

    let res = reqwest::Client::new()
        .get(srv.url("/api/sales/export?from=2020-01-01&to=2020-01-31&format=csv"))
        .bearer_auth(&admin)
        .send()
        .await
        .unwrap();

    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(res.headers()["content-type"], "text/csv");
    assert_eq!(
        res.headers()["content-disposition"],
        "attachment; filename=sales_2020-01-01_to_2020-01-31.csv"
    );
    let body = res.text().await.unwrap();
    assert_eq!(body, "ID,Product ID,Product Name,Quantity,Price,Total,Date Sold\n");
}

#[tokio::test]
async fn unsupported_export_format_is_rejected() {
    let jwt_secret = "test-secret";
    let srv = TestServer::spawn(jwt_secret).await;
    let admin = mint_jwt(jwt_secret, Role::Admin);

    let res = reqwest::Client::new()
        .get(srv.url("/api/sales/export?format=xlsx"))
        .bearer_auth(&admin)
        .send()
        .await
        .unwrap();

    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    let body: serde_json::Value = res.json().await.unwrap();
    assert_eq!(body["error"], "unsupported_format");
}

#[tokio::test]
async fn multipart_upload_is_stored_and_served() {
    let jwt_secret = "test-secret";
    let srv = TestServer::spawn(jwt_secret).await;
    let admin = mint_jwt(jwt_secret, Role::Admin);
    let client = reqwest::Client::new();
    let png = vec![0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A];

    let form = Form::new()
        .text("name", "Seed Drill")
        .text("price", "1250.00")
        .text("category", "Planting")
        .text("stock", "3")
        .text("image_urls", "https://cdn.test/drill.jpg")
        .part(
            "images",
            Part::bytes(png.clone())
                .file_name("drill.png")
                .mime_str("image/png")
                .unwrap(),
        );
    let res = client
        .post(srv.url("/api/products"))
        .bearer_auth(&admin)
        .multipart(form)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::CREATED);
    let product: serde_json::Value = res.json().await.unwrap();

    let images = product["images"].as_array().unwrap();
    assert_eq!(images.len(), 2);
    assert_eq!(images[0]["is_primary"], true);
    let url = images[0]["url"].as_str().unwrap();
    assert!(url.starts_with(&format!("{}/uploads/products/", srv.base_url)));
    assert_eq!(product["image_url"], url);

    let res = client.get(url).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(res.bytes().await.unwrap().to_vec(), png);
}

#[tokio::test]
async fn oversized_and_non_image_uploads_are_rejected() {
    let jwt_secret = "test-secret";
    let srv = TestServer::spawn(jwt_secret).await;
    let admin = mint_jwt(jwt_secret, Role::Admin);
    let client = reqwest::Client::new();

    let form = |part: Part| {
        Form::new()
            .text("name", "Sprayer")
            .text("price", "80")
            .text("category", "Sprayers")
            .text("stock", "1")
            .part("images", part)
    };

    let big = Part::bytes(vec![0u8; 6 * 1024 * 1024])
        .file_name("big.jpg")
        .mime_str("image/jpeg")
        .unwrap();
    let res = client
        .post(srv.url("/api/products"))
        .bearer_auth(&admin)
        .multipart(form(big))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::PAYLOAD_TOO_LARGE);

    let text = Part::bytes(b"hello".to_vec())
        .file_name("notes.jpg")
        .mime_str("text/plain")
        .unwrap();
    let res = client
        .post(srv.url("/api/products"))
        .bearer_auth(&admin)
        .multipart(form(text))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::UNSUPPORTED_MEDIA_TYPE);

    // Nothing was created by either request.
    let res = client
        .get(srv.url("/api/products"))
        .bearer_auth(&admin)
        .send()
        .await
        .unwrap();
    let list: serde_json::Value = res.json().await.unwrap();
    assert_eq!(list["total"], 0);
}

#[tokio::test]
async fn inventory_stock_update_and_low_stock() {
    let jwt_secret = "test-secret";
    let srv = TestServer::spawn(jwt_secret).await;
    let admin = mint_jwt(jwt_secret, Role::Admin);
    let client = reqwest::Client::new();

    let product = create_product(
        &client,
        &srv,
        &admin,
        json!({ "name": "Wheelbarrow", "price": 60.0, "category": "Tools", "stock": 30 }),
    )
    .await;
    let id = product["id"].as_str().unwrap();

    let res = client
        .put(srv.url(&format!("/api/inventories/{id}/stock")))
        .bearer_auth(&admin)
        .json(&json!({ "stock": 3 }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);

    let res = client
        .get(srv.url("/api/inventories/low-stock"))
        .bearer_auth(&admin)
        .send()
        .await
        .unwrap();
    let low: serde_json::Value = res.json().await.unwrap();
    assert_eq!(low.as_array().unwrap().len(), 1);
    assert_eq!(low[0]["stock"], 3);

    let res = client
        .put(srv.url(&format!("/api/inventories/{id}/stock")))
        .bearer_auth(&admin)
        .json(&json!({ "stock": -1 }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);

    let res = client
        .get(srv.url("/api/inventories/summary"))
        .bearer_auth(&admin)
        .send()
        .await
        .unwrap();
    let summary: serde_json::Value = res.json().await.unwrap();
    assert_eq!(summary["total_products"], 1);
    assert_eq!(summary["total_stock_value"], 180.0);
    assert_eq!(summary["low_stock_products"], 1);
}

#[tokio::test]
async fn created_category_appears_in_public_listing() {
    let jwt_secret = "test-secret";
    let srv = TestServer::spawn(jwt_secret).await;
    let admin = mint_jwt(jwt_secret, Role::Admin);
    let client = reqwest::Client::new();

    let res = client
        .post(srv.url("/api/categories"))
        .bearer_auth(&admin)
        .json(&json!({ "name": "  Irrigation " }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::CREATED);
    let created: serde_json::Value = res.json().await.unwrap();
    assert_eq!(created["name"], "Irrigation");

    let res = client
        .post(srv.url("/api/categories"))
        .bearer_auth(&admin)
        .json(&json!({ "name": "Irrigation" }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::CONFLICT);

    let res = client.get(srv.url("/api/categories")).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let list: serde_json::Value = res.json().await.unwrap();
    let list = list.as_array().unwrap();
    assert_eq!(list.len(), 1);
    assert_eq!(list[0]["name"], "Irrigation");
    assert_eq!(list[0]["id"], created["id"]);
    assert_ne!(list[0]["id"], "00000000-0000-0000-0000-000000000000");
}
