//! API Integration Tests
//!
//! Tests the HTTP API endpoints with a real database. Chat messages used here are all answered
//! by the keyword rules, so no generative backend is needed.
//!
//! Tests are serialized because they share a global test pool.
//!
//! Note: The `more-di` DI framework doesn't support injecting custom pools.
//! We work around this by using `DatabaseConnection::set_test_pool()` to set
//! a global pool that the DI-created DatabaseConnection will use.

use axum::{
    body::Body,
    http::{Request, StatusCode},
};
use di::{Injectable, ServiceCollection};
use di_axum::RouterServiceProviderExtensions;
use durabata_storefront::{
    api,
    core::assistant::GeminiClient,
    core::catalog::Catalog,
    core::services::{MyChatService, MyContactService},
    core::session::{GREETING, RESET_GREETING, SessionLocks},
    infrastructure::database::DatabaseConnection,
    infrastructure::repositories::{DbContactRepository, DbKeyValueStore},
};
use serde_json::{Value, json};
use serial_test::serial;
use sqlx::SqlitePool;
use std::sync::atomic::{AtomicU32, Ordering};
use tower::ServiceExt;
use uuid::Uuid;

/// Counter for unique test database URIs
static TEST_DB_COUNTER: AtomicU32 = AtomicU32::new(0);

/// Setup test database with migrations and returns pool
/// Uses in-memory SQLite for test isolation
async fn setup_test_db() -> SqlitePool {
    let db_num = TEST_DB_COUNTER.fetch_add(1, Ordering::SeqCst);
    // Use file URI format with shared cache - each test gets a unique DB
    let db_url = format!("sqlite:file:storefront_testdb{}?mode=memory&cache=shared", db_num);

    let pool = SqlitePool::connect(&db_url).await.unwrap();
    sqlx::migrate!().run(&pool).await.unwrap();

    // Set this pool as the global test pool so DI uses it
    DatabaseConnection::set_test_pool(pool.clone());

    pool
}

/// Clean up after test
fn cleanup_test_db() {
    DatabaseConnection::clear_test_pool();
}

/// Create test app - uses the global test pool set by setup_test_db()
fn create_test_app() -> axum::Router {
    let provider = ServiceCollection::new()
        .add(DatabaseConnection::transient())
        .add(Catalog::singleton())
        .add(SessionLocks::singleton())
        .add(GeminiClient::singleton())
        .add(DbKeyValueStore::scoped())
        .add(DbContactRepository::scoped())
        .add(MyChatService::scoped())
        .add(MyContactService::scoped())
        .build_provider()
        .unwrap();

    axum::Router::new()
        .nest("/products", api::products::router())
        .nest("/chat", api::chat::router())
        .nest("/contact", api::contact::router())
        .with_provider(provider)
}

async fn send(app: &axum::Router, request: Request<Body>) -> (StatusCode, String) {
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();

    (status, String::from_utf8(body.to_vec()).unwrap())
}

fn get(uri: &str, session_id: Option<Uuid>) -> Request<Body> {
    let mut builder = Request::builder().uri(uri);
    if let Some(session_id) = session_id {
        builder = builder.header("X-Session-ID", session_id.to_string());
    }
    builder.body(Body::empty()).unwrap()
}

fn post_json(uri: &str, session_id: Option<Uuid>, body: Value) -> Request<Body> {
    let mut builder = Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json");
    if let Some(session_id) = session_id {
        builder = builder.header("X-Session-ID", session_id.to_string());
    }
    builder.body(Body::from(body.to_string())).unwrap()
}

#[tokio::test]
#[serial]
async fn test_list_products() {
    let _pool = setup_test_db().await;
    let app = create_test_app();

    let (status, body) = send(&app, get("/products", None)).await;

    assert_eq!(status, StatusCode::OK);
    let json: Value = serde_json::from_str(&body).unwrap();
    let products = json["products"].as_array().unwrap();
    assert_eq!(products.len(), Catalog::builtin().len());
    assert!(products[0]["imageUrl"].is_string());

    cleanup_test_db();
}

#[tokio::test]
#[serial]
async fn test_list_products_with_filters() {
    let _pool = setup_test_db().await;
    let app = create_test_app();

    let (status, body) = send(
        &app,
        get("/products?category=besi&out_of_stock=true", None),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    let json: Value = serde_json::from_str(&body).unwrap();
    let products = json["products"].as_array().unwrap();
    assert_eq!(products.len(), 1);
    assert_eq!(products[0]["name"], "Besi Hollow 4x4");
    assert_eq!(products[0]["stock"], 0);

    let (_, body) = send(&app, get("/products?q=bata", None)).await;
    let json: Value = serde_json::from_str(&body).unwrap();
    assert_eq!(json["products"].as_array().unwrap().len(), 2);

    cleanup_test_db();
}

#[tokio::test]
#[serial]
async fn test_get_product_by_id() {
    let _pool = setup_test_db().await;
    let app = create_test_app();

    let (status, body) = send(&app, get("/products/1", None)).await;
    assert_eq!(status, StatusCode::OK);
    let json: Value = serde_json::from_str(&body).unwrap();
    assert_eq!(json["name"], "Bata Hebel Merah");
    assert_eq!(json["oldPrice"], 11000);

    let (status, _) = send(&app, get("/products/999", None)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    cleanup_test_db();
}

#[tokio::test]
#[serial]
async fn test_chat_requires_session_header() {
    let _pool = setup_test_db().await;
    let app = create_test_app();

    let (status, _) = send(&app, get("/chat/messages", None)).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);

    cleanup_test_db();
}

#[tokio::test]
#[serial]
async fn test_new_session_starts_with_greeting() {
    let _pool = setup_test_db().await;
    let app = create_test_app();

    let (status, body) = send(&app, get("/chat/messages", Some(Uuid::new_v4()))).await;

    assert_eq!(status, StatusCode::OK);
    let json: Value = serde_json::from_str(&body).unwrap();
    let messages = json["messages"].as_array().unwrap();
    assert_eq!(messages.len(), 1);
    assert_eq!(messages[0]["role"], "bot");
    assert_eq!(messages[0]["text"], GREETING);

    cleanup_test_db();
}

#[tokio::test]
#[serial]
async fn test_chat_turn_streams_and_persists_reply() {
    let pool = setup_test_db().await;
    let app = create_test_app();
    let session_id = Uuid::new_v4();

    let (status, body) = send(
        &app,
        post_json("/chat/messages", Some(session_id), json!({ "text": "cari kaca" })),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    let events: Vec<&str> = body
        .lines()
        .filter_map(|line| line.strip_prefix("event:"))
        .map(str::trim)
        .collect();
    assert_eq!(events, vec!["new_message", "typing", "new_message", "typing"]);
    assert!(body.contains("\"typing\":true"));
    assert!(body.contains("Tidak ditemukan produk dengan kata kunci 'kaca'"));

    let (_, body) = send(&app, get("/chat/messages", Some(session_id))).await;
    let json: Value = serde_json::from_str(&body).unwrap();
    let messages = json["messages"].as_array().unwrap();
    assert_eq!(messages.len(), 3);
    assert_eq!(messages[1]["role"], "user");
    assert_eq!(messages[1]["text"], "cari kaca");
    assert_eq!(messages[2]["role"], "bot");

    // the transcript is stored under the session's key
    let (raw,): (String,) = sqlx::query_as("SELECT value FROM kv_store WHERE entry_key = ?")
        .bind(format!("duraChatHistory:{session_id}"))
        .fetch_one(&pool)
        .await
        .unwrap();
    let stored: Value = serde_json::from_str(&raw).unwrap();
    assert_eq!(stored.as_array().unwrap().len(), 3);
    assert!(stored[1]["timestamp"].is_string());

    cleanup_test_db();
}

#[tokio::test]
#[serial]
async fn test_blank_chat_message_is_rejected() {
    let _pool = setup_test_db().await;
    let app = create_test_app();
    let session_id = Uuid::new_v4();

    let (status, _) = send(
        &app,
        post_json("/chat/messages", Some(session_id), json!({ "text": "   " })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (_, body) = send(&app, get("/chat/messages", Some(session_id))).await;
    let json: Value = serde_json::from_str(&body).unwrap();
    assert_eq!(json["messages"].as_array().unwrap().len(), 1);

    cleanup_test_db();
}

#[tokio::test]
#[serial]
async fn test_quick_replies_and_reset() {
    let _pool = setup_test_db().await;
    let app = create_test_app();
    let session_id = Uuid::new_v4();

    let (_, body) = send(&app, get("/chat/quick-replies", Some(session_id))).await;
    let json: Value = serde_json::from_str(&body).unwrap();
    assert_eq!(json["visible"], true);
    assert_eq!(json["quick_replies"].as_array().unwrap().len(), 6);
    assert_eq!(json["quick_replies"][0]["label"], "Produk termurah");
    assert_eq!(json["quick_replies"][0]["category"], "price");

    send(
        &app,
        post_json(
            "/chat/messages",
            Some(session_id),
            json!({ "text": "Produk termurah" }),
        ),
    )
    .await;

    let (_, body) = send(&app, get("/chat/quick-replies", Some(session_id))).await;
    let json: Value = serde_json::from_str(&body).unwrap();
    assert_eq!(json["visible"], false);

    let (status, body) = send(
        &app,
        Request::builder()
            .method("DELETE")
            .uri("/chat/messages")
            .header("X-Session-ID", session_id.to_string())
            .body(Body::empty())
            .unwrap(),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let json: Value = serde_json::from_str(&body).unwrap();
    let messages = json["messages"].as_array().unwrap();
    assert_eq!(messages.len(), 1);
    assert_eq!(messages[0]["text"], RESET_GREETING);

    let (_, body) = send(&app, get("/chat/quick-replies", Some(session_id))).await;
    let json: Value = serde_json::from_str(&body).unwrap();
    assert_eq!(json["visible"], true);

    cleanup_test_db();
}

#[tokio::test]
#[serial]
async fn test_contact_status() {
    let _pool = setup_test_db().await;
    let app = create_test_app();

    let (status, body) = send(&app, get("/contact", None)).await;

    assert_eq!(status, StatusCode::OK);
    let json: Value = serde_json::from_str(&body).unwrap();
    assert_eq!(json["message"], "Contact API aktif ✅");

    cleanup_test_db();
}

#[tokio::test]
#[serial]
async fn test_contact_submission_is_stored() {
    let pool = setup_test_db().await;
    let app = create_test_app();

    let (status, body) = send(
        &app,
        post_json(
            "/contact",
            None,
            json!({
                "nama": "Siti",
                "email": "siti@example.com",
                "subjek": "Pengiriman",
                "pesan": "Apakah bisa kirim ke Bekasi?"
            }),
        ),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    let json: Value = serde_json::from_str(&body).unwrap();
    assert_eq!(json["message"], "Pesan berhasil dikirim ✅");

    let row: (String, String, String, String) =
        sqlx::query_as("SELECT name, email, subject, message FROM contact")
            .fetch_one(&pool)
            .await
            .unwrap();
    assert_eq!(row.0, "Siti");
    assert_eq!(row.2, "Pengiriman");

    cleanup_test_db();
}

#[tokio::test]
#[serial]
async fn test_contact_submission_rejected_by_database() {
    let pool = setup_test_db().await;
    let app = create_test_app();

    let (status, body) = send(
        &app,
        post_json(
            "/contact",
            None,
            json!({ "name": "Siti", "subject": "Tanpa email", "message": "Halo" }),
        ),
    )
    .await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    let json: Value = serde_json::from_str(&body).unwrap();
    assert_eq!(json["message"], "Gagal mengirim data ke server");

    let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM contact")
        .fetch_one(&pool)
        .await
        .unwrap();
    assert_eq!(count, 0);

    cleanup_test_db();
}
