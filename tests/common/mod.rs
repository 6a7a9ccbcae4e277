//! Shared harness: a fully wired router over a throwaway SQLite file.

#![allow(dead_code)]

use axum::{
    body::{to_bytes, Body},
    http::{Request, StatusCode},
    Router,
};
use bookshelf_db::{Database, DatabaseSettings};
use bookshelf_kernel::{settings::Settings, InitCtx};
use serde_json::Value;
use tempfile::TempDir;
use tower::ServiceExt;

pub struct TestApp {
    pub router: Router,
    pub db: Database,
    _dir: TempDir,
}

impl TestApp {
    pub async fn spawn() -> Self {
        let dir = TempDir::new().unwrap();
        let mut settings = Settings::default();
        settings.server.api_prefix = "/api/v1".to_string();
        settings.database = DatabaseSettings {
            url: format!("sqlite://{}", dir.path().join("catalog.db").display()),
            ..DatabaseSettings::default()
        };

        let db = Database::connect(&settings.database).await.unwrap();
        let registry = bookshelf_app::registry();
        bookshelf_app::migrate(&db, &registry).await.unwrap();

        let ctx = InitCtx {
            settings: &settings,
            db: &db,
        };
        registry.init_modules(&ctx).await.unwrap();
        let router = bookshelf_http::build_router(&registry, &ctx);

        Self {
            router,
            db,
            _dir: dir,
        }
    }

    pub async fn request(&self, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
        let builder = Request::builder().method(method).uri(uri);
        let request = match body {
            Some(body) => builder
                .header("content-type", "application/json")
                .body(Body::from(body.to_string())),
            None => builder.body(Body::empty()),
        }
        .unwrap();

        self.send(request).await
    }

    pub async fn send(&self, request: Request<Body>) -> (StatusCode, Value) {
        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or_else(|_| Value::String(String::from_utf8_lossy(&bytes).into_owned()))
        };
        (status, body)
    }

    pub async fn get(&self, uri: &str) -> (StatusCode, Value) {
        self.request("GET", uri, None).await
    }

    pub async fn post(&self, uri: &str, body: Value) -> (StatusCode, Value) {
        self.request("POST", uri, Some(body)).await
    }

    pub async fn patch(&self, uri: &str, body: Value) -> (StatusCode, Value) {
        self.request("PATCH", uri, Some(body)).await
    }

    pub async fn delete(&self, uri: &str) -> (StatusCode, Value) {
        self.request("DELETE", uri, None).await
    }

    /// Create a genre and return its id.
    pub async fn genre(&self, name: &str) -> String {
        let (status, body) = self
            .post("/api/v1/genres/", serde_json::json!({ "name": name }))
            .await;
        assert_eq!(status, StatusCode::CREATED, "{body}");
        body["id"].as_str().unwrap().to_string()
    }

    /// Create a contributor and return its id.
    pub async fn contributor(&self, name: &str) -> String {
        let (status, body) = self
            .post("/api/v1/contributors/", serde_json::json!({ "name": name }))
            .await;
        assert_eq!(status, StatusCode::CREATED, "{body}");
        body["id"].as_str().unwrap().to_string()
    }

    pub async fn book_rows(&self) -> i64 {
        sqlx::query_scalar("SELECT COUNT(*) FROM books")
            .fetch_one(self.db.pool())
            .await
            .unwrap()
    }
}
