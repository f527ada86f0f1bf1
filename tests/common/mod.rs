//! Shared harness: an in-memory database behind the full router.
#![allow(dead_code)]

use axum::body::{to_bytes, Body};
use axum::http::{Method, Request, StatusCode};
use axum::Router;
use serde_json::Value;
use sqlx::SqlitePool;
use tower::ServiceExt;

use trivia_api::db::queries::categories::create_category;
use trivia_api::db::queries::questions::create_question;
use trivia_api::db::{establish_memory_connection, run_migrations, NewQuestion};
use trivia_api::server::app::build_router;

pub struct TestHarness {
    pub pool: SqlitePool,
    pub app: Router,
}

impl TestHarness {
    pub async fn new() -> Self {
        let pool = establish_memory_connection()
            .await
            .expect("failed to open in-memory db");
        run_migrations(&pool).await.expect("migrations failed");
        let app = build_router(pool.clone());
        Self { pool, app }
    }

    pub async fn add_category(&self, id: i64, kind: &str) {
        create_category(&self.pool, Some(id), kind).await.unwrap();
    }

    pub async fn add_question(&self, question: &str, category: i64) -> i64 {
        create_question(
            &self.pool,
            &NewQuestion {
                question: question.to_owned(),
                answer: "answer".to_owned(),
                category,
                difficulty: 1,
            },
        )
        .await
        .unwrap()
    }

    /// Science (1) and Art (2) with `count` questions alternating between them.
    pub async fn seeded(count: usize) -> Self {
        let h = Self::new().await;
        h.add_category(1, "Science").await;
        h.add_category(2, "Art").await;
        for n in 0..count {
            h.add_question(&format!("Question number {n}?"), (n % 2) as i64 + 1)
                .await;
        }
        h
    }

    pub async fn request(&self, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
        let builder = Request::builder().method(method).uri(uri);
        let request = match body {
            Some(json) => builder
                .header("content-type", "application/json")
                .body(Body::from(json.to_string())),
            None => builder.body(Body::empty()),
        }
        .unwrap();
        let response = self.app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let json = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or(Value::Null)
        };
        (status, json)
    }

    pub async fn get(&self, uri: &str) -> (StatusCode, Value) {
        self.request(Method::GET, uri, None).await
    }

    pub async fn post(&self, uri: &str, body: Value) -> (StatusCode, Value) {
        self.request(Method::POST, uri, Some(body)).await
    }

    pub async fn delete(&self, uri: &str) -> (StatusCode, Value) {
        self.request(Method::DELETE, uri, None).await
    }
}

pub fn assert_error(status: StatusCode, body: &Value, expected: StatusCode, message: &str) {
    assert_eq!(status, expected);
    assert_eq!(body["success"], false);
    assert_eq!(body["error"], expected.as_u16());
    assert_eq!(body["message"], message);
}
