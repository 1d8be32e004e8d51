//! HTTP-level integration tests for the pantry planner backend.
//!
//! Each fixture serves the full router on an ephemeral port against a fresh
//! SQLite database and search index in a temporary directory.

mod ai;
mod auth;
mod catalog;
mod dedup;
mod planning;

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Response};
use serde_json::{json, Value};
use tempfile::TempDir;

use crate::ai::{ChatRequest, ChatResponse, LlmProvider};
use crate::config::{Config, LogFormat};
use crate::db::{init_database, Repository};
use crate::errors::AppError;
use crate::search::SearchIndex;
use crate::{create_router, AppState};

/// LLM provider that answers with scripted replies in order.
#[derive(Default)]
pub(crate) struct MockLlm {
    replies: Mutex<VecDeque<String>>,
    requests: Mutex<Vec<ChatRequest>>,
}

impl MockLlm {
    pub(crate) fn push_reply(&self, reply: impl Into<String>) {
        self.replies.lock().unwrap().push_back(reply.into());
    }

    pub(crate) fn request_count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }

    pub(crate) fn last_request(&self) -> Option<ChatRequest> {
        self.requests.lock().unwrap().last().cloned()
    }
}

#[async_trait]
impl LlmProvider for MockLlm {
    fn name(&self) -> &'static str {
        "mock"
    }

    async fn complete(&self, request: &ChatRequest) -> Result<ChatResponse, AppError> {
        self.requests.lock().unwrap().push(request.clone());
        let content = self
            .replies
            .lock()
            .unwrap()
            .pop_front()
            .ok_or_else(|| AppError::Ai("No scripted reply".to_string()))?;
        Ok(ChatResponse {
            content,
            model: "mock".to_string(),
        })
    }
}

/// A signed-in user of the test server.
pub(crate) struct Session {
    pub cookie: String,
    pub user_id: String,
}

/// Test fixture for integration tests.
pub(crate) struct TestFixture {
    pub client: Client,
    pub base_url: String,
    _temp_dir: TempDir,
}

impl TestFixture {
    pub(crate) async fn new() -> Self {
        Self::with_llm(None).await
    }

    pub(crate) async fn with_llm(llm: Option<Arc<dyn LlmProvider>>) -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let db_path = temp_dir.path().join("test.sqlite");
        let index_path = temp_dir.path().join("index");

        // Initialize database
        let pool = init_database(&db_path).await.expect("Failed to init DB");
        let repo = Arc::new(Repository::new(pool));

        // Initialize search index
        let search = Arc::new(SearchIndex::open(&index_path).expect("Failed to init search"));

        // Create config
        let config = Config {
            db_path,
            index_path,
            bind_addr: "127.0.0.1:0".parse().unwrap(),
            log_level: "warn".to_string(),
            log_format: LogFormat::Text,
            session_ttl_hours: 1,
            cookie_secure: false,
            llm: None,
        };

        let state = AppState {
            repo,
            search,
            config: Arc::new(config),
            llm,
        };

        let app = create_router(state);

        // Bind to random port
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind");
        let addr = listener.local_addr().expect("Failed to get addr");
        let base_url = format!("http://{}", addr);

        // Spawn server
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        // Wait for server to start
        tokio::time::sleep(tokio::time::Duration::from_millis(100)).await;

        TestFixture {
            client: Client::new(),
            base_url,
            _temp_dir: temp_dir,
        }
    }

    pub(crate) fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Register a user and keep the session cookie from the response.
    pub(crate) async fn register(&self, email: &str) -> Session {
        let resp = self
            .client
            .post(self.url("/api/auth/register"))
            .json(&json!({
                "email": email,
                "password": "correct horse battery",
                "name": "Test Cook"
            }))
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status(), 200, "registration failed for {}", email);

        let cookie = session_cookie(&resp).expect("register should set a session cookie");
        let body: Value = resp.json().await.unwrap();
        Session {
            cookie,
            user_id: body["data"]["id"].as_str().unwrap().to_string(),
        }
    }

    pub(crate) fn get(&self, session: &Session, path: &str) -> RequestBuilder {
        self.client
            .get(self.url(path))
            .header(reqwest::header::COOKIE, &session.cookie)
    }

    pub(crate) fn post(&self, session: &Session, path: &str) -> RequestBuilder {
        self.client
            .post(self.url(path))
            .header(reqwest::header::COOKIE, &session.cookie)
    }

    pub(crate) fn put(&self, session: &Session, path: &str) -> RequestBuilder {
        self.client
            .put(self.url(path))
            .header(reqwest::header::COOKIE, &session.cookie)
    }

    pub(crate) fn patch(&self, session: &Session, path: &str) -> RequestBuilder {
        self.client
            .patch(self.url(path))
            .header(reqwest::header::COOKIE, &session.cookie)
    }

    pub(crate) fn delete(&self, session: &Session, path: &str) -> RequestBuilder {
        self.client
            .delete(self.url(path))
            .header(reqwest::header::COOKIE, &session.cookie)
    }

    /// Create a shopping list and return its id.
    pub(crate) async fn create_list(&self, session: &Session, name: &str) -> String {
        let body = ok_json(
            self.post(session, "/api/shopping-lists")
                .json(&json!({ "name": name }))
                .send()
                .await
                .unwrap(),
        )
        .await;
        body["data"]["id"].as_str().unwrap().to_string()
    }

    /// Add an item to a list and return its id.
    pub(crate) async fn add_item(
        &self,
        session: &Session,
        list_id: &str,
        name: &str,
        quantity: f64,
        unit: &str,
    ) -> String {
        let body = ok_json(
            self.post(session, &format!("/api/shopping-lists/{}/items", list_id))
                .json(&json!({ "name": name, "quantity": quantity, "unit": unit }))
                .send()
                .await
                .unwrap(),
        )
        .await;
        body["data"]["id"].as_str().unwrap().to_string()
    }

    pub(crate) async fn set_list_status(&self, session: &Session, list_id: &str, status: &str) {
        ok_json(
            self.patch(session, &format!("/api/shopping-lists/{}", list_id))
                .json(&json!({ "status": status }))
                .send()
                .await
                .unwrap(),
        )
        .await;
    }

    /// Items of a list in display order.
    pub(crate) async fn list_items(&self, session: &Session, list_id: &str) -> Vec<Value> {
        let body = ok_json(
            self.get(session, &format!("/api/shopping-lists/{}/items", list_id))
                .send()
                .await
                .unwrap(),
        )
        .await;
        body["data"].as_array().unwrap().clone()
    }
}

/// `name=value` part of the session `Set-Cookie` header.
pub(crate) fn session_cookie(resp: &Response) -> Option<String> {
    resp.headers()
        .get(reqwest::header::SET_COOKIE)?
        .to_str()
        .ok()?
        .split(';')
        .next()
        .map(|pair| pair.trim().to_string())
}

/// Assert a 200 success envelope and return the body.
pub(crate) async fn ok_json(resp: Response) -> Value {
    let status = resp.status();
    let body: Value = resp.json().await.unwrap();
    assert_eq!(status, 200, "unexpected response: {}", body);
    assert_eq!(body["success"], true);
    body
}

/// Assert an error envelope with the given status and code.
pub(crate) async fn error_json(resp: Response, status: u16, code: &str) -> Value {
    assert_eq!(resp.status(), status);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["success"], false);
    assert_eq!(body["code"], code);
    body
}

pub(crate) fn today() -> String {
    crate::db::today().format("%Y-%m-%d").to_string()
}

pub(crate) fn days_ago(days: i64) -> String {
    (crate::db::today() - chrono::Duration::days(days))
        .format("%Y-%m-%d")
        .to_string()
}
