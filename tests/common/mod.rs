//! Shared utilities for integration testing.

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::{
    body::{to_bytes, Body},
    extract::State,
    http::{header, HeaderValue, Request, StatusCode},
    response::{IntoResponse, Response},
    Json, Router,
};
use serde_json::Value;
use tokio::net::TcpListener;

use seller_console::config::ClientConfig;

pub const ORDERS: &str = "/api/v1/seller/orders";
pub const REFRESH: &str = "/api/v1/auth/refresh";
pub const LOGIN: &str = "/api/v1/auth/login";

/// A request as seen by the mock backend.
#[derive(Debug, Clone)]
pub struct RecordedRequest {
    pub method: String,
    pub path: String,
    pub query: Option<String>,
    pub cookie: Option<String>,
    pub request_id: Option<String>,
    pub content_type: Option<String>,
    pub body: Vec<u8>,
}

impl RecordedRequest {
    pub fn has_cookie(&self, pair: &str) -> bool {
        self.cookie
            .as_deref()
            .is_some_and(|c| c.split("; ").any(|p| p == pair))
    }

    pub fn body_text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }
}

/// Scripted answer.
#[derive(Debug, Clone)]
pub struct Reply {
    pub status: u16,
    pub body: Value,
    pub set_cookie: Option<String>,
    pub delay: Option<Duration>,
}

impl Reply {
    pub fn json(status: u16, body: Value) -> Self {
        Self {
            status,
            body,
            set_cookie: None,
            delay: None,
        }
    }

    pub fn status(status: u16) -> Self {
        Self::json(status, Value::Null)
    }

    pub fn with_cookie(mut self, cookie: &str) -> Self {
        self.set_cookie = Some(cookie.to_string());
        self
    }

    pub fn after(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }
}

type Script = dyn Fn(&RecordedRequest, usize) -> Reply + Send + Sync;

#[derive(Clone)]
struct BackendState {
    script: Arc<Script>,
    log: Arc<Mutex<Vec<RecordedRequest>>>,
    counts: Arc<Mutex<HashMap<String, usize>>>,
}

/// Programmable backend bound to an ephemeral local port.
///
/// The script receives the request and how many earlier requests hit the
/// same path.
pub struct MockBackend {
    pub url: String,
    log: Arc<Mutex<Vec<RecordedRequest>>>,
}

impl MockBackend {
    pub async fn start<F>(script: F) -> Self
    where
        F: Fn(&RecordedRequest, usize) -> Reply + Send + Sync + 'static,
    {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let log = Arc::new(Mutex::new(Vec::new()));

        let state = BackendState {
            script: Arc::new(script),
            log: log.clone(),
            counts: Arc::new(Mutex::new(HashMap::new())),
        };
        let app = Router::new().fallback(handle).with_state(state);

        tokio::spawn(async move {
            let _ = axum::serve(listener, app).await;
        });

        Self {
            url: format!("http://{}", addr),
            log,
        }
    }

    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.log.lock().unwrap().clone()
    }

    pub fn requests_to(&self, path: &str) -> Vec<RecordedRequest> {
        self.requests()
            .into_iter()
            .filter(|r| r.path == path)
            .collect()
    }

    pub fn hits(&self, path: &str) -> usize {
        self.requests_to(path).len()
    }

    /// Client configuration pointing at this backend.
    pub fn config(&self) -> ClientConfig {
        let mut config = ClientConfig::default();
        config.api.base_url = self.url.clone();
        config
    }
}

async fn handle(State(state): State<BackendState>, request: Request<Body>) -> Response {
    let (parts, body) = request.into_parts();
    let get_header = |name: header::HeaderName| {
        parts
            .headers
            .get(name)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string)
    };

    let recorded = RecordedRequest {
        method: parts.method.to_string(),
        path: parts.uri.path().to_string(),
        query: parts.uri.query().map(str::to_string),
        cookie: get_header(header::COOKIE),
        request_id: get_header(header::HeaderName::from_static("x-request-id")),
        content_type: get_header(header::CONTENT_TYPE),
        body: to_bytes(body, usize::MAX)
            .await
            .map(|b| b.to_vec())
            .unwrap_or_default(),
    };

    let nth = {
        let mut counts = state.counts.lock().unwrap();
        let count = counts.entry(recorded.path.clone()).or_insert(0);
        let nth = *count;
        *count += 1;
        nth
    };
    state.log.lock().unwrap().push(recorded.clone());

    let reply = (state.script)(&recorded, nth);
    if let Some(delay) = reply.delay {
        tokio::time::sleep(delay).await;
    }

    let status = StatusCode::from_u16(reply.status).unwrap();
    let mut response = (status, Json(reply.body)).into_response();
    if let Some(cookie) = reply.set_cookie {
        response
            .headers_mut()
            .append(header::SET_COOKIE, HeaderValue::from_str(&cookie).unwrap());
    }
    response
}

/// An address nothing listens on.
pub async fn closed_address() -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    format!("http://{}", addr)
}
