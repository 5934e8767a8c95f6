//! Test harness: a stub CRM and a cookie-carrying browser over the router

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum::body::{to_bytes, Body};
use axum::http::{header, Method, Request, StatusCode};
use axum::Router;
use nbadmin_core::{
    ConsoleConfig, TokenProvider, TransportError, UpstreamRequest, UpstreamResponse,
};
use nbadmin_server::{AdminServer, AppState, ServerConfig};
use serde_json::Value;
use tower::ServiceExt;

pub const BASE_URL: &str = "http://nb.test";

#[derive(Default)]
pub struct StubCrm {
    routes: Mutex<HashMap<(Method, String), (u16, String)>>,
    calls: Mutex<Vec<(Method, String)>>,
}

impl StubCrm {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn on(&self, method: Method, path: &str, status: u16, body: Value) {
        self.on_raw(method, path, status, &body.to_string());
    }

    pub fn on_raw(&self, method: Method, path: &str, status: u16, body: &str) {
        self.routes
            .lock()
            .unwrap()
            .insert((method, path.to_string()), (status, body.to_string()));
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    pub fn count(&self, method: &Method, path: &str) -> usize {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .filter(|(m, p)| m == method && p == path)
            .count()
    }
}

#[async_trait]
impl TokenProvider for StubCrm {
    fn name(&self) -> &str {
        "stub"
    }

    async fn authenticated_request(
        &self,
        request: UpstreamRequest,
    ) -> Result<UpstreamResponse, TransportError> {
        let path = request
            .url
            .strip_prefix(BASE_URL)
            .unwrap_or(&request.url)
            .to_string();
        self.calls
            .lock()
            .unwrap()
            .push((request.method.clone(), path.clone()));

        let reply = self
            .routes
            .lock()
            .unwrap()
            .get(&(request.method, path))
            .cloned();
        Ok(match reply {
            Some((status, body)) => UpstreamResponse::new(status, body),
            None => UpstreamResponse::new(404, r#"{"code":"not_found"}"#),
        })
    }
}

pub fn router(stub: &Arc<StubCrm>) -> Router {
    let console = ConsoleConfig::builder()
        .slug("biitech")
        .base_url(BASE_URL)
        .oauth_client("client-1", "secret-1", "http://console.test/oauth/callback")
        .access_token("token-1")
        .survey_id("3")
        .question_id("5")
        .build()
        .unwrap();
    let state = AppState::new(console, stub.clone());
    AdminServer::new(state, ServerConfig::default())
        .unwrap()
        .router()
}

/// Answer as seen by the browser
pub struct Page {
    pub status: StatusCode,
    pub location: Option<String>,
    pub json: Value,
}

/// Router client that carries the session cookie between requests
pub struct Browser {
    router: Router,
    cookie: Option<String>,
}

impl Browser {
    pub fn new(stub: &Arc<StubCrm>) -> Self {
        Self {
            router: router(stub),
            cookie: None,
        }
    }

    pub async fn get(&mut self, path: &str) -> Page {
        let request = Request::builder().method(Method::GET).uri(path);
        self.send(request, Body::empty()).await
    }

    pub async fn post(&mut self, path: &str, fields: &[(&str, &str)]) -> Page {
        let body = fields
            .iter()
            .map(|(k, v)| format!("{}={}", encode(k), encode(v)))
            .collect::<Vec<_>>()
            .join("&");
        let request = Request::builder()
            .method(Method::POST)
            .uri(path)
            .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded");
        self.send(request, Body::from(body)).await
    }

    /// POST with no body and no content type
    pub async fn post_empty(&mut self, path: &str) -> Page {
        let request = Request::builder().method(Method::POST).uri(path);
        self.send(request, Body::empty()).await
    }

    async fn send(&mut self, mut request: axum::http::request::Builder, body: Body) -> Page {
        if let Some(cookie) = &self.cookie {
            request = request.header(header::COOKIE, cookie);
        }
        let response = self
            .router
            .clone()
            .oneshot(request.body(body).unwrap())
            .await
            .unwrap();

        for set_cookie in response.headers().get_all(header::SET_COOKIE) {
            let pair = set_cookie
                .to_str()
                .unwrap()
                .split(';')
                .next()
                .unwrap()
                .trim()
                .to_string();
            let emptied = pair.ends_with('=');
            self.cookie = if emptied { None } else { Some(pair) };
        }

        let status = response.status();
        let location = response
            .headers()
            .get(header::LOCATION)
            .map(|v| v.to_str().unwrap().to_string());
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let json = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };

        Page {
            status,
            location,
            json,
        }
    }
}

fn encode(value: &str) -> String {
    value
        .bytes()
        .map(|b| match b {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'_' | b'.' => (b as char).to_string(),
            b' ' => "+".to_string(),
            other => format!("%{:02X}", other),
        })
        .collect()
}
