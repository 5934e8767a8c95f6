//! Recording stand-in for the CRM REST API

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use nbadmin_core::{
    PayloadDefaults, ResourceProxy, Tenant, TokenProvider, TransportError, UpstreamRequest,
    UpstreamResponse,
};
use reqwest::Method;
use serde_json::Value;

pub const BASE_URL: &str = "http://nb.test";

#[derive(Clone)]
enum Reply {
    Respond { status: u16, body: String, delay: Duration },
    Fail(TransportError),
}

#[derive(Debug, Clone)]
pub struct RecordedCall {
    pub method: Method,
    pub path: String,
    pub params: Vec<(String, String)>,
    pub body: Option<Value>,
}

#[derive(Default)]
pub struct StubService {
    routes: Mutex<HashMap<(Method, String), Reply>>,
    calls: Mutex<Vec<RecordedCall>>,
}

impl StubService {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn on(&self, method: Method, path: &str, status: u16, body: Value) {
        self.on_delayed(method, path, status, body, Duration::ZERO);
    }

    pub fn on_delayed(&self, method: Method, path: &str, status: u16, body: Value, delay: Duration) {
        self.routes.lock().unwrap().insert(
            (method, path.to_string()),
            Reply::Respond {
                status,
                body: body.to_string(),
                delay,
            },
        );
    }

    pub fn on_raw(&self, method: Method, path: &str, status: u16, body: &str) {
        self.routes.lock().unwrap().insert(
            (method, path.to_string()),
            Reply::Respond {
                status,
                body: body.to_string(),
                delay: Duration::ZERO,
            },
        );
    }

    pub fn fail(&self, method: Method, path: &str, error: TransportError) {
        self.routes
            .lock()
            .unwrap()
            .insert((method, path.to_string()), Reply::Fail(error));
    }

    pub fn calls(&self) -> Vec<RecordedCall> {
        self.calls.lock().unwrap().clone()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    pub fn count(&self, method: &Method, path: &str) -> usize {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .filter(|c| &c.method == method && c.path == path)
            .count()
    }
}

#[async_trait]
impl TokenProvider for StubService {
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
        self.calls.lock().unwrap().push(RecordedCall {
            method: request.method.clone(),
            path: path.clone(),
            params: request.params.clone(),
            body: request.body.clone(),
        });

        let reply = self
            .routes
            .lock()
            .unwrap()
            .get(&(request.method.clone(), path))
            .cloned();
        match reply {
            Some(Reply::Respond { status, body, delay }) => {
                if !delay.is_zero() {
                    tokio::time::sleep(delay).await;
                }
                Ok(UpstreamResponse::new(status, body))
            }
            Some(Reply::Fail(error)) => Err(error),
            None => Ok(UpstreamResponse::new(404, r#"{"code":"not_found"}"#)),
        }
    }
}

pub fn tenant() -> Arc<Tenant> {
    Arc::new(Tenant::new("biitech").with_base_url(BASE_URL))
}

pub fn proxy(stub: &Arc<StubService>) -> ResourceProxy {
    proxy_with(stub, PayloadDefaults::default())
}

pub fn proxy_with(stub: &Arc<StubService>, defaults: PayloadDefaults) -> ResourceProxy {
    ResourceProxy::new(stub.clone(), tenant(), Arc::new(defaults))
}
