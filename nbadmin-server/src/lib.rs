//! nbadmin Server - browser-facing console over nbadmin-core
//!
//! Binds every console route to one [`ResourceProxy`] operation. The proxy is
//! built per request around the shared [`TokenProvider`]; remote ids live in
//! a signed session cookie managed by `tower-sessions`.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────┐
//! │                     AdminServer                        │
//! │   TraceLayer ─► SessionManagerLayer (signed cookie)    │
//! │                        │                              │
//! │  ┌─────────────────────┼─────────────────────┐        │
//! │  ▼                     ▼                     ▼        │
//! │ /people …         /events …            /survey …      │
//! │  └──────── ResourceProxy (per request) ──────┘        │
//! └───────────────────────┬──────────────────────────────┘
//!                         ▼
//!              Arc<dyn TokenProvider> (AppState)
//! ```

pub mod routes;
pub mod session;
mod config;

pub use config::{ServerConfig, ServerConfigBuilder};
pub use session::{CookieSession, Flash, FlashLevel};

use std::net::SocketAddr;
use std::sync::Arc;

use axum::Router;
use tower_http::trace::TraceLayer;
use tower_sessions::cookie::Key;
use tower_sessions::{Expiry, MemoryStore, SessionManagerLayer};

use nbadmin_core::{
    ConsoleConfig, ConsoleError, ConsoleResult, OAuthSettings, PayloadDefaults, ResourceProxy,
    Tenant, TokenProvider,
};

/// Shared application state
pub struct AppState {
    /// Authenticated handle to the CRM, shared by every request
    pub provider: Arc<dyn TokenProvider>,
    pub tenant: Arc<Tenant>,
    pub defaults: Arc<PayloadDefaults>,
    pub oauth: OAuthSettings,
}

impl AppState {
    /// Create app state from the core configuration
    pub fn new(config: ConsoleConfig, provider: Arc<dyn TokenProvider>) -> Self {
        Self {
            provider,
            tenant: Arc::new(config.tenant),
            defaults: Arc::new(config.defaults),
            oauth: config.oauth,
        }
    }

    /// Fresh proxy for one request cycle
    pub fn proxy(&self) -> ResourceProxy {
        ResourceProxy::new(
            Arc::clone(&self.provider),
            Arc::clone(&self.tenant),
            Arc::clone(&self.defaults),
        )
    }
}

/// nbadmin HTTP Server
///
/// # Example
///
/// ```rust,ignore
/// use std::sync::Arc;
/// use nbadmin_core::{BearerTokenProvider, ConsoleConfig};
/// use nbadmin_server::{AdminServer, AppState, ServerConfig};
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let console = ConsoleConfig::builder()
///         .slug("biitech")
///         .oauth_client(id, secret, redirect)
///         .access_token(token)
///         .build()?;
///     let provider = Arc::new(BearerTokenProvider::new(&token, console.timeout)?);
///     let state = AppState::new(console, provider);
///
///     let server = AdminServer::new(state, ServerConfig::builder().port(8080).build())?;
///     server.run().await
/// }
/// ```
pub struct AdminServer {
    state: Arc<AppState>,
    config: ServerConfig,
    key: Key,
}

impl AdminServer {
    /// Create a server; a configured signing key must be at least 64 bytes
    pub fn new(state: AppState, config: ServerConfig) -> ConsoleResult<Self> {
        let key = match &config.secret_key {
            Some(bytes) => Key::try_from(bytes.as_slice()).map_err(|e| ConsoleError::Config {
                reason: format!("secret key: {}", e),
            })?,
            None => {
                tracing::warn!("No secret key configured; sessions will not survive a restart");
                Key::generate()
            }
        };

        Ok(Self {
            state: Arc::new(state),
            config,
            key,
        })
    }

    /// Build the Axum router with all routes and layers
    pub fn router(&self) -> Router {
        let sessions = SessionManagerLayer::new(MemoryStore::default())
            .with_secure(self.config.secure_cookies)
            .with_expiry(Expiry::OnSessionEnd)
            .with_signed(self.key.clone());

        routes::create_router(Arc::clone(&self.state))
            .layer(sessions)
            .layer(TraceLayer::new_for_http())
    }

    /// Get the socket address for the server
    pub fn addr(&self) -> SocketAddr {
        SocketAddr::new(self.config.host, self.config.port)
    }

    /// Run the server
    pub async fn run(&self) -> Result<(), Box<dyn std::error::Error>> {
        let app = self.router();
        let addr = self.addr();

        tracing::info!("nbadmin Server listening on http://{}", addr);
        tracing::info!("Tenant: {}", self.state.tenant.base_url);
        tracing::info!("Endpoints:");
        for (method, path) in routes::ENDPOINTS {
            tracing::info!("  {:<4} {}", method, path);
        }

        let listener = tokio::net::TcpListener::bind(addr).await?;
        axum::serve(listener, app).await?;

        Ok(())
    }
}
