//! nbadmin Core - session-bound resource proxy for the CRM REST API
//!
//! Every console operation follows the same pattern: read form input, shape a
//! JSON payload, issue one REST call through an authenticated
//! [`TokenProvider`], then bind or clear a remote id in the browser session.
//! This crate holds that pattern; the HTTP surface lives in `nbadmin-server`.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────┐
//! │                     ResourceProxy                          │
//! │   list · get_current · create · update · delete          │
//! │                                                          │
//! │  ResourceDescriptor ──► payload builders (FormFields)     │
//! │          │                                               │
//! │          ▼                                               │
//! │  SessionStore (user_id · event_id · question_answer)     │
//! └────────────────────────────┬─────────────────────────────┘
//!                              │ UpstreamRequest
//!                              ▼
//!                 TokenProvider (bearer token, timeout)
//!                              │
//!                              ▼
//!                 Resource Service (CRM REST API)
//! ```
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use nbadmin_core::{BearerTokenProvider, FormFields, MemorySession, ResourceKind, ResourceProxy};
//!
//! let provider = Arc::new(BearerTokenProvider::new(&token, timeout)?);
//! let proxy = ResourceProxy::new(provider, tenant, defaults);
//! let session = MemorySession::new();
//!
//! let form = FormFields::new()
//!     .with("first_name", "Ada")
//!     .with("last_name", "Lovelace")
//!     .with("email", "ada@example.com");
//! let id = proxy.create(ResourceKind::Person, &form, &session).await?;
//! ```

pub mod config;
pub mod descriptor;
pub mod error;
pub mod payload;
pub mod proxy;
pub mod session;
pub mod transport;

pub use config::{
    ConsoleConfig, ConsoleConfigBuilder, OAuthSettings, PayloadDefaults, Tenant, DEFAULT_TIMEOUT_MS,
};
pub use descriptor::{ResourceDescriptor, ResourceKind, DESCRIPTORS};
pub use error::{ConsoleError, ConsoleResult, ErrorCategory};
pub use payload::FormFields;
pub use proxy::{
    Current, EmailLookup, Outcome, RemoteRecord, ResourceProxy, SkipReason, SurveyEntry,
    SurveyListing,
};
pub use session::{Binding, MemorySession, RemoteId, SessionKey, SessionStore};
pub use transport::{
    BearerTokenProvider, TokenProvider, TransportError, UpstreamRequest, UpstreamResponse,
};
