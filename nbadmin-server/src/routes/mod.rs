//! HTTP route handlers

mod events;
mod people;
mod survey;

use std::sync::Arc;

use axum::{
    http::StatusCode,
    response::{IntoResponse, Json, Redirect, Response},
    routing::{get, post},
    Form, Router,
};
use serde::Serialize;
use serde_json::json;

use nbadmin_core::{
    ConsoleError, ConsoleResult, Current, FormFields, Outcome, RemoteId, RemoteRecord,
};

use crate::session::{CookieSession, Flash};
use crate::AppState;

pub use events::EventsView;
pub use people::PeopleView;
pub use survey::SurveyView;

/// Every route with its method, in display order
pub const ENDPOINTS: [(&str, &str); 13] = [
    ("GET", "/"),
    ("GET", "/health"),
    ("GET", "/people"),
    ("POST", "/create_user"),
    ("POST", "/edit_user"),
    ("POST", "/delete_user"),
    ("GET", "/events"),
    ("POST", "/create_event"),
    ("POST", "/edit_event"),
    ("POST", "/delete_event"),
    ("GET", "/survey"),
    ("POST", "/create_survey"),
    ("POST", "/answer_survey"),
];

/// Health check response
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
}

/// Health check endpoint
async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

#[derive(Debug, Serialize)]
struct RouteEntry {
    method: &'static str,
    path: &'static str,
}

/// Route index
async fn index() -> Json<serde_json::Value> {
    let routes: Vec<RouteEntry> = ENDPOINTS
        .iter()
        .map(|&(method, path)| RouteEntry { method, path })
        .collect();
    Json(json!({
        "name": "nbadmin",
        "version": env!("CARGO_PKG_VERSION"),
        "routes": routes,
    }))
}

/// Create the router with all routes
pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", get(index))
        .route("/health", get(health))
        .route("/people", get(people::list_people))
        .route("/create_user", post(people::create_user))
        .route("/edit_user", post(people::edit_user))
        .route("/delete_user", post(people::delete_user))
        .route("/events", get(events::show_events))
        .route("/create_event", post(events::create_event))
        .route("/edit_event", post(events::edit_event))
        .route("/delete_event", post(events::delete_event))
        .route("/survey", get(survey::show_survey))
        .route("/create_survey", post(survey::create_survey))
        .route("/answer_survey", post(survey::answer_survey))
        .with_state(state)
}

/// Bound record as shown by a listing view
#[derive(Debug, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum CurrentView {
    Unbound,
    Bound {
        id: Option<RemoteId>,
        name: Option<String>,
        record: RemoteRecord,
    },
    Unknown {
        id: RemoteId,
        reason: String,
    },
}

impl From<Current> for CurrentView {
    fn from(current: Current) -> Self {
        match current {
            Current::Unbound => CurrentView::Unbound,
            Current::Found(record) => CurrentView::Bound {
                id: record.id(),
                name: record.display_name(),
                record,
            },
            Current::Unknown { id, reason } => CurrentView::Unknown { id, reason },
        }
    }
}

/// Submitted fields; a body that is missing or not form-encoded counts as empty
pub(crate) fn submitted(form: Option<Form<FormFields>>) -> FormFields {
    form.map(|Form(fields)| fields).unwrap_or_default()
}

/// Flash the outcome of a mutation and send the browser back to its listing
///
/// Expired credentials end the cycle with the re-authentication prompt;
/// internal failures are answered directly.
pub(crate) async fn finish_mutation(
    state: &AppState,
    session: &CookieSession,
    target: &str,
    result: ConsoleResult<Outcome<String>>,
) -> Response {
    let flash = match result {
        Ok(Outcome::Applied(message)) => Flash::info(message),
        Ok(Outcome::Skipped(reason)) => {
            tracing::warn!(route = target, %reason, "Skipped mutation");
            Flash::warning(format!("Nothing changed: {}", reason))
        }
        Err(e) if e.is_reportable() => Flash::error(e.to_string()),
        Err(e) => return error_response(state, &e),
    };

    match session.flash(flash).await {
        Ok(()) => Redirect::to(target).into_response(),
        Err(e) => error_response(state, &e),
    }
}

/// Map an error that cannot be shown as a flash
pub(crate) fn error_response(state: &AppState, error: &ConsoleError) -> Response {
    if error.is_auth_expired() {
        tracing::warn!(error = %error, "Credentials rejected; re-authentication required");
        return match state.tenant.authorize_url(&state.oauth) {
            Ok(url) => {
                let mut body = error.to_json();
                body["reauthorize_url"] = json!(url);
                (StatusCode::UNAUTHORIZED, Json(body)).into_response()
            }
            Err(e) => error_response(state, &e),
        };
    }

    tracing::error!(code = error.error_code(), error = %error, "Request failed");
    let status =
        StatusCode::from_u16(error.http_status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    (status, Json(error.to_json())).into_response()
}
