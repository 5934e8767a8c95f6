//! Event routes

use std::sync::Arc;

use axum::{
    extract::State,
    response::{IntoResponse, Json, Response},
    Form,
};
use serde::Serialize;
use tower_sessions::Session;

use nbadmin_core::{Current, FormFields, Outcome, ResourceKind};

use super::{error_response, finish_mutation, submitted, CurrentView};
use crate::session::{CookieSession, Flash};
use crate::AppState;

const LISTING: &str = "/events";

/// Events page
#[derive(Debug, Serialize)]
pub struct EventsView {
    pub flash: Vec<Flash>,
    /// Event bound to `event_id`
    pub current: CurrentView,
}

/// Show the selected event
pub async fn show_events(State(state): State<Arc<AppState>>, session: Session) -> Response {
    let session = CookieSession::new(session);

    let mut flash = match session.take_flashes().await {
        Ok(flash) => flash,
        Err(e) => return error_response(&state, &e),
    };

    let current = match state.proxy().get_current(ResourceKind::Event, &session).await {
        Ok(current) => current,
        Err(e) => return error_response(&state, &e),
    };
    if let Current::Unknown { reason, .. } = &current {
        flash.push(Flash::error(reason.clone()));
    }

    Json(EventsView {
        flash,
        current: current.into(),
    })
    .into_response()
}

/// Create an event and select it
pub async fn create_event(
    State(state): State<Arc<AppState>>,
    session: Session,
    form: Option<Form<FormFields>>,
) -> Response {
    let session = CookieSession::new(session);
    let form = submitted(form);
    let result = state
        .proxy()
        .create(ResourceKind::Event, &form, &session)
        .await
        .map(|id| Outcome::Applied(format!("Created event {}", id)));
    finish_mutation(&state, &session, LISTING, result).await
}

/// Rename the selected event
pub async fn edit_event(
    State(state): State<Arc<AppState>>,
    session: Session,
    form: Option<Form<FormFields>>,
) -> Response {
    let session = CookieSession::new(session);
    let form = submitted(form);
    let result = state
        .proxy()
        .update_bound(ResourceKind::Event, &form, &session)
        .await
        .map(|outcome| outcome.map(|id| format!("Updated event {}", id)));
    finish_mutation(&state, &session, LISTING, result).await
}

/// Delete the selected event
pub async fn delete_event(State(state): State<Arc<AppState>>, session: Session) -> Response {
    let session = CookieSession::new(session);
    let result = state
        .proxy()
        .delete_bound(ResourceKind::Event, &session)
        .await
        .map(|outcome| outcome.map(|id| format!("Deleted event {}", id)));
    finish_mutation(&state, &session, LISTING, result).await
}
