//! People routes

use std::sync::Arc;

use axum::{
    extract::State,
    response::{IntoResponse, Json, Response},
    Form,
};
use serde::Serialize;
use tower_sessions::Session;

use nbadmin_core::{Current, FormFields, Outcome, RemoteId, ResourceKind};

use super::{error_response, finish_mutation, submitted, CurrentView};
use crate::session::{CookieSession, Flash};
use crate::AppState;

const LISTING: &str = "/people";

/// One row of the people listing
#[derive(Debug, Serialize)]
pub struct PersonSummary {
    pub id: Option<RemoteId>,
    pub name: Option<String>,
    pub email: Option<String>,
}

/// People page
#[derive(Debug, Serialize)]
pub struct PeopleView {
    pub flash: Vec<Flash>,
    /// Person bound to `user_id`
    pub current: CurrentView,
    /// `None` when the listing could not be fetched
    pub people: Option<Vec<PersonSummary>>,
}

/// List people and resolve the selected one
pub async fn list_people(State(state): State<Arc<AppState>>, session: Session) -> Response {
    let session = CookieSession::new(session);
    let proxy = state.proxy();

    let mut flash = match session.take_flashes().await {
        Ok(flash) => flash,
        Err(e) => return error_response(&state, &e),
    };

    let current = match proxy.get_current(ResourceKind::Person, &session).await {
        Ok(current) => current,
        Err(e) => return error_response(&state, &e),
    };
    if let Current::Unknown { reason, .. } = &current {
        flash.push(Flash::error(reason.clone()));
    }

    let people = match proxy.list(ResourceKind::Person).await {
        Ok(records) => Some(
            records
                .iter()
                .map(|r| PersonSummary {
                    id: r.id(),
                    name: r.display_name(),
                    email: r.text("email").map(str::to_string),
                })
                .collect(),
        ),
        Err(e) if e.is_reportable() => {
            flash.push(Flash::error(e.to_string()));
            None
        }
        Err(e) => return error_response(&state, &e),
    };

    Json(PeopleView {
        flash,
        current: current.into(),
        people,
    })
    .into_response()
}

/// Create a person and select it
pub async fn create_user(
    State(state): State<Arc<AppState>>,
    session: Session,
    form: Option<Form<FormFields>>,
) -> Response {
    let session = CookieSession::new(session);
    let form = submitted(form);
    let result = state
        .proxy()
        .create(ResourceKind::Person, &form, &session)
        .await
        .map(|id| Outcome::Applied(format!("Created person {}", id)));
    finish_mutation(&state, &session, LISTING, result).await
}

/// Rename the selected person
pub async fn edit_user(
    State(state): State<Arc<AppState>>,
    session: Session,
    form: Option<Form<FormFields>>,
) -> Response {
    let session = CookieSession::new(session);
    let form = submitted(form);
    let result = state
        .proxy()
        .update_bound(ResourceKind::Person, &form, &session)
        .await
        .map(|outcome| outcome.map(|id| format!("Updated person {}", id)));
    finish_mutation(&state, &session, LISTING, result).await
}

/// Delete the selected person
pub async fn delete_user(State(state): State<Arc<AppState>>, session: Session) -> Response {
    let session = CookieSession::new(session);
    let result = state
        .proxy()
        .delete_bound(ResourceKind::Person, &session)
        .await
        .map(|outcome| outcome.map(|id| format!("Deleted person {}", id)));
    finish_mutation(&state, &session, LISTING, result).await
}
