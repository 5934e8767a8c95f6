//! Survey routes

use std::sync::Arc;

use axum::{
    extract::State,
    response::{IntoResponse, Json, Response},
    Form,
};
use serde::Serialize;
use tower_sessions::Session;

use nbadmin_core::{
    FormFields, Outcome, RemoteId, ResourceKind, SessionKey, SessionStore, SurveyListing,
};

use super::{error_response, finish_mutation, submitted};
use crate::session::{CookieSession, Flash};
use crate::AppState;

const LISTING: &str = "/survey";

/// Survey page
#[derive(Debug, Serialize)]
pub struct SurveyView {
    pub flash: Vec<Flash>,
    /// Survey whose responses are listed, if one is configured
    pub survey_id: Option<String>,
    /// Response recorded in this session
    pub answered: Option<RemoteId>,
    /// `None` when the listing could not be fetched
    pub responses: Option<SurveyListing>,
}

/// List survey responses with their owners' e-mail addresses
pub async fn show_survey(State(state): State<Arc<AppState>>, session: Session) -> Response {
    let session = CookieSession::new(session);

    let mut flash = match session.take_flashes().await {
        Ok(flash) => flash,
        Err(e) => return error_response(&state, &e),
    };
    let answered = match session.get(SessionKey::QuestionAnswer).await {
        Ok(binding) => binding.id().cloned(),
        Err(e) => return error_response(&state, &e),
    };

    let responses = match state.proxy().survey_listing().await {
        Ok(listing) => {
            if listing.failed() > 0 {
                tracing::warn!(
                    resolved = listing.resolved(),
                    failed = listing.failed(),
                    "Survey listing is incomplete"
                );
            }
            Some(listing)
        }
        Err(e) if e.is_reportable() => {
            flash.push(Flash::error(e.to_string()));
            None
        }
        Err(e) => return error_response(&state, &e),
    };

    Json(SurveyView {
        flash,
        survey_id: state.defaults.survey.survey_id.clone(),
        answered,
        responses,
    })
    .into_response()
}

/// Create a survey with a single free-text question
pub async fn create_survey(
    State(state): State<Arc<AppState>>,
    session: Session,
    form: Option<Form<FormFields>>,
) -> Response {
    let session = CookieSession::new(session);
    let form = submitted(form);
    let result = state
        .proxy()
        .create(ResourceKind::Survey, &form, &session)
        .await
        .map(|id| Outcome::Applied(format!("Created survey {}", id)));
    finish_mutation(&state, &session, LISTING, result).await
}

/// Record the selected person's answer
pub async fn answer_survey(
    State(state): State<Arc<AppState>>,
    session: Session,
    form: Option<Form<FormFields>>,
) -> Response {
    let session = CookieSession::new(session);
    let form = submitted(form);
    let result = state
        .proxy()
        .answer_survey(&form, &session)
        .await
        .map(|outcome| outcome.map(|id| format!("Recorded survey response {}", id)));
    finish_mutation(&state, &session, LISTING, result).await
}
