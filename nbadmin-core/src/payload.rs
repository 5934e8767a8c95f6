//! Form input and payload builders
//!
//! Builders are pure: they read [`FormFields`] and [`PayloadDefaults`] and
//! return the JSON record the Resource Service expects, without the envelope
//! key (the proxy wraps it). A missing or malformed required field is reported
//! before any network call.

use std::collections::HashMap;
use std::sync::OnceLock;

use chrono::{DateTime, FixedOffset, NaiveDateTime, Utc};
use regex::Regex;
use serde::Deserialize;
use serde_json::{json, Value};

use crate::config::PayloadDefaults;
use crate::error::{ConsoleError, ConsoleResult};

/// Signature shared by every payload builder
pub type PayloadBuilder = fn(&FormFields, &PayloadDefaults) -> ConsoleResult<Value>;

/// Submitted form fields, as received from the browser
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(transparent)]
pub struct FormFields(HashMap<String, String>);

impl FormFields {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, name: &str, value: impl Into<String>) -> Self {
        self.insert(name, value);
        self
    }

    pub fn insert(&mut self, name: &str, value: impl Into<String>) {
        self.0.insert(name.to_string(), value.into());
    }

    /// Trimmed value, `None` when absent or blank
    pub fn optional(&self, name: &str) -> Option<&str> {
        self.0
            .get(name)
            .map(|v| v.trim())
            .filter(|v| !v.is_empty())
    }

    /// Trimmed value of a field that must be present
    pub fn required(&self, name: &str) -> ConsoleResult<&str> {
        self.optional(name).ok_or_else(|| ConsoleError::missing(name))
    }
}

impl From<HashMap<String, String>> for FormFields {
    fn from(fields: HashMap<String, String>) -> Self {
        Self(fields)
    }
}

fn email_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").expect("static e-mail pattern is valid")
    })
}

fn slug_separator() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"[^a-z0-9]+").expect("static slug pattern is valid"))
}

// ───────────────────────────────────────────────────────────────────────────
// People
// ───────────────────────────────────────────────────────────────────────────

pub fn person_create(form: &FormFields, defaults: &PayloadDefaults) -> ConsoleResult<Value> {
    let first_name = form.required("first_name")?;
    let last_name = form.required("last_name")?;
    let email = form.required("email")?;
    if !email_pattern().is_match(email) {
        return Err(ConsoleError::invalid("email", "not an e-mail address"));
    }

    let d = &defaults.person;
    Ok(json!({
        "first_name": first_name,
        "last_name": last_name,
        "email": email,
        "sex": d.sex,
        "signup_type": d.signup_type,
        "employer": d.employer,
        "party": d.party,
        "registered_address": {
            "state": d.state,
            "country_code": d.country_code,
        },
    }))
}

pub fn person_update(form: &FormFields, _defaults: &PayloadDefaults) -> ConsoleResult<Value> {
    Ok(json!({
        "first_name": form.required("first_name")?,
        "last_name": form.required("last_name")?,
    }))
}

// ───────────────────────────────────────────────────────────────────────────
// Events
// ───────────────────────────────────────────────────────────────────────────

/// Parse an RFC 3339 timestamp or an HTML `datetime-local` value (taken as UTC)
pub fn parse_timestamp(field: &str, value: &str) -> ConsoleResult<DateTime<FixedOffset>> {
    if let Ok(ts) = DateTime::parse_from_rfc3339(value) {
        return Ok(ts);
    }
    for format in ["%Y-%m-%dT%H:%M:%S", "%Y-%m-%dT%H:%M"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(value, format) {
            return Ok(naive.and_utc().fixed_offset());
        }
    }
    Err(ConsoleError::invalid(
        field,
        format!("'{}' is not a date and time", value),
    ))
}

pub fn event_create(form: &FormFields, defaults: &PayloadDefaults) -> ConsoleResult<Value> {
    let name = form.required("event_name")?;
    let start = parse_timestamp("event_start", form.required("event_start")?)?;
    let end = parse_timestamp("event_end", form.required("event_end")?)?;
    if end < start {
        return Err(ConsoleError::invalid("event_end", "ends before it starts"));
    }

    let d = &defaults.event;
    Ok(json!({
        "status": d.status,
        "name": name,
        "intro": form.optional("event_intro").unwrap_or(&d.intro),
        "time_zone": d.time_zone,
        "start_time": start.to_rfc3339(),
        "end_time": end.to_rfc3339(),
        "contact": {
            "name": d.contact.name,
            "contact_phone": d.contact.phone,
            "show_phone": d.contact.show_phone,
            "contact_email": d.contact.email,
            "email": d.contact.email,
            "show_email": d.contact.show_email,
        },
        "rsvp_form": {
            "phone": "optional",
            "address": "required",
            "allow_guests": true,
            "accept_rsvps": true,
            "gather_volunteers": true,
        },
        "show_guests": d.show_guests,
        "capacity": d.capacity,
        "venue": {
            "name": d.venue.name,
            "address": {
                "address1": d.venue.address1,
                "city": d.venue.city,
                "state": d.venue.state,
            },
        },
    }))
}

pub fn event_update(form: &FormFields, _defaults: &PayloadDefaults) -> ConsoleResult<Value> {
    Ok(json!({ "name": form.required("event_name")? }))
}

// ───────────────────────────────────────────────────────────────────────────
// Surveys
// ───────────────────────────────────────────────────────────────────────────

/// Lowercase, underscore-separated slug with a short unique suffix
pub fn survey_slug(name: &str) -> String {
    let base = slug_separator()
        .replace_all(&name.to_lowercase(), "_")
        .trim_matches('_')
        .to_string();
    let suffix = uuid::Uuid::new_v4().simple().to_string();
    if base.is_empty() {
        format!("survey_{}", &suffix[..8])
    } else {
        format!("{}_{}", base, &suffix[..8])
    }
}

pub fn survey_create(form: &FormFields, defaults: &PayloadDefaults) -> ConsoleResult<Value> {
    let d = &defaults.survey;
    let name = form.optional("survey_name").unwrap_or(&d.name);
    let prompt = form.optional("question_prompt").unwrap_or(&d.question_prompt);

    Ok(json!({
        "slug": survey_slug(name),
        "name": name,
        "status": "published",
        "questions": [{
            "prompt": prompt,
            "slug": "answer",
            "type": "text",
            "status": "published",
        }],
    }))
}

pub fn survey_response_create(
    form: &FormFields,
    defaults: &PayloadDefaults,
) -> ConsoleResult<Value> {
    let answer = form.required("question_answer")?;
    let person_id = form.required("person_id")?;
    let survey_id = form
        .optional("survey_id")
        .or(defaults.survey.survey_id.as_deref())
        .ok_or_else(|| ConsoleError::missing("survey_id"))?;
    let question_id = form
        .optional("question_id")
        .or(defaults.survey.question_id.as_deref())
        .ok_or_else(|| ConsoleError::missing("question_id"))?;

    Ok(json!({
        "survey_id": numeric_or_string(survey_id),
        "person_id": numeric_or_string(person_id),
        "is_private": true,
        "created_at": Utc::now().to_rfc3339(),
        "question_responses": [{
            "question_id": numeric_or_string(question_id),
            "response": answer,
        }],
    }))
}

/// Remote ids travel as numbers when they look like numbers
fn numeric_or_string(id: &str) -> Value {
    id.parse::<u64>().map(Value::from).unwrap_or_else(|_| Value::from(id))
}
