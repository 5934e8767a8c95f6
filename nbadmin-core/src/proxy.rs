//! Resource Proxy
//!
//! Translates one high-level intent (list, show current, create, update,
//! delete) into exactly one Resource Service call plus the matching session
//! mutation. A proxy is built per incoming request around a shared
//! [`TokenProvider`] handle.
//!
//! ## Session rules
//!
//! | Operation | Session precondition | Session effect |
//! |---|---|---|
//! | `get_current` | none (unbound ⇒ no call) | none |
//! | `create` | none | binds the new id, replacing any previous one |
//! | `update` | bound to the target id | none |
//! | `delete` | bound to the target id | clears the key and its dependents on success only |
//!
//! Once the provider reports expired credentials, every later call on the same
//! proxy fails with [`ConsoleError::AuthExpired`] without reaching the network.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use futures_util::future::join_all;
use reqwest::Method;
use serde::Serialize;
use serde_json::{Map, Value};

use crate::config::{PayloadDefaults, Tenant};
use crate::descriptor::{ResourceDescriptor, ResourceKind};
use crate::error::{ConsoleError, ConsoleResult};
use crate::payload::FormFields;
use crate::session::{Binding, RemoteId, SessionKey, SessionStore};
use crate::transport::{TokenProvider, TransportError, UpstreamRequest, UpstreamResponse};

/// A record as received from the Resource Service
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(transparent)]
pub struct RemoteRecord(Map<String, Value>);

impl RemoteRecord {
    pub fn new(fields: Map<String, Value>) -> Self {
        Self(fields)
    }

    pub fn id(&self) -> Option<RemoteId> {
        self.0.get("id").and_then(RemoteId::from_json)
    }

    /// Non-empty string field
    pub fn text(&self, field: &str) -> Option<&str> {
        self.0
            .get(field)
            .and_then(Value::as_str)
            .filter(|s| !s.is_empty())
    }

    /// Id-valued field (e.g. `person_id`)
    pub fn reference(&self, field: &str) -> Option<RemoteId> {
        self.0.get(field).and_then(RemoteId::from_json)
    }

    /// `first_name last_name`, skipping missing parts
    pub fn display_name(&self) -> Option<String> {
        let parts: Vec<&str> = ["first_name", "last_name"]
            .iter()
            .filter_map(|f| self.text(f))
            .collect();
        if parts.is_empty() {
            self.text("name").map(str::to_string)
        } else {
            Some(parts.join(" "))
        }
    }

    pub fn fields(&self) -> &Map<String, Value> {
        &self.0
    }
}

/// What the session currently points at, for display
#[derive(Debug, Clone, PartialEq)]
pub enum Current {
    /// Nothing selected (or the selection no longer exists remotely)
    Unbound,
    /// Selected and fetched
    Found(RemoteRecord),
    /// Selected, but the Resource Service could not produce it
    Unknown { id: RemoteId, reason: String },
}

impl Current {
    pub fn record(&self) -> Option<&RemoteRecord> {
        match self {
            Current::Found(record) => Some(record),
            _ => None,
        }
    }
}

/// Why a mutation was not sent
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SkipReason {
    /// The key must be bound first
    NotBound(SessionKey),
    /// The key is bound to a different id than the one targeted
    BoundElsewhere { key: SessionKey, bound: RemoteId },
    /// The key must be unbound first
    AlreadyBound(SessionKey),
    /// The resource type cannot be modified through the console
    Unsupported(ResourceKind),
}

impl std::fmt::Display for SkipReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SkipReason::NotBound(key) => write!(f, "no {} is selected", key),
            SkipReason::BoundElsewhere { key, bound } => {
                write!(f, "session {} is bound to {}", key, bound)
            }
            SkipReason::AlreadyBound(key) => write!(f, "{} is already set", key),
            SkipReason::Unsupported(kind) => write!(f, "{} cannot be changed here", kind),
        }
    }
}

/// Result of a mutation that has a session precondition
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome<T> {
    Applied(T),
    Skipped(SkipReason),
}

impl<T> Outcome<T> {
    pub fn is_applied(&self) -> bool {
        matches!(self, Outcome::Applied(_))
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Outcome<U> {
        match self {
            Outcome::Applied(value) => Outcome::Applied(f(value)),
            Outcome::Skipped(reason) => Outcome::Skipped(reason),
        }
    }
}

/// E-mail lookup for one survey response
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum EmailLookup {
    /// Owner fetched; the person may have no e-mail on file
    Resolved { email: Option<String> },
    /// Owner fetch failed; the rest of the listing is unaffected
    Failed { reason: String },
}

/// One row of the survey listing
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SurveyEntry {
    pub response_id: Option<RemoteId>,
    pub person_id: Option<RemoteId>,
    pub email: EmailLookup,
    pub response: RemoteRecord,
}

/// Survey responses with their owners' e-mail addresses
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SurveyListing {
    pub entries: Vec<SurveyEntry>,
}

impl SurveyListing {
    pub fn resolved(&self) -> usize {
        self.entries
            .iter()
            .filter(|e| matches!(e.email, EmailLookup::Resolved { .. }))
            .count()
    }

    pub fn failed(&self) -> usize {
        self.entries.len() - self.resolved()
    }
}

/// Request-scoped proxy over the Resource Service
pub struct ResourceProxy {
    provider: Arc<dyn TokenProvider>,
    tenant: Arc<Tenant>,
    defaults: Arc<PayloadDefaults>,
    auth_expired: AtomicBool,
}

impl ResourceProxy {
    pub fn new(
        provider: Arc<dyn TokenProvider>,
        tenant: Arc<Tenant>,
        defaults: Arc<PayloadDefaults>,
    ) -> Self {
        Self {
            provider,
            tenant,
            defaults,
            auth_expired: AtomicBool::new(false),
        }
    }

    pub fn tenant(&self) -> &Tenant {
        &self.tenant
    }

    // ───────────────────────────────────────────────────────────────────────
    // Reads
    // ───────────────────────────────────────────────────────────────────────

    /// List every record the Resource Service returns for a type
    pub async fn list(&self, kind: ResourceKind) -> ConsoleResult<Vec<RemoteRecord>> {
        self.list_with(kind, Vec::new()).await
    }

    async fn list_with(
        &self,
        kind: ResourceKind,
        params: Vec<(String, String)>,
    ) -> ConsoleResult<Vec<RemoteRecord>> {
        let d = kind.descriptor();
        let operation = format!("list {}", d.type_name);
        let mut request = UpstreamRequest::new(Method::GET, self.tenant.url(d.list_path, None));
        request.params.extend(params);

        let response = self.send(&operation, request).await?;
        if !response.is_success() {
            return Err(rejected(&operation, &response));
        }

        let body: Value = serde_json::from_str(&response.body)
            .map_err(|e| ConsoleError::format(&operation, e.to_string()))?;
        let results = body
            .get("results")
            .and_then(Value::as_array)
            .ok_or_else(|| ConsoleError::format(&operation, "missing 'results' array"))?;

        results
            .iter()
            .map(|item| match item {
                Value::Object(fields) => Ok(RemoteRecord::new(fields.clone())),
                other => Err(ConsoleError::format(
                    &operation,
                    format!("result is not an object: {}", other),
                )),
            })
            .collect()
    }

    /// Fetch one record by id
    pub async fn fetch(&self, kind: ResourceKind, id: &RemoteId) -> ConsoleResult<Option<RemoteRecord>> {
        let d = kind.descriptor();
        let operation = format!("fetch {} {}", d.type_name, id);
        let request = UpstreamRequest::new(
            Method::GET,
            self.tenant.url(d.item_path, Some(id.as_str())),
        );

        let response = self.send(&operation, request).await?;
        if response.status == 404 {
            return Ok(None);
        }
        if !response.is_success() {
            return Err(rejected(&operation, &response));
        }
        unwrap_envelope(d, &operation, &response.body).map(Some)
    }

    /// Resolve the record the session points at
    ///
    /// No network call is made when the key is unbound. A remote 404 degrades
    /// to `Unbound`; a rejected, malformed or unreachable read degrades to
    /// `Unknown`. Expired credentials are still an error.
    pub async fn get_current(
        &self,
        kind: ResourceKind,
        session: &dyn SessionStore,
    ) -> ConsoleResult<Current> {
        let Some(key) = kind.descriptor().id_key else {
            return Ok(Current::Unbound);
        };
        let Binding::Bound(id) = session.get(key).await? else {
            return Ok(Current::Unbound);
        };

        match self.fetch(kind, &id).await {
            Ok(Some(record)) => Ok(Current::Found(record)),
            Ok(None) => {
                tracing::info!(kind = %kind, id = %id, "Bound resource no longer exists");
                Ok(Current::Unbound)
            }
            Err(e) if e.is_reportable() => {
                tracing::warn!(kind = %kind, id = %id, error = %e, "Bound resource could not be read");
                Ok(Current::Unknown {
                    id,
                    reason: e.to_string(),
                })
            }
            Err(e) => Err(e),
        }
    }

    // ───────────────────────────────────────────────────────────────────────
    // Mutations
    // ───────────────────────────────────────────────────────────────────────

    /// Create a record from form input and bind its id
    pub async fn create(
        &self,
        kind: ResourceKind,
        form: &FormFields,
        session: &dyn SessionStore,
    ) -> ConsoleResult<RemoteId> {
        let d = kind.descriptor();
        let record = (d.create_payload)(form, &self.defaults)?;
        let operation = format!("create {}", d.type_name);
        let request = UpstreamRequest::new(Method::POST, self.tenant.url(d.list_path, None))
            .json(envelope(d, record));

        let response = self.send(&operation, request).await?;
        if !response.is_success() {
            return Err(rejected(&operation, &response));
        }

        let created = unwrap_envelope(d, &operation, &response.body)?;
        let id = created
            .id()
            .ok_or_else(|| ConsoleError::format(&operation, "response has no id"))?;

        if let Some(key) = d.id_key {
            session.set(key, id.clone()).await?;
        }
        tracing::info!(kind = %kind, id = %id, "Created remote resource");
        Ok(id)
    }

    /// Update the record with `id`, provided the session is bound to it
    pub async fn update(
        &self,
        kind: ResourceKind,
        id: &RemoteId,
        form: &FormFields,
        session: &dyn SessionStore,
    ) -> ConsoleResult<Outcome<()>> {
        let d = kind.descriptor();
        let Some(build) = d.update_payload else {
            return Ok(Outcome::Skipped(SkipReason::Unsupported(kind)));
        };
        if let Some(skip) = self.require_bound_to(d, id, session).await? {
            return Ok(Outcome::Skipped(skip));
        }

        let record = build(form, &self.defaults)?;
        let operation = format!("update {} {}", d.type_name, id);
        let request = UpstreamRequest::new(
            Method::PUT,
            self.tenant.url(d.item_path, Some(id.as_str())),
        )
        .json(envelope(d, record));

        let response = self.send(&operation, request).await?;
        if !response.is_success() {
            return Err(rejected(&operation, &response));
        }
        tracing::info!(kind = %kind, id = %id, "Updated remote resource");
        Ok(Outcome::Applied(()))
    }

    /// Update whatever the session is bound to
    pub async fn update_bound(
        &self,
        kind: ResourceKind,
        form: &FormFields,
        session: &dyn SessionStore,
    ) -> ConsoleResult<Outcome<RemoteId>> {
        let id = match self.bound_id(kind, session).await? {
            Ok(id) => id,
            Err(skip) => return Ok(Outcome::Skipped(skip)),
        };
        Ok(self.update(kind, &id, form, session).await?.map(|()| id))
    }

    /// Delete the record with `id`; the session key is cleared only on success
    pub async fn delete(
        &self,
        kind: ResourceKind,
        id: &RemoteId,
        session: &dyn SessionStore,
    ) -> ConsoleResult<Outcome<()>> {
        let d = kind.descriptor();
        if let Some(skip) = self.require_bound_to(d, id, session).await? {
            return Ok(Outcome::Skipped(skip));
        }

        let operation = format!("delete {} {}", d.type_name, id);
        let request = UpstreamRequest::new(
            Method::DELETE,
            self.tenant.url(d.item_path, Some(id.as_str())),
        );

        let response = self.send(&operation, request).await?;
        if !response.is_success() {
            return Err(rejected(&operation, &response));
        }

        if let Some(key) = d.id_key {
            session.clear(key).await?;
        }
        for key in d.dependent_keys {
            session.clear(*key).await?;
        }
        tracing::info!(kind = %kind, id = %id, "Deleted remote resource");
        Ok(Outcome::Applied(()))
    }

    /// Delete whatever the session is bound to
    pub async fn delete_bound(
        &self,
        kind: ResourceKind,
        session: &dyn SessionStore,
    ) -> ConsoleResult<Outcome<RemoteId>> {
        let id = match self.bound_id(kind, session).await? {
            Ok(id) => id,
            Err(skip) => return Ok(Outcome::Skipped(skip)),
        };
        Ok(self.delete(kind, &id, session).await?.map(|()| id))
    }

    /// Record the selected person's answer to the configured survey question
    ///
    /// Requires `user_id` bound and `question_answer` unbound.
    pub async fn answer_survey(
        &self,
        form: &FormFields,
        session: &dyn SessionStore,
    ) -> ConsoleResult<Outcome<RemoteId>> {
        let Binding::Bound(person_id) = session.get(SessionKey::UserId).await? else {
            return Ok(Outcome::Skipped(SkipReason::NotBound(SessionKey::UserId)));
        };
        if session.get(SessionKey::QuestionAnswer).await?.is_bound() {
            return Ok(Outcome::Skipped(SkipReason::AlreadyBound(
                SessionKey::QuestionAnswer,
            )));
        }

        let form = form.clone().with("person_id", person_id.as_str());
        let id = self
            .create(ResourceKind::SurveyResponse, &form, session)
            .await?;
        Ok(Outcome::Applied(id))
    }

    // ───────────────────────────────────────────────────────────────────────
    // Composite reads
    // ───────────────────────────────────────────────────────────────────────

    /// List survey responses and resolve each owner's e-mail
    ///
    /// Owner fetches run concurrently; entries keep the listing order. A failed
    /// owner fetch is recorded on its entry. Expired credentials abort the
    /// whole listing.
    pub async fn survey_listing(&self) -> ConsoleResult<SurveyListing> {
        let mut params = Vec::new();
        if let Some(survey_id) = &self.defaults.survey.survey_id {
            params.push(("survey_id".to_string(), survey_id.clone()));
        }
        let responses = self.list_with(ResourceKind::SurveyResponse, params).await?;

        let lookups = join_all(responses.iter().map(|response| self.owner_email(response))).await;

        let mut entries = Vec::with_capacity(responses.len());
        for (response, lookup) in responses.into_iter().zip(lookups) {
            let email = match lookup {
                Ok(email) => EmailLookup::Resolved { email },
                Err(e) if e.is_auth_expired() => return Err(e),
                Err(e) => {
                    tracing::warn!(
                        response_id = ?response.id(),
                        error = %e,
                        "Could not resolve survey respondent"
                    );
                    EmailLookup::Failed {
                        reason: e.to_string(),
                    }
                }
            };
            entries.push(SurveyEntry {
                response_id: response.id(),
                person_id: response.reference("person_id"),
                email,
                response,
            });
        }

        Ok(SurveyListing { entries })
    }

    async fn owner_email(&self, response: &RemoteRecord) -> ConsoleResult<Option<String>> {
        let person_id = response
            .reference("person_id")
            .ok_or_else(|| ConsoleError::format("list survey response", "missing person_id"))?;
        let person = self
            .fetch(ResourceKind::Person, &person_id)
            .await?
            .ok_or_else(|| ConsoleError::UpstreamRejected {
                operation: format!("fetch person {}", person_id),
                status: 404,
                detail: "person not found".to_string(),
            })?;
        Ok(person.text("email").map(str::to_string))
    }

    // ───────────────────────────────────────────────────────────────────────
    // Plumbing
    // ───────────────────────────────────────────────────────────────────────

    async fn bound_id(
        &self,
        kind: ResourceKind,
        session: &dyn SessionStore,
    ) -> ConsoleResult<Result<RemoteId, SkipReason>> {
        let Some(key) = kind.descriptor().id_key else {
            return Ok(Err(SkipReason::Unsupported(kind)));
        };
        Ok(match session.get(key).await? {
            Binding::Bound(id) => Ok(id),
            Binding::Unbound => Err(SkipReason::NotBound(key)),
        })
    }

    async fn require_bound_to(
        &self,
        d: &ResourceDescriptor,
        id: &RemoteId,
        session: &dyn SessionStore,
    ) -> ConsoleResult<Option<SkipReason>> {
        let Some(key) = d.id_key else {
            return Ok(Some(SkipReason::Unsupported(d.kind)));
        };
        Ok(match session.get(key).await? {
            Binding::Bound(bound) if &bound == id => None,
            Binding::Bound(bound) => Some(SkipReason::BoundElsewhere { key, bound }),
            Binding::Unbound => Some(SkipReason::NotBound(key)),
        })
    }

    async fn send(
        &self,
        operation: &str,
        request: UpstreamRequest,
    ) -> ConsoleResult<UpstreamResponse> {
        if self.auth_expired.load(Ordering::Acquire) {
            return Err(ConsoleError::AuthExpired {
                reason: format!("skipped {} after earlier rejection", operation),
            });
        }

        let request = request.param("format", "json");
        tracing::debug!(
            provider = self.provider.name(),
            method = %request.method,
            url = %request.url,
            "Calling CRM"
        );

        match self.provider.authenticated_request(request).await {
            Ok(response) if response.status == 401 => {
                self.auth_expired.store(true, Ordering::Release);
                Err(ConsoleError::AuthExpired {
                    reason: format!("{} answered HTTP 401", operation),
                })
            }
            Ok(response) => Ok(response),
            Err(TransportError::AuthRejected(reason)) => {
                self.auth_expired.store(true, Ordering::Release);
                Err(ConsoleError::AuthExpired { reason })
            }
            Err(e) => {
                tracing::warn!(operation, error = %e, "CRM unavailable");
                Err(ConsoleError::UpstreamUnavailable {
                    reason: format!("{}: {}", operation, e),
                })
            }
        }
    }
}

fn envelope(d: &ResourceDescriptor, record: Value) -> Value {
    let mut body = Map::new();
    body.insert(d.envelope.to_string(), record);
    Value::Object(body)
}

fn unwrap_envelope(
    d: &ResourceDescriptor,
    operation: &str,
    body: &str,
) -> ConsoleResult<RemoteRecord> {
    let mut value: Value =
        serde_json::from_str(body).map_err(|e| ConsoleError::format(operation, e.to_string()))?;
    match value.get_mut(d.envelope).map(Value::take) {
        Some(Value::Object(fields)) => Ok(RemoteRecord::new(fields)),
        _ => Err(ConsoleError::format(
            operation,
            format!("missing '{}' object", d.envelope),
        )),
    }
}

fn rejected(operation: &str, response: &UpstreamResponse) -> ConsoleError {
    let detail: String = response.body.chars().take(200).collect();
    tracing::warn!(operation, status = response.status, "CRM rejected call");
    ConsoleError::UpstreamRejected {
        operation: operation.to_string(),
        status: response.status,
        detail,
    }
}
