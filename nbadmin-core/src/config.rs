//! Configuration for the console core

use std::path::Path;
use std::time::Duration;

use reqwest::Url;
use serde::{Deserialize, Serialize};

use crate::error::{ConsoleError, ConsoleResult};

/// Default per-call timeout
pub const DEFAULT_TIMEOUT_MS: u64 = 30_000;

/// Addressing for one customer instance of the Resource Service
#[derive(Debug, Clone)]
pub struct Tenant {
    /// Tenant slug (`{slug}.nationbuilder.com`)
    pub slug: String,
    /// Site slug used by site-scoped pages (events, surveys)
    pub site_slug: String,
    /// Base URL every path is appended to, without trailing slash
    pub base_url: String,
}

impl Tenant {
    /// Tenant addressed at `https://{slug}.nationbuilder.com`
    pub fn new(slug: &str) -> Self {
        Self {
            slug: slug.to_string(),
            site_slug: slug.to_string(),
            base_url: format!("https://{}.nationbuilder.com", slug),
        }
    }

    pub fn with_site(mut self, site_slug: &str) -> Self {
        self.site_slug = site_slug.to_string();
        self
    }

    pub fn with_base_url(mut self, base_url: &str) -> Self {
        self.base_url = base_url.trim_end_matches('/').to_string();
        self
    }

    /// Expand a path template (`{site}`, `{id}`) into a full URL
    pub fn url(&self, template: &str, id: Option<&str>) -> String {
        let mut path = template.replace("{site}", &self.site_slug);
        if let Some(id) = id {
            path = path.replace("{id}", id);
        }
        format!("{}{}", self.base_url, path)
    }

    /// OAuth2 authorization URL an operator follows to re-authenticate
    pub fn authorize_url(&self, oauth: &OAuthSettings) -> ConsoleResult<String> {
        let url = Url::parse_with_params(
            &format!("{}/oauth/authorize", self.base_url),
            &[
                ("response_type", "code"),
                ("client_id", oauth.client_id.as_str()),
                ("redirect_uri", oauth.redirect_uri.as_str()),
            ],
        )
        .map_err(|e| ConsoleError::Config {
            reason: format!("invalid authorize URL: {}", e),
        })?;
        Ok(url.to_string())
    }
}

/// OAuth client registration for the tenant
#[derive(Debug, Clone)]
pub struct OAuthSettings {
    pub client_id: String,
    pub client_secret: String,
    pub redirect_uri: String,
    /// Long-lived access token previously obtained for this client
    pub access_token: String,
}

/// Fixed values merged into create payloads
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PayloadDefaults {
    #[serde(default)]
    pub person: PersonDefaults,

    #[serde(default)]
    pub event: EventDefaults,

    #[serde(default)]
    pub survey: SurveyDefaults,
}

impl Default for PayloadDefaults {
    fn default() -> Self {
        Self {
            person: PersonDefaults::default(),
            event: EventDefaults::default(),
            survey: SurveyDefaults::default(),
        }
    }
}

impl PayloadDefaults {
    /// Load defaults from a JSON file; absent sections keep built-in values
    pub fn from_file(path: &Path) -> ConsoleResult<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| ConsoleError::Config {
            reason: format!("cannot read {}: {}", path.display(), e),
        })?;
        let defaults = serde_json::from_str(&content).map_err(|e| ConsoleError::Config {
            reason: format!("cannot parse {}: {}", path.display(), e),
        })?;
        Ok(defaults)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PersonDefaults {
    #[serde(default = "default_sex")]
    pub sex: String,
    #[serde(default)]
    pub signup_type: u32,
    #[serde(default = "default_employer")]
    pub employer: String,
    #[serde(default = "default_party")]
    pub party: String,
    #[serde(default = "default_state")]
    pub state: String,
    #[serde(default = "default_country_code")]
    pub country_code: String,
}

fn default_sex() -> String { "M".to_string() }
fn default_employer() -> String { "BIITECH".to_string() }
fn default_party() -> String { "P".to_string() }
fn default_state() -> String { "BC".to_string() }
fn default_country_code() -> String { "CA".to_string() }

impl Default for PersonDefaults {
    fn default() -> Self {
        Self {
            sex: default_sex(),
            signup_type: 0,
            employer: default_employer(),
            party: default_party(),
            state: default_state(),
            country_code: default_country_code(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventDefaults {
    #[serde(default = "default_event_status")]
    pub status: String,
    #[serde(default = "default_intro")]
    pub intro: String,
    #[serde(default = "default_time_zone")]
    pub time_zone: String,
    #[serde(default)]
    pub contact: EventContact,
    #[serde(default = "default_capacity")]
    pub capacity: u32,
    #[serde(default = "default_true")]
    pub show_guests: bool,
    #[serde(default)]
    pub venue: EventVenue,
}

fn default_event_status() -> String { "unlisted".to_string() }
fn default_intro() -> String { "Take the 24hr nofoodchallenge!!!".to_string() }
fn default_time_zone() -> String { "Pacific Time (US & Canada)".to_string() }
fn default_capacity() -> u32 { 80 }
fn default_true() -> bool { true }

impl Default for EventDefaults {
    fn default() -> Self {
        Self {
            status: default_event_status(),
            intro: default_intro(),
            time_zone: default_time_zone(),
            contact: EventContact::default(),
            capacity: default_capacity(),
            show_guests: true,
            venue: EventVenue::default(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EventContact {
    pub name: String,
    pub phone: String,
    pub email: String,
    pub show_phone: bool,
    pub show_email: bool,
}

impl Default for EventContact {
    fn default() -> Self {
        Self {
            name: "Byron Anderson".to_string(),
            phone: "1234567890".to_string(),
            email: "contact@venue.com".to_string(),
            show_phone: true,
            show_email: true,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EventVenue {
    pub name: String,
    pub address1: String,
    pub city: String,
    pub state: String,
}

impl Default for EventVenue {
    fn default() -> Self {
        Self {
            name: "Ralphs Parking Lot".to_string(),
            address1: "123 Foo St".to_string(),
            city: "Pasadena".to_string(),
            state: "CA".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SurveyDefaults {
    #[serde(default = "default_survey_name")]
    pub name: String,
    #[serde(default = "default_question_prompt")]
    pub question_prompt: String,
    /// Survey answered by `/answer_survey` and listed by `/survey`
    #[serde(default)]
    pub survey_id: Option<String>,
    /// Question answered by `/answer_survey`
    #[serde(default)]
    pub question_id: Option<String>,
}

fn default_survey_name() -> String { "Supporter Survey".to_string() }
fn default_question_prompt() -> String { "What matters most to you?".to_string() }

impl Default for SurveyDefaults {
    fn default() -> Self {
        Self {
            name: default_survey_name(),
            question_prompt: default_question_prompt(),
            survey_id: None,
            question_id: None,
        }
    }
}

/// Complete core configuration
#[derive(Debug, Clone)]
pub struct ConsoleConfig {
    pub tenant: Tenant,
    pub oauth: OAuthSettings,
    pub defaults: PayloadDefaults,
    /// Per-call timeout enforced by the HTTP client
    pub timeout: Duration,
}

impl ConsoleConfig {
    /// Create a new configuration builder
    pub fn builder() -> ConsoleConfigBuilder {
        ConsoleConfigBuilder::default()
    }
}

/// Builder for ConsoleConfig
#[derive(Debug, Default)]
pub struct ConsoleConfigBuilder {
    slug: Option<String>,
    site_slug: Option<String>,
    base_url: Option<String>,
    client_id: Option<String>,
    client_secret: Option<String>,
    redirect_uri: Option<String>,
    access_token: Option<String>,
    defaults: Option<PayloadDefaults>,
    survey_id: Option<String>,
    question_id: Option<String>,
    timeout_ms: Option<u64>,
}

impl ConsoleConfigBuilder {
    /// Set the tenant slug
    pub fn slug(mut self, slug: impl Into<String>) -> Self {
        self.slug = Some(slug.into());
        self
    }

    /// Set the site slug (defaults to the tenant slug)
    pub fn site_slug(mut self, site_slug: impl Into<String>) -> Self {
        self.site_slug = Some(site_slug.into());
        self
    }

    /// Override the base URL derived from the slug
    pub fn base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = Some(base_url.into());
        self
    }

    /// Set the OAuth client registration
    pub fn oauth_client(
        mut self,
        client_id: impl Into<String>,
        client_secret: impl Into<String>,
        redirect_uri: impl Into<String>,
    ) -> Self {
        self.client_id = Some(client_id.into());
        self.client_secret = Some(client_secret.into());
        self.redirect_uri = Some(redirect_uri.into());
        self
    }

    /// Set the long-lived access token
    pub fn access_token(mut self, token: impl Into<String>) -> Self {
        self.access_token = Some(token.into());
        self
    }

    /// Replace the payload defaults
    pub fn defaults(mut self, defaults: PayloadDefaults) -> Self {
        self.defaults = Some(defaults);
        self
    }

    /// Survey answered and listed by the survey routes
    pub fn survey_id(mut self, survey_id: impl Into<String>) -> Self {
        self.survey_id = Some(survey_id.into());
        self
    }

    /// Question answered by the survey routes
    pub fn question_id(mut self, question_id: impl Into<String>) -> Self {
        self.question_id = Some(question_id.into());
        self
    }

    /// Set the per-call timeout
    pub fn timeout_ms(mut self, timeout_ms: u64) -> Self {
        self.timeout_ms = Some(timeout_ms);
        self
    }

    /// Build the configuration
    pub fn build(self) -> ConsoleResult<ConsoleConfig> {
        let slug = required(self.slug, "tenant slug")?;
        let mut tenant = Tenant::new(&slug);
        if let Some(site) = self.site_slug.filter(|s| !s.is_empty()) {
            tenant = tenant.with_site(&site);
        }
        if let Some(base_url) = self.base_url.filter(|s| !s.is_empty()) {
            tenant = tenant.with_base_url(&base_url);
        }

        let oauth = OAuthSettings {
            client_id: required(self.client_id, "OAuth client id")?,
            client_secret: required(self.client_secret, "OAuth client secret")?,
            redirect_uri: required(self.redirect_uri, "OAuth redirect URI")?,
            access_token: required(self.access_token, "session token")?,
        };

        let mut defaults = self.defaults.unwrap_or_default();
        if self.survey_id.is_some() {
            defaults.survey.survey_id = self.survey_id;
        }
        if self.question_id.is_some() {
            defaults.survey.question_id = self.question_id;
        }

        Ok(ConsoleConfig {
            tenant,
            oauth,
            defaults,
            timeout: Duration::from_millis(self.timeout_ms.unwrap_or(DEFAULT_TIMEOUT_MS)),
        })
    }
}

fn required(value: Option<String>, what: &str) -> ConsoleResult<String> {
    value
        .filter(|v| !v.trim().is_empty())
        .ok_or_else(|| ConsoleError::Config {
            reason: format!("{} is not set", what),
        })
}
