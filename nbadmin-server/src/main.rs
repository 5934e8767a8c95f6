//! nbadmin Server Binary
//!
//! Browser-facing console for one CRM tenant.
//!
//! ## Usage
//!
//! ```bash
//! # Credentials from the environment
//! NATION_SLUG=biitech OAUTH_ID=... OAUTH_SECRET=... \
//! REDIRECT_URI=https://console.example.com/oauth/callback \
//! SESSION_TOKEN=... SECRET_KEY=... nbadmin-server
//!
//! # Custom port and survey
//! nbadmin-server --port 3000 --survey-id 3 --question-id 7
//! ```

use std::net::IpAddr;
use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use nbadmin_core::{BearerTokenProvider, ConsoleConfig, PayloadDefaults, DEFAULT_TIMEOUT_MS};
use nbadmin_server::{AdminServer, AppState, ServerConfig};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser, Debug)]
#[command(name = "nbadmin-server", version, about = "Admin console for a NationBuilder nation")]
struct Cli {
    /// Tenant slug
    #[arg(long, env = "NATION_SLUG")]
    nation_slug: String,

    /// OAuth client id
    #[arg(long, env = "OAUTH_ID")]
    oauth_id: String,

    /// OAuth client secret
    #[arg(long, env = "OAUTH_SECRET", hide_env_values = true)]
    oauth_secret: String,

    /// OAuth redirect URI
    #[arg(long, env = "REDIRECT_URI")]
    redirect_uri: String,

    /// Long-lived access token
    #[arg(long, env = "SESSION_TOKEN", hide_env_values = true)]
    session_token: String,

    /// Cookie signing key, at least 64 bytes
    #[arg(long, env = "SECRET_KEY", hide_env_values = true)]
    secret_key: Option<String>,

    /// Override of https://{slug}.nationbuilder.com
    #[arg(long, env = "NB_BASE_URL")]
    base_url: Option<String>,

    /// Site for events and surveys (defaults to the tenant slug)
    #[arg(long, env = "NB_SITE_SLUG")]
    site_slug: Option<String>,

    /// Survey answered and listed
    #[arg(long, env = "NB_SURVEY_ID")]
    survey_id: Option<String>,

    /// Question answered
    #[arg(long, env = "NB_QUESTION_ID")]
    question_id: Option<String>,

    /// JSON file with payload defaults
    #[arg(long, env = "NB_DEFAULTS_FILE")]
    defaults_file: Option<PathBuf>,

    /// Per-call timeout in milliseconds
    #[arg(long, env = "NB_TIMEOUT_MS", default_value_t = DEFAULT_TIMEOUT_MS)]
    timeout_ms: u64,

    /// Bind address
    #[arg(long, env = "NBADMIN_HOST", default_value = "127.0.0.1")]
    host: IpAddr,

    /// Port to listen on
    #[arg(long, env = "NBADMIN_PORT", default_value_t = 8080)]
    port: u16,

    /// Mark the session cookie Secure (behind TLS)
    #[arg(long, env = "NBADMIN_SECURE_COOKIES")]
    secure_cookies: bool,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "nbadmin_server=info,nbadmin_core=info,tower_http=debug".into()
            }),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse();

    let defaults = match &cli.defaults_file {
        Some(path) => {
            tracing::info!("Loading payload defaults from {}", path.display());
            PayloadDefaults::from_file(path)?
        }
        None => PayloadDefaults::default(),
    };

    let mut builder = ConsoleConfig::builder()
        .slug(&cli.nation_slug)
        .oauth_client(&cli.oauth_id, &cli.oauth_secret, &cli.redirect_uri)
        .access_token(&cli.session_token)
        .defaults(defaults)
        .timeout_ms(cli.timeout_ms);
    if let Some(site) = &cli.site_slug {
        builder = builder.site_slug(site);
    }
    if let Some(base_url) = &cli.base_url {
        builder = builder.base_url(base_url);
    }
    if let Some(survey_id) = &cli.survey_id {
        builder = builder.survey_id(survey_id);
    }
    if let Some(question_id) = &cli.question_id {
        builder = builder.question_id(question_id);
    }
    let console = builder.build()?;

    let provider = Arc::new(BearerTokenProvider::new(
        &console.oauth.access_token,
        console.timeout,
    )?);

    let mut server_config = ServerConfig::builder()
        .host(cli.host)
        .port(cli.port)
        .secure_cookies(cli.secure_cookies);
    if let Some(key) = cli.secret_key {
        server_config = server_config.secret_key(key);
    }

    tracing::info!("Starting nbadmin Server v{}", env!("CARGO_PKG_VERSION"));

    let server = AdminServer::new(AppState::new(console, provider), server_config.build())?;
    server.run().await?;

    Ok(())
}
