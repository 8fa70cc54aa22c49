//! Environment configuration, loaded once at startup.
//!
//! A missing or malformed value is fatal — the external-service clients
//! cannot be built without it, so `run()` refuses to bind the server.
//! The values the two deployment variants disagree on (login mode, model,
//! temperature, max tokens) are tunables with the password variant's
//! values as defaults.

use std::net::SocketAddr;

/// Application-level constants
pub const APP_NAME: &str = "FPN Assistant";
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Default `tracing` filter when `RUST_LOG` is unset.
pub fn default_log_filter() -> String {
    "info,fpn_assistant=debug".to_string()
}

/// How the login view authenticates the learner.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoginMode {
    /// Email + password form with a "Create Account" action.
    Password,
    /// Email-only form that requests a one-time sign-in link.
    MagicLink,
}

impl LoginMode {
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "password" => Some(Self::Password),
            "magic-link" | "magic_link" | "magiclink" => Some(Self::MagicLink),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Password => "password",
            Self::MagicLink => "magic-link",
        }
    }
}

/// Errors raised while reading the environment at startup.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable {0}")]
    Missing(&'static str),
    #[error("Invalid value for {var}: {detail}")]
    Invalid { var: &'static str, detail: String },
}

/// Everything the application needs to talk to its two external
/// collaborators and to serve its own pages.
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Identity provider base URL (e.g. `https://xyz.supabase.co`).
    pub supabase_url: String,
    /// Identity provider public (anon) key.
    pub supabase_anon_key: String,
    /// Service-role key. Only required in magic-link mode, where the
    /// one-time-link request is issued with it so links can be sent to
    /// pre-provisioned users while public signups stay disabled.
    pub supabase_service_key: Option<String>,
    /// Completion provider API key.
    pub openai_api_key: String,
    /// Completion provider base URL. Overridable so tests can point at
    /// a local stub server.
    pub openai_base_url: String,
    /// Public base URL of this app, used to build the magic-link callback.
    pub app_base_url: String,
    pub login_mode: LoginMode,
    pub model: String,
    pub temperature: f32,
    pub max_tokens: u32,
    pub listen_addr: SocketAddr,
}

impl AppConfig {
    /// Load configuration from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Load configuration through an injected lookup function.
    ///
    /// Tests pass a closure over a map instead of mutating the process
    /// environment (env vars are global state across parallel tests).
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let required = |name: &'static str| -> Result<String, ConfigError> {
            lookup(name)
                .filter(|v| !v.trim().is_empty())
                .ok_or(ConfigError::Missing(name))
        };

        let login_mode = match lookup("FPN_LOGIN_MODE") {
            None => LoginMode::Password,
            Some(raw) => LoginMode::parse(&raw).ok_or_else(|| ConfigError::Invalid {
                var: "FPN_LOGIN_MODE",
                detail: format!("expected \"password\" or \"magic-link\", got {raw:?}"),
            })?,
        };

        let supabase_service_key = lookup("SUPABASE_SERVICE_KEY").filter(|v| !v.trim().is_empty());
        if login_mode == LoginMode::MagicLink && supabase_service_key.is_none() {
            return Err(ConfigError::Missing("SUPABASE_SERVICE_KEY"));
        }

        let temperature = match lookup("FPN_TEMPERATURE") {
            None => 0.2,
            Some(raw) => raw.trim().parse::<f32>().map_err(|e| ConfigError::Invalid {
                var: "FPN_TEMPERATURE",
                detail: e.to_string(),
            })?,
        };

        let max_tokens = match lookup("FPN_MAX_TOKENS") {
            None => 1500,
            Some(raw) => raw.trim().parse::<u32>().map_err(|e| ConfigError::Invalid {
                var: "FPN_MAX_TOKENS",
                detail: e.to_string(),
            })?,
        };

        let listen_addr = match lookup("FPN_LISTEN_ADDR") {
            None => "127.0.0.1:8787".parse().expect("default listen addr"),
            Some(raw) => raw.trim().parse::<SocketAddr>().map_err(|e| ConfigError::Invalid {
                var: "FPN_LISTEN_ADDR",
                detail: e.to_string(),
            })?,
        };

        Ok(Self {
            supabase_url: trim_base_url(required("SUPABASE_URL")?),
            supabase_anon_key: required("SUPABASE_ANON_KEY")?,
            supabase_service_key,
            openai_api_key: required("OPENAI_API_KEY")?,
            openai_base_url: lookup("OPENAI_BASE_URL")
                .filter(|v| !v.trim().is_empty())
                .map(trim_base_url)
                .unwrap_or_else(|| "https://api.openai.com".to_string()),
            app_base_url: trim_base_url(required("APP_BASE_URL")?),
            login_mode,
            model: lookup("FPN_MODEL")
                .filter(|v| !v.trim().is_empty())
                .unwrap_or_else(|| "gpt-4.1-mini".to_string()),
            temperature,
            max_tokens,
            listen_addr,
        })
    }

    /// The redirect URL handed to the identity provider for magic links.
    pub fn callback_url(&self) -> String {
        format!("{}/auth/callback", self.app_base_url)
    }
}

fn trim_base_url(url: String) -> String {
    url.trim().trim_end_matches('/').to_string()
}
