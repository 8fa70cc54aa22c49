//! Shared context and cookie plumbing for the HTTP layer.

use std::sync::Arc;

use crate::completion::CompletionClient;
use crate::config::AppConfig;
use crate::identity::IdentityClient;
use crate::session::SessionRegistry;

/// Name of the browser session cookie.
pub const SESSION_COOKIE: &str = "fpn_session";

/// Shared context for all routes and middleware: configuration, the two
/// external-collaborator clients, and the in-memory session registry.
#[derive(Clone)]
pub struct AppContext {
    pub config: Arc<AppConfig>,
    pub identity: Arc<IdentityClient>,
    pub completion: Arc<CompletionClient>,
    pub sessions: Arc<SessionRegistry>,
}

impl AppContext {
    pub fn new(config: AppConfig) -> Self {
        let identity = IdentityClient::from_config(&config);
        let completion = CompletionClient::from_config(&config);
        Self {
            config: Arc::new(config),
            identity: Arc::new(identity),
            completion: Arc::new(completion),
            sessions: Arc::new(SessionRegistry::new()),
        }
    }
}

/// Extract the session cookie value from a request's `Cookie` header.
pub fn session_cookie(headers: &axum::http::HeaderMap) -> Option<String> {
    let raw = headers.get(axum::http::header::COOKIE)?.to_str().ok()?;
    raw.split(';').find_map(|pair| {
        let (name, value) = pair.trim().split_once('=')?;
        (name == SESSION_COOKIE && !value.is_empty()).then(|| value.to_string())
    })
}

/// `Set-Cookie` value establishing the session cookie.
pub fn set_session_cookie(value: &str) -> String {
    format!("{SESSION_COOKIE}={value}; Path=/; HttpOnly; SameSite=Lax")
}

/// `Set-Cookie` value clearing the session cookie.
pub fn clear_session_cookie() -> String {
    format!("{SESSION_COOKIE}=; Path=/; HttpOnly; SameSite=Lax; Max-Age=0")
}
