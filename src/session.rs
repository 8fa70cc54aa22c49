//! Session Manager — per-browser session registry.
//!
//! The Credential Store owns all durable identity state; this registry
//! holds only a transient, in-memory reference per browser session,
//! keyed by a random cookie value. Two states exist locally: no entry
//! (anonymous) and a live entry (authenticated). A learner who has
//! requested a magic link stays anonymous here until the callback
//! completes, possibly in a different tab.
//!
//! Nothing in this module is ever written to durable storage; the only
//! persistence path for a generated note is the learner's own download.

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::{Duration, Instant};

use crate::identity::ProviderSession;

/// One authenticated browser session: the provider token pair, the
/// identity it is bound to, and the most recent generated note
/// (transient UI state for the download action).
struct UserSession {
    user_id: String,
    email: String,
    access_token: String,
    #[allow(dead_code)] // held for the provider's refresh flow; unused until then
    refresh_token: String,
    expires_at: Instant,
    last_note: Option<String>,
}

/// Explicit per-request session context, injected into protected
/// handlers by the middleware. Handlers receive this instead of doing
/// ambient registry lookups, which keeps them testable in isolation.
#[derive(Debug, Clone)]
pub struct SessionContext {
    /// The cookie value addressing this session in the registry.
    pub cookie: String,
    pub user_id: String,
    pub email: String,
    pub access_token: String,
}

/// In-memory registry of authenticated browser sessions.
pub struct SessionRegistry {
    sessions: Mutex<HashMap<String, UserSession>>,
}

impl SessionRegistry {
    pub fn new() -> Self {
        Self {
            sessions: Mutex::new(HashMap::new()),
        }
    }

    /// Bind a provider session to a fresh cookie value and return it.
    pub fn establish(&self, provider: &ProviderSession) -> String {
        let cookie = generate_cookie_value();
        let session = UserSession {
            user_id: provider.user.id.clone(),
            email: provider.user.email.clone(),
            access_token: provider.access_token.clone(),
            refresh_token: provider.refresh_token.clone(),
            expires_at: Instant::now() + Duration::from_secs(provider.expires_in),
            last_note: None,
        };
        if let Ok(mut sessions) = self.sessions.lock() {
            sessions.insert(cookie.clone(), session);
        }
        cookie
    }

    /// Resolve a cookie to its session context. Entries past their
    /// validity window are dropped on lookup.
    pub fn resolve(&self, cookie: &str) -> Option<SessionContext> {
        let mut sessions = self.sessions.lock().ok()?;
        match sessions.get(cookie) {
            Some(session) if Instant::now() < session.expires_at => Some(SessionContext {
                cookie: cookie.to_string(),
                user_id: session.user_id.clone(),
                email: session.email.clone(),
                access_token: session.access_token.clone(),
            }),
            Some(_) => {
                sessions.remove(cookie);
                None
            }
            None => None,
        }
    }

    /// Remove a session, returning its access token so the caller can
    /// attempt a best-effort remote sign-out. Idempotent: revoking an
    /// unknown or already-revoked cookie returns `None` and changes
    /// nothing.
    pub fn revoke(&self, cookie: &str) -> Option<String> {
        let mut sessions = self.sessions.lock().ok()?;
        sessions.remove(cookie).map(|s| s.access_token)
    }

    /// Stash the most recent generated note on the session.
    pub fn store_note(&self, cookie: &str, note: String) {
        if let Ok(mut sessions) = self.sessions.lock() {
            if let Some(session) = sessions.get_mut(cookie) {
                session.last_note = Some(note);
            }
        }
    }

    /// The most recent generated note for this session, if any.
    pub fn last_note(&self, cookie: &str) -> Option<String> {
        let sessions = self.sessions.lock().ok()?;
        sessions.get(cookie).and_then(|s| s.last_note.clone())
    }

    pub fn len(&self) -> usize {
        self.sessions.lock().map(|s| s.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    #[cfg(test)]
    fn expire(&self, cookie: &str) {
        let mut sessions = self.sessions.lock().unwrap();
        if let Some(session) = sessions.get_mut(cookie) {
            session.expires_at = Instant::now() - Duration::from_secs(1);
        }
    }
}

impl Default for SessionRegistry {
    fn default() -> Self {
        Self::new()
    }
}

/// Random URL-safe cookie value (32 bytes of entropy).
fn generate_cookie_value() -> String {
    use base64::Engine;
    let bytes: [u8; 32] = rand::random();
    base64::engine::general_purpose::URL_SAFE_NO_PAD.encode(bytes)
}
