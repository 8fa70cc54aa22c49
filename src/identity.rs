//! Credential Store client — a thin wrapper over the hosted identity
//! provider's REST surface (Supabase GoTrue).
//!
//! All durable identity state (accounts, sessions, token lifetimes) lives
//! inside the provider; this client only issues the handful of calls the
//! app consumes and maps provider rejections onto [`AuthError`]. Provider
//! messages are passed through verbatim so the login view can redisplay
//! them.

use serde::Deserialize;
use serde_json::json;

/// Errors from Credential Store operations. All are recoverable — the
/// caller stays in its pre-transition state and redisplays the message.
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    /// The provider rejected the email/password pair.
    #[error("{0}")]
    InvalidCredentials(String),
    /// Passwordless mode only: the address is not a pre-provisioned user.
    #[error("{0}")]
    EmailNotAuthorized(String),
    /// Any other provider or transport failure.
    #[error("{0}")]
    Provider(String),
}

/// The identity the provider binds a session to.
#[derive(Debug, Clone, Deserialize)]
pub struct ProviderUser {
    pub id: String,
    pub email: String,
}

/// A session issued by the provider: the token pair, its validity window,
/// and the associated user.
#[derive(Debug, Clone, Deserialize)]
pub struct ProviderSession {
    pub access_token: String,
    pub refresh_token: String,
    pub expires_in: u64,
    pub user: ProviderUser,
}

/// Known shapes of GoTrue error bodies. Different endpoints use
/// different field names; take the first one present.
#[derive(Deserialize)]
struct ProviderErrorBody {
    error_description: Option<String>,
    msg: Option<String>,
    message: Option<String>,
    error: Option<String>,
}

pub struct IdentityClient {
    base_url: String,
    anon_key: String,
    service_key: Option<String>,
    client: reqwest::Client,
}

impl IdentityClient {
    pub fn new(base_url: &str, anon_key: &str, service_key: Option<String>) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            anon_key: anon_key.to_string(),
            service_key,
            client: reqwest::Client::new(),
        }
    }

    pub fn from_config(config: &crate::config::AppConfig) -> Self {
        Self::new(
            &config.supabase_url,
            &config.supabase_anon_key,
            config.supabase_service_key.clone(),
        )
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Password grant. HTTP 400/401 is a credential rejection; anything
    /// else is a generic provider failure.
    pub async fn sign_in_with_password(
        &self,
        email: &str,
        password: &str,
    ) -> Result<ProviderSession, AuthError> {
        let url = format!("{}/auth/v1/token?grant_type=password", self.base_url);
        let response = self
            .client
            .post(&url)
            .header("apikey", &self.anon_key)
            .json(&json!({ "email": email, "password": password }))
            .send()
            .await
            .map_err(transport_error)?;

        if !response.status().is_success() {
            let (status, message) = read_error(response).await;
            return Err(match status {
                400 | 401 => AuthError::InvalidCredentials(message),
                _ => AuthError::Provider(message),
            });
        }

        response
            .json::<ProviderSession>()
            .await
            .map_err(|e| AuthError::Provider(format!("Malformed provider response: {e}")))
    }

    /// Create a new account. The password flow's "Create Account" action
    /// follows this with an immediate `sign_in_with_password`.
    pub async fn sign_up(&self, email: &str, password: &str) -> Result<(), AuthError> {
        let url = format!("{}/auth/v1/signup", self.base_url);
        let response = self
            .client
            .post(&url)
            .header("apikey", &self.anon_key)
            .json(&json!({ "email": email, "password": password }))
            .send()
            .await
            .map_err(transport_error)?;

        if !response.status().is_success() {
            let (_, message) = read_error(response).await;
            return Err(AuthError::Provider(message));
        }
        Ok(())
    }

    /// Ask the provider to email a one-time sign-in link scoped to
    /// `redirect_to`. `create_user: false` keeps unknown addresses from
    /// being auto-provisioned; the provider's rejection of such an
    /// address maps to the distinct [`AuthError::EmailNotAuthorized`].
    ///
    /// Issued with the service-role key when one is configured, so links
    /// can go out while public signups stay disabled.
    pub async fn send_magic_link(&self, email: &str, redirect_to: &str) -> Result<(), AuthError> {
        let url = format!("{}/auth/v1/otp", self.base_url);
        let api_key = self.service_key.as_deref().unwrap_or(&self.anon_key);
        let response = self
            .client
            .post(&url)
            .query(&[("redirect_to", redirect_to)])
            .header("apikey", api_key)
            .json(&json!({ "email": email, "create_user": false }))
            .send()
            .await
            .map_err(transport_error)?;

        if !response.status().is_success() {
            let (status, message) = read_error(response).await;
            return Err(classify_otp_rejection(status, message));
        }
        Ok(())
    }

    /// Validate an access token and recover the identity behind it.
    /// This is how a token pair delivered via the magic-link callback is
    /// checked before a local session is established.
    pub async fn get_user(&self, access_token: &str) -> Result<ProviderUser, AuthError> {
        let url = format!("{}/auth/v1/user", self.base_url);
        let response = self
            .client
            .get(&url)
            .header("apikey", &self.anon_key)
            .bearer_auth(access_token)
            .send()
            .await
            .map_err(transport_error)?;

        if !response.status().is_success() {
            let (_, message) = read_error(response).await;
            return Err(AuthError::Provider(message));
        }

        response
            .json::<ProviderUser>()
            .await
            .map_err(|e| AuthError::Provider(format!("Malformed provider response: {e}")))
    }

    /// Invalidate the session with the provider. Callers treat failure
    /// as non-fatal: local state is cleared either way.
    pub async fn sign_out(&self, access_token: &str) -> Result<(), AuthError> {
        let url = format!("{}/auth/v1/logout", self.base_url);
        let response = self
            .client
            .post(&url)
            .header("apikey", &self.anon_key)
            .bearer_auth(access_token)
            .send()
            .await
            .map_err(transport_error)?;

        if !response.status().is_success() {
            let (_, message) = read_error(response).await;
            return Err(AuthError::Provider(message));
        }
        Ok(())
    }
}

fn transport_error(err: reqwest::Error) -> AuthError {
    AuthError::Provider(err.to_string())
}

/// Decode a non-2xx provider response into (status, message), falling
/// back to the raw body, then to the status code.
async fn read_error(response: reqwest::Response) -> (u16, String) {
    let status = response.status().as_u16();
    let body = response.text().await.unwrap_or_default();
    let message = serde_json::from_str::<ProviderErrorBody>(&body)
        .ok()
        .and_then(|b| b.error_description.or(b.msg).or(b.message).or(b.error))
        .unwrap_or_else(|| {
            if body.trim().is_empty() {
                format!("Identity provider returned HTTP {status}")
            } else {
                body.clone()
            }
        });
    (status, message)
}

/// GoTrue reports a non-provisioned address on the OTP endpoint as 422
/// ("Signups not allowed for otp") or a 400 "user not found" variant.
fn classify_otp_rejection(status: u16, message: String) -> AuthError {
    let lower = message.to_lowercase();
    if status == 422 || lower.contains("not allowed") || lower.contains("not found") {
        AuthError::EmailNotAuthorized(message)
    } else {
        AuthError::Provider(message)
    }
}
