//! Authentication endpoints.
//!
//! Password mode: `POST /auth/login`, `POST /auth/signup`.
//! Magic-link mode: `POST /auth/magic-link`, then the two-step callback —
//! `GET /auth/callback` (fragment bridge page) and `GET /auth/complete`
//! (query-parameter consumer). `POST /auth/logout` serves both modes.
//!
//! Credential Store failures never propagate: the login view re-renders
//! with the provider's message and local state stays untouched.

use axum::extract::{Query, State};
use axum::http::{header, HeaderMap, HeaderValue};
use axum::response::{Html, IntoResponse, Redirect, Response};
use axum::Form;
use serde::Deserialize;

use crate::api::error::PageError;
use crate::api::pages;
use crate::api::types::{clear_session_cookie, session_cookie, set_session_cookie, AppContext};
use crate::config::LoginMode;
use crate::identity::{AuthError, ProviderSession};

#[derive(Deserialize)]
pub struct CredentialsForm {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

#[derive(Deserialize)]
pub struct MagicLinkForm {
    #[serde(default)]
    pub email: String,
}

/// Token pair recovered from the redirect URL by the bridge page.
/// The provider appends more fragment fields (`token_type`, `type`);
/// only these three matter here.
#[derive(Deserialize)]
pub struct CompleteParams {
    pub access_token: Option<String>,
    pub refresh_token: Option<String>,
    pub expires_in: Option<u64>,
}

/// `POST /auth/login` — password grant against the Credential Store.
pub async fn login(
    State(ctx): State<AppContext>,
    Form(form): Form<CredentialsForm>,
) -> Result<Response, PageError> {
    if ctx.config.login_mode != LoginMode::Password {
        return Err(PageError::Unauthorized);
    }

    let email = form.email.trim();
    if email.is_empty() || form.password.is_empty() {
        return Ok(Html(pages::login_password_page(
            email,
            Some("Please enter both email and password."),
        ))
        .into_response());
    }

    match ctx.identity.sign_in_with_password(email, &form.password).await {
        Ok(provider) => establish_and_redirect(&ctx, &provider),
        Err(e) => {
            tracing::info!(email, error = %e, "password login rejected");
            Ok(Html(pages::login_password_page(email, Some(&e.to_string()))).into_response())
        }
    }
}

/// `POST /auth/signup` — create the account, then log it straight in.
pub async fn signup(
    State(ctx): State<AppContext>,
    Form(form): Form<CredentialsForm>,
) -> Result<Response, PageError> {
    if ctx.config.login_mode != LoginMode::Password {
        return Err(PageError::Unauthorized);
    }

    let email = form.email.trim();
    if email.is_empty() || form.password.is_empty() {
        return Ok(Html(pages::login_password_page(
            email,
            Some("Please enter both email and password to create an account."),
        ))
        .into_response());
    }

    if let Err(e) = ctx.identity.sign_up(email, &form.password).await {
        tracing::info!(email, error = %e, "signup rejected");
        return Ok(Html(pages::login_password_page(email, Some(&e.to_string()))).into_response());
    }

    match ctx.identity.sign_in_with_password(email, &form.password).await {
        Ok(provider) => establish_and_redirect(&ctx, &provider),
        Err(e) => {
            Ok(Html(pages::login_password_page(email, Some(&e.to_string()))).into_response())
        }
    }
}

/// `POST /auth/magic-link` — ask the Credential Store to email a
/// one-time sign-in link. No local state changes: the learner stays
/// anonymous until the callback completes, possibly in another tab.
pub async fn magic_link(
    State(ctx): State<AppContext>,
    Form(form): Form<MagicLinkForm>,
) -> Result<Response, PageError> {
    if ctx.config.login_mode != LoginMode::MagicLink {
        return Err(PageError::Unauthorized);
    }

    let email = form.email.trim();
    if email.is_empty() {
        return Ok(Html(pages::login_magic_page(
            email,
            Some("Please enter your email address."),
            None,
        ))
        .into_response());
    }

    match ctx
        .identity
        .send_magic_link(email, &ctx.config.callback_url())
        .await
    {
        Ok(()) => Ok(Html(pages::login_magic_page(
            email,
            None,
            Some("Check your email for a one-time sign-in link. Opening it will sign you in."),
        ))
        .into_response()),
        Err(AuthError::EmailNotAuthorized(msg)) => {
            tracing::info!(email, provider_message = %msg, "magic link refused: not provisioned");
            Ok(Html(pages::login_magic_page(
                email,
                Some("This email address is not authorized for the training simulation."),
                None,
            ))
            .into_response())
        }
        Err(e) => {
            tracing::warn!(email, error = %e, "magic link request failed");
            Ok(Html(pages::login_magic_page(email, Some(&e.to_string()), None)).into_response())
        }
    }
}

/// `GET /auth/callback` — step 1 of the callback protocol. The provider
/// delivers the token pair in the URL fragment; this page rewrites it
/// into query parameters and redirects to `/auth/complete`.
pub async fn callback() -> Html<&'static str> {
    Html(pages::CALLBACK_BRIDGE_HTML)
}

/// `GET /auth/complete` — step 2: read the token pair from the query,
/// validate it against the Credential Store, establish the session.
pub async fn complete(
    State(ctx): State<AppContext>,
    Query(params): Query<CompleteParams>,
) -> Result<Response, PageError> {
    if ctx.config.login_mode != LoginMode::MagicLink {
        return Err(PageError::Unauthorized);
    }

    let (Some(access_token), Some(refresh_token)) = (params.access_token, params.refresh_token)
    else {
        return Ok(login_error_page(
            &ctx,
            "The sign-in link was missing its tokens. Please request a new one.",
        ));
    };

    match ctx.identity.get_user(&access_token).await {
        Ok(user) => {
            let provider = ProviderSession {
                access_token,
                refresh_token,
                expires_in: params.expires_in.unwrap_or(3600),
                user,
            };
            establish_and_redirect(&ctx, &provider)
        }
        Err(e) => {
            tracing::info!(error = %e, "magic link token pair rejected");
            Ok(login_error_page(&ctx, &e.to_string()))
        }
    }
}

/// `POST /auth/logout` — best-effort remote sign-out; local state is
/// always cleared. Safe to call repeatedly.
pub async fn logout(
    State(ctx): State<AppContext>,
    headers: HeaderMap,
) -> Result<Response, PageError> {
    if let Some(cookie) = session_cookie(&headers) {
        if let Some(access_token) = ctx.sessions.revoke(&cookie) {
            if let Err(e) = ctx.identity.sign_out(&access_token).await {
                tracing::warn!(error = %e, "remote sign-out failed; local session cleared");
            }
        }
    }

    let mut response = Redirect::to("/").into_response();
    let value = HeaderValue::from_str(&clear_session_cookie())
        .map_err(|e| PageError::Internal(format!("cookie header: {e}")))?;
    response.headers_mut().insert(header::SET_COOKIE, value);
    Ok(response)
}

/// Bind a provider session to a fresh cookie and bounce to the gate view.
fn establish_and_redirect(
    ctx: &AppContext,
    provider: &ProviderSession,
) -> Result<Response, PageError> {
    let cookie = ctx.sessions.establish(provider);
    tracing::info!(email = %provider.user.email, "session established");

    let mut response = Redirect::to("/").into_response();
    let value = HeaderValue::from_str(&set_session_cookie(&cookie))
        .map_err(|e| PageError::Internal(format!("cookie header: {e}")))?;
    response.headers_mut().insert(header::SET_COOKIE, value);
    Ok(response)
}

/// Login view with an inline error, in whichever variant is configured.
fn login_error_page(ctx: &AppContext, message: &str) -> Response {
    let html = match ctx.config.login_mode {
        LoginMode::Password => pages::login_password_page("", Some(message)),
        LoginMode::MagicLink => pages::login_magic_page("", Some(message), None),
    };
    Html(html).into_response()
}
