//! Session-gate middleware for the protected routes.
//!
//! Resolves the browser session cookie against the registry and injects
//! the explicit [`SessionContext`] into request extensions for downstream
//! handlers. Requests without a resolvable session are redirected to the
//! login view.

use axum::http::{HeaderValue, Request};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};

use crate::api::error::PageError;
use crate::api::types::{session_cookie, AppContext};

/// Require a live session for the wrapped routes.
///
/// Accesses `AppContext` from request extensions (injected by the
/// Extension layer). On success: injects `SessionContext` and stamps
/// `Cache-Control: no-store` so authenticated pages are never cached.
pub async fn require_session(req: Request<axum::body::Body>, next: Next) -> Response {
    match require_session_inner(req, next).await {
        Ok(resp) => resp,
        Err(err) => err.into_response(),
    }
}

async fn require_session_inner(
    mut req: Request<axum::body::Body>,
    next: Next,
) -> Result<Response, PageError> {
    let ctx: AppContext = req
        .extensions()
        .get::<AppContext>()
        .cloned()
        .ok_or(PageError::Internal("missing app context".into()))?;

    let cookie = session_cookie(req.headers()).ok_or(PageError::Unauthorized)?;
    let session = ctx.sessions.resolve(&cookie).ok_or(PageError::Unauthorized)?;

    req.extensions_mut().insert(session);

    let mut response = next.run(req).await;
    response
        .headers_mut()
        .insert("Cache-Control", HeaderValue::from_static("no-store"));

    Ok(response)
}
