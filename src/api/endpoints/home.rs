//! `GET /` — the gate view.
//!
//! Anonymous callers get the login view for the configured mode;
//! authenticated callers get the narrative entry view. This route is
//! public (the session check happens inline, not via middleware),
//! because it must render something sensible in both states.

use axum::extract::State;
use axum::http::HeaderValue;
use axum::response::{Html, IntoResponse, Response};

use crate::api::pages;
use crate::api::types::{session_cookie, AppContext};
use crate::config::LoginMode;

pub async fn index(State(ctx): State<AppContext>, headers: axum::http::HeaderMap) -> Response {
    if let Some(session) = session_cookie(&headers).and_then(|c| ctx.sessions.resolve(&c)) {
        let mut response =
            Html(pages::main_page(&session.email, "", None, None)).into_response();
        response
            .headers_mut()
            .insert("Cache-Control", HeaderValue::from_static("no-store"));
        return response;
    }

    let html = match ctx.config.login_mode {
        LoginMode::Password => pages::login_password_page("", None),
        LoginMode::MagicLink => pages::login_magic_page("", None, None),
    };
    Html(html).into_response()
}
