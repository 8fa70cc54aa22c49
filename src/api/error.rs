//! HTTP-facing error type.
//!
//! Almost every failure in this app is rendered inline on the page that
//! triggered it (provider messages on the login view, the embedded error
//! string on the generate view), so this enum only covers the few real
//! HTTP faults: hitting a protected route without a session, malformed
//! requests, and internal errors.

use axum::http::StatusCode;
use axum::response::{Html, IntoResponse, Redirect, Response};

use crate::api::pages;

#[derive(Debug, thiserror::Error)]
pub enum PageError {
    /// No resolvable session — bounce to the login view.
    #[error("Authentication required")]
    Unauthorized,
    #[error("Invalid request: {0}")]
    BadRequest(String),
    #[error("Internal error: {0}")]
    Internal(String),
}

impl IntoResponse for PageError {
    fn into_response(self) -> Response {
        match self {
            PageError::Unauthorized => Redirect::to("/").into_response(),
            PageError::BadRequest(detail) => (
                StatusCode::BAD_REQUEST,
                Html(pages::error_page("Invalid request", &detail)),
            )
                .into_response(),
            PageError::Internal(detail) => {
                tracing::error!(detail = %detail, "internal error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Html(pages::error_page(
                        "Something went wrong",
                        "An internal error occurred. Please try again.",
                    )),
                )
                    .into_response()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use axum::body::to_bytes;
    use axum::http::header;

    use super::*;

    #[tokio::test]
    async fn unauthorized_redirects_to_login() {
        let response = PageError::Unauthorized.into_response();
        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_eq!(response.headers().get(header::LOCATION).unwrap(), "/");
    }

    #[tokio::test]
    async fn bad_request_renders_the_detail() {
        let response = PageError::BadRequest("missing form field".into()).into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = to_bytes(response.into_body(), 64 * 1024).await.unwrap();
        let html = String::from_utf8(body.to_vec()).unwrap();
        assert!(html.contains("missing form field"));
    }

    #[tokio::test]
    async fn internal_hides_detail_from_client() {
        let response = PageError::Internal("lock poisoned".into()).into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let body = to_bytes(response.into_body(), 64 * 1024).await.unwrap();
        let html = String::from_utf8(body.to_vec()).unwrap();
        assert!(!html.contains("lock poisoned"));
        assert!(html.contains("internal error occurred"));
    }
}
