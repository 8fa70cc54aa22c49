//! Application router.
//!
//! Two sub-routers merged: protected routes behind the session-gate
//! middleware, and public routes (the gate view itself plus the login
//! flows). The Extension layer must be outermost on the protected
//! stack so the middleware can reach `AppContext`; handlers take it
//! via `State` as usual.

use axum::routing::{get, post};
use axum::Router;
use tower_http::trace::TraceLayer;

use crate::api::endpoints;
use crate::api::middleware;
use crate::api::types::AppContext;

pub fn app_router(ctx: AppContext) -> Router {
    let protected = Router::new()
        .route("/generate", post(endpoints::notes::generate))
        .route("/download", get(endpoints::notes::download))
        .with_state(ctx.clone())
        .layer(axum::middleware::from_fn(middleware::require_session))
        .layer(axum::Extension(ctx.clone()));

    let public = Router::new()
        .route("/", get(endpoints::home::index))
        .route("/auth/login", post(endpoints::auth::login))
        .route("/auth/signup", post(endpoints::auth::signup))
        .route("/auth/magic-link", post(endpoints::auth::magic_link))
        .route("/auth/callback", get(endpoints::auth::callback))
        .route("/auth/complete", get(endpoints::auth::complete))
        .route("/auth/logout", post(endpoints::auth::logout))
        .with_state(ctx);

    Router::new()
        .merge(protected)
        .merge(public)
        .layer(TraceLayer::new_for_http())
}
