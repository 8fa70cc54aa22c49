//! HTTP layer.
//!
//! A composable axum `Router` (gate view, auth flows, generation,
//! download) plus the server lifecycle around it. Protected routes sit
//! behind the session-gate middleware; everything shares [`AppContext`].

pub mod endpoints;
pub mod error;
pub mod middleware;
pub mod pages;
pub mod router;
pub mod server;
pub mod types;

pub use router::app_router;
pub use server::{serve, AppServer};
pub use types::AppContext;
