//! Endpoint handlers.
//!
//! `home` renders the gate view (login or main, depending on session),
//! `auth` owns the login/logout flows, `notes` owns generation and
//! download.

pub mod auth;
pub mod home;
pub mod notes;
