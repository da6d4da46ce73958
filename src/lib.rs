//! Document compliance analysis service.
//!
//! The server side memoizes AI compliance analyses in [`cache`] behind an
//! axum API ([`handlers`]); [`session`] holds the client-side auth session
//! lifecycle.

pub mod cache;
pub mod clock;
pub mod config;
pub mod error;
pub mod handlers;
pub mod metrics;
pub mod models;
pub mod provider;
pub mod rate_limit;
pub mod session;
pub mod state;
pub mod worker;
