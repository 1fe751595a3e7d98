//! HTTP/REST API layer for Parley.
//!
//! Axum-based JSON API with CORS support and plain `{"error": ...}` failures.

pub mod error;
pub mod handlers;
pub mod router;
