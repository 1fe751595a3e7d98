//! Shared domain types for Parley.
//!
//! This crate contains the core domain types used across the gateway:
//! sessions, stored messages, LLM request/response shapes, configuration,
//! and their associated error types.
//!
//! Zero infrastructure dependencies -- only serde, chrono, thiserror.

pub mod chat;
pub mod config;
pub mod error;
pub mod llm;
