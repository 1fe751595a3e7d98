//! Infrastructure layer for Parley.
//!
//! Contains implementations of the traits defined in `parley-core`:
//! SQLite storage, the Ollama model client, and configuration loading.

pub mod config;
pub mod llm;
pub mod sqlite;
