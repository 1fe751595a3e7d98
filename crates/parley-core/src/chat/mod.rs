//! Chat session and message orchestration for Parley.
//!
//! - `repository`: the `ChatRepository` port implemented by the infra layer
//! - `context`: sliding-window prompt assembly
//! - `title`: LLM-generated session titles
//! - `lock`: per-session serialization
//! - `service`: the `ChatService` orchestrator

pub mod context;
pub mod lock;
pub mod repository;
pub mod service;
pub mod title;
