//! mathcrew engine library
//!
//! This library provides the core functionality of mathcrew.
//! It is used by both the main binary and integration tests.

/// Configuration management module
pub mod config;

/// Secret management module
pub mod secrets;

/// Telemetry and Observability
pub mod telemetry;

/// Arithmetic expression evaluator
pub mod evaluator;

/// Sessions, per-session state and the attachment cache
pub mod session;

/// LLM provider abstraction layer
pub mod llm;

/// Capability variants sharing one interface
pub mod capabilities;

/// Pipelines and the audit trail
pub mod orchestrator;

/// CLI interface module
pub mod cli;

/// Command handlers module
pub mod handlers;
