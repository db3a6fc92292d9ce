//! # culturedrone Core
//!
//! Domain types, traits, and error definitions for the culturedrone
//! interpreter. This crate has **no transport or runtime dependencies**: it
//! defines the model that the provider, agent and CLI crates build on.
//!
//! ## Design Philosophy
//!
//! The seams the interpreter depends on are traits defined here:
//! - [`Provider`]: the remote chat-completion service (the oracle)
//! - [`DiagnosticSink`]: the write-only diagnostic log
//!
//! Implementations live in their respective crates, so the state machine can
//! be driven by scripted providers and in-memory sinks in tests.

pub mod command;
pub mod diagnostic;
pub mod drone;
pub mod error;
pub mod message;
pub mod provider;

// Re-export key types at crate root for ergonomics
pub use command::{Action, MalformedReply, StructuredCommand};
pub use diagnostic::{DiagnosticEvent, DiagnosticRecord, DiagnosticSink};
pub use drone::{Drone, Position};
pub use error::ProviderError;
pub use message::{Conversation, ConversationId, Message, Role};
pub use provider::{Provider, ProviderRequest, ProviderResponse};
