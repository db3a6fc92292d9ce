//! Chat-completion provider implementations for culturedrone.
//!
//! All providers implement the `culturedrone_core::Provider` trait.
//! The factory builds the configured one and refuses to do so without a
//! credential.

pub mod factory;
pub mod openai_compat;

pub use factory::build_from_config;
pub use openai_compat::OpenAiCompatProvider;
