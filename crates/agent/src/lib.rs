//! The drone interpreter: the heart of culturedrone.
//!
//! Each user input goes through one **Ask → Normalize → Dispatch** cycle:
//!
//! 1. **Ask** the oracle via the [`OracleGateway`] (system prompt + history)
//! 2. **Normalize** the raw reply into a structured command, repairing a
//!    malformed or repetitive reply with at most one corrective round-trip each
//! 3. **Dispatch** the command against the [`Drone`](culturedrone_core::Drone)
//!    and speak the resulting message
//!
//! The interpreter never surfaces an error to the caller: unreachable oracles
//! produce an apology and leave the conversation unchanged.

pub mod diagnostics;
pub mod gateway;
pub mod interpreter;
pub mod normalizer;
pub mod prompt;
pub mod similarity;

#[cfg(test)]
mod test_helpers;

pub use diagnostics::JsonlSink;
pub use gateway::{GenerationParams, OracleGateway};
pub use interpreter::{DroneInterpreter, Effect, RetryPolicy};
