//! The drone interpreter: response normalization, bounded repair, dispatch.
//!
//! One call to [`DroneInterpreter::handle`] runs this loop:
//!
//! 1. **Ask** the oracle (system prompt + history + pending input)
//! 2. **Clean** the reply (strip code fences, trim)
//! 3. **Parse** it. On failure, send one corrective follow-up quoting the bad
//!    text; if that also fails, speak the cleaned text as-is.
//! 4. **Compare** `response_text` with the previous turn. A near-duplicate
//!    triggers one corrective follow-up, subject to a session-wide budget.
//! 5. **Accept**: record the original input in history and dispatch.
//!
//! Every hop can fail on transport; that ends the call with an apology and
//! leaves the history untouched. `handle` never returns an error.

use std::sync::Arc;
use culturedrone_config::{AppConfig, ConfigError, RetryConfig};
use culturedrone_core::command::{Action, StructuredCommand};
use culturedrone_core::diagnostic::{DiagnosticEvent, DiagnosticRecord, DiagnosticSink, NullSink};
use culturedrone_core::drone::{Drone, Position};
use culturedrone_core::error::ProviderError;
use culturedrone_core::message::{Conversation, Message};
use tracing::{debug, info, warn};

use crate::gateway::{GenerationParams, OracleGateway};
use crate::{normalizer, prompt, similarity};

/// Spoken when the oracle cannot be reached.
pub const APOLOGY: &str = "I couldn't process that command.";
/// Spoken for a `move` without both coordinates.
pub const MISSING_MOVE_COORDINATES: &str = "I got a move command, but no coordinates!";
/// Spoken for an `update_user_position` without both coordinates.
pub const MISSING_USER_COORDINATES: &str = "I got a user position update, but coordinates are missing!";
/// Spoken when there is neither an action nor any text.
pub const NOT_UNDERSTOOD: &str = "I don't know what to do with that command.";

/// Bounds for the two repair paths.
#[derive(Debug, Clone, PartialEq)]
pub struct RetryPolicy {
    /// Replies scoring above this against the previous turn are near-duplicates
    pub similarity_threshold: f64,
    /// Corrective round-trips per input for unparseable replies
    pub max_malformed_retries: u32,
    /// Repetition retries allowed before the session counter resets
    pub max_repetition_retries: u32,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            similarity_threshold: 0.8,
            max_malformed_retries: 1,
            max_repetition_retries: 2,
        }
    }
}

impl RetryPolicy {
    pub fn from_config(config: &RetryConfig) -> Self {
        Self {
            similarity_threshold: config.similarity_threshold,
            max_malformed_retries: config.max_malformed_retries.min(1),
            max_repetition_retries: config.max_repetition_retries,
        }
    }
}

/// What one input did.
#[derive(Debug, Clone, PartialEq)]
pub enum Effect {
    /// The drone moved.
    Moved { to: Position, message: String },
    /// The believed user position changed.
    UserPositionUpdated { to: Position, message: String },
    /// The drone spoke without changing state.
    Said { message: String },
    /// The oracle was unreachable; `diagnostic` explains why.
    Apology { message: String, diagnostic: String },
}

impl Effect {
    /// The text the drone speaks.
    pub fn message(&self) -> &str {
        match self {
            Effect::Moved { message, .. }
            | Effect::UserPositionUpdated { message, .. }
            | Effect::Said { message }
            | Effect::Apology { message, .. } => message,
        }
    }
}

enum Verdict {
    Accept,
    Retry { similarity: f64, previous: String },
}

/// Owns the drone, its conversation, and the repetition counter.
pub struct DroneInterpreter {
    drone: Drone,
    gateway: OracleGateway,
    history: Conversation,
    policy: RetryPolicy,
    repetition_retries: u32,
    diagnostics: Arc<dyn DiagnosticSink>,
}

impl DroneInterpreter {
    pub fn new(drone: Drone, gateway: OracleGateway) -> Self {
        Self {
            drone,
            gateway,
            history: Conversation::new(),
            policy: RetryPolicy::default(),
            repetition_retries: 0,
            diagnostics: Arc::new(NullSink),
        }
    }

    pub fn with_policy(mut self, policy: RetryPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn with_diagnostics(mut self, sink: Arc<dyn DiagnosticSink>) -> Self {
        self.diagnostics = sink;
        self
    }

    /// Build an interpreter from configuration.
    ///
    /// Fails before any network use if the provider needs a credential and
    /// none is configured.
    pub fn from_config(
        config: &AppConfig,
        diagnostics: Arc<dyn DiagnosticSink>,
    ) -> Result<Self, ConfigError> {
        let provider = culturedrone_providers::build_from_config(config)?;
        let gateway = OracleGateway::new(provider, GenerationParams::from_config(config))
            .with_diagnostics(diagnostics.clone());

        let drone = Drone::new(&config.drone.name, &config.drone.personality)
            .at(Position::new(config.drone.x, config.drone.y))
            .with_user_at(Position::new(config.drone.user_x, config.drone.user_y));

        Ok(Self::new(drone, gateway)
            .with_policy(RetryPolicy::from_config(&config.retry))
            .with_diagnostics(diagnostics))
    }

    pub fn drone(&self) -> &Drone {
        &self.drone
    }

    pub fn history(&self) -> &Conversation {
        &self.history
    }

    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    /// Current value of the session-wide repetition counter.
    pub fn repetition_retries(&self) -> u32 {
        self.repetition_retries
    }

    pub fn gateway(&self) -> &OracleGateway {
        &self.gateway
    }

    /// Process one user input to completion.
    pub async fn handle(&mut self, user_input: &str) -> Effect {
        info!(
            conversation_id = %self.history.id,
            turns = self.history.len(),
            "Handling input"
        );

        let retries_before = self.repetition_retries;
        match self.normalize(user_input).await {
            Ok(command) => {
                self.history.push(Message::user(user_input));
                info!(action = command.action.tag(), "Command accepted");
                self.record(DiagnosticEvent::Parsed {
                    response_text: command.response_text.clone(),
                    action: command.action.tag().into(),
                });
                self.dispatch(command)
            }
            Err(e) => {
                self.repetition_retries = retries_before;
                warn!(error = %e, "Oracle unreachable");
                self.record(DiagnosticEvent::TransportFailure {
                    error: e.to_string(),
                });
                Effect::Apology {
                    message: APOLOGY.into(),
                    diagnostic: format!("Failed to reach the oracle: {e}"),
                }
            }
        }
    }

    /// Ask, clean, parse and de-duplicate until a command is accepted.
    ///
    /// At most one malformed retry and one repetition retry happen per call,
    /// so the oracle is asked at most three times.
    async fn normalize(&mut self, user_input: &str) -> Result<StructuredCommand, ProviderError> {
        let mut pending = user_input.to_string();
        let mut malformed_retries = 0;
        let mut repetition_retried = false;

        loop {
            let system_prompt = prompt::system_prompt(&self.drone);
            let raw = self
                .gateway
                .converse(&system_prompt, &self.history.messages, &pending)
                .await?;

            let cleaned = normalizer::strip_framing(&raw);
            let command = match normalizer::parse(&cleaned) {
                Ok(command) => command,
                Err(reason) => {
                    warn!(%reason, "Oracle reply is not a structured command");
                    self.record(DiagnosticEvent::MalformedReply {
                        text: cleaned.clone(),
                        reason: reason.to_string(),
                    });

                    if malformed_retries < self.policy.max_malformed_retries {
                        malformed_retries += 1;
                        debug!("Asking the oracle to reformat its reply");
                        pending = prompt::malformed_correction(&cleaned);
                        continue;
                    }

                    self.record(DiagnosticEvent::FallbackUsed {
                        text: cleaned.clone(),
                    });
                    StructuredCommand::fallback(cleaned)
                }
            };

            match self.check_repetition(&command, repetition_retried) {
                Verdict::Accept => return Ok(command),
                Verdict::Retry { similarity, previous } => {
                    repetition_retried = true;
                    debug!(similarity, "Asking the oracle to rephrase");
                    pending = prompt::repetition_correction(similarity, &previous, user_input);
                }
            }
        }
    }

    /// Compare the candidate with the previous turn and update the counter.
    fn check_repetition(&mut self, command: &StructuredCommand, already_retried: bool) -> Verdict {
        let Some(previous) = self.history.last() else {
            self.repetition_retries = 0;
            return Verdict::Accept;
        };

        let similarity = similarity::ratio(&command.response_text, &previous.content);
        if similarity <= self.policy.similarity_threshold {
            self.repetition_retries = 0;
            return Verdict::Accept;
        }

        if already_retried {
            self.repetition_retries = 0;
            debug!(similarity, "Near-duplicate accepted after rephrase attempt");
            return Verdict::Accept;
        }

        self.repetition_retries += 1;
        if self.repetition_retries > self.policy.max_repetition_retries {
            self.repetition_retries = 0;
            info!(similarity, "Repetition budget exhausted, accepting duplicate");
            self.record(DiagnosticEvent::RepetitionBudgetExhausted { similarity });
            return Verdict::Accept;
        }

        let previous = previous.content.clone();
        self.record(DiagnosticEvent::RepetitionDetected {
            similarity,
            previous: previous.clone(),
        });
        Verdict::Retry { similarity, previous }
    }

    /// Apply the command to the drone and speak.
    fn dispatch(&mut self, command: StructuredCommand) -> Effect {
        match command.action {
            Action::Move {
                x: Some(x),
                y: Some(y),
            } => {
                let to = Position::new(x, y);
                self.drone.move_to(to);
                let message = format!("I have moved to {to}");
                self.speak(&message);
                Effect::Moved { to, message }
            }
            Action::Move { .. } => self.say(MISSING_MOVE_COORDINATES),
            Action::UpdateUserPosition {
                user_x: Some(x),
                user_y: Some(y),
            } => {
                let to = Position::new(x, y);
                self.drone.set_user_position(to);
                let message = format!("User position updated to {to}");
                self.speak(&message);
                Effect::UserPositionUpdated { to, message }
            }
            Action::UpdateUserPosition { .. } => self.say(MISSING_USER_COORDINATES),
            Action::None if command.response_text.trim().is_empty() => self.say(NOT_UNDERSTOOD),
            Action::None => self.say(&command.response_text),
        }
    }

    fn say(&mut self, message: &str) -> Effect {
        self.speak(message);
        Effect::Said {
            message: message.to_string(),
        }
    }

    /// Emitted messages re-enter the context as assistant turns.
    fn speak(&mut self, message: &str) {
        self.history.push(Message::assistant(message));
        self.record(DiagnosticEvent::Emitted {
            message: message.to_string(),
        });
    }

    fn record(&self, event: DiagnosticEvent) {
        self.diagnostics.record(&DiagnosticRecord::now(event));
    }
}
