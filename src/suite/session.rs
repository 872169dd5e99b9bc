//! Per-test session state machine.
//!
//! ```text
//!   AwaitingResponse ──submit──▶ Advancing ──advance──▶ AwaitingResponse
//!          │                        │
//!          │ terminal answer        │ last trial
//!          ▼                        ▼
//!       Complete ◀──────────────────┘
//!
//!   any non-terminal ──abort──▶ Aborted
//! ```
//!
//! An operation issued in the wrong phase aborts the session and surfaces
//! `InvalidState`. A rejected answer (`InvalidResponse`) leaves the session
//! waiting.

#![allow(missing_docs)]

use serde::Serialize;

use crate::core::errors::{Result, SuiteError};
use crate::suite::results::OutcomeRecord;
use crate::suite::scoring::ScoringEngine;
use crate::suite::stimulus::{ChoiceOption, StimulusSet, TestDefinition, TestKind, TrialSpec};

/// Literal answer submitted by the "I don't see anything" action on a color plate.
pub const SKIP_ANSWER: &str = "nothing";

/// Controller phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionPhase {
    AwaitingResponse,
    Advancing,
    Complete,
    Aborted,
}

impl SessionPhase {
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Complete | Self::Aborted)
    }

    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::AwaitingResponse => "awaiting a response",
            Self::Advancing => "advancing",
            Self::Complete => "complete",
            Self::Aborted => "aborted",
        }
    }
}

/// One captured answer. Appended only.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TrialResponse {
    pub trial_index: usize,
    pub raw_answer: String,
    /// Only set for color plates.
    pub is_correct: Option<bool>,
}

/// Mutable progress of the active test. Dropped when the test ends.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SessionState {
    pub current_trial_index: usize,
    pub captured_responses: Vec<TrialResponse>,
}

/// What a successful operation moved the controller to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Transition {
    /// Waiting for the answer to `trial_index`.
    Awaiting { trial_index: usize },
    /// Answer captured; `advance` moves on.
    Advancing,
    /// Test finished with this outcome.
    Completed(OutcomeRecord),
}

/// The two answers of an acuity step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AcuityAnswer {
    /// "Yes, make smaller"
    Smaller,
    /// "No, too small"
    TooSmall,
}

impl AcuityAnswer {
    /// Case-insensitive, surrounding whitespace ignored.
    #[must_use]
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_lowercase().as_str() {
            "smaller" | "yes" | "y" | "yes, make smaller" => Some(Self::Smaller),
            "too small" | "too-small" | "no" | "n" | "no, too small" => Some(Self::TooSmall),
            _ => None,
        }
    }
}

/// Pick the option named by `raw`: `a`/`1`, `b`/`2`, or the button label.
#[must_use]
pub fn resolve_choice<'a>(
    option_a: &'a ChoiceOption,
    option_b: &'a ChoiceOption,
    raw: &str,
) -> Option<&'a ChoiceOption> {
    let answer = raw.trim().to_lowercase();
    if answer == "a" || answer == "1" || answer == option_a.label.to_lowercase() {
        Some(option_a)
    } else if answer == "b" || answer == "2" || answer == option_b.label.to_lowercase() {
        Some(option_b)
    } else {
        None
    }
}

/// Drives one test from its first trial to an outcome.
#[derive(Debug, Clone)]
pub struct TestSessionController {
    definition: TestDefinition,
    scoring: ScoringEngine,
    phase: SessionPhase,
    state: Option<SessionState>,
    outcome: Option<OutcomeRecord>,
}

impl TestSessionController {
    /// Start a session for `test_id` at trial 0.
    pub fn start(stimuli: &StimulusSet, test_id: &str) -> Result<Self> {
        let definition = stimuli.get_definition(test_id)?;
        Ok(Self::from_definition(definition.clone()))
    }

    #[must_use]
    pub fn from_definition(definition: TestDefinition) -> Self {
        Self {
            definition,
            scoring: ScoringEngine::new(),
            phase: SessionPhase::AwaitingResponse,
            state: Some(SessionState::default()),
            outcome: None,
        }
    }

    #[must_use]
    pub const fn test_kind(&self) -> TestKind {
        self.definition.kind
    }

    #[must_use]
    pub const fn definition(&self) -> &TestDefinition {
        &self.definition
    }

    #[must_use]
    pub const fn phase(&self) -> SessionPhase {
        self.phase
    }

    /// Live state; `None` once the session has ended.
    #[must_use]
    pub const fn state(&self) -> Option<&SessionState> {
        self.state.as_ref()
    }

    #[must_use]
    pub fn current_trial_index(&self) -> Option<usize> {
        self.state.as_ref().map(|s| s.current_trial_index)
    }

    #[must_use]
    pub fn current_trial(&self) -> Option<&TrialSpec> {
        self.current_trial_index()
            .and_then(|index| self.definition.trial(index))
    }

    #[must_use]
    pub fn last_response(&self) -> Option<&TrialResponse> {
        self.state
            .as_ref()
            .and_then(|s| s.captured_responses.last())
    }

    #[must_use]
    pub const fn outcome(&self) -> Option<&OutcomeRecord> {
        self.outcome.as_ref()
    }

    /// Capture the answer to the current trial.
    pub fn submit_response(&mut self, raw_answer: &str) -> Result<Transition> {
        if self.phase != SessionPhase::AwaitingResponse {
            return Err(self.violation("submit_response"));
        }
        let Some(state) = self.state.as_mut() else {
            return Err(self.violation("submit_response"));
        };
        let index = state.current_trial_index;
        let Some(trial) = self.definition.trials.get(index) else {
            return Err(self.violation("submit_response"));
        };

        let mut response = TrialResponse {
            trial_index: index,
            raw_answer: raw_answer.to_string(),
            is_correct: None,
        };
        let terminal = match trial {
            TrialSpec::ColorPlate {
                expected_answer, ..
            } => {
                if raw_answer.trim().is_empty() {
                    return Err(self.rejected(raw_answer, "blank answer"));
                }
                response.is_correct =
                    Some(raw_answer.to_lowercase() == expected_answer.to_lowercase());
                false
            }
            TrialSpec::AcuityStep { .. } => match AcuityAnswer::parse(raw_answer) {
                Some(AcuityAnswer::Smaller) => false,
                Some(AcuityAnswer::TooSmall) => true,
                None => {
                    return Err(self.rejected(raw_answer, "expected \"smaller\" or \"too small\""));
                }
            },
            TrialSpec::FixedChoice { option_a, option_b } => {
                if resolve_choice(option_a, option_b, raw_answer).is_none() {
                    return Err(self.rejected(raw_answer, "matches neither option"));
                }
                true
            }
        };

        state.captured_responses.push(response);
        if terminal {
            self.complete()
        } else {
            self.phase = SessionPhase::Advancing;
            Ok(Transition::Advancing)
        }
    }

    /// Move past the answered trial, completing the test after the last one.
    pub fn advance(&mut self) -> Result<Transition> {
        if self.phase != SessionPhase::Advancing {
            return Err(self.violation("advance"));
        }
        let trial_count = self.definition.trial_count();
        let Some(state) = self.state.as_mut() else {
            return Err(self.violation("advance"));
        };

        if state.current_trial_index + 1 < trial_count {
            state.current_trial_index += 1;
            self.phase = SessionPhase::AwaitingResponse;
            Ok(Transition::Awaiting {
                trial_index: state.current_trial_index,
            })
        } else {
            self.complete()
        }
    }

    /// End the session without an outcome ("Back" mid-test).
    pub fn abort(&mut self) -> Result<()> {
        if self.phase.is_terminal() {
            return Err(SuiteError::InvalidState {
                operation: "abort",
                state: self.phase.label().to_string(),
            });
        }
        self.phase = SessionPhase::Aborted;
        self.state = None;
        Ok(())
    }

    fn complete(&mut self) -> Result<Transition> {
        let responses = self
            .state
            .take()
            .map(|s| s.captured_responses)
            .unwrap_or_default();
        match self.scoring.score(&self.definition, &responses) {
            Ok(outcome_text) => {
                let record = OutcomeRecord {
                    test_id: self.definition.kind,
                    outcome_text,
                };
                self.phase = SessionPhase::Complete;
                self.outcome = Some(record.clone());
                Ok(Transition::Completed(record))
            }
            Err(err) => {
                self.phase = SessionPhase::Aborted;
                Err(err)
            }
        }
    }

    /// Out-of-phase call: tear the session down and describe what went wrong.
    fn violation(&mut self, operation: &'static str) -> SuiteError {
        let state = format!("{} is {}", self.definition.id(), self.phase.label());
        if !self.phase.is_terminal() {
            self.phase = SessionPhase::Aborted;
            self.state = None;
        }
        SuiteError::InvalidState { operation, state }
    }

    fn rejected(&self, raw_answer: &str, details: &str) -> SuiteError {
        SuiteError::InvalidResponse {
            test_id: self.definition.id().to_string(),
            answer: raw_answer.to_string(),
            details: details.to_string(),
        }
    }
}
