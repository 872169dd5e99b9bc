//! Suite coordinator: picks the active test, feeds it user input, and
//! collects outcomes into the results map.
//!
//! At most one session is live. Selecting another test, resetting the suite,
//! or pressing "Back" discards the live session without recording anything.

#![allow(missing_docs)]

use crate::core::config::Config;
use crate::core::errors::{Result, SuiteError};
use crate::logger::activity::{
    AbortReason, ActivityEvent, ActivitySink, NullSink, sink_from_config,
};
use crate::suite::results::{OutcomeRecord, ResultsMap, ResultsSummary};
use crate::suite::session::{SessionPhase, TestSessionController, Transition};
use crate::suite::stimulus::{StimulusSet, TestDefinition, TestKind, TrialSpec};

/// Read-only view of the live session for display.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionView<'a> {
    pub test_id: TestKind,
    pub name: &'a str,
    pub instructions: &'a str,
    pub phase: SessionPhase,
    pub trial_index: usize,
    pub trial_count: usize,
    pub trial: Option<&'a TrialSpec>,
}

/// Orchestrates the six tests of one suite-viewing session.
pub struct SuiteCoordinator {
    stimuli: StimulusSet,
    active: Option<TestSessionController>,
    results: ResultsMap,
    sink: Box<dyn ActivitySink>,
}

impl std::fmt::Debug for SuiteCoordinator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SuiteCoordinator")
            .field(
                "active",
                &self.active.as_ref().map(TestSessionController::test_kind),
            )
            .field("results", &self.results)
            .finish_non_exhaustive()
    }
}

impl Default for SuiteCoordinator {
    fn default() -> Self {
        Self::new(StimulusSet::standard())
    }
}

impl SuiteCoordinator {
    /// Coordinator without activity logging.
    #[must_use]
    pub fn new(stimuli: StimulusSet) -> Self {
        Self::with_sink(stimuli, Box::new(NullSink))
    }

    #[must_use]
    pub fn with_sink(stimuli: StimulusSet, sink: Box<dyn ActivitySink>) -> Self {
        Self {
            stimuli,
            active: None,
            results: ResultsMap::new(),
            sink,
        }
    }

    /// Standard suite logging to the sink the config describes.
    pub fn from_config(config: &Config) -> Result<Self> {
        let mut coordinator =
            Self::with_sink(StimulusSet::standard(), sink_from_config(&config.logging));
        let config_hash = config.stable_hash()?;
        coordinator
            .sink
            .record(&ActivityEvent::SuiteOpened { config_hash });
        Ok(coordinator)
    }

    #[must_use]
    pub fn list_test_definitions(&self) -> &[TestDefinition] {
        self.stimuli.definitions()
    }

    #[must_use]
    pub const fn stimuli(&self) -> &StimulusSet {
        &self.stimuli
    }

    /// Start `test_id`, discarding any unfinished session.
    pub fn select_test(&mut self, test_id: &str) -> Result<()> {
        let session = TestSessionController::start(&self.stimuli, test_id)?;
        self.discard_active(AbortReason::Replaced);
        self.sink.record(&ActivityEvent::TestStarted {
            test_id: session.test_kind().id().to_string(),
            trial_count: session.definition().trial_count(),
        });
        self.active = Some(session);
        Ok(())
    }

    /// The live session, if any.
    #[must_use]
    pub fn active_session(&self) -> Option<SessionView<'_>> {
        let session = self.active.as_ref()?;
        let definition = session.definition();
        Some(SessionView {
            test_id: definition.kind,
            name: &definition.name,
            instructions: &definition.instructions,
            phase: session.phase(),
            trial_index: session.current_trial_index().unwrap_or(0),
            trial_count: definition.trial_count(),
            trial: session.current_trial(),
        })
    }

    /// Feed a raw answer to the live session.
    ///
    /// On the smallest acuity size "smaller" behaves like "too small": the
    /// following `advance` completes the test at 5/5, so a further answer
    /// fails with `InvalidState` because no test is active.
    pub fn submit_response(&mut self, raw_answer: &str) -> Result<Transition> {
        let Some(session) = self.active.as_mut() else {
            return Err(self.idle("submit_response"));
        };
        let trial_index = session.current_trial_index().unwrap_or(0);
        match session.submit_response(raw_answer) {
            Ok(transition) => {
                let event = ActivityEvent::ResponseRecorded {
                    test_id: session.test_kind().id().to_string(),
                    trial_index,
                    is_correct: session.last_response().and_then(|r| r.is_correct),
                };
                self.sink.record(&event);
                Ok(self.settle(transition))
            }
            Err(err) => Err(self.settle_failure(err, trial_index)),
        }
    }

    /// Move the live session past its answered trial.
    pub fn advance(&mut self) -> Result<Transition> {
        let Some(session) = self.active.as_mut() else {
            return Err(self.idle("advance"));
        };
        let trial_index = session.current_trial_index().unwrap_or(0);
        match session.advance() {
            Ok(transition) => Ok(self.settle(transition)),
            Err(err) => Err(self.settle_failure(err, trial_index)),
        }
    }

    /// "Back" mid-test: end the live session and record nothing.
    pub fn abort(&mut self) -> Result<()> {
        if self.active.is_none() {
            return Err(self.idle("abort"));
        }
        self.discard_active(AbortReason::UserBack);
        Ok(())
    }

    /// Record `outcome_text` for `test_id`, replacing any earlier outcome.
    pub fn on_test_complete(
        &mut self,
        test_id: &str,
        outcome_text: impl Into<String>,
    ) -> Result<()> {
        let kind: TestKind = test_id.parse()?;
        self.record_outcome(OutcomeRecord {
            test_id: kind,
            outcome_text: outcome_text.into(),
        });
        Ok(())
    }

    /// Detached copy of the results.
    #[must_use]
    pub fn get_results(&self) -> ResultsMap {
        self.results.clone()
    }

    /// Borrowed read-only results.
    #[must_use]
    pub const fn results(&self) -> &ResultsMap {
        &self.results
    }

    #[must_use]
    pub fn summary(&self) -> ResultsSummary {
        ResultsSummary::build(&self.stimuli, &self.results)
    }

    /// Leave and re-enter the suite: drop the live session and every result.
    pub fn reset(&mut self) {
        self.discard_active(AbortReason::SuiteReset);
        let cleared = self.results.clear();
        self.sink.record(&ActivityEvent::ResultsReset { cleared });
    }

    fn settle(&mut self, transition: Transition) -> Transition {
        if let Transition::Completed(record) = &transition {
            self.record_outcome(record.clone());
        }
        transition
    }

    fn record_outcome(&mut self, record: OutcomeRecord) {
        self.active = None;
        self.sink.record(&ActivityEvent::TestCompleted {
            test_id: record.test_id.id().to_string(),
            outcome: record.outcome_text.clone(),
        });
        self.results.upsert(record);
    }

    /// Drop a session the controller has already torn down.
    fn settle_failure(&mut self, err: SuiteError, trial_index: usize) -> SuiteError {
        let torn_down = self
            .active
            .as_ref()
            .filter(|s| s.phase() == SessionPhase::Aborted)
            .map(TestSessionController::test_kind);
        if let Some(kind) = torn_down {
            self.active = None;
            self.sink.record(&ActivityEvent::TestAborted {
                test_id: kind.id().to_string(),
                trial_index,
                reason: AbortReason::ContractViolation,
            });
            self.sink.record(&ActivityEvent::ContractViolation {
                code: err.code().to_string(),
                message: err.to_string(),
            });
        }
        err
    }

    fn discard_active(&mut self, reason: AbortReason) {
        let Some(mut session) = self.active.take() else {
            return;
        };
        let trial_index = session.current_trial_index().unwrap_or(0);
        if session.abort().is_ok() {
            self.sink.record(&ActivityEvent::TestAborted {
                test_id: session.test_kind().id().to_string(),
                trial_index,
                reason,
            });
        }
    }

    fn idle(&mut self, operation: &'static str) -> SuiteError {
        let err = SuiteError::InvalidState {
            operation,
            state: "no test is active".to_string(),
        };
        self.sink.record(&ActivityEvent::ContractViolation {
            code: err.code().to_string(),
            message: err.to_string(),
        });
        err
    }
}
