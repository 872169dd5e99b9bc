//! The vision test suite: stimuli, per-test sessions, scoring, and the
//! coordinator that ties them to a results map.

pub mod coordinator;
pub mod results;
pub mod scoring;
pub mod session;
pub mod stimulus;

pub use coordinator::{SessionView, SuiteCoordinator};
pub use results::{OutcomeRecord, ResultsMap, ResultsSummary, ResultsView};
pub use session::{SessionPhase, TestSessionController, Transition};
pub use stimulus::{StimulusSet, TestDefinition, TestKind, TrialSpec};
