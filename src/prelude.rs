//! Convenience re-exports for library consumers.
//!
//! ```rust,no_run
//! use eye_vision_suite::prelude::*;
//! ```

// Core
pub use crate::core::config::Config;
pub use crate::core::errors::{Result, SuiteError};

// Suite
pub use crate::suite::coordinator::{SessionView, SuiteCoordinator};
pub use crate::suite::results::{OutcomeRecord, ResultsMap, ResultsSummary, ResultsView};
pub use crate::suite::scoring::{ColorVisionScore, ColorVisionTier, ScoringEngine};
pub use crate::suite::session::{SessionPhase, TestSessionController, Transition};
pub use crate::suite::stimulus::{StimulusSet, TestDefinition, TestKind, TrialSpec};

// Logging
pub use crate::logger::activity::{ActivityEvent, ActivitySink, MemorySink, NullSink};

// Analysis
pub use crate::analysis::{
    AnalysisKind, AnalysisReport, Classifier, ClassificationRequest, ClassificationResponse,
    recommendation,
};

// Tips
pub use crate::tips::{TIPS, TipChecklist};
