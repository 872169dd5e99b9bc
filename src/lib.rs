#![forbid(unsafe_code)]

//! Eye Vision Suite: six self-administered vision screening tests, a
//! results map, and the contract of an image classification service.
//!
//! The suite drives one test at a time:
//! 1. **Stimuli** are a fixed catalogue of trials per test
//! 2. **Sessions** walk a test trial by trial and score it on completion
//! 3. **The coordinator** records each outcome, replacing earlier runs
//!
//! # Library usage
//!
//! ```rust,no_run
//! use eye_vision_suite::prelude::*;
//!
//! let mut suite = SuiteCoordinator::default();
//! suite.select_test("astigmatism")?;
//! suite.submit_response("a")?;
//! assert!(suite.results().is_completed(TestKind::Astigmatism));
//! # Ok::<(), SuiteError>(())
//! ```

pub mod prelude;

pub mod analysis;
#[cfg(feature = "cli")]
pub mod cli;
pub mod core;
pub mod logger;
pub mod suite;
pub mod tips;
