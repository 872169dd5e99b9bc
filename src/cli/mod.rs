//! Terminal front end shared by the `eyesuite` binary.

pub mod prompt;

pub use prompt::{PromptError, PromptOptions, RunEnd, run_suite, run_test, write_summary};
