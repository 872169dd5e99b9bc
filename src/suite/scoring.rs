//! Outcome scoring: turns captured responses into the outcome text of a test.
//!
//! Color plates are classified by the share of correct answers; the acuity
//! ladder reports the size reached; fixed-choice tests report the label of
//! the option picked.

#![allow(clippy::cast_precision_loss)]

use serde::Serialize;

use crate::core::errors::{Result, SuiteError};
use crate::suite::session::{AcuityAnswer, TrialResponse, resolve_choice};
use crate::suite::stimulus::{ACUITY_MAX_STEPS, StimulusSet, TestDefinition, TrialSpec};

/// Lowest percentage still classified as normal color vision.
pub const NORMAL_MIN_PCT: usize = 80;

/// Lowest percentage classified as a mild deficiency.
pub const MILD_MIN_PCT: usize = 60;

/// Color vision classification tiers, best first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ColorVisionTier {
    /// At least 80% of plates read correctly.
    Normal,
    /// 60% up to 80%.
    Mild,
    /// Below 60%.
    Significant,
}

impl ColorVisionTier {
    /// First matching threshold wins. Compared in integers so 12/15 is exactly 80%.
    #[must_use]
    pub const fn classify(correct: usize, total: usize) -> Self {
        let scaled = correct.saturating_mul(100);
        if total > 0 && scaled >= NORMAL_MIN_PCT * total {
            Self::Normal
        } else if total > 0 && scaled >= MILD_MIN_PCT * total {
            Self::Mild
        } else {
            Self::Significant
        }
    }
}

/// Result of scoring a full set of color plates.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ColorVisionScore {
    /// Plates read correctly.
    pub correct: usize,
    /// Plates shown.
    pub total: usize,
    /// `correct / total` as a percentage, for display only.
    pub percentage: f64,
    /// Band decided in integer arithmetic.
    pub tier: ColorVisionTier,
}

impl ColorVisionScore {
    /// Score `correct` plates out of `total`.
    #[must_use]
    pub fn new(correct: usize, total: usize) -> Self {
        let percentage = if total == 0 {
            0.0
        } else {
            correct as f64 / total as f64 * 100.0
        };
        Self {
            correct,
            total,
            percentage,
            tier: ColorVisionTier::classify(correct, total),
        }
    }

    /// Human-readable outcome; always carries the literal `correct/total` fraction.
    #[must_use]
    pub fn outcome_text(&self) -> String {
        let fraction = format!("{}/{}", self.correct, self.total);
        match self.tier {
            ColorVisionTier::Normal => format!("Normal color vision ({fraction} correct)"),
            ColorVisionTier::Mild => format!("Mild color vision deficiency ({fraction} correct)"),
            ColorVisionTier::Significant => format!(
                "Significant color vision deficiency detected ({fraction} correct) - Consider consulting an eye care professional"
            ),
        }
    }
}

/// Outcome text for an acuity run that reached `reached` (1-based) steps.
#[must_use]
pub fn acuity_outcome(reached: usize) -> String {
    format!("Readable down to size {reached}/{ACUITY_MAX_STEPS}")
}

/// Stateless scoring engine.
#[derive(Debug, Clone, Copy, Default)]
pub struct ScoringEngine;

impl ScoringEngine {
    #[must_use]
    pub const fn new() -> Self {
        Self
    }

    /// Score a completed test looked up by id.
    pub fn score_by_id(
        &self,
        stimuli: &StimulusSet,
        test_id: &str,
        responses: &[TrialResponse],
    ) -> Result<String> {
        let definition = stimuli.get_definition(test_id)?;
        self.score(definition, responses)
    }

    /// Score a completed test.
    pub fn score(
        &self,
        definition: &TestDefinition,
        responses: &[TrialResponse],
    ) -> Result<String> {
        match definition.trials.first() {
            Some(TrialSpec::ColorPlate { .. }) => {
                let total = definition.trial_count();
                if responses.len() != total {
                    return Err(SuiteError::InvalidState {
                        operation: "score",
                        state: format!("{} of {total} plates answered", responses.len()),
                    });
                }
                Ok(self.color_plates(total, responses).outcome_text())
            }
            Some(TrialSpec::AcuityStep { .. }) => Self::acuity(definition, responses),
            Some(TrialSpec::FixedChoice { .. }) => Self::fixed_choice(definition, responses),
            None => Err(SuiteError::InvalidState {
                operation: "score",
                state: format!("{} has no trials", definition.id()),
            }),
        }
    }

    /// Count correct plates. Skipped plates are scored as incorrect, never excluded.
    #[must_use]
    pub fn color_plates(&self, total: usize, responses: &[TrialResponse]) -> ColorVisionScore {
        let correct = responses
            .iter()
            .filter(|r| r.is_correct == Some(true))
            .count();
        ColorVisionScore::new(correct, total)
    }

    fn acuity(definition: &TestDefinition, responses: &[TrialResponse]) -> Result<String> {
        let Some(last) = responses.last() else {
            return Err(SuiteError::InvalidState {
                operation: "score",
                state: "no acuity response recorded".to_string(),
            });
        };
        let terminal = match AcuityAnswer::parse(&last.raw_answer) {
            Some(AcuityAnswer::TooSmall) => true,
            Some(AcuityAnswer::Smaller) => last.trial_index + 1 == definition.trial_count(),
            None => false,
        };
        if !terminal {
            return Err(SuiteError::InvalidState {
                operation: "score",
                state: format!("acuity run still open at size {}", last.trial_index + 1),
            });
        }
        Ok(acuity_outcome(last.trial_index + 1))
    }

    fn fixed_choice(definition: &TestDefinition, responses: &[TrialResponse]) -> Result<String> {
        let [response] = responses else {
            return Err(SuiteError::InvalidState {
                operation: "score",
                state: format!("{} responses for a single-choice test", responses.len()),
            });
        };
        let Some(TrialSpec::FixedChoice { option_a, option_b }) = definition.trial(0) else {
            return Err(SuiteError::unknown_test(definition.id()));
        };
        resolve_choice(option_a, option_b, &response.raw_answer)
            .map(|option| option.outcome.clone())
            .ok_or_else(|| SuiteError::InvalidResponse {
                test_id: definition.id().to_string(),
                answer: response.raw_answer.clone(),
                details: "matches neither option".to_string(),
            })
    }
}
