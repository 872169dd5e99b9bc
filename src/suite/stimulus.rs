//! Immutable trial content for every test in the suite.
//!
//! The catalogue is fixed at build time: six test kinds, each with an ordered
//! list of [`TrialSpec`] values. Lookups by string id fail with `NotFound`.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::core::errors::{Result, SuiteError};

/// Font sizes of the acuity optotype, largest first.
pub const ACUITY_SIZES_PX: [u16; 5] = [48, 36, 24, 18, 12];

/// Number of steps on the acuity ladder.
pub const ACUITY_MAX_STEPS: usize = ACUITY_SIZES_PX.len();

/// Answer every viewer with working vision should give on the control plate.
pub const CONTROL_PLATE_ANSWER: &str = "12";

/// Ishihara plates in presentation order: (image, expected answer).
const ISHIHARA_PLATES: [(&str, &str); 15] = [
    ("plate1.png", "45"),
    ("plate2.png", "42"),
    ("plate3.png", "5"),
    ("plate4.png", "57"),
    ("plate5.png", "6"),
    ("plate6.png", "5"),
    ("plate7.png", "74"),
    ("plate8.png", "15"),
    ("plate9.png", "3"),
    ("plate10.png", "5"),
    ("plate11.png", "57"),
    ("plate12.png", "29"),
    ("plate13.png", "6"),
    ("plate14.png", "8"),
    ("plate15.png", CONTROL_PLATE_ANSWER),
];

/// Closed set of tests in the suite.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TestKind {
    /// Shrinking letter ladder.
    VisualAcuity,
    /// Ishihara plates.
    ColorBlind,
    /// Radial line chart.
    Astigmatism,
    /// Low-contrast letters.
    Contrast,
    /// Fixation dot with flashing targets.
    Peripheral,
    /// Macular grid.
    Amsler,
}

impl TestKind {
    /// Catalogue order.
    pub const ALL: [Self; 6] = [
        Self::VisualAcuity,
        Self::ColorBlind,
        Self::Astigmatism,
        Self::Contrast,
        Self::Peripheral,
        Self::Amsler,
    ];

    /// Stable string id used by callers and in results.
    #[must_use]
    pub const fn id(self) -> &'static str {
        match self {
            Self::VisualAcuity => "visual-acuity",
            Self::ColorBlind => "color-blind",
            Self::Astigmatism => "astigmatism",
            Self::Contrast => "contrast",
            Self::Peripheral => "peripheral",
            Self::Amsler => "amsler",
        }
    }

    /// Single-trial kinds whose answer is picked from two fixed options.
    #[must_use]
    pub const fn is_fixed_choice(self) -> bool {
        matches!(self, Self::Astigmatism | Self::Contrast | Self::Peripheral | Self::Amsler)
    }
}

impl fmt::Display for TestKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.id())
    }
}

impl FromStr for TestKind {
    type Err = SuiteError;

    fn from_str(s: &str) -> Result<Self> {
        Self::ALL
            .into_iter()
            .find(|kind| kind.id() == s)
            .ok_or_else(|| SuiteError::unknown_test(s))
    }
}

/// One of the two buttons of a fixed-choice trial.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChoiceOption {
    /// Button text shown to the user.
    pub label: String,
    /// Outcome recorded when this option is picked.
    pub outcome: String,
}

/// Content of a single trial.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TrialSpec {
    /// One rung of the acuity ladder.
    AcuityStep {
        /// Zero-based rung, 0 is the largest letter.
        size_index: usize,
        /// Rendered letter height.
        font_px: u16,
    },
    /// One Ishihara plate.
    ColorPlate {
        /// Plate image file name.
        image: String,
        /// Number a viewer with normal color vision reads.
        expected_answer: String,
        /// Alt text for the plate.
        description: String,
    },
    /// Two-button question whose chosen option is the outcome.
    FixedChoice {
        /// First button.
        option_a: ChoiceOption,
        /// Second button.
        option_b: ChoiceOption,
    },
}

/// A test in the catalogue.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TestDefinition {
    /// Which test this is.
    pub kind: TestKind,
    /// Display name, e.g. "Visual Acuity".
    pub name: String,
    /// One-line summary for menus.
    pub description: String,
    /// What the user is asked on every trial.
    pub instructions: String,
    /// Trials in presentation order; never empty.
    pub trials: Vec<TrialSpec>,
}

impl TestDefinition {
    /// Same as `kind.id()`.
    #[must_use]
    pub const fn id(&self) -> &'static str {
        self.kind.id()
    }

    /// Number of trials.
    #[must_use]
    pub fn trial_count(&self) -> usize {
        self.trials.len()
    }

    /// Trial at `index`, if any.
    #[must_use]
    pub fn trial(&self, index: usize) -> Option<&TrialSpec> {
        self.trials.get(index)
    }
}

/// Read-only catalogue of test definitions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StimulusSet {
    definitions: Vec<TestDefinition>,
}

impl Default for StimulusSet {
    fn default() -> Self {
        Self::standard()
    }
}

impl StimulusSet {
    /// The six-test suite.
    #[must_use]
    pub fn standard() -> Self {
        Self {
            definitions: TestKind::ALL.into_iter().map(build_definition).collect(),
        }
    }

    /// All definitions in catalogue order.
    #[must_use]
    pub fn definitions(&self) -> &[TestDefinition] {
        &self.definitions
    }

    /// Look up a definition by its string id.
    pub fn get_definition(&self, test_id: &str) -> Result<&TestDefinition> {
        let kind: TestKind = test_id.parse()?;
        self.definition(kind)
    }

    /// Look up a definition by kind.
    pub fn definition(&self, kind: TestKind) -> Result<&TestDefinition> {
        self.definitions
            .iter()
            .find(|d| d.kind == kind)
            .ok_or_else(|| SuiteError::unknown_test(kind.id()))
    }
}

fn build_definition(kind: TestKind) -> TestDefinition {
    match kind {
        TestKind::VisualAcuity => TestDefinition {
            kind,
            name: "Visual Acuity".to_string(),
            description: "Test sharpness of vision".to_string(),
            instructions: "Can you read this letter?".to_string(),
            trials: ACUITY_SIZES_PX
                .iter()
                .enumerate()
                .map(|(size_index, &font_px)| TrialSpec::AcuityStep {
                    size_index,
                    font_px,
                })
                .collect(),
        },
        TestKind::ColorBlind => TestDefinition {
            kind,
            name: "Color Blindness".to_string(),
            description: "Detect color vision deficiencies".to_string(),
            instructions:
                "What number or shape do you see? (Enter \"nothing\" if you don't see anything)"
                    .to_string(),
            trials: ISHIHARA_PLATES
                .iter()
                .map(|&(image, answer)| TrialSpec::ColorPlate {
                    image: image.to_string(),
                    expected_answer: answer.to_string(),
                    description: if answer == CONTROL_PLATE_ANSWER {
                        "Control plate - everyone should see 12".to_string()
                    } else {
                        "Red-green deficiency test".to_string()
                    },
                })
                .collect(),
        },
        TestKind::Astigmatism => fixed_choice(
            kind,
            "Astigmatism",
            "Check for corneal irregularities",
            "Do all the lines appear equally dark and sharp?",
            ("All lines look the same", "No signs of astigmatism"),
            (
                "Some lines are darker/blurrier",
                "Possible astigmatism detected",
            ),
        ),
        TestKind::Contrast => fixed_choice(
            kind,
            "Contrast Sensitivity",
            "Assess low-light vision",
            "Can you see the letter 'C' in this low-contrast image?",
            ("Yes, I can see it", "Good contrast sensitivity"),
            ("No, it's too faint", "Reduced contrast sensitivity"),
        ),
        TestKind::Peripheral => fixed_choice(
            kind,
            "Peripheral Vision",
            "Evaluate side vision",
            "Cover one eye, focus on the center dot, and check if you can see all four corner dots",
            ("I see all 4 dots", "Normal peripheral vision"),
            ("I can't see all dots", "Reduced peripheral vision"),
        ),
        TestKind::Amsler => fixed_choice(
            kind,
            "Amsler Grid",
            "Screen for macular issues",
            "Cover one eye, focus on the center dot. Do all lines appear straight and uniform?",
            ("All lines are straight", "No macular issues detected"),
            (
                "Some lines are wavy/missing",
                "Possible macular issue - consult doctor",
            ),
        ),
    }
}

fn fixed_choice(
    kind: TestKind,
    name: &str,
    description: &str,
    instructions: &str,
    a: (&str, &str),
    b: (&str, &str),
) -> TestDefinition {
    let option = |(label, outcome): (&str, &str)| ChoiceOption {
        label: label.to_string(),
        outcome: outcome.to_string(),
    };
    TestDefinition {
        kind,
        name: name.to_string(),
        description: description.to_string(),
        instructions: instructions.to_string(),
        trials: vec![TrialSpec::FixedChoice {
            option_a: option(a),
            option_b: option(b),
        }],
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn standard_set_has_six_tests_in_catalogue_order() {
        let set = StimulusSet::standard();
        let ids: Vec<&str> = set.definitions().iter().map(TestDefinition::id).collect();
        assert_eq!(
            ids,
            vec![
                "visual-acuity",
                "color-blind",
                "astigmatism",
                "contrast",
                "peripheral",
                "amsler"
            ]
        );
    }

    #[test]
    fn unknown_id_is_not_found() {
        let set = StimulusSet::standard();
        let err = set.get_definition("x-ray").unwrap_err();
        assert_eq!(err.code(), "EVS-2001");
    }

    #[test]
    fn ids_are_case_sensitive() {
        assert!("Color-Blind".parse::<TestKind>().is_err());
        assert_eq!(
            "color-blind".parse::<TestKind>().unwrap(),
            TestKind::ColorBlind
        );
    }

    #[test]
    fn id_round_trips_through_from_str() {
        for kind in TestKind::ALL {
            assert_eq!(kind.id().parse::<TestKind>().unwrap(), kind);
            assert_eq!(kind.to_string(), kind.id());
        }
    }

    #[test]
    fn serde_id_matches_stable_id() {
        for kind in TestKind::ALL {
            let json = serde_json::to_string(&kind).unwrap();
            assert_eq!(json, format!("\"{}\"", kind.id()));
        }
    }

    #[test]
    fn color_plates_end_with_control_plate() {
        let set = StimulusSet::standard();
        let def = set.definition(TestKind::ColorBlind).unwrap();
        assert_eq!(def.trial_count(), 15);
        match def.trials.last() {
            Some(TrialSpec::ColorPlate {
                expected_answer,
                description,
                ..
            }) => {
                assert_eq!(expected_answer, "12");
                assert!(description.starts_with("Control plate"));
            }
            other => panic!("unexpected last trial: {other:?}"),
        }
    }

    #[test]
    fn acuity_ladder_shrinks() {
        let set = StimulusSet::standard();
        let def = set.definition(TestKind::VisualAcuity).unwrap();
        assert_eq!(def.trial_count(), ACUITY_MAX_STEPS);
        let sizes: Vec<u16> = def
            .trials
            .iter()
            .map(|t| match t {
                TrialSpec::AcuityStep { font_px, .. } => *font_px,
                other => panic!("unexpected trial {other:?}"),
            })
            .collect();
        assert!(sizes.windows(2).all(|w| w[0] > w[1]));
    }

    #[test]
    fn fixed_choice_tests_have_one_trial_with_distinct_outcomes() {
        let set = StimulusSet::standard();
        for kind in TestKind::ALL.into_iter().filter(|k| k.is_fixed_choice()) {
            let def = set.definition(kind).unwrap();
            assert_eq!(def.trial_count(), 1, "{kind}");
            match &def.trials[0] {
                TrialSpec::FixedChoice { option_a, option_b } => {
                    assert_ne!(option_a.outcome, option_b.outcome);
                    assert_ne!(option_a.label, option_b.label);
                }
                other => panic!("unexpected trial {other:?}"),
            }
        }
    }
}
