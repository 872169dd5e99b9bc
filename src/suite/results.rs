//! Completed-test outcomes and their read-only projections.

#![allow(missing_docs)]

use std::collections::HashMap;

use serde::Serialize;

use crate::core::errors::Result;
use crate::suite::stimulus::{StimulusSet, TestKind};

/// Final outcome of one completed test. Immutable once produced.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OutcomeRecord {
    pub test_id: TestKind,
    pub outcome_text: String,
}

/// Outcomes keyed by test. At most one entry per test; a rerun replaces it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct ResultsMap {
    entries: HashMap<TestKind, OutcomeRecord>,
}

impl ResultsMap {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace any prior record for the same test. Returns the replaced one.
    pub(crate) fn upsert(&mut self, record: OutcomeRecord) -> Option<OutcomeRecord> {
        self.entries.insert(record.test_id, record)
    }

    pub(crate) fn clear(&mut self) -> usize {
        let cleared = self.entries.len();
        self.entries.clear();
        cleared
    }

    #[must_use]
    pub fn get(&self, kind: TestKind) -> Option<&OutcomeRecord> {
        self.entries.get(&kind)
    }

    /// Lookup by string id; unknown ids simply have no record.
    #[must_use]
    pub fn get_by_id(&self, test_id: &str) -> Option<&OutcomeRecord> {
        test_id
            .parse::<TestKind>()
            .ok()
            .and_then(|kind| self.get(kind))
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &OutcomeRecord> {
        self.entries.values()
    }

    /// Pretty JSON object keyed by test id.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

/// Read-only contract the display layer consumes.
pub trait ResultsView {
    fn outcome(&self, kind: TestKind) -> Option<&str>;

    fn is_completed(&self, kind: TestKind) -> bool {
        self.outcome(kind).is_some()
    }

    /// Completed tests in catalogue order.
    fn completed(&self) -> Vec<TestKind> {
        TestKind::ALL
            .into_iter()
            .filter(|kind| self.is_completed(*kind))
            .collect()
    }

    /// Every test in the suite has an outcome.
    fn is_suite_complete(&self) -> bool {
        TestKind::ALL.into_iter().all(|kind| self.is_completed(kind))
    }
}

impl ResultsView for ResultsMap {
    fn outcome(&self, kind: TestKind) -> Option<&str> {
        self.get(kind).map(|r| r.outcome_text.as_str())
    }
}

/// One row of the results summary.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SummaryLine {
    pub test_id: TestKind,
    pub name: String,
    pub outcome_text: String,
}

/// Display-ready summary of a results view.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResultsSummary {
    pub lines: Vec<SummaryLine>,
    pub completed: usize,
    pub total: usize,
    pub suite_complete: bool,
}

impl ResultsSummary {
    #[must_use]
    pub fn build(stimuli: &StimulusSet, results: &impl ResultsView) -> Self {
        let lines: Vec<SummaryLine> = stimuli
            .definitions()
            .iter()
            .filter_map(|def| {
                results.outcome(def.kind).map(|text| SummaryLine {
                    test_id: def.kind,
                    name: def.name.clone(),
                    outcome_text: text.to_string(),
                })
            })
            .collect();
        Self {
            completed: lines.len(),
            total: stimuli.definitions().len(),
            suite_complete: results.is_suite_complete(),
            lines,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(kind: TestKind, text: &str) -> OutcomeRecord {
        OutcomeRecord {
            test_id: kind,
            outcome_text: text.to_string(),
        }
    }

    #[test]
    fn upsert_replaces_whole_record() {
        let mut map = ResultsMap::new();
        assert!(map.upsert(record(TestKind::Contrast, "first")).is_none());
        let prior = map.upsert(record(TestKind::Contrast, "second"));
        assert_eq!(prior.unwrap().outcome_text, "first");
        assert_eq!(map.len(), 1);
        assert_eq!(map.outcome(TestKind::Contrast), Some("second"));
    }

    #[test]
    fn get_by_id_ignores_unknown_ids() {
        let mut map = ResultsMap::new();
        map.upsert(record(TestKind::Amsler, "No macular issues detected"));
        assert!(map.get_by_id("amsler").is_some());
        assert!(map.get_by_id("hearing").is_none());
    }

    #[test]
    fn completed_follows_catalogue_order() {
        let mut map = ResultsMap::new();
        map.upsert(record(TestKind::Amsler, "x"));
        map.upsert(record(TestKind::VisualAcuity, "y"));
        assert_eq!(
            map.completed(),
            vec![TestKind::VisualAcuity, TestKind::Amsler]
        );
        assert!(!map.is_suite_complete());
    }

    #[test]
    fn suite_complete_needs_every_test() {
        let mut map = ResultsMap::new();
        for kind in TestKind::ALL {
            map.upsert(record(kind, "done"));
        }
        assert!(map.is_suite_complete());
        assert_eq!(map.clear(), 6);
        assert!(map.is_empty());
    }

    #[test]
    fn json_is_keyed_by_test_id() {
        let mut map = ResultsMap::new();
        map.upsert(record(TestKind::ColorBlind, "Normal color vision (15/15 correct)"));
        let json: serde_json::Value = serde_json::from_str(&map.to_json().unwrap()).unwrap();
        assert_eq!(
            json["color-blind"]["outcome_text"],
            "Normal color vision (15/15 correct)"
        );
        assert_eq!(json["color-blind"]["test_id"], "color-blind");
    }

    #[test]
    fn summary_uses_display_names() {
        let stimuli = StimulusSet::standard();
        let mut map = ResultsMap::new();
        map.upsert(record(TestKind::Peripheral, "Normal peripheral vision"));
        let summary = ResultsSummary::build(&stimuli, &map);
        assert_eq!(summary.completed, 1);
        assert_eq!(summary.total, 6);
        assert!(!summary.suite_complete);
        assert_eq!(summary.lines[0].name, "Peripheral Vision");
    }
}
