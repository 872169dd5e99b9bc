//! Daily eye-care tips and a checklist of the ones done today.

#![allow(missing_docs)]

use std::collections::BTreeSet;

use serde::Serialize;

use crate::core::errors::{Result, SuiteError};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Tip {
    pub title: &'static str,
    pub description: &'static str,
}

pub const TIPS: [Tip; 5] = [
    Tip {
        title: "20-20-20 Rule",
        description: "Every 20 minutes, look at something 20 feet away for 20 seconds",
    },
    Tip {
        title: "Proper Lighting",
        description: "Ensure adequate lighting when reading or using digital devices",
    },
    Tip {
        title: "Wear Sunglasses",
        description: "Protect your eyes from harmful UV rays with quality sunglasses",
    },
    Tip {
        title: "Stay Hydrated",
        description: "Drink plenty of water to keep your eyes moist and comfortable",
    },
    Tip {
        title: "Regular Eye Exams",
        description: "Get comprehensive eye exams every 1-2 years",
    },
];

/// Which tips have been ticked off. Indices refer to [`TIPS`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct TipChecklist {
    completed: BTreeSet<usize>,
}

impl TipChecklist {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Flip tip `index`; returns whether it is now completed.
    pub fn toggle(&mut self, index: usize) -> Result<bool> {
        check_index(index)?;
        if self.completed.remove(&index) {
            Ok(false)
        } else {
            self.completed.insert(index);
            Ok(true)
        }
    }

    pub fn is_completed(&self, index: usize) -> Result<bool> {
        check_index(index)?;
        Ok(self.completed.contains(&index))
    }

    #[must_use]
    pub fn completed_count(&self) -> usize {
        self.completed.len()
    }

    /// Completed share in `[0, 1]`.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn progress(&self) -> f64 {
        self.completed.len() as f64 / TIPS.len() as f64
    }

    /// Tips paired with their completion flag, in display order.
    pub fn entries(&self) -> impl Iterator<Item = (usize, &'static Tip, bool)> + '_ {
        TIPS.iter()
            .enumerate()
            .map(|(i, tip)| (i, tip, self.completed.contains(&i)))
    }
}

fn check_index(index: usize) -> Result<()> {
    if index < TIPS.len() {
        Ok(())
    } else {
        Err(SuiteError::NotFound {
            kind: "tip",
            id: index.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn toggle_flips_membership() {
        let mut list = TipChecklist::new();
        assert!(list.toggle(2).unwrap());
        assert!(list.is_completed(2).unwrap());
        assert!(!list.toggle(2).unwrap());
        assert_eq!(list.completed_count(), 0);
    }

    #[test]
    fn progress_is_fraction_of_five() {
        let mut list = TipChecklist::new();
        list.toggle(0).unwrap();
        list.toggle(4).unwrap();
        assert!((list.progress() - 0.4).abs() < 1e-9);
    }

    #[test]
    fn out_of_range_index_is_not_found() {
        let mut list = TipChecklist::new();
        assert_eq!(list.toggle(5).unwrap_err().code(), "EVS-2001");
        assert!(list.is_completed(9).is_err());
    }

    #[test]
    fn entries_follow_display_order() {
        let mut list = TipChecklist::new();
        list.toggle(1).unwrap();
        let flags: Vec<bool> = list.entries().map(|(_, _, done)| done).collect();
        assert_eq!(flags, vec![false, true, false, false, false]);
        assert_eq!(list.entries().next().unwrap().1.title, "20-20-20 Rule");
    }
}
