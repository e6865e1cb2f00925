//! Totals and counts rolled up from month entries.

use serde::{Deserialize, Serialize};
use std::iter::Sum;
use std::ops::Add;

/// Aggregate of a set of month entries. Every field is a plain reduction, so
/// two summaries of disjoint entry sets merge into the summary of their union.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Summary {
    pub total_hours_aux: f64,
    pub total_hours_regular: f64,
    pub total_bible_studies: u64,
    pub count_aux_pioneers: usize,
    pub count_regular_pioneers: usize,
    /// Number of entries, i.e. the roster size for the month.
    pub total_registered: usize,
    pub total_participated: usize,
    pub bible_studies_by_regular: u64,
    pub bible_studies_by_aux: u64,
    pub bible_studies_by_participated: u64,
    /// Both hour fields summed over auxiliary pioneers.
    pub hours_by_aux_pioneers: f64,
    /// Both hour fields summed over regular pioneers.
    pub hours_by_regular_pioneers: f64,
}

impl Summary {
    pub fn merge(self, other: Summary) -> Summary {
        Summary {
            total_hours_aux: self.total_hours_aux + other.total_hours_aux,
            total_hours_regular: self.total_hours_regular + other.total_hours_regular,
            total_bible_studies: self.total_bible_studies + other.total_bible_studies,
            count_aux_pioneers: self.count_aux_pioneers + other.count_aux_pioneers,
            count_regular_pioneers: self.count_regular_pioneers + other.count_regular_pioneers,
            total_registered: self.total_registered + other.total_registered,
            total_participated: self.total_participated + other.total_participated,
            bible_studies_by_regular: self.bible_studies_by_regular + other.bible_studies_by_regular,
            bible_studies_by_aux: self.bible_studies_by_aux + other.bible_studies_by_aux,
            bible_studies_by_participated: self.bible_studies_by_participated
                + other.bible_studies_by_participated,
            hours_by_aux_pioneers: self.hours_by_aux_pioneers + other.hours_by_aux_pioneers,
            hours_by_regular_pioneers: self.hours_by_regular_pioneers + other.hours_by_regular_pioneers,
        }
    }

    /// Copy with hour totals rounded to one decimal place, for display and
    /// exports. Merge raw summaries, never rounded ones.
    pub fn rounded(&self) -> Summary {
        Summary {
            total_hours_aux: round1(self.total_hours_aux),
            total_hours_regular: round1(self.total_hours_regular),
            hours_by_aux_pioneers: round1(self.hours_by_aux_pioneers),
            hours_by_regular_pioneers: round1(self.hours_by_regular_pioneers),
            ..self.clone()
        }
    }

    pub fn is_empty(&self) -> bool {
        self.total_registered == 0
    }
}

impl Add for Summary {
    type Output = Summary;

    fn add(self, rhs: Summary) -> Summary {
        self.merge(rhs)
    }
}

impl Sum for Summary {
    fn sum<I: Iterator<Item = Summary>>(iter: I) -> Summary {
        iter.fold(Summary::default(), Summary::merge)
    }
}

fn round1(n: f64) -> f64 {
    (n * 10.0).round() / 10.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_all_zero() {
        let summary = Summary::default();
        assert!(summary.is_empty());
        assert_eq!(summary.total_hours_aux, 0.0);
        assert_eq!(summary.total_bible_studies, 0);
        assert_eq!(summary.count_regular_pioneers, 0);
    }

    #[test]
    fn test_merge_adds_every_field() {
        let a = Summary {
            total_hours_aux: 3.0,
            total_bible_studies: 1,
            total_registered: 1,
            bible_studies_by_participated: 1,
            ..Default::default()
        };
        let b = Summary {
            total_hours_regular: 50.0,
            total_bible_studies: 2,
            count_regular_pioneers: 1,
            total_registered: 1,
            bible_studies_by_regular: 2,
            hours_by_regular_pioneers: 50.0,
            ..Default::default()
        };
        let merged = a.clone() + b.clone();
        assert_eq!(merged.total_hours_aux, 3.0);
        assert_eq!(merged.total_hours_regular, 50.0);
        assert_eq!(merged.total_bible_studies, 3);
        assert_eq!(merged.total_registered, 2);
        assert_eq!(merged.count_regular_pioneers, 1);
        assert_eq!(merged, vec![a, b].into_iter().sum::<Summary>());
    }

    #[test]
    fn test_rounded_only_touches_hours() {
        let summary = Summary {
            total_hours_aux: 10.04,
            total_hours_regular: 2.25,
            total_bible_studies: 7,
            ..Default::default()
        };
        let rounded = summary.rounded();
        assert_eq!(rounded.total_hours_aux, 10.0);
        assert_eq!(rounded.total_hours_regular, 2.3);
        assert_eq!(rounded.total_bible_studies, 7);
    }
}
