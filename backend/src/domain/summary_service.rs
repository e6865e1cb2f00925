//! # Summary Service
//!
//! Rolls month entries up into a [`Summary`]. Every function here is pure:
//! no I/O, no state, deterministic. Summaries of disjoint entry sets merge
//! exactly, so group totals can be computed independently (or in parallel)
//! and combined into congregation totals with [`summarize_groups`].

use serde_json::Value;

use crate::domain::models::{MemberMonthEntry, Summary};

/// Summarize a set of entries. An empty set yields an all-zero summary.
pub fn summarize<'a, I>(entries: I) -> Summary
where
    I: IntoIterator<Item = &'a MemberMonthEntry>,
{
    entries.into_iter().fold(Summary::default(), accumulate)
}

/// Summarize raw, loosely shaped documents. Missing or malformed fields
/// contribute zero; this never fails.
pub fn summarize_documents<'a, I>(documents: I) -> Summary
where
    I: IntoIterator<Item = &'a Value>,
{
    documents
        .into_iter()
        .map(|doc| MemberMonthEntry::from_document("", doc))
        .fold(Summary::default(), |acc, entry| accumulate(acc, &entry))
}

/// Combine per-group summaries into one total.
pub fn summarize_groups<I>(summaries: I) -> Summary
where
    I: IntoIterator<Item = Summary>,
{
    summaries.into_iter().sum()
}

fn accumulate(mut acc: Summary, entry: &MemberMonthEntry) -> Summary {
    let studies = entry.bible_studies as u64;
    let hours = entry.hours_aux + entry.hours_regular;

    acc.total_hours_aux += entry.hours_aux;
    acc.total_hours_regular += entry.hours_regular;
    acc.total_bible_studies += studies;
    acc.total_registered += 1;

    if entry.participated {
        acc.total_participated += 1;
        acc.bible_studies_by_participated += studies;
    }
    if entry.auxiliary_pioneer {
        acc.count_aux_pioneers += 1;
        acc.bible_studies_by_aux += studies;
        acc.hours_by_aux_pioneers += hours;
    }
    if entry.regular_pioneer {
        acc.count_regular_pioneers += 1;
        acc.bible_studies_by_regular += studies;
        acc.hours_by_regular_pioneers += hours;
    }
    acc
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn entry(id: &str) -> MemberMonthEntry {
        MemberMonthEntry::blank(id, id)
    }

    #[test]
    fn test_empty_is_all_zero() {
        let entries: Vec<MemberMonthEntry> = Vec::new();
        assert_eq!(summarize(&entries), Summary::default());
        assert_eq!(summarize_documents(&Vec::<Value>::new()), Summary::default());
    }

    #[test]
    fn test_mixed_entries() {
        let entries = vec![
            MemberMonthEntry {
                hours_aux: 3.0,
                bible_studies: 1,
                ..entry("a")
            },
            MemberMonthEntry {
                bible_studies: 2,
                regular_pioneer: true,
                ..entry("b")
            },
        ];
        let summary = summarize(&entries);
        assert_eq!(summary.total_hours_aux, 3.0);
        assert_eq!(summary.total_bible_studies, 3);
        assert_eq!(summary.bible_studies_by_regular, 2);
        assert_eq!(summary.count_regular_pioneers, 1);
        assert_eq!(summary.total_registered, 2);
        assert_eq!(summary.total_participated, 0);
    }

    #[test]
    fn test_counts_never_exceed_registered() {
        let entries = vec![
            MemberMonthEntry {
                participated: true,
                auxiliary_pioneer: true,
                hours_aux: 15.0,
                bible_studies: 1,
                ..entry("a")
            },
            MemberMonthEntry {
                participated: true,
                regular_pioneer: true,
                hours_regular: 50.5,
                ..entry("b")
            },
            entry("c"),
        ];
        let summary = summarize(&entries);
        assert_eq!(summary.total_registered, 3);
        assert_eq!(summary.total_participated, 2);
        assert!(summary.count_aux_pioneers <= summary.total_registered);
        assert!(summary.count_regular_pioneers <= summary.total_registered);
        assert_eq!(summary.hours_by_aux_pioneers, 15.0);
        assert_eq!(summary.hours_by_regular_pioneers, 50.5);
        assert_eq!(summary.bible_studies_by_participated, 1);
        assert_eq!(summary.bible_studies_by_aux, 1);
    }

    #[test]
    fn test_malformed_documents_contribute_zero() {
        let docs = vec![
            json!({"hoursAux": "3", "bibleStudies": 1}),
            json!({"hoursAux": null, "bibleStudies": "two", "regularPioneer": true}),
            json!("not an object"),
            json!({"hoursRegular": -8, "participated": 1}),
        ];
        let summary = summarize_documents(&docs);
        assert_eq!(summary.total_hours_aux, 3.0);
        assert_eq!(summary.total_hours_regular, 0.0);
        assert_eq!(summary.total_bible_studies, 1);
        assert_eq!(summary.count_regular_pioneers, 1);
        assert_eq!(summary.total_participated, 1);
        assert_eq!(summary.total_registered, 4);
    }

    #[test]
    fn test_partitioned_summaries_merge_to_whole() {
        let entries: Vec<MemberMonthEntry> = (0..7)
            .map(|i| MemberMonthEntry {
                participated: i % 2 == 0,
                auxiliary_pioneer: i % 3 == 0,
                bible_studies: i,
                hours_aux: i as f64 * 0.5,
                ..entry(&i.to_string())
            })
            .collect();

        let whole = summarize(&entries);
        let (left, right) = entries.split_at(3);
        let merged = summarize_groups(vec![summarize(left), summarize(right)]);
        assert_eq!(whole, merged);
    }
}
