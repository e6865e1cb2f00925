//! Roster members and their stable ids.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use unicode_normalization::char::is_combining_mark;
use unicode_normalization::UnicodeNormalization;

/// Highest numeric suffix tried when a derived member id is already taken.
pub const MAX_ID_SUFFIX: u32 = 50;

/// Longest display name accepted for a member.
pub const MAX_NAME_LENGTH: usize = 100;

/// Fallback id for names that normalize to nothing.
const EMPTY_NAME_ID: &str = "member";

/// A person on a group's persistent roster, independent of any month.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MemberRecord {
    pub id: String,
    pub name: String,
    /// Inactive members keep their history but are left out of new months.
    pub active: bool,
    pub moved_from: Option<String>,
    pub moved_to: Option<String>,
    pub moved_at: Option<DateTime<Utc>>,
}

impl MemberRecord {
    /// New active member whose id is derived from the display name.
    pub fn new(name: &str) -> Self {
        Self::with_id(member_id_from_name(name), name)
    }

    pub fn with_id(id: String, name: &str) -> Self {
        Self {
            id,
            name: name.trim().to_string(),
            active: true,
            moved_from: None,
            moved_to: None,
            moved_at: None,
        }
    }
}

/// Derive a member id from a display name.
///
/// Lowercases, strips accents, collapses every run of non-alphanumeric
/// characters into one `-` and trims dashes from both ends, so that
/// "José  María" and "jose maria" map to the same `jose-maria`.
pub fn member_id_from_name(name: &str) -> String {
    let mut id = String::with_capacity(name.len());
    let mut pending_dash = false;

    for c in strip_accents(name).chars() {
        match fold_char(c) {
            Some(folded) => {
                if pending_dash && !id.is_empty() {
                    id.push('-');
                }
                pending_dash = false;
                id.push(folded);
            }
            None => pending_dash = true,
        }
    }

    if id.is_empty() {
        EMPTY_NAME_ID.to_string()
    } else {
        id
    }
}

/// Trimmed display name, or `None` when it is blank or longer than
/// [`MAX_NAME_LENGTH`] characters.
pub fn clean_display_name(name: &str) -> Option<String> {
    let trimmed = name.trim();
    if trimmed.is_empty() || trimmed.chars().count() > MAX_NAME_LENGTH {
        None
    } else {
        Some(trimmed.to_string())
    }
}

/// First id derived from `name` that `is_taken` rejects neither as the bare
/// id nor with a `-2` .. `-50` suffix.
pub fn unique_member_id<F>(name: &str, is_taken: F) -> Option<String>
where
    F: Fn(&str) -> bool,
{
    let base = member_id_from_name(name);
    if !is_taken(&base) {
        return Some(base);
    }
    (2..=MAX_ID_SUFFIX)
        .map(|n| format!("{}-{}", base, n))
        .find(|candidate| !is_taken(candidate))
}

/// Drop diacritics by decomposing to NFD and removing combining marks.
/// Case is kept; characters without a decomposition pass through.
pub fn strip_accents(text: &str) -> String {
    text.nfd().filter(|c| !is_combining_mark(*c)).collect()
}

/// Map one character to its lowercase ASCII form, or `None` for separators.
fn fold_char(c: char) -> Option<char> {
    if c.is_ascii_alphanumeric() {
        Some(c.to_ascii_lowercase())
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_member_id_from_name() {
        assert_eq!(member_id_from_name("Ana"), "ana");
        assert_eq!(member_id_from_name("José María"), "jose-maria");
        assert_eq!(member_id_from_name("  João   da Conceição "), "joao-da-conceicao");
        assert_eq!(member_id_from_name("Ana-Maria #2"), "ana-maria-2");
        assert_eq!(member_id_from_name("O'Neil"), "o-neil");
    }

    #[test]
    fn test_member_id_is_stable_across_spellings() {
        assert_eq!(member_id_from_name("ANA MARIA"), member_id_from_name("ana   maria"));
        assert_eq!(member_id_from_name("Conceição"), member_id_from_name("conceicao"));
    }

    #[test]
    fn test_member_id_for_empty_name() {
        assert_eq!(member_id_from_name(""), "member");
        assert_eq!(member_id_from_name(" -- "), "member");
    }

    #[test]
    fn test_unique_member_id_uses_suffixes() {
        let taken: HashSet<&str> = ["ana", "ana-2"].into_iter().collect();
        assert_eq!(unique_member_id("Ana", |id| taken.contains(id)), Some("ana-3".to_string()));
        assert_eq!(unique_member_id("Bia", |id| taken.contains(id)), Some("bia".to_string()));
    }

    #[test]
    fn test_clean_display_name() {
        assert_eq!(clean_display_name("  Ana  "), Some("Ana".to_string()));
        assert_eq!(clean_display_name("   "), None);
        assert_eq!(clean_display_name(&"é".repeat(100)).map(|n| n.chars().count()), Some(100));
        assert_eq!(clean_display_name(&"a".repeat(101)), None);
    }

    #[test]
    fn test_strip_accents_keeps_case() {
        assert_eq!(strip_accents("Conceição ÁVILA"), "Conceicao AVILA");
        assert_eq!(strip_accents("Šťastný Łukasz"), "Stastny Łukasz");
    }

    #[test]
    fn test_member_id_strips_accents_beyond_latin1() {
        assert_eq!(member_id_from_name("Antonín Dvořák"), "antonin-dvorak");
        assert_eq!(member_id_from_name("Šimon"), "simon");
        assert_eq!(member_id_from_name("Żaneta Ćwik"), "zaneta-cwik");
        assert_eq!(member_id_from_name("Ōtsuka Ā"), "otsuka-a");
    }

    #[test]
    fn test_unique_member_id_gives_up() {
        assert_eq!(unique_member_id("Ana", |_| true), None);
    }

    #[test]
    fn test_new_member_is_active() {
        let member = MemberRecord::new(" Ana Maria ");
        assert_eq!(member.id, "ana-maria");
        assert_eq!(member.name, "Ana Maria");
        assert!(member.active);
        assert!(member.moved_from.is_none());
    }
}
