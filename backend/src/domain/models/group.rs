//! Congregation groups.

use serde::{Deserialize, Serialize};

/// A numbered subdivision of the congregation with its own roster.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Group {
    pub id: String,
    pub number: u32,
    #[serde(default)]
    pub supervisor_name: String,
    /// User ids allowed to edit this group's reports.
    #[serde(default)]
    pub editors: Vec<String>,
}

impl Group {
    /// Display label such as `Group 3 - Maria Silva`.
    pub fn label(&self) -> String {
        if self.supervisor_name.trim().is_empty() {
            format!("Group {}", self.number)
        } else {
            format!("Group {} - {}", self.number, self.supervisor_name.trim())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_label() {
        let mut group = Group {
            id: "g3".to_string(),
            number: 3,
            supervisor_name: "Maria Silva".to_string(),
            editors: vec![],
        };
        assert_eq!(group.label(), "Group 3 - Maria Silva");
        group.supervisor_name = "  ".to_string();
        assert_eq!(group.label(), "Group 3");
    }
}
