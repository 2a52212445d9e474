use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RequirementCategory {
    #[serde(rename = "User Requirement")]
    User,
    #[serde(rename = "Functional Requirement")]
    Functional,
    #[serde(rename = "Technical Requirement")]
    Technical,
}

impl RequirementCategory {
    /// Lenient mapping used for model output and spreadsheet cells.
    /// Anything that is not recognisably a user or technical requirement is functional.
    pub fn from_label(label: &str) -> Self {
        let lowered = label.to_lowercase();
        if lowered.contains("user") {
            RequirementCategory::User
        } else if lowered.contains("tech") {
            RequirementCategory::Technical
        } else {
            RequirementCategory::Functional
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            RequirementCategory::User => "User Requirement",
            RequirementCategory::Functional => "Functional Requirement",
            RequirementCategory::Technical => "Technical Requirement",
        }
    }
}

impl fmt::Display for RequirementCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Priority {
    High,
    Medium,
    Low,
}

impl Priority {
    pub fn from_label(label: &str) -> Self {
        let lowered = label.to_lowercase();
        if lowered.contains("high") {
            Priority::High
        } else if lowered.contains("low") {
            Priority::Low
        } else {
            Priority::Medium
        }
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Priority::High => write!(f, "High"),
            Priority::Medium => write!(f, "Medium"),
            Priority::Low => write!(f, "Low"),
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct Requirement {
    pub id: String,
    #[serde(rename = "type")]
    pub category: RequirementCategory,
    pub description: String,
    pub priority: Priority,
}

impl Requirement {
    pub fn new(
        index: usize,
        category: RequirementCategory,
        description: impl Into<String>,
        priority: Priority,
    ) -> Self {
        Self {
            id: requirement_id(index),
            category,
            description: description.into(),
            priority,
        }
    }
}

/// Zero-based index to `REQ-001` style identifiers.
pub fn requirement_id(index: usize) -> String {
    format!("REQ-{:03}", index + 1)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_category_from_label() {
        assert_eq!(RequirementCategory::from_label("User Requirement"), RequirementCategory::User);
        assert_eq!(RequirementCategory::from_label("TECHNICAL"), RequirementCategory::Technical);
        assert_eq!(RequirementCategory::from_label("Functional Requirement"), RequirementCategory::Functional);
        assert_eq!(RequirementCategory::from_label(""), RequirementCategory::Functional);
    }

    #[test]
    fn test_priority_from_label_is_case_insensitive() {
        assert_eq!(Priority::from_label("HIGH"), Priority::High);
        assert_eq!(Priority::from_label("very high"), Priority::High);
        assert_eq!(Priority::from_label("Low"), Priority::Low);
        assert_eq!(Priority::from_label("whatever"), Priority::Medium);
    }

    #[test]
    fn test_requirement_serializes_category_as_type() {
        let requirement = Requirement::new(0, RequirementCategory::Functional, "Login works", Priority::High);
        let value = serde_json::to_value(&requirement).unwrap();
        assert_eq!(value["id"], "REQ-001");
        assert_eq!(value["type"], "Functional Requirement");
        assert_eq!(value["priority"], "High");
    }
}
