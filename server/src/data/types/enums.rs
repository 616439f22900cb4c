//! Classification enums for questionnaire data
//!
//! Stored as lowercase text in the database and serialized the same way
//! over the API.

use std::fmt;

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Kind of input a question expects
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum QuestionType {
    #[default]
    Text,
    Textarea,
    Choice,
    Checkbox,
    Rating,
}

impl QuestionType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Text => "text",
            Self::Textarea => "textarea",
            Self::Choice => "choice",
            Self::Checkbox => "checkbox",
            Self::Rating => "rating",
        }
    }

    /// Parse from the stored representation; unknown values fall back to `Text`
    pub fn parse(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "textarea" => Self::Textarea,
            "choice" => Self::Choice,
            "checkbox" => Self::Checkbox,
            "rating" => Self::Rating,
            _ => Self::Text,
        }
    }

    /// Choice-style questions are meaningless without an option list
    pub fn requires_options(&self) -> bool {
        matches!(self, Self::Choice | Self::Checkbox)
    }
}

impl fmt::Display for QuestionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Role derived from the administrator flag
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum UserRole {
    Admin,
    #[default]
    Stakeholder,
}

impl UserRole {
    pub fn from_is_admin(is_admin: bool) -> Self {
        if is_admin { Self::Admin } else { Self::Stakeholder }
    }

    /// Any value other than "admin" yields a stakeholder
    pub fn parse(s: &str) -> Self {
        if s.eq_ignore_ascii_case("admin") {
            Self::Admin
        } else {
            Self::Stakeholder
        }
    }

    pub fn is_admin(&self) -> bool {
        matches!(self, Self::Admin)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Admin => "admin",
            Self::Stakeholder => "stakeholder",
        }
    }
}

impl fmt::Display for UserRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_question_type_parse() {
        assert_eq!(QuestionType::parse("choice"), QuestionType::Choice);
        assert_eq!(QuestionType::parse("RATING"), QuestionType::Rating);
        assert_eq!(QuestionType::parse("slider"), QuestionType::Text);
        assert_eq!(QuestionType::parse("textarea").as_str(), "textarea");
    }

    #[test]
    fn test_question_type_requires_options() {
        assert!(QuestionType::Choice.requires_options());
        assert!(QuestionType::Checkbox.requires_options());
        assert!(!QuestionType::Text.requires_options());
        assert!(!QuestionType::Rating.requires_options());
    }

    #[test]
    fn test_question_type_serde() {
        let json = serde_json::to_string(&QuestionType::Checkbox).unwrap();
        assert_eq!(json, "\"checkbox\"");
        let parsed: QuestionType = serde_json::from_str("\"textarea\"").unwrap();
        assert_eq!(parsed, QuestionType::Textarea);
    }

    #[test]
    fn test_user_role() {
        assert_eq!(UserRole::from_is_admin(true), UserRole::Admin);
        assert_eq!(UserRole::from_is_admin(false), UserRole::Stakeholder);
        assert_eq!(UserRole::parse("Admin"), UserRole::Admin);
        assert_eq!(UserRole::parse("viewer"), UserRole::Stakeholder);
        assert!(UserRole::Admin.is_admin());
        assert_eq!(UserRole::Stakeholder.to_string(), "stakeholder");
    }
}
