// src/issues.rs

//! Migration issue reporting
//!
//! Non-fatal problems found while converting or importing a cartridge are
//! collected here and handed back to the caller when the run completes.
//! The list is append-only and owned by a single run.

use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// How the caller should treat an issue
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IssueSeverity {
    /// Content was imported but needs follow-up
    Warning,
    /// Content could not be imported as declared
    Error,
}

impl IssueSeverity {
    pub fn as_str(&self) -> &'static str {
        match self {
            IssueSeverity::Warning => "warning",
            IssueSeverity::Error => "error",
        }
    }
}

impl FromStr for IssueSeverity {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "warning" => Ok(IssueSeverity::Warning),
            "error" => Ok(IssueSeverity::Error),
            _ => Err(format!("Invalid issue severity: {s}")),
        }
    }
}

impl std::fmt::Display for IssueSeverity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Content an issue is about
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContentRef {
    /// IR category, e.g. `wiki_pages`
    pub category: String,
    pub migration_id: String,
}

/// A single warning or error raised during a migration run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MigrationIssue {
    pub severity: IssueSeverity,
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<ContentRef>,
}

impl MigrationIssue {
    pub fn warning(description: impl Into<String>) -> Self {
        Self {
            severity: IssueSeverity::Warning,
            description: description.into(),
            content: None,
        }
    }

    pub fn error(description: impl Into<String>) -> Self {
        Self {
            severity: IssueSeverity::Error,
            description: description.into(),
            content: None,
        }
    }

    /// Attach the content reference this issue concerns
    pub fn about(mut self, category: &str, migration_id: &str) -> Self {
        self.content = Some(ContentRef {
            category: category.to_string(),
            migration_id: migration_id.to_string(),
        });
        self
    }
}

/// Append-only issue collection for one run
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct IssueList {
    issues: Vec<MigrationIssue>,
}

impl IssueList {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, issue: MigrationIssue) {
        tracing::debug!("migration issue ({}): {}", issue.severity, issue.description);
        self.issues.push(issue);
    }

    /// Record an issue unless one with the same description already exists
    pub fn push_once(&mut self, issue: MigrationIssue) {
        if !self.contains(&issue.description) {
            self.push(issue);
        }
    }

    pub fn add_warning(&mut self, description: impl Into<String>) {
        self.push(MigrationIssue::warning(description));
    }

    pub fn add_error(&mut self, description: impl Into<String>) {
        self.push(MigrationIssue::error(description));
    }

    pub fn extend(&mut self, other: impl IntoIterator<Item = MigrationIssue>) {
        for issue in other {
            self.push(issue);
        }
    }

    pub fn contains(&self, description: &str) -> bool {
        self.issues.iter().any(|i| i.description == description)
    }

    pub fn warnings(&self) -> impl Iterator<Item = &MigrationIssue> {
        self.issues
            .iter()
            .filter(|i| i.severity == IssueSeverity::Warning)
    }

    pub fn errors(&self) -> impl Iterator<Item = &MigrationIssue> {
        self.issues
            .iter()
            .filter(|i| i.severity == IssueSeverity::Error)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, MigrationIssue> {
        self.issues.iter()
    }

    pub fn len(&self) -> usize {
        self.issues.len()
    }

    pub fn is_empty(&self) -> bool {
        self.issues.is_empty()
    }

    pub fn into_vec(self) -> Vec<MigrationIssue> {
        self.issues
    }
}

impl<'a> IntoIterator for &'a IssueList {
    type Item = &'a MigrationIssue;
    type IntoIter = std::slice::Iter<'a, MigrationIssue>;

    fn into_iter(self) -> Self::IntoIter {
        self.issues.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_push_once_dedups_by_description() {
        let mut list = IssueList::new();
        list.push_once(MigrationIssue::warning("This package includes APIP file(s)"));
        list.push_once(MigrationIssue::warning("This package includes APIP file(s)"));
        list.add_error("broken");

        assert_eq!(list.len(), 2);
        assert_eq!(list.warnings().count(), 1);
        assert_eq!(list.errors().count(), 1);
    }

    #[test]
    fn test_severity_round_trip() {
        assert_eq!("warning".parse::<IssueSeverity>().unwrap(), IssueSeverity::Warning);
        assert_eq!(IssueSeverity::Error.to_string(), "error");
        assert!("fatal".parse::<IssueSeverity>().is_err());
    }

    #[test]
    fn test_about_sets_content_ref() {
        let issue = MigrationIssue::warning("missing").about("wiki_pages", "p1");
        let content = issue.content.unwrap();
        assert_eq!(content.category, "wiki_pages");
        assert_eq!(content.migration_id, "p1");
    }
}
