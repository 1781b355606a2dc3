// src/import/selection.rs

//! Selective import filter
//!
//! Parsed from the caller's `{ "copy": { ... } }` document:
//!
//! ```text
//! { "copy": {
//!     "everything": "0",
//!     "all_assignments": "1",
//!     "assignments": { "a2": "0" },
//!     "context_modules": { "sf2": true }
//! } }
//! ```
//!
//! Flags accept `"1"`, `"0"`, `"true"`, `"false"`, booleans and integers.
//! Category flags may be written as `all_<category>` or `<category>`.

use serde_json::Value;
use std::collections::HashMap;

/// Categories accepted by the filter
pub const CATEGORIES: &[&str] = &[
    "attachments",
    "context_modules",
    "assignments",
    "assignment_groups",
    "discussion_topics",
    "wiki_pages",
    "quizzes",
    "assessment_questions",
    "context_external_tools",
    "syllabus_body",
];

#[derive(Debug, Clone, Default)]
struct CategorySelection {
    /// Category-wide wildcard, if given
    all: Option<bool>,
    /// Per-id overrides
    ids: HashMap<String, bool>,
}

/// Which categories and ids a run may import
#[derive(Debug, Clone)]
pub struct SelectionFilter {
    everything: bool,
    categories: HashMap<String, CategorySelection>,
}

impl Default for SelectionFilter {
    fn default() -> Self {
        Self::everything()
    }
}

fn parse_flag(value: &Value) -> Option<bool> {
    match value {
        Value::Bool(b) => Some(*b),
        Value::Number(n) => n.as_i64().map(|n| n != 0),
        Value::String(s) => match s.trim().to_ascii_lowercase().as_str() {
            "1" | "true" | "on" | "yes" => Some(true),
            "0" | "false" | "off" | "no" | "" => Some(false),
            _ => None,
        },
        _ => None,
    }
}

impl SelectionFilter {
    /// Import every category
    pub fn everything() -> Self {
        Self {
            everything: true,
            categories: HashMap::new(),
        }
    }

    /// Import nothing unless later overridden
    pub fn nothing() -> Self {
        Self {
            everything: false,
            categories: HashMap::new(),
        }
    }

    /// Build a filter from a selection document
    ///
    /// Accepts either the full `{ "copy": {...} }` document or the inner
    /// map. A missing or empty map selects everything.
    pub fn from_value(value: &Value) -> Self {
        let copy = match value.get("copy") {
            Some(copy) => copy,
            None => value,
        };
        let Some(map) = copy.as_object() else {
            return Self::everything();
        };
        if map.is_empty() {
            return Self::everything();
        }

        let everything = map.get("everything").and_then(parse_flag).unwrap_or(false);
        let mut categories: HashMap<String, CategorySelection> = HashMap::new();

        for (key, entry) in map {
            if key == "everything" {
                continue;
            }
            let category = key.strip_prefix("all_").unwrap_or(key);
            if !CATEGORIES.contains(&category) {
                tracing::debug!("Ignoring unknown selection key '{}'", key);
                continue;
            }
            let selection = categories.entry(category.to_string()).or_default();

            match entry {
                Value::Object(ids) => {
                    for (id, flag) in ids {
                        if let Some(flag) = parse_flag(flag) {
                            selection.ids.insert(id.clone(), flag);
                        }
                    }
                }
                other => {
                    if let Some(flag) = parse_flag(other) {
                        selection.all = Some(flag);
                    }
                }
            }
        }

        Self {
            everything,
            categories,
        }
    }

    /// Parse a selection document from JSON text
    pub fn from_json(json: &str) -> crate::error::Result<Self> {
        let value: Value = serde_json::from_str(json)?;
        Ok(Self::from_value(&value))
    }

    /// Whether the whole category is imported without an explicit id list
    pub fn includes_category(&self, category: &str) -> bool {
        match self.categories.get(category) {
            Some(selection) => selection.all.unwrap_or(self.everything && selection.ids.is_empty()),
            None => self.everything,
        }
    }

    /// Whether one object is selected
    ///
    /// An id-level entry wins over the category wildcard. A category given
    /// only as an id list is an allow-list.
    pub fn is_selected(&self, category: &str, migration_id: &str) -> bool {
        if let Some(selection) = self.categories.get(category)
            && let Some(flag) = selection.ids.get(migration_id)
        {
            return *flag;
        }
        self.includes_category(category)
    }

    /// Whether this id was named explicitly and set to true
    pub fn is_explicitly_selected(&self, category: &str, migration_id: &str) -> bool {
        self.categories
            .get(category)
            .and_then(|s| s.ids.get(migration_id))
            .copied()
            .unwrap_or(false)
    }

    /// Whether anything in the category could be imported
    pub fn may_include(&self, category: &str) -> bool {
        self.includes_category(category)
            || self
                .categories
                .get(category)
                .is_some_and(|s| s.ids.values().any(|v| *v))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_empty_selection_means_everything() {
        let filter = SelectionFilter::from_value(&json!({ "copy": {} }));
        assert!(filter.is_selected("wiki_pages", "p1"));
        assert!(filter.includes_category("syllabus_body"));

        let filter = SelectionFilter::from_value(&Value::Null);
        assert!(filter.is_selected("assignments", "a1"));
    }

    #[test]
    fn test_everything_zero_selects_nothing() {
        let filter = SelectionFilter::from_value(&json!({ "copy": { "everything": "0" } }));
        for category in CATEGORIES {
            assert!(!filter.may_include(category));
            assert!(!filter.is_selected(category, "x"));
        }
    }

    #[test]
    fn test_id_entry_overrides_wildcard() {
        let filter = SelectionFilter::from_value(&json!({
            "copy": {
                "everything": "0",
                "all_assignments": "1",
                "assignments": { "a2": "0" }
            }
        }));
        assert!(filter.is_selected("assignments", "a1"));
        assert!(!filter.is_selected("assignments", "a2"));
        assert!(!filter.is_selected("wiki_pages", "p1"));
    }

    #[test]
    fn test_flag_spellings() {
        let filter = SelectionFilter::from_value(&json!({
            "everything": 0,
            "quizzes": true,
            "all_wiki_pages": "true",
            "discussion_topics": 1,
            "attachments": "0"
        }));
        assert!(filter.includes_category("quizzes"));
        assert!(filter.includes_category("wiki_pages"));
        assert!(filter.includes_category("discussion_topics"));
        assert!(!filter.includes_category("attachments"));
    }

    #[test]
    fn test_id_list_is_allow_list() {
        let filter = SelectionFilter::from_value(&json!({
            "copy": { "everything": "1", "context_modules": { "sf2": true } }
        }));
        assert!(filter.is_selected("context_modules", "sf2"));
        assert!(filter.is_explicitly_selected("context_modules", "sf2"));
        assert!(!filter.is_selected("context_modules", "m1"));
        assert!(filter.is_selected("assignments", "a1"));
    }
}
