// src/import/index.rs

//! Objects created or updated by one import run
//!
//! Filled while upserting, then used to resolve module item targets and to
//! rewrite links. Each run builds its own index.

use std::collections::HashMap;

/// Kind of store object a migration id resolved to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ObjectKind {
    Attachment,
    Module,
    Assignment,
    AssignmentGroup,
    DiscussionTopic,
    WikiPage,
    Quiz,
    QuestionBank,
    AssessmentQuestion,
    ExternalTool,
}

impl ObjectKind {
    /// Selection category of this kind
    pub fn category(&self) -> &'static str {
        match self {
            ObjectKind::Attachment => "attachments",
            ObjectKind::Module => "context_modules",
            ObjectKind::Assignment => "assignments",
            ObjectKind::AssignmentGroup => "assignment_groups",
            ObjectKind::DiscussionTopic => "discussion_topics",
            ObjectKind::WikiPage => "wiki_pages",
            ObjectKind::Quiz => "quizzes",
            ObjectKind::QuestionBank => "assessment_question_banks",
            ObjectKind::AssessmentQuestion => "assessment_questions",
            ObjectKind::ExternalTool => "context_external_tools",
        }
    }
}

#[derive(Debug, Clone)]
pub struct IndexedFile {
    pub id: i64,
    pub display_name: String,
}

#[derive(Debug, Default)]
pub struct CreatedObjectIndex {
    objects: HashMap<(ObjectKind, String), i64>,
    files_by_path: HashMap<String, IndexedFile>,
    /// Page slug by source HTML path
    pages_by_path: HashMap<String, String>,
}

impl CreatedObjectIndex {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, kind: ObjectKind, migration_id: &str, id: i64) {
        self.objects.insert((kind, migration_id.to_string()), id);
    }

    pub fn get(&self, kind: ObjectKind, migration_id: &str) -> Option<i64> {
        self.objects.get(&(kind, migration_id.to_string())).copied()
    }

    pub fn record_file(&mut self, path_name: &str, id: i64, display_name: &str) {
        self.files_by_path.insert(
            path_name.to_string(),
            IndexedFile {
                id,
                display_name: display_name.to_string(),
            },
        );
    }

    pub fn file_by_path(&self, path_name: &str) -> Option<&IndexedFile> {
        self.files_by_path.get(path_name)
    }

    pub fn record_page_path(&mut self, source_path: &str, slug: &str) {
        self.pages_by_path
            .insert(source_path.to_string(), slug.to_string());
    }

    pub fn page_by_path(&self, source_path: &str) -> Option<&str> {
        self.pages_by_path.get(source_path).map(String::as_str)
    }

    /// Number of objects recorded across all kinds
    pub fn len(&self) -> usize {
        self.objects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }

    pub fn count(&self, kind: ObjectKind) -> usize {
        self.objects.keys().filter(|(k, _)| *k == kind).count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_index_lookups() {
        let mut index = CreatedObjectIndex::new();
        index.record(ObjectKind::WikiPage, "p1", 7);
        index.record(ObjectKind::Assignment, "p1", 9);
        index.record_file("a1/a1.html", 3, "a1.html");
        index.record_page_path("w1/intro.html", "intro");

        assert_eq!(index.get(ObjectKind::WikiPage, "p1"), Some(7));
        assert_eq!(index.get(ObjectKind::Assignment, "p1"), Some(9));
        assert_eq!(index.get(ObjectKind::Quiz, "p1"), None);
        assert_eq!(index.file_by_path("a1/a1.html").unwrap().display_name, "a1.html");
        assert_eq!(index.page_by_path("w1/intro.html"), Some("intro"));
        assert_eq!(index.count(ObjectKind::WikiPage), 1);
        assert_eq!(index.len(), 2);
    }
}
