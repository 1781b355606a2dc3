// src/db/models/mod.rs

//! Data models for content store entities
//!
//! One file per table. Each model offers `new`, `insert`, `update`, the
//! lookups the importer needs (`find_by_migration_id`, `list_for_container`)
//! and a private `from_row` used by every query.

mod assignment;
mod attachment;
mod container;
mod content_migration;
mod discussion_topic;
mod external_tool;
mod module;
mod quiz;
mod wiki_page;

pub use assignment::{Assignment, AssignmentGroup};
pub use attachment::Attachment;
pub use container::Container;
pub use content_migration::{ContentMigration, MigrationState, StoredIssue};
pub use discussion_topic::DiscussionTopic;
pub use external_tool::ExternalTool;
pub use module::{ContextModule, ModuleItem};
pub use quiz::{AssessmentQuestion, QuestionBank, Quiz};
pub use wiki_page::{WikiPage, slugify};

use rusqlite::Row;
use std::str::FromStr;

/// Soft-delete state shared by all content tables
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum WorkflowState {
    #[default]
    Active,
    Deleted,
}

impl WorkflowState {
    pub fn as_str(&self) -> &str {
        match self {
            WorkflowState::Active => "active",
            WorkflowState::Deleted => "deleted",
        }
    }
}

impl FromStr for WorkflowState {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "active" => Ok(WorkflowState::Active),
            "deleted" => Ok(WorkflowState::Deleted),
            _ => Err(format!("Invalid workflow state: {s}")),
        }
    }
}

impl std::fmt::Display for WorkflowState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Read a text column holding an enum value
pub(crate) fn enum_column<T>(row: &Row, idx: usize) -> rusqlite::Result<T>
where
    T: FromStr<Err = String>,
{
    let raw: String = row.get(idx)?;
    raw.parse::<T>().map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(
            idx,
            rusqlite::types::Type::Text,
            Box::new(std::io::Error::new(std::io::ErrorKind::InvalidData, e)),
        )
    })
}

#[cfg(test)]
pub(crate) mod test_support {
    use crate::db::models::Container;
    use rusqlite::Connection;
    use tempfile::NamedTempFile;

    /// File-backed store with one container, returned as (file, conn, container id)
    pub fn create_test_db() -> (NamedTempFile, Connection, i64) {
        let temp_file = NamedTempFile::new().unwrap();
        let conn = Connection::open(temp_file.path()).unwrap();
        conn.execute_batch("PRAGMA foreign_keys = ON;").unwrap();
        crate::db::schema::migrate(&conn).unwrap();
        let container_id = Container::new("Test Course").insert(&conn).unwrap();
        (temp_file, conn, container_id)
    }
}
