// src/db/models/content_migration.rs

//! Import run history
//!
//! Every import run is recorded as a content migration row; the issues it
//! raised are stored alongside so they can be listed after the fact.

use super::enum_column;
use crate::error::Result;
use crate::issues::{ContentRef, IssueSeverity, MigrationIssue};
use rusqlite::{Connection, OptionalExtension, Row, params};
use std::str::FromStr;

/// Lifecycle of an import run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MigrationState {
    Running,
    Imported,
    Failed,
}

impl MigrationState {
    pub fn as_str(&self) -> &str {
        match self {
            MigrationState::Running => "running",
            MigrationState::Imported => "imported",
            MigrationState::Failed => "failed",
        }
    }
}

impl FromStr for MigrationState {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "running" => Ok(MigrationState::Running),
            "imported" => Ok(MigrationState::Imported),
            "failed" => Ok(MigrationState::Failed),
            _ => Err(format!("Invalid migration state: {s}")),
        }
    }
}

impl std::fmt::Display for MigrationState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Debug, Clone)]
pub struct ContentMigration {
    pub id: Option<i64>,
    pub container_id: i64,
    /// Archive path or other description of where the content came from
    pub source: Option<String>,
    pub state: MigrationState,
    pub imported_count: i64,
    pub started_at: Option<String>,
    pub finished_at: Option<String>,
}

impl ContentMigration {
    pub fn new(container_id: i64, source: Option<String>) -> Self {
        Self {
            id: None,
            container_id,
            source,
            state: MigrationState::Running,
            imported_count: 0,
            started_at: None,
            finished_at: None,
        }
    }

    pub fn insert(&mut self, conn: &Connection) -> Result<i64> {
        conn.execute(
            "INSERT INTO content_migrations (container_id, source, workflow_state, imported_count)
             VALUES (?1, ?2, ?3, ?4)",
            params![
                self.container_id,
                &self.source,
                self.state.as_str(),
                self.imported_count,
            ],
        )?;

        let id = conn.last_insert_rowid();
        self.id = Some(id);
        Ok(id)
    }

    /// Mark the run finished and stamp the completion time
    pub fn finish(&mut self, conn: &Connection, state: MigrationState, imported_count: i64) -> Result<()> {
        let finished_at = chrono::Utc::now().to_rfc3339();
        conn.execute(
            "UPDATE content_migrations SET workflow_state = ?1, imported_count = ?2, finished_at = ?3
             WHERE id = ?4",
            params![state.as_str(), imported_count, &finished_at, self.id],
        )?;

        self.state = state;
        self.imported_count = imported_count;
        self.finished_at = Some(finished_at);
        Ok(())
    }

    pub fn find_by_id(conn: &Connection, id: i64) -> Result<Option<Self>> {
        let migration = conn
            .query_row(
                "SELECT id, container_id, source, workflow_state, imported_count, started_at, finished_at
                 FROM content_migrations WHERE id = ?1",
                [id],
                Self::from_row,
            )
            .optional()?;
        Ok(migration)
    }

    /// Runs against a container, most recent first
    pub fn list_for_container(conn: &Connection, container_id: i64) -> Result<Vec<Self>> {
        let mut stmt = conn.prepare(
            "SELECT id, container_id, source, workflow_state, imported_count, started_at, finished_at
             FROM content_migrations WHERE container_id = ?1 ORDER BY id DESC",
        )?;
        let migrations = stmt
            .query_map([container_id], Self::from_row)?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(migrations)
    }

    fn from_row(row: &Row) -> rusqlite::Result<Self> {
        Ok(Self {
            id: Some(row.get(0)?),
            container_id: row.get(1)?,
            source: row.get(2)?,
            state: enum_column(row, 3)?,
            imported_count: row.get(4)?,
            started_at: row.get(5)?,
            finished_at: row.get(6)?,
        })
    }
}

/// A migration issue persisted with its run
#[derive(Debug, Clone)]
pub struct StoredIssue {
    pub id: Option<i64>,
    pub content_migration_id: i64,
    pub issue: MigrationIssue,
}

impl StoredIssue {
    /// Persist every issue of a run, preserving order
    pub fn insert_all(conn: &Connection, content_migration_id: i64, issues: &[MigrationIssue]) -> Result<()> {
        let mut stmt = conn.prepare(
            "INSERT INTO migration_issues (content_migration_id, severity, description,
                                           content_category, content_migration_ref)
             VALUES (?1, ?2, ?3, ?4, ?5)",
        )?;

        for issue in issues {
            let (category, migration_ref) = match &issue.content {
                Some(content) => (Some(content.category.as_str()), Some(content.migration_id.as_str())),
                None => (None, None),
            };
            stmt.execute(params![
                content_migration_id,
                issue.severity.as_str(),
                &issue.description,
                category,
                migration_ref,
            ])?;
        }

        Ok(())
    }

    pub fn list_for_migration(conn: &Connection, content_migration_id: i64) -> Result<Vec<Self>> {
        let mut stmt = conn.prepare(
            "SELECT id, content_migration_id, severity, description, content_category, content_migration_ref
             FROM migration_issues WHERE content_migration_id = ?1 ORDER BY id",
        )?;
        let issues = stmt
            .query_map([content_migration_id], Self::from_row)?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(issues)
    }

    fn from_row(row: &Row) -> rusqlite::Result<Self> {
        let severity: IssueSeverity = enum_column(row, 2)?;
        let category: Option<String> = row.get(4)?;
        let migration_ref: Option<String> = row.get(5)?;

        let content = match (category, migration_ref) {
            (Some(category), Some(migration_id)) => Some(ContentRef {
                category,
                migration_id,
            }),
            _ => None,
        };

        Ok(Self {
            id: Some(row.get(0)?),
            content_migration_id: row.get(1)?,
            issue: MigrationIssue {
                severity,
                description: row.get(3)?,
                content,
            },
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::models::test_support::create_test_db;

    #[test]
    fn test_run_lifecycle_with_issues() {
        let (_temp, conn, course) = create_test_db();

        let mut run = ContentMigration::new(course, Some("course.imscc".to_string()));
        let run_id = run.insert(&conn).unwrap();
        assert_eq!(run.state, MigrationState::Running);

        let issues = vec![
            MigrationIssue::warning("first"),
            MigrationIssue::error("second").about("wiki_pages", "p1"),
        ];
        StoredIssue::insert_all(&conn, run_id, &issues).unwrap();
        run.finish(&conn, MigrationState::Imported, 12).unwrap();

        let found = ContentMigration::find_by_id(&conn, run_id).unwrap().unwrap();
        assert_eq!(found.state, MigrationState::Imported);
        assert_eq!(found.imported_count, 12);
        assert!(found.finished_at.is_some());

        let stored = StoredIssue::list_for_migration(&conn, run_id).unwrap();
        assert_eq!(stored.len(), 2);
        assert_eq!(stored[0].issue.description, "first");
        assert_eq!(stored[1].issue.severity, IssueSeverity::Error);
        assert_eq!(stored[1].issue.content.as_ref().unwrap().migration_id, "p1");
        assert_eq!(ContentMigration::list_for_container(&conn, course).unwrap().len(), 1);
    }
}
