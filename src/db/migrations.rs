// src/db/migrations.rs
//! Content store migrations
//!
//! Each function upgrades the schema by one version.

use crate::error::Result;
use rusqlite::Connection;
use tracing::debug;

/// Initial schema - Version 1
///
/// - containers: courses receiving imported content
/// - one table per content category, keyed by (container_id, migration_id)
/// - module_items: module placeholders, keyed by (module_id, migration_id)
/// - content_migrations / migration_issues: run history and reports
pub fn migrate_v1(conn: &Connection) -> Result<()> {
    debug!("Creating content store schema version 1");

    conn.execute_batch(
        "
        CREATE TABLE containers (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            name TEXT NOT NULL UNIQUE,
            syllabus_body TEXT,
            created_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP
        );

        CREATE TABLE attachments (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            container_id INTEGER NOT NULL REFERENCES containers(id) ON DELETE CASCADE,
            migration_id TEXT NOT NULL,
            display_name TEXT NOT NULL,
            path_name TEXT NOT NULL,
            size INTEGER NOT NULL DEFAULT 0,
            md5 TEXT,
            workflow_state TEXT NOT NULL DEFAULT 'active' CHECK(workflow_state IN ('active', 'deleted')),
            UNIQUE(container_id, migration_id)
        );

        CREATE INDEX idx_attachments_path ON attachments(container_id, path_name);

        CREATE TABLE context_modules (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            container_id INTEGER NOT NULL REFERENCES containers(id) ON DELETE CASCADE,
            migration_id TEXT,
            name TEXT NOT NULL,
            position INTEGER NOT NULL DEFAULT 1,
            workflow_state TEXT NOT NULL DEFAULT 'active' CHECK(workflow_state IN ('active', 'deleted')),
            UNIQUE(container_id, migration_id)
        );

        CREATE TABLE module_items (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            module_id INTEGER NOT NULL REFERENCES context_modules(id) ON DELETE CASCADE,
            migration_id TEXT,
            content_type TEXT NOT NULL,
            content_id INTEGER,
            title TEXT NOT NULL,
            url TEXT,
            indent INTEGER NOT NULL DEFAULT 0,
            position INTEGER NOT NULL DEFAULT 1,
            workflow_state TEXT NOT NULL DEFAULT 'active' CHECK(workflow_state IN ('active', 'deleted')),
            UNIQUE(module_id, migration_id)
        );

        CREATE TABLE assignment_groups (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            container_id INTEGER NOT NULL REFERENCES containers(id) ON DELETE CASCADE,
            migration_id TEXT,
            name TEXT NOT NULL,
            position INTEGER NOT NULL DEFAULT 1,
            workflow_state TEXT NOT NULL DEFAULT 'active' CHECK(workflow_state IN ('active', 'deleted')),
            UNIQUE(container_id, migration_id)
        );

        CREATE TABLE external_tools (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            container_id INTEGER NOT NULL REFERENCES containers(id) ON DELETE CASCADE,
            migration_id TEXT NOT NULL,
            name TEXT NOT NULL,
            description TEXT,
            url TEXT,
            domain TEXT,
            privacy_level TEXT,
            consumer_key TEXT,
            shared_secret TEXT,
            settings TEXT NOT NULL DEFAULT '{}',
            workflow_state TEXT NOT NULL DEFAULT 'active' CHECK(workflow_state IN ('active', 'deleted')),
            UNIQUE(container_id, migration_id)
        );

        CREATE TABLE assignments (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            container_id INTEGER NOT NULL REFERENCES containers(id) ON DELETE CASCADE,
            migration_id TEXT NOT NULL,
            title TEXT NOT NULL,
            description TEXT,
            grading_type TEXT NOT NULL DEFAULT 'points',
            points_possible REAL,
            submission_types TEXT NOT NULL DEFAULT '',
            assignment_group_id INTEGER REFERENCES assignment_groups(id) ON DELETE SET NULL,
            external_tool_id INTEGER REFERENCES external_tools(id) ON DELETE SET NULL,
            external_tool_url TEXT,
            position INTEGER,
            workflow_state TEXT NOT NULL DEFAULT 'active' CHECK(workflow_state IN ('active', 'deleted')),
            UNIQUE(container_id, migration_id)
        );

        CREATE TABLE discussion_topics (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            container_id INTEGER NOT NULL REFERENCES containers(id) ON DELETE CASCADE,
            migration_id TEXT NOT NULL,
            title TEXT NOT NULL,
            message TEXT NOT NULL DEFAULT '',
            workflow_state TEXT NOT NULL DEFAULT 'active' CHECK(workflow_state IN ('active', 'deleted')),
            UNIQUE(container_id, migration_id)
        );

        CREATE TABLE wiki_pages (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            container_id INTEGER NOT NULL REFERENCES containers(id) ON DELETE CASCADE,
            migration_id TEXT NOT NULL,
            title TEXT NOT NULL,
            url TEXT NOT NULL,
            body TEXT NOT NULL DEFAULT '',
            workflow_state TEXT NOT NULL DEFAULT 'active' CHECK(workflow_state IN ('active', 'deleted')),
            UNIQUE(container_id, migration_id)
        );

        CREATE TABLE quizzes (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            container_id INTEGER NOT NULL REFERENCES containers(id) ON DELETE CASCADE,
            migration_id TEXT NOT NULL,
            title TEXT NOT NULL,
            description TEXT,
            quiz_type TEXT NOT NULL DEFAULT 'assignment',
            allowed_attempts INTEGER,
            time_limit INTEGER,
            points_possible REAL,
            workflow_state TEXT NOT NULL DEFAULT 'active' CHECK(workflow_state IN ('active', 'deleted')),
            UNIQUE(container_id, migration_id)
        );

        CREATE TABLE question_banks (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            container_id INTEGER NOT NULL REFERENCES containers(id) ON DELETE CASCADE,
            migration_id TEXT NOT NULL,
            title TEXT NOT NULL,
            workflow_state TEXT NOT NULL DEFAULT 'active' CHECK(workflow_state IN ('active', 'deleted')),
            UNIQUE(container_id, migration_id)
        );

        CREATE TABLE assessment_questions (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            container_id INTEGER NOT NULL REFERENCES containers(id) ON DELETE CASCADE,
            migration_id TEXT NOT NULL,
            bank_id INTEGER REFERENCES question_banks(id) ON DELETE SET NULL,
            quiz_id INTEGER REFERENCES quizzes(id) ON DELETE SET NULL,
            name TEXT,
            question_type TEXT NOT NULL,
            question_text TEXT NOT NULL DEFAULT '',
            points_possible REAL,
            workflow_state TEXT NOT NULL DEFAULT 'active' CHECK(workflow_state IN ('active', 'deleted')),
            UNIQUE(container_id, migration_id)
        );

        CREATE TABLE content_migrations (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            container_id INTEGER NOT NULL REFERENCES containers(id) ON DELETE CASCADE,
            source TEXT,
            workflow_state TEXT NOT NULL CHECK(workflow_state IN ('running', 'imported', 'failed')),
            imported_count INTEGER NOT NULL DEFAULT 0,
            started_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP,
            finished_at TEXT
        );

        CREATE TABLE migration_issues (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            content_migration_id INTEGER NOT NULL REFERENCES content_migrations(id) ON DELETE CASCADE,
            severity TEXT NOT NULL CHECK(severity IN ('warning', 'error')),
            description TEXT NOT NULL,
            content_category TEXT,
            content_migration_ref TEXT
        );

        CREATE INDEX idx_migration_issues_run ON migration_issues(content_migration_id);
        ",
    )?;

    debug!("Schema version 1 created");
    Ok(())
}
