// src/db/models/module.rs

//! Context modules and their items
//!
//! Modules are ordered within a container by `position`; items are ordered
//! within a module and point at another content row through
//! `(content_type, content_id)`, or carry a `url` for links and tools.

use super::{WorkflowState, enum_column};
use crate::error::Result;
use crate::ir::ContentType;
use rusqlite::{Connection, OptionalExtension, Row, params};

const MODULE_COLUMNS: &str = "id, container_id, migration_id, name, position, workflow_state";

#[derive(Debug, Clone)]
pub struct ContextModule {
    pub id: Option<i64>,
    pub container_id: i64,
    /// None for modules created by hand
    pub migration_id: Option<String>,
    pub name: String,
    pub position: i64,
    pub workflow_state: WorkflowState,
}

impl ContextModule {
    pub fn new(container_id: i64, name: impl Into<String>, position: i64) -> Self {
        Self {
            id: None,
            container_id,
            migration_id: None,
            name: name.into(),
            position,
            workflow_state: WorkflowState::Active,
        }
    }

    pub fn with_migration_id(mut self, migration_id: impl Into<String>) -> Self {
        self.migration_id = Some(migration_id.into());
        self
    }

    pub fn insert(&mut self, conn: &Connection) -> Result<i64> {
        conn.execute(
            "INSERT INTO context_modules (container_id, migration_id, name, position, workflow_state)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                self.container_id,
                &self.migration_id,
                &self.name,
                self.position,
                self.workflow_state.as_str(),
            ],
        )?;

        let id = conn.last_insert_rowid();
        self.id = Some(id);
        Ok(id)
    }

    pub fn update(&self, conn: &Connection) -> Result<()> {
        conn.execute(
            "UPDATE context_modules SET name = ?1, position = ?2, workflow_state = ?3 WHERE id = ?4",
            params![&self.name, self.position, self.workflow_state.as_str(), self.id],
        )?;
        Ok(())
    }

    pub fn set_position(conn: &Connection, id: i64, position: i64) -> Result<()> {
        conn.execute(
            "UPDATE context_modules SET position = ?1 WHERE id = ?2",
            params![position, id],
        )?;
        Ok(())
    }

    pub fn find_by_id(conn: &Connection, id: i64) -> Result<Option<Self>> {
        let sql = format!("SELECT {MODULE_COLUMNS} FROM context_modules WHERE id = ?1");
        let module = conn.query_row(&sql, [id], Self::from_row).optional()?;
        Ok(module)
    }

    pub fn find_by_migration_id(
        conn: &Connection,
        container_id: i64,
        migration_id: &str,
    ) -> Result<Option<Self>> {
        let sql = format!(
            "SELECT {MODULE_COLUMNS} FROM context_modules WHERE container_id = ?1 AND migration_id = ?2"
        );
        let module = conn
            .query_row(&sql, params![container_id, migration_id], Self::from_row)
            .optional()?;
        Ok(module)
    }

    /// Active modules in display order
    pub fn list_for_container(conn: &Connection, container_id: i64) -> Result<Vec<Self>> {
        let sql = format!(
            "SELECT {MODULE_COLUMNS} FROM context_modules
             WHERE container_id = ?1 AND workflow_state = 'active'
             ORDER BY position, id"
        );
        let mut stmt = conn.prepare(&sql)?;
        let modules = stmt
            .query_map([container_id], Self::from_row)?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(modules)
    }

    /// Highest position among active modules, 0 when there are none
    pub fn max_position(conn: &Connection, container_id: i64) -> Result<i64> {
        let max: Option<i64> = conn.query_row(
            "SELECT MAX(position) FROM context_modules
             WHERE container_id = ?1 AND workflow_state = 'active'",
            [container_id],
            |row| row.get(0),
        )?;
        Ok(max.unwrap_or(0))
    }

    /// Soft delete
    pub fn delete(conn: &Connection, id: i64) -> Result<()> {
        conn.execute(
            "UPDATE context_modules SET workflow_state = 'deleted' WHERE id = ?1",
            [id],
        )?;
        Ok(())
    }

    fn from_row(row: &Row) -> rusqlite::Result<Self> {
        Ok(Self {
            id: Some(row.get(0)?),
            container_id: row.get(1)?,
            migration_id: row.get(2)?,
            name: row.get(3)?,
            position: row.get(4)?,
            workflow_state: enum_column(row, 5)?,
        })
    }
}

const ITEM_COLUMNS: &str =
    "id, module_id, migration_id, content_type, content_id, title, url, indent, position, workflow_state";

/// Placeholder inside a module
#[derive(Debug, Clone)]
pub struct ModuleItem {
    pub id: Option<i64>,
    pub module_id: i64,
    pub migration_id: Option<String>,
    pub content_type: ContentType,
    /// Row id in the table matching `content_type`
    pub content_id: Option<i64>,
    pub title: String,
    pub url: Option<String>,
    pub indent: i64,
    pub position: i64,
    pub workflow_state: WorkflowState,
}

impl ModuleItem {
    pub fn new(module_id: i64, content_type: ContentType, title: impl Into<String>) -> Self {
        Self {
            id: None,
            module_id,
            migration_id: None,
            content_type,
            content_id: None,
            title: title.into(),
            url: None,
            indent: 0,
            position: 1,
            workflow_state: WorkflowState::Active,
        }
    }

    pub fn insert(&mut self, conn: &Connection) -> Result<i64> {
        conn.execute(
            "INSERT INTO module_items (module_id, migration_id, content_type, content_id, title, url,
                                       indent, position, workflow_state)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
            params![
                self.module_id,
                &self.migration_id,
                self.content_type.as_str(),
                self.content_id,
                &self.title,
                &self.url,
                self.indent,
                self.position,
                self.workflow_state.as_str(),
            ],
        )?;

        let id = conn.last_insert_rowid();
        self.id = Some(id);
        Ok(id)
    }

    pub fn update(&self, conn: &Connection) -> Result<()> {
        conn.execute(
            "UPDATE module_items SET content_type = ?1, content_id = ?2, title = ?3, url = ?4,
             indent = ?5, position = ?6, workflow_state = ?7 WHERE id = ?8",
            params![
                self.content_type.as_str(),
                self.content_id,
                &self.title,
                &self.url,
                self.indent,
                self.position,
                self.workflow_state.as_str(),
                self.id,
            ],
        )?;
        Ok(())
    }

    pub fn find_by_migration_id(
        conn: &Connection,
        module_id: i64,
        migration_id: &str,
    ) -> Result<Option<Self>> {
        let sql = format!(
            "SELECT {ITEM_COLUMNS} FROM module_items WHERE module_id = ?1 AND migration_id = ?2"
        );
        let item = conn
            .query_row(&sql, params![module_id, migration_id], Self::from_row)
            .optional()?;
        Ok(item)
    }

    /// Active items in display order
    pub fn list_for_module(conn: &Connection, module_id: i64) -> Result<Vec<Self>> {
        let sql = format!(
            "SELECT {ITEM_COLUMNS} FROM module_items
             WHERE module_id = ?1 AND workflow_state = 'active'
             ORDER BY position, id"
        );
        let mut stmt = conn.prepare(&sql)?;
        let items = stmt
            .query_map([module_id], Self::from_row)?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(items)
    }

    fn from_row(row: &Row) -> rusqlite::Result<Self> {
        Ok(Self {
            id: Some(row.get(0)?),
            module_id: row.get(1)?,
            migration_id: row.get(2)?,
            content_type: enum_column(row, 3)?,
            content_id: row.get(4)?,
            title: row.get(5)?,
            url: row.get(6)?,
            indent: row.get(7)?,
            position: row.get(8)?,
            workflow_state: enum_column(row, 9)?,
        })
    }
}
