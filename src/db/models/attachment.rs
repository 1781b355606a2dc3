// src/db/models/attachment.rs

//! Attachment model: package files copied into a container

use super::{WorkflowState, enum_column};
use crate::error::Result;
use rusqlite::{Connection, OptionalExtension, Row, params};

const COLUMNS: &str =
    "id, container_id, migration_id, display_name, path_name, size, md5, workflow_state";

#[derive(Debug, Clone)]
pub struct Attachment {
    pub id: Option<i64>,
    pub container_id: i64,
    pub migration_id: String,
    pub display_name: String,
    /// Slash-normalized path inside the container's file tree
    pub path_name: String,
    pub size: i64,
    /// Hex MD5 of the file contents
    pub md5: Option<String>,
    pub workflow_state: WorkflowState,
}

impl Attachment {
    pub fn new(
        container_id: i64,
        migration_id: impl Into<String>,
        path_name: impl Into<String>,
        display_name: impl Into<String>,
    ) -> Self {
        Self {
            id: None,
            container_id,
            migration_id: migration_id.into(),
            display_name: display_name.into(),
            path_name: path_name.into(),
            size: 0,
            md5: None,
            workflow_state: WorkflowState::Active,
        }
    }

    pub fn insert(&mut self, conn: &Connection) -> Result<i64> {
        conn.execute(
            "INSERT INTO attachments (container_id, migration_id, display_name, path_name, size, md5, workflow_state)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            params![
                self.container_id,
                &self.migration_id,
                &self.display_name,
                &self.path_name,
                self.size,
                &self.md5,
                self.workflow_state.as_str(),
            ],
        )?;

        let id = conn.last_insert_rowid();
        self.id = Some(id);
        Ok(id)
    }

    pub fn update(&self, conn: &Connection) -> Result<()> {
        conn.execute(
            "UPDATE attachments SET display_name = ?1, path_name = ?2, size = ?3, md5 = ?4,
             workflow_state = ?5 WHERE id = ?6",
            params![
                &self.display_name,
                &self.path_name,
                self.size,
                &self.md5,
                self.workflow_state.as_str(),
                self.id,
            ],
        )?;
        Ok(())
    }

    pub fn find_by_id(conn: &Connection, id: i64) -> Result<Option<Self>> {
        let sql = format!("SELECT {COLUMNS} FROM attachments WHERE id = ?1");
        let attachment = conn.query_row(&sql, [id], Self::from_row).optional()?;
        Ok(attachment)
    }

    pub fn find_by_migration_id(
        conn: &Connection,
        container_id: i64,
        migration_id: &str,
    ) -> Result<Option<Self>> {
        let sql = format!(
            "SELECT {COLUMNS} FROM attachments WHERE container_id = ?1 AND migration_id = ?2"
        );
        let attachment = conn
            .query_row(&sql, params![container_id, migration_id], Self::from_row)
            .optional()?;
        Ok(attachment)
    }

    /// Active attachment stored at `path_name`
    pub fn find_by_path(
        conn: &Connection,
        container_id: i64,
        path_name: &str,
    ) -> Result<Option<Self>> {
        let sql = format!(
            "SELECT {COLUMNS} FROM attachments
             WHERE container_id = ?1 AND path_name = ?2 AND workflow_state = 'active'
             ORDER BY id LIMIT 1"
        );
        let attachment = conn
            .query_row(&sql, params![container_id, path_name], Self::from_row)
            .optional()?;
        Ok(attachment)
    }

    pub fn list_for_container(conn: &Connection, container_id: i64) -> Result<Vec<Self>> {
        let sql = format!(
            "SELECT {COLUMNS} FROM attachments WHERE container_id = ?1 ORDER BY path_name, id"
        );
        let mut stmt = conn.prepare(&sql)?;
        let attachments = stmt
            .query_map([container_id], Self::from_row)?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(attachments)
    }

    /// Soft delete
    pub fn delete(conn: &Connection, id: i64) -> Result<()> {
        conn.execute(
            "UPDATE attachments SET workflow_state = 'deleted' WHERE id = ?1",
            [id],
        )?;
        Ok(())
    }

    fn from_row(row: &Row) -> rusqlite::Result<Self> {
        Ok(Self {
            id: Some(row.get(0)?),
            container_id: row.get(1)?,
            migration_id: row.get(2)?,
            display_name: row.get(3)?,
            path_name: row.get(4)?,
            size: row.get(5)?,
            md5: row.get(6)?,
            workflow_state: enum_column(row, 7)?,
        })
    }
}
