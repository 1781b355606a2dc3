// src/db/models/assignment.rs

//! Assignment groups and assignments

use super::{WorkflowState, enum_column};
use crate::error::Result;
use rusqlite::{Connection, OptionalExtension, Row, params};

const GROUP_COLUMNS: &str = "id, container_id, migration_id, name, position, workflow_state";

#[derive(Debug, Clone)]
pub struct AssignmentGroup {
    pub id: Option<i64>,
    pub container_id: i64,
    pub migration_id: Option<String>,
    pub name: String,
    pub position: i64,
    pub workflow_state: WorkflowState,
}

impl AssignmentGroup {
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
            "INSERT INTO assignment_groups (container_id, migration_id, name, position, workflow_state)
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
            "UPDATE assignment_groups SET migration_id = ?1, name = ?2, position = ?3,
             workflow_state = ?4 WHERE id = ?5",
            params![
                &self.migration_id,
                &self.name,
                self.position,
                self.workflow_state.as_str(),
                self.id,
            ],
        )?;
        Ok(())
    }

    pub fn set_position(conn: &Connection, id: i64, position: i64) -> Result<()> {
        conn.execute(
            "UPDATE assignment_groups SET position = ?1 WHERE id = ?2",
            params![position, id],
        )?;
        Ok(())
    }

    pub fn find_by_migration_id(
        conn: &Connection,
        container_id: i64,
        migration_id: &str,
    ) -> Result<Option<Self>> {
        let sql = format!(
            "SELECT {GROUP_COLUMNS} FROM assignment_groups WHERE container_id = ?1 AND migration_id = ?2"
        );
        let group = conn
            .query_row(&sql, params![container_id, migration_id], Self::from_row)
            .optional()?;
        Ok(group)
    }

    /// Hand-made group with the given name
    ///
    /// Groups created outside an import have no migration id; an incoming
    /// group with the same name adopts them instead of adding a duplicate.
    pub fn find_unmigrated_by_name(
        conn: &Connection,
        container_id: i64,
        name: &str,
    ) -> Result<Option<Self>> {
        let sql = format!(
            "SELECT {GROUP_COLUMNS} FROM assignment_groups
             WHERE container_id = ?1 AND name = ?2 AND migration_id IS NULL
             ORDER BY id LIMIT 1"
        );
        let group = conn
            .query_row(&sql, params![container_id, name], Self::from_row)
            .optional()?;
        Ok(group)
    }

    /// Active groups in display order
    pub fn list_for_container(conn: &Connection, container_id: i64) -> Result<Vec<Self>> {
        let sql = format!(
            "SELECT {GROUP_COLUMNS} FROM assignment_groups
             WHERE container_id = ?1 AND workflow_state = 'active'
             ORDER BY position, id"
        );
        let mut stmt = conn.prepare(&sql)?;
        let groups = stmt
            .query_map([container_id], Self::from_row)?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(groups)
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

const ASSIGNMENT_COLUMNS: &str = "id, container_id, migration_id, title, description, grading_type, \
     points_possible, submission_types, assignment_group_id, external_tool_id, external_tool_url, \
     position, workflow_state";

#[derive(Debug, Clone)]
pub struct Assignment {
    pub id: Option<i64>,
    pub container_id: i64,
    pub migration_id: String,
    pub title: String,
    pub description: Option<String>,
    pub grading_type: String,
    pub points_possible: Option<f64>,
    pub submission_types: Vec<String>,
    pub assignment_group_id: Option<i64>,
    pub external_tool_id: Option<i64>,
    pub external_tool_url: Option<String>,
    pub position: Option<i64>,
    pub workflow_state: WorkflowState,
}

impl Assignment {
    pub fn new(container_id: i64, migration_id: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            id: None,
            container_id,
            migration_id: migration_id.into(),
            title: title.into(),
            description: None,
            grading_type: "points".to_string(),
            points_possible: None,
            submission_types: Vec::new(),
            assignment_group_id: None,
            external_tool_id: None,
            external_tool_url: None,
            position: None,
            workflow_state: WorkflowState::Active,
        }
    }

    pub fn insert(&mut self, conn: &Connection) -> Result<i64> {
        conn.execute(
            "INSERT INTO assignments (container_id, migration_id, title, description, grading_type,
                                      points_possible, submission_types, assignment_group_id,
                                      external_tool_id, external_tool_url, position, workflow_state)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)",
            params![
                self.container_id,
                &self.migration_id,
                &self.title,
                &self.description,
                &self.grading_type,
                self.points_possible,
                self.submission_types.join(","),
                self.assignment_group_id,
                self.external_tool_id,
                &self.external_tool_url,
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
            "UPDATE assignments SET title = ?1, description = ?2, grading_type = ?3,
             points_possible = ?4, submission_types = ?5, assignment_group_id = ?6,
             external_tool_id = ?7, external_tool_url = ?8, position = ?9, workflow_state = ?10
             WHERE id = ?11",
            params![
                &self.title,
                &self.description,
                &self.grading_type,
                self.points_possible,
                self.submission_types.join(","),
                self.assignment_group_id,
                self.external_tool_id,
                &self.external_tool_url,
                self.position,
                self.workflow_state.as_str(),
                self.id,
            ],
        )?;
        Ok(())
    }

    pub fn set_description(conn: &Connection, id: i64, description: &str) -> Result<()> {
        conn.execute(
            "UPDATE assignments SET description = ?1 WHERE id = ?2",
            params![description, id],
        )?;
        Ok(())
    }

    pub fn find_by_migration_id(
        conn: &Connection,
        container_id: i64,
        migration_id: &str,
    ) -> Result<Option<Self>> {
        let sql = format!(
            "SELECT {ASSIGNMENT_COLUMNS} FROM assignments WHERE container_id = ?1 AND migration_id = ?2"
        );
        let assignment = conn
            .query_row(&sql, params![container_id, migration_id], Self::from_row)
            .optional()?;
        Ok(assignment)
    }

    pub fn list_for_container(conn: &Connection, container_id: i64) -> Result<Vec<Self>> {
        let sql = format!(
            "SELECT {ASSIGNMENT_COLUMNS} FROM assignments WHERE container_id = ?1 ORDER BY id"
        );
        let mut stmt = conn.prepare(&sql)?;
        let assignments = stmt
            .query_map([container_id], Self::from_row)?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(assignments)
    }

    /// Soft delete
    pub fn delete(conn: &Connection, id: i64) -> Result<()> {
        conn.execute(
            "UPDATE assignments SET workflow_state = 'deleted' WHERE id = ?1",
            [id],
        )?;
        Ok(())
    }

    fn from_row(row: &Row) -> rusqlite::Result<Self> {
        let submission_types: String = row.get(7)?;

        Ok(Self {
            id: Some(row.get(0)?),
            container_id: row.get(1)?,
            migration_id: row.get(2)?,
            title: row.get(3)?,
            description: row.get(4)?,
            grading_type: row.get(5)?,
            points_possible: row.get(6)?,
            submission_types: submission_types
                .split(',')
                .filter(|s| !s.is_empty())
                .map(String::from)
                .collect(),
            assignment_group_id: row.get(8)?,
            external_tool_id: row.get(9)?,
            external_tool_url: row.get(10)?,
            position: row.get(11)?,
            workflow_state: enum_column(row, 12)?,
        })
    }
}
