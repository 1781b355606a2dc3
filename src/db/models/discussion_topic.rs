// src/db/models/discussion_topic.rs

use super::{WorkflowState, enum_column};
use crate::error::Result;
use rusqlite::{Connection, OptionalExtension, Row, params};

const COLUMNS: &str = "id, container_id, migration_id, title, message, workflow_state";

#[derive(Debug, Clone)]
pub struct DiscussionTopic {
    pub id: Option<i64>,
    pub container_id: i64,
    pub migration_id: String,
    pub title: String,
    pub message: String,
    pub workflow_state: WorkflowState,
}

impl DiscussionTopic {
    pub fn new(container_id: i64, migration_id: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            id: None,
            container_id,
            migration_id: migration_id.into(),
            title: title.into(),
            message: String::new(),
            workflow_state: WorkflowState::Active,
        }
    }

    pub fn insert(&mut self, conn: &Connection) -> Result<i64> {
        conn.execute(
            "INSERT INTO discussion_topics (container_id, migration_id, title, message, workflow_state)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                self.container_id,
                &self.migration_id,
                &self.title,
                &self.message,
                self.workflow_state.as_str(),
            ],
        )?;

        let id = conn.last_insert_rowid();
        self.id = Some(id);
        Ok(id)
    }

    pub fn update(&self, conn: &Connection) -> Result<()> {
        conn.execute(
            "UPDATE discussion_topics SET title = ?1, message = ?2, workflow_state = ?3 WHERE id = ?4",
            params![&self.title, &self.message, self.workflow_state.as_str(), self.id],
        )?;
        Ok(())
    }

    pub fn set_message(conn: &Connection, id: i64, message: &str) -> Result<()> {
        conn.execute(
            "UPDATE discussion_topics SET message = ?1 WHERE id = ?2",
            params![message, id],
        )?;
        Ok(())
    }

    pub fn find_by_migration_id(
        conn: &Connection,
        container_id: i64,
        migration_id: &str,
    ) -> Result<Option<Self>> {
        let sql = format!(
            "SELECT {COLUMNS} FROM discussion_topics WHERE container_id = ?1 AND migration_id = ?2"
        );
        let topic = conn
            .query_row(&sql, params![container_id, migration_id], Self::from_row)
            .optional()?;
        Ok(topic)
    }

    pub fn list_for_container(conn: &Connection, container_id: i64) -> Result<Vec<Self>> {
        let sql = format!("SELECT {COLUMNS} FROM discussion_topics WHERE container_id = ?1 ORDER BY id");
        let mut stmt = conn.prepare(&sql)?;
        let topics = stmt
            .query_map([container_id], Self::from_row)?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(topics)
    }

    fn from_row(row: &Row) -> rusqlite::Result<Self> {
        Ok(Self {
            id: Some(row.get(0)?),
            container_id: row.get(1)?,
            migration_id: row.get(2)?,
            title: row.get(3)?,
            message: row.get(4)?,
            workflow_state: enum_column(row, 5)?,
        })
    }
}
