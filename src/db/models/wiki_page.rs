// src/db/models/wiki_page.rs

//! Wiki page model
//!
//! Pages are addressed by a URL slug derived from the title, unique within
//! the container.

use super::{WorkflowState, enum_column};
use crate::error::Result;
use rusqlite::{Connection, OptionalExtension, Row, params};

const COLUMNS: &str = "id, container_id, migration_id, title, url, body, workflow_state";

/// Lowercase, dash-separated slug of a page title
pub fn slugify(title: &str) -> String {
    let mut slug = String::with_capacity(title.len());
    let mut pending_dash = false;

    for c in title.chars() {
        if c.is_alphanumeric() {
            if pending_dash && !slug.is_empty() {
                slug.push('-');
            }
            pending_dash = false;
            slug.extend(c.to_lowercase());
        } else {
            pending_dash = true;
        }
    }

    if slug.is_empty() {
        "page".to_string()
    } else {
        slug
    }
}

#[derive(Debug, Clone)]
pub struct WikiPage {
    pub id: Option<i64>,
    pub container_id: i64,
    pub migration_id: String,
    pub title: String,
    /// URL slug
    pub url: String,
    pub body: String,
    pub workflow_state: WorkflowState,
}

impl WikiPage {
    pub fn new(container_id: i64, migration_id: impl Into<String>, title: impl Into<String>) -> Self {
        let title = title.into();
        Self {
            id: None,
            container_id,
            migration_id: migration_id.into(),
            url: slugify(&title),
            title,
            body: String::new(),
            workflow_state: WorkflowState::Active,
        }
    }

    /// Pick a slug not used by any other page in the container
    pub fn assign_unique_url(&mut self, conn: &Connection) -> Result<()> {
        let base = slugify(&self.title);
        let mut candidate = base.clone();
        let mut n = 1;

        loop {
            let taken: Option<i64> = conn
                .query_row(
                    "SELECT id FROM wiki_pages WHERE container_id = ?1 AND url = ?2",
                    params![self.container_id, &candidate],
                    |row| row.get(0),
                )
                .optional()?;

            match taken {
                Some(id) if Some(id) != self.id => {
                    n += 1;
                    candidate = format!("{}-{}", base, n);
                }
                _ => break,
            }
        }

        self.url = candidate;
        Ok(())
    }

    pub fn insert(&mut self, conn: &Connection) -> Result<i64> {
        conn.execute(
            "INSERT INTO wiki_pages (container_id, migration_id, title, url, body, workflow_state)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                self.container_id,
                &self.migration_id,
                &self.title,
                &self.url,
                &self.body,
                self.workflow_state.as_str(),
            ],
        )?;

        let id = conn.last_insert_rowid();
        self.id = Some(id);
        Ok(id)
    }

    pub fn update(&self, conn: &Connection) -> Result<()> {
        conn.execute(
            "UPDATE wiki_pages SET title = ?1, url = ?2, body = ?3, workflow_state = ?4 WHERE id = ?5",
            params![
                &self.title,
                &self.url,
                &self.body,
                self.workflow_state.as_str(),
                self.id,
            ],
        )?;
        Ok(())
    }

    pub fn set_body(conn: &Connection, id: i64, body: &str) -> Result<()> {
        conn.execute("UPDATE wiki_pages SET body = ?1 WHERE id = ?2", params![body, id])?;
        Ok(())
    }

    pub fn find_by_migration_id(
        conn: &Connection,
        container_id: i64,
        migration_id: &str,
    ) -> Result<Option<Self>> {
        let sql = format!(
            "SELECT {COLUMNS} FROM wiki_pages WHERE container_id = ?1 AND migration_id = ?2"
        );
        let page = conn
            .query_row(&sql, params![container_id, migration_id], Self::from_row)
            .optional()?;
        Ok(page)
    }

    pub fn list_for_container(conn: &Connection, container_id: i64) -> Result<Vec<Self>> {
        let sql = format!("SELECT {COLUMNS} FROM wiki_pages WHERE container_id = ?1 ORDER BY id");
        let mut stmt = conn.prepare(&sql)?;
        let pages = stmt
            .query_map([container_id], Self::from_row)?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(pages)
    }

    fn from_row(row: &Row) -> rusqlite::Result<Self> {
        Ok(Self {
            id: Some(row.get(0)?),
            container_id: row.get(1)?,
            migration_id: row.get(2)?,
            title: row.get(3)?,
            url: row.get(4)?,
            body: row.get(5)?,
            workflow_state: enum_column(row, 6)?,
        })
    }
}
