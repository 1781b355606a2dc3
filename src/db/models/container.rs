// src/db/models/container.rs

//! Container model: the course receiving imported content

use crate::error::Result;
use rusqlite::{Connection, OptionalExtension, Row, params};

#[derive(Debug, Clone)]
pub struct Container {
    pub id: Option<i64>,
    pub name: String,
    pub syllabus_body: Option<String>,
    pub created_at: Option<String>,
}

impl Container {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: None,
            name: name.into(),
            syllabus_body: None,
            created_at: None,
        }
    }

    pub fn insert(&mut self, conn: &Connection) -> Result<i64> {
        conn.execute(
            "INSERT INTO containers (name, syllabus_body) VALUES (?1, ?2)",
            params![&self.name, &self.syllabus_body],
        )?;

        let id = conn.last_insert_rowid();
        self.id = Some(id);
        Ok(id)
    }

    pub fn find_by_id(conn: &Connection, id: i64) -> Result<Option<Self>> {
        let mut stmt = conn.prepare(
            "SELECT id, name, syllabus_body, created_at FROM containers WHERE id = ?1",
        )?;

        let container = stmt.query_row([id], Self::from_row).optional()?;
        Ok(container)
    }

    pub fn find_by_name(conn: &Connection, name: &str) -> Result<Option<Self>> {
        let mut stmt = conn.prepare(
            "SELECT id, name, syllabus_body, created_at FROM containers WHERE name = ?1",
        )?;

        let container = stmt.query_row([name], Self::from_row).optional()?;
        Ok(container)
    }

    /// Look a container up by name, creating it when missing
    pub fn find_or_create(conn: &Connection, name: &str) -> Result<Self> {
        if let Some(existing) = Self::find_by_name(conn, name)? {
            return Ok(existing);
        }

        let mut container = Self::new(name);
        container.insert(conn)?;
        Ok(container)
    }

    pub fn list_all(conn: &Connection) -> Result<Vec<Self>> {
        let mut stmt = conn.prepare(
            "SELECT id, name, syllabus_body, created_at FROM containers ORDER BY name",
        )?;

        let containers = stmt
            .query_map([], Self::from_row)?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(containers)
    }

    pub fn set_syllabus_body(conn: &Connection, id: i64, body: &str) -> Result<()> {
        conn.execute(
            "UPDATE containers SET syllabus_body = ?1 WHERE id = ?2",
            params![body, id],
        )?;
        Ok(())
    }

    fn from_row(row: &Row) -> rusqlite::Result<Self> {
        Ok(Self {
            id: Some(row.get(0)?),
            name: row.get(1)?,
            syllabus_body: row.get(2)?,
            created_at: row.get(3)?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::models::test_support::create_test_db;

    #[test]
    fn test_find_or_create_is_stable() {
        let (_temp, conn, existing_id) = create_test_db();

        let found = Container::find_or_create(&conn, "Test Course").unwrap();
        assert_eq!(found.id, Some(existing_id));

        let created = Container::find_or_create(&conn, "Other Course").unwrap();
        assert_ne!(created.id, Some(existing_id));
        assert_eq!(Container::list_all(&conn).unwrap().len(), 2);
    }

    #[test]
    fn test_set_syllabus_body() {
        let (_temp, conn, id) = create_test_db();

        Container::set_syllabus_body(&conn, id, "<p>Week 1</p>").unwrap();
        let container = Container::find_by_id(&conn, id).unwrap().unwrap();
        assert_eq!(container.syllabus_body.as_deref(), Some("<p>Week 1</p>"));
    }
}
