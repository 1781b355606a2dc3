// src/db/models/external_tool.rs

//! External (LTI) tool model
//!
//! Custom fields and vendor extensions are stored together as a JSON
//! `settings` document.

use super::{WorkflowState, enum_column};
use crate::error::Result;
use crate::ir::{ExternalToolIr, VendorExtension};
use rusqlite::{Connection, OptionalExtension, Row, params};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

const COLUMNS: &str = "id, container_id, migration_id, name, description, url, domain, \
     privacy_level, consumer_key, shared_secret, settings, workflow_state";

/// JSON payload of the `settings` column
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ToolSettings {
    #[serde(default)]
    pub custom_fields: BTreeMap<String, String>,
    #[serde(default)]
    pub vendor_extensions: Vec<VendorExtension>,
}

#[derive(Debug, Clone)]
pub struct ExternalTool {
    pub id: Option<i64>,
    pub container_id: i64,
    pub migration_id: String,
    pub name: String,
    pub description: Option<String>,
    pub url: Option<String>,
    pub domain: Option<String>,
    pub privacy_level: Option<String>,
    pub consumer_key: Option<String>,
    pub shared_secret: Option<String>,
    pub settings: ToolSettings,
    pub workflow_state: WorkflowState,
}

impl ExternalTool {
    pub fn new(container_id: i64, migration_id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: None,
            container_id,
            migration_id: migration_id.into(),
            name: name.into(),
            description: None,
            url: None,
            domain: None,
            privacy_level: None,
            consumer_key: None,
            shared_secret: None,
            settings: ToolSettings::default(),
            workflow_state: WorkflowState::Active,
        }
    }

    /// Copy the tool declaration fields from the IR
    pub fn apply_ir(&mut self, tool: &ExternalToolIr) {
        self.name = tool.title.clone();
        self.description = tool.description.clone();
        self.url = tool.url.clone();
        self.domain = tool.domain.clone();
        self.privacy_level = tool.privacy_level.clone();
        self.consumer_key = tool.consumer_key.clone();
        self.shared_secret = tool.shared_secret.clone();
        self.settings = ToolSettings {
            custom_fields: tool.custom_fields.clone(),
            vendor_extensions: tool.vendor_extensions.clone(),
        };
    }

    pub fn insert(&mut self, conn: &Connection) -> Result<i64> {
        let settings = serde_json::to_string(&self.settings)?;
        conn.execute(
            "INSERT INTO external_tools (container_id, migration_id, name, description, url, domain,
                                         privacy_level, consumer_key, shared_secret, settings,
                                         workflow_state)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)",
            params![
                self.container_id,
                &self.migration_id,
                &self.name,
                &self.description,
                &self.url,
                &self.domain,
                &self.privacy_level,
                &self.consumer_key,
                &self.shared_secret,
                settings,
                self.workflow_state.as_str(),
            ],
        )?;

        let id = conn.last_insert_rowid();
        self.id = Some(id);
        Ok(id)
    }

    pub fn update(&self, conn: &Connection) -> Result<()> {
        let settings = serde_json::to_string(&self.settings)?;
        conn.execute(
            "UPDATE external_tools SET name = ?1, description = ?2, url = ?3, domain = ?4,
             privacy_level = ?5, consumer_key = ?6, shared_secret = ?7, settings = ?8,
             workflow_state = ?9 WHERE id = ?10",
            params![
                &self.name,
                &self.description,
                &self.url,
                &self.domain,
                &self.privacy_level,
                &self.consumer_key,
                &self.shared_secret,
                settings,
                self.workflow_state.as_str(),
                self.id,
            ],
        )?;
        Ok(())
    }

    pub fn find_by_migration_id(
        conn: &Connection,
        container_id: i64,
        migration_id: &str,
    ) -> Result<Option<Self>> {
        let sql = format!(
            "SELECT {COLUMNS} FROM external_tools WHERE container_id = ?1 AND migration_id = ?2"
        );
        let tool = conn
            .query_row(&sql, params![container_id, migration_id], Self::from_row)
            .optional()?;
        Ok(tool)
    }

    pub fn list_for_container(conn: &Connection, container_id: i64) -> Result<Vec<Self>> {
        let sql = format!("SELECT {COLUMNS} FROM external_tools WHERE container_id = ?1 ORDER BY id");
        let mut stmt = conn.prepare(&sql)?;
        let tools = stmt
            .query_map([container_id], Self::from_row)?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(tools)
    }

    fn from_row(row: &Row) -> rusqlite::Result<Self> {
        let settings_json: String = row.get(10)?;
        let settings = serde_json::from_str(&settings_json).map_err(|e| {
            rusqlite::Error::FromSqlConversionFailure(
                10,
                rusqlite::types::Type::Text,
                Box::new(e),
            )
        })?;

        Ok(Self {
            id: Some(row.get(0)?),
            container_id: row.get(1)?,
            migration_id: row.get(2)?,
            name: row.get(3)?,
            description: row.get(4)?,
            url: row.get(5)?,
            domain: row.get(6)?,
            privacy_level: row.get(7)?,
            consumer_key: row.get(8)?,
            shared_secret: row.get(9)?,
            settings,
            workflow_state: enum_column(row, 11)?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::models::test_support::create_test_db;

    #[test]
    fn test_settings_round_trip() {
        let (_temp, conn, course) = create_test_db();

        let mut ir = ExternalToolIr {
            migration_id: "t1".to_string(),
            title: "Tool".to_string(),
            domain: Some("example.com".to_string()),
            ..Default::default()
        };
        ir.custom_fields.insert("key1".to_string(), "value1".to_string());
        ir.vendor_extensions.push(VendorExtension {
            platform: "my.lms.com".to_string(),
            custom_fields: BTreeMap::from([("key".to_string(), "value".to_string())]),
        });

        let mut tool = ExternalTool::new(course, "t1", "");
        tool.apply_ir(&ir);
        tool.insert(&conn).unwrap();

        let found = ExternalTool::find_by_migration_id(&conn, course, "t1").unwrap().unwrap();
        assert_eq!(found.name, "Tool");
        assert_eq!(found.settings.custom_fields["key1"], "value1");
        assert_eq!(found.settings.vendor_extensions[0].platform, "my.lms.com");
    }
}
