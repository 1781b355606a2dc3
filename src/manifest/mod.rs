// src/manifest/mod.rs

//! IMS Common Cartridge manifest parsing
//!
//! Reads `imsmanifest.xml` into a resource table and an organization tree.
//! Every href is stored in forward-slash form regardless of the separator
//! used by the tool that produced the package.

mod organization;
mod resources;
pub mod xml;

pub use organization::{OrganizationItem, parse_organizations};
pub use resources::{ResourceEntry, ResourceTable, parse_resources};

use crate::error::{Error, Result};
use std::path::Path;
use tracing::info;

/// File name of the manifest at the package root
pub const MANIFEST_FILE: &str = "imsmanifest.xml";

/// A parsed manifest
#[derive(Debug, Clone, Default)]
pub struct Manifest {
    pub identifier: Option<String>,
    /// Course title from the manifest's LOM metadata
    pub title: Option<String>,
    pub schema_version: Option<String>,
    pub resources: ResourceTable,
    pub organization: Vec<OrganizationItem>,
}

impl Manifest {
    /// Parse manifest XML text
    pub fn parse(xml_text: &str) -> Result<Self> {
        let root = xml::parse_document(xml_text)
            .map_err(|e| Error::ManifestError(format!("unparseable manifest: {e}")))?;

        if root.name != "manifest" {
            return Err(Error::ManifestError(format!(
                "expected <manifest> root element, found <{}>",
                root.name
            )));
        }

        let metadata = root.child("metadata");
        let title = metadata
            .and_then(|m| m.find("general"))
            .and_then(|g| g.find("title"))
            .map(|t| t.text().trim().to_string())
            .filter(|t| !t.is_empty());
        let schema_version = metadata.and_then(|m| m.find_text("schemaversion"));

        let resources = root
            .child("resources")
            .map(parse_resources)
            .unwrap_or_default();
        let organization = parse_organizations(&root);

        info!(
            "Parsed manifest: {} resources, {} top-level items",
            resources.len(),
            organization.len()
        );

        Ok(Self {
            identifier: root.attr("identifier").map(str::to_string),
            title,
            schema_version,
            resources,
            organization,
        })
    }

    /// Read and parse the manifest at the root of an extracted package
    pub fn load(package_root: &Path) -> Result<Self> {
        let path = package_root.join(MANIFEST_FILE);
        if !path.exists() {
            return Err(Error::ManifestError(format!(
                "{} not found in package",
                MANIFEST_FILE
            )));
        }
        let text = std::fs::read_to_string(&path)?;
        Self::parse(&text)
    }

    /// Title of the first organization item that references a resource
    pub fn item_title_for(&self, resource_id: &str) -> Option<&str> {
        fn search<'a>(items: &'a [OrganizationItem], id: &str) -> Option<&'a str> {
            for item in items {
                if item.identifierref.as_deref() == Some(id) && !item.title.is_empty() {
                    return Some(&item.title);
                }
                if let Some(found) = search(&item.children, id) {
                    return Some(found);
                }
            }
            None
        }
        search(&self.organization, resource_id)
    }

    /// Whether any organization item references the resource
    pub fn is_referenced(&self, resource_id: &str) -> bool {
        self.organization
            .iter()
            .any(|item| item.referenced_resources().contains(&resource_id))
    }
}
