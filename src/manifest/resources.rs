// src/manifest/resources.rs

//! Resource table built from `<resources>`

use super::xml::XmlElement;
use crate::filesystem::path::normalize_href;
use std::collections::{BTreeMap, HashMap};

/// A manifest-declared resource
///
/// Created during manifest parsing and read-only afterwards. Unknown
/// resource types are kept with their raw type string.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ResourceEntry {
    pub identifier: String,
    /// Raw `type` attribute
    pub resource_type: String,
    /// Slash-normalized `href`
    pub href: Option<String>,
    /// Slash-normalized `<file href>` values in declaration order
    pub files: Vec<String>,
    /// `intendeduse` attribute (assignment, syllabus, lessonplan, ...)
    pub intended_use: Option<String>,
    /// `<variant identifierref>`: the resource preferred over this one
    pub preferred_resource: Option<String>,
    /// Leaf values found under the resource's `<metadata>`
    pub metadata: BTreeMap<String, String>,
}

impl ResourceEntry {
    /// The href if declared, else the first file
    ///
    /// CC 1.0 does not require an href on webcontent resources.
    pub fn primary_href(&self) -> Option<&str> {
        self.href
            .as_deref()
            .or_else(|| self.files.first().map(String::as_str))
    }

    pub(crate) fn from_element(node: &XmlElement) -> Option<Self> {
        let identifier = node.attr("identifier")?.to_string();

        let files = node
            .children_named("file")
            .filter_map(|f| f.attr("href"))
            .map(normalize_href)
            .collect();

        let preferred_resource = node
            .child("variant")
            .and_then(|v| v.attr("identifierref"))
            .map(str::to_string);

        let mut metadata = BTreeMap::new();
        if let Some(meta) = node.child("metadata") {
            collect_leaves(meta, &mut metadata);
        }

        Some(Self {
            identifier,
            resource_type: node.attr("type").unwrap_or_default().to_string(),
            href: node.attr("href").map(normalize_href),
            files,
            intended_use: node
                .attr("intendeduse")
                .map(|u| u.trim().to_ascii_lowercase())
                .filter(|u| !u.is_empty()),
            preferred_resource,
            metadata,
        })
    }
}

fn collect_leaves(element: &XmlElement, out: &mut BTreeMap<String, String>) {
    let mut has_children = false;
    for child in element.elements() {
        has_children = true;
        collect_leaves(child, out);
    }
    if !has_children {
        let text = element.text().trim().to_string();
        if !text.is_empty() {
            out.entry(element.name.clone()).or_insert(text);
        }
    }
}

/// Resources keyed by identifier, iterated in declaration order
#[derive(Debug, Clone, Default)]
pub struct ResourceTable {
    entries: Vec<ResourceEntry>,
    index: HashMap<String, usize>,
}

impl ResourceTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a resource; a repeated identifier replaces the earlier entry
    pub fn insert(&mut self, entry: ResourceEntry) {
        match self.index.get(&entry.identifier) {
            Some(&idx) => {
                tracing::warn!("Duplicate resource identifier {}", entry.identifier);
                self.entries[idx] = entry;
            }
            None => {
                self.index.insert(entry.identifier.clone(), self.entries.len());
                self.entries.push(entry);
            }
        }
    }

    pub fn get(&self, identifier: &str) -> Option<&ResourceEntry> {
        self.index.get(identifier).map(|&idx| &self.entries[idx])
    }

    pub fn iter(&self) -> std::slice::Iter<'_, ResourceEntry> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl FromIterator<ResourceEntry> for ResourceTable {
    fn from_iter<T: IntoIterator<Item = ResourceEntry>>(iter: T) -> Self {
        let mut table = Self::new();
        for entry in iter {
            table.insert(entry);
        }
        table
    }
}

/// Build the resource table from any element containing `<resource>` nodes
pub fn parse_resources(root: &XmlElement) -> ResourceTable {
    root.descendants("resource")
        .into_iter()
        .filter_map(|node| {
            let entry = ResourceEntry::from_element(node);
            if entry.is_none() {
                tracing::warn!("Skipping <resource> without an identifier");
            }
            entry
        })
        .collect()
}
