// src/resolver/lti.rs

//! Basic LTI link descriptors and tool deduplication

use crate::ir::{ExternalToolIr, VendorExtension};
use crate::manifest::xml::XmlElement;
use std::collections::{BTreeMap, HashMap};
use tracing::info;

/// Extension platform whose properties configure the tool itself
pub const CANVAS_PLATFORM: &str = "canvas.instructure.com";

/// One LTI link resource as declared, before deduplication
#[derive(Debug, Clone, PartialEq)]
pub struct LtiLink {
    pub resource_id: String,
    pub title: String,
    pub url: Option<String>,
    /// Declares an outcome, so a companion assignment is created
    pub assignment: bool,
    pub points_possible: Option<f64>,
}

fn properties(element: &XmlElement) -> BTreeMap<String, String> {
    element
        .children_named("property")
        .filter_map(|p| {
            p.attr("name")
                .map(|name| (name.to_string(), p.text().trim().to_string()))
        })
        .collect()
}

/// Parse a `cartridge_basiclti_link` descriptor
pub fn parse_blti(doc: &XmlElement, migration_id: &str) -> ExternalToolIr {
    let title = doc.find_text("title").unwrap_or_else(|| migration_id.to_string());
    let url = doc
        .find_text("launch_url")
        .or_else(|| doc.find_text("secure_launch_url"));

    let custom_fields = doc.find("custom").map(properties).unwrap_or_default();

    let mut tool = ExternalToolIr {
        migration_id: migration_id.to_string(),
        title,
        description: doc.find_text("description"),
        url,
        custom_fields,
        ..Default::default()
    };

    for ext in doc.descendants("extensions") {
        let platform = ext.attr("platform").unwrap_or_default().to_string();
        let mut fields = properties(ext);

        if platform == CANVAS_PLATFORM {
            tool.domain = fields.remove("domain").filter(|d| !d.is_empty());
            tool.privacy_level = fields.remove("privacy_level");
            tool.consumer_key = fields.remove("consumer_key").filter(|k| !k.is_empty());
            tool.shared_secret = fields.remove("shared_secret").filter(|s| !s.is_empty());
            if let Some(outcome) = fields.remove("outcome") {
                tool.assignment = true;
                tool.points_possible = outcome.trim().parse().ok();
            }
            if fields.is_empty() {
                continue;
            }
        }

        tool.vendor_extensions.push(VendorExtension {
            platform,
            custom_fields: fields,
        });
    }

    tool
}

/// Domain a tool launches on: the declared domain, else the launch URL host
pub fn tool_domain(tool: &ExternalToolIr) -> Option<String> {
    if let Some(domain) = &tool.domain {
        return Some(domain.to_ascii_lowercase());
    }
    let url = tool.url.as_deref()?;
    let parsed = url::Url::parse(url).ok()?;
    parsed.host_str().map(|h| h.to_ascii_lowercase())
}

/// Fold `other` into `survivor`
///
/// Fields already set on the survivor win; later tools only fill gaps.
/// Custom fields are unioned and vendor extensions concatenated.
fn merge_tool(survivor: &mut ExternalToolIr, other: ExternalToolIr, domain: &str) {
    if survivor.description.is_none() {
        survivor.description = other.description;
    }
    if survivor.privacy_level.is_none() {
        survivor.privacy_level = other.privacy_level;
    }
    if survivor.consumer_key.is_none() {
        survivor.consumer_key = other.consumer_key;
    }
    if survivor.shared_secret.is_none() {
        survivor.shared_secret = other.shared_secret;
    }
    for (key, value) in other.custom_fields {
        survivor.custom_fields.entry(key).or_insert(value);
    }
    survivor.vendor_extensions.extend(other.vendor_extensions);

    // Launches now vary per link; the tool matches by domain
    survivor.url = None;
    survivor.domain = Some(domain.to_string());
}

/// Combine tools that launch on the same domain
///
/// The first tool seen for a domain survives. Tools that carry a companion
/// assignment are never merged since their outcome settings are per tool.
/// Returns the surviving tools in declaration order and a redirect map from
/// every removed migration id to its survivor.
pub fn dedupe_tools(tools: Vec<ExternalToolIr>) -> (Vec<ExternalToolIr>, BTreeMap<String, String>) {
    let mut survivors: Vec<ExternalToolIr> = Vec::new();
    let mut by_domain: HashMap<String, usize> = HashMap::new();
    let mut redirects = BTreeMap::new();

    for tool in tools {
        let domain = if tool.assignment {
            None
        } else {
            tool_domain(&tool)
        };

        match domain {
            Some(domain) => match by_domain.get(&domain) {
                Some(&idx) => {
                    info!(
                        "Combining external tool {} into {} (domain {})",
                        tool.migration_id, survivors[idx].migration_id, domain
                    );
                    redirects.insert(tool.migration_id.clone(), survivors[idx].migration_id.clone());
                    merge_tool(&mut survivors[idx], tool, &domain);
                }
                None => {
                    by_domain.insert(domain, survivors.len());
                    survivors.push(tool);
                }
            },
            None => survivors.push(tool),
        }
    }

    (survivors, redirects)
}
