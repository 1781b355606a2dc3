// src/resolver/mod.rs

//! Resource classification and external tool resolution
//!
//! Every manifest resource is classified into a closed [`ResourceKind`].
//! Recognized-but-unsupported families and unknown types are reported as
//! migration issues and skipped. LTI link descriptors are parsed and
//! deduplicated by launch domain; the result is an immutable tool list plus
//! a redirect map from removed tool ids to their survivors.

mod lti;

pub use lti::{CANVAS_PLATFORM, LtiLink, dedupe_tools, parse_blti, tool_domain};

use crate::archive::ExtractedPackage;
use crate::error::Result;
use crate::ir::ExternalToolIr;
use crate::issues::{IssueList, MigrationIssue};
use crate::manifest::{Manifest, ResourceEntry, xml};
use std::collections::{BTreeMap, HashMap, HashSet};
use tracing::{debug, info, warn};

/// Resource families that are recognized but never imported
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UnsupportedFamily {
    Apip,
    Iwb,
    Epub3,
}

impl UnsupportedFamily {
    /// Name shown to users
    pub fn label(&self) -> &'static str {
        match self {
            UnsupportedFamily::Apip => "APIP",
            UnsupportedFamily::Iwb => "IWB",
            UnsupportedFamily::Epub3 => "EPub3",
        }
    }

    /// Issue text reported once per family
    pub fn issue_text(&self) -> String {
        format!(
            "This package includes {} file(s), which are not supported and were not imported.",
            self.label()
        )
    }
}

/// Classified resource type
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResourceKind {
    WebContent,
    AssociatedContent,
    WebLink,
    DiscussionTopic,
    Assessment,
    QuestionBank,
    LtiLink,
    /// `assignment_xmlv1p0` cartridge extension
    CcAssignment,
    Unsupported(UnsupportedFamily),
    /// Anything else, with the raw type string
    Unknown(String),
}

impl ResourceKind {
    /// Classify a raw `type` attribute
    pub fn classify(resource_type: &str) -> Self {
        let t = resource_type.trim().to_ascii_lowercase();

        if t == "webcontent" {
            ResourceKind::WebContent
        } else if t.starts_with("associatedcontent") {
            ResourceKind::AssociatedContent
        } else if t.starts_with("imswl_") {
            ResourceKind::WebLink
        } else if t.starts_with("imsdt_") {
            ResourceKind::DiscussionTopic
        } else if t.starts_with("imsqti_") && t.ends_with("/question-bank") {
            ResourceKind::QuestionBank
        } else if t.starts_with("imsqti_") && t.ends_with("/assessment") {
            ResourceKind::Assessment
        } else if t.starts_with("imsbasiclti_") {
            ResourceKind::LtiLink
        } else if t.starts_with("assignment_xmlv") {
            ResourceKind::CcAssignment
        } else if t.starts_with("imsapip_") {
            ResourceKind::Unsupported(UnsupportedFamily::Apip)
        } else if t.starts_with("imsiwb_") {
            ResourceKind::Unsupported(UnsupportedFamily::Iwb)
        } else if t.starts_with("idpfepub_") {
            ResourceKind::Unsupported(UnsupportedFamily::Epub3)
        } else {
            ResourceKind::Unknown(resource_type.to_string())
        }
    }

    /// Whether the resource's files belong in the course file tree
    pub fn carries_files(&self) -> bool {
        matches!(
            self,
            ResourceKind::WebContent | ResourceKind::AssociatedContent
        )
    }
}

/// Output of the resolution pass
#[derive(Debug, Clone, Default)]
pub struct Resolution {
    kinds: HashMap<String, ResourceKind>,
    /// Resource id -> id of the variant that replaces it
    variants: HashMap<String, String>,
    /// Deduplicated tools in declaration order
    pub tools: Vec<ExternalToolIr>,
    /// Removed tool id -> surviving tool id
    pub tool_redirects: BTreeMap<String, String>,
    /// Every LTI link resource as declared
    pub lti_links: Vec<LtiLink>,
}

impl Resolution {
    pub fn kind(&self, resource_id: &str) -> Option<&ResourceKind> {
        self.kinds.get(resource_id)
    }

    /// Resource that should be used in place of `resource_id`
    pub fn effective_id<'a>(&'a self, resource_id: &'a str) -> &'a str {
        self.variants
            .get(resource_id)
            .map(String::as_str)
            .unwrap_or(resource_id)
    }

    /// True when another resource was declared as the preferred variant
    pub fn is_superseded(&self, resource_id: &str) -> bool {
        self.variants.contains_key(resource_id)
    }

    /// Surviving tool id for an LTI link resource
    pub fn tool_id<'a>(&'a self, resource_id: &'a str) -> &'a str {
        self.tool_redirects
            .get(resource_id)
            .map(String::as_str)
            .unwrap_or(resource_id)
    }

    pub fn tool(&self, resource_id: &str) -> Option<&ExternalToolIr> {
        let id = self.tool_id(resource_id);
        self.tools.iter().find(|t| t.migration_id == id)
    }

    pub fn lti_link(&self, resource_id: &str) -> Option<&LtiLink> {
        self.lti_links.iter().find(|l| l.resource_id == resource_id)
    }
}

/// Classify every resource and resolve external tools
pub fn resolve(
    manifest: &Manifest,
    package: &ExtractedPackage,
    issues: &mut IssueList,
) -> Result<Resolution> {
    let mut resolution = Resolution::default();
    let mut reported_families = HashSet::new();
    let mut reported_unknown = HashSet::new();
    let mut tools = Vec::new();

    for resource in manifest.resources.iter() {
        let kind = ResourceKind::classify(&resource.resource_type);
        debug!("Resource {} classified as {:?}", resource.identifier, kind);

        if let Some(preferred) = &resource.preferred_resource
            && preferred != &resource.identifier
            && manifest.resources.get(preferred).is_some()
        {
            resolution
                .variants
                .insert(resource.identifier.clone(), preferred.clone());
        }

        match &kind {
            ResourceKind::Unsupported(family) => {
                if reported_families.insert(*family) {
                    warn!("Skipping unsupported {} resources", family.label());
                    issues.push(MigrationIssue::warning(family.issue_text()));
                }
            }
            ResourceKind::Unknown(raw) => {
                if reported_unknown.insert(raw.clone()) {
                    issues.push(MigrationIssue::warning(format!(
                        "Unsupported resource type '{}' for resource '{}' was skipped",
                        raw, resource.identifier
                    )));
                }
            }
            ResourceKind::LtiLink if !resolution.variants.contains_key(&resource.identifier) => {
                if let Some(tool) = read_tool(resource, package, issues) {
                    resolution.lti_links.push(LtiLink {
                        resource_id: resource.identifier.clone(),
                        title: manifest
                            .item_title_for(&resource.identifier)
                            .map(str::to_string)
                            .unwrap_or_else(|| tool.title.clone()),
                        url: tool.url.clone(),
                        assignment: tool.assignment,
                        points_possible: tool.points_possible,
                    });
                    tools.push(tool);
                }
            }
            _ => {}
        }

        resolution.kinds.insert(resource.identifier.clone(), kind);
    }

    let (tools, redirects) = dedupe_tools(tools);
    for tool in &tools {
        if tool.consumer_key.is_none() || tool.shared_secret.is_none() {
            issues.push(
                MigrationIssue::warning(format!(
                    "The security parameters for the external tool \"{}\" may need to be set in Course Settings.",
                    tool.title
                ))
                .about("context_external_tools", &tool.migration_id),
            );
        }
    }

    info!(
        "Resolved {} resources ({} external tools, {} merged)",
        manifest.resources.len(),
        tools.len(),
        redirects.len()
    );

    resolution.tools = tools;
    resolution.tool_redirects = redirects;
    Ok(resolution)
}

fn read_tool(
    resource: &ResourceEntry,
    package: &ExtractedPackage,
    issues: &mut IssueList,
) -> Option<ExternalToolIr> {
    let parsed = resource
        .primary_href()
        .ok_or_else(|| "no descriptor file".to_string())
        .and_then(|href| package.read_to_string(href).map_err(|e| e.to_string()))
        .and_then(|text| xml::parse_document(&text).map_err(|e| e.to_string()));

    match parsed {
        Ok(doc) => Some(parse_blti(&doc, &resource.identifier)),
        Err(e) => {
            warn!("External tool {} unreadable: {}", resource.identifier, e);
            issues.push(
                MigrationIssue::warning(format!(
                    "The external tool descriptor for resource '{}' could not be read",
                    resource.identifier
                ))
                .about("context_external_tools", &resource.identifier),
            );
            None
        }
    }
}
