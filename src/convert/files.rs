// src/convert/files.rs

//! Package file map

use crate::archive::ExtractedPackage;
use crate::filesystem::path::file_name;
use crate::ir::FileIr;
use crate::manifest::Manifest;
use crate::resolver::{Resolution, ResourceKind};
use md5::{Digest, Md5};
use std::collections::HashSet;
use tracing::debug;

/// Migration id for a file that is not its resource's main document
pub fn file_migration_id(path: &str) -> String {
    hex::encode(Md5::digest(path.as_bytes()))
}

/// Files of a resource that become attachments
///
/// Web content contributes every file. Descriptor-backed resources
/// (discussions, assignments) contribute only their extra files; the XML
/// descriptor itself is not course content.
fn attachment_paths<'a>(kind: &ResourceKind, href: Option<&'a str>, files: &'a [String]) -> Vec<&'a str> {
    match kind {
        ResourceKind::WebContent | ResourceKind::AssociatedContent => {
            let mut paths: Vec<&str> = files.iter().map(String::as_str).collect();
            if let Some(href) = href
                && !paths.contains(&href)
            {
                paths.insert(0, href);
            }
            paths
        }
        ResourceKind::DiscussionTopic | ResourceKind::CcAssignment => files
            .iter()
            .map(String::as_str)
            .filter(|f| Some(*f) != href)
            .collect(),
        _ => Vec::new(),
    }
}

/// Build the list of files imported as attachments
///
/// The file equal to a resource's main href keeps the resource identifier as
/// its migration id so module items can target it; other files are keyed by
/// the MD5 of their path. Paths in `excluded` (HTML promoted to pages) and
/// files absent from the package are left out. Each path appears once.
pub fn build_file_map(
    manifest: &Manifest,
    resolution: &Resolution,
    package: &ExtractedPackage,
    excluded: &HashSet<String>,
) -> Vec<FileIr> {
    let mut seen = HashSet::new();
    let mut files = Vec::new();

    for resource in manifest.resources.iter() {
        if resolution.is_superseded(&resource.identifier) {
            continue;
        }
        let Some(kind) = resolution.kind(&resource.identifier) else {
            continue;
        };
        let href = resource.primary_href();

        for path in attachment_paths(kind, href, &resource.files) {
            if excluded.contains(path) || seen.contains(path) {
                continue;
            }
            if !package.contains(path) {
                debug!("File {} of {} is not in the package", path, resource.identifier);
                continue;
            }
            seen.insert(path.to_string());

            let migration_id = if Some(path) == href && kind.carries_files() {
                resource.identifier.clone()
            } else {
                file_migration_id(path)
            };

            files.push(FileIr {
                migration_id,
                path_name: path.to_string(),
                display_name: file_name(path).to_string(),
            });
        }
    }

    files
}
