// src/convert/modules.rs

//! Organization tree to module conversion
//!
//! Top-level container items become modules in order of appearance. Top-level
//! items that reference a resource directly are gathered into one synthesized
//! "Misc Module", which takes the slot where the first such item appeared.
//! Below a module root, structural items become sub-headers with their
//! children indented one level deeper; each structural item is also exposed
//! as a sub-module so it can be imported on its own.

use crate::ir::{ContentTagIr, ContentType, MISC_MODULE_ID, MISC_MODULE_TITLE, ModuleIr};
use crate::manifest::OrganizationItem;
use std::collections::HashMap;
use tracing::debug;

/// What a resource-referencing item points at
#[derive(Debug, Clone, PartialEq)]
pub struct ItemTarget {
    pub content_type: ContentType,
    /// Migration id of the target object
    pub target: Option<String>,
    pub url: Option<String>,
    /// Used when the organization item has no title
    pub title: Option<String>,
}

/// Resource id -> item target
pub type ItemTargets = HashMap<String, ItemTarget>;

fn leaf_tag(item: &OrganizationItem, indent: u32, targets: &ItemTargets) -> Option<ContentTagIr> {
    let resource_id = item.identifierref.as_deref()?;
    let Some(target) = targets.get(resource_id) else {
        debug!(
            "Item {} references {} which produced no content",
            item.identifier, resource_id
        );
        return None;
    };

    let title = if item.title.is_empty() {
        target.title.clone().unwrap_or_else(|| resource_id.to_string())
    } else {
        item.title.clone()
    };

    Some(ContentTagIr {
        migration_id: Some(item.identifier.clone()),
        content_type: target.content_type,
        target: target.target.clone(),
        title,
        url: target.url.clone(),
        indent,
    })
}

/// Flatten items below a module root into tags
fn collect_tags(
    children: &[OrganizationItem],
    indent: u32,
    targets: &ItemTargets,
    out: &mut Vec<ContentTagIr>,
) {
    for child in children {
        if child.is_leaf_resource() {
            if let Some(tag) = leaf_tag(child, indent, targets) {
                out.push(tag);
            }
            continue;
        }

        out.push(ContentTagIr {
            migration_id: Some(child.identifier.clone()),
            content_type: ContentType::SubHeader,
            target: None,
            title: child.title.clone(),
            url: None,
            indent,
        });
        collect_tags(&child.children, indent + 1, targets, out);
    }
}

fn submodules_of(item: &OrganizationItem, targets: &ItemTargets) -> Vec<ModuleIr> {
    item.children
        .iter()
        .filter(|child| !child.is_leaf_resource() && !child.children.is_empty())
        .map(|child| {
            let mut items = Vec::new();
            collect_tags(&child.children, 0, targets, &mut items);
            ModuleIr {
                migration_id: child.identifier.clone(),
                title: child.title.clone(),
                position: 0,
                items,
                submodules: submodules_of(child, targets),
                parent_migration_id: Some(item.identifier.clone()),
            }
        })
        .collect()
}

fn module_from(item: &OrganizationItem, targets: &ItemTargets) -> ModuleIr {
    let mut items = Vec::new();
    collect_tags(&item.children, 0, targets, &mut items);
    ModuleIr {
        migration_id: item.identifier.clone(),
        title: item.title.clone(),
        position: 0,
        items,
        submodules: submodules_of(item, targets),
        parent_migration_id: None,
    }
}

/// Convert the top-level organization items into positioned modules
pub fn convert_organization(items: &[OrganizationItem], targets: &ItemTargets) -> Vec<ModuleIr> {
    let mut modules: Vec<ModuleIr> = Vec::new();
    let mut misc_slot: Option<usize> = None;

    for item in items {
        if item.is_leaf_resource() {
            let slot = *misc_slot.get_or_insert_with(|| {
                modules.push(ModuleIr {
                    migration_id: MISC_MODULE_ID.to_string(),
                    title: MISC_MODULE_TITLE.to_string(),
                    ..Default::default()
                });
                modules.len() - 1
            });
            if let Some(tag) = leaf_tag(item, 0, targets) {
                modules[slot].items.push(tag);
            }
        } else {
            modules.push(module_from(item, targets));
        }
    }

    for (idx, module) in modules.iter_mut().enumerate() {
        module.position = idx as u32 + 1;
    }

    debug!(
        "Converted organization into {} modules (misc module: {})",
        modules.len(),
        misc_slot.is_some()
    );
    modules
}

/// Make a sub-module a standalone top-level module
///
/// Indents are already rebased to the sub-module root; only the parent link
/// is dropped.
pub fn promote_submodule(module: &ModuleIr, position: u32) -> ModuleIr {
    ModuleIr {
        position,
        parent_migration_id: None,
        ..module.clone()
    }
}
