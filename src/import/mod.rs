// src/import/mod.rs

//! Selective content importer
//!
//! Materializes converted content in the store. Objects are keyed by
//! `(container, migration_id)` so importing the same package twice updates
//! rather than duplicates, and a selection filter limits a run to chosen
//! categories and ids.

mod collect;
mod importer;
mod index;
mod links;
mod positions;
mod selection;

pub use collect::collect_candidates;
pub use importer::{ImportOptions, ImportReport, import_course, import_into};
pub use index::{CreatedObjectIndex, ObjectKind};
pub use links::{LinkField, LinkRewriter};
pub use positions::{PositionPolicy, Sibling, renumber};
pub use selection::{CATEGORIES, SelectionFilter};
