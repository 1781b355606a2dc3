// src/convert/mod.rs
//! Cartridge conversion
//!
//! Turns an archive into a [`CourseIr`](crate::ir::CourseIr) without touching
//! any store:
//!
//! 1. unpack the archive ([`crate::archive`])
//! 2. parse `imsmanifest.xml` ([`crate::manifest`])
//! 3. classify resources and merge external tools ([`crate::resolver`])
//! 4. run the per-type content converters
//! 5. build the file map and the module tree
//!
//! Links found in HTML are left in `$IMS-CC-FILEBASE$/<path>` form for the
//! importer to resolve.

mod content;
mod converter;
mod files;
pub mod html;
mod modules;
pub mod qti;

pub use content::{ContentContext, ConvertedContent, convert_content};
pub use converter::{
    COURSE_JSON, CartridgeConverter, ConversionOptions, ConversionResult, OVERVIEW_JSON,
};
pub use files::{build_file_map, file_migration_id};
pub use modules::{ItemTarget, ItemTargets, convert_organization, promote_submodule};
pub use qti::{BasicQtiConverter, QtiConverter, QtiOutput, QtiResource};
