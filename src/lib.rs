// src/lib.rs

//! Cartridge: IMS Common Cartridge importer
//!
//! Converts Common Cartridge packages (`.imscc`/`.zip`) into a course
//! intermediate representation and imports it selectively into a SQLite
//! backed course store.
//!
//! # Architecture
//!
//! - Conversion is pure: archive, manifest, resolver and content converters
//!   produce a [`CourseIr`] plus migration issues, with no store access
//! - Import is idempotent: every object is keyed by `(container, migration_id)`
//! - Selection: a copy map limits a run to chosen categories and ids
//! - Issues are collected, never fatal, and stored with each run

pub mod archive;
pub mod config;
pub mod convert;
pub mod db;
mod error;
pub mod filesystem;
pub mod import;
pub mod ir;
pub mod issues;
pub mod manifest;
pub mod resolver;

pub use config::CartridgeConfig;
pub use convert::{CartridgeConverter, ConversionOptions, ConversionResult};
pub use error::{Error, Result};
pub use import::{ImportOptions, ImportReport, SelectionFilter, import_course, import_into};
pub use ir::{CourseIr, Overview};
pub use issues::{IssueList, IssueSeverity, MigrationIssue};
