// src/filesystem/mod.rs

//! Filesystem helpers for unpacked packages

pub mod path;
