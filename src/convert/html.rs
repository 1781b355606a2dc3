// src/convert/html.rs

//! HTML helpers used while converting package documents
//!
//! Links into the package are rewritten to the canonical
//! `$IMS-CC-FILEBASE$/<package path>` form. Store URLs are substituted later,
//! at import time, once the targets exist.

use crate::filesystem::path::resolve_package_path;
use crate::ir::FILEBASE_TOKEN;
use regex::{Captures, Regex};
use std::sync::LazyLock;

static LINK_ATTR_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"(?i)\b(href|src)\s*=\s*(?:"([^"]*)"|'([^']*)')"#).unwrap());
static BODY_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?is)<body[^>]*>(.*)</body>").unwrap());
static TITLE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?is)<title[^>]*>(.*?)</title>").unwrap());
static SCHEME_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z][A-Za-z0-9+.\-]*:").unwrap());

/// Contents of `<body>`, or the whole document when there is none
pub fn extract_body(html: &str) -> String {
    match BODY_RE.captures(html) {
        Some(caps) => caps[1].trim().to_string(),
        None => html.trim().to_string(),
    }
}

/// Text of `<title>`, if present and non-empty
pub fn extract_title(html: &str) -> Option<String> {
    TITLE_RE
        .captures(html)
        .map(|caps| caps[1].trim().to_string())
        .filter(|t| !t.is_empty())
}

/// Whether a link value points outside the package
fn is_external(value: &str) -> bool {
    value.is_empty()
        || value.starts_with('#')
        || value.starts_with("//")
        || value.starts_with('/')
        || (value.starts_with('$') && !value.starts_with(FILEBASE_TOKEN))
        || SCHEME_RE.is_match(value)
}

/// Resolve a package link against `base_dir`
///
/// `$IMS-CC-FILEBASE$` links and plain relative links are resolved against
/// the document's directory. When that path does not exist but the same path
/// from the package root does, the root-relative path wins. Returns `None`
/// for links that point outside the package.
pub fn resolve_link(base_dir: &str, value: &str, exists: &dyn Fn(&str) -> bool) -> Option<String> {
    let value = value.trim();
    let relative = match value.strip_prefix(FILEBASE_TOKEN) {
        Some(rest) => rest.trim_start_matches('/'),
        None if is_external(value) => return None,
        None => value,
    };

    let resolved = resolve_package_path(base_dir, relative);
    if resolved.is_empty() {
        return None;
    }
    if !exists(&resolved) {
        let from_root = resolve_package_path("", relative);
        if !from_root.is_empty() && exists(&from_root) {
            return Some(from_root);
        }
    }
    Some(resolved)
}

/// Canonical placeholder form of a package path
pub fn filebase_url(path: &str) -> String {
    format!("{}/{}", FILEBASE_TOKEN, path)
}

/// Rewrite `href`/`src` links into the package to placeholder form
pub fn normalize_links(html: &str, base_dir: &str, exists: &dyn Fn(&str) -> bool) -> String {
    LINK_ATTR_RE
        .replace_all(html, |caps: &Captures<'_>| {
            let attr = &caps[1];
            let (value, quote) = match (caps.get(2), caps.get(3)) {
                (Some(v), _) => (v.as_str(), '"'),
                (None, Some(v)) => (v.as_str(), '\''),
                (None, None) => return caps[0].to_string(),
            };
            // The fragment or query is carried over onto the placeholder
            let trimmed = value.trim();
            let suffix = &trimmed[trimmed.find(['#', '?']).unwrap_or(trimmed.len())..];
            match resolve_link(base_dir, value, exists) {
                Some(path) => format!("{attr}={quote}{}{suffix}{quote}", filebase_url(&path)),
                None => caps[0].to_string(),
            }
        })
        .into_owned()
}

/// Minimal escaping for plain text placed into HTML
pub fn escape_text(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}
