// src/filesystem/path.rs

//! Path handling for cartridge contents
//!
//! Cartridges are produced on every platform, so hrefs and archive entry
//! names may use either `/` or `\` as separator. Everything stored by this
//! crate uses the forward-slash, root-relative form produced here.

use crate::error::{Error, Result};
use std::path::{Component, Path, PathBuf};

/// Normalize a manifest href or archive entry name to forward-slash form
///
/// Backslashes become slashes, `.` segments and empty segments are dropped.
/// `..` segments are kept verbatim; use [`resolve_package_path`] to resolve
/// them against a base directory.
///
/// # Examples
///
/// ```
/// use cartridge::filesystem::path::normalize_href;
///
/// assert_eq!(normalize_href("a1\\a1.html"), "a1/a1.html");
/// assert_eq!(normalize_href("./w1//w2.html"), "w1/w2.html");
/// ```
pub fn normalize_href(href: &str) -> String {
    href.replace('\\', "/")
        .split('/')
        .filter(|segment| !segment.is_empty() && *segment != ".")
        .collect::<Vec<_>>()
        .join("/")
}

/// Sanitize an archive entry name from an untrusted source
///
/// Separators are normalized first, so `a\..\..\etc` is rejected the same
/// way as `a/../../etc`. Leading slashes are stripped to make the path
/// relative to the extraction root.
pub fn sanitize_path(path: impl AsRef<Path>) -> Result<PathBuf> {
    let path_str = path.as_ref().to_string_lossy().replace('\\', "/");
    let relative = path_str.trim_start_matches('/');

    let mut normalized = PathBuf::new();

    for component in Path::new(relative).components() {
        match component {
            Component::Normal(c) => normalized.push(c),
            Component::CurDir => {}
            Component::ParentDir => {
                return Err(Error::PathTraversal(path_str.to_string()));
            }
            Component::Prefix(_) | Component::RootDir => {}
        }
    }

    if normalized.as_os_str().is_empty() {
        return Err(Error::InvalidPath("Empty path after sanitization".to_string()));
    }

    Ok(normalized)
}

/// Safely join the extraction root with an untrusted entry name
pub fn safe_join(root: impl AsRef<Path>, path: impl AsRef<Path>) -> Result<PathBuf> {
    let root = root.as_ref();
    let sanitized = sanitize_path(path.as_ref())?;
    let joined = root.join(&sanitized);

    if let (Ok(canonical_root), Ok(canonical_joined)) =
        (root.canonicalize(), joined.canonicalize())
        && !canonical_joined.starts_with(&canonical_root)
    {
        return Err(Error::PathTraversal(format!(
            "Path {} escapes root {}",
            joined.display(),
            root.display()
        )));
    }

    Ok(joined)
}

/// Directory part of a package path (`""` for files at the root)
pub fn parent_dir(path: &str) -> &str {
    match path.rfind('/') {
        Some(idx) => &path[..idx],
        None => "",
    }
}

/// Final component of a package path
pub fn file_name(path: &str) -> &str {
    match path.rfind('/') {
        Some(idx) => &path[idx + 1..],
        None => path,
    }
}

/// Resolve a link found in a document located in `base_dir`
///
/// The link is percent-decoded, stripped of query and fragment, and its `..`
/// segments are resolved. Segments that would climb above the package root
/// are clamped at the root instead of failing, since cartridges in the wild
/// frequently carry links like `$IMS-CC-FILEBASE$../file.png`.
///
/// # Examples
///
/// ```
/// use cartridge::filesystem::path::resolve_package_path;
///
/// assert_eq!(resolve_package_path("pages", "../media/dog.jpg"), "media/dog.jpg");
/// assert_eq!(resolve_package_path("", "../../x.png"), "x.png");
/// assert_eq!(resolve_package_path("a", "b%20c.html#top"), "a/b c.html");
/// ```
pub fn resolve_package_path(base_dir: &str, link: &str) -> String {
    let link = link
        .split(['#', '?'])
        .next()
        .unwrap_or_default();
    let decoded = urlencoding::decode(link)
        .map(|d| d.into_owned())
        .unwrap_or_else(|_| link.to_string());
    let decoded = decoded.replace('\\', "/");

    let mut segments: Vec<&str> = if decoded.starts_with('/') {
        Vec::new()
    } else {
        base_dir
            .split('/')
            .filter(|s| !s.is_empty() && *s != ".")
            .collect()
    };

    for segment in decoded.split('/') {
        match segment {
            "" | "." => {}
            ".." => {
                segments.pop();
            }
            other => segments.push(other),
        }
    }

    segments.join("/")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_href_backslashes() {
        assert_eq!(normalize_href("a1\\a1.html"), "a1/a1.html");
        assert_eq!(normalize_href("w1\\sub\\w2.html"), "w1/sub/w2.html");
        assert_eq!(normalize_href("plain.html"), "plain.html");
    }

    #[test]
    fn test_normalize_href_keeps_non_ascii() {
        assert_eq!(normalize_href("files\\molé.txt"), "files/molé.txt");
    }

    #[test]
    fn test_sanitize_path_normal() {
        assert_eq!(
            sanitize_path("course_settings/syllabus.html").unwrap(),
            PathBuf::from("course_settings/syllabus.html")
        );
        assert_eq!(
            sanitize_path("/web_resources\\img.png").unwrap(),
            PathBuf::from("web_resources/img.png")
        );
    }

    #[test]
    fn test_sanitize_path_traversal_rejected() {
        assert!(sanitize_path("../etc/passwd").is_err());
        assert!(sanitize_path("a\\..\\..\\etc").is_err());
        assert!(sanitize_path("").is_err());
        assert!(sanitize_path("./").is_err());
    }

    #[test]
    fn test_safe_join_traversal_rejected() {
        let root = PathBuf::from("/tmp/cartridge");
        assert_eq!(
            safe_join(&root, "a/b.html").unwrap(),
            PathBuf::from("/tmp/cartridge/a/b.html")
        );
        assert!(safe_join(&root, "../b.html").is_err());
    }

    #[test]
    fn test_resolve_package_path() {
        assert_eq!(resolve_package_path("a/b", "c.png"), "a/b/c.png");
        assert_eq!(resolve_package_path("a/b", "../c.png"), "a/c.png");
        assert_eq!(resolve_package_path("a", "/root.png"), "root.png");
        assert_eq!(resolve_package_path("", "../../../dotdot.png"), "dotdot.png");
        assert_eq!(resolve_package_path("", "x.png?v=1"), "x.png");
    }

    #[test]
    fn test_parent_and_file_name() {
        assert_eq!(parent_dir("a/b/c.html"), "a/b");
        assert_eq!(parent_dir("c.html"), "");
        assert_eq!(file_name("a/b/c.html"), "c.html");
        assert_eq!(file_name("c.html"), "c.html");
    }
}
