// src/archive/mod.rs

//! Cartridge archive handling
//!
//! Unpacks a zip/IMSCC file into a scratch directory and writes the
//! aggregate `all_files.zip` used for bulk download of package files.
//!
//! Entry names are normalized on the way out: separators become `/`,
//! names stored as UTF-8 without the zip UTF-8 flag are still read as
//! UTF-8, and entries that would land outside the root are skipped.

use crate::error::{Error, Result};
use crate::filesystem::path::{normalize_href, safe_join};
use crate::ir::FileIr;
use std::fs::{self, File};
use std::io;
use std::path::{Path, PathBuf};
use tempfile::TempDir;
use tracing::{debug, info, warn};
use walkdir::WalkDir;

/// Maximum size for a single extracted entry (512 MB)
pub const MAX_EXTRACTION_FILE_SIZE: u64 = 512 * 1024 * 1024;

/// File name of the aggregate archive
pub const ALL_FILES_ZIP: &str = "all_files.zip";

/// An unpacked package
///
/// When extracted into a scratch directory the directory is removed when
/// this value is dropped.
#[derive(Debug)]
pub struct ExtractedPackage {
    root: PathBuf,
    files: Vec<String>,
    _scratch: Option<TempDir>,
}

impl ExtractedPackage {
    /// Wrap an already unpacked directory
    pub fn from_dir(root: impl Into<PathBuf>) -> Result<Self> {
        let root = root.into();
        if !root.is_dir() {
            return Err(Error::NotFound(format!(
                "package directory {}",
                root.display()
            )));
        }
        let files = list_files(&root);
        Ok(Self {
            root,
            files,
            _scratch: None,
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Slash-normalized relative paths of every extracted file, sorted
    pub fn files(&self) -> &[String] {
        &self.files
    }

    pub fn contains(&self, path: &str) -> bool {
        self.files.binary_search_by(|f| f.as_str().cmp(path)).is_ok()
    }

    /// Read a package file as text (lossy for invalid UTF-8)
    pub fn read_to_string(&self, path: &str) -> Result<String> {
        let full = safe_join(&self.root, path)?;
        let bytes = fs::read(&full).map_err(|e| {
            Error::IoError(format!("Failed to read {}: {}", path, e))
        })?;
        Ok(String::from_utf8_lossy(&bytes).into_owned())
    }
}

fn list_files(root: &Path) -> Vec<String> {
    let mut files: Vec<String> = WalkDir::new(root)
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file())
        .filter_map(|e| {
            e.path()
                .strip_prefix(root)
                .ok()
                .map(|p| normalize_href(&p.to_string_lossy()))
        })
        .collect();
    files.sort();
    files
}

/// Extracts cartridge archives
#[derive(Debug, Clone, Default)]
pub struct ArchiveExtractor {
    scratch_dir: Option<PathBuf>,
}

impl ArchiveExtractor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Unpack into temporary directories under `dir` instead of the system temp dir
    pub fn with_scratch_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.scratch_dir = Some(dir.into());
        self
    }

    /// Unpack into a fresh scratch directory owned by the returned package
    pub fn extract(&self, archive: &Path) -> Result<ExtractedPackage> {
        let scratch = match &self.scratch_dir {
            Some(dir) => {
                fs::create_dir_all(dir)?;
                tempfile::Builder::new()
                    .prefix("cartridge-")
                    .tempdir_in(dir)?
            }
            None => tempfile::Builder::new().prefix("cartridge-").tempdir()?,
        };

        let root = scratch.path().to_path_buf();
        extract_archive(archive, &root)?;
        let files = list_files(&root);

        Ok(ExtractedPackage {
            root,
            files,
            _scratch: Some(scratch),
        })
    }

    /// Unpack into `dest`, which outlives the returned package
    pub fn extract_into(&self, archive: &Path, dest: &Path) -> Result<ExtractedPackage> {
        fs::create_dir_all(dest)?;
        extract_archive(archive, dest)?;
        ExtractedPackage::from_dir(dest)
    }
}

/// Decode an entry name, preferring UTF-8 over the zip-declared encoding
fn entry_name(entry: &zip::read::ZipFile<'_>) -> String {
    match std::str::from_utf8(entry.name_raw()) {
        Ok(name) => name.to_string(),
        Err(_) => entry.name().to_string(),
    }
}

/// Unpack every entry of `archive` below `dest`
///
/// Returns the number of files written.
pub fn extract_archive(archive: &Path, dest: &Path) -> Result<usize> {
    let file = File::open(archive).map_err(|e| {
        Error::ArchiveError(format!("Failed to open {}: {}", archive.display(), e))
    })?;
    let mut zip = zip::ZipArchive::new(file)?;
    info!("Extracting {} ({} entries)", archive.display(), zip.len());

    let mut written = 0;
    for i in 0..zip.len() {
        let mut entry = zip.by_index(i)?;
        let name = normalize_href(&entry_name(&entry));
        if name.is_empty() {
            continue;
        }

        let target = match safe_join(dest, &name) {
            Ok(target) => target,
            Err(e) => {
                warn!("Skipping archive entry {}: {}", name, e);
                continue;
            }
        };

        if entry.is_dir() {
            fs::create_dir_all(&target)?;
            continue;
        }

        if entry.size() > MAX_EXTRACTION_FILE_SIZE {
            warn!("Skipping oversized file: {} ({} bytes)", name, entry.size());
            continue;
        }

        if let Some(parent) = target.parent() {
            fs::create_dir_all(parent)?;
        }
        let mut out = File::create(&target)?;
        io::copy(&mut entry, &mut out)?;
        debug!("Extracted {}", name);
        written += 1;
    }

    Ok(written)
}

/// Write `all_files.zip` holding every file of the file map
///
/// Entries are named by their slash-normalized package path. Files missing
/// from the package are skipped. Returns the number of entries written.
pub fn package_files(package_root: &Path, files: &[FileIr], out: &Path) -> Result<usize> {
    use std::io::Write;

    if let Some(parent) = out.parent() {
        fs::create_dir_all(parent)?;
    }
    let file = File::create(out)?;
    let mut zip = zip::ZipWriter::new(file);
    let options =
        zip::write::FileOptions::default().compression_method(zip::CompressionMethod::Deflated);

    let mut count = 0;
    for entry in files {
        let source = match safe_join(package_root, &entry.path_name) {
            Ok(source) if source.is_file() => source,
            _ => {
                warn!("File {} is missing from the package", entry.path_name);
                continue;
            }
        };
        zip.start_file(entry.path_name.clone(), options)?;
        let data = fs::read(&source)?;
        zip.write_all(&data)?;
        count += 1;
    }
    zip.finish()?;

    info!("Packaged {} files into {}", count, out.display());
    Ok(count)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{Read, Write};

    fn write_zip(path: &Path, entries: &[(&str, &[u8])]) {
        let file = File::create(path).unwrap();
        let mut zip = zip::ZipWriter::new(file);
        let options = zip::write::FileOptions::default();
        for (name, data) in entries {
            zip.start_file(*name, options).unwrap();
            zip.write_all(data).unwrap();
        }
        zip.finish().unwrap();
    }

    #[test]
    fn test_extract_normalizes_backslashes() {
        let temp = tempfile::tempdir().unwrap();
        let archive = temp.path().join("pkg.imscc");
        write_zip(
            &archive,
            &[
                ("imsmanifest.xml", b"<manifest/>"),
                ("web\\page.html", b"<p>hi</p>"),
            ],
        );

        let package = ArchiveExtractor::new().extract(&archive).unwrap();
        assert!(package.contains("imsmanifest.xml"));
        assert!(package.contains("web/page.html"));
        assert_eq!(package.read_to_string("web/page.html").unwrap(), "<p>hi</p>");
    }

    #[test]
    fn test_extract_skips_traversal_entries() {
        let temp = tempfile::tempdir().unwrap();
        let archive = temp.path().join("evil.zip");
        write_zip(&archive, &[("../escape.txt", b"x"), ("ok.txt", b"y")]);

        let dest = temp.path().join("out");
        let package = ArchiveExtractor::new().extract_into(&archive, &dest).unwrap();
        assert_eq!(package.files(), &["ok.txt".to_string()]);
        assert!(!temp.path().join("escape.txt").exists());
    }

    #[test]
    fn test_scratch_dir_removed_on_drop() {
        let temp = tempfile::tempdir().unwrap();
        let archive = temp.path().join("pkg.zip");
        write_zip(&archive, &[("a.txt", b"a")]);

        let scratch = temp.path().join("scratch");
        let package = ArchiveExtractor::new()
            .with_scratch_dir(&scratch)
            .extract(&archive)
            .unwrap();
        let root = package.root().to_path_buf();
        assert!(root.starts_with(&scratch));
        drop(package);
        assert!(!root.exists());
    }

    #[test]
    fn test_not_a_zip_is_archive_error() {
        let temp = tempfile::tempdir().unwrap();
        let archive = temp.path().join("broken.imscc");
        fs::write(&archive, b"definitely not a zip").unwrap();

        let err = ArchiveExtractor::new().extract(&archive).unwrap_err();
        assert!(matches!(err, Error::ArchiveError(_)));
    }

    #[test]
    fn test_package_files_keeps_non_ascii_names() {
        let temp = tempfile::tempdir().unwrap();
        let root = temp.path().join("pkg");
        fs::create_dir_all(root.join("course_settings")).unwrap();
        fs::write(root.join("molé.txt"), b"mole").unwrap();
        fs::write(root.join("course_settings/syllabus.html"), b"<p/>").unwrap();

        let files = vec![
            FileIr {
                migration_id: "f1".to_string(),
                path_name: "molé.txt".to_string(),
                display_name: "molé.txt".to_string(),
            },
            FileIr {
                migration_id: "f2".to_string(),
                path_name: "course_settings/syllabus.html".to_string(),
                display_name: "syllabus.html".to_string(),
            },
            FileIr {
                migration_id: "f3".to_string(),
                path_name: "missing.txt".to_string(),
                display_name: "missing.txt".to_string(),
            },
        ];

        let out = temp.path().join(ALL_FILES_ZIP);
        assert_eq!(package_files(&root, &files, &out).unwrap(), 2);

        let mut zip = zip::ZipArchive::new(File::open(&out).unwrap()).unwrap();
        let mut names: Vec<String> = zip.file_names().map(str::to_string).collect();
        names.sort();
        assert_eq!(names, vec!["course_settings/syllabus.html", "molé.txt"]);

        let mut content = String::new();
        zip.by_name("molé.txt")
            .unwrap()
            .read_to_string(&mut content)
            .unwrap();
        assert_eq!(content, "mole");
    }
}
