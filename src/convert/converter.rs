// src/convert/converter.rs

//! Cartridge to IR converter
//!
//! Runs the conversion stages in order: extract, parse the manifest, resolve
//! resources, convert content, build the file map and modules. No store is
//! touched here.

use super::content::{ContentContext, convert_content};
use super::files::build_file_map;
use super::modules::convert_organization;
use super::qti::{BasicQtiConverter, QtiConverter};
use crate::archive::{ALL_FILES_ZIP, ArchiveExtractor, ExtractedPackage, package_files};
use crate::config::ConvertConfig;
use crate::error::Result;
use crate::ir::{CourseIr, CourseSettingsIr, Overview};
use crate::issues::IssueList;
use crate::manifest::Manifest;
use crate::resolver;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;

/// File name of the serialized IR in the output directory
pub const COURSE_JSON: &str = "course.json";

/// File name of the overview in the output directory
pub const OVERVIEW_JSON: &str = "overview.json";

/// Options for cartridge conversion
#[derive(Debug, Clone, Default)]
pub struct ConversionOptions {
    /// Promote module-referenced HTML files to pages
    pub html_to_page: bool,
    /// Parent directory for scratch extraction (system temp dir if unset)
    pub scratch_dir: Option<PathBuf>,
    /// Course title override
    pub course_name: Option<String>,
    /// Write `course.json`, `overview.json`, `all_files.zip` and the
    /// unpacked package here
    pub output_dir: Option<PathBuf>,
}

impl From<&ConvertConfig> for ConversionOptions {
    fn from(config: &ConvertConfig) -> Self {
        Self {
            html_to_page: config.html_to_page,
            scratch_dir: config.scratch_dir.clone(),
            course_name: config.course_name.clone(),
            output_dir: None,
        }
    }
}

/// Result of converting a cartridge
#[derive(Debug)]
pub struct ConversionResult {
    pub course: CourseIr,
    pub overview: Overview,
    /// The unpacked package; scratch directories live as long as this
    pub package: ExtractedPackage,
}

/// Converts cartridges into the intermediate representation
pub struct CartridgeConverter {
    options: ConversionOptions,
    qti: Box<dyn QtiConverter>,
}

impl CartridgeConverter {
    pub fn new(options: ConversionOptions) -> Self {
        Self {
            options,
            qti: Box::new(BasicQtiConverter),
        }
    }

    pub fn with_defaults() -> Self {
        Self::new(ConversionOptions::default())
    }

    /// Use a different QTI converter for assessments and question banks
    pub fn with_qti_converter(mut self, qti: Box<dyn QtiConverter>) -> Self {
        self.qti = qti;
        self
    }

    /// Convert a zip/IMSCC archive
    pub fn convert(&self, archive: &Path) -> Result<ConversionResult> {
        let mut extractor = ArchiveExtractor::new();
        if let Some(dir) = &self.options.scratch_dir {
            extractor = extractor.with_scratch_dir(dir);
        }

        let package = match &self.options.output_dir {
            Some(out) => extractor.extract_into(archive, &out.join("package"))?,
            None => extractor.extract(archive)?,
        };
        self.convert_package(package)
    }

    /// Convert an already unpacked package directory
    pub fn convert_dir(&self, root: &Path) -> Result<ConversionResult> {
        self.convert_package(ExtractedPackage::from_dir(root)?)
    }

    fn convert_package(&self, package: ExtractedPackage) -> Result<ConversionResult> {
        let manifest = Manifest::load(package.root())?;
        let mut issues = IssueList::new();

        let resolution = resolver::resolve(&manifest, &package, &mut issues)?;

        let ctx = ContentContext {
            manifest: &manifest,
            resolution: &resolution,
            package: &package,
            html_to_page: self.options.html_to_page,
            qti: self.qti.as_ref(),
        };
        let content = convert_content(&ctx, &mut issues);

        let files = build_file_map(&manifest, &resolution, &package, &content.page_paths);
        let modules = convert_organization(&manifest.organization, &content.targets);

        let mut course = CourseIr {
            course: CourseSettingsIr {
                title: self.options.course_name.clone().or(manifest.title.clone()),
                syllabus_body: content.syllabus_body,
            },
            files,
            modules,
            assignments: content.assignments,
            assignment_groups: Vec::new(),
            discussion_topics: content.discussion_topics,
            wiki_pages: content.wiki_pages,
            quizzes: content.quizzes,
            assessment_questions: content.assessment_questions,
            context_external_tools: resolution.tools,
            package_root: Some(package.root().to_path_buf()),
            all_files_zip: None,
            issues: Vec::new(),
        };

        if let Some(out) = &self.options.output_dir {
            fs::create_dir_all(out)?;
            let zip_path = out.join(ALL_FILES_ZIP);
            package_files(package.root(), &course.files, &zip_path)?;
            course.all_files_zip = Some(zip_path);
        }

        course.issues = issues.into_vec();
        let overview = course.overview();

        if let Some(out) = &self.options.output_dir {
            fs::write(out.join(COURSE_JSON), course.to_json_pretty()?)?;
            fs::write(out.join(OVERVIEW_JSON), serde_json::to_string_pretty(&overview)?)?;
        }

        info!(
            "Converted cartridge: {} modules, {} files, {} issues",
            course.modules.len(),
            course.files.len(),
            course.issues.len()
        );

        Ok(ConversionResult {
            course,
            overview,
            package,
        })
    }
}

impl Default for CartridgeConverter {
    fn default() -> Self {
        Self::with_defaults()
    }
}
