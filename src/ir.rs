// src/ir.rs

//! Intermediate representation produced by the converter
//!
//! The IR is storage-neutral: every record carries a `migration_id` that the
//! importer uses to find previously imported objects, plus the fields needed
//! to build the object. Collections are keyed by the category names accepted
//! by selective import (`modules`, `assignments`, `wiki_pages`, ...).
//!
//! HTML fields hold links in the canonical `$IMS-CC-FILEBASE$/<path>` form;
//! they are turned into store URLs at import time.

use crate::error::Result;
use crate::issues::MigrationIssue;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::PathBuf;

/// Placeholder prefix for links into the package file tree
pub const FILEBASE_TOKEN: &str = "$IMS-CC-FILEBASE$";

/// Migration identifier of the synthesized catch-all module
pub const MISC_MODULE_ID: &str = "misc_module_top_level_items";

/// Title of the synthesized catch-all module
pub const MISC_MODULE_TITLE: &str = "Misc Module";

/// Converted course content
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CourseIr {
    #[serde(default)]
    pub course: CourseSettingsIr,

    /// Package files that become attachments
    #[serde(default)]
    pub files: Vec<FileIr>,

    #[serde(default)]
    pub modules: Vec<ModuleIr>,

    #[serde(default)]
    pub assignments: Vec<AssignmentIr>,

    #[serde(default)]
    pub assignment_groups: Vec<AssignmentGroupIr>,

    #[serde(default)]
    pub discussion_topics: Vec<DiscussionTopicIr>,

    #[serde(default)]
    pub wiki_pages: Vec<WikiPageIr>,

    #[serde(default)]
    pub quizzes: Vec<QuizIr>,

    #[serde(default)]
    pub assessment_questions: Vec<AssessmentQuestionIr>,

    #[serde(default)]
    pub context_external_tools: Vec<ExternalToolIr>,

    /// Directory the package was unpacked into
    #[serde(default)]
    pub package_root: Option<PathBuf>,

    /// Aggregate archive of all files in `files`
    #[serde(default)]
    pub all_files_zip: Option<PathBuf>,

    /// Issues raised during conversion, reported again by the importer
    #[serde(default)]
    pub issues: Vec<MigrationIssue>,
}

/// Course-level settings carried by the package
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CourseSettingsIr {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub syllabus_body: Option<String>,
}

/// A package file that becomes an attachment
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileIr {
    pub migration_id: String,
    /// Slash-normalized path relative to the package root
    pub path_name: String,
    pub display_name: String,
}

/// A module, possibly with nested sub-modules
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ModuleIr {
    pub migration_id: String,
    pub title: String,
    /// 1-based position among top-level modules
    #[serde(default)]
    pub position: u32,
    #[serde(default)]
    pub items: Vec<ContentTagIr>,
    /// Structural sub-items, importable on their own
    #[serde(default)]
    pub submodules: Vec<ModuleIr>,
    /// Set on sub-modules: the module they were nested in
    #[serde(default)]
    pub parent_migration_id: Option<String>,
}

impl ModuleIr {
    /// Depth-first search for a module or sub-module by migration id
    pub fn find(&self, migration_id: &str) -> Option<&ModuleIr> {
        if self.migration_id == migration_id {
            return Some(self);
        }
        self.submodules.iter().find_map(|m| m.find(migration_id))
    }
}

/// Kind of module item
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ContentType {
    Attachment,
    Assignment,
    DiscussionTopic,
    Quiz,
    Page,
    ExternalUrl,
    ExternalTool,
    SubHeader,
}

impl ContentType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ContentType::Attachment => "Attachment",
            ContentType::Assignment => "Assignment",
            ContentType::DiscussionTopic => "DiscussionTopic",
            ContentType::Quiz => "Quiz",
            ContentType::Page => "Page",
            ContentType::ExternalUrl => "ExternalUrl",
            ContentType::ExternalTool => "ExternalTool",
            ContentType::SubHeader => "SubHeader",
        }
    }

    /// Selection category the item's target belongs to
    pub fn category(&self) -> Option<&'static str> {
        match self {
            ContentType::Attachment => Some("attachments"),
            ContentType::Assignment => Some("assignments"),
            ContentType::DiscussionTopic => Some("discussion_topics"),
            ContentType::Quiz => Some("quizzes"),
            ContentType::Page => Some("wiki_pages"),
            ContentType::ExternalTool => Some("context_external_tools"),
            ContentType::ExternalUrl | ContentType::SubHeader => None,
        }
    }

    /// Whether the item points at another imported object
    pub fn has_target(&self) -> bool {
        self.category().is_some()
    }
}

impl std::str::FromStr for ContentType {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "Attachment" => Ok(ContentType::Attachment),
            "Assignment" => Ok(ContentType::Assignment),
            "DiscussionTopic" => Ok(ContentType::DiscussionTopic),
            "Quiz" => Ok(ContentType::Quiz),
            "Page" => Ok(ContentType::Page),
            "ExternalUrl" => Ok(ContentType::ExternalUrl),
            "ExternalTool" => Ok(ContentType::ExternalTool),
            "SubHeader" => Ok(ContentType::SubHeader),
            _ => Err(format!("Invalid content type: {s}")),
        }
    }
}

impl std::fmt::Display for ContentType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A module item placeholder
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContentTagIr {
    /// Identifier of the organization item
    #[serde(default)]
    pub migration_id: Option<String>,
    pub content_type: ContentType,
    /// Migration id of the referenced object (None for headers and links)
    #[serde(default)]
    pub target: Option<String>,
    pub title: String,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub indent: u32,
}

/// Vendor-specific LTI extension block
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VendorExtension {
    pub platform: String,
    #[serde(default)]
    pub custom_fields: BTreeMap<String, String>,
}

/// An external (LTI) tool
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExternalToolIr {
    pub migration_id: String,
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    /// Launch URL; cleared when several tools were merged by domain
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub domain: Option<String>,
    #[serde(default)]
    pub privacy_level: Option<String>,
    #[serde(default)]
    pub consumer_key: Option<String>,
    #[serde(default)]
    pub shared_secret: Option<String>,
    #[serde(default)]
    pub custom_fields: BTreeMap<String, String>,
    #[serde(default)]
    pub vendor_extensions: Vec<VendorExtension>,
    /// Create a companion assignment for this tool
    #[serde(default)]
    pub assignment: bool,
    #[serde(default)]
    pub points_possible: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssignmentIr {
    pub migration_id: String,
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default = "default_grading_type")]
    pub grading_type: String,
    #[serde(default)]
    pub points_possible: Option<f64>,
    #[serde(default)]
    pub submission_types: Vec<String>,
    #[serde(default)]
    pub assignment_group_migration_id: Option<String>,
    #[serde(default)]
    pub external_tool_migration_id: Option<String>,
    #[serde(default)]
    pub external_tool_url: Option<String>,
    #[serde(default)]
    pub position: Option<u32>,
}

fn default_grading_type() -> String {
    "points".to_string()
}

impl Default for AssignmentIr {
    fn default() -> Self {
        Self {
            migration_id: String::new(),
            title: String::new(),
            description: None,
            grading_type: default_grading_type(),
            points_possible: None,
            submission_types: Vec::new(),
            assignment_group_migration_id: None,
            external_tool_migration_id: None,
            external_tool_url: None,
            position: None,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssignmentGroupIr {
    pub migration_id: String,
    pub title: String,
    #[serde(default)]
    pub position: u32,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiscussionTopicIr {
    pub migration_id: String,
    pub title: String,
    #[serde(default)]
    pub message: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WikiPageIr {
    pub migration_id: String,
    pub title: String,
    #[serde(default)]
    pub body: String,
    /// Package path of the HTML file the page was built from
    #[serde(default)]
    pub source_path: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuizIr {
    pub migration_id: String,
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default = "default_quiz_type")]
    pub quiz_type: String,
    #[serde(default)]
    pub allowed_attempts: Option<i64>,
    /// Minutes
    #[serde(default)]
    pub time_limit: Option<i64>,
    #[serde(default)]
    pub points_possible: Option<f64>,
    #[serde(default)]
    pub question_migration_ids: Vec<String>,
}

fn default_quiz_type() -> String {
    "assignment".to_string()
}

impl Default for QuizIr {
    fn default() -> Self {
        Self {
            migration_id: String::new(),
            title: String::new(),
            description: None,
            quiz_type: default_quiz_type(),
            allowed_attempts: None,
            time_limit: None,
            points_possible: None,
            question_migration_ids: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AssessmentQuestionIr {
    pub migration_id: String,
    #[serde(default)]
    pub bank_migration_id: Option<String>,
    #[serde(default)]
    pub bank_title: Option<String>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub question_type: String,
    #[serde(default)]
    pub question_text: String,
    #[serde(default)]
    pub points_possible: Option<f64>,
}

/// Summary of a converted course for selection UIs
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Overview {
    pub modules: Vec<OverviewModule>,
    pub counts: BTreeMap<String, usize>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OverviewModule {
    pub title: String,
    pub migration_id: String,
    pub submodules: Vec<OverviewModule>,
}

impl OverviewModule {
    fn from_module(module: &ModuleIr) -> Self {
        Self {
            title: module.title.clone(),
            migration_id: module.migration_id.clone(),
            submodules: module.submodules.iter().map(Self::from_module).collect(),
        }
    }
}

impl CourseIr {
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn to_json_pretty(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Look up a module or sub-module anywhere in the tree
    pub fn find_module(&self, migration_id: &str) -> Option<&ModuleIr> {
        self.modules.iter().find_map(|m| m.find(migration_id))
    }

    /// Module tree and per-category counts
    pub fn overview(&self) -> Overview {
        let mut counts = BTreeMap::new();
        counts.insert("attachments".to_string(), self.files.len());
        counts.insert("context_modules".to_string(), self.modules.len());
        counts.insert("assignments".to_string(), self.assignments.len());
        counts.insert("assignment_groups".to_string(), self.assignment_groups.len());
        counts.insert("discussion_topics".to_string(), self.discussion_topics.len());
        counts.insert("wiki_pages".to_string(), self.wiki_pages.len());
        counts.insert("quizzes".to_string(), self.quizzes.len());
        counts.insert(
            "assessment_questions".to_string(),
            self.assessment_questions.len(),
        );
        counts.insert(
            "context_external_tools".to_string(),
            self.context_external_tools.len(),
        );

        Overview {
            modules: self.modules.iter().map(OverviewModule::from_module).collect(),
            counts,
        }
    }
}
