// src/convert/content.rs

//! Per-type content converters
//!
//! Each resource family maps to IR records plus an [`ItemTarget`] describing
//! what organization items referencing the resource point at.

use super::html::{self, escape_text, extract_body, extract_title, filebase_url, normalize_links};
use super::modules::{ItemTarget, ItemTargets};
use super::qti::{QtiConverter, QtiResource};
use crate::archive::ExtractedPackage;
use crate::filesystem::path::{file_name, parent_dir};
use crate::ir::{
    AssessmentQuestionIr, AssignmentIr, ContentType, DiscussionTopicIr, QuizIr, WikiPageIr,
};
use crate::issues::{IssueList, MigrationIssue};
use crate::manifest::xml::{XmlElement, parse_document};
use crate::manifest::{Manifest, ResourceEntry};
use crate::resolver::{CANVAS_PLATFORM, Resolution, ResourceKind};
use std::collections::HashSet;
use tracing::{debug, warn};

/// Inputs shared by the content converters
pub struct ContentContext<'a> {
    pub manifest: &'a Manifest,
    pub resolution: &'a Resolution,
    pub package: &'a ExtractedPackage,
    /// Promote module-referenced HTML files to pages
    pub html_to_page: bool,
    pub qti: &'a dyn QtiConverter,
}

/// Records produced by the content converters
#[derive(Debug, Default)]
pub struct ConvertedContent {
    pub assignments: Vec<AssignmentIr>,
    pub discussion_topics: Vec<DiscussionTopicIr>,
    pub wiki_pages: Vec<WikiPageIr>,
    pub quizzes: Vec<QuizIr>,
    pub assessment_questions: Vec<AssessmentQuestionIr>,
    pub syllabus_body: Option<String>,
    pub targets: ItemTargets,
    /// Package paths turned into pages; these are not attachments
    pub page_paths: HashSet<String>,
}

fn is_html(path: &str) -> bool {
    let lower = path.to_ascii_lowercase();
    lower.ends_with(".html") || lower.ends_with(".htm")
}

fn target(content_type: ContentType, id: &str, title: Option<String>) -> ItemTarget {
    ItemTarget {
        content_type,
        target: Some(id.to_string()),
        url: None,
        title,
    }
}

fn submission_type_for(format: &str) -> Option<&'static str> {
    match format.trim().to_ascii_lowercase().as_str() {
        "file" => Some("online_upload"),
        "text" | "html" => Some("online_text_entry"),
        "url" => Some("online_url"),
        _ => None,
    }
}

impl ContentContext<'_> {
    fn exists(&self, path: &str) -> bool {
        self.package.contains(path)
    }

    fn item_title(&self, resource: &ResourceEntry) -> Option<String> {
        self.manifest
            .item_title_for(&resource.identifier)
            .map(str::to_string)
    }

    fn read_text(&self, resource: &ResourceEntry, category: &str, issues: &mut IssueList) -> Option<(String, String)> {
        let Some(href) = resource.primary_href() else {
            warn!("Resource {} has no file", resource.identifier);
            return None;
        };
        match self.package.read_to_string(href) {
            Ok(text) => Some((text, parent_dir(href).to_string())),
            Err(e) => {
                warn!("Failed to read {}: {}", href, e);
                issues.push(
                    MigrationIssue::warning(format!(
                        "The file {} for resource '{}' could not be read",
                        href, resource.identifier
                    ))
                    .about(category, &resource.identifier),
                );
                None
            }
        }
    }

    fn read_descriptor(
        &self,
        resource: &ResourceEntry,
        category: &str,
        issues: &mut IssueList,
    ) -> Option<(XmlElement, String)> {
        let (text, base_dir) = self.read_text(resource, category, issues)?;
        match parse_document(&text) {
            Ok(doc) => Some((doc, base_dir)),
            Err(e) => {
                warn!("Failed to parse descriptor of {}: {}", resource.identifier, e);
                issues.push(
                    MigrationIssue::warning(format!(
                        "The descriptor for resource '{}' could not be parsed",
                        resource.identifier
                    ))
                    .about(category, &resource.identifier),
                );
                None
            }
        }
    }

    fn html_body(&self, html: &str, base_dir: &str) -> String {
        normalize_links(&extract_body(html), base_dir, &|p: &str| self.exists(p))
    }
}

/// Run every content converter over the manifest's resources
pub fn convert_content(ctx: &ContentContext<'_>, issues: &mut IssueList) -> ConvertedContent {
    let mut out = ConvertedContent::default();
    let mut bank_count = 0;

    for resource in ctx.manifest.resources.iter() {
        let id = resource.identifier.as_str();
        if ctx.resolution.is_superseded(id) {
            continue;
        }
        let Some(kind) = ctx.resolution.kind(id) else {
            continue;
        };

        match kind {
            ResourceKind::WebContent | ResourceKind::AssociatedContent => {
                convert_web_content(ctx, resource, kind, &mut out, issues);
            }
            ResourceKind::WebLink => {
                if let Some((doc, _)) = ctx.read_descriptor(resource, "module_items", issues) {
                    let url = doc
                        .find("url")
                        .and_then(|u| u.attr("href"))
                        .map(str::to_string);
                    out.targets.insert(
                        id.to_string(),
                        ItemTarget {
                            content_type: ContentType::ExternalUrl,
                            target: None,
                            url,
                            title: doc.find_text("title"),
                        },
                    );
                }
            }
            ResourceKind::DiscussionTopic => {
                if let Some(topic) = convert_discussion(ctx, resource, issues) {
                    out.targets.insert(
                        id.to_string(),
                        target(ContentType::DiscussionTopic, id, Some(topic.title.clone())),
                    );
                    out.discussion_topics.push(topic);
                }
            }
            ResourceKind::Assessment | ResourceKind::QuestionBank => {
                let bank_index = if *kind == ResourceKind::QuestionBank {
                    bank_count += 1;
                    Some(bank_count)
                } else {
                    None
                };
                let Some((doc, _)) = ctx.read_descriptor(resource, "quizzes", issues) else {
                    continue;
                };
                let title = ctx.item_title(resource);
                let qti_resource = QtiResource {
                    identifier: id,
                    title: title.as_deref(),
                    bank_index,
                };
                let converted = ctx.qti.convert(&qti_resource, &doc, issues);
                for quiz in &converted.quizzes {
                    out.targets.insert(
                        quiz.migration_id.clone(),
                        target(ContentType::Quiz, &quiz.migration_id, Some(quiz.title.clone())),
                    );
                }
                out.quizzes.extend(converted.quizzes);
                out.assessment_questions.extend(converted.questions);
            }
            ResourceKind::LtiLink => {
                let Some(link) = ctx.resolution.lti_link(id) else {
                    continue;
                };
                let tool_id = ctx.resolution.tool_id(id);
                // Graded links are placed in modules as their companion assignment
                let item_target = if link.assignment {
                    target(ContentType::Assignment, id, Some(link.title.clone()))
                } else {
                    ItemTarget {
                        content_type: ContentType::ExternalTool,
                        target: Some(tool_id.to_string()),
                        url: link.url.clone(),
                        title: Some(link.title.clone()),
                    }
                };
                out.targets.insert(id.to_string(), item_target);
                if link.assignment {
                    out.assignments.push(AssignmentIr {
                        migration_id: id.to_string(),
                        title: link.title.clone(),
                        points_possible: link.points_possible,
                        submission_types: vec!["external_tool".to_string()],
                        external_tool_migration_id: Some(tool_id.to_string()),
                        external_tool_url: link.url.clone(),
                        ..Default::default()
                    });
                }
            }
            ResourceKind::CcAssignment => {
                if let Some(assignment) = convert_cc_assignment(ctx, resource, issues) {
                    out.targets.insert(
                        id.to_string(),
                        target(ContentType::Assignment, id, Some(assignment.title.clone())),
                    );
                    out.assignments.push(assignment);
                }
            }
            ResourceKind::Unsupported(_) | ResourceKind::Unknown(_) => {}
        }
    }

    // Items pointing at a superseded resource follow its variant
    for resource in ctx.manifest.resources.iter() {
        let id = resource.identifier.as_str();
        if ctx.resolution.is_superseded(id)
            && let Some(found) = out.targets.get(ctx.resolution.effective_id(id)).cloned()
        {
            out.targets.insert(id.to_string(), found);
        }
    }

    debug!(
        "Converted content: {} assignments, {} topics, {} pages, {} quizzes",
        out.assignments.len(),
        out.discussion_topics.len(),
        out.wiki_pages.len(),
        out.quizzes.len()
    );
    out
}

fn convert_web_content(
    ctx: &ContentContext<'_>,
    resource: &ResourceEntry,
    kind: &ResourceKind,
    out: &mut ConvertedContent,
    issues: &mut IssueList,
) {
    let id = resource.identifier.as_str();
    let Some(href) = resource.primary_href() else {
        return;
    };

    match resource.intended_use.as_deref() {
        Some("syllabus") => {
            if let Some((html, base_dir)) = ctx.read_text(resource, "syllabus_body", issues)
                && out.syllabus_body.is_none()
            {
                out.syllabus_body = Some(ctx.html_body(&html, &base_dir));
            }
        }
        Some("assignment") => {
            if let Some((html, base_dir)) = ctx.read_text(resource, "assignments", issues) {
                let title = ctx
                    .item_title(resource)
                    .or_else(|| extract_title(&html))
                    .unwrap_or_else(|| id.to_string());
                out.targets.insert(
                    id.to_string(),
                    target(ContentType::Assignment, id, Some(title.clone())),
                );
                out.assignments.push(AssignmentIr {
                    migration_id: id.to_string(),
                    title,
                    description: Some(ctx.html_body(&html, &base_dir)),
                    submission_types: vec!["online_upload".to_string()],
                    ..Default::default()
                });
            }
            return;
        }
        _ => {}
    }

    let promote = ctx.html_to_page
        && *kind == ResourceKind::WebContent
        && resource.intended_use.is_none()
        && is_html(href)
        && ctx.manifest.is_referenced(id);

    if promote && let Some((html, base_dir)) = ctx.read_text(resource, "wiki_pages", issues) {
        let title = ctx
            .item_title(resource)
            .or_else(|| extract_title(&html))
            .unwrap_or_else(|| file_name(href).to_string());
        out.targets.insert(
            id.to_string(),
            target(ContentType::Page, id, Some(title.clone())),
        );
        out.page_paths.insert(href.to_string());
        out.wiki_pages.push(WikiPageIr {
            migration_id: id.to_string(),
            title,
            body: ctx.html_body(&html, &base_dir),
            source_path: Some(href.to_string()),
        });
        return;
    }

    if ctx.exists(href) {
        out.targets.insert(
            id.to_string(),
            target(ContentType::Attachment, id, Some(file_name(href).to_string())),
        );
    }
}

fn convert_discussion(
    ctx: &ContentContext<'_>,
    resource: &ResourceEntry,
    issues: &mut IssueList,
) -> Option<DiscussionTopicIr> {
    let (doc, base_dir) = ctx.read_descriptor(resource, "discussion_topics", issues)?;
    let exists = |p: &str| ctx.exists(p);

    let title = doc
        .child("title")
        .map(|t| t.text().trim().to_string())
        .filter(|t| !t.is_empty())
        .or_else(|| ctx.item_title(resource))
        .unwrap_or_else(|| resource.identifier.clone());

    let mut message = match doc.child("text") {
        Some(text) if text.attr("texttype") == Some("text/plain") => {
            format!("<p>{}</p>", escape_text(text.text().trim()))
        }
        Some(text) => text.text().trim().to_string(),
        None => String::new(),
    };
    message = normalize_links(&message, &base_dir, &exists);

    let attachments: Vec<String> = doc
        .child("attachments")
        .map(|a| {
            a.children_named("attachment")
                .filter_map(|att| att.attr("href"))
                .filter_map(|href| html::resolve_link(&base_dir, href, &exists))
                .collect()
        })
        .unwrap_or_default();

    if !attachments.is_empty() {
        message.push_str("<ul>");
        for path in &attachments {
            message.push_str(&format!(
                "<li><a href=\"{}\">{}</a></li>",
                filebase_url(path),
                file_name(path)
            ));
        }
        message.push_str("</ul>");
    }

    Some(DiscussionTopicIr {
        migration_id: resource.identifier.clone(),
        title,
        message,
    })
}

fn convert_cc_assignment(
    ctx: &ContentContext<'_>,
    resource: &ResourceEntry,
    issues: &mut IssueList,
) -> Option<AssignmentIr> {
    let (doc, base_dir) = ctx.read_descriptor(resource, "assignments", issues)?;

    let mut assignment = AssignmentIr {
        migration_id: resource.identifier.clone(),
        title: doc
            .child("title")
            .map(|t| t.text().trim().to_string())
            .filter(|t| !t.is_empty())
            .or_else(|| ctx.item_title(resource))
            .unwrap_or_else(|| resource.identifier.clone()),
        description: doc
            .child("text")
            .map(|t| normalize_links(t.text().trim(), &base_dir, &|p: &str| ctx.exists(p))),
        ..Default::default()
    };

    if let Some(gradable) = doc.child("gradable") {
        if gradable.text().trim().eq_ignore_ascii_case("true") {
            assignment.points_possible = gradable
                .attr("points_possible")
                .and_then(|p| p.trim().parse().ok());
        } else {
            assignment.grading_type = "not_graded".to_string();
        }
    }

    if let Some(formats) = doc.child("submission_formats") {
        for format in formats.children_named("format") {
            if let Some(kind) = format.attr("type").and_then(submission_type_for)
                && !assignment.submission_types.iter().any(|s| s == kind)
            {
                assignment.submission_types.push(kind.to_string());
            }
        }
    }

    let canvas = doc
        .descendants("extensions")
        .into_iter()
        .find(|e| e.attr("platform").is_some_and(|p| p == CANVAS_PLATFORM || p.starts_with("canvas")));
    if let Some(ext) = canvas {
        let block = ext.find("assignment").unwrap_or(ext);
        if let Some(grading_type) = block.find_text("grading_type") {
            assignment.grading_type = grading_type;
        }
        if let Some(points) = block
            .find_text("points_possible")
            .and_then(|p| p.parse().ok())
        {
            assignment.points_possible = Some(points);
        }
        if let Some(types) = block.find_text("submission_types") {
            assignment.submission_types = types
                .split(',')
                .map(str::trim)
                .filter(|t| !t.is_empty())
                .map(str::to_string)
                .collect();
        }
    }

    Some(assignment)
}
