// src/import/links.rs

//! Link rewriting for imported HTML
//!
//! Converted bodies refer to package files as `$IMS-CC-FILEBASE$/<path>`.
//! Once attachments and pages exist those placeholders are swapped for store
//! URLs. Links whose target was never created fall back to a
//! `file_contents` URL and are reported once per field type.

use super::index::CreatedObjectIndex;
use crate::ir::FILEBASE_TOKEN;
use crate::issues::{IssueList, MigrationIssue};
use regex::{Captures, Regex};
use std::sync::LazyLock;

static LINK_ATTR_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?i)\b(href|src)\s*=\s*(?:"(\$IMS-CC-FILEBASE\$[^"]*)"|'(\$IMS-CC-FILEBASE\$[^']*)')"#)
        .unwrap()
});
static EMPTY_ANCHOR_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?is)<a\b([^>]*)>(\s*)</a>").unwrap());
static ANCHOR_HREF_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?i)\bhref\s*=\s*(?:"(\$IMS-CC-FILEBASE\$[^"]*)"|'(\$IMS-CC-FILEBASE\$[^']*)')"#)
        .unwrap()
});

/// HTML field being rewritten, used in missing-link reports
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkField {
    AssignmentDescription,
    DiscussionTopicMessage,
    WikiPageBody,
    QuizDescription,
    QuestionText,
    SyllabusBody,
}

impl LinkField {
    pub fn label(&self) -> &'static str {
        match self {
            LinkField::AssignmentDescription => "Assignment description",
            LinkField::DiscussionTopicMessage => "Discussion Topic message",
            LinkField::WikiPageBody => "Wiki Page body",
            LinkField::QuizDescription => "Quiz description",
            LinkField::QuestionText => "Assessment Question question_text",
            LinkField::SyllabusBody => "Course syllabus_body",
        }
    }

    fn category(&self) -> &'static str {
        match self {
            LinkField::AssignmentDescription => "assignments",
            LinkField::DiscussionTopicMessage => "discussion_topics",
            LinkField::WikiPageBody => "wiki_pages",
            LinkField::QuizDescription => "quizzes",
            LinkField::QuestionText => "assessment_questions",
            LinkField::SyllabusBody => "syllabus_body",
        }
    }

    pub fn missing_links_description(&self) -> String {
        format!("Missing links found in imported content - {}", self.label())
    }
}

/// Package path named by a placeholder link
fn placeholder_path(value: &str) -> Option<(String, &str)> {
    let rest = value.strip_prefix(FILEBASE_TOKEN)?;
    let rest = rest.trim_start_matches('/');
    let split = rest.find(['#', '?']).unwrap_or(rest.len());
    let (path, suffix) = rest.split_at(split);
    let decoded = urlencoding::decode(path)
        .map(|d| d.into_owned())
        .unwrap_or_else(|_| path.to_string());
    Some((decoded, suffix))
}

fn escape_html(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

/// Rewrites placeholder links for one container
pub struct LinkRewriter<'a> {
    container_id: i64,
    index: &'a CreatedObjectIndex,
}

impl<'a> LinkRewriter<'a> {
    pub fn new(container_id: i64, index: &'a CreatedObjectIndex) -> Self {
        Self {
            container_id,
            index,
        }
    }

    /// Store URL for a package path, or None when nothing was created for it
    pub fn url_for_path(&self, path: &str) -> Option<String> {
        if let Some(file) = self.index.file_by_path(path) {
            return Some(format!("/courses/{}/files/{}/preview", self.container_id, file.id));
        }
        self.index
            .page_by_path(path)
            .map(|slug| format!("/courses/{}/pages/{}", self.container_id, slug))
    }

    fn missing_url(&self, path: &str) -> String {
        let encoded = path
            .split('/')
            .map(|segment| urlencoding::encode(segment).into_owned())
            .collect::<Vec<_>>()
            .join("/");
        format!(
            "/courses/{}/file_contents/course%20files/{}",
            self.container_id, encoded
        )
    }

    /// Give empty anchors the display name of the file they link to
    fn fill_empty_anchors(&self, html: &str) -> String {
        EMPTY_ANCHOR_RE
            .replace_all(html, |caps: &Captures<'_>| {
                let attrs = &caps[1];
                let name = ANCHOR_HREF_RE
                    .captures(attrs)
                    .and_then(|href| href.get(1).or_else(|| href.get(2)))
                    .and_then(|value| placeholder_path(value.as_str()))
                    .and_then(|(path, _)| self.index.file_by_path(&path))
                    .map(|file| file.display_name.clone());

                match name {
                    Some(name) => format!("<a{}>{}</a>", attrs, escape_html(&name)),
                    None => caps[0].to_string(),
                }
            })
            .into_owned()
    }

    /// Rewrite every placeholder link in `html`
    ///
    /// Unresolved links are reported with `field` and attributed to
    /// `migration_id`.
    pub fn rewrite(
        &self,
        html: &str,
        field: LinkField,
        migration_id: &str,
        issues: &mut IssueList,
    ) -> String {
        if !html.contains(FILEBASE_TOKEN) {
            return html.to_string();
        }

        let html = self.fill_empty_anchors(html);
        let mut missing = false;

        let rewritten = LINK_ATTR_RE
            .replace_all(&html, |caps: &Captures<'_>| {
                let attr = &caps[1];
                let (value, quote) = match (caps.get(2), caps.get(3)) {
                    (Some(v), _) => (v.as_str(), '"'),
                    (None, Some(v)) => (v.as_str(), '\''),
                    (None, None) => return caps[0].to_string(),
                };
                let Some((path, suffix)) = placeholder_path(value) else {
                    return caps[0].to_string();
                };

                let url = match self.url_for_path(&path) {
                    Some(url) => url,
                    None => {
                        tracing::debug!("Unresolved link to '{}' in {}", path, field.label());
                        missing = true;
                        self.missing_url(&path)
                    }
                };
                format!("{attr}={quote}{url}{suffix}{quote}")
            })
            .into_owned();

        if missing {
            issues.push_once(
                MigrationIssue::warning(field.missing_links_description())
                    .about(field.category(), migration_id),
            );
        }

        rewritten
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::import::index::ObjectKind;

    fn index() -> CreatedObjectIndex {
        let mut index = CreatedObjectIndex::new();
        index.record(ObjectKind::Attachment, "f1", 5);
        index.record_file("media/dana small.png", 5, "dana small.png");
        index.record_page_path("w1/intro.html", "intro");
        index
    }

    #[test]
    fn test_rewrites_files_and_pages() {
        let index = index();
        let rewriter = LinkRewriter::new(3, &index);
        let mut issues = IssueList::new();

        let html = r#"<img src="$IMS-CC-FILEBASE$/media/dana%20small.png" alt="x"><a href='$IMS-CC-FILEBASE$/w1/intro.html#top'>Intro</a>"#;
        let out = rewriter.rewrite(html, LinkField::WikiPageBody, "p1", &mut issues);

        assert_eq!(
            out,
            r#"<img src="/courses/3/files/5/preview" alt="x"><a href='/courses/3/pages/intro#top'>Intro</a>"#
        );
        assert!(issues.is_empty());
    }

    #[test]
    fn test_missing_links_reported_once_per_field() {
        let index = index();
        let rewriter = LinkRewriter::new(3, &index);
        let mut issues = IssueList::new();

        let html = r#"<a href="$IMS-CC-FILEBASE$/gone/a b.pdf">a</a><img src="$IMS-CC-FILEBASE$/gone/c.png">"#;
        let out = rewriter.rewrite(html, LinkField::WikiPageBody, "p1", &mut issues);
        rewriter.rewrite(html, LinkField::WikiPageBody, "p2", &mut issues);

        assert!(out.contains(r#"href="/courses/3/file_contents/course%20files/gone/a%20b.pdf""#));
        assert_eq!(issues.len(), 1);
        assert!(issues.contains("Missing links found in imported content - Wiki Page body"));
    }

    #[test]
    fn test_empty_anchor_gets_display_name() {
        let index = index();
        let rewriter = LinkRewriter::new(3, &index);
        let mut issues = IssueList::new();

        let html = r#"<p><a href="$IMS-CC-FILEBASE$/media/dana small.png">  </a></p>"#;
        let out = rewriter.rewrite(html, LinkField::AssignmentDescription, "a1", &mut issues);
        assert_eq!(
            out,
            r#"<p><a href="/courses/3/files/5/preview">dana small.png</a></p>"#
        );
    }

    #[test]
    fn test_html_without_placeholders_untouched() {
        let index = index();
        let rewriter = LinkRewriter::new(3, &index);
        let mut issues = IssueList::new();
        let html = r#"<a href="http://example.com"></a>"#;
        assert_eq!(rewriter.rewrite(html, LinkField::QuizDescription, "q", &mut issues), html);
    }
}
