// src/import/collect.rs

//! Candidate collection: apply a selection filter to converted content
//!
//! Produces the subset of the IR one run will import. Explicitly selected
//! modules pull in the objects their items point at, and explicitly
//! selected sub-modules are promoted to top-level modules.

use super::selection::SelectionFilter;
use crate::convert::promote_submodule;
use crate::ir::{CourseIr, CourseSettingsIr, ModuleIr};
use std::collections::HashSet;
use tracing::debug;

/// Objects pulled in by other selected objects, keyed by (category, id)
#[derive(Debug, Default)]
struct Dependencies {
    required: HashSet<(&'static str, String)>,
}

impl Dependencies {
    fn require(&mut self, category: &'static str, migration_id: &str) {
        self.required.insert((category, migration_id.to_string()));
    }

    fn requires(&self, category: &'static str, migration_id: &str) -> bool {
        self.required.contains(&(category, migration_id.to_string()))
    }

    fn require_item_targets(&mut self, module: &ModuleIr) {
        for item in &module.items {
            if let (Some(category), Some(target)) = (item.content_type.category(), &item.target) {
                self.require(category, target);
            }
        }
    }
}

fn collect_submodules(
    module: &ModuleIr,
    position: u32,
    filter: &SelectionFilter,
    deps: &mut Dependencies,
    out: &mut Vec<ModuleIr>,
) {
    for sub in &module.submodules {
        if filter.is_explicitly_selected("context_modules", &sub.migration_id) {
            debug!("Promoting sub-module '{}' to top level", sub.migration_id);
            let promoted = promote_submodule(sub, position);
            deps.require_item_targets(&promoted);
            out.push(promoted);
        } else {
            collect_submodules(sub, position, filter, deps, out);
        }
    }
}

/// The part of `course` selected by `filter`
pub fn collect_candidates(course: &CourseIr, filter: &SelectionFilter) -> CourseIr {
    let mut deps = Dependencies::default();
    let mut modules = Vec::new();

    for (idx, module) in course.modules.iter().enumerate() {
        let position = if module.position == 0 {
            idx as u32 + 1
        } else {
            module.position
        };

        if filter.is_selected("context_modules", &module.migration_id) {
            if filter.is_explicitly_selected("context_modules", &module.migration_id) {
                deps.require_item_targets(module);
            }
            modules.push(ModuleIr {
                position,
                ..module.clone()
            });
        } else {
            collect_submodules(module, position, filter, &mut deps, &mut modules);
        }
    }

    let selected = |category: &'static str, id: &str, deps: &Dependencies| {
        filter.is_selected(category, id) || deps.requires(category, id)
    };

    let assignments: Vec<_> = course
        .assignments
        .iter()
        .filter(|a| selected("assignments", &a.migration_id, &deps))
        .cloned()
        .collect();

    for assignment in &assignments {
        if let Some(tool) = &assignment.external_tool_migration_id {
            deps.require("context_external_tools", tool);
        }
        if let Some(group) = &assignment.assignment_group_migration_id {
            deps.require("assignment_groups", group);
        }
    }

    let quizzes: Vec<_> = course
        .quizzes
        .iter()
        .filter(|q| selected("quizzes", &q.migration_id, &deps))
        .cloned()
        .collect();

    for quiz in &quizzes {
        for question in &quiz.question_migration_ids {
            deps.require("assessment_questions", question);
        }
    }

    let candidates = CourseIr {
        course: CourseSettingsIr {
            title: course.course.title.clone(),
            syllabus_body: course
                .course
                .syllabus_body
                .clone()
                .filter(|_| filter.includes_category("syllabus_body")),
        },
        files: course
            .files
            .iter()
            .filter(|f| selected("attachments", &f.migration_id, &deps))
            .cloned()
            .collect(),
        modules,
        assignments,
        assignment_groups: course
            .assignment_groups
            .iter()
            .filter(|g| selected("assignment_groups", &g.migration_id, &deps))
            .cloned()
            .collect(),
        discussion_topics: course
            .discussion_topics
            .iter()
            .filter(|t| selected("discussion_topics", &t.migration_id, &deps))
            .cloned()
            .collect(),
        wiki_pages: course
            .wiki_pages
            .iter()
            .filter(|p| selected("wiki_pages", &p.migration_id, &deps))
            .cloned()
            .collect(),
        quizzes,
        assessment_questions: course
            .assessment_questions
            .iter()
            .filter(|q| selected("assessment_questions", &q.migration_id, &deps))
            .cloned()
            .collect(),
        context_external_tools: course
            .context_external_tools
            .iter()
            .filter(|t| selected("context_external_tools", &t.migration_id, &deps))
            .cloned()
            .collect(),
        package_root: course.package_root.clone(),
        all_files_zip: course.all_files_zip.clone(),
        issues: course.issues.clone(),
    };

    debug!(
        "Selected {} modules, {} files, {} assignments, {} pages",
        candidates.modules.len(),
        candidates.files.len(),
        candidates.assignments.len(),
        candidates.wiki_pages.len()
    );
    candidates
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ir::{AssignmentIr, ContentTagIr, ContentType, FileIr, WikiPageIr};
    use serde_json::json;

    fn tag(content_type: ContentType, target: &str, indent: u32) -> ContentTagIr {
        ContentTagIr {
            migration_id: Some(format!("i_{target}")),
            content_type,
            target: Some(target.to_string()),
            title: target.to_string(),
            url: None,
            indent,
        }
    }

    fn course() -> CourseIr {
        let sf2 = ModuleIr {
            migration_id: "sf2".to_string(),
            title: "Sub-Folder 2".to_string(),
            items: vec![tag(ContentType::Attachment, "f2", 0)],
            parent_migration_id: Some("sf1".to_string()),
            ..Default::default()
        };
        let sf1 = ModuleIr {
            migration_id: "sf1".to_string(),
            title: "Sub-Folder".to_string(),
            items: vec![tag(ContentType::Attachment, "f2", 1)],
            submodules: vec![sf2],
            parent_migration_id: Some("m2".to_string()),
            ..Default::default()
        };

        CourseIr {
            modules: vec![
                ModuleIr {
                    migration_id: "m1".to_string(),
                    title: "Pages".to_string(),
                    position: 1,
                    items: vec![tag(ContentType::Page, "p1", 0)],
                    ..Default::default()
                },
                ModuleIr {
                    migration_id: "m2".to_string(),
                    title: "Files".to_string(),
                    position: 2,
                    items: vec![
                        tag(ContentType::Attachment, "f1", 0),
                        tag(ContentType::Attachment, "f2", 2),
                    ],
                    submodules: vec![sf1],
                    ..Default::default()
                },
            ],
            files: vec![
                FileIr {
                    migration_id: "f1".to_string(),
                    path_name: "f1.txt".to_string(),
                    display_name: "f1.txt".to_string(),
                },
                FileIr {
                    migration_id: "f2".to_string(),
                    path_name: "a/b/f2.txt".to_string(),
                    display_name: "f2.txt".to_string(),
                },
            ],
            wiki_pages: vec![WikiPageIr {
                migration_id: "p1".to_string(),
                title: "Intro".to_string(),
                ..Default::default()
            }],
            assignments: vec![
                AssignmentIr {
                    migration_id: "a1".to_string(),
                    title: "One".to_string(),
                    ..Default::default()
                },
                AssignmentIr {
                    migration_id: "a2".to_string(),
                    title: "Two".to_string(),
                    ..Default::default()
                },
            ],
            ..Default::default()
        }
    }

    #[test]
    fn test_everything_zero_collects_nothing() {
        let filter = SelectionFilter::from_value(&json!({ "copy": { "everything": "0" } }));
        let selected = collect_candidates(&course(), &filter);

        assert!(selected.modules.is_empty());
        assert!(selected.files.is_empty());
        assert!(selected.assignments.is_empty());
        assert!(selected.wiki_pages.is_empty());
    }

    #[test]
    fn test_selected_submodule_is_promoted_with_targets() {
        let filter = SelectionFilter::from_value(&json!({
            "copy": { "everything": "0", "context_modules": { "sf2": "1" } }
        }));
        let selected = collect_candidates(&course(), &filter);

        assert_eq!(selected.modules.len(), 1);
        let module = &selected.modules[0];
        assert_eq!(module.migration_id, "sf2");
        assert_eq!(module.title, "Sub-Folder 2");
        assert!(module.parent_migration_id.is_none());
        assert_eq!(module.items[0].indent, 0);

        let files: Vec<_> = selected.files.iter().map(|f| f.migration_id.as_str()).collect();
        assert_eq!(files, vec!["f2"]);
        assert!(selected.wiki_pages.is_empty());
    }

    #[test]
    fn test_wildcard_with_exclusion() {
        let filter = SelectionFilter::from_value(&json!({
            "copy": {
                "everything": "0",
                "all_assignments": "1",
                "assignments": { "a2": "0" }
            }
        }));
        let selected = collect_candidates(&course(), &filter);

        let ids: Vec<_> = selected.assignments.iter().map(|a| a.migration_id.as_str()).collect();
        assert_eq!(ids, vec!["a1"]);
        assert!(selected.modules.is_empty());
    }
}
