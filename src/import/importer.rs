// src/import/importer.rs

//! Selective, idempotent import of converted content into the store
//!
//! One run goes through fixed phases, each consuming the complete output of
//! the previous one:
//!
//! 1. collect candidates (selection filter applied to the IR)
//! 2. create or update every candidate, keyed by `(container, migration_id)`
//! 3. resolve references (module items, assignment groups and tools, quiz
//!    questions)
//! 4. fix module and assignment group positions
//! 5. rewrite placeholder links in HTML fields
//! 6. record the run and its issues
//!
//! Phases 2 to 5 run in a single IMMEDIATE transaction while the container
//! lock is held, so a failed run leaves the container untouched.

use super::collect::collect_candidates;
use super::index::{CreatedObjectIndex, ObjectKind};
use super::links::{LinkField, LinkRewriter};
use super::positions::{PositionPolicy, Sibling, renumber};
use super::selection::SelectionFilter;
use crate::config::ImportConfig;
use crate::db;
use crate::db::lock::ContainerLock;
use crate::db::models::{
    AssessmentQuestion, Assignment, AssignmentGroup, Attachment, Container, ContentMigration,
    ContextModule, DiscussionTopic, ExternalTool, MigrationState, ModuleItem, QuestionBank, Quiz,
    StoredIssue, WikiPage, WorkflowState,
};
use crate::error::Result;
use crate::ir::{
    AssignmentIr, ContentType, CourseIr, DiscussionTopicIr, ExternalToolIr, FILEBASE_TOKEN, FileIr,
    ModuleIr, WikiPageIr,
};
use crate::issues::{IssueList, MigrationIssue};
use md5::{Digest, Md5};
use rusqlite::{Connection, Transaction};
use std::collections::{BTreeMap, HashSet};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

const DEFAULT_BANK_TITLE: &str = "Question Bank";

/// Options for one import run
#[derive(Debug, Clone, Default)]
pub struct ImportOptions {
    /// Directory for per-container lock files; no lock when unset
    pub lock_dir: Option<PathBuf>,
    /// Where the content came from, recorded with the run
    pub source: Option<String>,
}

impl From<&ImportConfig> for ImportOptions {
    fn from(config: &ImportConfig) -> Self {
        Self {
            lock_dir: config.lock_dir.clone(),
            source: None,
        }
    }
}

/// Outcome of an import run
#[derive(Debug, Clone)]
pub struct ImportReport {
    pub container_id: i64,
    pub content_migration_id: i64,
    /// Conversion issues followed by import issues
    pub issues: Vec<MigrationIssue>,
    /// Objects created or updated, per category
    pub counts: BTreeMap<&'static str, usize>,
}

impl ImportReport {
    pub fn imported_count(&self) -> usize {
        self.counts.values().sum()
    }
}

/// Import `course` into the container named `container_name`, creating it if needed
pub fn import_into(
    conn: &mut Connection,
    container_name: &str,
    course: &CourseIr,
    filter: &SelectionFilter,
    options: &ImportOptions,
) -> Result<ImportReport> {
    let container = Container::find_or_create(conn, container_name)?;
    let container_id = container.id.unwrap_or_default();
    import_course(conn, container_id, course, filter, options)
}

/// Import `course` into an existing container
pub fn import_course(
    conn: &mut Connection,
    container_id: i64,
    course: &CourseIr,
    filter: &SelectionFilter,
    options: &ImportOptions,
) -> Result<ImportReport> {
    let mut run = ContentMigration::new(container_id, options.source.clone());
    let run_id = run.insert(conn)?;
    info!("Starting content migration {} into container {}", run_id, container_id);

    let mut issues = IssueList::new();
    issues.extend(course.issues.iter().cloned());

    let candidates = collect_candidates(course, filter);

    let _lock = match &options.lock_dir {
        Some(dir) => Some(ContainerLock::acquire(dir, container_id)?),
        None => None,
    };

    let outcome = db::transaction(conn, |tx| {
        let mut phases = ImportRun::new(tx, container_id, &mut issues);
        phases.upsert_all(&candidates)?;
        phases.resolve_references(&candidates)?;
        phases.fix_positions()?;
        phases.rewrite_links(&candidates)?;
        Ok(phases.into_counts())
    });

    match outcome {
        Ok(counts) => {
            let total: usize = counts.values().sum();
            StoredIssue::insert_all(conn, run_id, issues.iter().as_slice())?;
            run.finish(conn, MigrationState::Imported, total as i64)?;
            info!(
                "Content migration {} imported {} objects with {} issues",
                run_id,
                total,
                issues.len()
            );
            Ok(ImportReport {
                container_id,
                content_migration_id: run_id,
                issues: issues.into_vec(),
                counts,
            })
        }
        Err(e) => {
            warn!("Content migration {} failed: {}", run_id, e);
            issues.add_error(format!("Import failed: {}", e));
            StoredIssue::insert_all(conn, run_id, issues.iter().as_slice())?;
            run.finish(conn, MigrationState::Failed, 0)?;
            Err(e)
        }
    }
}

/// Hex MD5 and size of a package file, when it can be read
fn file_digest(package_root: Option<&Path>, path_name: &str) -> Option<(String, i64)> {
    let root = package_root?;
    let bytes = std::fs::read(root.join(path_name)).ok()?;
    Some((hex::encode(Md5::digest(&bytes)), bytes.len() as i64))
}

fn object_kind(content_type: ContentType) -> Option<ObjectKind> {
    match content_type {
        ContentType::Attachment => Some(ObjectKind::Attachment),
        ContentType::Assignment => Some(ObjectKind::Assignment),
        ContentType::DiscussionTopic => Some(ObjectKind::DiscussionTopic),
        ContentType::Quiz => Some(ObjectKind::Quiz),
        ContentType::Page => Some(ObjectKind::WikiPage),
        ContentType::ExternalTool => Some(ObjectKind::ExternalTool),
        ContentType::ExternalUrl | ContentType::SubHeader => None,
    }
}

/// State of the transactional phases of one run
struct ImportRun<'a> {
    tx: &'a Transaction<'a>,
    container_id: i64,
    issues: &'a mut IssueList,
    index: CreatedObjectIndex,
    /// Module ids touched by this run, with effective positions in batch order
    modules: Vec<(i64, i64)>,
    /// Same for assignment groups
    groups: Vec<(i64, i64)>,
}

impl<'a> ImportRun<'a> {
    fn new(tx: &'a Transaction<'a>, container_id: i64, issues: &'a mut IssueList) -> Self {
        Self {
            tx,
            container_id,
            issues,
            index: CreatedObjectIndex::new(),
            modules: Vec::new(),
            groups: Vec::new(),
        }
    }

    fn into_counts(self) -> BTreeMap<&'static str, usize> {
        let kinds = [
            ObjectKind::Attachment,
            ObjectKind::Module,
            ObjectKind::Assignment,
            ObjectKind::AssignmentGroup,
            ObjectKind::DiscussionTopic,
            ObjectKind::WikiPage,
            ObjectKind::Quiz,
            ObjectKind::QuestionBank,
            ObjectKind::AssessmentQuestion,
            ObjectKind::ExternalTool,
        ];
        kinds
            .into_iter()
            .map(|kind| (kind.category(), self.index.count(kind)))
            .filter(|(_, count)| *count > 0)
            .collect()
    }

    // Phase 2: create or update

    fn upsert_all(&mut self, course: &CourseIr) -> Result<()> {
        let package_root = course.package_root.as_deref();
        for file in &course.files {
            self.upsert_file(file, package_root)?;
        }
        for tool in &course.context_external_tools {
            self.upsert_tool(tool)?;
        }
        self.upsert_groups(course)?;
        self.upsert_quizzes(course)?;
        for topic in &course.discussion_topics {
            self.upsert_topic(topic)?;
        }
        for page in &course.wiki_pages {
            self.upsert_page(page)?;
        }
        for assignment in &course.assignments {
            self.upsert_assignment(assignment)?;
        }
        self.upsert_modules(&course.modules)?;

        if let Some(body) = &course.course.syllabus_body {
            Container::set_syllabus_body(self.tx, self.container_id, body)?;
        }
        Ok(())
    }

    fn upsert_file(&mut self, file: &FileIr, package_root: Option<&Path>) -> Result<()> {
        let digest = file_digest(package_root, &file.path_name);

        let mut row = Attachment::find_by_migration_id(self.tx, self.container_id, &file.migration_id)?
            .unwrap_or_else(|| {
                Attachment::new(
                    self.container_id,
                    &file.migration_id,
                    &file.path_name,
                    &file.display_name,
                )
            });
        row.path_name = file.path_name.clone();
        row.display_name = file.display_name.clone();
        row.workflow_state = WorkflowState::Active;
        if let Some((md5, size)) = digest {
            row.md5 = Some(md5);
            row.size = size;
        }

        let id = match row.id {
            Some(id) => {
                row.update(self.tx)?;
                id
            }
            None => row.insert(self.tx)?,
        };
        self.index.record(ObjectKind::Attachment, &file.migration_id, id);
        self.index.record_file(&file.path_name, id, &file.display_name);
        Ok(())
    }

    fn upsert_tool(&mut self, tool: &ExternalToolIr) -> Result<()> {
        let mut row = ExternalTool::find_by_migration_id(self.tx, self.container_id, &tool.migration_id)?
            .unwrap_or_else(|| ExternalTool::new(self.container_id, &tool.migration_id, &tool.title));
        row.apply_ir(tool);
        row.workflow_state = WorkflowState::Active;

        let id = match row.id {
            Some(id) => {
                row.update(self.tx)?;
                id
            }
            None => row.insert(self.tx)?,
        };
        self.index.record(ObjectKind::ExternalTool, &tool.migration_id, id);
        Ok(())
    }

    fn upsert_groups(&mut self, course: &CourseIr) -> Result<()> {
        for (order, group) in course.assignment_groups.iter().enumerate() {
            let desired = if group.position == 0 {
                order as i64 + 1
            } else {
                group.position as i64
            };

            let existing = match AssignmentGroup::find_by_migration_id(
                self.tx,
                self.container_id,
                &group.migration_id,
            )? {
                Some(found) => Some(found),
                None => AssignmentGroup::find_unmigrated_by_name(self.tx, self.container_id, &group.title)?,
            };
            let matched = existing.is_some();
            let position = PositionPolicy::Desired.effective(desired, matched, 0);

            let mut row = existing.unwrap_or_else(|| AssignmentGroup::new(self.container_id, &group.title, position));
            row.migration_id = Some(group.migration_id.clone());
            row.name = group.title.clone();
            row.position = position;
            row.workflow_state = WorkflowState::Active;

            let id = match row.id {
                Some(id) => {
                    row.update(self.tx)?;
                    id
                }
                None => row.insert(self.tx)?,
            };
            self.index.record(ObjectKind::AssignmentGroup, &group.migration_id, id);
            self.groups.push((id, position));
        }
        Ok(())
    }

    fn upsert_quizzes(&mut self, course: &CourseIr) -> Result<()> {
        for quiz in &course.quizzes {
            let mut row = Quiz::find_by_migration_id(self.tx, self.container_id, &quiz.migration_id)?
                .unwrap_or_else(|| Quiz::new(self.container_id, &quiz.migration_id, &quiz.title));
            row.title = quiz.title.clone();
            row.description = quiz.description.clone();
            row.quiz_type = quiz.quiz_type.clone();
            row.allowed_attempts = quiz.allowed_attempts;
            row.time_limit = quiz.time_limit;
            row.points_possible = quiz.points_possible;
            row.workflow_state = WorkflowState::Active;

            let id = match row.id {
                Some(id) => {
                    row.update(self.tx)?;
                    id
                }
                None => row.insert(self.tx)?,
            };
            self.index.record(ObjectKind::Quiz, &quiz.migration_id, id);
        }

        for question in &course.assessment_questions {
            let bank_id = match &question.bank_migration_id {
                Some(bank) => Some(self.upsert_bank(bank, question.bank_title.as_deref())?),
                None => None,
            };

            let mut row = AssessmentQuestion::find_by_migration_id(
                self.tx,
                self.container_id,
                &question.migration_id,
            )?
            .unwrap_or_else(|| {
                AssessmentQuestion::new(self.container_id, &question.migration_id, &question.question_type)
            });
            row.bank_id = bank_id;
            row.name = question.title.clone();
            row.question_type = question.question_type.clone();
            row.question_text = question.question_text.clone();
            row.points_possible = question.points_possible;
            row.workflow_state = WorkflowState::Active;

            let id = match row.id {
                Some(id) => {
                    row.update(self.tx)?;
                    id
                }
                None => row.insert(self.tx)?,
            };
            self.index.record(ObjectKind::AssessmentQuestion, &question.migration_id, id);
        }
        Ok(())
    }

    fn upsert_bank(&mut self, migration_id: &str, title: Option<&str>) -> Result<i64> {
        if let Some(id) = self.index.get(ObjectKind::QuestionBank, migration_id) {
            return Ok(id);
        }

        let title = title.unwrap_or(DEFAULT_BANK_TITLE);
        let mut row = QuestionBank::find_by_migration_id(self.tx, self.container_id, migration_id)?
            .unwrap_or_else(|| QuestionBank::new(self.container_id, migration_id, title));
        row.title = title.to_string();
        row.workflow_state = WorkflowState::Active;

        let id = match row.id {
            Some(id) => {
                row.update(self.tx)?;
                id
            }
            None => row.insert(self.tx)?,
        };
        self.index.record(ObjectKind::QuestionBank, migration_id, id);
        Ok(id)
    }

    fn upsert_topic(&mut self, topic: &DiscussionTopicIr) -> Result<()> {
        let mut row = DiscussionTopic::find_by_migration_id(self.tx, self.container_id, &topic.migration_id)?
            .unwrap_or_else(|| DiscussionTopic::new(self.container_id, &topic.migration_id, &topic.title));
        row.title = topic.title.clone();
        row.message = topic.message.clone();
        row.workflow_state = WorkflowState::Active;

        let id = match row.id {
            Some(id) => {
                row.update(self.tx)?;
                id
            }
            None => row.insert(self.tx)?,
        };
        self.index.record(ObjectKind::DiscussionTopic, &topic.migration_id, id);
        Ok(())
    }

    fn upsert_page(&mut self, page: &WikiPageIr) -> Result<()> {
        let mut row = WikiPage::find_by_migration_id(self.tx, self.container_id, &page.migration_id)?
            .unwrap_or_else(|| WikiPage::new(self.container_id, &page.migration_id, &page.title));
        row.title = page.title.clone();
        row.body = page.body.clone();
        row.workflow_state = WorkflowState::Active;
        row.assign_unique_url(self.tx)?;

        let id = match row.id {
            Some(id) => {
                row.update(self.tx)?;
                id
            }
            None => row.insert(self.tx)?,
        };
        self.index.record(ObjectKind::WikiPage, &page.migration_id, id);
        if let Some(path) = &page.source_path {
            self.index.record_page_path(path, &row.url);
        }
        Ok(())
    }

    fn upsert_assignment(&mut self, assignment: &AssignmentIr) -> Result<()> {
        let mut row = Assignment::find_by_migration_id(self.tx, self.container_id, &assignment.migration_id)?
            .unwrap_or_else(|| Assignment::new(self.container_id, &assignment.migration_id, &assignment.title));
        row.title = assignment.title.clone();
        row.description = assignment.description.clone();
        row.grading_type = assignment.grading_type.clone();
        row.points_possible = assignment.points_possible;
        row.submission_types = assignment.submission_types.clone();
        row.external_tool_url = assignment.external_tool_url.clone();
        row.position = assignment.position.map(i64::from);
        row.workflow_state = WorkflowState::Active;

        let id = match row.id {
            Some(id) => {
                row.update(self.tx)?;
                id
            }
            None => row.insert(self.tx)?,
        };
        self.index.record(ObjectKind::Assignment, &assignment.migration_id, id);
        Ok(())
    }

    fn upsert_modules(&mut self, modules: &[ModuleIr]) -> Result<()> {
        let max_existing = ContextModule::max_position(self.tx, self.container_id)?;

        for (order, module) in modules.iter().enumerate() {
            let desired = if module.position == 0 {
                order as i64 + 1
            } else {
                module.position as i64
            };

            let existing = ContextModule::find_by_migration_id(self.tx, self.container_id, &module.migration_id)?;
            let position = PositionPolicy::AppendNew.effective(desired, existing.is_some(), max_existing);

            let mut row = existing.unwrap_or_else(|| {
                ContextModule::new(self.container_id, &module.title, position)
                    .with_migration_id(&module.migration_id)
            });
            row.name = module.title.clone();
            row.position = position;
            row.workflow_state = WorkflowState::Active;

            let id = match row.id {
                Some(id) => {
                    row.update(self.tx)?;
                    id
                }
                None => row.insert(self.tx)?,
            };
            self.index.record(ObjectKind::Module, &module.migration_id, id);
            self.modules.push((id, position));
        }
        Ok(())
    }

    // Phase 3: references

    /// Store id for a reference, from this run or an earlier one
    fn lookup(&self, kind: ObjectKind, migration_id: &str) -> Result<Option<i64>> {
        if let Some(id) = self.index.get(kind, migration_id) {
            return Ok(Some(id));
        }

        let (tx, container) = (self.tx, self.container_id);
        let found = match kind {
            ObjectKind::Attachment => Attachment::find_by_migration_id(tx, container, migration_id)?
                .filter(|r| r.workflow_state == WorkflowState::Active)
                .and_then(|r| r.id),
            ObjectKind::Assignment => Assignment::find_by_migration_id(tx, container, migration_id)?
                .filter(|r| r.workflow_state == WorkflowState::Active)
                .and_then(|r| r.id),
            ObjectKind::DiscussionTopic => DiscussionTopic::find_by_migration_id(tx, container, migration_id)?
                .filter(|r| r.workflow_state == WorkflowState::Active)
                .and_then(|r| r.id),
            ObjectKind::WikiPage => WikiPage::find_by_migration_id(tx, container, migration_id)?
                .filter(|r| r.workflow_state == WorkflowState::Active)
                .and_then(|r| r.id),
            ObjectKind::Quiz => Quiz::find_by_migration_id(tx, container, migration_id)?
                .filter(|r| r.workflow_state == WorkflowState::Active)
                .and_then(|r| r.id),
            ObjectKind::ExternalTool => ExternalTool::find_by_migration_id(tx, container, migration_id)?
                .filter(|r| r.workflow_state == WorkflowState::Active)
                .and_then(|r| r.id),
            ObjectKind::AssignmentGroup => AssignmentGroup::find_by_migration_id(tx, container, migration_id)?
                .filter(|r| r.workflow_state == WorkflowState::Active)
                .and_then(|r| r.id),
            ObjectKind::Module | ObjectKind::QuestionBank | ObjectKind::AssessmentQuestion => None,
        };
        Ok(found)
    }

    fn resolve_references(&mut self, course: &CourseIr) -> Result<()> {
        for assignment in &course.assignments {
            let Some(id) = self.index.get(ObjectKind::Assignment, &assignment.migration_id) else {
                continue;
            };
            let Some(mut row) = Assignment::find_by_migration_id(self.tx, self.container_id, &assignment.migration_id)? else {
                continue;
            };

            row.assignment_group_id = match &assignment.assignment_group_migration_id {
                Some(group) => self.lookup(ObjectKind::AssignmentGroup, group)?,
                None => None,
            };
            row.external_tool_id = match &assignment.external_tool_migration_id {
                Some(tool) => {
                    let found = self.lookup(ObjectKind::ExternalTool, tool)?;
                    if found.is_none() {
                        self.issues.push(
                            MigrationIssue::warning(format!(
                                "The external tool for assignment \"{}\" was not imported",
                                assignment.title
                            ))
                            .about("assignments", &assignment.migration_id),
                        );
                    }
                    found
                }
                None => None,
            };
            debug!("Resolved references of assignment {}", id);
            row.update(self.tx)?;
        }

        for quiz in &course.quizzes {
            let Some(quiz_id) = self.index.get(ObjectKind::Quiz, &quiz.migration_id) else {
                continue;
            };
            for question in &quiz.question_migration_ids {
                if let Some(question_id) = self.index.get(ObjectKind::AssessmentQuestion, question) {
                    AssessmentQuestion::set_quiz(self.tx, question_id, quiz_id)?;
                }
            }
        }

        for module in &course.modules {
            self.resolve_module_items(module)?;
        }
        Ok(())
    }

    fn resolve_module_items(&mut self, module: &ModuleIr) -> Result<()> {
        let Some(module_id) = self.index.get(ObjectKind::Module, &module.migration_id) else {
            return Ok(());
        };

        let mut position = 0;
        let mut touched = HashSet::new();
        for (idx, tag) in module.items.iter().enumerate() {
            let content_id = match (object_kind(tag.content_type), &tag.target) {
                (Some(kind), Some(target)) => match self.lookup(kind, target)? {
                    Some(id) => Some(id),
                    None => {
                        self.issues.push(
                            MigrationIssue::warning(format!(
                                "The module item \"{}\" was skipped because its content was not imported",
                                tag.title
                            ))
                            .about("context_modules", &module.migration_id),
                        );
                        continue;
                    }
                },
                _ => None,
            };
            position += 1;

            let item_migration_id = tag
                .migration_id
                .clone()
                .unwrap_or_else(|| format!("{}_item_{}", module.migration_id, idx + 1));

            let mut row = ModuleItem::find_by_migration_id(self.tx, module_id, &item_migration_id)?
                .unwrap_or_else(|| {
                    let mut item = ModuleItem::new(module_id, tag.content_type, &tag.title);
                    item.migration_id = Some(item_migration_id.clone());
                    item
                });
            row.content_type = tag.content_type;
            row.content_id = content_id;
            row.title = tag.title.clone();
            row.url = tag.url.clone();
            row.indent = i64::from(tag.indent);
            row.position = position;
            row.workflow_state = WorkflowState::Active;

            match row.id {
                Some(id) => {
                    row.update(self.tx)?;
                    touched.insert(id);
                }
                None => {
                    touched.insert(row.insert(self.tx)?);
                }
            }
        }

        // Imported items this run no longer places are retired; items added
        // by hand keep their order after the imported ones
        for mut row in ModuleItem::list_for_module(self.tx, module_id)? {
            if row.id.is_some_and(|id| touched.contains(&id)) {
                continue;
            }
            if row.migration_id.is_some() {
                debug!("Deactivating module item '{}' in {}", row.title, module.migration_id);
                row.workflow_state = WorkflowState::Deleted;
            } else {
                position += 1;
                row.position = position;
            }
            row.update(self.tx)?;
        }
        Ok(())
    }

    // Phase 4: positions

    fn fix_positions(&mut self) -> Result<()> {
        let touched: HashSet<i64> = self.modules.iter().map(|(id, _)| *id).collect();
        let mut siblings: Vec<Sibling> = self
            .modules
            .iter()
            .enumerate()
            .map(|(order, (id, position))| Sibling::incoming(*id, *position, order))
            .collect();
        for module in ContextModule::list_for_container(self.tx, self.container_id)? {
            if let Some(id) = module.id
                && !touched.contains(&id)
            {
                siblings.push(Sibling::untouched(id, module.position));
            }
        }
        for (id, position) in renumber(siblings) {
            ContextModule::set_position(self.tx, id, position)?;
        }

        let touched: HashSet<i64> = self.groups.iter().map(|(id, _)| *id).collect();
        let mut siblings: Vec<Sibling> = self
            .groups
            .iter()
            .enumerate()
            .map(|(order, (id, position))| Sibling::incoming(*id, *position, order))
            .collect();
        for group in AssignmentGroup::list_for_container(self.tx, self.container_id)? {
            if let Some(id) = group.id
                && !touched.contains(&id)
            {
                siblings.push(Sibling::untouched(id, group.position));
            }
        }
        for (id, position) in renumber(siblings) {
            AssignmentGroup::set_position(self.tx, id, position)?;
        }

        Ok(())
    }

    // Phase 5: links

    fn rewrite_links(&mut self, course: &CourseIr) -> Result<()> {
        let rewriter = LinkRewriter::new(self.container_id, &self.index);
        let issues = &mut *self.issues;

        for assignment in &course.assignments {
            if let (Some(id), Some(html)) = (
                self.index.get(ObjectKind::Assignment, &assignment.migration_id),
                assignment.description.as_deref().filter(|h| h.contains(FILEBASE_TOKEN)),
            ) {
                let html = rewriter.rewrite(html, LinkField::AssignmentDescription, &assignment.migration_id, issues);
                Assignment::set_description(self.tx, id, &html)?;
            }
        }

        for topic in &course.discussion_topics {
            if let Some(id) = self.index.get(ObjectKind::DiscussionTopic, &topic.migration_id)
                && topic.message.contains(FILEBASE_TOKEN)
            {
                let html = rewriter.rewrite(&topic.message, LinkField::DiscussionTopicMessage, &topic.migration_id, issues);
                DiscussionTopic::set_message(self.tx, id, &html)?;
            }
        }

        for page in &course.wiki_pages {
            if let Some(id) = self.index.get(ObjectKind::WikiPage, &page.migration_id)
                && page.body.contains(FILEBASE_TOKEN)
            {
                let html = rewriter.rewrite(&page.body, LinkField::WikiPageBody, &page.migration_id, issues);
                WikiPage::set_body(self.tx, id, &html)?;
            }
        }

        for quiz in &course.quizzes {
            if let (Some(id), Some(html)) = (
                self.index.get(ObjectKind::Quiz, &quiz.migration_id),
                quiz.description.as_deref().filter(|h| h.contains(FILEBASE_TOKEN)),
            ) {
                let html = rewriter.rewrite(html, LinkField::QuizDescription, &quiz.migration_id, issues);
                Quiz::set_description(self.tx, id, &html)?;
            }
        }

        for question in &course.assessment_questions {
            if let Some(id) = self.index.get(ObjectKind::AssessmentQuestion, &question.migration_id)
                && question.question_text.contains(FILEBASE_TOKEN)
            {
                let html = rewriter.rewrite(&question.question_text, LinkField::QuestionText, &question.migration_id, issues);
                AssessmentQuestion::set_question_text(self.tx, id, &html)?;
            }
        }

        if let Some(body) = course
            .course
            .syllabus_body
            .as_deref()
            .filter(|h| h.contains(FILEBASE_TOKEN))
        {
            let html = rewriter.rewrite(body, LinkField::SyllabusBody, "syllabus_body", issues);
            Container::set_syllabus_body(self.tx, self.container_id, &html)?;
        }

        Ok(())
    }
}
