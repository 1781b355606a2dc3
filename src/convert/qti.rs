// src/convert/qti.rs

//! QTI assessment conversion
//!
//! Assessment parsing sits behind the [`QtiConverter`] trait so a fuller QTI
//! implementation can be plugged into the converter. [`BasicQtiConverter`]
//! handles the common cartridge profile: quiz settings from `qtimetadata`
//! and one question per `<item>`.

use crate::ir::{AssessmentQuestionIr, QuizIr};
use crate::issues::{IssueList, MigrationIssue};
use crate::manifest::xml::XmlElement;
use std::collections::BTreeMap;

/// Issue text for pattern match questions
pub const PATTERN_MATCH_ISSUE: &str = "This package includes the question type, Pattern Match, which is not supported and was imported as an essay question.";

/// An assessment or question bank resource handed to a converter
#[derive(Debug, Clone)]
pub struct QtiResource<'a> {
    pub identifier: &'a str,
    /// Title from the organization item, if any
    pub title: Option<&'a str>,
    /// 1-based index among question banks; `None` for assessments
    pub bank_index: Option<usize>,
}

impl QtiResource<'_> {
    pub fn is_bank(&self) -> bool {
        self.bank_index.is_some()
    }

    /// Migration id of the bank the resource's questions go into
    pub fn bank_migration_id(&self) -> Option<String> {
        self.bank_index
            .map(|n| format!("{}_QDB_{}", self.identifier, n))
    }
}

/// Quizzes and questions produced from one resource
#[derive(Debug, Clone, Default)]
pub struct QtiOutput {
    pub quizzes: Vec<QuizIr>,
    pub questions: Vec<AssessmentQuestionIr>,
}

/// Converts a parsed QTI document
pub trait QtiConverter: Send + Sync {
    fn convert(&self, resource: &QtiResource<'_>, doc: &XmlElement, issues: &mut IssueList) -> QtiOutput;
}

/// Built-in converter for the cartridge QTI profile
#[derive(Debug, Clone, Copy, Default)]
pub struct BasicQtiConverter;

/// `fieldlabel` -> `fieldentry` pairs under a metadata element
fn metadata_fields(metadata: Option<&XmlElement>) -> BTreeMap<String, String> {
    let mut fields = BTreeMap::new();
    let Some(metadata) = metadata else {
        return fields;
    };
    for field in metadata.descendants("qtimetadatafield") {
        if let (Some(label), Some(entry)) =
            (field.find_text("fieldlabel"), field.find_text("fieldentry"))
        {
            fields.entry(label).or_insert(entry);
        }
    }
    fields
}

/// Map a cartridge item profile to a question type
fn question_type(profile: &str) -> (&'static str, bool) {
    let profile = profile.to_ascii_lowercase();
    if profile.contains("multiple_choice") {
        ("multiple_choice_question", false)
    } else if profile.contains("multiple_response") {
        ("multiple_answers_question", false)
    } else if profile.contains("true_false") {
        ("true_false_question", false)
    } else if profile.contains("fib") {
        ("short_answer_question", false)
    } else if profile.contains("essay") {
        ("essay_question", false)
    } else if profile.contains("pattern_match") {
        ("essay_question", true)
    } else {
        ("text_only_question", false)
    }
}

impl BasicQtiConverter {
    /// Item idents are only unique within one document, so question ids are
    /// scoped by the owning resource.
    fn convert_item(
        &self,
        resource: &QtiResource<'_>,
        item: &XmlElement,
        index: usize,
        bank: Option<(&str, &str)>,
        issues: &mut IssueList,
    ) -> AssessmentQuestionIr {
        let fields = metadata_fields(item.child("itemmetadata"));
        let profile = fields.get("cc_profile").map(String::as_str).unwrap_or_default();
        let (qtype, pattern_match) = question_type(profile);
        if pattern_match {
            issues.push_once(MigrationIssue::warning(PATTERN_MATCH_ISSUE));
        }

        let question_text = item
            .child("presentation")
            .and_then(|p| p.find_text("mattext"))
            .unwrap_or_default();

        AssessmentQuestionIr {
            migration_id: match item.attr("ident") {
                Some(ident) => format!("{}_{}", resource.identifier, ident),
                None => format!("{}_{}", resource.identifier, index + 1),
            },
            bank_migration_id: bank.map(|(id, _)| id.to_string()),
            bank_title: bank.map(|(_, title)| title.to_string()),
            title: item.attr("title").map(str::to_string),
            question_type: qtype.to_string(),
            question_text,
            points_possible: Some(
                fields
                    .get("cc_weighting")
                    .or_else(|| fields.get("qmd_weighting"))
                    .and_then(|w| w.parse().ok())
                    .unwrap_or(1.0),
            ),
        }
    }
}

impl QtiConverter for BasicQtiConverter {
    fn convert(&self, resource: &QtiResource<'_>, doc: &XmlElement, issues: &mut IssueList) -> QtiOutput {
        let mut output = QtiOutput::default();

        if let Some(bank_id) = resource.bank_migration_id() {
            let bank = doc.find("objectbank").unwrap_or(doc);
            let title = resource
                .title
                .map(str::to_string)
                .or_else(|| metadata_fields(bank.child("qtimetadata")).get("bank_title").cloned())
                .unwrap_or_else(|| resource.identifier.to_string());

            for (n, item) in bank.descendants("item").into_iter().enumerate() {
                let bank = Some((bank_id.as_str(), title.as_str()));
                output
                    .questions
                    .push(self.convert_item(resource, item, n, bank, issues));
            }
            return output;
        }

        let Some(assessment) = (if doc.name == "assessment" {
            Some(doc)
        } else {
            doc.find("assessment")
        }) else {
            issues.push(
                MigrationIssue::warning(format!(
                    "The assessment in resource '{}' has no <assessment> element",
                    resource.identifier
                ))
                .about("quizzes", resource.identifier),
            );
            return output;
        };

        let fields = metadata_fields(assessment.child("qtimetadata"));
        let allowed_attempts = fields.get("cc_maxattempts").and_then(|v| {
            if v.eq_ignore_ascii_case("unlimited") {
                Some(-1)
            } else {
                v.parse().ok()
            }
        });
        // qmd_timelimit is in seconds
        let time_limit = fields
            .get("qmd_timelimit")
            .and_then(|v| v.parse::<i64>().ok())
            .filter(|secs| *secs > 0)
            .map(|secs| (secs + 59) / 60);
        let quiz_type = match fields.get("cc_profile") {
            Some(p) if p.contains("survey") => "survey",
            Some(p) if p.contains("practice") => "practice_quiz",
            _ => "assignment",
        };

        for (n, item) in assessment.descendants("item").into_iter().enumerate() {
            output
                .questions
                .push(self.convert_item(resource, item, n, None, issues));
        }

        let points: f64 = output
            .questions
            .iter()
            .filter_map(|q| q.points_possible)
            .sum();

        output.quizzes.push(QuizIr {
            migration_id: resource.identifier.to_string(),
            title: resource
                .title
                .map(str::to_string)
                .or_else(|| assessment.attr("title").map(str::to_string))
                .unwrap_or_else(|| resource.identifier.to_string()),
            description: assessment
                .child("rubric")
                .and_then(|r| r.find_text("mattext")),
            quiz_type: quiz_type.to_string(),
            allowed_attempts,
            time_limit,
            points_possible: Some(points),
            question_migration_ids: output
                .questions
                .iter()
                .map(|q| q.migration_id.clone())
                .collect(),
        });

        output
    }
}
