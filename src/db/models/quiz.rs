// src/db/models/quiz.rs

//! Quizzes, question banks and assessment questions
//!
//! A question belongs to a bank, to a quiz, or to both when a quiz draws on
//! banked questions.

use super::{WorkflowState, enum_column};
use crate::error::Result;
use rusqlite::{Connection, OptionalExtension, Row, params};

const QUIZ_COLUMNS: &str = "id, container_id, migration_id, title, description, quiz_type, \
     allowed_attempts, time_limit, points_possible, workflow_state";

#[derive(Debug, Clone)]
pub struct Quiz {
    pub id: Option<i64>,
    pub container_id: i64,
    pub migration_id: String,
    pub title: String,
    pub description: Option<String>,
    pub quiz_type: String,
    /// -1 for unlimited
    pub allowed_attempts: Option<i64>,
    /// Minutes
    pub time_limit: Option<i64>,
    pub points_possible: Option<f64>,
    pub workflow_state: WorkflowState,
}

impl Quiz {
    pub fn new(container_id: i64, migration_id: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            id: None,
            container_id,
            migration_id: migration_id.into(),
            title: title.into(),
            description: None,
            quiz_type: "assignment".to_string(),
            allowed_attempts: None,
            time_limit: None,
            points_possible: None,
            workflow_state: WorkflowState::Active,
        }
    }

    pub fn insert(&mut self, conn: &Connection) -> Result<i64> {
        conn.execute(
            "INSERT INTO quizzes (container_id, migration_id, title, description, quiz_type,
                                  allowed_attempts, time_limit, points_possible, workflow_state)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
            params![
                self.container_id,
                &self.migration_id,
                &self.title,
                &self.description,
                &self.quiz_type,
                self.allowed_attempts,
                self.time_limit,
                self.points_possible,
                self.workflow_state.as_str(),
            ],
        )?;

        let id = conn.last_insert_rowid();
        self.id = Some(id);
        Ok(id)
    }

    pub fn update(&self, conn: &Connection) -> Result<()> {
        conn.execute(
            "UPDATE quizzes SET title = ?1, description = ?2, quiz_type = ?3, allowed_attempts = ?4,
             time_limit = ?5, points_possible = ?6, workflow_state = ?7 WHERE id = ?8",
            params![
                &self.title,
                &self.description,
                &self.quiz_type,
                self.allowed_attempts,
                self.time_limit,
                self.points_possible,
                self.workflow_state.as_str(),
                self.id,
            ],
        )?;
        Ok(())
    }

    pub fn set_description(conn: &Connection, id: i64, description: &str) -> Result<()> {
        conn.execute(
            "UPDATE quizzes SET description = ?1 WHERE id = ?2",
            params![description, id],
        )?;
        Ok(())
    }

    pub fn find_by_migration_id(
        conn: &Connection,
        container_id: i64,
        migration_id: &str,
    ) -> Result<Option<Self>> {
        let sql = format!(
            "SELECT {QUIZ_COLUMNS} FROM quizzes WHERE container_id = ?1 AND migration_id = ?2"
        );
        let quiz = conn
            .query_row(&sql, params![container_id, migration_id], Self::from_row)
            .optional()?;
        Ok(quiz)
    }

    pub fn list_for_container(conn: &Connection, container_id: i64) -> Result<Vec<Self>> {
        let sql = format!("SELECT {QUIZ_COLUMNS} FROM quizzes WHERE container_id = ?1 ORDER BY id");
        let mut stmt = conn.prepare(&sql)?;
        let quizzes = stmt
            .query_map([container_id], Self::from_row)?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(quizzes)
    }

    fn from_row(row: &Row) -> rusqlite::Result<Self> {
        Ok(Self {
            id: Some(row.get(0)?),
            container_id: row.get(1)?,
            migration_id: row.get(2)?,
            title: row.get(3)?,
            description: row.get(4)?,
            quiz_type: row.get(5)?,
            allowed_attempts: row.get(6)?,
            time_limit: row.get(7)?,
            points_possible: row.get(8)?,
            workflow_state: enum_column(row, 9)?,
        })
    }
}

#[derive(Debug, Clone)]
pub struct QuestionBank {
    pub id: Option<i64>,
    pub container_id: i64,
    pub migration_id: String,
    pub title: String,
    pub workflow_state: WorkflowState,
}

impl QuestionBank {
    pub fn new(container_id: i64, migration_id: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            id: None,
            container_id,
            migration_id: migration_id.into(),
            title: title.into(),
            workflow_state: WorkflowState::Active,
        }
    }

    pub fn insert(&mut self, conn: &Connection) -> Result<i64> {
        conn.execute(
            "INSERT INTO question_banks (container_id, migration_id, title, workflow_state)
             VALUES (?1, ?2, ?3, ?4)",
            params![
                self.container_id,
                &self.migration_id,
                &self.title,
                self.workflow_state.as_str(),
            ],
        )?;

        let id = conn.last_insert_rowid();
        self.id = Some(id);
        Ok(id)
    }

    pub fn update(&self, conn: &Connection) -> Result<()> {
        conn.execute(
            "UPDATE question_banks SET title = ?1, workflow_state = ?2 WHERE id = ?3",
            params![&self.title, self.workflow_state.as_str(), self.id],
        )?;
        Ok(())
    }

    pub fn find_by_migration_id(
        conn: &Connection,
        container_id: i64,
        migration_id: &str,
    ) -> Result<Option<Self>> {
        let bank = conn
            .query_row(
                "SELECT id, container_id, migration_id, title, workflow_state
                 FROM question_banks WHERE container_id = ?1 AND migration_id = ?2",
                params![container_id, migration_id],
                Self::from_row,
            )
            .optional()?;
        Ok(bank)
    }

    pub fn list_for_container(conn: &Connection, container_id: i64) -> Result<Vec<Self>> {
        let mut stmt = conn.prepare(
            "SELECT id, container_id, migration_id, title, workflow_state
             FROM question_banks WHERE container_id = ?1 ORDER BY id",
        )?;
        let banks = stmt
            .query_map([container_id], Self::from_row)?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(banks)
    }

    fn from_row(row: &Row) -> rusqlite::Result<Self> {
        Ok(Self {
            id: Some(row.get(0)?),
            container_id: row.get(1)?,
            migration_id: row.get(2)?,
            title: row.get(3)?,
            workflow_state: enum_column(row, 4)?,
        })
    }
}

const QUESTION_COLUMNS: &str = "id, container_id, migration_id, bank_id, quiz_id, name, \
     question_type, question_text, points_possible, workflow_state";

#[derive(Debug, Clone)]
pub struct AssessmentQuestion {
    pub id: Option<i64>,
    pub container_id: i64,
    pub migration_id: String,
    pub bank_id: Option<i64>,
    pub quiz_id: Option<i64>,
    pub name: Option<String>,
    pub question_type: String,
    pub question_text: String,
    pub points_possible: Option<f64>,
    pub workflow_state: WorkflowState,
}

impl AssessmentQuestion {
    pub fn new(
        container_id: i64,
        migration_id: impl Into<String>,
        question_type: impl Into<String>,
    ) -> Self {
        Self {
            id: None,
            container_id,
            migration_id: migration_id.into(),
            bank_id: None,
            quiz_id: None,
            name: None,
            question_type: question_type.into(),
            question_text: String::new(),
            points_possible: None,
            workflow_state: WorkflowState::Active,
        }
    }

    pub fn insert(&mut self, conn: &Connection) -> Result<i64> {
        conn.execute(
            "INSERT INTO assessment_questions (container_id, migration_id, bank_id, quiz_id, name,
                                               question_type, question_text, points_possible,
                                               workflow_state)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
            params![
                self.container_id,
                &self.migration_id,
                self.bank_id,
                self.quiz_id,
                &self.name,
                &self.question_type,
                &self.question_text,
                self.points_possible,
                self.workflow_state.as_str(),
            ],
        )?;

        let id = conn.last_insert_rowid();
        self.id = Some(id);
        Ok(id)
    }

    pub fn update(&self, conn: &Connection) -> Result<()> {
        conn.execute(
            "UPDATE assessment_questions SET bank_id = ?1, quiz_id = ?2, name = ?3,
             question_type = ?4, question_text = ?5, points_possible = ?6, workflow_state = ?7
             WHERE id = ?8",
            params![
                self.bank_id,
                self.quiz_id,
                &self.name,
                &self.question_type,
                &self.question_text,
                self.points_possible,
                self.workflow_state.as_str(),
                self.id,
            ],
        )?;
        Ok(())
    }

    pub fn set_quiz(conn: &Connection, id: i64, quiz_id: i64) -> Result<()> {
        conn.execute(
            "UPDATE assessment_questions SET quiz_id = ?1 WHERE id = ?2",
            params![quiz_id, id],
        )?;
        Ok(())
    }

    pub fn set_question_text(conn: &Connection, id: i64, text: &str) -> Result<()> {
        conn.execute(
            "UPDATE assessment_questions SET question_text = ?1 WHERE id = ?2",
            params![text, id],
        )?;
        Ok(())
    }

    pub fn find_by_migration_id(
        conn: &Connection,
        container_id: i64,
        migration_id: &str,
    ) -> Result<Option<Self>> {
        let sql = format!(
            "SELECT {QUESTION_COLUMNS} FROM assessment_questions WHERE container_id = ?1 AND migration_id = ?2"
        );
        let question = conn
            .query_row(&sql, params![container_id, migration_id], Self::from_row)
            .optional()?;
        Ok(question)
    }

    pub fn list_for_quiz(conn: &Connection, quiz_id: i64) -> Result<Vec<Self>> {
        let sql = format!("SELECT {QUESTION_COLUMNS} FROM assessment_questions WHERE quiz_id = ?1 ORDER BY id");
        let mut stmt = conn.prepare(&sql)?;
        let questions = stmt
            .query_map([quiz_id], Self::from_row)?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(questions)
    }

    pub fn list_for_bank(conn: &Connection, bank_id: i64) -> Result<Vec<Self>> {
        let sql = format!("SELECT {QUESTION_COLUMNS} FROM assessment_questions WHERE bank_id = ?1 ORDER BY id");
        let mut stmt = conn.prepare(&sql)?;
        let questions = stmt
            .query_map([bank_id], Self::from_row)?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(questions)
    }

    fn from_row(row: &Row) -> rusqlite::Result<Self> {
        Ok(Self {
            id: Some(row.get(0)?),
            container_id: row.get(1)?,
            migration_id: row.get(2)?,
            bank_id: row.get(3)?,
            quiz_id: row.get(4)?,
            name: row.get(5)?,
            question_type: row.get(6)?,
            question_text: row.get(7)?,
            points_possible: row.get(8)?,
            workflow_state: enum_column(row, 9)?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::models::test_support::create_test_db;

    #[test]
    fn test_banked_question_attached_to_quiz() {
        let (_temp, conn, course) = create_test_db();

        let bank_id = QuestionBank::new(course, "qb1_QDB_1", "Bank").insert(&conn).unwrap();
        let quiz_id = Quiz::new(course, "q1", "Quiz").insert(&conn).unwrap();

        let mut question = AssessmentQuestion::new(course, "item1", "multiple_choice_question");
        question.bank_id = Some(bank_id);
        let qid = question.insert(&conn).unwrap();
        AssessmentQuestion::set_quiz(&conn, qid, quiz_id).unwrap();

        assert_eq!(AssessmentQuestion::list_for_bank(&conn, bank_id).unwrap().len(), 1);
        let in_quiz = AssessmentQuestion::list_for_quiz(&conn, quiz_id).unwrap();
        assert_eq!(in_quiz[0].migration_id, "item1");
    }

    #[test]
    fn test_quiz_defaults() {
        let (_temp, conn, course) = create_test_db();
        let mut quiz = Quiz::new(course, "q1", "Quiz");
        quiz.allowed_attempts = Some(-1);
        quiz.insert(&conn).unwrap();

        let found = Quiz::find_by_migration_id(&conn, course, "q1").unwrap().unwrap();
        assert_eq!(found.quiz_type, "assignment");
        assert_eq!(found.allowed_attempts, Some(-1));
    }
}
