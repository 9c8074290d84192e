//! Quiz authoring service.

use std::collections::HashMap;

use chrono::{DateTime, FixedOffset, Utc};
use quizzes_common::{AppError, AppResult, IdGenerator};
use quizzes_db::entities::{answer, question, quiz};
use quizzes_db::repositories::{CompanyRepository, QuizRepository};
use sea_orm::{ConnectionTrait, Set};
use serde::{Deserialize, Serialize};
use tracing::info;
use validator::Validate;

use super::{access, begin, commit};

/// Minimum number of questions a quiz must keep.
const MIN_QUESTIONS: usize = 2;

/// Minimum number of answers a question must offer.
const MIN_ANSWERS: usize = 2;

/// One answer option of a question.
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct AnswerInput {
    #[validate(length(min = 1, max = 1024))]
    pub text: String,
    #[serde(default)]
    pub is_correct: bool,
}

/// A question with its answer options.
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct QuestionInput {
    #[validate(length(min = 1, max = 2048))]
    pub text: String,
    pub answers: Vec<AnswerInput>,
}

/// Input for creating a quiz.
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateQuizInput {
    pub company_id: String,
    #[validate(length(min = 1, max = 256))]
    pub title: String,
    #[validate(length(max = 4096))]
    pub description: Option<String>,
    /// Days between attempts before a reminder is sent.
    #[serde(default)]
    #[validate(range(min = 0))]
    pub frequency: i32,
    pub questions: Vec<QuestionInput>,
}

/// Input for updating a quiz.
///
/// When `questions` is present the whole question set is replaced.
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateQuizInput {
    pub quiz_id: String,
    #[validate(length(min = 1, max = 256))]
    pub title: Option<String>,
    #[validate(length(max = 4096))]
    pub description: Option<Option<String>>,
    #[validate(range(min = 0))]
    pub frequency: Option<i32>,
    pub questions: Option<Vec<QuestionInput>>,
}

/// An answer option as shown to a reader.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AnswerDetail {
    pub id: String,
    pub text: String,
    /// Hidden from members who cannot manage the quiz.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_correct: Option<bool>,
}

/// A question with its answers in authored order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QuestionDetail {
    pub id: String,
    pub position: i32,
    pub text: String,
    pub answers: Vec<AnswerDetail>,
}

/// A quiz with its full question graph.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QuizDetail {
    pub id: String,
    pub company_id: String,
    pub title: String,
    pub description: Option<String>,
    pub frequency: i32,
    pub created_at: DateTime<FixedOffset>,
    pub updated_at: Option<DateTime<FixedOffset>>,
    pub questions: Vec<QuestionDetail>,
}

impl QuizDetail {
    fn redacted(mut self) -> Self {
        for answer in self.questions.iter_mut().flat_map(|q| q.answers.iter_mut()) {
            answer.is_correct = None;
        }
        self
    }
}

/// Check the answer rules of a single question.
fn validate_question(question: &QuestionInput) -> AppResult<()> {
    question
        .validate()
        .map_err(|e| AppError::Validation(e.to_string()))?;

    for answer in &question.answers {
        answer
            .validate()
            .map_err(|e| AppError::Validation(e.to_string()))?;
    }

    if question.answers.len() < MIN_ANSWERS {
        return Err(AppError::InsufficientAnswers(question.text.clone()));
    }

    if !question.answers.iter().any(|a| a.is_correct) {
        return Err(AppError::NoCorrectAnswer(question.text.clone()));
    }

    Ok(())
}

/// Check a full question set.
fn validate_questions(questions: &[QuestionInput]) -> AppResult<()> {
    if questions.len() < MIN_QUESTIONS {
        return Err(AppError::InsufficientQuestions);
    }

    questions.iter().try_for_each(validate_question)
}

/// Service for authoring quizzes.
#[derive(Clone)]
pub struct QuizService {
    quiz_repo: QuizRepository,
    company_repo: CompanyRepository,
    id_gen: IdGenerator,
}

impl QuizService {
    /// Create a new quiz service.
    #[must_use]
    pub const fn new(quiz_repo: QuizRepository, company_repo: CompanyRepository) -> Self {
        Self {
            quiz_repo,
            company_repo,
            id_gen: IdGenerator::new(),
        }
    }

    /// Create a quiz with its questions. Owner or administrator only.
    pub async fn create_quiz(&self, actor_id: &str, input: CreateQuizInput) -> AppResult<QuizDetail> {
        input
            .validate()
            .map_err(|e| AppError::Validation(e.to_string()))?;

        self.company_repo.get_by_id(&input.company_id).await?;
        access::require_manager(&self.company_repo, &input.company_id, actor_id).await?;
        validate_questions(&input.questions)?;

        let quiz_id = self.id_gen.generate();
        let model = quiz::ActiveModel {
            id: Set(quiz_id.clone()),
            company_id: Set(input.company_id),
            title: Set(input.title),
            description: Set(input.description),
            frequency: Set(input.frequency),
            created_at: Set(Utc::now().into()),
            updated_at: Set(None),
        };

        let txn = begin(self.quiz_repo.db()).await?;
        let quiz = self.quiz_repo.create(&txn, model).await?;
        for (position, question) in (0..).zip(&input.questions) {
            self.write_question(&txn, &quiz_id, position, question).await?;
        }
        let detail = self.load_detail(&txn, quiz).await?;
        commit(txn).await?;

        info!(quiz_id = %quiz_id, questions = detail.questions.len(), "Quiz created");
        Ok(detail)
    }

    /// Update a quiz, optionally replacing all of its questions.
    pub async fn update_quiz(&self, actor_id: &str, input: UpdateQuizInput) -> AppResult<QuizDetail> {
        input
            .validate()
            .map_err(|e| AppError::Validation(e.to_string()))?;

        let quiz = self.quiz_repo.get_by_id(&input.quiz_id).await?;
        access::require_manager(&self.company_repo, &quiz.company_id, actor_id).await?;

        if let Some(questions) = &input.questions {
            validate_questions(questions)?;
        }

        let mut active: quiz::ActiveModel = quiz.into();

        if let Some(title) = input.title {
            active.title = Set(title);
        }
        if let Some(description) = input.description {
            active.description = Set(description);
        }
        if let Some(frequency) = input.frequency {
            active.frequency = Set(frequency);
        }

        active.updated_at = Set(Some(Utc::now().into()));

        let txn = begin(self.quiz_repo.db()).await?;
        self.quiz_repo.lock(&txn, &input.quiz_id).await?;
        let quiz = self.quiz_repo.update(&txn, active).await?;

        if let Some(questions) = &input.questions {
            self.quiz_repo
                .delete_questions_of_quiz(&txn, &quiz.id)
                .await?;
            for (position, question) in (0..).zip(questions) {
                self.write_question(&txn, &quiz.id, position, question).await?;
            }
        }

        let detail = self.load_detail(&txn, quiz).await?;
        commit(txn).await?;

        info!(quiz_id = %detail.id, "Quiz updated");
        Ok(detail)
    }

    /// Delete a quiz with its questions and results.
    pub async fn delete_quiz(&self, actor_id: &str, quiz_id: &str) -> AppResult<()> {
        let quiz = self.quiz_repo.get_by_id(quiz_id).await?;
        access::require_manager(&self.company_repo, &quiz.company_id, actor_id).await?;

        let txn = begin(self.quiz_repo.db()).await?;
        self.quiz_repo.delete(&txn, quiz_id).await?;
        commit(txn).await?;

        info!(quiz_id = %quiz_id, "Quiz deleted");
        Ok(())
    }

    /// Append a question to a quiz.
    pub async fn add_question(
        &self,
        actor_id: &str,
        quiz_id: &str,
        input: QuestionInput,
    ) -> AppResult<QuestionDetail> {
        let quiz = self.quiz_repo.get_by_id(quiz_id).await?;
        access::require_manager(&self.company_repo, &quiz.company_id, actor_id).await?;
        validate_question(&input)?;

        let txn = begin(self.quiz_repo.db()).await?;
        self.quiz_repo.lock(&txn, quiz_id).await?;
        let position = self.quiz_repo.next_position(&txn, quiz_id).await?;
        let question = self.write_question(&txn, quiz_id, position, &input).await?;
        commit(txn).await?;

        Ok(question)
    }

    /// Remove a question, keeping at least two in the quiz.
    pub async fn remove_question(
        &self,
        actor_id: &str,
        quiz_id: &str,
        question_id: &str,
    ) -> AppResult<()> {
        let quiz = self.quiz_repo.get_by_id(quiz_id).await?;
        access::require_manager(&self.company_repo, &quiz.company_id, actor_id).await?;

        let question = self
            .quiz_repo
            .find_question(question_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Question not found: {question_id}")))?;

        if question.quiz_id != quiz_id {
            return Err(AppError::NotPartOfQuiz(question_id.to_string()));
        }

        // Serializes with other removals and replacements of this quiz.
        let txn = begin(self.quiz_repo.db()).await?;
        self.quiz_repo.lock(&txn, quiz_id).await?;
        let count = self.quiz_repo.count_questions(&txn, quiz_id).await?;
        if count <= MIN_QUESTIONS as u64 {
            return Err(AppError::MinimumQuestions);
        }
        self.quiz_repo.delete_question(&txn, question_id).await?;
        commit(txn).await?;

        Ok(())
    }

    /// Read a quiz with its questions. Members only; the correct answers
    /// are only shown to the owner and administrators.
    pub async fn get_quiz(&self, viewer_id: &str, quiz_id: &str) -> AppResult<QuizDetail> {
        let quiz = self.quiz_repo.get_by_id(quiz_id).await?;
        let member = access::require_member(&self.company_repo, &quiz.company_id, viewer_id).await?;

        let detail = self.load_detail(self.quiz_repo.db(), quiz).await?;

        if member.role.can_manage() {
            Ok(detail)
        } else {
            Ok(detail.redacted())
        }
    }

    /// Quizzes of a company. Members only.
    pub async fn list_company_quizzes(
        &self,
        viewer_id: &str,
        company_id: &str,
    ) -> AppResult<Vec<quiz::Model>> {
        self.company_repo.get_by_id(company_id).await?;
        access::require_member(&self.company_repo, company_id, viewer_id).await?;

        self.quiz_repo
            .find_by_company(self.quiz_repo.db(), company_id)
            .await
    }

    async fn write_question<C: ConnectionTrait>(
        &self,
        conn: &C,
        quiz_id: &str,
        position: i32,
        input: &QuestionInput,
    ) -> AppResult<QuestionDetail> {
        let question_id = self.id_gen.generate();
        let question = self
            .quiz_repo
            .insert_question(
                conn,
                question::ActiveModel {
                    id: Set(question_id.clone()),
                    quiz_id: Set(quiz_id.to_string()),
                    position: Set(position),
                    text: Set(input.text.clone()),
                },
            )
            .await?;

        let mut answers = Vec::with_capacity(input.answers.len());
        let mut models = Vec::with_capacity(input.answers.len());

        for (position, answer) in (0..).zip(&input.answers) {
            let id = self.id_gen.generate();
            models.push(answer::ActiveModel {
                id: Set(id.clone()),
                question_id: Set(question_id.clone()),
                position: Set(position),
                text: Set(answer.text.clone()),
                is_correct: Set(answer.is_correct),
            });
            answers.push(AnswerDetail {
                id,
                text: answer.text.clone(),
                is_correct: Some(answer.is_correct),
            });
        }

        self.quiz_repo.insert_answers(conn, models).await?;

        Ok(QuestionDetail {
            id: question.id,
            position: question.position,
            text: question.text,
            answers,
        })
    }

    async fn load_detail<C: ConnectionTrait>(
        &self,
        conn: &C,
        quiz: quiz::Model,
    ) -> AppResult<QuizDetail> {
        let questions = self.quiz_repo.find_questions(conn, &quiz.id).await?;
        let ids = questions.iter().map(|q| q.id.clone()).collect();

        let mut answers: HashMap<String, Vec<AnswerDetail>> = HashMap::new();
        for answer in self.quiz_repo.find_answers(conn, ids).await? {
            answers
                .entry(answer.question_id)
                .or_default()
                .push(AnswerDetail {
                    id: answer.id,
                    text: answer.text,
                    is_correct: Some(answer.is_correct),
                });
        }

        let questions = questions
            .into_iter()
            .map(|q| QuestionDetail {
                answers: answers.remove(&q.id).unwrap_or_default(),
                id: q.id,
                position: q.position,
                text: q.text,
            })
            .collect();

        Ok(QuizDetail {
            id: quiz.id,
            company_id: quiz.company_id,
            title: quiz.title,
            description: quiz.description,
            frequency: quiz.frequency,
            created_at: quiz.created_at,
            updated_at: quiz.updated_at,
            questions,
        })
    }
}
