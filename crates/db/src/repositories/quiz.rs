//! Quiz repository.

use std::sync::Arc;

use quizzes_common::{AppError, AppResult};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait, Order,
    PaginatorTrait, QueryFilter, QueryOrder, QuerySelect,
};

use crate::entities::{Answer, Notification, Question, Quiz, QuizResult};
use crate::entities::{answer, notification, question, quiz, quiz_result};

/// Repository for the quiz / question / answer aggregate.
#[derive(Clone)]
pub struct QuizRepository {
    db: Arc<DatabaseConnection>,
}

impl QuizRepository {
    /// Create a new quiz repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Get reference to the database connection.
    #[must_use]
    pub fn db(&self) -> &DatabaseConnection {
        self.db.as_ref()
    }

    // ==================== Quiz Operations ====================

    /// Find quiz by ID.
    pub async fn find_by_id(&self, id: &str) -> AppResult<Option<quiz::Model>> {
        Quiz::find_by_id(id)
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Get quiz by ID, returning error if not found.
    pub async fn get_by_id(&self, id: &str) -> AppResult<quiz::Model> {
        self.find_by_id(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Quiz not found: {id}")))
    }

    /// Load a quiz with a row lock held until the transaction ends.
    ///
    /// Writers that check the question count take this lock first so two
    /// concurrent removals cannot both see room to delete.
    pub async fn lock<C: ConnectionTrait>(&self, conn: &C, id: &str) -> AppResult<quiz::Model> {
        Quiz::find_by_id(id)
            .lock_exclusive()
            .one(conn)
            .await
            .map_err(|e| AppError::Database(e.to_string()))?
            .ok_or_else(|| AppError::NotFound(format!("Quiz not found: {id}")))
    }

    /// Quizzes of a company, oldest first.
    pub async fn find_by_company<C: ConnectionTrait>(
        &self,
        conn: &C,
        company_id: &str,
    ) -> AppResult<Vec<quiz::Model>> {
        Quiz::find()
            .filter(quiz::Column::CompanyId.eq(company_id))
            .order_by(quiz::Column::CreatedAt, Order::Asc)
            .all(conn)
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Quizzes of several companies.
    pub async fn find_by_companies(&self, company_ids: Vec<String>) -> AppResult<Vec<quiz::Model>> {
        if company_ids.is_empty() {
            return Ok(vec![]);
        }

        Quiz::find()
            .filter(quiz::Column::CompanyId.is_in(company_ids))
            .order_by(quiz::Column::CreatedAt, Order::Asc)
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Every quiz.
    pub async fn find_all(&self) -> AppResult<Vec<quiz::Model>> {
        Quiz::find()
            .order_by(quiz::Column::CreatedAt, Order::Asc)
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Insert a quiz row.
    pub async fn create<C: ConnectionTrait>(
        &self,
        conn: &C,
        model: quiz::ActiveModel,
    ) -> AppResult<quiz::Model> {
        model
            .insert(conn)
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Update a quiz row.
    pub async fn update<C: ConnectionTrait>(
        &self,
        conn: &C,
        model: quiz::ActiveModel,
    ) -> AppResult<quiz::Model> {
        model
            .update(conn)
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Delete a quiz together with its questions, answers, results and
    /// reminders.
    pub async fn delete<C: ConnectionTrait>(&self, conn: &C, id: &str) -> AppResult<()> {
        self.delete_questions_of_quiz(conn, id).await?;

        QuizResult::delete_many()
            .filter(quiz_result::Column::QuizId.eq(id))
            .exec(conn)
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        Notification::delete_many()
            .filter(notification::Column::QuizId.eq(id))
            .exec(conn)
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        Quiz::delete_by_id(id)
            .exec(conn)
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        Ok(())
    }

    // ==================== Question Operations ====================

    /// Find a question by ID.
    pub async fn find_question(&self, id: &str) -> AppResult<Option<question::Model>> {
        Question::find_by_id(id)
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Questions of a quiz in authored order.
    pub async fn find_questions<C: ConnectionTrait>(
        &self,
        conn: &C,
        quiz_id: &str,
    ) -> AppResult<Vec<question::Model>> {
        Question::find()
            .filter(question::Column::QuizId.eq(quiz_id))
            .order_by(question::Column::Position, Order::Asc)
            .all(conn)
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Number of questions a quiz currently has.
    pub async fn count_questions<C: ConnectionTrait>(
        &self,
        conn: &C,
        quiz_id: &str,
    ) -> AppResult<u64> {
        Question::find()
            .filter(question::Column::QuizId.eq(quiz_id))
            .count(conn)
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Position to give a question appended to the quiz.
    pub async fn next_position<C: ConnectionTrait>(
        &self,
        conn: &C,
        quiz_id: &str,
    ) -> AppResult<i32> {
        let last = Question::find()
            .filter(question::Column::QuizId.eq(quiz_id))
            .order_by(question::Column::Position, Order::Desc)
            .one(conn)
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        Ok(last.map_or(0, |q| q.position + 1))
    }

    /// Insert a question row.
    pub async fn insert_question<C: ConnectionTrait>(
        &self,
        conn: &C,
        model: question::ActiveModel,
    ) -> AppResult<question::Model> {
        model
            .insert(conn)
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Delete a question and its answers.
    pub async fn delete_question<C: ConnectionTrait>(&self, conn: &C, id: &str) -> AppResult<()> {
        Answer::delete_many()
            .filter(answer::Column::QuestionId.eq(id))
            .exec(conn)
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        Question::delete_by_id(id)
            .exec(conn)
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        Ok(())
    }

    /// Delete every question of a quiz and their answers.
    pub async fn delete_questions_of_quiz<C: ConnectionTrait>(
        &self,
        conn: &C,
        quiz_id: &str,
    ) -> AppResult<()> {
        let question_ids: Vec<String> = self
            .find_questions(conn, quiz_id)
            .await?
            .into_iter()
            .map(|q| q.id)
            .collect();

        if question_ids.is_empty() {
            return Ok(());
        }

        Answer::delete_many()
            .filter(answer::Column::QuestionId.is_in(question_ids))
            .exec(conn)
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        Question::delete_many()
            .filter(question::Column::QuizId.eq(quiz_id))
            .exec(conn)
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        Ok(())
    }

    // ==================== Answer Operations ====================

    /// Answers of the given questions, grouped by question in authored order.
    pub async fn find_answers<C: ConnectionTrait>(
        &self,
        conn: &C,
        question_ids: Vec<String>,
    ) -> AppResult<Vec<answer::Model>> {
        if question_ids.is_empty() {
            return Ok(vec![]);
        }

        Answer::find()
            .filter(answer::Column::QuestionId.is_in(question_ids))
            .order_by(answer::Column::QuestionId, Order::Asc)
            .order_by(answer::Column::Position, Order::Asc)
            .all(conn)
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Insert the answers of one question.
    pub async fn insert_answers<C: ConnectionTrait>(
        &self,
        conn: &C,
        models: Vec<answer::ActiveModel>,
    ) -> AppResult<()> {
        if models.is_empty() {
            return Ok(());
        }

        Answer::insert_many(models)
            .exec(conn)
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        Ok(())
    }
}
