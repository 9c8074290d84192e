//! Quiz result repository.

use std::sync::Arc;

use quizzes_common::{AppError, AppResult};
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait, Order,
    QueryFilter, QueryOrder,
};

use crate::entities::{QuizResult, quiz_result};

/// Repository for graded submissions. Results are append-only; the only
/// update clears the user reference when an account goes away.
#[derive(Clone)]
pub struct QuizResultRepository {
    db: Arc<DatabaseConnection>,
}

impl QuizResultRepository {
    /// Create a new result repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Store a new result.
    pub async fn create(&self, model: quiz_result::ActiveModel) -> AppResult<quiz_result::Model> {
        model
            .insert(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// A user's results, oldest first.
    pub async fn find_by_user(&self, user_id: &str) -> AppResult<Vec<quiz_result::Model>> {
        QuizResult::find()
            .filter(quiz_result::Column::UserId.eq(user_id))
            .order_by(quiz_result::Column::Timestamp, Order::Asc)
            .order_by(quiz_result::Column::Id, Order::Asc)
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// A user's results restricted to the given quizzes, oldest first.
    pub async fn find_by_user_in_quizzes(
        &self,
        user_id: &str,
        quiz_ids: Vec<String>,
    ) -> AppResult<Vec<quiz_result::Model>> {
        if quiz_ids.is_empty() {
            return Ok(vec![]);
        }

        QuizResult::find()
            .filter(quiz_result::Column::UserId.eq(user_id))
            .filter(quiz_result::Column::QuizId.is_in(quiz_ids))
            .order_by(quiz_result::Column::Timestamp, Order::Asc)
            .order_by(quiz_result::Column::Id, Order::Asc)
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// All results of a quiz, oldest first.
    pub async fn find_by_quiz(&self, quiz_id: &str) -> AppResult<Vec<quiz_result::Model>> {
        QuizResult::find()
            .filter(quiz_result::Column::QuizId.eq(quiz_id))
            .order_by(quiz_result::Column::Timestamp, Order::Asc)
            .order_by(quiz_result::Column::Id, Order::Asc)
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Every result, oldest first.
    pub async fn find_all(&self) -> AppResult<Vec<quiz_result::Model>> {
        QuizResult::find()
            .order_by(quiz_result::Column::Timestamp, Order::Asc)
            .order_by(quiz_result::Column::Id, Order::Asc)
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// The most recent result of a user for a quiz.
    pub async fn find_latest(
        &self,
        quiz_id: &str,
        user_id: &str,
    ) -> AppResult<Option<quiz_result::Model>> {
        QuizResult::find()
            .filter(quiz_result::Column::QuizId.eq(quiz_id))
            .filter(quiz_result::Column::UserId.eq(user_id))
            .order_by(quiz_result::Column::Timestamp, Order::Desc)
            .order_by(quiz_result::Column::Id, Order::Desc)
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Keep a user's results but drop the reference to the user.
    pub async fn detach_user<C: ConnectionTrait>(&self, conn: &C, user_id: &str) -> AppResult<u64> {
        let result = QuizResult::update_many()
            .col_expr(
                quiz_result::Column::UserId,
                Expr::value(Option::<String>::None),
            )
            .filter(quiz_result::Column::UserId.eq(user_id))
            .exec(conn)
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        Ok(result.rows_affected)
    }
}
