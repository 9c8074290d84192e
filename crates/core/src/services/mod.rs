//! Business logic services.

#![allow(missing_docs)]

pub(crate) mod access;
pub mod analytics;
pub mod approval;
pub mod company;
pub mod event_publisher;
pub mod grading;
pub mod invitation;
pub mod notification;
pub mod quiz;
pub mod reminder;
pub mod user;
pub mod user_request;

pub use analytics::{AnalyticsService, QuizScores, ScoreDynamics, ScorePoint, average_score, score_dynamics};
pub use approval::{Approvable, ApprovalStatus, transition};
pub use company::{CompanyService, CreateCompanyInput, UpdateCompanyInput};
pub use event_publisher::{
    EventDispatcher, EventPublisher, EventPublisherService, NoOpEventPublisher, StreamEvent,
};
pub use grading::{GradedSubmission, GradingService, QuestionOutcome, SubmittedAnswer};
pub use invitation::{InvitationResponse, InvitationService};
pub use notification::NotificationService;
pub use quiz::{
    AnswerDetail, AnswerInput, CreateQuizInput, QuestionDetail, QuestionInput, QuizDetail,
    QuizService, UpdateQuizInput,
};
pub use reminder::ReminderService;
pub use user::{CreateUserInput, UserService};
pub use user_request::RequestService;

use quizzes_common::{AppError, AppResult};
use sea_orm::{DatabaseConnection, DatabaseTransaction, TransactionTrait};

/// Start a transaction. Dropping it without [`commit`] rolls it back.
pub(crate) async fn begin(db: &DatabaseConnection) -> AppResult<DatabaseTransaction> {
    db.begin()
        .await
        .map_err(|e| AppError::Database(e.to_string()))
}

/// Commit a transaction.
pub(crate) async fn commit(txn: DatabaseTransaction) -> AppResult<()> {
    txn.commit()
        .await
        .map_err(|e| AppError::Database(e.to_string()))
}
