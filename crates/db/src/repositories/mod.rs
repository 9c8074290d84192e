//! Repositories.
//!
//! Each repository owns a shared pool handle for plain reads. Methods that
//! take a `conn` argument also run inside a transaction, so multi-step
//! writes can pass the same `DatabaseTransaction` to every call.

mod company;
mod company_invitation;
mod notification;
mod quiz;
mod quiz_result;
mod user;
mod user_request;

pub use company::CompanyRepository;
pub use company_invitation::CompanyInvitationRepository;
pub use notification::NotificationRepository;
pub use quiz::QuizRepository;
pub use quiz_result::QuizResultRepository;
pub use user::UserRepository;
pub use user_request::UserRequestRepository;

use quizzes_common::AppError;
use sea_orm::{DbErr, SqlErr};

/// Map an insert error, reporting unique violations as `on_conflict`.
pub(crate) fn map_insert_err(err: DbErr, on_conflict: impl FnOnce() -> AppError) -> AppError {
    match err.sql_err() {
        Some(SqlErr::UniqueConstraintViolation(_)) => on_conflict(),
        _ => AppError::Database(err.to_string()),
    }
}
