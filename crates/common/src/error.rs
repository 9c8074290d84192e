//! Error types for quizzes-rs.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;

/// Application result type.
pub type AppResult<T> = Result<T, AppError>;

/// Application error type.
#[derive(Debug, Error)]
pub enum AppError {
    // === Client Errors ===
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Unauthorized")]
    Unauthorized,

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Validation error: {0}")]
    Validation(String),

    // === Membership ===
    #[error("User {0} is already a member of this company")]
    AlreadyMember(String),

    #[error("User {0} is not a member of this company")]
    NotAMember(String),

    #[error("User {0} is not an administrator of this company")]
    NotAnAdministrator(String),

    #[error("The company owner cannot {0}")]
    OwnerProtected(String),

    #[error("The company owner cannot be an administrator")]
    OwnerCannotBeAdmin,

    // === Invitations & Requests ===
    #[error("A pending {0} already exists")]
    DuplicatePending(String),

    #[error("Cannot move from {from} to {to}")]
    InvalidStateTransition { from: String, to: String },

    // === Quiz Authoring ===
    #[error("A quiz must have at least 2 questions")]
    InsufficientQuestions,

    #[error("Question must have at least 2 answers: {0}")]
    InsufficientAnswers(String),

    #[error("Question must have at least one correct answer: {0}")]
    NoCorrectAnswer(String),

    #[error("The quiz must keep at least 2 questions")]
    MinimumQuestions,

    #[error("Question {0} is not part of this quiz")]
    NotPartOfQuiz(String),

    #[error("Question with id #{0} not found")]
    QuestionNotFound(String),

    // === Server Errors ===
    #[error("Database error: {0}")]
    Database(String),

    #[error("Redis error: {0}")]
    Redis(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// Returns the HTTP status code for this error.
    #[must_use]
    pub const fn status_code(&self) -> StatusCode {
        match self {
            // 4xx Client Errors
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Unauthorized => StatusCode::UNAUTHORIZED,
            Self::Forbidden(_) => StatusCode::FORBIDDEN,
            Self::BadRequest(_)
            | Self::Validation(_)
            | Self::AlreadyMember(_)
            | Self::NotAMember(_)
            | Self::NotAnAdministrator(_)
            | Self::OwnerProtected(_)
            | Self::OwnerCannotBeAdmin
            | Self::DuplicatePending(_)
            | Self::InvalidStateTransition { .. }
            | Self::InsufficientQuestions
            | Self::InsufficientAnswers(_)
            | Self::NoCorrectAnswer(_)
            | Self::MinimumQuestions
            | Self::NotPartOfQuiz(_)
            | Self::QuestionNotFound(_) => StatusCode::BAD_REQUEST,

            // 5xx Server Errors
            Self::Database(_) | Self::Redis(_) | Self::Config(_) | Self::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    /// Returns the error code for API responses.
    #[must_use]
    pub const fn error_code(&self) -> &'static str {
        match self {
            Self::NotFound(_) => "NOT_FOUND",
            Self::Unauthorized => "UNAUTHORIZED",
            Self::Forbidden(_) => "FORBIDDEN",
            Self::BadRequest(_) => "BAD_REQUEST",
            Self::Validation(_) => "VALIDATION_ERROR",
            Self::AlreadyMember(_) => "ALREADY_MEMBER",
            Self::NotAMember(_) => "NOT_A_MEMBER",
            Self::NotAnAdministrator(_) => "NOT_AN_ADMINISTRATOR",
            Self::OwnerProtected(_) => "OWNER_PROTECTED",
            Self::OwnerCannotBeAdmin => "OWNER_CANNOT_BE_ADMIN",
            Self::DuplicatePending(_) => "DUPLICATE_PENDING",
            Self::InvalidStateTransition { .. } => "INVALID_STATE_TRANSITION",
            Self::InsufficientQuestions => "INSUFFICIENT_QUESTIONS",
            Self::InsufficientAnswers(_) => "INSUFFICIENT_ANSWERS",
            Self::NoCorrectAnswer(_) => "NO_CORRECT_ANSWER",
            Self::MinimumQuestions => "MINIMUM_QUESTIONS",
            Self::NotPartOfQuiz(_) => "NOT_PART_OF_QUIZ",
            Self::QuestionNotFound(_) => "QUESTION_NOT_FOUND",
            Self::Database(_) => "DATABASE_ERROR",
            Self::Redis(_) => "REDIS_ERROR",
            Self::Config(_) => "CONFIG_ERROR",
            Self::Internal(_) => "INTERNAL_ERROR",
        }
    }

    /// Returns whether this error should be logged at error level.
    #[must_use]
    pub fn is_server_error(&self) -> bool {
        self.status_code().is_server_error()
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let code = self.error_code();

        if self.is_server_error() {
            tracing::error!(error = %self, code = code, "Server error occurred");
        } else {
            tracing::debug!(error = %self, code = code, "Client error occurred");
        }

        let body = Json(json!({
            "error": {
                "code": code,
                "message": self.to_string(),
            }
        }));

        (status, body).into_response()
    }
}

// === From implementations ===

impl From<validator::ValidationErrors> for AppError {
    fn from(err: validator::ValidationErrors) -> Self {
        Self::Validation(err.to_string())
    }
}

impl From<config::ConfigError> for AppError {
    fn from(err: config::ConfigError) -> Self {
        Self::Config(err.to_string())
    }
}

impl From<anyhow::Error> for AppError {
    fn from(err: anyhow::Error) -> Self {
        Self::Internal(err.to_string())
    }
}
