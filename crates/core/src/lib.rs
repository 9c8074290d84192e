//! Core business logic for quizzes-rs.
//!
//! Services for company membership, invitations and join requests, quiz
//! authoring, grading, score analytics and reminders.

pub mod services;

pub use services::*;
