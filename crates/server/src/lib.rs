//! Composition root for the quizzes server: service wiring and the HTTP
//! surface used by the `quizzes` binary.

pub mod routes;
pub mod services;

pub use routes::{AppState, router};
pub use services::Services;
