//! Common utilities and shared types for quizzes-rs.
//!
//! This crate provides foundational components used across all quizzes-rs crates:
//!
//! - **Configuration**: Application settings via [`Config`]
//! - **Error handling**: Unified error types via [`AppError`] and [`AppResult`]
//! - **ID Generation**: ULID-based unique identifiers via [`IdGenerator`]
//! - **Cache**: TTL-bounded Redis cache via [`EphemeralCache`]
//!
//! # Example
//!
//! ```no_run
//! use quizzes_common::{Config, IdGenerator, AppResult};
//!
//! fn example() -> AppResult<()> {
//!     let config = Config::load()?;
//!     let id_gen = IdGenerator::new();
//!     let id = id_gen.generate();
//!     println!("Generated ID: {}", id);
//!     Ok(())
//! }
//! ```

pub mod cache;
pub mod config;
pub mod error;
pub mod id;

pub use cache::{CacheError, EphemeralCache, EphemeralCacheService, RedisCache};
pub use config::Config;
pub use error::{AppError, AppResult};
pub use id::IdGenerator;
