//! Background work for quizzes-rs.
//!
//! - **Pub/Sub**: Real-time event delivery over Redis
//! - **Scheduler**: Periodic reminder sweeps

pub mod pubsub;
pub mod scheduler;

pub use pubsub::{PubSubEvent, RedisPubSub, channels as pubsub_channels};
pub use scheduler::{JobExecutor, SchedulerConfig, run_scheduler};
