//! Scheduled jobs.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use quizzes_core::services::ReminderService;
use tokio::task::JoinHandle;
use tokio::time::interval;

/// Scheduler configuration.
#[derive(Debug, Clone)]
pub struct SchedulerConfig {
    /// Interval between reminder sweeps (default: 1 day).
    pub reminder_interval: Duration,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            reminder_interval: Duration::from_secs(86_400),
        }
    }
}

impl From<&quizzes_common::config::SchedulerConfig> for SchedulerConfig {
    fn from(config: &quizzes_common::config::SchedulerConfig) -> Self {
        Self {
            reminder_interval: Duration::from_secs(config.reminder_interval_secs.max(1)),
        }
    }
}

/// Job executor trait for scheduled jobs.
#[async_trait::async_trait]
pub trait JobExecutor: Send + Sync {
    /// Send reminders to users whose last attempt is overdue.
    async fn notify_due_users(&self) -> Result<u64, Box<dyn std::error::Error + Send + Sync>>;
}

#[async_trait::async_trait]
impl JobExecutor for ReminderService {
    async fn notify_due_users(&self) -> Result<u64, Box<dyn std::error::Error + Send + Sync>> {
        Ok(Self::notify_due_users(self, Utc::now()).await?)
    }
}

/// Run the scheduler with the given configuration and executor.
///
/// The first sweep runs immediately. The returned handle can be aborted to
/// stop the loop.
pub fn run_scheduler<E: JobExecutor + 'static>(
    config: SchedulerConfig,
    executor: Arc<E>,
) -> JoinHandle<()> {
    let reminder_interval = config.reminder_interval;

    tokio::spawn(async move {
        let mut interval = interval(reminder_interval);
        loop {
            interval.tick().await;
            match executor.notify_due_users().await {
                Ok(count) => {
                    if count > 0 {
                        tracing::info!(count, "Sent quiz reminders");
                    }
                }
                Err(e) => {
                    tracing::error!(error = %e, "Failed to send quiz reminders");
                }
            }
        }
    })
}
