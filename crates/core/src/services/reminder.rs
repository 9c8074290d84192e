//! Periodic reminders to retake quizzes.

use std::collections::HashMap;

use chrono::{DateTime, FixedOffset, Utc};
use quizzes_common::AppResult;
use quizzes_db::entities::quiz;
use quizzes_db::repositories::{CompanyRepository, QuizRepository, QuizResultRepository};
use tracing::{debug, info, warn};

use super::notification::NotificationService;

/// Whether a user who last took a quiz at `last_taken` should be reminded.
///
/// Ages are counted in whole days; a `frequency` of 0 reminds on every sweep.
#[must_use]
pub fn is_due(last_taken: DateTime<FixedOffset>, frequency: i32, now: DateTime<Utc>) -> bool {
    let age = now.signed_duration_since(last_taken.with_timezone(&Utc));
    age.num_days() >= i64::from(frequency)
}

/// Service running the reminder sweep.
#[derive(Clone)]
pub struct ReminderService {
    company_repo: CompanyRepository,
    quiz_repo: QuizRepository,
    result_repo: QuizResultRepository,
    notifications: NotificationService,
}

impl ReminderService {
    /// Create a new reminder service.
    #[must_use]
    pub const fn new(
        company_repo: CompanyRepository,
        quiz_repo: QuizRepository,
        result_repo: QuizResultRepository,
        notifications: NotificationService,
    ) -> Self {
        Self {
            company_repo,
            quiz_repo,
            result_repo,
            notifications,
        }
    }

    /// Remind every member whose last attempt at a quiz of their company is
    /// at least `frequency` days old. Users who never took a quiz are not
    /// reminded about it. A failed insert is logged and skipped. Returns the
    /// number of reminders created.
    pub async fn notify_due_users(&self, now: DateTime<Utc>) -> AppResult<u64> {
        let mut quizzes_by_company: HashMap<String, Vec<quiz::Model>> = HashMap::new();
        for quiz in self.quiz_repo.find_all().await? {
            quizzes_by_company
                .entry(quiz.company_id.clone())
                .or_default()
                .push(quiz);
        }

        // results come oldest first, so the last one seen per pair is the latest
        let mut last_taken: HashMap<(String, String), DateTime<FixedOffset>> = HashMap::new();
        for result in self.result_repo.find_all().await? {
            if let Some(user_id) = result.user_id {
                last_taken.insert((result.quiz_id, user_id), result.timestamp);
            }
        }

        let mut sent = 0;

        for member in self.company_repo.find_all_members().await? {
            let Some(quizzes) = quizzes_by_company.get(&member.company_id) else {
                continue;
            };

            for quiz in quizzes {
                let key = (quiz.id.clone(), member.user_id.clone());
                let Some(taken) = last_taken.get(&key) else {
                    continue;
                };

                if !is_due(*taken, quiz.frequency, now) {
                    continue;
                }

                match self.notifications.create_reminder(&member.user_id, quiz).await {
                    Ok(_) => {
                        debug!(user_id = %member.user_id, quiz_id = %quiz.id, "Reminder created");
                        sent += 1;
                    }
                    Err(e) => {
                        warn!(
                            error = %e,
                            user_id = %member.user_id,
                            quiz_id = %quiz.id,
                            "Failed to create reminder"
                        );
                    }
                }
            }
        }

        info!(count = sent, "Reminder sweep finished");
        Ok(sent)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use chrono::Duration;
    use quizzes_db::entities::company_member::{self, CompanyRole};
    use quizzes_db::entities::notification::{self, NotificationStatus, NotificationType};
    use quizzes_db::entities::quiz_result;
    use quizzes_db::repositories::NotificationRepository;
    use sea_orm::{DatabaseBackend, DbErr, MockDatabase};

    #[test]
    fn test_due_after_whole_days() {
        let now = Utc::now();
        let taken = |d: Duration| -> DateTime<FixedOffset> { (now - d).into() };

        assert!(is_due(taken(Duration::days(1)), 1, now));
        assert!(!is_due(taken(Duration::hours(23)), 1, now));
        assert!(is_due(taken(Duration::days(3)), 2, now));
        assert!(!is_due(taken(Duration::days(6)), 7, now));
    }

    #[test]
    fn test_zero_frequency_is_always_due() {
        let now = Utc::now();
        assert!(is_due(now.into(), 0, now));
    }

    fn member(user_id: &str) -> company_member::Model {
        company_member::Model {
            id: format!("m-{user_id}"),
            company_id: "c1".to_string(),
            user_id: user_id.to_string(),
            role: CompanyRole::Member,
            joined_at: Utc::now().into(),
        }
    }

    fn result(user_id: &str, taken: DateTime<FixedOffset>) -> quiz_result::Model {
        quiz_result::Model {
            id: format!("r-{user_id}"),
            quiz_id: "q1".to_string(),
            user_id: Some(user_id.to_string()),
            correct_questions: 1,
            total_questions: 2,
            timestamp: taken,
        }
    }

    #[tokio::test]
    async fn test_failed_reminder_does_not_stop_sweep() {
        let now = Utc::now();
        let week_ago: DateTime<FixedOffset> = (now - Duration::days(7)).into();

        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[quiz::Model {
                    id: "q1".to_string(),
                    company_id: "c1".to_string(),
                    title: "Basics".to_string(),
                    description: None,
                    frequency: 1,
                    created_at: week_ago,
                    updated_at: None,
                }]])
                .append_query_results([[result("alice", week_ago), result("bob", week_ago)]])
                .append_query_results([[member("alice"), member("bob")]])
                .append_query_errors([DbErr::Custom("connection reset".to_string())])
                .append_query_results([[notification::Model {
                    id: "n1".to_string(),
                    user_id: "bob".to_string(),
                    notification_type: NotificationType::QuizReminder,
                    quiz_id: Some("q1".to_string()),
                    text: "Pass the quiz again: Basics".to_string(),
                    status: NotificationStatus::Pending,
                    created_at: now.into(),
                    updated_at: None,
                }]])
                .into_connection(),
        );

        let reminders = ReminderService::new(
            CompanyRepository::new(db.clone()),
            QuizRepository::new(db.clone()),
            QuizResultRepository::new(db.clone()),
            NotificationService::new(NotificationRepository::new(db)),
        );

        let sent = reminders.notify_due_users(now).await.unwrap();
        assert_eq!(sent, 1);
    }
}
