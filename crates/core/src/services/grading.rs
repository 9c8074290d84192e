//! Grading service.
//!
//! A question counts as correct only when the submitted answer set is
//! exactly the set of correct answers. The total is the number of
//! questions in the quiz, so unanswered questions count as wrong.

use std::collections::{HashMap, HashSet};
use std::time::Duration;

use chrono::{DateTime, FixedOffset, Utc};
use quizzes_common::{AppError, AppResult, EphemeralCacheService, IdGenerator};
use quizzes_db::entities::quiz_result;
use quizzes_db::repositories::{CompanyRepository, QuizRepository, QuizResultRepository};
use sea_orm::Set;
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::{info, warn};

use super::access;
use super::event_publisher::{EventDispatcher, EventPublisherService, StreamEvent};

/// Answers chosen for one question.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmittedAnswer {
    pub question_id: String,
    #[serde(default)]
    pub answer_ids: Vec<String>,
}

/// Per-question outcome of a graded submission.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QuestionOutcome {
    pub question_id: String,
    pub answer_ids: Vec<String>,
    pub correct: bool,
}

/// A persisted result together with its breakdown.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GradedSubmission {
    pub result: quiz_result::Model,
    pub outcomes: Vec<QuestionOutcome>,
}

/// Key under which a graded submission is cached.
#[must_use]
pub fn result_cache_key(quiz_id: &str, user_id: &str, timestamp: &DateTime<FixedOffset>) -> String {
    format!("results:{quiz_id}:{user_id}:{}", timestamp.to_rfc3339())
}

/// Service for grading submissions and reading results.
#[derive(Clone)]
pub struct GradingService {
    quiz_repo: QuizRepository,
    result_repo: QuizResultRepository,
    company_repo: CompanyRepository,
    cache: Option<EphemeralCacheService>,
    result_ttl: Duration,
    events: EventDispatcher,
    id_gen: IdGenerator,
}

impl GradingService {
    /// Create a new grading service.
    #[must_use]
    pub const fn new(
        quiz_repo: QuizRepository,
        result_repo: QuizResultRepository,
        company_repo: CompanyRepository,
        result_ttl: Duration,
    ) -> Self {
        Self {
            quiz_repo,
            result_repo,
            company_repo,
            cache: None,
            result_ttl,
            events: EventDispatcher::disabled(),
            id_gen: IdGenerator::new(),
        }
    }

    /// Set the cache that receives a copy of every graded submission.
    pub fn set_cache(&mut self, cache: EphemeralCacheService) {
        self.cache = Some(cache);
    }

    /// Set the event publisher for real-time events.
    pub fn set_event_publisher(&mut self, publisher: EventPublisherService) {
        self.events = EventDispatcher::new(publisher);
    }

    /// Grade a submission and store the result.
    pub async fn grade_submission(
        &self,
        user_id: &str,
        quiz_id: &str,
        submitted: Vec<SubmittedAnswer>,
    ) -> AppResult<GradedSubmission> {
        let quiz = self.quiz_repo.get_by_id(quiz_id).await?;
        access::require_member(&self.company_repo, &quiz.company_id, user_id).await?;

        let db = self.quiz_repo.db();
        let questions = self.quiz_repo.find_questions(db, quiz_id).await?;
        let question_ids: Vec<String> = questions.iter().map(|q| q.id.clone()).collect();

        let mut correct_sets: HashMap<String, HashSet<String>> = question_ids
            .iter()
            .map(|id| (id.clone(), HashSet::new()))
            .collect();

        for answer in self.quiz_repo.find_answers(db, question_ids).await? {
            if answer.is_correct {
                correct_sets
                    .entry(answer.question_id)
                    .or_default()
                    .insert(answer.id);
            }
        }

        let mut seen = HashSet::new();
        let mut outcomes = Vec::with_capacity(submitted.len());

        for entry in submitted {
            let Some(expected) = correct_sets.get(&entry.question_id) else {
                return Err(AppError::QuestionNotFound(entry.question_id));
            };

            if !seen.insert(entry.question_id.clone()) {
                return Err(AppError::BadRequest(format!(
                    "Question {} was answered more than once",
                    entry.question_id
                )));
            }

            let chosen: HashSet<String> = entry.answer_ids.iter().cloned().collect();
            outcomes.push(QuestionOutcome {
                correct: chosen == *expected,
                question_id: entry.question_id,
                answer_ids: entry.answer_ids,
            });
        }

        let correct = outcomes.iter().filter(|o| o.correct).count();
        let correct_questions = i32::try_from(correct).unwrap_or(i32::MAX);
        let total_questions = i32::try_from(questions.len()).unwrap_or(i32::MAX);
        let timestamp: DateTime<FixedOffset> = Utc::now().into();

        let model = quiz_result::ActiveModel {
            id: Set(self.id_gen.generate()),
            quiz_id: Set(quiz_id.to_string()),
            user_id: Set(Some(user_id.to_string())),
            correct_questions: Set(correct_questions),
            total_questions: Set(total_questions),
            timestamp: Set(timestamp),
        };

        let result = self.result_repo.create(model).await?;

        info!(
            result_id = %result.id,
            quiz_id = %quiz_id,
            user_id = %user_id,
            correct_questions,
            total_questions,
            "Submission graded"
        );

        if let Some(cache) = &self.cache {
            let key = result_cache_key(quiz_id, user_id, &timestamp);
            let value = json!({
                "companyId": quiz.company_id,
                "quizId": quiz_id,
                "userId": user_id,
                "correctQuestions": correct_questions,
                "totalQuestions": total_questions,
                "answers": outcomes,
            });

            if let Err(e) = cache.set(&key, &value, self.result_ttl).await {
                warn!(error = %e, key = %key, "Failed to cache graded submission");
            }
        }

        self.events.dispatch(
            user_id,
            StreamEvent::QuizCompleted {
                result_id: result.id.clone(),
                quiz_id: quiz_id.to_string(),
                company_id: quiz.company_id,
                correct_questions,
                total_questions,
            },
        );

        Ok(GradedSubmission { result, outcomes })
    }

    /// When the user last submitted the quiz, if ever.
    pub async fn last_taken(
        &self,
        quiz_id: &str,
        user_id: &str,
    ) -> AppResult<Option<DateTime<FixedOffset>>> {
        Ok(self
            .result_repo
            .find_latest(quiz_id, user_id)
            .await?
            .map(|r| r.timestamp))
    }

    /// Results of a quiz. Members of the quiz's company only.
    pub async fn list_results(
        &self,
        viewer_id: &str,
        quiz_id: &str,
    ) -> AppResult<Vec<quiz_result::Model>> {
        let quiz = self.quiz_repo.get_by_id(quiz_id).await?;
        access::require_member(&self.company_repo, &quiz.company_id, viewer_id).await?;

        self.result_repo.find_by_quiz(quiz_id).await
    }
}
