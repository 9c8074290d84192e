//! Score analytics.
//!
//! Scores are ratios of correctly answered questions to questions asked,
//! summed over a set of results. An empty set has no score at all, which
//! is different from a score of zero.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, FixedOffset};
use quizzes_common::{AppError, AppResult};
use quizzes_db::entities::{quiz, quiz_result};
use quizzes_db::repositories::{CompanyRepository, QuizRepository, QuizResultRepository};
use serde::Serialize;

/// Average score over `results`, or `None` when there is nothing to average.
#[must_use]
pub fn average_score(results: &[quiz_result::Model]) -> Option<f64> {
    let (correct, total) = results.iter().fold((0_i64, 0_i64), |(c, t), r| {
        (c + i64::from(r.correct_questions), t + i64::from(r.total_questions))
    });

    if total == 0 {
        return None;
    }

    #[allow(clippy::cast_precision_loss)]
    Some(correct as f64 / total as f64)
}

/// Cumulative score after one more result.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ScorePoint {
    pub score: f64,
    pub timestamp: DateTime<FixedOffset>,
}

#[derive(Debug, Clone, Copy)]
struct Attempt {
    correct: i64,
    total: i64,
    timestamp: DateTime<FixedOffset>,
}

/// Running score over results ordered by time.
///
/// Cloning the sequence is cheap and the clone iterates independently, so
/// the same dynamics can be walked any number of times.
#[derive(Debug, Clone)]
pub struct ScoreDynamics {
    attempts: Arc<[Attempt]>,
    next: usize,
    correct: i64,
    total: i64,
}

impl ScoreDynamics {
    /// A fresh iterator over the same results, starting from the first one.
    #[must_use]
    pub fn restart(&self) -> Self {
        Self {
            attempts: Arc::clone(&self.attempts),
            next: 0,
            correct: 0,
            total: 0,
        }
    }
}

impl Iterator for ScoreDynamics {
    type Item = ScorePoint;

    fn next(&mut self) -> Option<ScorePoint> {
        let attempt = self.attempts.get(self.next)?;
        self.next += 1;
        self.correct += attempt.correct;
        self.total += attempt.total;

        #[allow(clippy::cast_precision_loss)]
        let score = if self.total == 0 {
            0.0
        } else {
            self.correct as f64 / self.total as f64
        };

        Some(ScorePoint {
            score,
            timestamp: attempt.timestamp,
        })
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.attempts.len() - self.next;
        (remaining, Some(remaining))
    }
}

impl ExactSizeIterator for ScoreDynamics {}

/// Score dynamics of `results`, or `None` when there are none.
#[must_use]
pub fn score_dynamics(results: &[quiz_result::Model]) -> Option<ScoreDynamics> {
    if results.is_empty() {
        return None;
    }

    let mut ordered: Vec<&quiz_result::Model> = results.iter().collect();
    ordered.sort_by(|a, b| a.timestamp.cmp(&b.timestamp).then_with(|| a.id.cmp(&b.id)));

    let attempts = ordered
        .into_iter()
        .map(|r| Attempt {
            correct: i64::from(r.correct_questions),
            total: i64::from(r.total_questions),
            timestamp: r.timestamp,
        })
        .collect();

    Some(ScoreDynamics {
        attempts,
        next: 0,
        correct: 0,
        total: 0,
    })
}

/// Score dynamics of one quiz.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QuizScores {
    pub quiz_id: String,
    pub title: String,
    pub results: Option<Vec<ScorePoint>>,
}

/// Service answering score queries.
#[derive(Clone)]
pub struct AnalyticsService {
    result_repo: QuizResultRepository,
    quiz_repo: QuizRepository,
    company_repo: CompanyRepository,
}

impl AnalyticsService {
    /// Create a new analytics service.
    #[must_use]
    pub const fn new(
        result_repo: QuizResultRepository,
        quiz_repo: QuizRepository,
        company_repo: CompanyRepository,
    ) -> Self {
        Self {
            result_repo,
            quiz_repo,
            company_repo,
        }
    }

    /// Average score of a user over every quiz they took.
    pub async fn user_average(&self, user_id: &str) -> AppResult<Option<f64>> {
        let results = self.result_repo.find_by_user(user_id).await?;
        Ok(average_score(&results))
    }

    /// Average score of a member over the quizzes of one company.
    pub async fn company_user_average(
        &self,
        company_id: &str,
        user_id: &str,
    ) -> AppResult<Option<f64>> {
        self.company_repo.get_by_id(company_id).await?;

        if !self.company_repo.is_member(company_id, user_id).await? {
            return Err(AppError::NotAMember(user_id.to_string()));
        }

        let quiz_ids = self
            .quiz_repo
            .find_by_company(self.quiz_repo.db(), company_id)
            .await?
            .into_iter()
            .map(|q| q.id)
            .collect();

        let results = self
            .result_repo
            .find_by_user_in_quizzes(user_id, quiz_ids)
            .await?;

        Ok(average_score(&results))
    }

    /// Dynamics of a user for every quiz of the companies they belong to.
    pub async fn user_quiz_dynamics(&self, user_id: &str) -> AppResult<Vec<QuizScores>> {
        let company_ids = self.company_repo.find_company_ids_for_user(user_id).await?;
        let quizzes = self.quiz_repo.find_by_companies(company_ids).await?;
        let quiz_ids = quizzes.iter().map(|q| q.id.clone()).collect();

        let results = self
            .result_repo
            .find_by_user_in_quizzes(user_id, quiz_ids)
            .await?;

        Ok(per_quiz(quizzes, results))
    }

    /// Dynamics over every result in the system.
    pub async fn all_users_dynamics(&self) -> AppResult<Option<Vec<ScorePoint>>> {
        let results = self.result_repo.find_all().await?;
        Ok(score_dynamics(&results).map(Iterator::collect))
    }

    /// Dynamics of every quiz over all of its results.
    pub async fn quizzes_dynamics(&self) -> AppResult<Vec<QuizScores>> {
        let quizzes = self.quiz_repo.find_all().await?;
        let results = self.result_repo.find_all().await?;

        Ok(per_quiz(quizzes, results))
    }
}

fn per_quiz(quizzes: Vec<quiz::Model>, results: Vec<quiz_result::Model>) -> Vec<QuizScores> {
    let mut by_quiz: HashMap<String, Vec<quiz_result::Model>> = HashMap::new();
    for result in results {
        by_quiz.entry(result.quiz_id.clone()).or_default().push(result);
    }

    quizzes
        .into_iter()
        .map(|quiz| {
            let results = by_quiz
                .get(&quiz.id)
                .and_then(|r| score_dynamics(r))
                .map(Iterator::collect);

            QuizScores {
                quiz_id: quiz.id,
                title: quiz.title,
                results,
            }
        })
        .collect()
}
