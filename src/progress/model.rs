use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One quiz's standing for a user. `score` is the best result across all
/// attempts and never decreases; `attempts` counts every submission.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuizScore {
    pub quiz_id: String,
    pub module_id: String,
    pub score: u32,
    pub max_score: u32,
    pub completed_at: DateTime<Utc>,
    pub attempts: u32,
}

/// A badge the user has earned. Display fields (name, icon) live in the
/// catalog and are resolved by id.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EarnedBadge {
    pub id: String,
    pub earned_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProgress {
    pub user_id: String,
    pub completed_modules: Vec<String>,
    pub quiz_scores: Vec<QuizScore>,
    pub badges: Vec<EarnedBadge>,
    pub current_streak: u32,
    pub longest_streak: u32,
    pub total_points: u32,
    pub last_active_date: DateTime<Utc>,
    pub start_date: DateTime<Utc>,
}

impl UserProgress {
    pub fn new(user_id: impl Into<String>, now: DateTime<Utc>) -> Self {
        Self {
            user_id: user_id.into(),
            completed_modules: Vec::new(),
            quiz_scores: Vec::new(),
            badges: Vec::new(),
            current_streak: 0,
            longest_streak: 0,
            total_points: 0,
            last_active_date: now,
            start_date: now,
        }
    }

    pub fn has_badge(&self, badge_id: &str) -> bool {
        self.badges.iter().any(|b| b.id == badge_id)
    }

    pub fn quiz_score(&self, quiz_id: &str) -> Option<&QuizScore> {
        self.quiz_scores.iter().find(|s| s.quiz_id == quiz_id)
    }

    pub fn perfect_score_count(&self) -> usize {
        self.quiz_scores
            .iter()
            .filter(|s| s.score == s.max_score)
            .count()
    }
}
