use std::sync::Arc;

use chrono::Utc;
use thiserror::Error;

use crate::catalog::{Achievement, AchievementCatalog};
use crate::progress::model::{EarnedBadge, UserProgress};
use crate::progress::{achievements, recorder, streak, ProgressError};
use crate::store::{ProgressStore, StoreError};

#[derive(Debug, Error)]
pub enum ProgressServiceError {
    #[error(transparent)]
    Invalid(#[from] ProgressError),
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Result of one learning event after the full pipeline has run.
#[derive(Debug, Clone)]
pub struct ProgressUpdate {
    pub progress: UserProgress,
    pub new_achievements: Vec<Achievement>,
    /// Points granted by this event, achievement rewards included.
    pub points_awarded: u32,
}

/// Drives the event pipeline: recorder, then streak evaluation, then the
/// achievement scan, then reward application, all under the user's lock and
/// persisted as one save. A validation failure returns before the save, so
/// the stored record is never partially mutated.
#[derive(Clone)]
pub struct ProgressService {
    store: Arc<ProgressStore>,
    catalog: Arc<AchievementCatalog>,
}

impl ProgressService {
    pub fn new(store: Arc<ProgressStore>, catalog: Arc<AchievementCatalog>) -> Self {
        Self { store, catalog }
    }

    pub fn catalog(&self) -> &AchievementCatalog {
        &self.catalog
    }

    pub async fn get_progress(
        &self,
        user_id: &str,
    ) -> Result<Option<UserProgress>, StoreError> {
        self.store.load(user_id).await
    }

    pub async fn complete_module(
        &self,
        user_id: &str,
        module_id: &str,
    ) -> Result<ProgressUpdate, ProgressServiceError> {
        let lock = self.store.user_lock(user_id);
        let _guard = lock.lock().await;

        let now = Utc::now();
        let mut progress = self.load_or_create(user_id).await?;
        let points_before = progress.total_points;

        let newly_completed = recorder::complete_module(&mut progress, module_id);
        if !newly_completed {
            tracing::debug!(user_id, module_id, "module already completed");
        }
        streak::update_streak(&mut progress, now);
        let new_achievements = self.apply_achievements(&mut progress);

        self.store.save(&progress).await?;

        if newly_completed {
            tracing::info!(
                user_id,
                module_id,
                total_points = progress.total_points,
                "module completed"
            );
        }

        Ok(ProgressUpdate {
            points_awarded: progress.total_points - points_before,
            new_achievements,
            progress,
        })
    }

    pub async fn record_quiz_score(
        &self,
        user_id: &str,
        quiz_id: &str,
        module_id: &str,
        score: u32,
        max_score: u32,
    ) -> Result<ProgressUpdate, ProgressServiceError> {
        let lock = self.store.user_lock(user_id);
        let _guard = lock.lock().await;

        let now = Utc::now();
        let mut progress = self.load_or_create(user_id).await?;
        let points_before = progress.total_points;

        let quiz_points =
            recorder::record_quiz_score(&mut progress, quiz_id, module_id, score, max_score, now)?;
        streak::update_streak(&mut progress, now);
        let new_achievements = self.apply_achievements(&mut progress);

        self.store.save(&progress).await?;

        tracing::info!(
            user_id,
            quiz_id,
            score,
            max_score,
            quiz_points,
            new_achievements = new_achievements.len(),
            "quiz recorded"
        );

        Ok(ProgressUpdate {
            points_awarded: progress.total_points - points_before,
            new_achievements,
            progress,
        })
    }

    async fn load_or_create(&self, user_id: &str) -> Result<UserProgress, StoreError> {
        match self.store.load(user_id).await? {
            Some(progress) => Ok(progress),
            None => Ok(UserProgress::new(user_id, Utc::now())),
        }
    }

    /// Applies reward points and badges for every newly qualified
    /// achievement. Evaluation re-runs after each application so a reward's
    /// points can themselves satisfy a points requirement in the same event.
    fn apply_achievements(&self, progress: &mut UserProgress) -> Vec<Achievement> {
        let mut earned: Vec<Achievement> = Vec::new();

        loop {
            let newly_qualified: Vec<Achievement> =
                achievements::check_achievements(&self.catalog, progress)
                    .into_iter()
                    .filter(|a| !earned.iter().any(|e| e.id == a.id))
                    .cloned()
                    .collect();

            if newly_qualified.is_empty() {
                break;
            }

            let now = Utc::now();
            for achievement in &newly_qualified {
                recorder::award_points(progress, achievement.reward.points);
                if let Some(badge_id) = &achievement.reward.badge_id {
                    if !progress.has_badge(badge_id) {
                        progress.badges.push(EarnedBadge {
                            id: badge_id.clone(),
                            earned_at: now,
                        });
                    }
                }
                tracing::info!(
                    user_id = %progress.user_id,
                    achievement = %achievement.id,
                    reward_points = achievement.reward.points,
                    "achievement earned"
                );
            }

            earned.extend(newly_qualified);
        }

        earned
    }
}
