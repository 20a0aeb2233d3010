use crate::catalog::{Achievement, AchievementCatalog, Requirement, RequirementType};
use crate::progress::model::UserProgress;

/// Scans the catalog and returns the achievements the user now qualifies
/// for, in catalog order. Achievements whose reward badge is already owned
/// are skipped, which is what makes repeated evaluation idempotent once the
/// caller has applied the rewards.
///
/// Pure: the caller appends reward badges and points itself.
pub fn check_achievements<'a>(
    catalog: &'a AchievementCatalog,
    progress: &UserProgress,
) -> Vec<&'a Achievement> {
    catalog
        .achievements()
        .iter()
        .filter(|achievement| {
            let already_earned = achievement
                .reward
                .badge_id
                .as_deref()
                .is_some_and(|badge_id| progress.has_badge(badge_id));
            !already_earned && requirement_met(&achievement.requirement, progress)
        })
        .collect()
}

pub fn requirement_met(requirement: &Requirement, progress: &UserProgress) -> bool {
    current_value(requirement.requirement_type, progress) >= requirement.count as u64
}

/// How far along the user is toward a requirement, for progress displays.
pub fn current_value(requirement_type: RequirementType, progress: &UserProgress) -> u64 {
    match requirement_type {
        RequirementType::Modules => progress.completed_modules.len() as u64,
        RequirementType::Streak => progress.current_streak as u64,
        RequirementType::Points => progress.total_points as u64,
        RequirementType::Quizzes => progress.quiz_scores.len() as u64,
        RequirementType::PerfectScores => progress.perfect_score_count() as u64,
    }
}

/// Percentage toward a requirement, capped at 100.
pub fn requirement_percent(requirement: &Requirement, progress: &UserProgress) -> u32 {
    if requirement.count == 0 {
        return 100;
    }
    let current = current_value(requirement.requirement_type, progress) as f64;
    ((current / requirement.count as f64) * 100.0).min(100.0).round() as u32
}
