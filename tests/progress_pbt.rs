use chrono::{Duration, Utc};
use proptest::prelude::*;

use languagekids_backend::catalog::AchievementCatalog;
use languagekids_backend::progress::achievements::check_achievements;
use languagekids_backend::progress::model::{EarnedBadge, UserProgress};
use languagekids_backend::progress::recorder::{complete_module, record_quiz_score};
use languagekids_backend::progress::streak::update_streak;

proptest! {
    /// Attempts count every submission and the stored score is the maximum
    /// ever submitted for that quiz id.
    #[test]
    fn quiz_history_tracks_best_score(scores in prop::collection::vec(0u32..=10, 1..20)) {
        let now = Utc::now();
        let mut progress = UserProgress::new("u1", now);

        for &score in &scores {
            record_quiz_score(&mut progress, "q1", "m1", score, 10, now).unwrap();
        }

        let stored = progress.quiz_score("q1").unwrap();
        prop_assert_eq!(stored.attempts as usize, scores.len());
        prop_assert_eq!(stored.score, *scores.iter().max().unwrap());
    }

    /// Total points equal the sum of per-attempt awards, independent of
    /// attempt order.
    #[test]
    fn quiz_points_accumulate_per_attempt(scores in prop::collection::vec(0u32..=10, 1..20)) {
        let now = Utc::now();
        let mut progress = UserProgress::new("u1", now);

        for &score in &scores {
            record_quiz_score(&mut progress, "q1", "m1", score, 10, now).unwrap();
        }

        let expected: u32 = scores.iter().copied().sum();
        prop_assert_eq!(progress.total_points, expected);
    }

    /// longestStreak >= currentStreak holds after every evaluation, for any
    /// pattern of activity gaps.
    #[test]
    fn longest_streak_dominates_current(gaps in prop::collection::vec(0i64..=4, 1..40)) {
        let mut now = Utc::now();
        let mut progress = UserProgress::new("u1", now);

        for gap in gaps {
            now += Duration::days(gap);
            update_streak(&mut progress, now);
            prop_assert!(progress.longest_streak >= progress.current_streak);
            prop_assert_eq!(progress.last_active_date, now);
        }
    }

    /// Completing the same module any number of times is equivalent to
    /// completing it once.
    #[test]
    fn module_completion_is_idempotent(repeats in 1usize..10) {
        let mut progress = UserProgress::new("u1", Utc::now());

        for _ in 0..repeats {
            complete_module(&mut progress, "m1");
        }

        prop_assert_eq!(progress.completed_modules.len(), 1);
        prop_assert_eq!(progress.total_points, 20);
    }

    /// Once an achievement's reward badge is owned, the evaluator never
    /// returns that achievement again, whatever the rest of the state.
    #[test]
    fn evaluator_never_repeats_awarded_achievements(
        modules in 0usize..60,
        streak in 0u32..10,
    ) {
        let catalog = AchievementCatalog::default();
        let mut progress = UserProgress::new("u1", Utc::now());
        for i in 0..modules {
            progress.completed_modules.push(format!("m{i}"));
        }
        progress.current_streak = streak;
        progress.longest_streak = streak;

        let first_pass: Vec<String> = check_achievements(&catalog, &progress)
            .iter()
            .map(|a| a.id.clone())
            .collect();

        let now = Utc::now();
        for achievement in check_achievements(&catalog, &progress) {
            if let Some(badge_id) = achievement.reward.badge_id.clone() {
                progress.badges.push(EarnedBadge { id: badge_id, earned_at: now });
            }
        }

        let second_pass = check_achievements(&catalog, &progress);
        for earned in second_pass {
            prop_assert!(!first_pass.contains(&earned.id));
        }
    }
}
