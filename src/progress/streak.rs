use chrono::{DateTime, Utc};

use crate::progress::model::UserProgress;

/// Advances the consecutive-day streak from the gap between `now` and the
/// last recorded activity, measured in whole calendar days (UTC).
///
/// Exactly one day since the last activity continues the streak; a larger
/// gap resets it to 1; repeat activity on the same day leaves it untouched.
/// `last_active_date` is always moved to `now`.
pub fn update_streak(progress: &mut UserProgress, now: DateTime<Utc>) {
    let days = (now.date_naive() - progress.last_active_date.date_naive()).num_days();

    if days == 1 {
        progress.current_streak += 1;
        progress.longest_streak = progress.longest_streak.max(progress.current_streak);
    } else if days > 1 {
        progress.current_streak = 1;
        progress.longest_streak = progress.longest_streak.max(1);
    }

    progress.last_active_date = now;
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn user_active_days_ago(streak: u32, longest: u32, days: i64) -> (UserProgress, DateTime<Utc>) {
        let now = Utc::now();
        let mut progress = UserProgress::new("u1", now - Duration::days(days));
        progress.current_streak = streak;
        progress.longest_streak = longest;
        (progress, now)
    }

    #[test]
    fn next_day_activity_extends_streak() {
        let (mut progress, now) = user_active_days_ago(3, 5, 1);
        update_streak(&mut progress, now);
        assert_eq!(progress.current_streak, 4);
        assert_eq!(progress.longest_streak, 5);
        assert_eq!(progress.last_active_date, now);
    }

    #[test]
    fn extending_past_longest_raises_longest() {
        let (mut progress, now) = user_active_days_ago(5, 5, 1);
        update_streak(&mut progress, now);
        assert_eq!(progress.current_streak, 6);
        assert_eq!(progress.longest_streak, 6);
    }

    #[test]
    fn gap_of_three_days_resets_streak() {
        let (mut progress, now) = user_active_days_ago(5, 9, 3);
        update_streak(&mut progress, now);
        assert_eq!(progress.current_streak, 1);
        assert_eq!(progress.longest_streak, 9);
    }

    #[test]
    fn same_day_activity_is_a_no_op_for_counters() {
        let (mut progress, now) = user_active_days_ago(2, 4, 0);
        update_streak(&mut progress, now);
        assert_eq!(progress.current_streak, 2);
        assert_eq!(progress.longest_streak, 4);
        assert_eq!(progress.last_active_date, now);
    }

    #[test]
    fn longest_never_drops_below_current() {
        let mut now = Utc::now();
        let mut progress = UserProgress::new("u1", now);
        for _ in 0..30 {
            now += Duration::days(1);
            update_streak(&mut progress, now);
            assert!(progress.longest_streak >= progress.current_streak);
        }
        assert_eq!(progress.current_streak, 30);
        assert_eq!(progress.longest_streak, 30);
    }
}
