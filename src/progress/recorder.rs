use chrono::{DateTime, Utc};

use crate::progress::error::ProgressError;
use crate::progress::model::{QuizScore, UserProgress};

/// Points granted for finishing a module for the first time.
pub const MODULE_COMPLETION_POINTS: u32 = 20;

/// Marks a module completed. Idempotent: a module already in
/// `completed_modules` earns nothing and is not appended again.
///
/// Returns true when the module was newly completed.
pub fn complete_module(progress: &mut UserProgress, module_id: &str) -> bool {
    if progress.completed_modules.iter().any(|m| m == module_id) {
        return false;
    }
    progress.completed_modules.push(module_id.to_string());
    progress.total_points += MODULE_COMPLETION_POINTS;
    true
}

/// Merges one quiz submission into the user's history and converts the
/// result into points.
///
/// A retake of a known quiz keeps the best attempt: the stored score (and
/// its max score, taken from the same attempt) only moves up, while
/// `attempts` counts every submission. Points are awarded for the submitted
/// attempt regardless: `round(score / max_score * 100 / 10)`, i.e. 10 points
/// for a perfect quiz, scaled down to 0.
///
/// Fails with `InvalidArgument` before any mutation when `max_score` is zero
/// or `score > max_score`.
pub fn record_quiz_score(
    progress: &mut UserProgress,
    quiz_id: &str,
    module_id: &str,
    score: u32,
    max_score: u32,
    now: DateTime<Utc>,
) -> Result<u32, ProgressError> {
    if max_score == 0 {
        return Err(ProgressError::invalid("maxScore must be positive"));
    }
    if score > max_score {
        return Err(ProgressError::invalid(format!(
            "score {score} exceeds maxScore {max_score}"
        )));
    }

    match progress.quiz_scores.iter_mut().find(|s| s.quiz_id == quiz_id) {
        Some(existing) => {
            if score > existing.score {
                existing.score = score;
                existing.max_score = max_score;
            }
            existing.attempts += 1;
            existing.completed_at = now;
        }
        None => progress.quiz_scores.push(QuizScore {
            quiz_id: quiz_id.to_string(),
            module_id: module_id.to_string(),
            score,
            max_score,
            completed_at: now,
            attempts: 1,
        }),
    }

    let points = quiz_points(score, max_score);
    progress.total_points += points;
    Ok(points)
}

/// Adds flat points, e.g. an achievement reward.
pub fn award_points(progress: &mut UserProgress, points: u32) {
    progress.total_points += points;
}

// f64::round (half away from zero) is the fixed rounding primitive; inputs
// are non-negative so this matches round-half-up.
fn quiz_points(score: u32, max_score: u32) -> u32 {
    (score as f64 / max_score as f64 * 10.0).round() as u32
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_module_completion_awards_flat_points() {
        let mut progress = UserProgress::new("u1", Utc::now());
        assert!(complete_module(&mut progress, "m1"));
        assert_eq!(progress.total_points, 20);
        assert_eq!(progress.completed_modules, vec!["m1".to_string()]);
    }

    #[test]
    fn repeat_module_completion_is_a_no_op() {
        let mut progress = UserProgress::new("u1", Utc::now());
        assert!(complete_module(&mut progress, "m1"));
        assert!(!complete_module(&mut progress, "m1"));
        assert_eq!(progress.total_points, 20);
        assert_eq!(progress.completed_modules.len(), 1);
    }

    #[test]
    fn quiz_points_scale_with_score() {
        assert_eq!(quiz_points(10, 10), 10);
        assert_eq!(quiz_points(8, 10), 8);
        assert_eq!(quiz_points(5, 10), 5);
        assert_eq!(quiz_points(0, 10), 0);
        assert_eq!(quiz_points(1, 3), 3); // 3.33 rounds down
        assert_eq!(quiz_points(1, 4), 3); // 2.5 rounds away from zero
    }

    #[test]
    fn retake_keeps_best_score_and_counts_attempts() {
        let mut progress = UserProgress::new("u1", Utc::now());
        let now = Utc::now();
        let p1 = record_quiz_score(&mut progress, "q1", "m1", 8, 10, now).unwrap();
        assert_eq!(p1, 8);
        let p2 = record_quiz_score(&mut progress, "q1", "m1", 6, 10, now).unwrap();
        assert_eq!(p2, 6);

        let stored = progress.quiz_score("q1").unwrap();
        assert_eq!(stored.score, 8);
        assert_eq!(stored.attempts, 2);
        assert_eq!(progress.total_points, 14);
    }

    #[test]
    fn improved_retake_replaces_score_and_max_score_together() {
        let mut progress = UserProgress::new("u1", Utc::now());
        let now = Utc::now();
        record_quiz_score(&mut progress, "q1", "m1", 4, 10, now).unwrap();
        record_quiz_score(&mut progress, "q1", "m1", 9, 12, now).unwrap();

        let stored = progress.quiz_score("q1").unwrap();
        assert_eq!(stored.score, 9);
        assert_eq!(stored.max_score, 12);

        // Worse attempt with a different scale leaves the stored pair alone.
        record_quiz_score(&mut progress, "q1", "m1", 2, 5, now).unwrap();
        let stored = progress.quiz_score("q1").unwrap();
        assert_eq!(stored.score, 9);
        assert_eq!(stored.max_score, 12);
        assert_eq!(stored.attempts, 3);
    }

    #[test]
    fn invalid_scores_leave_progress_untouched() {
        let mut progress = UserProgress::new("u1", Utc::now());
        let now = Utc::now();

        let err = record_quiz_score(&mut progress, "q1", "m1", 5, 0, now);
        assert!(matches!(err, Err(ProgressError::InvalidArgument(_))));
        let err = record_quiz_score(&mut progress, "q1", "m1", 11, 10, now);
        assert!(matches!(err, Err(ProgressError::InvalidArgument(_))));

        assert!(progress.quiz_scores.is_empty());
        assert_eq!(progress.total_points, 0);
    }
}
