use std::collections::HashMap;
use std::str::FromStr;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::{Row, SqlitePool};
use thiserror::Error;

use crate::progress::model::{EarnedBadge, QuizScore, UserProgress};

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Sqlx(#[from] sqlx::Error),
    #[error("corrupt record for user {user_id}: {detail}")]
    Corrupt { user_id: String, detail: String },
}

/// Persistence for per-user progress records, plus the per-user
/// serialization point: all mutating callers take `user_lock` first so two
/// simultaneous submissions for the same user cannot interleave their
/// read-modify-write cycles.
pub struct ProgressStore {
    pool: SqlitePool,
    locks: parking_lot::Mutex<HashMap<String, Arc<tokio::sync::Mutex<()>>>>,
}

impl ProgressStore {
    pub async fn connect(url: &str) -> Result<Self, StoreError> {
        let options = SqliteConnectOptions::from_str(url)?.create_if_missing(true);

        // An in-memory database exists per connection, so it must be pinned
        // to a single pooled connection.
        let max_connections = if url.contains(":memory:") { 1 } else { 5 };

        let pool = SqlitePoolOptions::new()
            .max_connections(max_connections)
            .connect_with(options)
            .await?;

        let store = Self {
            pool,
            locks: parking_lot::Mutex::new(HashMap::new()),
        };
        store.init_schema().await?;
        Ok(store)
    }

    pub async fn in_memory() -> Result<Self, StoreError> {
        Self::connect("sqlite::memory:").await
    }

    pub fn user_lock(&self, user_id: &str) -> Arc<tokio::sync::Mutex<()>> {
        let mut locks = self.locks.lock();
        Arc::clone(
            locks
                .entry(user_id.to_string())
                .or_insert_with(|| Arc::new(tokio::sync::Mutex::new(()))),
        )
    }

    pub async fn ping(&self) -> Result<(), StoreError> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }

    async fn init_schema(&self) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS user_progress (
                user_id          TEXT PRIMARY KEY,
                current_streak   INTEGER NOT NULL,
                longest_streak   INTEGER NOT NULL,
                total_points     INTEGER NOT NULL,
                last_active_date TEXT NOT NULL,
                start_date       TEXT NOT NULL
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS completed_modules (
                user_id   TEXT NOT NULL,
                module_id TEXT NOT NULL,
                position  INTEGER NOT NULL,
                PRIMARY KEY (user_id, module_id)
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS quiz_scores (
                user_id      TEXT NOT NULL,
                quiz_id      TEXT NOT NULL,
                module_id    TEXT NOT NULL,
                score        INTEGER NOT NULL,
                max_score    INTEGER NOT NULL,
                completed_at TEXT NOT NULL,
                attempts     INTEGER NOT NULL,
                position     INTEGER NOT NULL,
                PRIMARY KEY (user_id, quiz_id)
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS user_badges (
                user_id   TEXT NOT NULL,
                badge_id  TEXT NOT NULL,
                earned_at TEXT NOT NULL,
                position  INTEGER NOT NULL,
                PRIMARY KEY (user_id, badge_id)
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    pub async fn load(&self, user_id: &str) -> Result<Option<UserProgress>, StoreError> {
        let row = sqlx::query(
            r#"SELECT current_streak, longest_streak, total_points,
                      last_active_date, start_date
               FROM user_progress WHERE user_id = ?"#,
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;

        let Some(row) = row else { return Ok(None) };

        let last_active_date = parse_timestamp(user_id, row.try_get("last_active_date")?)?;
        let start_date = parse_timestamp(user_id, row.try_get("start_date")?)?;

        let mut progress = UserProgress {
            user_id: user_id.to_string(),
            completed_modules: Vec::new(),
            quiz_scores: Vec::new(),
            badges: Vec::new(),
            current_streak: row.try_get::<i64, _>("current_streak")? as u32,
            longest_streak: row.try_get::<i64, _>("longest_streak")? as u32,
            total_points: row.try_get::<i64, _>("total_points")? as u32,
            last_active_date,
            start_date,
        };

        let modules = sqlx::query(
            r#"SELECT module_id FROM completed_modules
               WHERE user_id = ? ORDER BY position"#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;
        for row in modules {
            progress.completed_modules.push(row.try_get("module_id")?);
        }

        let quizzes = sqlx::query(
            r#"SELECT quiz_id, module_id, score, max_score, completed_at, attempts
               FROM quiz_scores WHERE user_id = ? ORDER BY position"#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;
        for row in quizzes {
            progress.quiz_scores.push(QuizScore {
                quiz_id: row.try_get("quiz_id")?,
                module_id: row.try_get("module_id")?,
                score: row.try_get::<i64, _>("score")? as u32,
                max_score: row.try_get::<i64, _>("max_score")? as u32,
                completed_at: parse_timestamp(user_id, row.try_get("completed_at")?)?,
                attempts: row.try_get::<i64, _>("attempts")? as u32,
            });
        }

        let badges = sqlx::query(
            r#"SELECT badge_id, earned_at FROM user_badges
               WHERE user_id = ? ORDER BY position"#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;
        for row in badges {
            progress.badges.push(EarnedBadge {
                id: row.try_get("badge_id")?,
                earned_at: parse_timestamp(user_id, row.try_get("earned_at")?)?,
            });
        }

        Ok(Some(progress))
    }

    /// Writes the whole record in one transaction; child rows are replaced
    /// so list order survives the round trip.
    pub async fn save(&self, progress: &UserProgress) -> Result<(), StoreError> {
        let mut tx = self.pool.begin().await?;

        sqlx::query(
            r#"INSERT INTO user_progress
                   (user_id, current_streak, longest_streak, total_points,
                    last_active_date, start_date)
               VALUES (?, ?, ?, ?, ?, ?)
               ON CONFLICT (user_id) DO UPDATE SET
                   current_streak = excluded.current_streak,
                   longest_streak = excluded.longest_streak,
                   total_points = excluded.total_points,
                   last_active_date = excluded.last_active_date,
                   start_date = excluded.start_date"#,
        )
        .bind(&progress.user_id)
        .bind(progress.current_streak as i64)
        .bind(progress.longest_streak as i64)
        .bind(progress.total_points as i64)
        .bind(progress.last_active_date.to_rfc3339())
        .bind(progress.start_date.to_rfc3339())
        .execute(&mut *tx)
        .await?;

        sqlx::query("DELETE FROM completed_modules WHERE user_id = ?")
            .bind(&progress.user_id)
            .execute(&mut *tx)
            .await?;
        for (position, module_id) in progress.completed_modules.iter().enumerate() {
            sqlx::query(
                r#"INSERT INTO completed_modules (user_id, module_id, position)
                   VALUES (?, ?, ?)"#,
            )
            .bind(&progress.user_id)
            .bind(module_id)
            .bind(position as i64)
            .execute(&mut *tx)
            .await?;
        }

        sqlx::query("DELETE FROM quiz_scores WHERE user_id = ?")
            .bind(&progress.user_id)
            .execute(&mut *tx)
            .await?;
        for (position, quiz) in progress.quiz_scores.iter().enumerate() {
            sqlx::query(
                r#"INSERT INTO quiz_scores
                       (user_id, quiz_id, module_id, score, max_score,
                        completed_at, attempts, position)
                   VALUES (?, ?, ?, ?, ?, ?, ?, ?)"#,
            )
            .bind(&progress.user_id)
            .bind(&quiz.quiz_id)
            .bind(&quiz.module_id)
            .bind(quiz.score as i64)
            .bind(quiz.max_score as i64)
            .bind(quiz.completed_at.to_rfc3339())
            .bind(quiz.attempts as i64)
            .bind(position as i64)
            .execute(&mut *tx)
            .await?;
        }

        sqlx::query("DELETE FROM user_badges WHERE user_id = ?")
            .bind(&progress.user_id)
            .execute(&mut *tx)
            .await?;
        for (position, badge) in progress.badges.iter().enumerate() {
            sqlx::query(
                r#"INSERT INTO user_badges (user_id, badge_id, earned_at, position)
                   VALUES (?, ?, ?, ?)"#,
            )
            .bind(&progress.user_id)
            .bind(&badge.id)
            .bind(badge.earned_at.to_rfc3339())
            .bind(position as i64)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        Ok(())
    }
}

fn parse_timestamp(user_id: &str, raw: String) -> Result<DateTime<Utc>, StoreError> {
    DateTime::parse_from_rfc3339(&raw)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| StoreError::Corrupt {
            user_id: user_id.to_string(),
            detail: format!("bad timestamp {raw:?}: {e}"),
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn sample_progress() -> UserProgress {
        let now = Utc::now();
        let mut progress = UserProgress::new("u1", now - Duration::days(2));
        progress.completed_modules = vec!["m2".to_string(), "m1".to_string()];
        progress.quiz_scores.push(QuizScore {
            quiz_id: "q1".to_string(),
            module_id: "m1".to_string(),
            score: 8,
            max_score: 10,
            completed_at: now,
            attempts: 2,
        });
        progress.badges.push(EarnedBadge {
            id: "first-steps".to_string(),
            earned_at: now,
        });
        progress.current_streak = 3;
        progress.longest_streak = 5;
        progress.total_points = 48;
        progress
    }

    #[tokio::test]
    async fn load_of_unknown_user_is_none() {
        let store = ProgressStore::in_memory().await.unwrap();
        assert!(store.load("missing").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn save_and_load_round_trip_preserves_order() {
        let store = ProgressStore::in_memory().await.unwrap();
        let progress = sample_progress();
        store.save(&progress).await.unwrap();

        let loaded = store.load("u1").await.unwrap().unwrap();
        assert_eq!(loaded.completed_modules, progress.completed_modules);
        assert_eq!(loaded.quiz_scores.len(), 1);
        assert_eq!(loaded.quiz_scores[0].score, 8);
        assert_eq!(loaded.quiz_scores[0].attempts, 2);
        assert_eq!(loaded.badges[0].id, "first-steps");
        assert_eq!(loaded.current_streak, 3);
        assert_eq!(loaded.longest_streak, 5);
        assert_eq!(loaded.total_points, 48);
    }

    #[tokio::test]
    async fn save_is_an_upsert() {
        let store = ProgressStore::in_memory().await.unwrap();
        let mut progress = sample_progress();
        store.save(&progress).await.unwrap();

        progress.total_points = 100;
        progress.completed_modules.push("m3".to_string());
        store.save(&progress).await.unwrap();

        let loaded = store.load("u1").await.unwrap().unwrap();
        assert_eq!(loaded.total_points, 100);
        assert_eq!(loaded.completed_modules.len(), 3);
    }

    #[tokio::test]
    async fn file_backed_store_survives_reconnect() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("progress.db");
        let url = format!("sqlite://{}", path.display());

        {
            let store = ProgressStore::connect(&url).await.unwrap();
            store.save(&sample_progress()).await.unwrap();
        }

        let store = ProgressStore::connect(&url).await.unwrap();
        let loaded = store.load("u1").await.unwrap().unwrap();
        assert_eq!(loaded.total_points, 48);
    }

    #[tokio::test]
    async fn user_lock_is_shared_per_user() {
        let store = ProgressStore::in_memory().await.unwrap();
        let a = store.user_lock("u1");
        let b = store.user_lock("u1");
        let c = store.user_lock("u2");
        assert!(Arc::ptr_eq(&a, &b));
        assert!(!Arc::ptr_eq(&a, &c));
    }
}
