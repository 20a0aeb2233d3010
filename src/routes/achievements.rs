use std::collections::BTreeMap;

use axum::extract::{Query, State};
use axum::response::IntoResponse;
use axum::routing::get;
use axum::{Json, Router};
use chrono::SecondsFormat;
use serde::{Deserialize, Serialize};

use crate::catalog::{AchievementCatalog, Language, Requirement, Reward};
use crate::progress::achievements::{requirement_met, requirement_percent};
use crate::progress::model::UserProgress;
use crate::response::SuccessResponse;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new().route("/", get(list_catalog))
}

#[derive(Deserialize)]
struct LangQuery {
    lang: Option<String>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct AchievementDto {
    id: String,
    title: String,
    description: String,
    icon: String,
    requirement: Requirement,
    reward: Reward,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct CatalogDto {
    achievements: Vec<AchievementDto>,
    count: usize,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AchievementStatusDto {
    id: String,
    title: String,
    description: String,
    icon: String,
    requirement: Requirement,
    reward: Reward,
    unlocked: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    unlocked_at: Option<String>,
    progress: u32,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AchievementStatusListDto {
    achievements: Vec<AchievementStatusDto>,
    grouped: BTreeMap<String, Vec<String>>,
    total_count: usize,
    unlocked_count: usize,
}

async fn list_catalog(
    State(state): State<AppState>,
    Query(query): Query<LangQuery>,
) -> impl IntoResponse {
    let lang = query
        .lang
        .as_deref()
        .map(Language::parse)
        .unwrap_or(Language::En);
    let catalog = state.catalog();

    let achievements: Vec<AchievementDto> = catalog
        .achievements()
        .iter()
        .map(|a| AchievementDto {
            id: a.id.clone(),
            title: a.title.get(lang).to_string(),
            description: a.description.get(lang).to_string(),
            icon: a.icon.clone(),
            requirement: a.requirement,
            reward: a.reward.clone(),
        })
        .collect();

    Json(SuccessResponse::new(CatalogDto {
        count: achievements.len(),
        achievements,
    }))
}

/// Full catalog annotated with the user's unlock state and percent progress
/// toward each requirement. An achievement counts as unlocked when its
/// reward badge is owned; badge-less achievements show satisfaction of the
/// requirement itself.
pub fn status_for(
    catalog: &AchievementCatalog,
    progress: &UserProgress,
    lang: Language,
) -> AchievementStatusListDto {
    let mut achievements = Vec::with_capacity(catalog.achievements().len());
    let mut grouped: BTreeMap<String, Vec<String>> = BTreeMap::new();

    for achievement in catalog.achievements() {
        let owned_at = achievement.reward.badge_id.as_deref().and_then(|badge_id| {
            progress
                .badges
                .iter()
                .find(|b| b.id == badge_id)
                .map(|b| b.earned_at)
        });
        let unlocked = match achievement.reward.badge_id {
            Some(_) => owned_at.is_some(),
            None => requirement_met(&achievement.requirement, progress),
        };
        let percent = if unlocked {
            100
        } else {
            requirement_percent(&achievement.requirement, progress)
        };

        if let Some(badge_id) = &achievement.reward.badge_id {
            if let Some(badge) = catalog.badge(badge_id) {
                grouped
                    .entry(badge.category.clone())
                    .or_default()
                    .push(achievement.id.clone());
            }
        }

        achievements.push(AchievementStatusDto {
            id: achievement.id.clone(),
            title: achievement.title.get(lang).to_string(),
            description: achievement.description.get(lang).to_string(),
            icon: achievement.icon.clone(),
            requirement: achievement.requirement,
            reward: achievement.reward.clone(),
            unlocked,
            unlocked_at: owned_at
                .map(|dt| dt.to_rfc3339_opts(SecondsFormat::Millis, true)),
            progress: percent,
        });
    }

    let unlocked_count = achievements.iter().filter(|a| a.unlocked).count();
    AchievementStatusListDto {
        total_count: achievements.len(),
        unlocked_count,
        grouped,
        achievements,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::progress::model::EarnedBadge;
    use chrono::Utc;

    #[test]
    fn status_marks_owned_badges_unlocked() {
        let catalog = AchievementCatalog::default();
        let mut progress = UserProgress::new("u1", Utc::now());
        progress.completed_modules.push("m1".to_string());
        progress.badges.push(EarnedBadge {
            id: "first-steps".to_string(),
            earned_at: Utc::now(),
        });

        let status = status_for(&catalog, &progress, Language::En);
        assert_eq!(status.unlocked_count, 1);

        let first = status
            .achievements
            .iter()
            .find(|a| a.id == "achievement-first-module")
            .unwrap();
        assert!(first.unlocked);
        assert_eq!(first.progress, 100);
        assert!(first.unlocked_at.is_some());
    }

    #[test]
    fn status_reports_partial_progress() {
        let catalog = AchievementCatalog::default();
        let mut progress = UserProgress::new("u1", Utc::now());
        for i in 0..5 {
            progress.completed_modules.push(format!("m{i}"));
        }

        let status = status_for(&catalog, &progress, Language::En);
        let ten_modules = status
            .achievements
            .iter()
            .find(|a| a.id == "achievement-10-modules")
            .unwrap();
        assert!(!ten_modules.unlocked);
        assert_eq!(ten_modules.progress, 50);
    }

    #[test]
    fn status_localizes_titles() {
        let catalog = AchievementCatalog::default();
        let progress = UserProgress::new("u1", Utc::now());

        let status = status_for(&catalog, &progress, Language::De);
        let first = status
            .achievements
            .iter()
            .find(|a| a.id == "achievement-first-module")
            .unwrap();
        assert_eq!(first.title, "Erste Schritte");
    }
}
