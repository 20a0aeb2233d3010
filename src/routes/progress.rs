use axum::extract::{Path, Query, State};
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};
use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

use crate::catalog::{Achievement, AchievementCatalog, Language, Reward};
use crate::progress::model::UserProgress;
use crate::response::{AppError, SuccessResponse};
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/:user_id", get(get_progress))
        .route("/:user_id/modules", post(complete_module))
        .route("/:user_id/quizzes", post(submit_quiz))
        .route("/:user_id/badges", get(get_badges))
        .route("/:user_id/achievements", get(get_achievement_status))
}

#[derive(Deserialize)]
struct LangQuery {
    lang: Option<String>,
}

impl LangQuery {
    fn language(&self) -> Language {
        self.lang
            .as_deref()
            .map(Language::parse)
            .unwrap_or(Language::En)
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ProgressDto {
    user_id: String,
    completed_modules: Vec<String>,
    quiz_scores: Vec<QuizScoreDto>,
    badges: Vec<EarnedBadgeDto>,
    current_streak: u32,
    longest_streak: u32,
    total_points: u32,
    last_active_date: String,
    start_date: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct QuizScoreDto {
    quiz_id: String,
    module_id: String,
    score: u32,
    max_score: u32,
    completed_at: String,
    attempts: u32,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct EarnedBadgeDto {
    id: String,
    name: String,
    description: String,
    icon: String,
    category: String,
    earned_at: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct EarnedAchievementDto {
    id: String,
    title: String,
    description: String,
    icon: String,
    reward: Reward,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ProgressUpdateDto {
    progress: ProgressDto,
    new_achievements: Vec<EarnedAchievementDto>,
    points_awarded: u32,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct BadgesDto {
    badges: Vec<EarnedBadgeDto>,
    count: usize,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct CompleteModuleBody {
    module_id: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct SubmitQuizBody {
    quiz_id: String,
    module_id: String,
    score: u32,
    max_score: u32,
}

async fn get_progress(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
    Query(lang): Query<LangQuery>,
) -> Result<impl IntoResponse, AppError> {
    let progress = state
        .progress()
        .get_progress(&user_id)
        .await?
        .ok_or_else(|| AppError::not_found(format!("no progress for user {user_id}")))?;

    Ok(Json(SuccessResponse::new(progress_dto(
        &progress,
        state.catalog().as_ref(),
        lang.language(),
    ))))
}

async fn complete_module(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
    Query(lang): Query<LangQuery>,
    Json(body): Json<CompleteModuleBody>,
) -> Result<impl IntoResponse, AppError> {
    if body.module_id.trim().is_empty() {
        return Err(AppError::validation("moduleId must not be empty"));
    }

    let update = state
        .progress()
        .complete_module(&user_id, &body.module_id)
        .await?;

    Ok(Json(SuccessResponse::new(update_dto(
        &update.progress,
        &update.new_achievements,
        update.points_awarded,
        state.catalog().as_ref(),
        lang.language(),
    ))))
}

async fn submit_quiz(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
    Query(lang): Query<LangQuery>,
    Json(body): Json<SubmitQuizBody>,
) -> Result<impl IntoResponse, AppError> {
    if body.quiz_id.trim().is_empty() || body.module_id.trim().is_empty() {
        return Err(AppError::validation("quizId and moduleId must not be empty"));
    }

    let update = state
        .progress()
        .record_quiz_score(
            &user_id,
            &body.quiz_id,
            &body.module_id,
            body.score,
            body.max_score,
        )
        .await?;

    Ok(Json(SuccessResponse::new(update_dto(
        &update.progress,
        &update.new_achievements,
        update.points_awarded,
        state.catalog().as_ref(),
        lang.language(),
    ))))
}

async fn get_badges(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
    Query(lang): Query<LangQuery>,
) -> Result<impl IntoResponse, AppError> {
    let progress = state
        .progress()
        .get_progress(&user_id)
        .await?
        .ok_or_else(|| AppError::not_found(format!("no progress for user {user_id}")))?;

    let badges = earned_badge_dtos(&progress, state.catalog().as_ref(), lang.language());
    Ok(Json(SuccessResponse::new(BadgesDto {
        count: badges.len(),
        badges,
    })))
}

async fn get_achievement_status(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
    Query(lang): Query<LangQuery>,
) -> Result<impl IntoResponse, AppError> {
    let progress = state.progress().get_progress(&user_id).await?;
    let snapshot =
        progress.unwrap_or_else(|| UserProgress::new(user_id.as_str(), Utc::now()));

    Ok(Json(SuccessResponse::new(
        super::achievements::status_for(state.catalog().as_ref(), &snapshot, lang.language()),
    )))
}

fn progress_dto(
    progress: &UserProgress,
    catalog: &AchievementCatalog,
    lang: Language,
) -> ProgressDto {
    ProgressDto {
        user_id: progress.user_id.clone(),
        completed_modules: progress.completed_modules.clone(),
        quiz_scores: progress
            .quiz_scores
            .iter()
            .map(|quiz| QuizScoreDto {
                quiz_id: quiz.quiz_id.clone(),
                module_id: quiz.module_id.clone(),
                score: quiz.score,
                max_score: quiz.max_score,
                completed_at: iso(quiz.completed_at),
                attempts: quiz.attempts,
            })
            .collect(),
        badges: earned_badge_dtos(progress, catalog, lang),
        current_streak: progress.current_streak,
        longest_streak: progress.longest_streak,
        total_points: progress.total_points,
        last_active_date: iso(progress.last_active_date),
        start_date: iso(progress.start_date),
    }
}

fn earned_badge_dtos(
    progress: &UserProgress,
    catalog: &AchievementCatalog,
    lang: Language,
) -> Vec<EarnedBadgeDto> {
    progress
        .badges
        .iter()
        .map(|earned| {
            let definition = catalog.badge(&earned.id);
            EarnedBadgeDto {
                id: earned.id.clone(),
                name: definition
                    .map(|d| d.name.get(lang).to_string())
                    .unwrap_or_default(),
                description: definition
                    .map(|d| d.description.get(lang).to_string())
                    .unwrap_or_default(),
                icon: definition.map(|d| d.icon.clone()).unwrap_or_default(),
                category: definition.map(|d| d.category.clone()).unwrap_or_default(),
                earned_at: iso(earned.earned_at),
            }
        })
        .collect()
}

fn update_dto(
    progress: &UserProgress,
    new_achievements: &[Achievement],
    points_awarded: u32,
    catalog: &AchievementCatalog,
    lang: Language,
) -> ProgressUpdateDto {
    ProgressUpdateDto {
        progress: progress_dto(progress, catalog, lang),
        new_achievements: new_achievements
            .iter()
            .map(|a| EarnedAchievementDto {
                id: a.id.clone(),
                title: a.title.get(lang).to_string(),
                description: a.description.get(lang).to_string(),
                icon: a.icon.clone(),
                reward: a.reward.clone(),
            })
            .collect(),
        points_awarded,
    }
}

fn iso(dt: DateTime<Utc>) -> String {
    dt.to_rfc3339_opts(SecondsFormat::Millis, true)
}
