pub mod catalog;
pub mod config;
pub mod logging;
pub mod progress;
pub mod response;
pub mod routes;
pub mod services;
pub mod state;
pub mod store;

use std::sync::Arc;

use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::catalog::AchievementCatalog;
use crate::config::Config;
use crate::state::AppState;
use crate::store::{ProgressStore, StoreError};

pub async fn create_app() -> Result<axum::Router, StoreError> {
    let config = Config::from_env();
    create_app_with(&config).await
}

pub async fn create_app_with(config: &Config) -> Result<axum::Router, StoreError> {
    let store = Arc::new(ProgressStore::connect(&config.database_url).await?);

    let catalog = match &config.catalog_path {
        Some(path) => match AchievementCatalog::from_json_file(path) {
            Ok(catalog) => catalog,
            Err(err) => {
                tracing::warn!(error = %err, path = %path, "failed to load catalog, using built-in");
                AchievementCatalog::default()
            }
        },
        None => AchievementCatalog::default(),
    };

    let state = AppState::new(store, Arc::new(catalog));

    Ok(routes::router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive()))
}
