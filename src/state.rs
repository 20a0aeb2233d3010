use std::sync::Arc;
use std::time::{Instant, SystemTime};

use crate::catalog::AchievementCatalog;
use crate::services::progress::ProgressService;
use crate::store::ProgressStore;

#[derive(Clone)]
pub struct AppState {
    started_at: Instant,
    started_at_system: SystemTime,
    store: Arc<ProgressStore>,
    catalog: Arc<AchievementCatalog>,
    progress: ProgressService,
}

impl AppState {
    pub fn new(store: Arc<ProgressStore>, catalog: Arc<AchievementCatalog>) -> Self {
        let progress = ProgressService::new(Arc::clone(&store), Arc::clone(&catalog));
        Self {
            started_at: Instant::now(),
            started_at_system: SystemTime::now(),
            store,
            catalog,
            progress,
        }
    }

    pub fn uptime_seconds(&self) -> u64 {
        self.started_at.elapsed().as_secs()
    }

    pub fn started_at_system(&self) -> SystemTime {
        self.started_at_system
    }

    pub fn store(&self) -> Arc<ProgressStore> {
        Arc::clone(&self.store)
    }

    pub fn catalog(&self) -> Arc<AchievementCatalog> {
        Arc::clone(&self.catalog)
    }

    pub fn progress(&self) -> &ProgressService {
        &self.progress
    }
}
