//! Application state for the HTTP server.

use std::sync::Arc;

use crate::db::repository::FullRepository;
use crate::db::RecalculationSettings;
use crate::services::TimelineGuards;

/// Shared application state passed to all handlers.
#[derive(Clone)]
pub struct AppState {
    pub repository: Arc<dyn FullRepository>,
    /// Serializes recalculation runs per timeline
    pub guards: TimelineGuards,
    pub settings: RecalculationSettings,
}

impl AppState {
    /// State with default recalculation settings.
    pub fn new(repository: Arc<dyn FullRepository>) -> Self {
        Self::with_settings(repository, RecalculationSettings::default())
    }

    pub fn with_settings(repository: Arc<dyn FullRepository>, settings: RecalculationSettings) -> Self {
        Self {
            repository,
            guards: TimelineGuards::new(),
            settings,
        }
    }
}
