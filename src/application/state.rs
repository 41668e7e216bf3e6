// src/application/state.rs

use std::sync::Arc;

use crate::config::AppConfig;
use crate::events::EventBus;
use crate::integrations::CatalogGateway;
use crate::services::{BuilderSession, SavedBuildsService, SessionSettings};

/// Application state shared by all commands.
/// All fields are Arc-wrapped for thread-safe sharing across commands.
/// Services are initialized in main.rs and passed here.
pub struct AppState {
    pub config: AppConfig,
    pub event_bus: Arc<EventBus>,
    pub gateway: Arc<dyn CatalogGateway>,
    pub saved_builds_service: Arc<SavedBuildsService>,
}

impl AppState {
    pub fn new(config: AppConfig, gateway: Arc<dyn CatalogGateway>, event_bus: Arc<EventBus>) -> Self {
        let saved_builds_service = Arc::new(SavedBuildsService::new(
            Arc::clone(&gateway),
            Arc::clone(&event_bus),
        ));

        Self {
            config,
            event_bus,
            gateway,
            saved_builds_service,
        }
    }

    /// A fresh editing session on its own bus
    pub fn new_session(&self) -> BuilderSession {
        BuilderSession::new(
            Arc::clone(&self.gateway),
            Arc::new(EventBus::new()),
            SessionSettings::from(&self.config),
        )
    }
}
