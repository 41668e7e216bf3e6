// src/services/builder_session.rs
//
// Builder Session - one build being edited
//
// ARCHITECTURE:
// - Owns the BuildConfiguration (single writer, &mut self)
// - Publishes BuildConfigurationChanged after every slot mutation
// - Compatibility engine and power budget react through the bus
// - Saving waits for the report of the current snapshot

use std::collections::BTreeMap;
use std::sync::Arc;

use log::{info, warn};
use tokio::task::JoinSet;

use crate::config::AppConfig;
use crate::domain::{
    BuildConfiguration, BuildId, BuildSnapshot, CompatibilityReport, Component, CurrencyConverter,
    GenerationCounter, PartCategory, PowerBudget, SlotChange, DEFAULT_HEADROOM_PERCENT,
};
use crate::error::{AppResult, SaveError};
use crate::events::{BuildConfigurationChanged, BuildLoaded, EventBus};
use crate::integrations::CatalogGateway;
use crate::services::compatibility_engine::CompatibilityEngine;
use crate::services::part_selection::PartSelectionQuery;
use crate::services::power_budget_service::PowerBudgetService;
use crate::services::save_gate::{SaveGate, SaveOutcome};

#[derive(Debug, Clone, PartialEq)]
pub struct SessionSettings {
    pub page_size: u32,
    pub currency: CurrencyConverter,
    pub default_max_price: f64,
    pub headroom_percent: u32,
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self {
            page_size: 10,
            currency: CurrencyConverter::default(),
            default_max_price: 999_999.0,
            headroom_percent: DEFAULT_HEADROOM_PERCENT,
        }
    }
}

impl From<&AppConfig> for SessionSettings {
    fn from(config: &AppConfig) -> Self {
        Self {
            page_size: config.chooser.page_size,
            currency: config.currency(),
            default_max_price: config.chooser.default_max_price,
            headroom_percent: config.power.headroom_percent,
        }
    }
}

pub struct BuilderSession {
    config: BuildConfiguration,
    generations: Arc<GenerationCounter>,
    gateway: Arc<dyn CatalogGateway>,
    event_bus: Arc<EventBus>,
    engine: CompatibilityEngine,
    power: PowerBudgetService,
    save_gate: SaveGate,
    settings: SessionSettings,
}

impl BuilderSession {
    /// Start an empty build
    ///
    /// The session subscribes its engine and power budget to `event_bus`;
    /// use one bus per session.
    pub fn new(
        gateway: Arc<dyn CatalogGateway>,
        event_bus: Arc<EventBus>,
        settings: SessionSettings,
    ) -> Self {
        let generations = Arc::new(GenerationCounter::new());

        let engine = CompatibilityEngine::new(Arc::clone(&gateway), Arc::clone(&event_bus));
        engine.register_event_handlers();

        let power = PowerBudgetService::new(Arc::clone(&event_bus), settings.headroom_percent);
        power.register_event_handlers();

        let save_gate = SaveGate::new(Arc::clone(&gateway), Arc::clone(&event_bus));

        let session = Self {
            config: BuildConfiguration::new(Arc::clone(&generations)),
            generations,
            gateway,
            event_bus,
            engine,
            power,
            save_gate,
            settings,
        };
        session.publish(SlotChange::Replaced);
        session
    }

    fn publish(&self, change: SlotChange) {
        self.event_bus
            .emit(BuildConfigurationChanged::new(self.config.snapshot(), change));
    }

    // ========================================================================
    // BUILD CONFIGURATION
    // ========================================================================

    /// Put `component` in its category's slot
    ///
    /// Returns false when the slot already held it; nothing is recomputed then.
    pub fn set_slot(&mut self, component: Component) -> bool {
        let change = SlotChange::Assigned {
            category: component.category,
            component_id: component.id,
        };
        if !self.config.set_slot(component) {
            return false;
        }
        self.publish(change);
        true
    }

    pub fn clear_slot(&mut self, category: PartCategory) -> Option<Component> {
        let removed = self.config.clear_slot(category)?;
        self.publish(SlotChange::Cleared { category });
        Some(removed)
    }

    pub fn set_name(&mut self, name: impl Into<String>) {
        self.config.set_name(name);
    }

    pub fn name(&self) -> &str {
        self.config.name()
    }

    pub fn build_id(&self) -> Option<BuildId> {
        self.config.build_id()
    }

    pub fn snapshot(&self) -> BuildSnapshot {
        self.config.snapshot()
    }

    pub fn total_price(&self) -> f64 {
        self.config.total_price()
    }

    pub fn settings(&self) -> &SessionSettings {
        &self.settings
    }

    /// Discard the current build and start an empty one
    pub fn new_build(&mut self) {
        self.config = BuildConfiguration::new(Arc::clone(&self.generations));
        self.publish(SlotChange::Replaced);
    }

    /// Replace the build with a persisted one
    ///
    /// Parts are fetched concurrently. Those that fail to load are logged and
    /// left empty; their categories are returned in build-sheet order. If the build record itself cannot be fetched the current
    /// configuration is kept.
    pub async fn load_build(&mut self, build_id: BuildId) -> AppResult<Vec<PartCategory>> {
        let record = self.gateway.get_build(build_id).await?;

        let mut fetches = JoinSet::new();
        for (&category, &part_id) in &record.part_ids {
            let gateway = Arc::clone(&self.gateway);
            fetches.spawn(async move {
                let result = gateway.get_one(category, part_id).await;
                (category, part_id, result)
            });
        }

        let mut loaded = BTreeMap::new();
        while let Some(joined) = fetches.join_next().await {
            match joined {
                Ok((category, _, Ok(component))) => {
                    loaded.insert(category, component);
                }
                Ok((category, part_id, Err(e))) => {
                    warn!("Failed to fetch {} {}: {}", category, part_id, e);
                }
                Err(e) => warn!("Part fetch task aborted: {}", e),
            }
        }

        // Build-sheet order regardless of completion order
        let missing: Vec<PartCategory> = record
            .part_ids
            .keys()
            .filter(|category| !loaded.contains_key(*category))
            .copied()
            .collect();
        let components: Vec<Component> = loaded.into_values().collect();

        let parts_loaded = components.len();
        self.config = BuildConfiguration::restored(
            Arc::clone(&self.generations),
            record.build_id,
            record.build_name,
            components,
        );
        self.publish(SlotChange::Replaced);

        info!(
            "Loaded build {} ({} parts, {} missing)",
            build_id,
            parts_loaded,
            missing.len()
        );
        self.event_bus
            .emit(BuildLoaded::new(build_id, parts_loaded, missing.clone()));
        Ok(missing)
    }

    // ========================================================================
    // DERIVED STATE
    // ========================================================================

    /// Current report, possibly pending
    pub fn report(&self) -> CompatibilityReport {
        self.engine.report()
    }

    /// Report of the current snapshot once all its lookups are in
    pub async fn settled_report(&self) -> CompatibilityReport {
        let snapshot = self.config.snapshot();
        if self.engine.latest_generation() != snapshot.generation {
            self.engine.trigger(&snapshot);
        }
        self.engine.settled().await
    }

    pub fn power(&self) -> PowerBudget {
        self.power.current()
    }

    pub fn engine(&self) -> &CompatibilityEngine {
        &self.engine
    }

    // ========================================================================
    // PERSISTENCE
    // ========================================================================

    /// Save through the gate, recording the id the catalog assigned
    pub async fn save(&mut self) -> Result<SaveOutcome, SaveError> {
        let snapshot = self.config.snapshot();
        let report = self.settled_report().await;

        let result = self.save_gate.save(&snapshot, &report).await;
        match &result {
            Ok(outcome) => self.config.set_build_id(outcome.build_id),
            Err(SaveError::PowerEstimate { build_id, .. }) => self.config.set_build_id(*build_id),
            Err(_) => {}
        }
        result
    }

    // ========================================================================
    // PART CHOOSER
    // ========================================================================

    pub fn open_part_chooser(&self, category: PartCategory) -> PartSelectionQuery {
        PartSelectionQuery::new(
            category,
            self.settings.page_size,
            self.settings.currency.clone(),
            self.settings.default_max_price,
        )
    }

    pub fn gateway(&self) -> &dyn CatalogGateway {
        self.gateway.as_ref()
    }
}
