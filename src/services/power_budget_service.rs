// src/services/power_budget_service.rs
use std::sync::{Arc, PoisonError, RwLock};

use log::debug;

use crate::domain::{BuildSnapshot, PowerBudget};
use crate::events::{BuildConfigurationChanged, EventBus};

/// Keeps the advisory power estimate of the current build
///
/// Recomputed synchronously inside the bus handler, never over the network.
pub struct PowerBudgetService {
    headroom_percent: u32,
    budget: Arc<RwLock<PowerBudget>>,
    event_bus: Arc<EventBus>,
}

impl PowerBudgetService {
    pub fn new(event_bus: Arc<EventBus>, headroom_percent: u32) -> Self {
        Self {
            headroom_percent,
            budget: Arc::new(RwLock::new(PowerBudget::default())),
            event_bus,
        }
    }

    pub fn current(&self) -> PowerBudget {
        self.budget
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn recompute(&self, snapshot: &BuildSnapshot) -> PowerBudget {
        let budget = PowerBudget::compute(snapshot, self.headroom_percent);
        *self.budget.write().unwrap_or_else(PoisonError::into_inner) = budget.clone();
        budget
    }

    pub fn register_event_handlers(&self) {
        let budget = Arc::clone(&self.budget);
        let headroom_percent = self.headroom_percent;

        self.event_bus
            .subscribe::<BuildConfigurationChanged, _>(move |event| {
                let next = PowerBudget::compute(&event.snapshot, headroom_percent);
                debug!(
                    "Power budget {} -> {}W ({})",
                    event.snapshot.generation,
                    next.total_watts,
                    next.headroom.label()
                );
                *budget.write().unwrap_or_else(PoisonError::into_inner) = next;
            });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{
        BuildConfiguration, Component, PartCategory, PsuHeadroom, SlotChange,
        DEFAULT_HEADROOM_PERCENT,
    };

    #[test]
    fn test_budget_follows_change_events() {
        let event_bus = Arc::new(EventBus::new());
        let service = PowerBudgetService::new(Arc::clone(&event_bus), DEFAULT_HEADROOM_PERCENT);
        service.register_event_handlers();

        let mut config = BuildConfiguration::default();
        config.set_slot(Component::new(PartCategory::Gpu, 2, "gpu", 1.0).with_attribute("tdp_w", 250));
        config.set_slot(Component::new(PartCategory::Psu, 3, "psu", 1.0).with_attribute("watt", 280));

        event_bus.emit(BuildConfigurationChanged::new(config.snapshot(), SlotChange::Replaced));

        let budget = service.current();
        assert_eq!(budget.total_watts, 250);
        assert_eq!(budget.headroom, PsuHeadroom::LowHeadroom);
    }

    #[test]
    fn test_custom_headroom() {
        let service = PowerBudgetService::new(Arc::new(EventBus::new()), 150);

        let mut config = BuildConfiguration::default();
        config.set_slot(Component::new(PartCategory::Cpu, 1, "cpu", 1.0).with_attribute("tdp", 100));
        config.set_slot(Component::new(PartCategory::Psu, 3, "psu", 1.0).with_attribute("watt", 140));

        assert_eq!(service.recompute(&config.snapshot()).headroom, PsuHeadroom::LowHeadroom);
    }
}
