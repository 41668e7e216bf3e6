// src/events/types.rs
//
// All events published during a build-editing session.
// Each event represents an immutable fact that has already occurred.
//
// CRITICAL RULES:
// - Events are facts, not commands
// - Events are immutable
// - Events carry only the data needed to react
// - No business logic in event types

use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use crate::domain::{BuildId, BuildSnapshot, Generation, PartCategory, SlotChange};

/// Trait that all domain events must implement
pub trait DomainEvent: std::fmt::Debug + Clone {
    /// Unique identifier for this event instance
    fn event_id(&self) -> Uuid;

    /// When this event occurred
    fn occurred_at(&self) -> DateTime<Utc>;

    /// Human-readable event type name
    fn event_type(&self) -> &'static str;
}

macro_rules! domain_event {
    ($name:ident) => {
        impl DomainEvent for $name {
            fn event_id(&self) -> Uuid {
                self.event_id
            }
            fn occurred_at(&self) -> DateTime<Utc> {
                self.occurred_at
            }
            fn event_type(&self) -> &'static str {
                stringify!($name)
            }
        }
    };
}

// ============================================================================
// BUILD CONFIGURATION EVENTS
// ============================================================================

/// Emitted after every slot mutation, carrying the new snapshot
///
/// Subscribers run synchronously inside `emit`, so every derived value is
/// recomputed before the mutating call returns.
#[derive(Debug, Clone)]
pub struct BuildConfigurationChanged {
    pub event_id: Uuid,
    pub occurred_at: DateTime<Utc>,
    pub snapshot: BuildSnapshot,
    pub change: SlotChange,
}

impl BuildConfigurationChanged {
    pub fn new(snapshot: BuildSnapshot, change: SlotChange) -> Self {
        Self {
            event_id: Uuid::new_v4(),
            occurred_at: Utc::now(),
            snapshot,
            change,
        }
    }
}

domain_event!(BuildConfigurationChanged);

/// Emitted when a persisted build replaced the session's configuration
#[derive(Debug, Clone, Serialize)]
pub struct BuildLoaded {
    pub event_id: Uuid,
    pub occurred_at: DateTime<Utc>,
    pub build_id: BuildId,
    pub parts_loaded: usize,
    pub parts_missing: Vec<PartCategory>,
}

impl BuildLoaded {
    pub fn new(build_id: BuildId, parts_loaded: usize, parts_missing: Vec<PartCategory>) -> Self {
        Self {
            event_id: Uuid::new_v4(),
            occurred_at: Utc::now(),
            build_id,
            parts_loaded,
            parts_missing,
        }
    }
}

domain_event!(BuildLoaded);

// ============================================================================
// COMPATIBILITY EVENTS
// ============================================================================

/// Emitted when a completed report became the current one
#[derive(Debug, Clone, Serialize)]
pub struct CompatibilityReportUpdated {
    pub event_id: Uuid,
    pub occurred_at: DateTime<Utc>,
    pub generation: Generation,
    pub verdict_count: usize,
    pub blocking_rules: Vec<String>,
}

impl CompatibilityReportUpdated {
    pub fn new(generation: Generation, verdict_count: usize, blocking_rules: Vec<String>) -> Self {
        Self {
            event_id: Uuid::new_v4(),
            occurred_at: Utc::now(),
            generation,
            verdict_count,
            blocking_rules,
        }
    }
}

domain_event!(CompatibilityReportUpdated);

// ============================================================================
// PERSISTENCE EVENTS
// ============================================================================

/// Emitted after a successful create or update
#[derive(Debug, Clone, Serialize)]
pub struct BuildSaved {
    pub event_id: Uuid,
    pub occurred_at: DateTime<Utc>,
    pub build_id: BuildId,
    pub build_name: String,
    pub created: bool,
}

impl BuildSaved {
    pub fn new(build_id: BuildId, build_name: String, created: bool) -> Self {
        Self {
            event_id: Uuid::new_v4(),
            occurred_at: Utc::now(),
            build_id,
            build_name,
            created,
        }
    }
}

domain_event!(BuildSaved);

/// Emitted when a save was refused before reaching the catalog
#[derive(Debug, Clone, Serialize)]
pub struct BuildSaveRejected {
    pub event_id: Uuid,
    pub occurred_at: DateTime<Utc>,
    pub reason: String,
}

impl BuildSaveRejected {
    pub fn new(reason: String) -> Self {
        Self {
            event_id: Uuid::new_v4(),
            occurred_at: Utc::now(),
            reason,
        }
    }
}

domain_event!(BuildSaveRejected);

/// Emitted when the catalog recomputed a persisted build's power draw
#[derive(Debug, Clone, Serialize)]
pub struct ServerPowerEstimated {
    pub event_id: Uuid,
    pub occurred_at: DateTime<Utc>,
    pub build_id: BuildId,
    pub watts: f64,
}

impl ServerPowerEstimated {
    pub fn new(build_id: BuildId, watts: f64) -> Self {
        Self {
            event_id: Uuid::new_v4(),
            occurred_at: Utc::now(),
            build_id,
            watts,
        }
    }
}

domain_event!(ServerPowerEstimated);

/// Emitted after a persisted build was deleted
#[derive(Debug, Clone, Serialize)]
pub struct BuildDeleted {
    pub event_id: Uuid,
    pub occurred_at: DateTime<Utc>,
    pub build_id: BuildId,
}

impl BuildDeleted {
    pub fn new(build_id: BuildId) -> Self {
        Self {
            event_id: Uuid::new_v4(),
            occurred_at: Utc::now(),
            build_id,
        }
    }
}

domain_event!(BuildDeleted);
