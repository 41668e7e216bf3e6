// src/services/mod.rs
//
// Services Module - Orchestration Layer

pub mod builder_session;
pub mod compatibility_engine;
pub mod part_selection;
pub mod power_budget_service;
pub mod save_gate;
pub mod saved_builds_service;

// Re-export all services and their types
pub use builder_session::{BuilderSession, SessionSettings};

pub use compatibility_engine::{CompatibilityEngine, CompatibilityJob, CompatibilityOutcome};

pub use part_selection::{
    ListingOutcome, ListingRequest, ListingState, PartSelectionQuery, QueryMode,
    COMPATIBLE_LOAD_FAILED, COMPATIBLE_PSU_LOAD_FAILED, LOAD_FAILED, SEARCH_FAILED,
};

pub use power_budget_service::PowerBudgetService;

pub use save_gate::{SaveGate, SaveOutcome};

pub use saved_builds_service::SavedBuildsService;
