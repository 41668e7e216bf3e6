// src/lib.rs
// Rigsmith - PC build configuration core
//
// Architecture:
// - Domain-centric: slots, verdicts and power math live in the domain
// - Event-driven: a build change reaches its dependents through the event bus
// - Explicit: every stale result is detected by generation, never raced
// - Catalog-agnostic: the core only knows the CatalogGateway trait
// - Application Layer: command boundary used by the binary

// ============================================================================
// FOUNDATION
// ============================================================================

pub mod config;
pub mod domain;
pub mod error;
pub mod events;
pub mod integrations;
pub mod services;

// ============================================================================
// APPLICATION LAYER
// ============================================================================

pub mod application;

// ============================================================================
// PUBLIC API - Domain
// ============================================================================

pub use domain::{
    // Build
    BuildConfiguration,
    BuildId,
    BuildPayload,
    BuildRecord,
    BuildSnapshot,
    // Compatibility
    CompatibilityReport,
    CompatibilityRule,
    CompatibilityVerdict,
    // Component
    Component,
    ComponentRef,
    // Pricing
    CurrencyConverter,
    // Generations
    Generation,
    GenerationCounter,
    PartCategory,
    // Power
    PowerBudget,
    PricedBuildSummary,
    PricedPart,
    PsuHeadroom,
    RuleVerdict,
    SavedBuildSummary,
    SlotChange,
    SlotIds,
};

// ============================================================================
// PUBLIC API - Error Types
// ============================================================================

pub use error::{AppError, AppResult, GatewayError, GatewayResult, SaveError};

// ============================================================================
// PUBLIC API - Events
// ============================================================================

pub use events::{
    create_event_bus, BuildConfigurationChanged, BuildDeleted, BuildLoaded, BuildSaveRejected,
    BuildSaved, CompatibilityReportUpdated, DomainEvent, EventBus, EventLogEntry,
    ServerPowerEstimated,
};

// ============================================================================
// PUBLIC API - Services
// ============================================================================

pub use services::{
    // Session
    BuilderSession,
    // Compatibility Engine
    CompatibilityEngine,
    CompatibilityJob,
    CompatibilityOutcome,
    // Part Selection Query
    ListingOutcome,
    ListingRequest,
    ListingState,
    PartSelectionQuery,
    // Power
    PowerBudgetService,
    QueryMode,
    // Save Gate
    SaveGate,
    SaveOutcome,
    SavedBuildsService,
    SessionSettings,
};

// ============================================================================
// PUBLIC API - Application Layer & Integrations
// ============================================================================

pub use application::AppState;
pub use application::{commands, dto};
pub use config::AppConfig;
pub use integrations::{CatalogGateway, HttpCatalogGateway, PagedListing};
