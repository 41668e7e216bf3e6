// src/domain/mod.rs
//
// Domain Root - The Single Source of Truth for Domain API
//
// This file declares all domain modules and re-exports their public API.
// All other modules import from `crate::domain::*`

// ============================================================================
// MODULE DECLARATIONS
// ============================================================================

pub mod build;
pub mod compatibility;
pub mod component;
pub mod generation;
pub mod power_budget;
pub mod pricing;

// ============================================================================
// PUBLIC API RE-EXPORTS
// ============================================================================

// Component Domain
pub use component::{validate_component, Component, ComponentRef, PartCategory};

// Build Domain
pub use build::{
    validate_build_name, BuildConfiguration, BuildId, BuildPayload, BuildRecord, BuildSnapshot,
    PricedBuildSummary, PricedPart, SavedBuildSummary, SlotChange, SlotIds,
};

// Compatibility (Verdicts and Reports)
pub use compatibility::{
    default_rules, is_blocking, CompatibilityReport, CompatibilityRule, CompatibilityVerdict,
    RuleVerdict, CHECK_FAILED_MESSAGE,
};

// Power Budget (Derived Data)
pub use power_budget::{PowerBudget, PowerContribution, PsuHeadroom, DEFAULT_HEADROOM_PERCENT};

// Generations & Pricing
pub use generation::{Generation, GenerationCounter};
pub use pricing::CurrencyConverter;

// ============================================================================
// DOMAIN ERROR TYPES
// ============================================================================

use thiserror::Error;

/// Domain-level errors
/// These represent violations of business rules and invariants
#[derive(Debug, Error)]
pub enum DomainError {
    #[error("Invariant violation: {0}")]
    InvariantViolation(String),

    #[error("Unknown part category: {0}")]
    UnknownCategory(String),

    #[error("Invalid catalog record: {0}")]
    InvalidRecord(String),
}

/// Domain result type
pub type DomainResult<T> = Result<T, DomainError>;
