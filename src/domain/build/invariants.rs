use crate::domain::{DomainError, DomainResult};

/// A build cannot be persisted without a name
pub fn validate_build_name(name: &str) -> DomainResult<()> {
    if name.is_empty() {
        return Err(DomainError::InvariantViolation(
            "Build name cannot be empty".to_string(),
        ));
    }
    Ok(())
}

/// Invariants that must hold true for a build:
///
/// 1. A slot holds at most one component, of the slot's own category
/// 2. Slots are independent; any of them may be empty
/// 3. The persisted id is present only once the build has been saved
/// 4. A saved build always has a non-empty name
