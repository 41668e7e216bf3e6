use super::entity::Component;
use crate::domain::{DomainError, DomainResult};

/// Validates the invariants every catalogued component must satisfy
pub fn validate_component(component: &Component) -> DomainResult<()> {
    if component.id <= 0 {
        return Err(DomainError::InvariantViolation(format!(
            "{} id must be positive, got {}",
            component.category, component.id
        )));
    }
    if component.price < 0.0 || !component.price.is_finite() {
        return Err(DomainError::InvariantViolation(format!(
            "{} {} has invalid price {}",
            component.category, component.id, component.price
        )));
    }
    Ok(())
}

/// Invariants that hold for Component:
///
/// 1. Identity is (category, id); ids are positive
/// 2. Price is stored in the base currency and is never negative
/// 3. The attribute bag never contains id, name, manufacturer or price

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::component::PartCategory;

    #[test]
    fn test_valid_component() {
        let cpu = Component::new(PartCategory::Cpu, 1, "i5-13600K", 289.0);
        assert!(validate_component(&cpu).is_ok());
    }

    #[test]
    fn test_negative_price_fails() {
        let cpu = Component::new(PartCategory::Cpu, 1, "i5-13600K", -1.0);
        assert!(validate_component(&cpu).is_err());
    }

    #[test]
    fn test_zero_id_fails() {
        let cpu = Component::new(PartCategory::Cpu, 0, "i5-13600K", 10.0);
        assert!(validate_component(&cpu).is_err());
    }
}
