pub mod entity;
pub mod invariants;

pub use entity::{Component, ComponentRef, PartCategory};
pub use invariants::validate_component;
