pub mod entity;
pub mod invariants;

pub use entity::{
    BuildConfiguration, BuildId, BuildPayload, BuildRecord, BuildSnapshot, PricedBuildSummary,
    PricedPart, SavedBuildSummary, SlotChange, SlotIds,
};
pub use invariants::validate_build_name;
