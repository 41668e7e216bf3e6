pub mod value_objects;

pub use value_objects::{
    default_rules, is_blocking, CompatibilityReport, CompatibilityRule, CompatibilityVerdict,
    RuleVerdict, BLOCKING_MARKERS, CHECK_FAILED_MESSAGE,
};
