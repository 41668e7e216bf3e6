// src/domain/compatibility/value_objects.rs
//
// Compatibility value objects
//
// The external evaluator answers with human-readable text, not a status code.
// Whether a verdict blocks a save is decided by case-insensitive substring
// matching on that text. Keep the marker list exactly as it is.

use serde::{Deserialize, Serialize};

use crate::domain::build::BuildSnapshot;
use crate::domain::component::{ComponentRef, PartCategory};
use crate::domain::generation::Generation;

/// Substrings that make a verdict blocking, matched on the lowercased message
pub const BLOCKING_MARKERS: [&str; 3] = ["incompatible", "invalid", "requires"];

/// Message of the synthetic verdict stored when a lookup fails
pub const CHECK_FAILED_MESSAGE: &str = "Check failed";

/// True when `message` disqualifies a build from being saved
pub fn is_blocking(message: &str) -> bool {
    let lowered = message.to_lowercase();
    BLOCKING_MARKERS.iter().any(|marker| lowered.contains(marker))
}

/// A pairwise rule checked by the external evaluator
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct CompatibilityRule {
    pub left: PartCategory,
    pub right: PartCategory,
    pub label: &'static str,
}

impl CompatibilityRule {
    pub const fn new(left: PartCategory, right: PartCategory, label: &'static str) -> Self {
        Self { left, right, label }
    }

    /// Report key, e.g. `cpu×motherboard`
    pub fn key(&self) -> String {
        format!("{}×{}", self.left.key(), self.right.key())
    }

    /// Both referenced slots, when both are filled in `snapshot`
    pub fn inputs(&self, snapshot: &BuildSnapshot) -> Option<(ComponentRef, ComponentRef)> {
        Some((snapshot.reference(self.left)?, snapshot.reference(self.right)?))
    }
}

/// The base rule set, in evaluation order
pub fn default_rules() -> Vec<CompatibilityRule> {
    vec![
        CompatibilityRule::new(PartCategory::Cpu, PartCategory::Motherboard, "CPU ↔ Motherboard"),
        CompatibilityRule::new(PartCategory::Motherboard, PartCategory::Case, "Motherboard ↔ Case"),
        CompatibilityRule::new(PartCategory::Gpu, PartCategory::Psu, "GPU ↔ PSU Power"),
    ]
}

/// Outcome of one rule evaluation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompatibilityVerdict {
    /// Evaluator text, verbatim
    pub message: String,

    pub blocking: bool,

    /// Set when the lookup itself failed; holds the transport detail if any
    pub failure_detail: Option<String>,

    pub failed: bool,
}

impl CompatibilityVerdict {
    pub fn from_message(message: impl Into<String>) -> Self {
        let message = message.into();
        Self {
            blocking: is_blocking(&message),
            message,
            failure_detail: None,
            failed: false,
        }
    }

    pub fn check_failed(detail: Option<String>) -> Self {
        Self {
            message: CHECK_FAILED_MESSAGE.to_string(),
            blocking: is_blocking(CHECK_FAILED_MESSAGE),
            failure_detail: detail,
            failed: true,
        }
    }
}

/// A rule together with its latest verdict
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RuleVerdict {
    pub rule: CompatibilityRule,
    pub verdict: CompatibilityVerdict,
}

/// Verdicts for one snapshot, in rule-evaluation order
///
/// A report is built from scratch for each snapshot. While its lookups are
/// in flight it is `pending` and holds no verdicts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CompatibilityReport {
    pub generation: Generation,
    pub pending: bool,
    verdicts: Vec<RuleVerdict>,
}

impl CompatibilityReport {
    pub fn pending(generation: Generation) -> Self {
        Self {
            generation,
            pending: true,
            verdicts: Vec::new(),
        }
    }

    pub fn completed(generation: Generation, verdicts: Vec<RuleVerdict>) -> Self {
        Self {
            generation,
            pending: false,
            verdicts,
        }
    }

    pub fn get(&self, rule_key: &str) -> Option<&CompatibilityVerdict> {
        self.verdicts
            .iter()
            .find(|rv| rv.rule.key() == rule_key)
            .map(|rv| &rv.verdict)
    }

    pub fn contains_key(&self, rule_key: &str) -> bool {
        self.get(rule_key).is_some()
    }

    pub fn keys(&self) -> Vec<String> {
        self.verdicts.iter().map(|rv| rv.rule.key()).collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = &RuleVerdict> {
        self.verdicts.iter()
    }

    pub fn len(&self) -> usize {
        self.verdicts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.verdicts.is_empty()
    }

    /// First blocking verdict in rule-evaluation order
    pub fn first_blocking(&self) -> Option<&RuleVerdict> {
        self.verdicts.iter().find(|rv| rv.verdict.blocking)
    }

    pub fn has_blocking(&self) -> bool {
        self.first_blocking().is_some()
    }
}

impl Default for CompatibilityReport {
    fn default() -> Self {
        Self::completed(Generation::ZERO, Vec::new())
    }
}
