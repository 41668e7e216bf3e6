// src/domain/power_budget.rs
//
// Client-side power estimate
//
// Pure function of a build snapshot. No I/O: the authoritative figure is
// computed server-side after a save, this one only drives the indicator
// shown while editing.

use serde::{Deserialize, Serialize};

use crate::domain::build::BuildSnapshot;
use crate::domain::component::PartCategory;

/// Default headroom: a PSU should be rated for 120% of the estimated draw
pub const DEFAULT_HEADROOM_PERCENT: u32 = 120;

/// Attribute holding a PSU's rated wattage
pub const PSU_RATING_KEY: &str = "watt";

/// Slots that draw power, with their wattage keys in priority order
const POWER_SOURCES: [(PartCategory, &[&str]); 2] = [
    (PartCategory::Cpu, &["tdp", "power", "max_power"]),
    (PartCategory::Gpu, &["tdp_w", "power_draw", "tdp", "power"]),
];

/// PSU rating against estimated draw
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum PsuHeadroom {
    /// No PSU rating to compare against, or nothing draws power yet
    Neutral { psu_watts: Option<u32> },
    Insufficient,
    LowHeadroom,
    Good,
}

impl PsuHeadroom {
    /// Classify a PSU rating against `total_watts`
    ///
    /// Exact integer comparison: low headroom when
    /// `psu * 100 < total * headroom_percent`.
    pub fn classify(total_watts: u32, psu_watts: Option<u32>, headroom_percent: u32) -> Self {
        let Some(psu) = psu_watts else {
            return PsuHeadroom::Neutral { psu_watts: None };
        };
        if total_watts == 0 {
            return PsuHeadroom::Neutral {
                psu_watts: Some(psu),
            };
        }
        if psu < total_watts {
            return PsuHeadroom::Insufficient;
        }
        if u64::from(psu) * 100 < u64::from(total_watts) * u64::from(headroom_percent) {
            return PsuHeadroom::LowHeadroom;
        }
        PsuHeadroom::Good
    }

    /// Indicator text
    pub fn label(&self) -> String {
        match self {
            PsuHeadroom::Neutral { psu_watts: None } => "Select a PSU".to_string(),
            PsuHeadroom::Neutral {
                psu_watts: Some(watts),
            } => format!("{}W", watts),
            PsuHeadroom::Insufficient => "INSUFFICIENT".to_string(),
            PsuHeadroom::LowHeadroom => "LOW HEADROOM".to_string(),
            PsuHeadroom::Good => "GOOD".to_string(),
        }
    }
}

/// One slot's share of the estimate
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PowerContribution {
    pub category: PartCategory,
    /// Attribute the wattage was read from, if any
    pub source_key: Option<&'static str>,
    pub watts: f64,
}

/// Estimated draw of a build
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PowerBudget {
    pub total_watts: u32,
    pub psu_watts: Option<u32>,
    pub headroom: PsuHeadroom,
    pub contributions: Vec<PowerContribution>,
}

impl PowerBudget {
    pub fn compute(snapshot: &BuildSnapshot, headroom_percent: u32) -> Self {
        let contributions: Vec<PowerContribution> = POWER_SOURCES
            .iter()
            .map(|(category, keys)| {
                let found = snapshot
                    .get(*category)
                    .and_then(|component| component.first_numeric_attribute(keys));
                PowerContribution {
                    category: *category,
                    source_key: found.map(|(key, _)| key),
                    watts: found.map(|(_, watts)| watts).unwrap_or(0.0),
                }
            })
            .collect();

        let total: f64 = contributions.iter().map(|c| c.watts).sum();
        let total_watts = total.max(0.0).round() as u32;

        let psu_watts = snapshot
            .get(PartCategory::Psu)
            .and_then(|psu| psu.numeric_attribute(PSU_RATING_KEY))
            .filter(|watts| *watts > 0.0)
            .map(|watts| watts.round() as u32);

        Self {
            total_watts,
            psu_watts,
            headroom: PsuHeadroom::classify(total_watts, psu_watts, headroom_percent),
            contributions,
        }
    }
}

impl Default for PowerBudget {
    fn default() -> Self {
        Self {
            total_watts: 0,
            psu_watts: None,
            headroom: PsuHeadroom::Neutral { psu_watts: None },
            contributions: Vec::new(),
        }
    }
}
