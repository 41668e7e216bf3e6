// src/application/dto/mod.rs
//
// Data Transfer Objects
//
// CRITICAL PRINCIPLES:
// - DTOs are display-ready representations
// - Prices are shown in display currency, stored in base currency
// - DTOs are simple, serializable structs
// - Conversion FROM domain values only (never TO)

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::domain::{
    BuildId, BuildSnapshot, CompatibilityReport, Component, CurrencyConverter, PartCategory,
    PowerBudget, PricedBuildSummary, PricedPart, PsuHeadroom,
};
use crate::services::{ListingState, QueryMode, SaveOutcome};

// ============================================================================
// PART DTOs
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PartRowDto {
    pub id: i64,
    pub category: PartCategory,
    pub name: String,
    pub manufacturer: Option<String>,
    pub price: f64,
    pub display_price: String,
    pub attributes: Map<String, Value>,
}

impl PartRowDto {
    pub fn from_component(component: &Component, currency: &CurrencyConverter) -> Self {
        Self {
            id: component.id,
            category: component.category,
            name: component.name.clone(),
            manufacturer: component.manufacturer.clone(),
            price: component.price,
            display_price: currency.format(component.price),
            attributes: component.attributes.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnDto {
    pub key: String,
    pub header: String,
}

/// `core_count` → `Core Count`
pub fn format_header(key: &str) -> String {
    key.split('_')
        .filter(|word| !word.is_empty())
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect::<String>(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

/// Columns of a listing, taken from its first row
fn columns_of(items: &[Component]) -> Vec<ColumnDto> {
    let Some(first) = items.first() else {
        return Vec::new();
    };

    ["name", "manufacturer", "price"]
        .into_iter()
        .map(str::to_string)
        .chain(first.attributes.keys().cloned())
        .map(|key| ColumnDto {
            header: format_header(&key),
            key,
        })
        .collect()
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ListingDto {
    pub category: PartCategory,
    pub mode: Value,
    pub columns: Vec<ColumnDto>,
    pub items: Vec<PartRowDto>,
    pub error: Option<String>,
    pub loading: bool,
}

impl ListingDto {
    pub fn new(
        category: PartCategory,
        mode: &QueryMode,
        listing: &ListingState,
        currency: &CurrencyConverter,
    ) -> Self {
        Self {
            category,
            mode: serde_json::to_value(mode).unwrap_or(Value::Null),
            columns: columns_of(&listing.items),
            items: listing
                .items
                .iter()
                .map(|c| PartRowDto::from_component(c, currency))
                .collect(),
            error: listing.error.clone(),
            loading: listing.loading,
        }
    }
}

// ============================================================================
// BUILD SHEET DTOs
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SlotDto {
    pub category: PartCategory,
    pub label: String,
    pub part: Option<PartRowDto>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompatibilityLineDto {
    pub rule: String,
    pub label: String,
    pub message: String,
    pub blocking: bool,
    pub failed: bool,
    pub failure_detail: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PowerIndicatorDto {
    pub total_watts: u32,
    pub psu_watts: Option<u32>,
    pub status: String,
    pub label: String,
}

impl From<&PowerBudget> for PowerIndicatorDto {
    fn from(budget: &PowerBudget) -> Self {
        let status = match budget.headroom {
            PsuHeadroom::Neutral { .. } => "neutral",
            PsuHeadroom::Insufficient => "insufficient",
            PsuHeadroom::LowHeadroom => "low_headroom",
            PsuHeadroom::Good => "good",
        };
        Self {
            total_watts: budget.total_watts,
            psu_watts: budget.psu_watts,
            status: status.to_string(),
            label: budget.headroom.label(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BuildSheetDto {
    pub build_id: Option<BuildId>,
    pub name: String,
    pub generation: u64,
    pub slots: Vec<SlotDto>,
    pub compatibility: Vec<CompatibilityLineDto>,
    pub compatibility_pending: bool,
    pub power: PowerIndicatorDto,
    pub total_price: f64,
    pub total_price_display: String,
}

impl BuildSheetDto {
    pub fn new(
        snapshot: &BuildSnapshot,
        report: &CompatibilityReport,
        power: &PowerBudget,
        currency: &CurrencyConverter,
    ) -> Self {
        let slots = PartCategory::ALL
            .into_iter()
            .map(|category| SlotDto {
                category,
                label: category.label().to_string(),
                part: snapshot
                    .get(category)
                    .map(|c| PartRowDto::from_component(c, currency)),
            })
            .collect();

        let compatibility = report
            .iter()
            .map(|rv| CompatibilityLineDto {
                rule: rv.rule.key(),
                label: rv.rule.label.to_string(),
                message: rv.verdict.message.clone(),
                blocking: rv.verdict.blocking,
                failed: rv.verdict.failed,
                failure_detail: rv.verdict.failure_detail.clone(),
            })
            .collect();

        let total_price = snapshot.total_price();

        Self {
            build_id: snapshot.build_id,
            name: snapshot.name.clone(),
            generation: snapshot.generation.value(),
            slots,
            compatibility,
            compatibility_pending: report.pending,
            power: PowerIndicatorDto::from(power),
            total_price,
            total_price_display: currency.format(total_price),
        }
    }
}

// ============================================================================
// PERSISTENCE DTOs
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SavedPartPriceDto {
    pub category: PartCategory,
    pub name: String,
    /// `None` when no catalog part carries this name
    pub price_display: Option<String>,
}

impl SavedPartPriceDto {
    fn from_part(part: PricedPart, currency: &CurrencyConverter) -> Self {
        Self {
            category: part.category,
            price_display: part.price.map(|price| currency.format(price)),
            name: part.name,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SavedBuildDto {
    pub build_id: BuildId,
    pub build_name: String,
    pub total_power_estimate: Option<f64>,
    pub details: Map<String, Value>,
    pub part_prices: Vec<SavedPartPriceDto>,
    pub total_price_display: String,
}

impl SavedBuildDto {
    pub fn new(priced: PricedBuildSummary, currency: &CurrencyConverter) -> Self {
        let total_price_display = currency.format(priced.total_price());
        let summary = priced.summary;
        Self {
            build_id: summary.build_id,
            build_name: summary.build_name,
            total_power_estimate: summary.total_power_estimate,
            details: summary.details,
            part_prices: priced
                .parts
                .into_iter()
                .map(|part| SavedPartPriceDto::from_part(part, currency))
                .collect(),
            total_price_display,
        }
    }
}

/// Parts keyed by category name (`cpu`, `ram`, `ssds`, ...)
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SaveBuildDto {
    pub build_id: Option<BuildId>,
    pub build_name: String,
    pub parts: BTreeMap<String, i64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SaveResultDto {
    pub build_id: BuildId,
    pub created: bool,
    pub server_power_watts: f64,
    pub message: String,
}

impl From<SaveOutcome> for SaveResultDto {
    fn from(outcome: SaveOutcome) -> Self {
        Self {
            message: outcome.message(),
            build_id: outcome.build_id,
            created: outcome.created,
            server_power_watts: outcome.server_power_watts,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{BuildConfiguration, SavedBuildSummary, DEFAULT_HEADROOM_PERCENT};

    #[test]
    fn test_format_header() {
        assert_eq!(format_header("core_count"), "Core Count");
        assert_eq!(format_header("tdp_w"), "Tdp W");
        assert_eq!(format_header("socket"), "Socket");
    }

    #[test]
    fn test_build_sheet_lists_every_slot() {
        let mut config = BuildConfiguration::default();
        config.set_name("Gaming Rig");
        config.set_slot(
            Component::new(PartCategory::Cpu, 1, "Ryzen 5 5600X", 199.99)
                .with_attribute("tdp", 65),
        );
        let snapshot = config.snapshot();
        let power = PowerBudget::compute(&snapshot, DEFAULT_HEADROOM_PERCENT);
        let currency = CurrencyConverter::default();

        let sheet = BuildSheetDto::new(
            &snapshot,
            &CompatibilityReport::default(),
            &power,
            &currency,
        );

        assert_eq!(sheet.slots.len(), 8);
        assert_eq!(sheet.slots[0].label, "CPU");
        assert!(sheet.slots[1].part.is_none());
        assert_eq!(sheet.power.status, "neutral");
        assert_eq!(sheet.power.label, "Select a PSU");
        assert_eq!(sheet.total_price_display, currency.format(199.99));
    }

    #[test]
    fn test_listing_columns_follow_first_row() {
        let listing = ListingState {
            items: vec![Component::new(PartCategory::Cpu, 1, "cpu", 1.0)
                .with_attribute("core_count", 6)
                .with_attribute("socket", "AM4")],
            error: None,
            loading: false,
        };
        let mode = QueryMode::Browsing {
            page: 1,
            total_pages: 1,
        };

        let dto = ListingDto::new(
            PartCategory::Cpu,
            &mode,
            &listing,
            &CurrencyConverter::default(),
        );
        let headers: Vec<&str> = dto.columns.iter().map(|c| c.header.as_str()).collect();
        assert_eq!(headers, vec!["Name", "Manufacturer", "Price", "Core Count", "Socket"]);
    }

    #[test]
    fn test_saved_build_shows_part_prices_and_total() {
        let summary = SavedBuildSummary::from_catalog_row(serde_json::json!({
            "build_id": 6,
            "build_name": "Streaming",
            "cpu": "Ryzen 5 7600",
            "gpu": "Unlisted GPU"
        }))
        .unwrap();
        let priced = PricedBuildSummary {
            summary,
            parts: vec![
                PricedPart {
                    category: PartCategory::Cpu,
                    name: "Ryzen 5 7600".to_string(),
                    price: Some(200.0),
                },
                PricedPart {
                    category: PartCategory::Gpu,
                    name: "Unlisted GPU".to_string(),
                    price: None,
                },
            ],
        };
        let currency = CurrencyConverter::default();

        let dto = SavedBuildDto::new(priced, &currency);
        assert_eq!(dto.build_name, "Streaming");
        assert_eq!(dto.part_prices[0].price_display.as_deref(), Some("₹17740"));
        assert_eq!(dto.part_prices[1].price_display, None);
        assert_eq!(dto.total_price_display, "₹17740");
    }
}
