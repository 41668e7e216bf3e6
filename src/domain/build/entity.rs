use std::collections::BTreeMap;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};

use crate::domain::component::{Component, ComponentRef, PartCategory};
use crate::domain::generation::{Generation, GenerationCounter};
use crate::domain::{DomainError, DomainResult};

/// Identifier of a persisted build
pub type BuildId = i64;

type SlotMap = BTreeMap<PartCategory, Component>;

/// The build being edited
///
/// Each category owns one slot holding zero or one component. Every slot
/// mutation stamps the configuration with a fresh generation so snapshots
/// taken before and after can be told apart.
#[derive(Debug)]
pub struct BuildConfiguration {
    name: String,
    build_id: Option<BuildId>,
    slots: Arc<SlotMap>,
    generation: Generation,
    generations: Arc<GenerationCounter>,
}

/// What a slot mutation did
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SlotChange {
    Assigned { category: PartCategory, component_id: i64 },
    Cleared { category: PartCategory },
    Replaced,
}

impl BuildConfiguration {
    /// Empty build drawing generations from `generations`
    ///
    /// Configurations that replace each other within one session must share a
    /// counter, otherwise a late result for an old build could carry the same
    /// token as the new build's first snapshot.
    pub fn new(generations: Arc<GenerationCounter>) -> Self {
        let generation = generations.next();
        Self {
            name: String::new(),
            build_id: None,
            slots: Arc::new(SlotMap::new()),
            generation,
            generations,
        }
    }

    /// Configuration rebuilt from a persisted build
    pub fn restored(
        generations: Arc<GenerationCounter>,
        build_id: BuildId,
        name: impl Into<String>,
        components: impl IntoIterator<Item = Component>,
    ) -> Self {
        let mut config = Self::new(generations);
        config.build_id = Some(build_id);
        config.name = name.into();
        let slots = Arc::make_mut(&mut config.slots);
        for component in components {
            slots.insert(component.category, component);
        }
        config
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn set_name(&mut self, name: impl Into<String>) {
        self.name = name.into();
    }

    pub fn build_id(&self) -> Option<BuildId> {
        self.build_id
    }

    pub fn set_build_id(&mut self, build_id: BuildId) {
        self.build_id = Some(build_id);
    }

    pub fn generation(&self) -> Generation {
        self.generation
    }

    pub fn slot(&self, category: PartCategory) -> Option<&Component> {
        self.slots.get(&category)
    }

    /// Put `component` in its category's slot, replacing any previous one
    ///
    /// Returns false when the slot already held an identical component; no
    /// new generation is issued in that case.
    pub fn set_slot(&mut self, component: Component) -> bool {
        if self.slots.get(&component.category) == Some(&component) {
            return false;
        }
        Arc::make_mut(&mut self.slots).insert(component.category, component);
        self.generation = self.generations.next();
        true
    }

    /// Empty a slot, returning what it held
    pub fn clear_slot(&mut self, category: PartCategory) -> Option<Component> {
        if !self.slots.contains_key(&category) {
            return None;
        }
        let removed = Arc::make_mut(&mut self.slots).remove(&category);
        self.generation = self.generations.next();
        removed
    }

    pub fn snapshot(&self) -> BuildSnapshot {
        BuildSnapshot {
            generation: self.generation,
            name: self.name.clone(),
            build_id: self.build_id,
            slots: Arc::clone(&self.slots),
        }
    }

    /// Sum of filled slot prices in the base currency
    pub fn total_price(&self) -> f64 {
        self.slots.values().map(|c| c.price).sum()
    }
}

impl Default for BuildConfiguration {
    fn default() -> Self {
        Self::new(Arc::new(GenerationCounter::new()))
    }
}

/// Immutable view of a BuildConfiguration at one generation
#[derive(Debug, Clone, PartialEq)]
pub struct BuildSnapshot {
    pub generation: Generation,
    pub name: String,
    pub build_id: Option<BuildId>,
    slots: Arc<SlotMap>,
}

impl BuildSnapshot {
    pub fn get(&self, category: PartCategory) -> Option<&Component> {
        self.slots.get(&category)
    }

    pub fn is_filled(&self, category: PartCategory) -> bool {
        self.slots.contains_key(&category)
    }

    pub fn reference(&self, category: PartCategory) -> Option<ComponentRef> {
        self.get(category).map(Component::reference)
    }

    /// Filled slots in build-sheet order
    pub fn components(&self) -> impl Iterator<Item = &Component> {
        self.slots.values()
    }

    pub fn filled_count(&self) -> usize {
        self.slots.len()
    }

    /// Ids of every filled slot except `excluded`
    pub fn slot_ids_except(&self, excluded: PartCategory) -> SlotIds {
        SlotIds(
            self.slots
                .iter()
                .filter(|(category, _)| **category != excluded)
                .map(|(category, component)| (*category, component.id))
                .collect(),
        )
    }

    pub fn total_price(&self) -> f64 {
        self.slots.values().map(|c| c.price).sum()
    }
}

/// Ids of a set of filled slots
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SlotIds(BTreeMap<PartCategory, i64>);

impl SlotIds {
    pub fn get(&self, category: PartCategory) -> Option<i64> {
        self.0.get(&category).copied()
    }

    pub fn contains(&self, category: PartCategory) -> bool {
        self.0.contains_key(&category)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Request body understood by the catalog's compatibility filter
    pub fn build_state(&self) -> Value {
        let id = |category| self.get(category).map(Value::from).unwrap_or(Value::Null);
        json!({
            "cpu_id": id(PartCategory::Cpu),
            "motherboard_id": id(PartCategory::Motherboard),
            "ram_id": id(PartCategory::Memory),
            "gpu_id": id(PartCategory::Gpu),
            "case_id": id(PartCategory::Case),
            "psu_id": id(PartCategory::Psu),
        })
    }
}

impl FromIterator<(PartCategory, i64)> for SlotIds {
    fn from_iter<T: IntoIterator<Item = (PartCategory, i64)>>(iter: T) -> Self {
        SlotIds(iter.into_iter().collect())
    }
}

/// Body of a create/update call: name plus one nullable id per category
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BuildPayload {
    pub build_name: String,
    pub cpu_id: Option<i64>,
    pub motherboard_id: Option<i64>,
    pub ram_id: Option<i64>,
    pub gpu_id: Option<i64>,
    pub case_id: Option<i64>,
    pub psu_id: Option<i64>,
    pub ssd_id: Option<i64>,
    pub display_id: Option<i64>,
}

impl BuildPayload {
    pub fn from_snapshot(snapshot: &BuildSnapshot) -> Self {
        let id = |category| snapshot.get(category).map(|c| c.id);
        Self {
            build_name: snapshot.name.clone(),
            cpu_id: id(PartCategory::Cpu),
            motherboard_id: id(PartCategory::Motherboard),
            ram_id: id(PartCategory::Memory),
            gpu_id: id(PartCategory::Gpu),
            case_id: id(PartCategory::Case),
            psu_id: id(PartCategory::Psu),
            ssd_id: id(PartCategory::Storage),
            display_id: id(PartCategory::Display),
        }
    }

    /// Id stored under `category`'s foreign key
    pub fn part_id(&self, category: PartCategory) -> Option<i64> {
        match category {
            PartCategory::Cpu => self.cpu_id,
            PartCategory::Motherboard => self.motherboard_id,
            PartCategory::Memory => self.ram_id,
            PartCategory::Gpu => self.gpu_id,
            PartCategory::Case => self.case_id,
            PartCategory::Psu => self.psu_id,
            PartCategory::Storage => self.ssd_id,
            PartCategory::Display => self.display_id,
        }
    }
}

/// A persisted build as stored by the catalog
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BuildRecord {
    pub build_id: BuildId,
    pub build_name: String,
    pub part_ids: BTreeMap<PartCategory, i64>,
}

impl BuildRecord {
    pub fn from_catalog_row(row: Value) -> DomainResult<Self> {
        let fields = match row {
            Value::Object(fields) => fields,
            other => {
                return Err(DomainError::InvalidRecord(format!(
                    "build row is not an object: {}",
                    other
                )))
            }
        };

        let build_id = fields
            .get("build_id")
            .and_then(Value::as_i64)
            .ok_or_else(|| DomainError::InvalidRecord("build row has no build_id".to_string()))?;

        let build_name = fields
            .get("build_name")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string();

        let part_ids = PartCategory::ALL
            .into_iter()
            .filter_map(|category| {
                fields
                    .get(category.foreign_key())
                    .and_then(Value::as_i64)
                    .map(|id| (category, id))
            })
            .collect();

        Ok(Self {
            build_id,
            build_name,
            part_ids,
        })
    }
}

/// One row of the saved builds overview
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SavedBuildSummary {
    pub build_id: BuildId,
    pub build_name: String,
    /// Server-side estimate, present once computed
    pub total_power_estimate: Option<f64>,
    /// Part names and any other columns the catalog reports
    pub details: Map<String, Value>,
}

impl SavedBuildSummary {
    pub fn from_catalog_row(row: Value) -> DomainResult<Self> {
        let mut fields = match row {
            Value::Object(fields) => fields,
            other => {
                return Err(DomainError::InvalidRecord(format!(
                    "build summary is not an object: {}",
                    other
                )))
            }
        };

        let build_id = fields
            .remove("build_id")
            .and_then(|v| v.as_i64())
            .ok_or_else(|| {
                DomainError::InvalidRecord("build summary has no build_id".to_string())
            })?;

        let build_name = match fields.remove("build_name") {
            Some(Value::String(s)) => s,
            _ => String::new(),
        };

        let total_power_estimate = fields.remove("total_power_estimate").and_then(|v| match v {
            Value::Number(n) => n.as_f64(),
            Value::String(s) => s.trim().parse().ok(),
            _ => None,
        });

        Ok(Self {
            build_id,
            build_name,
            total_power_estimate,
            details: fields,
        })
    }

    /// Part names reported for this build, in build-sheet order
    pub fn part_names(&self) -> Vec<(PartCategory, String)> {
        PartCategory::ALL
            .into_iter()
            .filter_map(|category| match self.details.get(category.summary_column()) {
                Some(Value::String(name)) if !name.is_empty() => Some((category, name.clone())),
                _ => None,
            })
            .collect()
    }
}

/// A part of a saved build with the catalog price found for its name
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PricedPart {
    pub category: PartCategory,
    pub name: String,
    /// Base currency; `None` when the catalog has no part of that name
    pub price: Option<f64>,
}

/// Saved build overview row with its part prices resolved
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PricedBuildSummary {
    pub summary: SavedBuildSummary,
    pub parts: Vec<PricedPart>,
}

impl PricedBuildSummary {
    /// Sum of the known part prices, base currency
    pub fn total_price(&self) -> f64 {
        self.parts.iter().filter_map(|part| part.price).sum()
    }
}
