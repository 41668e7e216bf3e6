use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::invariants::validate_component;
use crate::domain::{DomainError, DomainResult};

/// Component catalog categories
/// Closed set; every category owns exactly one slot in a build
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PartCategory {
    Cpu,
    Motherboard,
    Memory,
    Gpu,
    Case,
    Psu,
    Storage,
    Display,
}

impl PartCategory {
    /// All categories in build-sheet order
    pub const ALL: [PartCategory; 8] = [
        PartCategory::Cpu,
        PartCategory::Motherboard,
        PartCategory::Memory,
        PartCategory::Gpu,
        PartCategory::Case,
        PartCategory::Psu,
        PartCategory::Storage,
        PartCategory::Display,
    ];

    /// Short key understood by the pairwise compatibility evaluator
    pub fn key(self) -> &'static str {
        match self {
            PartCategory::Cpu => "cpu",
            PartCategory::Motherboard => "motherboard",
            PartCategory::Memory => "ram",
            PartCategory::Gpu => "gpu",
            PartCategory::Case => "case",
            PartCategory::Psu => "psu",
            PartCategory::Storage => "ssd",
            PartCategory::Display => "display",
        }
    }

    /// Catalog table holding this category
    pub fn table_name(self) -> &'static str {
        match self {
            PartCategory::Cpu => "cpus",
            PartCategory::Motherboard => "motherboards",
            PartCategory::Memory => "ram",
            PartCategory::Gpu => "gpus",
            PartCategory::Case => "cases",
            PartCategory::Psu => "psus",
            PartCategory::Storage => "ssds",
            PartCategory::Display => "displays",
        }
    }

    /// Column of the persisted build referencing this category
    pub fn foreign_key(self) -> &'static str {
        match self {
            PartCategory::Cpu => "cpu_id",
            PartCategory::Motherboard => "motherboard_id",
            PartCategory::Memory => "ram_id",
            PartCategory::Gpu => "gpu_id",
            PartCategory::Case => "case_id",
            PartCategory::Psu => "psu_id",
            PartCategory::Storage => "ssd_id",
            PartCategory::Display => "display_id",
        }
    }

    /// Column of the saved builds overview holding this category's part name
    pub fn summary_column(self) -> &'static str {
        match self {
            PartCategory::Cpu => "cpu",
            PartCategory::Motherboard => "motherboard",
            PartCategory::Memory => "ram",
            PartCategory::Gpu => "gpu",
            PartCategory::Case => "case_name",
            PartCategory::Psu => "psu",
            PartCategory::Storage => "ssd_name",
            PartCategory::Display => "display_name",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            PartCategory::Cpu => "CPU",
            PartCategory::Motherboard => "Motherboard",
            PartCategory::Memory => "Memory",
            PartCategory::Gpu => "GPU",
            PartCategory::Case => "Case",
            PartCategory::Psu => "Power Supply",
            PartCategory::Storage => "Storage (SSD)",
            PartCategory::Display => "Monitor",
        }
    }

    /// Parse from a key, a table name or the category's own name
    pub fn parse(name: &str) -> DomainResult<Self> {
        let normalized = name.trim().to_lowercase();
        Self::ALL
            .into_iter()
            .find(|c| {
                normalized == c.key() || normalized == c.table_name() || normalized == c.to_string()
            })
            .ok_or_else(|| DomainError::UnknownCategory(name.to_string()))
    }
}

impl std::fmt::Display for PartCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            PartCategory::Cpu => "cpu",
            PartCategory::Motherboard => "motherboard",
            PartCategory::Memory => "memory",
            PartCategory::Gpu => "gpu",
            PartCategory::Case => "case",
            PartCategory::Psu => "psu",
            PartCategory::Storage => "storage",
            PartCategory::Display => "display",
        };
        write!(f, "{}", name)
    }
}

impl std::str::FromStr for PartCategory {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

/// Typed reference to a catalog item
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ComponentRef {
    pub category: PartCategory,
    pub id: i64,
}

/// A catalogued component
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Component {
    /// Catalog identifier, unique within the category
    pub id: i64,

    pub category: PartCategory,

    pub name: String,

    pub manufacturer: Option<String>,

    /// Price in the catalog's base currency
    pub price: f64,

    /// Category-specific columns (socket, watt, tdp, ...)
    /// Keys differ between categories; always look them up defensively
    pub attributes: Map<String, Value>,
}

impl Component {
    pub fn new(category: PartCategory, id: i64, name: impl Into<String>, price: f64) -> Self {
        Self {
            id,
            category,
            name: name.into(),
            manufacturer: None,
            price,
            attributes: Map::new(),
        }
    }

    pub fn with_manufacturer(mut self, manufacturer: impl Into<String>) -> Self {
        self.manufacturer = Some(manufacturer.into());
        self
    }

    pub fn with_attribute(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.attributes.insert(key.into(), value.into());
        self
    }

    /// Decode a catalog row
    ///
    /// `id` is required; `name`, `manufacturer` and `price` are optional and
    /// everything else lands in the attribute bag.
    pub fn from_catalog_row(category: PartCategory, row: Value) -> DomainResult<Self> {
        let mut fields = match row {
            Value::Object(fields) => fields,
            other => {
                return Err(DomainError::InvalidRecord(format!(
                    "{} row is not an object: {}",
                    category, other
                )))
            }
        };

        let id = fields
            .remove("id")
            .as_ref()
            .and_then(as_integer)
            .ok_or_else(|| {
                DomainError::InvalidRecord(format!("{} row has no numeric id", category))
            })?;

        let name = match fields.remove("name") {
            Some(Value::String(s)) => s,
            Some(Value::Null) | None => String::new(),
            Some(other) => other.to_string(),
        };

        let manufacturer = match fields.remove("manufacturer") {
            Some(Value::String(s)) if !s.is_empty() => Some(s),
            _ => None,
        };

        let price = fields
            .remove("price")
            .as_ref()
            .and_then(as_number)
            .unwrap_or(0.0);

        let component = Self {
            id,
            category,
            name,
            manufacturer,
            price,
            attributes: fields,
        };
        validate_component(&component)?;
        Ok(component)
    }

    pub fn reference(&self) -> ComponentRef {
        ComponentRef {
            category: self.category,
            id: self.id,
        }
    }

    pub fn attribute(&self, key: &str) -> Option<&Value> {
        self.attributes.get(key)
    }

    /// Numeric value of an attribute
    ///
    /// Accepts JSON numbers and numeric strings. Missing keys, nulls, empty
    /// strings, zero and anything non-numeric yield `None`.
    pub fn numeric_attribute(&self, key: &str) -> Option<f64> {
        self.attribute(key)
            .and_then(as_number)
            .filter(|v| *v != 0.0)
    }

    /// First usable numeric attribute among `keys`, in order, with the key it came from
    pub fn first_numeric_attribute<'k>(&self, keys: &[&'k str]) -> Option<(&'k str, f64)> {
        keys.iter()
            .find_map(|key| self.numeric_attribute(key).map(|value| (*key, value)))
    }
}

fn as_number(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    }
    .filter(|v| v.is_finite())
}

fn as_integer(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n.as_i64(),
        Value::String(s) => s.trim().parse::<i64>().ok(),
        _ => None,
    }
}
