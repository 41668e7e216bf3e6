use serde::{Deserialize, Serialize};

/// Catalog prices are stored in USD and shown in INR
pub const DEFAULT_DISPLAY_PER_BASE: f64 = 88.7;

/// Fixed-rate conversion between the catalog's base currency and the
/// currency prices are displayed and entered in
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CurrencyConverter {
    pub display_per_base: f64,
    pub symbol: String,
}

impl CurrencyConverter {
    pub fn new(display_per_base: f64, symbol: impl Into<String>) -> Self {
        Self {
            display_per_base,
            symbol: symbol.into(),
        }
    }

    pub fn to_display(&self, base_amount: f64) -> f64 {
        base_amount * self.display_per_base
    }

    pub fn to_base(&self, display_amount: f64) -> f64 {
        display_amount / self.display_per_base
    }

    /// Display price rounded to whole units, e.g. `₹17738`
    pub fn format(&self, base_amount: f64) -> String {
        format!("{}{:.0}", self.symbol, self.to_display(base_amount))
    }
}

impl Default for CurrencyConverter {
    fn default() -> Self {
        Self::new(DEFAULT_DISPLAY_PER_BASE, "₹")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_round_trip_conversion() {
        let converter = CurrencyConverter::default();
        let base = converter.to_base(8870.0);
        assert!((base - 100.0).abs() < 1e-9);
        assert!((converter.to_display(base) - 8870.0).abs() < 1e-9);
    }

    #[test]
    fn test_format_rounds_to_whole_units() {
        let converter = CurrencyConverter::default();
        assert_eq!(converter.format(199.99), "₹17739");
        assert_eq!(converter.format(0.0), "₹0");
    }
}
