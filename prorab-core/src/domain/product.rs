//! Warehouse product model and display helpers

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value as JsonValue;

/// Currency suffix of every rendered amount (tenge)
pub const CURRENCY_SYMBOL: &str = "₸";

/// Thousands separator of the ru-RU locale
const GROUP_SEPARATOR: char = '\u{a0}';

/// Accept any JSON value, keeping only numbers
fn lenient_number<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<JsonValue>::deserialize(deserializer)?;
    Ok(value.and_then(|v| v.as_f64()))
}

/// A stock item. Prices and quantities are precomputed by the warehouse ledger.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub category: String,
    #[serde(default, deserialize_with = "lenient_number")]
    pub quantity: Option<f64>,
    #[serde(default)]
    pub unit: String,
    /// Reorder threshold
    #[serde(default, deserialize_with = "lenient_number")]
    pub min_quantity: Option<f64>,
    #[serde(default, deserialize_with = "lenient_number")]
    pub average_purchase_price: Option<f64>,
    #[serde(default, deserialize_with = "lenient_number")]
    pub total_purchase_price: Option<f64>,
    #[serde(default)]
    pub image: Option<String>,
}

impl Product {
    pub fn quantity(&self) -> f64 {
        self.quantity.unwrap_or(0.0)
    }

    /// Low stock when the quantity is at or below the threshold (missing threshold = 0)
    pub fn is_low_stock(&self) -> bool {
        self.quantity() <= self.min_quantity.unwrap_or(0.0)
    }

    /// Value encoded into the product's barcode
    pub fn barcode(&self) -> &str {
        &self.id
    }
}

/// Format an amount as a grouped integer followed by the currency symbol.
/// Missing or non-finite amounts render as zero.
pub fn format_money(amount: Option<f64>) -> String {
    let value = match amount {
        Some(v) if v.is_finite() => v.round() as i64,
        _ => 0,
    };
    format!("{} {}", group_thousands(value), CURRENCY_SYMBOL)
}

/// Render a quantity without a trailing `.0` for whole numbers
pub fn format_quantity(quantity: f64) -> String {
    if quantity.fract() == 0.0 && quantity.abs() < 1e15 {
        format!("{}", quantity as i64)
    } else {
        format!("{}", quantity)
    }
}

fn group_thousands(value: i64) -> String {
    let digits = value.unsigned_abs().to_string();
    let mut grouped = String::new();
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(GROUP_SEPARATOR);
        }
        grouped.push(c);
    }
    if value < 0 {
        format!("-{}", grouped)
    } else {
        grouped
    }
}

/// One rendered row of the product table
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProductRow {
    pub id: String,
    pub name: String,
    pub category: String,
    pub quantity: String,
    pub low_stock: bool,
    pub average_price: String,
    pub total_price: String,
    pub has_image: bool,
    pub barcode: String,
}

impl From<&Product> for ProductRow {
    fn from(product: &Product) -> Self {
        Self {
            id: product.id.clone(),
            name: product.name.clone(),
            category: product.category.clone(),
            quantity: format!("{} {}", format_quantity(product.quantity()), product.unit)
                .trim_end()
                .to_string(),
            low_stock: product.is_low_stock(),
            average_price: format_money(product.average_purchase_price),
            total_price: format_money(product.total_purchase_price),
            has_image: product.image.is_some(),
            barcode: product.barcode().to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn product(quantity: f64, min_quantity: Option<f64>) -> Product {
        Product {
            id: "p1".to_string(),
            name: "Цемент М500".to_string(),
            category: "Сыпучие".to_string(),
            quantity: Some(quantity),
            unit: "мешок".to_string(),
            min_quantity,
            average_purchase_price: Some(2450.0),
            total_purchase_price: Some(1225000.0),
            image: None,
        }
    }

    #[test]
    fn test_low_stock_threshold_is_inclusive() {
        assert!(product(10.0, Some(10.0)).is_low_stock());
        assert!(product(3.0, Some(10.0)).is_low_stock());
        assert!(!product(11.0, Some(10.0)).is_low_stock());
    }

    #[test]
    fn test_missing_threshold_counts_as_zero() {
        assert!(!product(1.0, None).is_low_stock());
        assert!(product(0.0, None).is_low_stock());
    }

    #[test]
    fn test_money_formatting() {
        assert_eq!(format_money(Some(1225000.0)), "1\u{a0}225\u{a0}000 ₸");
        assert_eq!(format_money(Some(999.0)), "999 ₸");
        assert_eq!(format_money(Some(2450.6)), "2\u{a0}451 ₸");
        assert_eq!(format_money(Some(-15000.0)), "-15\u{a0}000 ₸");
        assert_eq!(format_money(None), "0 ₸");
        assert_eq!(format_money(Some(f64::NAN)), "0 ₸");
    }

    #[test]
    fn test_non_numeric_prices_decode_as_missing() {
        let product: Product = serde_json::from_value(serde_json::json!({
            "id": "p2",
            "name": "Арматура",
            "quantity": 40,
            "unit": "шт",
            "averagePurchasePrice": "n/a"
        }))
        .unwrap();
        assert_eq!(product.average_purchase_price, None);
        assert_eq!(format_money(product.average_purchase_price), "0 ₸");
    }

    #[test]
    fn test_product_row() {
        let row = ProductRow::from(&product(3.0, Some(10.0)));
        assert!(row.low_stock);
        assert_eq!(row.quantity, "3 мешок");
        assert_eq!(row.average_price, "2\u{a0}450 ₸");
        assert_eq!(row.barcode, "p1");
        assert!(!row.has_image);
    }
}
