//! Ledger category and transaction models

use serde::{Deserialize, Serialize};

/// Row discriminator of the categories linked to a client
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CategoryRow {
    /// Row 1: the client's ledger card
    Client,
    /// Row 3: the client's project card
    Project,
}

impl CategoryRow {
    /// Both linked rows, in the order they are queried
    pub const LINKED: [CategoryRow; 2] = [Self::Project, Self::Client];

    pub fn number(self) -> i64 {
        match self {
            Self::Client => 1,
            Self::Project => 3,
        }
    }
}

fn default_true() -> bool {
    true
}

/// A ledger category
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Category {
    pub id: String,
    pub title: String,
    pub row: i64,
    #[serde(default = "default_true")]
    pub is_visible: bool,
    #[serde(default)]
    pub icon: Option<String>,
    #[serde(default)]
    pub color: Option<String>,
    #[serde(default)]
    pub amount: Option<f64>,
}

/// A financial record booked against a category
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Transaction {
    pub id: String,
    pub category_id: String,
    #[serde(default)]
    pub amount: f64,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub date: Option<String>,
    #[serde(default, rename = "type")]
    pub kind: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_linked_rows() {
        let numbers: Vec<i64> = CategoryRow::LINKED.iter().map(|r| r.number()).collect();
        assert_eq!(numbers, vec![3, 1]);
    }

    #[test]
    fn test_transaction_type_field() {
        let tx: Transaction = serde_json::from_value(serde_json::json!({
            "id": "t1",
            "categoryId": "cat-3",
            "amount": 150000,
            "type": "expense"
        }))
        .unwrap();
        assert_eq!(tx.category_id, "cat-3");
        assert_eq!(tx.kind.as_deref(), Some("expense"));
    }
}
