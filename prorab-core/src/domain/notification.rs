//! Notification model

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NotificationType {
    Inventory,
    Client,
    Payment,
    Estimate,
    Construction,
}

/// Content of a notification before it is recorded
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NotificationData {
    pub title: String,
    pub message: String,
    #[serde(rename = "type")]
    pub kind: NotificationType,
}

impl NotificationData {
    pub fn new(title: impl Into<String>, message: impl Into<String>, kind: NotificationType) -> Self {
        Self {
            title: title.into(),
            message: message.into(),
            kind,
        }
    }

    /// Low-stock warning for a warehouse product
    pub fn low_stock(product_name: &str, quantity: f64, unit: &str) -> Self {
        Self::new(
            "Низкий остаток товара",
            format!(
                "Товар \"{}\" заканчивается. Текущий остаток: {} {}",
                product_name,
                super::product::format_quantity(quantity),
                unit
            ),
            NotificationType::Inventory,
        )
    }

    /// Text sent through the push relay
    pub fn relay_text(&self) -> String {
        format!("{}\n\n{}", self.title, self.message)
    }
}

/// A recorded notification. Append-only.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Notification {
    pub id: String,
    pub title: String,
    pub message: String,
    #[serde(rename = "type")]
    pub kind: NotificationType,
    pub timestamp: DateTime<Utc>,
    pub is_read: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_low_stock_message() {
        let data = NotificationData::low_stock("Цемент", 4.0, "мешок");
        assert_eq!(data.kind, NotificationType::Inventory);
        assert_eq!(data.title, "Низкий остаток товара");
        assert_eq!(
            data.message,
            "Товар \"Цемент\" заканчивается. Текущий остаток: 4 мешок"
        );
    }

    #[test]
    fn test_relay_text_joins_title_and_message() {
        let data = NotificationData::new("Оплата", "Получен задаток", NotificationType::Payment);
        assert_eq!(data.relay_text(), "Оплата\n\nПолучен задаток");
    }
}
