//! Notification service - records notifications and forwards them to the relay

use std::sync::Arc;

use chrono::{SecondsFormat, Utc};
use serde_json::json;

use crate::domain::result::Result;
use crate::domain::{Notification, NotificationData};
use crate::ports::document_store::fields;
use crate::ports::{collections, DocumentStore, Query};
use crate::services::logging::{record, LogEvent, Logger};
use crate::services::outbox::PushOutbox;

pub struct NotificationService {
    store: Arc<dyn DocumentStore>,
    outbox: PushOutbox,
    logger: Logger,
}

impl NotificationService {
    pub fn new(store: Arc<dyn DocumentStore>, outbox: PushOutbox, logger: Logger) -> Self {
        Self {
            store,
            outbox,
            logger,
        }
    }

    /// Record a notification and queue it for the relay.
    ///
    /// Returns false only when the notification could not be recorded;
    /// relay delivery happens in the background.
    pub async fn send(&self, data: &NotificationData) -> bool {
        let doc = fields([
            ("title", json!(data.title)),
            ("message", json!(data.message)),
            ("type", json!(data.kind)),
            (
                "timestamp",
                json!(Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)),
            ),
            ("isRead", json!(false)),
        ]);

        match self.store.add(collections::NOTIFICATIONS, doc).await {
            Ok(id) => {
                record(
                    &self.logger,
                    LogEvent::new("notification_sent").with_document(collections::NOTIFICATIONS, id),
                );
                self.outbox.enqueue(data.relay_text());
                true
            }
            Err(e) => {
                record(
                    &self.logger,
                    LogEvent::new("notification_failed").with_error(e.to_string()),
                );
                false
            }
        }
    }

    pub async fn send_low_stock(&self, product_name: &str, quantity: f64, unit: &str) -> bool {
        self.send(&NotificationData::low_stock(product_name, quantity, unit))
            .await
    }

    /// Most recent notifications, newest first
    pub async fn recent(&self, limit: usize) -> Result<Vec<Notification>> {
        let docs = self
            .store
            .query(&Query::collection(collections::NOTIFICATIONS).order_by("timestamp"))
            .await?;
        docs.iter().rev().take(limit).map(|d| d.decode()).collect()
    }

    pub fn outbox(&self) -> &PushOutbox {
        &self.outbox
    }

    /// Wait for queued relay messages
    pub async fn shutdown(&mut self) {
        self.outbox.shutdown().await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::memory::{MemoryDocumentStore, StoreOperation};
    use crate::domain::NotificationType;

    #[tokio::test]
    async fn test_send_records_unread_notification() {
        let store = Arc::new(MemoryDocumentStore::new());
        let service = NotificationService::new(store.clone(), PushOutbox::disabled(), None);

        assert!(service.send_low_stock("Цемент М500", 3.0, "мешок").await);

        let recent = service.recent(10).await.unwrap();
        assert_eq!(recent.len(), 1);
        assert_eq!(recent[0].title, "Низкий остаток товара");
        assert_eq!(
            recent[0].message,
            "Товар \"Цемент М500\" заканчивается. Текущий остаток: 3 мешок"
        );
        assert_eq!(recent[0].kind, NotificationType::Inventory);
        assert!(!recent[0].is_read);
    }

    #[tokio::test]
    async fn test_store_failure_returns_false() {
        let store = Arc::new(MemoryDocumentStore::new());
        store.fail(StoreOperation::Add);
        let service = NotificationService::new(store.clone(), PushOutbox::disabled(), None);

        let data = NotificationData::new("Оплата", "Поступил платеж", NotificationType::Payment);
        assert!(!service.send(&data).await);
        assert!(store.ids(collections::NOTIFICATIONS).is_empty());
    }
}
