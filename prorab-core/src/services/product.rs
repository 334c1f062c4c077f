//! Product directory - warehouse stock listing and barcode lookup

use std::sync::Arc;

use crate::domain::result::Result;
use crate::domain::{Product, ProductRow};
use crate::ports::{collections, DocumentStore, Query, UserAlert};
use crate::services::alerts;
use crate::services::logging::{record, LogEvent, Logger};
use crate::services::notification::NotificationService;

pub struct ProductDirectory {
    store: Arc<dyn DocumentStore>,
    alerts: Arc<dyn UserAlert>,
    logger: Logger,
}

impl ProductDirectory {
    pub fn new(store: Arc<dyn DocumentStore>, alerts: Arc<dyn UserAlert>, logger: Logger) -> Self {
        Self {
            store,
            alerts,
            logger,
        }
    }

    /// All products ordered by name; empty (and alerted) on read errors
    pub async fn fetch_products(&self) -> Vec<Product> {
        match self.load_products().await {
            Ok(products) => products,
            Err(e) => {
                record(
                    &self.logger,
                    LogEvent::new("products_load_failed").with_error(e.to_string()),
                );
                self.alerts.alert(alerts::LOAD_PRODUCTS_FAILED);
                Vec::new()
            }
        }
    }

    async fn load_products(&self) -> Result<Vec<Product>> {
        let docs = self
            .store
            .query(&Query::collection(collections::PRODUCTS).order_by("name"))
            .await?;

        let mut products = Vec::with_capacity(docs.len());
        for doc in docs {
            match doc.decode::<Product>() {
                Ok(product) => products.push(product),
                Err(e) => record(
                    &self.logger,
                    LogEvent::new("product_decode_failed")
                        .with_document(collections::PRODUCTS, &doc.id)
                        .with_error(e.to_string()),
                ),
            }
        }
        Ok(products)
    }

    /// Product whose barcode equals `code`
    pub fn find_by_barcode<'a>(&self, products: &'a [Product], code: &str) -> Option<&'a Product> {
        let code = code.trim();
        let found = products.iter().find(|p| p.barcode() == code);
        if found.is_none() {
            self.alerts.alert(alerts::PRODUCT_NOT_FOUND);
        }
        found
    }

    /// Send a low-stock notification for every product at or below its threshold.
    /// Returns the number of notifications recorded.
    pub async fn notify_low_stock(
        &self,
        products: &[Product],
        notifications: &NotificationService,
    ) -> usize {
        let mut sent = 0;
        for product in products.iter().filter(|p| p.is_low_stock()) {
            if notifications
                .send_low_stock(&product.name, product.quantity(), &product.unit)
                .await
            {
                sent += 1;
            }
        }
        sent
    }
}

/// Table rows for `products`
pub fn product_rows(products: &[Product]) -> Vec<ProductRow> {
    products.iter().map(ProductRow::from).collect()
}
