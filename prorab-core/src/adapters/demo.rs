//! Demo data for onboarding and manual testing
//!
//! A small construction business: four clients across two years, their
//! ledger cards with a few payments, and a warehouse where two items are
//! running low.

use chrono::{Datelike, Utc};
use serde_json::{json, Value as JsonValue};

use crate::domain::client::category_title;
use crate::domain::CategoryRow;
use crate::ports::document_store::fields;
use crate::ports::{collections, Document};

/// A demo document together with its collection
pub type Seed = (&'static str, Document);

struct DemoClient {
    id: &'static str,
    first: &'static str,
    last: &'static str,
    middle: &'static str,
    phone: &'static str,
    object_address: &'static str,
    total: f64,
    years_ago: i32,
    status: &'static str,
}

const CLIENTS: [DemoClient; 4] = [
    DemoClient {
        id: "demo-client-1",
        first: "Петр",
        last: "Иванов",
        middle: "Сергеевич",
        phone: "+7 701 555 12 34",
        object_address: "пос. Каскелен, ул. Садовая 14",
        total: 18_500_000.0,
        years_ago: 0,
        status: "building",
    },
    DemoClient {
        id: "demo-client-2",
        first: "Айгуль",
        last: "Сатпаева",
        middle: "Маратовна",
        phone: "+7 707 555 98 10",
        object_address: "г. Алматы, мкр. Алатау, уч. 211",
        total: 24_300_000.0,
        years_ago: 0,
        status: "deposit",
    },
    DemoClient {
        id: "demo-client-3",
        first: "Олег",
        last: "Ким",
        middle: "Викторович",
        phone: "+7 705 555 40 77",
        object_address: "пос. Отеген батыр, ул. Лесная 3",
        total: 12_900_000.0,
        years_ago: 1,
        status: "built",
    },
    DemoClient {
        id: "demo-client-4",
        first: "Данияр",
        last: "Ахметов",
        middle: "",
        phone: "+7 747 555 61 02",
        object_address: "г. Алматы, ул. Жандосова 98",
        total: 9_750_000.0,
        years_ago: 1,
        status: "building",
    },
];

fn seed(collection: &'static str, id: &str, pairs: Vec<(&str, JsonValue)>) -> Seed {
    (collection, Document::new(id, fields(pairs)))
}

/// Clients with their row 1 and row 3 categories and a few payments
pub fn generate_demo_ledger() -> Vec<Seed> {
    let year = Utc::now().year();
    let mut seeds = Vec::new();

    for (number, client) in CLIENTS.iter().enumerate() {
        seeds.push(seed(
            collections::CLIENTS,
            client.id,
            vec![
                ("firstName", json!(client.first)),
                ("lastName", json!(client.last)),
                ("middleName", json!(client.middle)),
                ("phone", json!(client.phone)),
                ("objectAddress", json!(client.object_address)),
                ("totalAmount", json!(client.total)),
                ("constructionDays", json!(120)),
                ("clientNumber", json!(number + 1)),
                ("year", json!(year - client.years_ago)),
                ("status", json!(client.status)),
                ("isIconsVisible", json!(true)),
            ],
        ));

        let title = category_title(client.last, client.first);
        for row in CategoryRow::LINKED {
            let category_id = format!("{}-row{}", client.id, row.number());
            seeds.push(seed(
                collections::CATEGORIES,
                &category_id,
                vec![
                    ("title", json!(title)),
                    ("row", json!(row.number())),
                    ("isVisible", json!(true)),
                    ("icon", json!("User")),
                    ("color", json!("bg-emerald-500")),
                ],
            ));

            if row == CategoryRow::Project {
                for (i, share) in [0.3, 0.2, 0.1].iter().enumerate() {
                    seeds.push(seed(
                        collections::TRANSACTIONS,
                        &format!("{}-tx{}", category_id, i + 1),
                        vec![
                            ("categoryId", json!(category_id)),
                            ("amount", json!(client.total * share)),
                            ("description", json!(format!("Оплата, этап {}", i + 1))),
                            ("type", json!("income")),
                        ],
                    ));
                }
            }
        }
    }

    seeds
}

/// Warehouse stock; the cement and the membrane are below their thresholds
pub fn generate_demo_products() -> Vec<Seed> {
    let products: [(&str, &str, &str, f64, &str, f64, f64); 5] = [
        ("4870001000011", "Цемент М500", "Сыпучие", 6.0, "мешок", 20.0, 3_200.0),
        ("4870001000028", "Арматура 12мм", "Металл", 840.0, "м", 200.0, 410.0),
        ("4870001000035", "Газоблок D500", "Блоки", 1_250.0, "шт", 300.0, 690.0),
        ("4870001000042", "Мембрана гидроизоляционная", "Изоляция", 2.0, "рулон", 5.0, 18_400.0),
        ("4870001000059", "Профнастил С21", "Кровля", 96.0, "лист", 40.0, 5_750.0),
    ];

    products
        .iter()
        .map(|(id, name, category, quantity, unit, min, price)| {
            seed(
                collections::PRODUCTS,
                id,
                vec![
                    ("name", json!(name)),
                    ("category", json!(category)),
                    ("quantity", json!(quantity)),
                    ("unit", json!(unit)),
                    ("minQuantity", json!(min)),
                    ("averagePurchasePrice", json!(price)),
                    ("totalPurchasePrice", json!(price * quantity)),
                ],
            )
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_client_has_both_cards() {
        let seeds = generate_demo_ledger();
        let categories: Vec<&Document> = seeds
            .iter()
            .filter(|(c, _)| *c == collections::CATEGORIES)
            .map(|(_, d)| d)
            .collect();
        assert_eq!(categories.len(), CLIENTS.len() * 2);
        assert!(categories
            .iter()
            .any(|d| d.get("title") == Some(&json!("Иванов Петр")) && d.get("row") == Some(&json!(3))));
    }

    #[test]
    fn test_some_products_are_low() {
        let low = generate_demo_products()
            .into_iter()
            .filter_map(|(_, d)| d.decode::<crate::domain::Product>().ok())
            .filter(|p| p.is_low_stock())
            .count();
        assert_eq!(low, 2);
    }
}
