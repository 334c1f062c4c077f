//! Products command - warehouse stock, barcode lookup and product images

use std::path::PathBuf;
use std::process::exit;

use anyhow::{bail, Result};
use clap::Subcommand;
use colored::Colorize;
use serde_json::json;

use prorab_core::domain::ProductRow;
use prorab_core::ports::document_store::fields;
use prorab_core::ports::{collections, DocumentStore};
use prorab_core::services::product::product_rows;
use prorab_core::services::{ProductDirectory, UploadFile, UploadOutcome};
use prorab_core::{LogEvent, Product};

use super::{get_context, log_event, spinner};
use crate::output;

#[derive(Subcommand)]
pub enum ProductsCommands {
    /// Остатки на складе
    List {
        /// Вывод в JSON
        #[arg(long)]
        json: bool,
    },
    /// Найти товар по штрихкоду
    Scan { code: String },
    /// Загрузить фото товара (PNG, JPG или WEBP, до 5MB)
    UploadImage {
        path: PathBuf,
        /// Привязать фото к этому товару
        #[arg(long)]
        product: Option<String>,
    },
    /// Уведомить о каждом заканчивающемся товаре
    CheckStock,
}

pub async fn run(command: ProductsCommands) -> Result<()> {
    let mut ctx = get_context("products")?;

    let ok = match command {
        ProductsCommands::List { json } => {
            let products = load(&ctx.products).await;
            let rows = product_rows(&products);
            if json {
                output::json(&rows)?;
            } else {
                print_rows(&rows);
            }
            true
        }
        ProductsCommands::Scan { code } => {
            let products = load(&ctx.products).await;
            match ctx.products.find_by_barcode(&products, &code) {
                Some(product) => {
                    print_rows(&[ProductRow::from(product)]);
                    true
                }
                None => false,
            }
        }
        ProductsCommands::UploadImage { path, product } => {
            let file = UploadFile::from_path(&path).await?;
            let mut uploaded_url = None;
            let outcome = ctx
                .images
                .handle_drop(vec![file], |url| uploaded_url = Some(url.to_string()))
                .await;

            match (outcome, uploaded_url) {
                (UploadOutcome::Uploaded(_), Some(url)) => {
                    if let Some(id) = product {
                        attach_image(ctx.store.as_ref(), &id, &url).await?;
                        log_event(
                            &ctx.logger,
                            LogEvent::new("product_image_attached")
                                .with_document(collections::PRODUCTS, id),
                        );
                    }
                    output::success("Изображение загружено");
                    println!("{}", url);
                    true
                }
                _ => false,
            }
        }
        ProductsCommands::CheckStock => {
            let products = load(&ctx.products).await;
            let low = products.iter().filter(|p| p.is_low_stock()).count();
            if low == 0 {
                output::info("Все товары в наличии");
            } else {
                let sent = ctx
                    .products
                    .notify_low_stock(&products, &ctx.notifications)
                    .await;
                output::warning(&format!("Заканчивается товаров: {} из {}", low, products.len()));
                println!("Отправлено уведомлений: {}", sent);
                if !ctx.notifications.outbox().is_enabled() {
                    println!(
                        "{}",
                        "Telegram не настроен; уведомления только записаны".dimmed()
                    );
                }
            }
            true
        }
    };

    // Wait for queued relay messages
    ctx.shutdown().await;
    if !ok {
        exit(1);
    }
    Ok(())
}

async fn load(directory: &ProductDirectory) -> Vec<Product> {
    let spinner = spinner("Загрузка товаров...");
    let products = directory.fetch_products().await;
    spinner.finish_and_clear();
    products
}

async fn attach_image(store: &dyn DocumentStore, product_id: &str, url: &str) -> Result<()> {
    if store.get(collections::PRODUCTS, product_id).await?.is_none() {
        bail!("Товар '{}' не найден", product_id);
    }
    store
        .update(collections::PRODUCTS, product_id, fields([("image", json!(url))]))
        .await?;
    Ok(())
}

fn print_rows(rows: &[ProductRow]) {
    if rows.is_empty() {
        println!("Товары не найдены.");
        return;
    }

    let mut table = output::create_table();
    table.set_header(vec![
        "Товар",
        "Категория",
        "Количество",
        "Ср. цена",
        "Сумма",
        "Фото",
        "Штрихкод",
    ]);
    for row in rows {
        table.add_row(vec![
            output::flagged_cell(&row.name, false),
            output::flagged_cell(&row.category, false),
            output::flagged_cell(&row.quantity, row.low_stock),
            output::flagged_cell(&row.average_price, false),
            output::flagged_cell(&row.total_price, false),
            output::flagged_cell(if row.has_image { "✓" } else { "" }, false),
            output::flagged_cell(&row.barcode, false),
        ]);
    }
    println!("{}", table);
}
