//! Logs command - view and manage application logs

use anyhow::Result;
use clap::Subcommand;
use colored::Colorize;

use super::get_data_dir;
use crate::output;
use prorab_core::services::logging::now_ms;
use prorab_core::{EntryPoint, LoggingService};

#[derive(Subcommand)]
pub enum LogsCommands {
    /// Последние записи журнала
    List {
        /// Количество записей
        #[arg(short, long, default_value = "50")]
        limit: usize,
        /// Только ошибки
        #[arg(long)]
        errors: bool,
        /// Вывод в JSON
        #[arg(long)]
        json: bool,
    },
    /// Удалить старые записи
    Clear {
        /// Удалить записи старше N дней
        #[arg(long, default_value = "30")]
        older_than_days: u64,
        /// Без подтверждения
        #[arg(long, short = 'f')]
        force: bool,
        /// Вывод в JSON
        #[arg(long)]
        json: bool,
    },
    /// Статистика журнала и путь к базе
    Stats {
        /// Вывод в JSON
        #[arg(long)]
        json: bool,
    },
}

fn get_logging_service() -> Result<LoggingService> {
    let data_dir = get_data_dir()?;
    std::fs::create_dir_all(&data_dir)?;
    LoggingService::new(&data_dir, EntryPoint::Cli, env!("CARGO_PKG_VERSION"))
}

fn format_timestamp(timestamp_ms: i64) -> String {
    use chrono::{TimeZone, Utc};
    Utc.timestamp_millis_opt(timestamp_ms)
        .single()
        .map(|dt| dt.format("%Y-%m-%d %H:%M:%S").to_string())
        .unwrap_or_else(|| timestamp_ms.to_string())
}

pub fn run(command: LogsCommands) -> Result<()> {
    match command {
        LogsCommands::List { limit, errors, json } => {
            let service = get_logging_service()?;
            let entries = if errors {
                service.get_errors(limit)?
            } else {
                service.get_recent(limit)?
            };

            if json {
                return output::json(&entries);
            }

            if entries.is_empty() {
                println!("Записей нет.");
                return Ok(());
            }

            let mut table = output::create_table();
            table.set_header(vec!["Время", "Источник", "Событие", "Контекст", "Ошибка"]);

            for entry in entries {
                let document = match (&entry.collection, &entry.document_id) {
                    (Some(c), Some(id)) => Some(format!("{}/{}", c, id)),
                    _ => None,
                };
                let context = [entry.command.clone(), document]
                    .into_iter()
                    .flatten()
                    .collect::<Vec<_>>()
                    .join(", ");

                let error_indicator = if entry.error_message.is_some() {
                    "!".red().to_string()
                } else {
                    String::new()
                };

                table.add_row(vec![
                    format_timestamp(entry.timestamp),
                    entry.entry_point,
                    entry.event,
                    context,
                    error_indicator,
                ]);
            }

            println!("{}", table);

            // Show error details if any
            let errors_list = service.get_errors(5)?;
            if !errors_list.is_empty() && !errors {
                println!();
                println!("{}", "Последние ошибки:".red().bold());
                for err in errors_list.iter().take(3) {
                    println!(
                        "  {} [{}]: {}",
                        format_timestamp(err.timestamp).dimmed(),
                        err.event,
                        err.error_message.as_deref().unwrap_or("Неизвестная ошибка")
                    );
                }
            }
        }
        LogsCommands::Clear {
            older_than_days,
            force,
            json,
        } => {
            let service = get_logging_service()?;
            let cutoff_ms = now_ms() - (older_than_days as i64 * 24 * 60 * 60 * 1000);

            if !force && !json {
                use dialoguer::Confirm;
                if !Confirm::new()
                    .with_prompt(format!(
                        "Удалить записи старше {} дн.?",
                        older_than_days
                    ))
                    .default(false)
                    .interact()?
                {
                    println!("Отменено.");
                    return Ok(());
                }
            }

            let deleted = service.delete_before(cutoff_ms)?;

            if json {
                output::json(&serde_json::json!({"deleted": deleted}))?;
            } else {
                println!("Удалено записей: {}", deleted);
            }
        }
        LogsCommands::Stats { json } => {
            let service = get_logging_service()?;
            let total = service.count()?;
            let errors = service.get_errors(1000)?.len();
            let db_path = service.db_path().to_path_buf();
            let size_bytes = std::fs::metadata(&db_path)
                .map(|m| m.len())
                .unwrap_or(0);

            if json {
                output::json(&serde_json::json!({
                    "totalEntries": total,
                    "errorCount": errors,
                    "databasePath": db_path.to_string_lossy(),
                    "databaseSizeBytes": size_bytes
                }))?;
            } else {
                println!("{}", "Статистика журнала".bold());
                println!("  Всего записей: {}", total);
                println!("  Ошибок: {}", errors);
                println!("  База: {}", db_path.display());
                println!("  Размер: {} байт", size_bytes);
            }
        }
    }

    Ok(())
}
