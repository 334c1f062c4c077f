//! Workflows command - inspect and resume interrupted client workflows

use std::process::exit;

use anyhow::Result;
use clap::Subcommand;
use colored::Colorize;

use prorab_core::domain::WorkflowKind;
use prorab_core::OperationResult;

use super::get_context;
use crate::output;

#[derive(Subcommand)]
pub enum WorkflowsCommands {
    /// Операции, остановленные до завершения
    List {
        /// Вывод в JSON
        #[arg(long)]
        json: bool,
    },
    /// Продолжить операцию с последнего выполненного шага
    Resume {
        id: String,
        /// Вывод в JSON
        #[arg(long)]
        json: bool,
    },
}

fn describe(kind: WorkflowKind) -> &'static str {
    match kind {
        WorkflowKind::DeleteWithHistory => "удаление с историей",
        WorkflowKind::DeleteIconOnly => "удаление иконки",
        WorkflowKind::SetVisibility => "видимость иконок",
    }
}

pub async fn run(command: WorkflowsCommands) -> Result<()> {
    let mut ctx = get_context("workflows")?;

    match command {
        WorkflowsCommands::List { json } => {
            let pending = ctx.clients.pending_workflows().await?;
            if json {
                output::json(&pending)?;
            } else if pending.is_empty() {
                output::success("Прерванных операций нет");
            } else {
                let mut table = output::create_table();
                table.set_header(vec!["ID", "Операция", "Клиент", "Шаг", "Ошибка", "Обновлено"]);
                for w in &pending {
                    table.add_row(vec![
                        w.id.clone(),
                        describe(w.kind).to_string(),
                        format!("{} {}", w.last_name, w.first_name),
                        format!("{:?}", w.step),
                        w.error.clone().unwrap_or_default(),
                        w.updated_at.format("%Y-%m-%d %H:%M:%S").to_string(),
                    ]);
                }
                println!("{}", table);
                println!(
                    "{}",
                    "Продолжить: prorab workflows resume <id>".dimmed()
                );
            }
        }
        WorkflowsCommands::Resume { id, json } => {
            let result = ctx.clients.resume_workflow(&id).await;
            if json {
                let failed = result.is_err();
                output::envelope(&OperationResult::from(result))?;
                if failed {
                    ctx.shutdown().await;
                    exit(1);
                }
            } else {
                let workflow = result?;
                output::success(&format!(
                    "Операция {} ({}) завершена",
                    workflow.id,
                    describe(workflow.kind)
                ));
            }
        }
    }

    ctx.shutdown().await;
    Ok(())
}
