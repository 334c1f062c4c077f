//! Prorab CLI - construction back office in your terminal

use std::process::ExitCode;

use anyhow::Result;
use clap::{Parser, Subcommand};

mod commands;
mod output;

use commands::{clients, demo, logs, notify, products, workflows};

/// Прораб - клиенты, карточки учёта и склад строительной компании
#[derive(Parser)]
#[command(name = "prorab", version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Клиенты
    Clients {
        #[command(subcommand)]
        command: clients::ClientsCommands,
    },

    /// Товары на складе
    Products {
        #[command(subcommand)]
        command: products::ProductsCommands,
    },

    /// Записать уведомление и отправить его в Telegram
    Notify {
        /// Заголовок уведомления
        title: String,
        /// Текст уведомления (без аргумента читается из stdin)
        message: Option<String>,
        /// Тип уведомления
        #[arg(long = "type", value_enum, default_value = "client")]
        kind: notify::Kind,
    },

    /// Прерванные операции с клиентами
    Workflows {
        #[command(subcommand)]
        command: workflows::WorkflowsCommands,
    },

    /// Демо-режим
    Demo {
        #[command(subcommand)]
        command: Option<demo::DemoCommands>,
    },

    /// Журнал событий приложения
    Logs {
        #[command(subcommand)]
        command: logs::LogsCommands,
    },
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            output::error(&format!("{:#}", e));
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Commands::Clients { command } => clients::run(command).await,
        Commands::Products { command } => products::run(command).await,
        Commands::Notify {
            title,
            message,
            kind,
        } => notify::run(title, message, kind).await,
        Commands::Workflows { command } => workflows::run(command).await,
        Commands::Demo { command } => demo::run(command).await,
        Commands::Logs { command } => logs::run(command),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_command_help_is_russian() {
        fn cyrillic(text: &str) -> bool {
            text.chars().any(|c| c.is_alphabetic() && !c.is_ascii())
        }

        let cli = Cli::command();
        for command in cli.get_subcommands().filter(|c| c.get_name() != "help") {
            let about = command.get_about().map(|a| a.to_string()).unwrap_or_default();
            assert!(cyrillic(&about), "{}: {}", command.get_name(), about);

            for nested in command.get_subcommands().filter(|c| c.get_name() != "help") {
                let about = nested.get_about().map(|a| a.to_string()).unwrap_or_default();
                assert!(cyrillic(&about), "{} {}: {}", command.get_name(), nested.get_name(), about);
            }
        }
    }
}
