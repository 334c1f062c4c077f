//! Demo command - manage demo mode

use anyhow::Result;
use clap::Subcommand;
use colored::Colorize;

use super::{get_data_dir, get_logger, log_event};
use prorab_core::services::DemoService;
use prorab_core::LogEvent;

#[derive(Subcommand)]
pub enum DemoCommands {
    /// Включить демо-режим с новыми примерами данных
    #[command(name = "on")]
    On,
    /// Выключить демо-режим
    #[command(name = "off")]
    Off {
        /// Также удалить демо-базу
        #[arg(long)]
        clean: bool,
    },
    /// Состояние демо-режима
    Status,
}

pub async fn run(command: Option<DemoCommands>) -> Result<()> {
    let data_dir = get_data_dir()?;
    std::fs::create_dir_all(&data_dir)?;
    let demo_service = DemoService::new(&data_dir);
    let logger = get_logger();

    match command {
        Some(DemoCommands::On) => {
            let written = demo_service.enable().await?;
            log_event(&logger, LogEvent::new("demo_enabled").with_command("demo on"));
            println!("{}", "Демо-режим включён".green());
            println!(
                "Записано документов: {}. Клиенты демо-режима: 'prorab clients list'.",
                written
            );
        }
        Some(DemoCommands::Off { clean }) => {
            demo_service.disable(clean)?;
            log_event(&logger, LogEvent::new("demo_disabled").with_command("demo off"));
            println!("{}", "Демо-режим выключен".yellow());
        }
        Some(DemoCommands::Status) | None => {
            if demo_service.is_enabled()? {
                println!("Демо-режим {}", "ВКЛ".green());
            } else {
                println!("Демо-режим {}", "ВЫКЛ".yellow());
            }
        }
    }
    Ok(())
}
