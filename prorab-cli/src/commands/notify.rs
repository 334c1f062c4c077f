//! Notify command - record a notification and push it to the chat relay

use std::io::{self, Read};
use std::process::exit;

use anyhow::{bail, Result};
use clap::ValueEnum;

use prorab_core::domain::NotificationType;
use prorab_core::NotificationData;

use super::get_context;
use crate::output;

#[derive(Clone, Copy, ValueEnum)]
pub enum Kind {
    Inventory,
    Client,
    Payment,
    Estimate,
    Construction,
}

impl From<Kind> for NotificationType {
    fn from(kind: Kind) -> Self {
        match kind {
            Kind::Inventory => NotificationType::Inventory,
            Kind::Client => NotificationType::Client,
            Kind::Payment => NotificationType::Payment,
            Kind::Estimate => NotificationType::Estimate,
            Kind::Construction => NotificationType::Construction,
        }
    }
}

pub async fn run(title: String, message: Option<String>, kind: Kind) -> Result<()> {
    let mut ctx = get_context("notify")?;

    // Message from argument or stdin
    let message = match message {
        Some(m) => m,
        None if atty::isnt(atty::Stream::Stdin) => {
            let mut buffer = String::new();
            io::stdin().read_to_string(&mut buffer)?;
            buffer.trim().to_string()
        }
        None => String::new(),
    };
    if title.trim().is_empty() || message.is_empty() {
        bail!("Укажите заголовок и текст (аргументом или через stdin).");
    }

    let data = NotificationData::new(title, message, kind.into());
    let sent = ctx.notifications.send(&data).await;
    let relayed = ctx.notifications.outbox().is_enabled();
    ctx.shutdown().await;

    if !sent {
        output::error("Не удалось записать уведомление");
        exit(1);
    }

    output::success("Уведомление записано");
    if relayed {
        let stats = ctx.notifications.outbox().stats();
        if stats.failed() > 0 {
            output::warning("Не удалось доставить в Telegram; см. `prorab logs list --errors`");
        } else {
            output::info("Доставлено в Telegram");
        }
    }
    Ok(())
}
