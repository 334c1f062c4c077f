//! Clients command - list, edit and remove clients

use std::process::exit;

use anyhow::{bail, Result};
use chrono::{Datelike, Utc};
use clap::{Args, Subcommand};
use colored::Colorize;
use dialoguer::{Confirm, Input, Select};
use serde::Serialize;

use prorab_core::domain::product::format_money;
use prorab_core::services::client::year_options;
use prorab_core::services::{ClientDirectory, ClientListView};
use prorab_core::{Client, ClientStatus, NewClient, StatusFilter};

use super::{get_context, spinner};
use crate::output;

#[derive(Subcommand)]
pub enum ClientsCommands {
    /// Клиенты за год
    List {
        /// Год (по умолчанию текущий)
        #[arg(long)]
        year: Option<i32>,
        /// Фильтр статуса: all, building, deposit или built
        #[arg(long, default_value = "all")]
        status: StatusFilter,
        /// Вывод в JSON
        #[arg(long)]
        json: bool,
    },
    /// Добавить клиента
    Add(ClientFields),
    /// Изменить клиента; не указанные поля не меняются
    Edit {
        id: String,
        #[command(flatten)]
        fields: ClientFields,
    },
    /// Статус строительства клиента
    Status { id: String, status: ClientStatus },
    /// Показать или скрыть иконки клиента в учёте
    ToggleIcons { id: String },
    /// Удалить клиента и его карточки
    Delete {
        id: String,
        /// Удалить и все транзакции по карточкам клиента
        #[arg(long, conflicts_with = "icon_only")]
        history: bool,
        /// Оставить транзакции, удалить только карточки
        #[arg(long)]
        icon_only: bool,
        /// Без подтверждения
        #[arg(long, short)]
        force: bool,
    },
}

#[derive(Args)]
pub struct ClientFields {
    #[arg(long)]
    last_name: Option<String>,
    #[arg(long)]
    first_name: Option<String>,
    #[arg(long)]
    middle_name: Option<String>,
    #[arg(long)]
    phone: Option<String>,
    #[arg(long)]
    email: Option<String>,
    #[arg(long)]
    address: Option<String>,
    #[arg(long)]
    object_address: Option<String>,
    /// Срок строительства в днях
    #[arg(long)]
    construction_days: Option<i64>,
    /// Сумма договора
    #[arg(long)]
    total_amount: Option<f64>,
    #[arg(long)]
    year: Option<i32>,
    #[arg(long)]
    status: Option<ClientStatus>,
}

impl ClientFields {
    fn apply(self, form: &mut NewClient) {
        let ClientFields {
            last_name,
            first_name,
            middle_name,
            phone,
            email,
            address,
            object_address,
            construction_days,
            total_amount,
            year,
            status,
        } = self;

        if let Some(v) = last_name {
            form.last_name = v;
        }
        if let Some(v) = first_name {
            form.first_name = v;
        }
        if let Some(v) = middle_name {
            form.middle_name = v;
        }
        if let Some(v) = phone {
            form.phone = v;
        }
        if let Some(v) = email {
            form.email = v;
        }
        if let Some(v) = address {
            form.address = v;
        }
        if let Some(v) = object_address {
            form.object_address = v;
        }
        if construction_days.is_some() {
            form.construction_days = construction_days;
        }
        if total_amount.is_some() {
            form.total_amount = total_amount;
        }
        if let Some(v) = year {
            form.year = v;
        }
        if status.is_some() {
            form.status = status;
        }
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ClientListing<'a> {
    year: i32,
    status: String,
    years: Vec<i32>,
    clients: Vec<&'a Client>,
}

pub async fn run(command: ClientsCommands) -> Result<()> {
    let mut ctx = get_context("clients")?;
    let directory = &ctx.clients;
    let mut view = ClientListView::new(Utc::now().year());

    let ok = match command {
        ClientsCommands::List { year, status, json } => {
            if let Some(year) = year {
                view.selected_year = year;
            }
            view.status_filter = status;
            load(directory, &mut view).await;
            print_list(&view, json)?;
            true
        }
        ClientsCommands::Add(fields) => {
            let mut form = NewClient {
                year: view.selected_year,
                ..Default::default()
            };
            fields.apply(&mut form);
            prompt_names(&mut form)?;
            let saved = directory.save_client(&mut view, &form, None).await;
            if saved {
                output::success(&format!("Клиент {} {} добавлен", form.last_name, form.first_name));
            }
            saved
        }
        ClientsCommands::Edit { id, fields } => {
            let client = find(directory, &mut view, &id).await?;
            let mut form = NewClient::from_client(&client);
            fields.apply(&mut form);
            let saved = directory.save_client(&mut view, &form, Some(&id)).await;
            if saved {
                output::success("Клиент изменён");
            }
            saved
        }
        ClientsCommands::Status { id, status } => {
            let client = find(directory, &mut view, &id).await?;
            view.open_context_menu(client);
            let changed = directory.change_status(&mut view, status).await;
            if changed {
                output::success(&format!("Статус: {}", status.label()));
            }
            changed
        }
        ClientsCommands::ToggleIcons { id } => {
            let client = find(directory, &mut view, &id).await?;
            let toggled = directory.toggle_visibility(&mut view, &client).await;
            if toggled {
                let state = if client.is_icons_visible { "скрыты" } else { "показаны" };
                output::success(&format!("Иконки {}", state));
            }
            toggled
        }
        ClientsCommands::Delete {
            id,
            history,
            icon_only,
            force,
        } => {
            let client = find(directory, &mut view, &id).await?;
            view.open_context_menu(client.clone());
            view.request_delete();
            delete(directory, &mut view, &client, history, icon_only, force).await?
        }
    };

    ctx.shutdown().await;
    if !ok {
        exit(1);
    }
    Ok(())
}

async fn load(directory: &ClientDirectory, view: &mut ClientListView) -> Vec<Client> {
    let spinner = spinner("Загрузка клиентов...");
    let clients = directory.fetch_clients(view).await;
    spinner.finish_and_clear();
    clients
}

async fn find(directory: &ClientDirectory, view: &mut ClientListView, id: &str) -> Result<Client> {
    match load(directory, view).await.into_iter().find(|c| c.id == id) {
        Some(client) => Ok(client),
        None => bail!("Клиент '{}' не найден", id),
    }
}

fn prompt_names(form: &mut NewClient) -> Result<()> {
    if form.last_name.trim().is_empty() {
        form.last_name = Input::new().with_prompt("Фамилия").interact_text()?;
    }
    if form.first_name.trim().is_empty() {
        form.first_name = Input::new().with_prompt("Имя").interact_text()?;
    }
    Ok(())
}

async fn delete(
    directory: &ClientDirectory,
    view: &mut ClientListView,
    client: &Client,
    history: bool,
    icon_only: bool,
    force: bool,
) -> Result<bool> {
    let with_history = if history || icon_only {
        history
    } else if force {
        bail!("С --force укажите --history или --icon-only");
    } else {
        let choice = Select::new()
            .with_prompt(format!(
                "Удалить клиента {} {}?",
                client.last_name, client.first_name
            ))
            .items(&["Удалить только иконку", "Удалить с историей транзакций"])
            .default(0)
            .interact()?;
        choice == 1
    };

    if !force {
        if with_history {
            output::warning("Транзакции по карточкам клиента тоже будут удалены.");
        }
        if !Confirm::new()
            .with_prompt("Вы уверены?")
            .default(false)
            .interact()?
        {
            view.cancel_delete();
            println!("{}", "Отменено".dimmed());
            return Ok(true);
        }
    }

    let deleted = if with_history {
        directory.delete_with_history(view).await
    } else {
        directory.delete_icon_only(view).await
    };
    if deleted {
        output::success(&format!(
            "Клиент {} {} удалён",
            client.last_name, client.first_name
        ));
    }
    Ok(deleted)
}

fn print_list(view: &ClientListView, json: bool) -> Result<()> {
    let visible = view.visible();

    if json {
        return output::json(&ClientListing {
            year: view.selected_year,
            status: view.status_filter.to_string(),
            years: year_options(Utc::now().year()),
            clients: visible,
        });
    }

    println!(
        "{} {} ({})",
        "Клиенты".bold(),
        view.selected_year,
        view.status_filter
    );

    if visible.is_empty() {
        println!("Клиенты не найдены.");
        return Ok(());
    }

    let mut table = output::create_table();
    table.set_header(vec!["№", "Клиент", "Телефон", "Объект", "Сумма", "Статус", "Иконки", "ID"]);
    for client in visible {
        table.add_row(vec![
            client.client_number.map(|n| n.to_string()).unwrap_or_default(),
            format!("{} {} {}", client.last_name, client.first_name, client.middle_name)
                .trim_end()
                .to_string(),
            client.phone.clone(),
            client.object_address.clone(),
            format_money(client.total_amount),
            client.status.label().to_string(),
            if client.is_icons_visible { "✓" } else { "·" }.to_string(),
            client.id.clone(),
        ]);
    }
    println!("{}", table);
    Ok(())
}
