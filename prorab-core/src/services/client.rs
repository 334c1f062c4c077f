//! Client directory - listing, editing and cascading removal of clients
//!
//! Every client owns two ledger categories titled `"<last> <first>"`: the
//! project card (row 3) and the client card (row 1). Deleting a client removes
//! them in one batch, optionally together with their transactions; toggling
//! icon visibility flips `isVisible` on both. These multi-document workflows
//! are journaled so an interrupted run can be resumed.

use std::sync::Arc;

use chrono::{SecondsFormat, Utc};
use serde_json::json;

use crate::domain::client::category_title;
use crate::domain::result::{Error, Result};
use crate::domain::{
    Category, CategoryRow, Client, ClientStatus, NewClient, StatusFilter, Transaction,
    WorkflowKind, WorkflowRecord, WorkflowStep,
};
use crate::ports::document_store::{fields, to_fields};
use crate::ports::{collections, ContractArchive, DocumentStore, Query, UserAlert, WriteBatch};
use crate::services::alerts;
use crate::services::logging::{record, LogEvent, Logger};
use crate::services::workflow::WorkflowJournal;

/// Number of selectable years, starting with the current one
const YEAR_OPTIONS: i32 = 5;

/// Screen state of the client list
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ClientListView {
    pub clients: Vec<Client>,
    pub selected_year: i32,
    pub status_filter: StatusFilter,
    pub selected_client: Option<Client>,
    pub show_context_menu: bool,
    pub show_delete_modal: bool,
    pub loading: bool,
}

impl ClientListView {
    pub fn new(selected_year: i32) -> Self {
        Self {
            selected_year,
            ..Default::default()
        }
    }

    /// Clients matching the selected year and status
    pub fn visible(&self) -> Vec<&Client> {
        filtered_clients(&self.clients, self.selected_year, self.status_filter)
    }

    pub fn select(&mut self, client: Client) {
        self.selected_client = Some(client);
    }

    pub fn open_context_menu(&mut self, client: Client) {
        self.selected_client = Some(client);
        self.show_context_menu = true;
    }

    /// Open the delete confirmation; false without a selection
    pub fn request_delete(&mut self) -> bool {
        if self.selected_client.is_none() {
            return false;
        }
        self.show_context_menu = false;
        self.show_delete_modal = true;
        true
    }

    pub fn cancel_delete(&mut self) {
        self.show_delete_modal = false;
    }

    fn remove(&mut self, id: &str) {
        self.clients.retain(|c| c.id != id);
        self.show_delete_modal = false;
        self.selected_client = None;
    }

    fn set_icons_visible(&mut self, id: &str, visible: bool) {
        for client in self.clients.iter_mut().filter(|c| c.id == id) {
            client.is_icons_visible = visible;
        }
        if let Some(selected) = self.selected_client.as_mut().filter(|c| c.id == id) {
            selected.is_icons_visible = visible;
        }
    }
}

/// Clients of `year` whose status passes `status`
pub fn filtered_clients(clients: &[Client], year: i32, status: StatusFilter) -> Vec<&Client> {
    clients
        .iter()
        .filter(|c| c.year == year && status.matches(c.status))
        .collect()
}

/// Years offered by the year selector
pub fn year_options(current_year: i32) -> Vec<i32> {
    (current_year..current_year + YEAR_OPTIONS).collect()
}

pub struct ClientDirectory {
    store: Arc<dyn DocumentStore>,
    contracts: Arc<dyn ContractArchive>,
    alerts: Arc<dyn UserAlert>,
    journal: WorkflowJournal,
    logger: Logger,
}

impl ClientDirectory {
    pub fn new(
        store: Arc<dyn DocumentStore>,
        contracts: Arc<dyn ContractArchive>,
        alerts: Arc<dyn UserAlert>,
        logger: Logger,
    ) -> Self {
        let journal = WorkflowJournal::new(Arc::clone(&store), logger.clone());
        Self {
            store,
            contracts,
            alerts,
            journal,
            logger,
        }
    }

    pub fn journal(&self) -> &WorkflowJournal {
        &self.journal
    }

    /// Load all clients into the view, ordered by client number
    pub async fn fetch_clients(&self, view: &mut ClientListView) -> Vec<Client> {
        view.loading = true;
        let result = self.load_clients().await;
        view.loading = false;

        match result {
            Ok(clients) => {
                view.clients = clients.clone();
                clients
            }
            Err(e) => {
                self.report("clients_load_failed", None, &e, alerts::LOAD_CLIENTS_FAILED);
                Vec::new()
            }
        }
    }

    async fn load_clients(&self) -> Result<Vec<Client>> {
        let docs = self
            .store
            .query(&Query::collection(collections::CLIENTS).order_by("clientNumber"))
            .await?;

        let mut clients = Vec::with_capacity(docs.len());
        for doc in docs {
            match doc.decode::<Client>() {
                Ok(client) => clients.push(client),
                Err(e) => record(
                    &self.logger,
                    LogEvent::new("client_decode_failed")
                        .with_document(collections::CLIENTS, &doc.id)
                        .with_error(e.to_string()),
                ),
            }
        }
        Ok(clients)
    }

    /// Delete the selected client, its categories and their transactions
    pub async fn delete_with_history(&self, view: &mut ClientListView) -> bool {
        self.delete_selected(view, WorkflowKind::DeleteWithHistory).await
    }

    /// Delete the selected client and its categories, keeping transactions
    pub async fn delete_icon_only(&self, view: &mut ClientListView) -> bool {
        self.delete_selected(view, WorkflowKind::DeleteIconOnly).await
    }

    async fn delete_selected(&self, view: &mut ClientListView, kind: WorkflowKind) -> bool {
        let Some(client) = view.selected_client.clone() else {
            return false;
        };

        let mut workflow = self.journal.begin(kind, &client).await;
        match self.run_delete(&mut workflow).await {
            Ok(()) => {
                view.remove(&client.id);
                record(
                    &self.logger,
                    LogEvent::new("client_deleted").with_document(collections::CLIENTS, &client.id),
                );
                true
            }
            Err(e) => {
                self.journal.fail(&mut workflow, e.to_string()).await;
                self.report(
                    "client_delete_failed",
                    Some(&client.id),
                    &e,
                    alerts::DELETE_CLIENT_FAILED,
                );
                false
            }
        }
    }

    /// Flip icon visibility of `client` and its categories
    pub async fn toggle_visibility(&self, view: &mut ClientListView, client: &Client) -> bool {
        let visible = !client.is_icons_visible;
        match self.set_visibility(client, visible).await {
            Ok(()) => {
                view.set_icons_visible(&client.id, visible);
                true
            }
            Err(e) => {
                self.report(
                    "visibility_toggle_failed",
                    Some(&client.id),
                    &e,
                    alerts::VISIBILITY_FAILED,
                );
                false
            }
        }
    }

    /// Set icon visibility of `client` and its categories to `visible`
    pub async fn set_visibility(&self, client: &Client, visible: bool) -> Result<()> {
        let mut workflow = self.journal.begin(WorkflowKind::SetVisibility, client).await;
        workflow.visible = Some(visible);
        self.journal.save(&workflow).await;

        if let Err(e) = self.run_visibility(&mut workflow).await {
            self.journal.fail(&mut workflow, e.to_string()).await;
            return Err(e);
        }
        Ok(())
    }

    /// Create a client, or update `editing_id`, then reload the list
    pub async fn save_client(
        &self,
        view: &mut ClientListView,
        form: &NewClient,
        editing_id: Option<&str>,
    ) -> bool {
        if form.validate().is_err() {
            self.alerts.alert(alerts::CLIENT_FORM_INCOMPLETE);
            return false;
        }

        let result = match editing_id {
            Some(id) => self.update_client(id, form).await.map(|_| id.to_string()),
            None => self.create_client(form).await,
        };

        match result {
            Ok(id) => {
                record(
                    &self.logger,
                    LogEvent::new("client_saved").with_document(collections::CLIENTS, id),
                );
                self.fetch_clients(view).await;
                true
            }
            Err(e) => {
                self.report("client_save_failed", editing_id, &e, alerts::SAVE_CLIENT_FAILED);
                false
            }
        }
    }

    async fn create_client(&self, form: &NewClient) -> Result<String> {
        let mut data = to_fields(form)?;
        data.insert("status".into(), json!(form.status.unwrap_or(ClientStatus::Building)));
        data.insert("clientNumber".into(), json!(self.next_client_number().await?));
        data.insert("isIconsVisible".into(), json!(true));
        data.insert(
            "createdAt".into(),
            json!(Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)),
        );
        self.store.add(collections::CLIENTS, data).await
    }

    async fn update_client(&self, id: &str, form: &NewClient) -> Result<()> {
        let mut data = to_fields(form)?;
        match form.status {
            Some(status) => {
                data.insert("status".into(), json!(status));
            }
            None => {
                data.remove("status");
            }
        }
        self.store.update(collections::CLIENTS, id, data).await
    }

    async fn next_client_number(&self) -> Result<i64> {
        let docs = self
            .store
            .query(&Query::collection(collections::CLIENTS).order_by("clientNumber"))
            .await?;
        let max = docs
            .iter()
            .filter_map(|d| d.get("clientNumber").and_then(|v| v.as_i64()))
            .max()
            .unwrap_or(0);
        Ok(max + 1)
    }

    /// Set the status of the selected client, then reload the list
    pub async fn change_status(&self, view: &mut ClientListView, status: ClientStatus) -> bool {
        let Some(client) = view.selected_client.clone() else {
            return false;
        };

        let update = fields([("status", json!(status))]);
        match self.store.update(collections::CLIENTS, &client.id, update).await {
            Ok(()) => {
                self.fetch_clients(view).await;
                view.show_context_menu = false;
                true
            }
            Err(e) => {
                self.report("status_change_failed", Some(&client.id), &e, alerts::STATUS_FAILED);
                false
            }
        }
    }

    /// Workflows that stopped before completion
    pub async fn pending_workflows(&self) -> Result<Vec<WorkflowRecord>> {
        self.journal.pending().await
    }

    /// Run a stopped workflow from its last completed step
    pub async fn resume_workflow(&self, id: &str) -> Result<WorkflowRecord> {
        let mut workflow = self
            .journal
            .get(id)
            .await?
            .ok_or_else(|| Error::not_found(format!("workflow {}", id)))?;
        if workflow.is_completed() {
            return Ok(workflow);
        }

        let result = match workflow.kind {
            WorkflowKind::DeleteWithHistory | WorkflowKind::DeleteIconOnly => {
                self.run_delete(&mut workflow).await
            }
            WorkflowKind::SetVisibility => self.run_visibility(&mut workflow).await,
        };

        match result {
            Ok(()) => {
                record(
                    &self.logger,
                    LogEvent::new("workflow_resumed")
                        .with_document(collections::WORKFLOWS, &workflow.id),
                );
                Ok(workflow)
            }
            Err(e) => {
                self.journal.fail(&mut workflow, e.to_string()).await;
                Err(e)
            }
        }
    }

    async fn run_delete(&self, workflow: &mut WorkflowRecord) -> Result<()> {
        let batch = if workflow.has_passed(WorkflowStep::BatchCommitted) {
            None
        } else {
            Some(self.plan_deletion(workflow).await?)
        };

        if !workflow.has_passed(WorkflowStep::ContractsDeleted) {
            self.contracts
                .delete_client_contracts(&workflow.client_id)
                .await?;
            self.journal
                .advance(workflow, WorkflowStep::ContractsDeleted)
                .await;
        }

        if let Some(batch) = batch {
            self.store.commit(batch).await?;
            self.journal
                .advance(workflow, WorkflowStep::BatchCommitted)
                .await;
        }

        self.journal.advance(workflow, WorkflowStep::Completed).await;
        Ok(())
    }

    async fn plan_deletion(&self, workflow: &WorkflowRecord) -> Result<WriteBatch> {
        let mut batch = WriteBatch::new();
        batch.delete(collections::CLIENTS, &workflow.client_id);

        let title = category_title(&workflow.last_name, &workflow.first_name);
        let categories = self.linked_categories(&title).await?;
        for category in &categories {
            batch.delete(collections::CATEGORIES, &category.id);
        }

        if workflow.kind.includes_transactions() {
            for category in &categories {
                for transaction in self.transactions_of(category).await? {
                    batch.delete(collections::TRANSACTIONS, &transaction.id);
                }
            }
        }

        Ok(batch)
    }

    async fn run_visibility(&self, workflow: &mut WorkflowRecord) -> Result<()> {
        let visible = workflow
            .visible
            .ok_or_else(|| Error::validation("visibility workflow without a target value"))?;

        if !workflow.has_passed(WorkflowStep::ClientUpdated) {
            self.store
                .update(
                    collections::CLIENTS,
                    &workflow.client_id,
                    fields([("isIconsVisible", json!(visible))]),
                )
                .await?;
            self.journal
                .advance(workflow, WorkflowStep::ClientUpdated)
                .await;
        }

        if !workflow.has_passed(WorkflowStep::CategoriesUpdated) {
            let title = category_title(&workflow.last_name, &workflow.first_name);
            let mut batch = WriteBatch::new();
            for category in self.linked_categories(&title).await? {
                batch.update(
                    collections::CATEGORIES,
                    &category.id,
                    fields([("isVisible", json!(visible))]),
                );
            }
            self.store.commit(batch).await?;
            self.journal
                .advance(workflow, WorkflowStep::CategoriesUpdated)
                .await;
        }

        self.journal.advance(workflow, WorkflowStep::Completed).await;
        Ok(())
    }

    async fn transactions_of(&self, category: &Category) -> Result<Vec<Transaction>> {
        let query = Query::collection(collections::TRANSACTIONS)
            .where_eq("categoryId", category.id.as_str());
        self.store
            .query(&query)
            .await?
            .iter()
            .map(|doc| doc.decode())
            .collect()
    }

    /// Project and client cards titled `title`, queried concurrently
    async fn linked_categories(&self, title: &str) -> Result<Vec<Category>> {
        let by_row = |row: CategoryRow| {
            Query::collection(collections::CATEGORIES)
                .where_eq("title", title)
                .where_eq("row", row.number())
        };
        let [project, client] = CategoryRow::LINKED.map(by_row);

        let (projects, clients) =
            tokio::try_join!(self.store.query(&project), self.store.query(&client))?;
        projects.iter().chain(&clients).map(|doc| doc.decode()).collect()
    }

    fn report(&self, event: &str, client_id: Option<&str>, error: &Error, alert: &str) {
        let mut log_event = LogEvent::new(event).with_error(error.to_string());
        if let Some(id) = client_id {
            log_event = log_event.with_document(collections::CLIENTS, id);
        }
        record(&self.logger, log_event);
        self.alerts.alert(alert);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client(id: &str, year: i32, status: ClientStatus) -> Client {
        Client {
            id: id.to_string(),
            first_name: "Petr".to_string(),
            last_name: "Ivanov".to_string(),
            middle_name: String::new(),
            phone: String::new(),
            email: String::new(),
            address: String::new(),
            object_address: String::new(),
            construction_days: None,
            total_amount: None,
            client_number: None,
            year,
            status,
            is_icons_visible: true,
            created_at: None,
        }
    }

    #[test]
    fn test_filter_by_year_and_status() {
        let clients = vec![
            client("a", 2024, ClientStatus::Building),
            client("b", 2024, ClientStatus::Built),
            client("c", 2025, ClientStatus::Building),
        ];

        let all: Vec<&str> = filtered_clients(&clients, 2024, StatusFilter::All)
            .iter()
            .map(|c| c.id.as_str())
            .collect();
        assert_eq!(all, vec!["a", "b"]);

        let built = filtered_clients(&clients, 2024, StatusFilter::Only(ClientStatus::Built));
        assert_eq!(built.len(), 1);
        assert_eq!(built[0].id, "b");

        assert!(filtered_clients(&clients, 2023, StatusFilter::All).is_empty());
    }

    #[test]
    fn test_year_options() {
        assert_eq!(year_options(2024), vec![2024, 2025, 2026, 2027, 2028]);
    }

    #[test]
    fn test_delete_request_needs_selection() {
        let mut view = ClientListView::new(2024);
        assert!(!view.request_delete());
        assert!(!view.show_delete_modal);

        view.open_context_menu(client("a", 2024, ClientStatus::Deposit));
        assert!(view.show_context_menu);
        assert!(view.request_delete());
        assert!(view.show_delete_modal);
        assert!(!view.show_context_menu);

        view.cancel_delete();
        assert!(!view.show_delete_modal);
        assert!(view.selected_client.is_some());
    }

    #[test]
    fn test_view_visibility_update_reaches_selection() {
        let mut view = ClientListView::new(2024);
        let a = client("a", 2024, ClientStatus::Building);
        view.clients = vec![a.clone()];
        view.select(a);

        view.set_icons_visible("a", false);
        assert!(!view.clients[0].is_icons_visible);
        assert_eq!(
            view.selected_client.as_ref().map(|c| c.is_icons_visible),
            Some(false)
        );
    }
}
