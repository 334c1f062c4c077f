//! Workflow journal - step records of multi-document client workflows
//!
//! A record is written when a workflow starts and after every completed
//! step, and removed once the workflow completes, so the collection only
//! holds runs that can still be resumed. Journal writes are best effort: a
//! failure is logged and the workflow carries on.

use std::sync::Arc;

use uuid::Uuid;

use crate::domain::result::{Error, Result};
use crate::domain::{Client, WorkflowKind, WorkflowRecord, WorkflowStep};
use crate::ports::document_store::to_fields;
use crate::ports::{collections, DocumentStore, Query};
use crate::services::logging::{record, LogEvent, Logger};

pub struct WorkflowJournal {
    store: Arc<dyn DocumentStore>,
    logger: Logger,
}

impl WorkflowJournal {
    pub fn new(store: Arc<dyn DocumentStore>, logger: Logger) -> Self {
        Self { store, logger }
    }

    /// Open a record for a workflow on `client`
    pub async fn begin(&self, kind: WorkflowKind, client: &Client) -> WorkflowRecord {
        let record = WorkflowRecord::new(
            Uuid::new_v4().to_string(),
            kind,
            client.id.clone(),
            client.first_name.clone(),
            client.last_name.clone(),
        );
        self.save(&record).await;
        record
    }

    /// Mark `step` as done; a completed record is removed
    pub async fn advance(&self, record: &mut WorkflowRecord, step: WorkflowStep) {
        record.advance(step);
        if record.is_completed() {
            self.close(record).await;
        } else {
            self.save(record).await;
        }
    }

    async fn close(&self, record: &WorkflowRecord) {
        if let Err(e) = self.store.delete(collections::WORKFLOWS, &record.id).await {
            record_failure(&self.logger, &record.id, &e);
            // A leftover record must at least read as completed
            self.save(record).await;
        }
    }

    /// Keep the step, remember the error
    pub async fn fail(&self, record: &mut WorkflowRecord, error: impl Into<String>) {
        record.fail(error);
        self.save(record).await;
    }

    pub async fn save(&self, record: &WorkflowRecord) {
        let result = match to_fields(record) {
            Ok(fields) => self.store.set(collections::WORKFLOWS, &record.id, fields).await,
            Err(e) => Err(e),
        };
        if let Err(e) = result {
            record_failure(&self.logger, &record.id, &e);
        }
    }

    pub async fn get(&self, id: &str) -> Result<Option<WorkflowRecord>> {
        match self.store.get(collections::WORKFLOWS, id).await? {
            Some(doc) => Ok(Some(doc.decode()?)),
            None => Ok(None),
        }
    }

    /// Records that have not reached `completed`, oldest first. Completed
    /// records only remain when their removal failed.
    pub async fn pending(&self) -> Result<Vec<WorkflowRecord>> {
        let docs = self
            .store
            .query(&Query::collection(collections::WORKFLOWS).order_by("createdAt"))
            .await?;

        let mut pending = Vec::new();
        for doc in docs {
            match doc.decode::<WorkflowRecord>() {
                Ok(record) if !record.is_completed() => pending.push(record),
                Ok(_) => {}
                Err(e) => record_failure(&self.logger, &doc.id, &e),
            }
        }
        Ok(pending)
    }
}

fn record_failure(logger: &Logger, id: &str, error: &Error) {
    record(
        logger,
        LogEvent::new("workflow_journal_failed")
            .with_document(collections::WORKFLOWS, id)
            .with_error(error.to_string()),
    );
}
