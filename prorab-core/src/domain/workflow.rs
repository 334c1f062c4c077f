//! Workflow journal records
//!
//! Client deletion and visibility changes span several writes that the
//! document store cannot commit together. Each run is journaled so a run that
//! stopped halfway can be found and resumed.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum WorkflowKind {
    /// Client, linked categories and their transactions
    DeleteWithHistory,
    /// Client and linked categories; transactions are kept
    DeleteIconOnly,
    /// Icon visibility of a client and its linked categories
    SetVisibility,
}

impl WorkflowKind {
    /// Steps in execution order, `Started` first and `Completed` last
    pub fn steps(&self) -> &'static [WorkflowStep] {
        match self {
            Self::DeleteWithHistory | Self::DeleteIconOnly => &[
                WorkflowStep::Started,
                WorkflowStep::ContractsDeleted,
                WorkflowStep::BatchCommitted,
                WorkflowStep::Completed,
            ],
            Self::SetVisibility => &[
                WorkflowStep::Started,
                WorkflowStep::ClientUpdated,
                WorkflowStep::CategoriesUpdated,
                WorkflowStep::Completed,
            ],
        }
    }

    pub fn includes_transactions(&self) -> bool {
        matches!(self, Self::DeleteWithHistory)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum WorkflowStep {
    Started,
    ContractsDeleted,
    BatchCommitted,
    ClientUpdated,
    CategoriesUpdated,
    Completed,
}

/// Journal entry of one workflow run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkflowRecord {
    pub id: String,
    pub kind: WorkflowKind,
    pub client_id: String,
    pub first_name: String,
    pub last_name: String,
    /// Target value of a visibility change
    #[serde(default)]
    pub visible: Option<bool>,
    /// Last step that completed
    pub step: WorkflowStep,
    #[serde(default)]
    pub error: Option<String>,
    #[serde(with = "millis")]
    pub created_at: DateTime<Utc>,
    #[serde(with = "millis")]
    pub updated_at: DateTime<Utc>,
}

/// RFC 3339 with exactly three fraction digits, so stored values order as strings
mod millis {
    use chrono::{DateTime, SecondsFormat, Utc};
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(ts: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&ts.to_rfc3339_opts(SecondsFormat::Millis, true))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<DateTime<Utc>, D::Error> {
        DateTime::<Utc>::deserialize(deserializer)
    }
}

impl WorkflowRecord {
    pub fn new(
        id: impl Into<String>,
        kind: WorkflowKind,
        client_id: impl Into<String>,
        first_name: impl Into<String>,
        last_name: impl Into<String>,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: id.into(),
            kind,
            client_id: client_id.into(),
            first_name: first_name.into(),
            last_name: last_name.into(),
            visible: None,
            step: WorkflowStep::Started,
            error: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Whether `step` already completed in this run
    pub fn has_passed(&self, step: WorkflowStep) -> bool {
        let steps = self.kind.steps();
        let position = |s: WorkflowStep| steps.iter().position(|x| *x == s);
        match (position(self.step), position(step)) {
            (Some(current), Some(wanted)) => current >= wanted,
            _ => false,
        }
    }

    pub fn is_completed(&self) -> bool {
        self.step == WorkflowStep::Completed
    }

    /// Record a completed step, clearing any earlier error
    pub fn advance(&mut self, step: WorkflowStep) {
        self.step = step;
        self.error = None;
        self.updated_at = Utc::now();
    }

    pub fn fail(&mut self, error: impl Into<String>) {
        self.error = Some(error.into());
        self.updated_at = Utc::now();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_step_progress() {
        let mut record =
            WorkflowRecord::new("w1", WorkflowKind::DeleteIconOnly, "c1", "Petr", "Ivanov");
        assert!(record.has_passed(WorkflowStep::Started));
        assert!(!record.has_passed(WorkflowStep::ContractsDeleted));

        record.advance(WorkflowStep::ContractsDeleted);
        assert!(record.has_passed(WorkflowStep::ContractsDeleted));
        assert!(!record.has_passed(WorkflowStep::BatchCommitted));
        assert!(!record.is_completed());
    }

    #[test]
    fn test_foreign_steps_never_pass() {
        let record = WorkflowRecord::new("w2", WorkflowKind::SetVisibility, "c1", "Petr", "Ivanov");
        assert!(!record.has_passed(WorkflowStep::BatchCommitted));
    }

    #[test]
    fn test_advance_clears_error() {
        let mut record =
            WorkflowRecord::new("w3", WorkflowKind::DeleteWithHistory, "c1", "Petr", "Ivanov");
        record.fail("batch rejected");
        assert!(record.error.is_some());
        record.advance(WorkflowStep::BatchCommitted);
        assert!(record.error.is_none());
    }

    #[test]
    fn test_timestamps_sort_as_strings() {
        use chrono::{Duration, TimeZone};

        let whole = Utc.with_ymd_and_hms(2024, 5, 1, 10, 0, 0).unwrap();
        let mut first = WorkflowRecord::new("w4", WorkflowKind::SetVisibility, "c1", "Petr", "Ivanov");
        let mut second = first.clone();
        first.created_at = whole;
        second.created_at = whole + Duration::milliseconds(250);

        let stamp = |r: &WorkflowRecord| serde_json::to_value(r).unwrap()["createdAt"].clone();
        assert_eq!(stamp(&first), serde_json::json!("2024-05-01T10:00:00.000Z"));
        assert_eq!(stamp(&second), serde_json::json!("2024-05-01T10:00:00.250Z"));

        let decoded: WorkflowRecord = serde_json::from_value(serde_json::to_value(&second).unwrap()).unwrap();
        assert_eq!(decoded.created_at, second.created_at);
    }
}
