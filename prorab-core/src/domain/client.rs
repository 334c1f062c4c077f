//! Client domain model

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::result::{Error, Result};

/// Construction status of a client's object
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ClientStatus {
    Building,
    Deposit,
    Built,
}

impl ClientStatus {
    pub const ALL: [ClientStatus; 3] = [Self::Building, Self::Deposit, Self::Built];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Building => "building",
            Self::Deposit => "deposit",
            Self::Built => "built",
        }
    }

    /// Label shown to the user
    pub fn label(&self) -> &'static str {
        match self {
            Self::Building => "Строим",
            Self::Deposit => "Задаток",
            Self::Built => "Построено",
        }
    }
}

impl fmt::Display for ClientStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ClientStatus {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "building" => Ok(Self::Building),
            "deposit" => Ok(Self::Deposit),
            "built" => Ok(Self::Built),
            other => Err(Error::validation(format!("unknown client status: {}", other))),
        }
    }
}

/// Status selector of the client list. Matching is case-sensitive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StatusFilter {
    #[default]
    All,
    Only(ClientStatus),
}

impl StatusFilter {
    pub fn matches(&self, status: ClientStatus) -> bool {
        match self {
            Self::All => true,
            Self::Only(wanted) => *wanted == status,
        }
    }
}

impl FromStr for StatusFilter {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        if s == "all" {
            Ok(Self::All)
        } else {
            s.parse().map(Self::Only)
        }
    }
}

impl fmt::Display for StatusFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::All => f.write_str("all"),
            Self::Only(status) => status.fmt(f),
        }
    }
}

fn default_true() -> bool {
    true
}

/// A customer of the company, one card per construction object
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Client {
    pub id: String,
    pub first_name: String,
    pub last_name: String,
    #[serde(default)]
    pub middle_name: String,
    #[serde(default)]
    pub phone: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub address: String,
    #[serde(default)]
    pub object_address: String,
    #[serde(default)]
    pub construction_days: Option<i64>,
    #[serde(default)]
    pub total_amount: Option<f64>,
    /// Ordering key of the client list
    #[serde(default)]
    pub client_number: Option<i64>,
    pub year: i32,
    pub status: ClientStatus,
    /// Missing on older documents, treated as visible
    #[serde(default = "default_true")]
    pub is_icons_visible: bool,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

impl Client {
    /// Title of the ledger categories linked to this client.
    ///
    /// Categories carry no client reference; they are found by this exact
    /// string, so renaming a client detaches its categories.
    pub fn category_title(&self) -> String {
        category_title(&self.last_name, &self.first_name)
    }
}

/// `"<lastName> <firstName>"`
pub fn category_title(last_name: &str, first_name: &str) -> String {
    format!("{} {}", last_name, first_name)
}

/// Form data for creating or editing a client
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewClient {
    pub first_name: String,
    pub last_name: String,
    pub middle_name: String,
    pub phone: String,
    pub email: String,
    pub address: String,
    pub object_address: String,
    pub construction_days: Option<i64>,
    pub total_amount: Option<f64>,
    pub year: i32,
    pub status: Option<ClientStatus>,
}

impl NewClient {
    /// Prefill the form from an existing client (edit mode)
    pub fn from_client(client: &Client) -> Self {
        Self {
            first_name: client.first_name.clone(),
            last_name: client.last_name.clone(),
            middle_name: client.middle_name.clone(),
            phone: client.phone.clone(),
            email: client.email.clone(),
            address: client.address.clone(),
            object_address: client.object_address.clone(),
            construction_days: client.construction_days,
            total_amount: client.total_amount,
            year: client.year,
            status: Some(client.status),
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.last_name.trim().is_empty() {
            return Err(Error::validation("last name cannot be empty"));
        }
        if self.first_name.trim().is_empty() {
            return Err(Error::validation("first name cannot be empty"));
        }
        if self.year <= 0 {
            return Err(Error::validation("year must be set"));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_filter_parsing() {
        assert_eq!("all".parse::<StatusFilter>().unwrap(), StatusFilter::All);
        assert_eq!(
            "built".parse::<StatusFilter>().unwrap(),
            StatusFilter::Only(ClientStatus::Built)
        );
        assert!("Built".parse::<StatusFilter>().is_err());
    }

    #[test]
    fn test_status_filter_matches() {
        assert!(StatusFilter::All.matches(ClientStatus::Deposit));
        assert!(StatusFilter::Only(ClientStatus::Deposit).matches(ClientStatus::Deposit));
        assert!(!StatusFilter::Only(ClientStatus::Built).matches(ClientStatus::Building));
    }

    #[test]
    fn test_category_title_is_last_then_first() {
        assert_eq!(category_title("Ivanov", "Petr"), "Ivanov Petr");
    }

    #[test]
    fn test_icons_visible_defaults_to_true() {
        let client: Client = serde_json::from_value(serde_json::json!({
            "id": "c1",
            "firstName": "Petr",
            "lastName": "Ivanov",
            "year": 2024,
            "status": "building"
        }))
        .unwrap();
        assert!(client.is_icons_visible);
        assert_eq!(client.category_title(), "Ivanov Petr");
    }

    #[test]
    fn test_new_client_validation() {
        let mut form = NewClient {
            first_name: "Petr".to_string(),
            last_name: "Ivanov".to_string(),
            year: 2024,
            ..Default::default()
        };
        assert!(form.validate().is_ok());

        form.last_name = "  ".to_string();
        assert!(form.validate().is_err());
    }
}
