use serde::{Deserialize, Serialize};

use crate::account::non_blank;
use crate::error::FinError;

/// Which registry a [`Party`] belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PartyKind {
    Client,
    Supplier,
}

impl PartyKind {
    pub fn table(self) -> &'static str {
        match self {
            PartyKind::Client => "clients",
            PartyKind::Supplier => "suppliers",
        }
    }
}

/// A client or supplier.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Party {
    pub id: i64,
    pub name: String,
    /// CNPJ/CPF or any tax document.
    pub document: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewParty {
    pub name: String,
    #[serde(default)]
    pub document: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
}

impl NewParty {
    pub fn validate(mut self) -> Result<Self, FinError> {
        self.name = self.name.trim().to_string();
        if self.name.is_empty() {
            return Err(FinError::MissingField("name"));
        }
        self.document = non_blank(self.document);
        self.email = non_blank(self.email).map(|e| e.to_lowercase());
        self.phone = non_blank(self.phone);
        Ok(self)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Sector {
    pub id: i64,
    pub name: String,
}
