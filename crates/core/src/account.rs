use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::FinError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AccountId(pub i64);

impl fmt::Display for AccountId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AccountKind {
    Bank,
    Cash,
    Card,
}

impl AccountKind {
    pub fn as_str(self) -> &'static str {
        match self {
            AccountKind::Bank => "bank",
            AccountKind::Cash => "cash",
            AccountKind::Card => "card",
        }
    }
}

impl fmt::Display for AccountKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AccountKind {
    type Err = FinError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "bank" => Ok(AccountKind::Bank),
            "cash" => Ok(AccountKind::Cash),
            "card" => Ok(AccountKind::Card),
            other => Err(FinError::unknown("account kind", other)),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Account {
    pub id: AccountId,
    pub name: String,
    pub kind: AccountKind,
    pub institution: Option<String>,
    pub number: Option<String>,
}

impl Account {
    /// `"Caixa (cash)"`, the label used in account pickers.
    pub fn label(&self) -> String {
        format!("{} ({})", self.name, self.kind)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewAccount {
    pub name: String,
    pub kind: AccountKind,
    #[serde(default)]
    pub institution: Option<String>,
    #[serde(default)]
    pub number: Option<String>,
}

impl NewAccount {
    pub fn new(name: &str, kind: AccountKind) -> Self {
        NewAccount {
            name: name.to_string(),
            kind,
            institution: None,
            number: None,
        }
    }

    pub fn validate(mut self) -> Result<Self, FinError> {
        self.name = self.name.trim().to_string();
        if self.name.is_empty() {
            return Err(FinError::MissingField("name"));
        }
        self.institution = non_blank(self.institution);
        self.number = non_blank(self.number);
        Ok(self)
    }
}

pub(crate) fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}

/// Accounts created on first start: (name, kind, institution, number).
pub const DEFAULT_ACCOUNTS: &[(&str, AccountKind, &str, &str)] = &[
    ("Conta Corrente Principal", AccountKind::Bank, "Banco Exemplo", "0001-1"),
    ("Caixa", AccountKind::Cash, "", ""),
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kind_round_trips_through_text() {
        for kind in [AccountKind::Bank, AccountKind::Cash, AccountKind::Card] {
            assert_eq!(kind.as_str().parse::<AccountKind>().unwrap(), kind);
        }
        assert!("savings".parse::<AccountKind>().is_err());
    }

    #[test]
    fn validate_trims_and_requires_name() {
        let acc = NewAccount {
            name: "  Nubank ".into(),
            kind: AccountKind::Card,
            institution: Some("   ".into()),
            number: Some(" 1234 ".into()),
        }
        .validate()
        .unwrap();
        assert_eq!(acc.name, "Nubank");
        assert_eq!(acc.institution, None);
        assert_eq!(acc.number.as_deref(), Some("1234"));

        assert_eq!(
            NewAccount::new("  ", AccountKind::Cash).validate().unwrap_err(),
            FinError::MissingField("name")
        );
    }

    #[test]
    fn label_includes_kind() {
        let acc = Account {
            id: AccountId(2),
            name: "Caixa".into(),
            kind: AccountKind::Cash,
            institution: None,
            number: None,
        };
        assert_eq!(acc.label(), "Caixa (cash)");
    }
}
