use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::FinError;
use crate::transaction::TransactionType;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CategoryId(pub i64);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CategoryKind {
    Expense,
    Income,
    Tax,
    Payroll,
}

impl CategoryKind {
    pub fn as_str(self) -> &'static str {
        match self {
            CategoryKind::Expense => "expense",
            CategoryKind::Income => "income",
            CategoryKind::Tax => "tax",
            CategoryKind::Payroll => "payroll",
        }
    }

    /// Category kinds offered when entering a transaction of type `ty`.
    pub fn for_transaction(ty: TransactionType) -> &'static [CategoryKind] {
        match ty {
            TransactionType::Income => &[CategoryKind::Income],
            _ => &[CategoryKind::Expense, CategoryKind::Tax, CategoryKind::Payroll],
        }
    }
}

impl fmt::Display for CategoryKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CategoryKind {
    type Err = FinError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "expense" => Ok(CategoryKind::Expense),
            "income" => Ok(CategoryKind::Income),
            "tax" => Ok(CategoryKind::Tax),
            "payroll" => Ok(CategoryKind::Payroll),
            other => Err(FinError::unknown("category kind", other)),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Category {
    pub id: CategoryId,
    pub name: String,
    pub parent_id: Option<CategoryId>,
    pub kind: CategoryKind,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewCategory {
    pub name: String,
    #[serde(default)]
    pub parent_id: Option<CategoryId>,
    #[serde(default = "default_kind")]
    pub kind: CategoryKind,
}

fn default_kind() -> CategoryKind {
    CategoryKind::Expense
}

impl NewCategory {
    pub fn validate(mut self) -> Result<Self, FinError> {
        self.name = self.name.trim().to_string();
        if self.name.is_empty() {
            return Err(FinError::MissingField("name"));
        }
        Ok(self)
    }
}

pub const DEFAULT_CATEGORIES: &[(&str, CategoryKind)] = &[
    ("Energia Elétrica", CategoryKind::Expense),
    ("Água", CategoryKind::Expense),
    ("Frete", CategoryKind::Expense),
    ("Vendas", CategoryKind::Income),
    ("ICMS", CategoryKind::Tax),
    ("Folha - Salários", CategoryKind::Payroll),
];
