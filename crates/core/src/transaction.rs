use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::account::{non_blank, AccountId};
use crate::category::CategoryId;
use crate::error::FinError;
use crate::money::{deserialize_amount, Money};
use crate::period::DateRange;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TransactionId(pub i64);

impl fmt::Display for TransactionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransactionType {
    Expense,
    Income,
    Transfer,
    Tax,
    Payroll,
    Card,
}

impl TransactionType {
    pub const ALL: [TransactionType; 6] = [
        TransactionType::Income,
        TransactionType::Expense,
        TransactionType::Tax,
        TransactionType::Payroll,
        TransactionType::Card,
        TransactionType::Transfer,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            TransactionType::Expense => "expense",
            TransactionType::Income => "income",
            TransactionType::Transfer => "transfer",
            TransactionType::Tax => "tax",
            TransactionType::Payroll => "payroll",
            TransactionType::Card => "card",
        }
    }

    /// Types counted as expenses in the KPI totals. Transfers are neither.
    pub fn is_outflow(self) -> bool {
        matches!(
            self,
            TransactionType::Expense
                | TransactionType::Tax
                | TransactionType::Payroll
                | TransactionType::Card
        )
    }

    pub fn default_status(self) -> TransactionStatus {
        match self {
            TransactionType::Income => TransactionStatus::Planned,
            _ => TransactionStatus::Paid,
        }
    }
}

impl fmt::Display for TransactionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TransactionType {
    type Err = FinError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "expense" => Ok(TransactionType::Expense),
            "income" => Ok(TransactionType::Income),
            "transfer" => Ok(TransactionType::Transfer),
            "tax" => Ok(TransactionType::Tax),
            "payroll" => Ok(TransactionType::Payroll),
            "card" => Ok(TransactionType::Card),
            other => Err(FinError::unknown("transaction type", other)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransactionStatus {
    Planned,
    Paid,
    Overdue,
    Reconciled,
    Canceled,
}

impl TransactionStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            TransactionStatus::Planned => "planned",
            TransactionStatus::Paid => "paid",
            TransactionStatus::Overdue => "overdue",
            TransactionStatus::Reconciled => "reconciled",
            TransactionStatus::Canceled => "canceled",
        }
    }

    /// Only planned and paid entries are offered for reconciliation.
    pub fn is_reconcilable(self) -> bool {
        matches!(self, TransactionStatus::Planned | TransactionStatus::Paid)
    }
}

impl fmt::Display for TransactionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TransactionStatus {
    type Err = FinError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "planned" => Ok(TransactionStatus::Planned),
            "paid" => Ok(TransactionStatus::Paid),
            "overdue" => Ok(TransactionStatus::Overdue),
            "reconciled" => Ok(TransactionStatus::Reconciled),
            "canceled" | "cancelled" => Ok(TransactionStatus::Canceled),
            other => Err(FinError::unknown("transaction status", other)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Origin {
    #[default]
    Manual,
    Bank,
    Card,
    Import,
}

impl Origin {
    pub fn as_str(self) -> &'static str {
        match self {
            Origin::Manual => "manual",
            Origin::Bank => "bank",
            Origin::Card => "card",
            Origin::Import => "import",
        }
    }
}

impl FromStr for Origin {
    type Err = FinError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "manual" => Ok(Origin::Manual),
            "bank" => Ok(Origin::Bank),
            "card" => Ok(Origin::Card),
            "import" => Ok(Origin::Import),
            other => Err(FinError::unknown("origin", other)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PaymentMethod {
    #[serde(rename = "pix")]
    Pix,
    #[serde(rename = "ted")]
    Ted,
    #[serde(rename = "boleto")]
    Boleto,
    #[serde(rename = "dinheiro", alias = "cash")]
    Cash,
    #[serde(rename = "cartão", alias = "cartao", alias = "card")]
    Card,
    #[serde(rename = "outro", alias = "other")]
    Other,
}

impl PaymentMethod {
    pub fn as_str(self) -> &'static str {
        match self {
            PaymentMethod::Pix => "pix",
            PaymentMethod::Ted => "ted",
            PaymentMethod::Boleto => "boleto",
            PaymentMethod::Cash => "dinheiro",
            PaymentMethod::Card => "cartão",
            PaymentMethod::Other => "outro",
        }
    }
}

impl FromStr for PaymentMethod {
    type Err = FinError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "pix" => Ok(PaymentMethod::Pix),
            "ted" => Ok(PaymentMethod::Ted),
            "boleto" => Ok(PaymentMethod::Boleto),
            "dinheiro" | "cash" => Ok(PaymentMethod::Cash),
            "cartão" | "cartao" | "card" => Ok(PaymentMethod::Card),
            "outro" | "other" => Ok(PaymentMethod::Other),
            other => Err(FinError::unknown("payment method", other)),
        }
    }
}

pub const DEFAULT_SECTOR: &str = "Outros";

pub const DEFAULT_SECTORS: &[&str] = &[
    "Administrativo",
    "Produção",
    "Comercial",
    "Logística",
    DEFAULT_SECTOR,
];

/// A transaction as submitted, before defaults and checks are applied.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewTransaction {
    pub trx_date: NaiveDate,
    #[serde(rename = "type")]
    pub trx_type: TransactionType,
    #[serde(deserialize_with = "deserialize_amount")]
    pub amount: Money,
    #[serde(default)]
    pub due_date: Option<NaiveDate>,
    #[serde(default)]
    pub paid_date: Option<NaiveDate>,
    #[serde(default)]
    pub sector: Option<String>,
    #[serde(default)]
    pub cost_center_id: Option<i64>,
    #[serde(default)]
    pub category_id: Option<CategoryId>,
    #[serde(default)]
    pub account_id: Option<AccountId>,
    #[serde(default)]
    pub card_id: Option<AccountId>,
    #[serde(default)]
    pub method: Option<PaymentMethod>,
    #[serde(default)]
    pub doc_number: Option<String>,
    #[serde(default)]
    pub counterparty: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub status: Option<TransactionStatus>,
    #[serde(default)]
    pub tags: Option<String>,
    #[serde(default)]
    pub origin: Option<Origin>,
    #[serde(default)]
    pub external_id: Option<String>,
}

impl NewTransaction {
    pub fn new(trx_date: NaiveDate, trx_type: TransactionType, amount: Money) -> Self {
        NewTransaction {
            trx_date,
            trx_type,
            amount,
            due_date: None,
            paid_date: None,
            sector: None,
            cost_center_id: None,
            category_id: None,
            account_id: None,
            card_id: None,
            method: None,
            doc_number: None,
            counterparty: None,
            description: None,
            status: None,
            tags: None,
            origin: None,
            external_id: None,
        }
    }
}

/// A transaction with defaults applied, ready to be stored.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ValidatedTransaction {
    pub trx_date: NaiveDate,
    pub trx_type: TransactionType,
    pub amount: Money,
    pub due_date: Option<NaiveDate>,
    pub paid_date: Option<NaiveDate>,
    pub sector: String,
    pub cost_center_id: Option<i64>,
    pub category_id: Option<CategoryId>,
    pub account_id: Option<AccountId>,
    pub card_id: Option<AccountId>,
    pub method: Option<PaymentMethod>,
    pub doc_number: Option<String>,
    pub counterparty: Option<String>,
    pub description: Option<String>,
    pub status: TransactionStatus,
    pub tags: Option<String>,
    pub origin: Origin,
    pub external_id: Option<String>,
}

impl ValidatedTransaction {
    /// Applies entry rules. `bound_account` is set when the entry is made from
    /// an account-bound form and always wins over the submitted account.
    pub fn validate(
        tx: NewTransaction,
        bound_account: Option<AccountId>,
    ) -> Result<ValidatedTransaction, FinError> {
        if !tx.amount.is_positive() {
            return Err(FinError::NonPositiveAmount);
        }

        let method = match tx.trx_type {
            TransactionType::Card => Some(PaymentMethod::Card),
            _ => tx.method,
        };

        Ok(ValidatedTransaction {
            trx_date: tx.trx_date,
            trx_type: tx.trx_type,
            amount: tx.amount,
            due_date: tx.due_date,
            paid_date: tx.paid_date,
            sector: non_blank(tx.sector).unwrap_or_else(|| DEFAULT_SECTOR.to_string()),
            cost_center_id: tx.cost_center_id,
            category_id: tx.category_id,
            account_id: bound_account.or(tx.account_id),
            card_id: tx.card_id,
            method,
            doc_number: non_blank(tx.doc_number),
            counterparty: non_blank(tx.counterparty),
            description: non_blank(tx.description),
            status: tx.status.unwrap_or_else(|| tx.trx_type.default_status()),
            tags: non_blank(tx.tags),
            origin: tx.origin.unwrap_or_default(),
            external_id: non_blank(tx.external_id),
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    pub id: TransactionId,
    pub trx_date: NaiveDate,
    #[serde(rename = "type")]
    pub trx_type: TransactionType,
    pub amount: Money,
    pub due_date: Option<NaiveDate>,
    pub paid_date: Option<NaiveDate>,
    pub sector: Option<String>,
    pub cost_center_id: Option<i64>,
    pub category_id: Option<CategoryId>,
    pub account_id: Option<AccountId>,
    pub card_id: Option<AccountId>,
    pub method: Option<PaymentMethod>,
    pub doc_number: Option<String>,
    pub counterparty: Option<String>,
    pub description: Option<String>,
    pub status: TransactionStatus,
    pub tags: Option<String>,
    pub origin: Origin,
    pub external_id: Option<String>,
    pub attachment_path: Option<String>,
}

/// Listing filter. `None` means "Todos" (no restriction).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TransactionFilter {
    pub range: DateRange,
    pub trx_type: Option<TransactionType>,
    pub status: Option<TransactionStatus>,
}

impl TransactionFilter {
    pub fn year_to_date(today: NaiveDate) -> Self {
        TransactionFilter {
            range: DateRange::year_to_date(today),
            trx_type: None,
            status: None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Totals {
    pub income: Money,
    pub expenses: Money,
    pub balance: Money,
}

impl Totals {
    pub fn new(income: Money, expenses: Money) -> Self {
        Totals { income, expenses, balance: income - expenses }
    }

    pub fn from_entries<I>(entries: I) -> Self
    where
        I: IntoIterator<Item = (TransactionType, Money)>,
    {
        let (income, expenses) = entries.into_iter().fold(
            (Money::zero(), Money::zero()),
            |(inc, exp), (ty, amount)| match ty {
                TransactionType::Income => (inc + amount, exp),
                ty if ty.is_outflow() => (inc, exp + amount),
                _ => (inc, exp),
            },
        );
        Totals::new(income, expenses)
    }
}

/// Estimated account balance: income in, every other type (transfers
/// included) out.
pub fn statement_balance<I>(entries: I) -> Money
where
    I: IntoIterator<Item = (TransactionType, Money)>,
{
    entries
        .into_iter()
        .map(|(ty, amount)| match ty {
            TransactionType::Income => amount,
            _ => -amount,
        })
        .sum()
}
