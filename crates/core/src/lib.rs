pub mod account;
pub mod calendar;
pub mod category;
pub mod error;
pub mod money;
pub mod party;
pub mod payroll;
pub mod period;
pub mod tax;
pub mod transaction;
pub mod user;

pub use account::{Account, AccountId, AccountKind, NewAccount, DEFAULT_ACCOUNTS};
pub use calendar::{
    month_view, CalendarEntry, CalendarEvent, EntryKind, NewCalendarEvent, Recurrence,
    MAX_INTERVAL, MAX_OCCURRENCE_STEPS,
};
pub use category::{Category, CategoryId, CategoryKind, NewCategory, DEFAULT_CATEGORIES};
pub use error::FinError;
pub use money::Money;
pub use party::{NewParty, Party, PartyKind, Sector};
pub use payroll::{NewPayrollEntry, PayrollEntry, ValidatedPayroll};
pub use period::{DateRange, Month};
pub use tax::{NewTaxObligation, Periodicity, TaxObligation};
pub use transaction::{
    statement_balance, NewTransaction, Origin, PaymentMethod, Totals, Transaction,
    TransactionFilter, TransactionId, TransactionStatus, TransactionType, ValidatedTransaction,
    DEFAULT_SECTOR, DEFAULT_SECTORS,
};
pub use user::{
    hash_password, join_sectors, normalize_email, parse_sectors, verify_password, NewUser, Role,
    Scope, SignUp, User,
};
