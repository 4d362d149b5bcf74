pub mod accounts;
pub mod attachments;
pub mod calendar;
pub mod categories;
pub mod db;
pub mod parties;
pub mod payroll;
pub mod reports;
pub mod scope;
pub mod taxes;
pub mod transactions;
pub mod users;

pub use accounts::{create_account, delete_account, get_account, list_accounts};
pub use attachments::{is_previewable_image, AttachmentError, AttachmentFile, AttachmentStore};
pub use calendar::{create_event, delete_event, list_events};
pub use categories::{create_category, delete_category, list_categories};
pub use db::{create_db, create_memory_db, seed_minimums, DbPool, DEFAULT_BUSY_TIMEOUT};
pub use parties::{
    create_party, create_sector, delete_party, delete_sector, list_parties, list_sectors,
};
pub use payroll::{create_payroll, delete_payroll, list_payroll, mark_payroll_paid};
pub use reports::{category_summary, kpi_totals, CategorySummary, NO_CATEGORY};
pub use scope::ScopeFilter;
pub use taxes::{create_tax, delete_tax, list_taxes};
pub use transactions::{
    account_statement, delete_transaction, existing_external_ids, get_transaction, insert_if_new,
    insert_transaction, list_transactions, open_entries_for_account, pending_reconciliation, recent_transactions, reconcile_transaction,
    set_attachment, set_status, settle_from_statement, TransactionView,
};
pub use users::{create_user, find_user_by_email, get_user};
