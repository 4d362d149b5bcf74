pub mod csv;
pub mod match_engine;
pub mod plan;
pub(crate) mod util;

pub use csv::{import_csv, CsvColumnMapping, CsvError, CsvImportProfile, StatementLine};
pub use match_engine::{
    assign_external_ids, external_id_for, signed_amount, AutoMatchEngine, LedgerCandidate,
    MatchResult, MatchType,
};
pub use plan::{build_import_plan, plan_statement, ImportPlan, Settlement};
