use std::collections::HashSet;

use finapp_core::{
    Account, AccountKind, NewTransaction, Origin, TransactionId, TransactionStatus, TransactionType,
};

use crate::csv::StatementLine;
use crate::match_engine::{assign_external_ids, AutoMatchEngine, LedgerCandidate, MatchResult};

/// An open entry settled by a statement line. The line's external id is
/// stamped on the entry so a re-import recognises it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settlement {
    pub tx_id: TransactionId,
    pub external_id: String,
}

/// What a confirmed statement import will do to the ledger.
#[derive(Debug, Clone, Default)]
pub struct ImportPlan {
    pub reconcile: Vec<Settlement>,
    /// Unmatched lines, as new already-reconciled entries.
    pub insert: Vec<NewTransaction>,
    /// Line numbers of zero-amount lines.
    pub skipped: Vec<usize>,
    /// Line numbers of lines an earlier import already stored.
    pub duplicates: Vec<usize>,
}

/// Matches the lines not imported before against `ledger` and plans the
/// whole statement. `known` holds external ids already in the ledger;
/// their lines never take part in matching.
pub fn plan_statement(
    engine: &AutoMatchEngine,
    account: &Account,
    lines: &[StatementLine],
    ledger: &[LedgerCandidate],
    known: &HashSet<String>,
) -> (Vec<MatchResult>, ImportPlan) {
    let external_ids = assign_external_ids(account.id, lines);
    let fresh: Vec<StatementLine> = lines
        .iter()
        .zip(&external_ids)
        .filter(|(_, id)| !known.contains(*id))
        .map(|(line, _)| line.clone())
        .collect();

    let mut fresh_matches = engine.find_matches(&fresh, ledger).into_iter();
    let matches: Vec<MatchResult> = lines
        .iter()
        .zip(&external_ids)
        .map(|(line, id)| {
            if known.contains(id) {
                MatchResult::unmatched(line.line)
            } else {
                fresh_matches.next().unwrap_or_else(|| MatchResult::unmatched(line.line))
            }
        })
        .collect();

    let plan = build_import_plan(account, lines, &matches, known);
    (matches, plan)
}

/// Splits a statement into reconciliations and inserts. `matches` must be
/// the engine output for the same `lines`.
pub fn build_import_plan(
    account: &Account,
    lines: &[StatementLine],
    matches: &[MatchResult],
    known: &HashSet<String>,
) -> ImportPlan {
    let external_ids = assign_external_ids(account.id, lines);
    let mut plan = ImportPlan::default();

    for ((line, result), external_id) in lines.iter().zip(matches).zip(external_ids) {
        if known.contains(&external_id) {
            plan.duplicates.push(line.line);
            continue;
        }
        if let Some(tx_id) = result.matched_tx_id {
            plan.reconcile.push(Settlement { tx_id, external_id });
            continue;
        }
        if line.amount.is_zero() {
            plan.skipped.push(line.line);
            continue;
        }
        plan.insert.push(line_to_transaction(account, line, external_id));
    }

    plan
}

fn line_to_transaction(account: &Account, line: &StatementLine, external_id: String) -> NewTransaction {
    let trx_type = match (line.amount.is_positive(), account.kind) {
        (true, _) => TransactionType::Income,
        (false, AccountKind::Card) => TransactionType::Card,
        (false, _) => TransactionType::Expense,
    };
    let origin = match account.kind {
        AccountKind::Card => Origin::Card,
        _ => Origin::Bank,
    };

    let mut tx = NewTransaction::new(line.date, trx_type, line.amount.abs());
    tx.paid_date = Some(line.date);
    tx.account_id = Some(account.id);
    tx.description = Some(line.description.clone());
    tx.doc_number = line.external_id.clone();
    tx.tags = line.memo.clone();
    tx.status = Some(TransactionStatus::Reconciled);
    tx.origin = Some(origin);
    tx.external_id = Some(external_id);
    tx
}
