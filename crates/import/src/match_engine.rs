use chrono::NaiveDate;
use finapp_core::{AccountId, Money, Transaction, TransactionId, TransactionType};
use serde::Serialize;
use sha2::{Digest, Sha256};
use std::collections::HashMap;

use crate::csv::StatementLine;
use crate::util::{levenshtein_distance, normalize_description};

/// An open ledger entry that a statement line may settle.
#[derive(Debug, Clone, PartialEq)]
pub struct LedgerCandidate {
    pub id: TransactionId,
    pub date: NaiveDate,
    pub description: String,
    /// Income positive, everything else negative.
    pub signed_amount: Money,
}

impl LedgerCandidate {
    pub fn from_transaction(tx: &Transaction) -> Self {
        let description = [tx.description.as_deref(), tx.counterparty.as_deref()]
            .into_iter()
            .flatten()
            .collect::<Vec<_>>()
            .join(" ");
        Self {
            id: tx.id,
            date: tx.trx_date,
            description,
            signed_amount: signed_amount(tx.trx_type, tx.amount),
        }
    }
}

/// Money moved from the account's point of view.
pub fn signed_amount(ty: TransactionType, amount: Money) -> Money {
    match ty {
        TransactionType::Income => amount.abs(),
        _ => -amount.abs(),
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum MatchType {
    Exact,
    DateAndAmount,
    Fuzzy { score: f32 },
    None,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MatchResult {
    /// `StatementLine::line` of the matched line.
    pub line: usize,
    pub matched_tx_id: Option<TransactionId>,
    pub match_type: MatchType,
    pub confidence: f32,
    pub difference_cents: i64,
}

impl MatchResult {
    pub fn unmatched(line: usize) -> Self {
        MatchResult {
            line,
            matched_tx_id: None,
            match_type: MatchType::None,
            confidence: 0.0,
            difference_cents: 0,
        }
    }
}

pub struct AutoMatchEngine {
    pub date_window_days: i64,
    pub fuzzy_threshold: f32,
    pub amount_tolerance_cents: i64,
}

impl Default for AutoMatchEngine {
    fn default() -> Self {
        Self {
            date_window_days: 3,
            fuzzy_threshold: 0.7,
            amount_tolerance_cents: 1,
        }
    }
}

struct Scored {
    line_idx: usize,
    cand_idx: usize,
    match_type: MatchType,
    confidence: f32,
    diff_cents: i64,
}

impl AutoMatchEngine {
    pub fn new(date_window_days: i64, fuzzy_threshold: f32, amount_tolerance_cents: i64) -> Self {
        Self {
            date_window_days,
            fuzzy_threshold,
            amount_tolerance_cents,
        }
    }

    /// One result per line, in line order. Pairs are claimed greedily by
    /// confidence, so a ledger entry settles at most one line.
    pub fn find_matches(&self, lines: &[StatementLine], ledger: &[LedgerCandidate]) -> Vec<MatchResult> {
        let mut scored: Vec<Scored> = Vec::new();
        for (line_idx, line) in lines.iter().enumerate() {
            for (cand_idx, cand) in ledger.iter().enumerate() {
                if let Some((match_type, confidence, diff_cents)) = self.score_pair(line, cand) {
                    scored.push(Scored { line_idx, cand_idx, match_type, confidence, diff_cents });
                }
            }
        }

        scored.sort_by(|a, b| {
            b.confidence
                .partial_cmp(&a.confidence)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then(a.line_idx.cmp(&b.line_idx))
                .then(ledger[a.cand_idx].id.cmp(&ledger[b.cand_idx].id))
        });

        let mut results: Vec<MatchResult> = lines.iter().map(|line| MatchResult::unmatched(line.line)).collect();
        let mut line_taken = vec![false; lines.len()];
        let mut cand_taken = vec![false; ledger.len()];

        for s in scored {
            if line_taken[s.line_idx] || cand_taken[s.cand_idx] {
                continue;
            }
            line_taken[s.line_idx] = true;
            cand_taken[s.cand_idx] = true;
            let result = &mut results[s.line_idx];
            result.matched_tx_id = Some(ledger[s.cand_idx].id);
            result.match_type = s.match_type;
            result.confidence = s.confidence;
            result.difference_cents = s.diff_cents;
        }

        results
    }

    /// `Some((match_type, confidence, diff_cents))` when the pair clears the
    /// amount tolerance, date window and confidence threshold.
    fn score_pair(&self, line: &StatementLine, cand: &LedgerCandidate) -> Option<(MatchType, f32, i64)> {
        let diff_cents = (line.amount.to_cents() - cand.signed_amount.to_cents()).abs();
        if diff_cents > self.amount_tolerance_cents {
            return None;
        }

        let date_diff = (line.date - cand.date).num_days().abs();
        if date_diff > self.date_window_days {
            return None;
        }

        let desc_score = description_similarity(&line.description, &cand.description);

        if date_diff == 0 && diff_cents == 0 && desc_score >= 0.9 {
            return Some((MatchType::Exact, 1.0, 0));
        }
        // Bank wording rarely matches the ledger; same day and amount is
        // enough on its own.
        if date_diff == 0 {
            return Some((MatchType::DateAndAmount, 0.8 + 0.15 * desc_score, diff_cents));
        }

        let date_score = 1.0 - (date_diff as f32 / (self.date_window_days + 1) as f32);
        let confidence = (date_score + desc_score) / 2.0;
        (confidence >= self.fuzzy_threshold)
            .then_some((MatchType::Fuzzy { score: confidence }, confidence, diff_cents))
    }
}

/// Levenshtein similarity of normalised descriptions, in [0.0, 1.0].
fn description_similarity(s1: &str, s2: &str) -> f32 {
    let a = normalize_description(s1);
    let b = normalize_description(s2);

    if a == b {
        return 1.0;
    }

    let max_len = a.chars().count().max(b.chars().count());
    if max_len == 0 {
        return 1.0;
    }

    1.0 - (levenshtein_distance(&a, &b) as f32 / max_len as f32)
}

/// Stable key for a statement line so re-importing the same file never
/// creates a second transaction. `occurrence` separates identical lines
/// within one statement.
pub fn external_id_for(account: AccountId, line: &StatementLine, occurrence: u32) -> String {
    let key = match &line.external_id {
        Some(bank_id) => format!("{account}|bank|{bank_id}"),
        None => format!(
            "{account}|{}|{}|{}|{occurrence}",
            line.date,
            line.amount.to_cents(),
            normalize_description(&line.description)
        ),
    };
    hex::encode(Sha256::digest(key.as_bytes()))
}

/// External ids for every line, numbering repeated identical lines.
pub fn assign_external_ids(account: AccountId, lines: &[StatementLine]) -> Vec<String> {
    let mut seen: HashMap<(NaiveDate, i64, String), u32> = HashMap::new();
    lines
        .iter()
        .map(|line| {
            let key = (line.date, line.amount.to_cents(), normalize_description(&line.description));
            let occurrence = seen.entry(key).or_insert(0);
            let id = external_id_for(account, line, *occurrence);
            *occurrence += 1;
            id
        })
        .collect()
}
