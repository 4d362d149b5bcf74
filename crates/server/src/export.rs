use axum::{
    http::header,
    response::{IntoResponse, Response},
};
use finapp_storage::{CategorySummary, TransactionView};
use serde::Serialize;

use crate::error::{AppError, Result};

pub const TRANSACTIONS_FILE: &str = "lancamentos.csv";
pub const CATEGORY_SUMMARY_FILE: &str = "resumo_categoria.csv";

#[derive(Serialize)]
struct TransactionCsvRow<'a> {
    id: i64,
    #[serde(rename = "Data")]
    date: String,
    #[serde(rename = "Tipo")]
    trx_type: &'static str,
    #[serde(rename = "Descrição")]
    description: &'a str,
    #[serde(rename = "Valor")]
    amount: String,
    #[serde(rename = "Categoria")]
    category: &'a str,
    #[serde(rename = "Conta")]
    account: &'a str,
    #[serde(rename = "Setor")]
    sector: &'a str,
    #[serde(rename = "Status")]
    status: &'static str,
    #[serde(rename = "Anexo")]
    attachment: &'a str,
}

#[derive(Serialize)]
struct CategoryCsvRow<'a> {
    #[serde(rename = "Categoria")]
    category: &'a str,
    #[serde(rename = "Tipo")]
    trx_type: &'static str,
    #[serde(rename = "Total_Receitas")]
    total_income: String,
    #[serde(rename = "Total_Despesas")]
    total_expenses: String,
}

fn write_rows<T: Serialize>(rows: impl IntoIterator<Item = T>) -> Result<Vec<u8>> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    for row in rows {
        writer
            .serialize(row)
            .map_err(|e| AppError::Internal(format!("csv export: {e}")))?;
    }
    writer
        .into_inner()
        .map_err(|e| AppError::Internal(format!("csv export: {e}")))
}

pub fn transactions_csv(rows: &[TransactionView]) -> Result<Vec<u8>> {
    write_rows(rows.iter().map(|v| {
        let t = &v.transaction;
        TransactionCsvRow {
            id: t.id.0,
            date: t.trx_date.to_string(),
            trx_type: t.trx_type.as_str(),
            description: t.description.as_deref().unwrap_or(""),
            amount: t.amount.as_decimal().to_string(),
            category: v.category_name.as_deref().unwrap_or(""),
            account: v.account_name.as_deref().unwrap_or(""),
            sector: t.sector.as_deref().unwrap_or(""),
            status: t.status.as_str(),
            attachment: t.attachment_path.as_deref().unwrap_or(""),
        }
    }))
}

pub fn category_summary_csv(rows: &[CategorySummary]) -> Result<Vec<u8>> {
    write_rows(rows.iter().map(|s| CategoryCsvRow {
        category: &s.category,
        trx_type: s.trx_type.as_str(),
        total_income: s.total_income.as_decimal().to_string(),
        total_expenses: s.total_expenses.as_decimal().to_string(),
    }))
}

/// A `text/csv` download.
pub fn csv_response(file_name: &str, body: Vec<u8>) -> Response {
    (
        [
            (header::CONTENT_TYPE, "text/csv; charset=utf-8".to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{file_name}\""),
            ),
        ],
        body,
    )
        .into_response()
}
