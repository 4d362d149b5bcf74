use chrono::NaiveDate;
use finapp_core::Money;
use serde::{Deserialize, Serialize};
use std::io::Read;
use thiserror::Error;

/// Zero-based column positions in the statement file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CsvColumnMapping {
    pub date_column: Option<usize>,
    pub description_column: Option<usize>,
    pub amount_column: Option<usize>,
    pub debit_column: Option<usize>,
    pub credit_column: Option<usize>,
    pub memo_column: Option<usize>,
    /// Bank-assigned transaction id, when the export carries one.
    pub external_id_column: Option<usize>,
    pub date_format: String,
}

impl Default for CsvColumnMapping {
    fn default() -> Self {
        Self {
            date_column: Some(0),
            description_column: Some(1),
            amount_column: Some(2),
            debit_column: None,
            credit_column: None,
            memo_column: None,
            external_id_column: None,
            date_format: "%d/%m/%Y".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CsvImportProfile {
    pub name: String,
    pub mapping: CsvColumnMapping,
    pub has_header: bool,
    pub delimiter: String,
}

impl Default for CsvImportProfile {
    fn default() -> Self {
        Self {
            name: "Extrato padrão".to_string(),
            mapping: CsvColumnMapping::default(),
            has_header: true,
            delimiter: ";".to_string(),
        }
    }
}

/// One statement line. `amount` is signed from the account's point of
/// view: positive is money in, negative is money out.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatementLine {
    /// 1-based data row number in the file.
    pub line: usize,
    pub date: NaiveDate,
    pub description: String,
    pub amount: Money,
    pub memo: Option<String>,
    pub external_id: Option<String>,
}

#[derive(Error, Debug)]
pub enum CsvError {
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
    #[error("CSV error: {0}")]
    CsvError(#[from] csv::Error),
    #[error("Missing required column: {0}")]
    MissingColumn(String),
    #[error("Invalid date format on line {line}: {value}")]
    InvalidDate { line: usize, value: String },
    #[error("Invalid amount on line {line}: {value}")]
    InvalidAmount { line: usize, value: String },
    #[error("Profile maps neither an amount column nor a debit/credit pair")]
    NoAmountMapping,
    #[error("No data rows")]
    NoDataRows,
}

pub struct CsvImporter;

impl CsvImporter {
    pub fn parse_profile<R: Read>(
        reader: &mut csv::Reader<R>,
        profile: &CsvImportProfile,
    ) -> Result<Vec<StatementLine>, CsvError> {
        let mapping = &profile.mapping;
        let date_col = mapping
            .date_column
            .ok_or_else(|| CsvError::MissingColumn("date_column".into()))?;
        if mapping.amount_column.is_none()
            && (mapping.debit_column.is_none() || mapping.credit_column.is_none())
        {
            return Err(CsvError::NoAmountMapping);
        }

        let mut lines = Vec::new();

        for (index, result) in reader.records().enumerate() {
            let record = result?;
            let line = index + 1;

            if record.iter().all(|f| f.trim().is_empty()) {
                continue;
            }

            let date_field = record
                .get(date_col)
                .ok_or_else(|| CsvError::MissingColumn(format!("date_column {date_col}")))?;
            let date = parse_date(date_field, &mapping.date_format)
                .ok_or_else(|| CsvError::InvalidDate { line, value: date_field.trim().to_string() })?;

            let description = mapping
                .description_column
                .and_then(|col| record.get(col))
                .map(|s| s.trim().to_string())
                .unwrap_or_default();

            let amount = if let Some(col) = mapping.amount_column {
                let field = record
                    .get(col)
                    .ok_or_else(|| CsvError::MissingColumn(format!("amount_column {col}")))?;
                parse_amount(field, line)?
            } else {
                // Debits leave the account, credits enter it.
                let debit = optional_amount(record.get(mapping.debit_column.unwrap_or_default()), line)?;
                let credit = optional_amount(record.get(mapping.credit_column.unwrap_or_default()), line)?;
                credit.unwrap_or_default() - debit.map(Money::abs).unwrap_or_default()
            };

            let memo = mapping
                .memo_column
                .and_then(|col| record.get(col))
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_string);

            let external_id = mapping
                .external_id_column
                .and_then(|col| record.get(col))
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_string);

            lines.push(StatementLine {
                line,
                date,
                description,
                amount,
                memo,
                external_id,
            });
        }

        if lines.is_empty() {
            return Err(CsvError::NoDataRows);
        }

        Ok(lines)
    }

    pub fn detect_columns<R: Read>(reader: &mut csv::Reader<R>) -> Result<Vec<String>, CsvError> {
        let headers = reader.headers()?;
        Ok(headers.iter().map(|s| s.trim().to_string()).collect())
    }
}

const FALLBACK_DATE_FORMATS: &[&str] = &[
    "%d/%m/%Y", "%Y-%m-%d", "%d-%m-%Y", "%Y/%m/%d", "%m/%d/%Y",
];

/// Tries the profile's format, then the fallbacks. Day-first forms win over
/// the US month-first form for ambiguous dates.
pub fn parse_date(s: &str, format: &str) -> Option<NaiveDate> {
    let s = s.trim();
    std::iter::once(format)
        .chain(FALLBACK_DATE_FORMATS.iter().copied())
        .find_map(|fmt| NaiveDate::parse_from_str(s, fmt).ok())
}

fn parse_amount(s: &str, line: usize) -> Result<Money, CsvError> {
    Money::parse(s).map_err(|_| CsvError::InvalidAmount { line, value: s.trim().to_string() })
}

fn optional_amount(field: Option<&str>, line: usize) -> Result<Option<Money>, CsvError> {
    field
        .filter(|s| !s.trim().is_empty())
        .map(|s| parse_amount(s, line))
        .transpose()
}

pub fn import_csv<R: Read>(data: R, profile: &CsvImportProfile) -> Result<Vec<StatementLine>, CsvError> {
    let delimiter = profile
        .delimiter
        .as_bytes()
        .first()
        .copied()
        .unwrap_or(b';');
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(profile.has_header)
        .delimiter(delimiter)
        .flexible(true)
        .trim(csv::Trim::Headers)
        .from_reader(data);

    let lines = CsvImporter::parse_profile(&mut reader, profile)?;
    tracing::debug!(profile = %profile.name, lines = lines.len(), "parsed statement");
    Ok(lines)
}
