use finapp_core::{DateRange, Money, Totals, TransactionType};
use serde::Serialize;
use sqlx::{QueryBuilder, Sqlite};

use crate::db::{decode_text, DbPool};
use crate::scope::ScopeFilter;

/// Label used for transactions without a category.
pub const NO_CATEGORY: &str = "(sem)";

/// Income, expenses and balance over every status. `range` of `None`
/// covers the whole ledger.
pub async fn kpi_totals(
    pool: &DbPool,
    range: Option<DateRange>,
    scope: &ScopeFilter,
) -> Result<Totals, sqlx::Error> {
    let mut qb = QueryBuilder::<Sqlite>::new(
        "SELECT t.type, COALESCE(SUM(t.amount_cents), 0) FROM transactions t WHERE 1=1",
    );
    if let Some(range) = range {
        qb.push(" AND t.trx_date BETWEEN ")
            .push_bind(range.start)
            .push(" AND ")
            .push_bind(range.end);
    }
    scope.push_conditions(&mut qb);
    qb.push(" GROUP BY t.type");

    let rows = qb.build_query_as::<(String, i64)>().fetch_all(pool).await?;
    let mut entries = Vec::with_capacity(rows.len());
    for (ty, cents) in rows {
        entries.push((decode_text::<TransactionType>(&ty)?, Money::from_cents(cents)));
    }
    Ok(Totals::from_entries(entries))
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CategorySummary {
    pub category: String,
    #[serde(rename = "type")]
    pub trx_type: TransactionType,
    pub total_income: Money,
    /// Every non-income type, transfers included.
    pub total_expenses: Money,
}

/// Per category and type totals, ordered by category name.
pub async fn category_summary(pool: &DbPool, scope: &ScopeFilter) -> Result<Vec<CategorySummary>, sqlx::Error> {
    let mut qb = QueryBuilder::<Sqlite>::new("SELECT COALESCE(c.name, ");
    qb.push_bind(NO_CATEGORY);
    qb.push(
        r#") AS category,
               t.type,
               SUM(CASE WHEN t.type = 'income' THEN t.amount_cents ELSE 0 END),
               SUM(CASE WHEN t.type != 'income' THEN t.amount_cents ELSE 0 END)
        FROM transactions t
        LEFT JOIN categories c ON c.id = t.category_id
        WHERE 1=1
        "#,
    );
    scope.push_conditions(&mut qb);
    qb.push(" GROUP BY category, t.type ORDER BY category ASC, t.type ASC");

    let rows = qb.build_query_as::<(String, String, i64, i64)>().fetch_all(pool).await?;
    rows.into_iter()
        .map(|(category, ty, income, expenses)| {
            Ok(CategorySummary {
                category,
                trx_type: decode_text(&ty)?,
                total_income: Money::from_cents(income),
                total_expenses: Money::from_cents(expenses),
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::create_memory_db;
    use crate::transactions::insert_transaction;
    use chrono::NaiveDate;
    use finapp_core::{CategoryId, NewTransaction, ValidatedTransaction};

    fn d(m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, m, day).unwrap()
    }

    async fn add(pool: &DbPool, ty: TransactionType, cents: i64, category: Option<i64>, date: NaiveDate) {
        let mut new = NewTransaction::new(date, ty, Money::from_cents(cents));
        new.category_id = category.map(CategoryId);
        let tx = ValidatedTransaction::validate(new, None).unwrap();
        insert_transaction(pool, &tx).await.unwrap();
    }

    #[tokio::test]
    async fn kpis_follow_income_minus_outflows() {
        let pool = create_memory_db().await.unwrap();
        add(&pool, TransactionType::Income, 100_000, None, d(1, 10)).await;
        add(&pool, TransactionType::Expense, 20_000, None, d(1, 11)).await;
        add(&pool, TransactionType::Tax, 5_000, None, d(2, 1)).await;
        add(&pool, TransactionType::Payroll, 30_000, None, d(2, 5)).await;
        add(&pool, TransactionType::Card, 1_000, None, d(2, 6)).await;
        add(&pool, TransactionType::Transfer, 50_000, None, d(2, 7)).await;

        let totals = kpi_totals(&pool, None, &ScopeFilter::inert()).await.unwrap();
        assert_eq!(totals.income.to_cents(), 100_000);
        assert_eq!(totals.expenses.to_cents(), 56_000);
        assert_eq!(totals.balance.to_cents(), 44_000);

        let january = kpi_totals(&pool, Some(DateRange::new(d(1, 1), d(1, 31))), &ScopeFilter::inert())
            .await
            .unwrap();
        assert_eq!(january.expenses.to_cents(), 20_000);
    }

    #[tokio::test]
    async fn empty_ledger_has_zero_kpis() {
        let pool = create_memory_db().await.unwrap();
        let totals = kpi_totals(&pool, None, &ScopeFilter::inert()).await.unwrap();
        assert!(totals.balance.is_zero());
    }

    #[tokio::test]
    async fn summary_groups_by_category_and_type() {
        let pool = create_memory_db().await.unwrap();
        // 3 = Frete, 4 = Vendas in the seed order
        add(&pool, TransactionType::Income, 7_000, Some(4), d(3, 1)).await;
        add(&pool, TransactionType::Income, 3_000, Some(4), d(3, 2)).await;
        add(&pool, TransactionType::Expense, 1_500, Some(3), d(3, 3)).await;
        add(&pool, TransactionType::Transfer, 800, None, d(3, 4)).await;

        let summary = category_summary(&pool, &ScopeFilter::inert()).await.unwrap();
        let categories: Vec<_> = summary.iter().map(|s| s.category.as_str()).collect();
        assert_eq!(categories, vec![NO_CATEGORY, "Frete", "Vendas"]);

        assert_eq!(summary[0].trx_type, TransactionType::Transfer);
        assert_eq!(summary[0].total_expenses.to_cents(), 800);
        assert_eq!(summary[2].total_income.to_cents(), 10_000);
        assert!(summary[2].total_expenses.is_zero());
    }
}
