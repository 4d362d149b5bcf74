use finapp_core::{Category, CategoryId, CategoryKind, NewCategory};
use sqlx::{QueryBuilder, Sqlite};

use crate::db::{decode_text, DbPool};

type CategoryRow = (i64, String, Option<i64>, String);

/// Categories ordered by name, optionally restricted to `kinds`.
pub async fn list_categories(
    pool: &DbPool,
    kinds: Option<&[CategoryKind]>,
) -> Result<Vec<Category>, sqlx::Error> {
    let mut qb = QueryBuilder::<Sqlite>::new("SELECT id, name, parent_id, kind FROM categories");
    if let Some(kinds) = kinds.filter(|k| !k.is_empty()) {
        qb.push(" WHERE kind IN (");
        let mut list = qb.separated(", ");
        for kind in kinds {
            list.push_bind(kind.as_str());
        }
        list.push_unseparated(")");
    }
    qb.push(" ORDER BY name");

    let rows = qb.build_query_as::<CategoryRow>().fetch_all(pool).await?;
    rows.into_iter()
        .map(|r| {
            Ok(Category {
                id: CategoryId(r.0),
                name: r.1,
                parent_id: r.2.map(CategoryId),
                kind: decode_text(&r.3)?,
            })
        })
        .collect()
}

pub async fn create_category(pool: &DbPool, category: &NewCategory) -> Result<CategoryId, sqlx::Error> {
    let result = sqlx::query("INSERT INTO categories (name, parent_id, kind) VALUES (?, ?, ?)")
        .bind(&category.name)
        .bind(category.parent_id.map(|p| p.0))
        .bind(category.kind.as_str())
        .execute(pool)
        .await?;
    Ok(CategoryId(result.last_insert_rowid()))
}

pub async fn delete_category(pool: &DbPool, id: CategoryId) -> Result<bool, sqlx::Error> {
    let result = sqlx::query("DELETE FROM categories WHERE id = ?")
        .bind(id.0)
        .execute(pool)
        .await?;
    Ok(result.rows_affected() > 0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::create_memory_db;
    use finapp_core::TransactionType;

    #[tokio::test]
    async fn filter_by_kinds_for_transaction_type() {
        let pool = create_memory_db().await.unwrap();

        let income = list_categories(&pool, Some(CategoryKind::for_transaction(TransactionType::Income)))
            .await
            .unwrap();
        assert_eq!(income.len(), 1);
        assert_eq!(income[0].name, "Vendas");

        let outflow = list_categories(&pool, Some(CategoryKind::for_transaction(TransactionType::Expense)))
            .await
            .unwrap();
        assert_eq!(outflow.len(), 5);
        assert!(outflow.iter().all(|c| c.kind != CategoryKind::Income));

        assert_eq!(list_categories(&pool, None).await.unwrap().len(), 6);
    }

    #[tokio::test]
    async fn create_with_parent_and_delete() {
        let pool = create_memory_db().await.unwrap();
        let parent = list_categories(&pool, Some(&[CategoryKind::Payroll])).await.unwrap()[0].id;
        let id = create_category(
            &pool,
            &NewCategory {
                name: "Folha - Encargos".into(),
                parent_id: Some(parent),
                kind: CategoryKind::Payroll,
            },
        )
        .await
        .unwrap();

        let payroll = list_categories(&pool, Some(&[CategoryKind::Payroll])).await.unwrap();
        let created = payroll.iter().find(|c| c.id == id).unwrap();
        assert_eq!(created.parent_id, Some(parent));

        assert!(delete_category(&pool, id).await.unwrap());
    }
}
