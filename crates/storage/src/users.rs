use finapp_core::{join_sectors, parse_sectors, AccountId, NewUser, Role, User};

use crate::db::{decode_text, DbPool};

type UserRow = (i64, String, String, String, String, Option<i64>, String, bool);

const SELECT_USER: &str =
    "SELECT id, name, email, password_hash, role, account_id, sectors, is_active FROM users";

fn user_from_row(r: UserRow) -> Result<User, sqlx::Error> {
    Ok(User {
        id: r.0,
        name: r.1,
        email: r.2,
        password_hash: r.3,
        role: decode_text::<Role>(&r.4)?,
        account_id: r.5.map(AccountId),
        sectors: parse_sectors(&r.6),
        is_active: r.7,
    })
}

/// Looks up an active user by (already normalized) e-mail.
pub async fn find_user_by_email(pool: &DbPool, email: &str) -> Result<Option<User>, sqlx::Error> {
    let sql = format!("{SELECT_USER} WHERE email = ? AND is_active = 1");
    let row = sqlx::query_as::<_, UserRow>(&sql)
        .bind(email)
        .fetch_optional(pool)
        .await?;
    row.map(user_from_row).transpose()
}

pub async fn get_user(pool: &DbPool, id: i64) -> Result<Option<User>, sqlx::Error> {
    let sql = format!("{SELECT_USER} WHERE id = ?");
    let row = sqlx::query_as::<_, UserRow>(&sql)
        .bind(id)
        .fetch_optional(pool)
        .await?;
    row.map(user_from_row).transpose()
}

/// Returns `None` when the e-mail is already registered.
pub async fn create_user(pool: &DbPool, user: &NewUser) -> Result<Option<i64>, sqlx::Error> {
    let result = sqlx::query(
        "INSERT INTO users (name, email, password_hash, role, account_id, sectors, is_active)
         VALUES (?, ?, ?, ?, ?, ?, 1)
         ON CONFLICT(email) DO NOTHING",
    )
    .bind(&user.name)
    .bind(&user.email)
    .bind(&user.password_hash)
    .bind(user.role.as_str())
    .bind(user.account_id.map(|a| a.0))
    .bind(join_sectors(&user.sectors))
    .execute(pool)
    .await?;

    if result.rows_affected() == 0 {
        tracing::info!(email = %user.email, "sign-up rejected: e-mail already registered");
        return Ok(None);
    }
    Ok(Some(result.last_insert_rowid()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use finapp_core::{verify_password, SignUp};
    use crate::db::create_memory_db;

    fn new_user(email: &str) -> NewUser {
        SignUp {
            name: "Ana".into(),
            email: email.into(),
            password: "segredo".into(),
            password_confirmation: "segredo".into(),
        }
        .validate()
        .unwrap()
    }

    #[tokio::test]
    async fn create_and_find_by_email() {
        let pool = create_memory_db().await.unwrap();
        let id = create_user(&pool, &new_user("Ana@Empresa.com")).await.unwrap().unwrap();

        let user = find_user_by_email(&pool, "ana@empresa.com").await.unwrap().unwrap();
        assert_eq!(user.id, id);
        assert_eq!(user.role, Role::User);
        assert!(user.sectors.is_empty());
        assert!(verify_password("segredo", &user.password_hash));

        assert_eq!(get_user(&pool, id).await.unwrap().unwrap().email, "ana@empresa.com");
        assert!(find_user_by_email(&pool, "outra@empresa.com").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn duplicate_email_is_rejected() {
        let pool = create_memory_db().await.unwrap();
        assert!(create_user(&pool, &new_user("ana@empresa.com")).await.unwrap().is_some());
        assert!(create_user(&pool, &new_user(" ANA@empresa.com ")).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn scope_columns_round_trip() {
        let pool = create_memory_db().await.unwrap();
        let mut user = new_user("vendas@empresa.com");
        user.account_id = Some(AccountId(2));
        user.sectors = vec!["Comercial".into(), "Logística".into()];
        let id = create_user(&pool, &user).await.unwrap().unwrap();

        let stored = get_user(&pool, id).await.unwrap().unwrap();
        let scope = stored.scope();
        assert_eq!(scope.account_id, Some(AccountId(2)));
        assert_eq!(scope.sectors, user.sectors);
    }
}
