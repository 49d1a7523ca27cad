use sqlx::{PgConnection, PgPool};
use tracing::{error, info, instrument};
use uuid::Uuid;

use super::repo_types::{NewUser, User};
use crate::db::{bounded, rollback};
use crate::error::RepoError;
use crate::pagination::Page;

/// Insert a new active account under a freshly generated id.
#[instrument(skip(db, new_user))]
pub async fn create(db: &PgPool, new_user: NewUser) -> Result<User, RepoError> {
    bounded(insert(db, new_user)).await
}

async fn insert(db: &PgPool, new_user: NewUser) -> Result<User, RepoError> {
    let mut tx = db.begin().await.map_err(|e| {
        error!(error = %e, "unable to begin database transaction for creating new account");
        e
    })?;

    let id = Uuid::new_v4();
    let inserted = sqlx::query_as::<_, User>(
        r#"
        INSERT INTO account (id, user_id, mobile, active)
        VALUES ($1, $2, $3, true)
        RETURNING id, user_id, mobile, status, active, created, modified
        "#,
    )
    .bind(id)
    .bind(&new_user.user_id)
    .bind(&new_user.mobile)
    .fetch_one(&mut *tx)
    .await;

    let user = match inserted {
        Ok(user) => user,
        Err(e) => {
            error!(error = %e, "unable to execute query in database transaction");
            rollback(tx, "create account").await;
            return Err(e.into());
        }
    };

    tx.commit().await.map_err(|e| {
        error!(error = %e, "unable to commit transaction to database");
        e
    })?;
    info!(account_id = %user.id, "account created");
    Ok(user)
}

/// Fetch an active account; `None` when no such account exists.
#[instrument(skip(db))]
pub async fn find_active(db: &PgPool, id: Uuid) -> Result<Option<User>, RepoError> {
    bounded(async {
        sqlx::query_as::<_, User>(
            r#"
            SELECT id, user_id, mobile, status, active, created, modified
              FROM account
             WHERE id = $1 AND active = true
            "#,
        )
        .bind(id)
        .fetch_optional(db)
        .await
        .map_err(RepoError::from)
    })
    .await
}

/// Soft delete. Returns the number of accounts that went from active to inactive.
#[instrument(skip(db))]
pub async fn deactivate(db: &PgPool, id: Uuid) -> Result<u64, RepoError> {
    bounded(async {
        let done = sqlx::query(
            r#"
            UPDATE account
               SET active = false, modified = now()
             WHERE id = $1 AND active = true
            "#,
        )
        .bind(id)
        .execute(db)
        .await
        .map_err(|e| {
            error!(error = %e, account_id = %id, "unable to deactivate account");
            e
        })?;
        Ok::<_, RepoError>(done.rows_affected())
    })
    .await
}

/// Total number of active accounts plus one page of them, oldest first.
#[instrument(skip(db))]
pub async fn list_active(db: &PgPool, page: Page) -> Result<(i64, Vec<User>), RepoError> {
    bounded(async {
        let mut conn = db.acquire().await?;

        let total = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM account WHERE active = true")
            .fetch_one(&mut *conn)
            .await?;

        let users = sqlx::query_as::<_, User>(
            r#"
            SELECT id, user_id, mobile, status, active, created, modified
              FROM account
             WHERE active = true
             ORDER BY created, id
             LIMIT $1 OFFSET $2
            "#,
        )
        .bind(page.limit())
        .bind(page.offset())
        .fetch_all(&mut *conn)
        .await?;

        Ok::<_, RepoError>((total, users))
    })
    .await
}

pub(crate) async fn exists_active(conn: &mut PgConnection, id: Uuid) -> Result<bool, sqlx::Error> {
    sqlx::query_scalar::<_, bool>(
        "SELECT EXISTS (SELECT 1 FROM account WHERE id = $1 AND active = true)",
    )
    .bind(id)
    .fetch_one(conn)
    .await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{config::DbConfig, db, schema};
    use std::collections::HashSet;

    async fn pool() -> PgPool {
        let cfg = DbConfig::from_env().expect("DB_* variables required");
        let pool = db::create_pool(&cfg, Some(&cfg.name)).await.expect("pool");
        schema::create_tables(&pool).await.expect("schema");
        pool
    }

    fn new_user(mobile: &str) -> NewUser {
        NewUser {
            user_id: None,
            mobile: mobile.into(),
        }
    }

    #[tokio::test]
    #[ignore = "requires database"]
    async fn created_ids_are_fresh() {
        let pool = pool().await;
        let mut seen = HashSet::new();
        for _ in 0..5 {
            let user = create(&pool, new_user("5551234")).await.expect("create");
            assert!(!user.id.is_nil());
            assert!(seen.insert(user.id));
            assert!(user.active);
            assert_eq!(user.status, None);
        }
    }

    #[tokio::test]
    #[ignore = "requires database"]
    async fn duplicate_reference_is_a_unique_violation() {
        let pool = pool().await;
        let reference = format!("ref-{}", Uuid::new_v4().simple());
        let first = NewUser {
            user_id: Some(reference.clone()),
            mobile: "5551234".into(),
        };
        create(&pool, first.clone()).await.expect("first create");
        let err = create(&pool, first).await.unwrap_err();
        assert!(err.is_unique_violation());
    }

    #[tokio::test]
    #[ignore = "requires database"]
    async fn soft_delete_is_idempotent() {
        let pool = pool().await;
        let user = create(&pool, new_user("5550000")).await.expect("create");

        assert_eq!(deactivate(&pool, user.id).await.unwrap(), 1);
        assert_eq!(deactivate(&pool, user.id).await.unwrap(), 0);
        assert!(find_active(&pool, user.id).await.unwrap().is_none());

        assert_eq!(deactivate(&pool, Uuid::new_v4()).await.unwrap(), 0);
    }

    #[tokio::test]
    #[ignore = "requires database"]
    async fn list_pages_never_exceed_page_size() {
        let pool = pool().await;
        for _ in 0..12 {
            create(&pool, new_user("5551111")).await.expect("create");
        }
        let (total, first) = list_active(&pool, Page::default()).await.unwrap();
        assert!(total >= 12);
        assert_eq!(first.len(), 10);

        let last_page = Page::parse(Some((total + 9) / 10)).unwrap();
        let (total_again, last) = list_active(&pool, last_page).await.unwrap();
        assert_eq!(total, total_again);
        assert!(!last.is_empty() && last.len() <= 10);
    }
}
