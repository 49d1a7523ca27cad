use sqlx::{PgConnection, PgPool};
use tracing::{error, info, instrument};
use uuid::Uuid;

use super::repo_types::{Car, NewCar};
use crate::db::{bounded, rollback};
use crate::error::RepoError;
use crate::pagination::Page;
use crate::time_range::TimeRange;

/// Insert a new car under a freshly generated id.
#[instrument(skip(db, new_car), fields(license_number = %new_car.license_number))]
pub async fn create(db: &PgPool, new_car: NewCar) -> Result<Car, RepoError> {
    bounded(insert(db, new_car)).await
}

async fn insert(db: &PgPool, new_car: NewCar) -> Result<Car, RepoError> {
    let mut tx = db.begin().await.map_err(|e| {
        error!(error = %e, "unable to begin database transaction for creating new car");
        e
    })?;

    let id = Uuid::new_v4();
    let inserted = sqlx::query_as::<_, Car>(
        r#"
        INSERT INTO car (id, license_number, manufacturer, model,
                         base_price, price_per_hour, security_deposit, available)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
        RETURNING id, license_number, manufacturer, model,
                  base_price, price_per_hour, security_deposit, available, created_at
        "#,
    )
    .bind(id)
    .bind(&new_car.license_number)
    .bind(&new_car.manufacturer)
    .bind(&new_car.model)
    .bind(new_car.base_price)
    .bind(new_car.price_per_hour)
    .bind(new_car.security_deposit)
    .bind(new_car.available)
    .fetch_one(&mut *tx)
    .await;

    let car = match inserted {
        Ok(car) => car,
        Err(e) => {
            error!(error = %e, "unable to execute query in database transaction");
            rollback(tx, "create car").await;
            return Err(e.into());
        }
    };

    tx.commit().await.map_err(|e| {
        error!(error = %e, "unable to commit transaction to database");
        e
    })?;
    info!(car_id = %car.id, "car created");
    Ok(car)
}

#[instrument(skip(db))]
pub async fn find(db: &PgPool, id: Uuid) -> Result<Option<Car>, RepoError> {
    bounded(async {
        sqlx::query_as::<_, Car>(
            r#"
            SELECT id, license_number, manufacturer, model,
                   base_price, price_per_hour, security_deposit, available, created_at
              FROM car
             WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(db)
        .await
        .map_err(RepoError::from)
    })
    .await
}

/// Cars flagged available that have no booking intersecting `range`.
#[instrument(skip(db))]
pub async fn search_available(
    db: &PgPool,
    range: TimeRange,
    page: Page,
) -> Result<(i64, Vec<Car>), RepoError> {
    bounded(async {
        let mut conn = db.acquire().await?;

        let total = sqlx::query_scalar::<_, i64>(
            r#"
            SELECT COUNT(*)
              FROM car c
             WHERE c.available = true
               AND NOT EXISTS (
                   SELECT 1 FROM car_booking b
                    WHERE b.car_id = c.id
                      AND ((b.start_at <= $1 AND b.end_at > $1)
                           OR (b.start_at > $1 AND b.start_at < $2)))
            "#,
        )
        .bind(range.from)
        .bind(range.to)
        .fetch_one(&mut *conn)
        .await?;

        let cars = sqlx::query_as::<_, Car>(
            r#"
            SELECT c.id, c.license_number, c.manufacturer, c.model,
                   c.base_price, c.price_per_hour, c.security_deposit, c.available, c.created_at
              FROM car c
             WHERE c.available = true
               AND NOT EXISTS (
                   SELECT 1 FROM car_booking b
                    WHERE b.car_id = c.id
                      AND ((b.start_at <= $1 AND b.end_at > $1)
                           OR (b.start_at > $1 AND b.start_at < $2)))
             ORDER BY c.created_at, c.id
             LIMIT $3 OFFSET $4
            "#,
        )
        .bind(range.from)
        .bind(range.to)
        .bind(page.limit())
        .bind(page.offset())
        .fetch_all(&mut *conn)
        .await?;

        Ok::<_, RepoError>((total, cars))
    })
    .await
}

pub(crate) async fn exists(conn: &mut PgConnection, id: Uuid) -> Result<bool, sqlx::Error> {
    sqlx::query_scalar::<_, bool>("SELECT EXISTS (SELECT 1 FROM car WHERE id = $1)")
        .bind(id)
        .fetch_one(conn)
        .await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{config::DbConfig, db, schema};

    async fn pool() -> PgPool {
        let cfg = DbConfig::from_env().expect("DB_* variables required");
        let pool = db::create_pool(&cfg, Some(&cfg.name)).await.expect("pool");
        schema::create_tables(&pool).await.expect("schema");
        pool
    }

    fn new_car() -> NewCar {
        NewCar {
            license_number: format!("T{}", &Uuid::new_v4().simple().to_string()[..12]),
            manufacturer: "Maruti".into(),
            model: "Swift".into(),
            base_price: 500,
            price_per_hour: 120,
            security_deposit: 2000,
            available: true,
        }
    }

    #[tokio::test]
    #[ignore = "requires database"]
    async fn create_then_find() {
        let pool = pool().await;
        let car = create(&pool, new_car()).await.expect("create");
        let found = find(&pool, car.id).await.unwrap().expect("car exists");
        assert_eq!(found.license_number, car.license_number);
        assert!(find(&pool, Uuid::new_v4()).await.unwrap().is_none());
    }

    #[tokio::test]
    #[ignore = "requires database"]
    async fn duplicate_license_is_a_unique_violation() {
        let pool = pool().await;
        let car = new_car();
        create(&pool, car.clone()).await.expect("create");
        assert!(create(&pool, car).await.unwrap_err().is_unique_violation());
    }

    #[tokio::test]
    #[ignore = "requires database"]
    async fn unavailable_cars_are_not_listed() {
        let pool = pool().await;
        let mut hidden = new_car();
        hidden.available = false;
        let hidden = create(&pool, hidden).await.expect("create");

        let range = TimeRange::from_unix(Some(1_900_000_000), Some(1_900_003_600)).unwrap();
        let (total, cars) = search_available(&pool, range, Page::default()).await.unwrap();
        assert!(cars.len() <= 10);
        assert!(total >= cars.len() as i64);
        assert!(cars.iter().all(|c| c.id != hidden.id));
    }
}
