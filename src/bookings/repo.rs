use sqlx::{PgConnection, PgPool};
use time::OffsetDateTime;
use tracing::{debug, error, info, instrument, warn};
use uuid::Uuid;

use super::repo_types::{Booking, BookingError, NewBooking};
use crate::db::{bounded, rollback};
use crate::error::RepoError;
use crate::pagination::Page;
use crate::time_range::TimeRange;
use crate::{cars, users};

/// Book a car. The availability check and the insert share one transaction and
/// the car row stays locked until commit, so concurrent attempts on the same car
/// are serialized.
#[instrument(
    skip(db, new_booking),
    fields(car_id = %new_booking.car_id, user_id = %new_booking.user_id)
)]
pub async fn create(db: &PgPool, new_booking: NewBooking) -> Result<Booking, BookingError> {
    bounded(insert(db, new_booking)).await
}

async fn insert(db: &PgPool, new_booking: NewBooking) -> Result<Booking, BookingError> {
    let mut tx = db.begin().await.map_err(|e| {
        error!(error = %e, "unable to begin database transaction for creating new booking");
        e
    })?;

    if let Err(e) = check_availability(&mut *tx, &new_booking).await {
        match &e {
            BookingError::Repo(err) => error!(error = %err, "availability check failed"),
            other => warn!(reason = %other, "booking rejected"),
        }
        rollback(tx, "create booking").await;
        return Err(e);
    }

    let id = Uuid::new_v4();
    let inserted = sqlx::query_as::<_, Booking>(
        r#"
        INSERT INTO car_booking (id, car_id, user_id, start_at, end_at)
        VALUES ($1, $2, $3, $4, $5)
        RETURNING id, car_id, user_id, start_at, end_at, created_at
        "#,
    )
    .bind(id)
    .bind(new_booking.car_id)
    .bind(new_booking.user_id)
    .bind(new_booking.range.from)
    .bind(new_booking.range.to)
    .fetch_one(&mut *tx)
    .await;

    let booking = match inserted {
        Ok(booking) => booking,
        Err(e) => {
            error!(error = %e, "unable to execute query in database transaction");
            rollback(tx, "create booking").await;
            return Err(e.into());
        }
    };

    tx.commit().await.map_err(|e| {
        error!(error = %e, "unable to commit transaction to database");
        e
    })?;
    info!(booking_id = %booking.id, "booking created");
    Ok(booking)
}

async fn check_availability(
    conn: &mut PgConnection,
    new_booking: &NewBooking,
) -> Result<(), BookingError> {
    let car_id = new_booking.car_id;

    // row lock held until the surrounding transaction ends
    let available =
        sqlx::query_scalar::<_, bool>("SELECT available FROM car WHERE id = $1 FOR UPDATE")
            .bind(car_id)
            .fetch_optional(&mut *conn)
            .await?
            .ok_or(BookingError::CarNotFound(car_id))?;

    if !users::repo::exists_active(&mut *conn, new_booking.user_id).await? {
        return Err(BookingError::UserNotFound(new_booking.user_id));
    }

    if !available {
        return Err(BookingError::Unavailable(car_id));
    }

    let overlapping = sqlx::query_scalar::<_, bool>(
        r#"
        SELECT EXISTS (
            SELECT 1 FROM car_booking
             WHERE car_id = $1
               AND ((start_at <= $2 AND end_at > $2)
                    OR (start_at > $2 AND start_at < $3)))
        "#,
    )
    .bind(car_id)
    .bind(new_booking.range.from)
    .bind(new_booking.range.to)
    .fetch_one(&mut *conn)
    .await?;

    if overlapping {
        return Err(BookingError::Unavailable(car_id));
    }
    debug!(%car_id, "car available for requested interval");
    Ok(())
}

/// Bookings of one account, optionally restricted to those intersecting `range`.
/// `None` when the account does not exist or is inactive.
#[instrument(skip(db))]
pub async fn list_for_user(
    db: &PgPool,
    user_id: Uuid,
    range: Option<TimeRange>,
    page: Page,
) -> Result<Option<(i64, Vec<Booking>)>, RepoError> {
    bounded(async {
        let mut conn = db.acquire().await?;
        if !users::repo::exists_active(&mut *conn, user_id).await? {
            return Ok(None);
        }

        let (from, to) = bounds(range);
        let total = sqlx::query_scalar::<_, i64>(
            r#"
            SELECT COUNT(*) FROM car_booking
             WHERE user_id = $1
               AND ($2::timestamptz IS NULL
                    OR (start_at <= $2 AND end_at > $2)
                    OR (start_at > $2 AND start_at < $3))
            "#,
        )
        .bind(user_id)
        .bind(from)
        .bind(to)
        .fetch_one(&mut *conn)
        .await?;

        let bookings = sqlx::query_as::<_, Booking>(
            r#"
            SELECT id, car_id, user_id, start_at, end_at, created_at
              FROM car_booking
             WHERE user_id = $1
               AND ($2::timestamptz IS NULL
                    OR (start_at <= $2 AND end_at > $2)
                    OR (start_at > $2 AND start_at < $3))
             ORDER BY start_at, id
             LIMIT $4 OFFSET $5
            "#,
        )
        .bind(user_id)
        .bind(from)
        .bind(to)
        .bind(page.limit())
        .bind(page.offset())
        .fetch_all(&mut *conn)
        .await?;

        Ok::<_, RepoError>(Some((total, bookings)))
    })
    .await
}

/// Bookings of one car, optionally restricted to those intersecting `range`.
/// `None` when the car does not exist.
#[instrument(skip(db))]
pub async fn list_for_car(
    db: &PgPool,
    car_id: Uuid,
    range: Option<TimeRange>,
    page: Page,
) -> Result<Option<(i64, Vec<Booking>)>, RepoError> {
    bounded(async {
        let mut conn = db.acquire().await?;
        if !cars::repo::exists(&mut *conn, car_id).await? {
            return Ok(None);
        }

        let (from, to) = bounds(range);
        let total = sqlx::query_scalar::<_, i64>(
            r#"
            SELECT COUNT(*) FROM car_booking
             WHERE car_id = $1
               AND ($2::timestamptz IS NULL
                    OR (start_at <= $2 AND end_at > $2)
                    OR (start_at > $2 AND start_at < $3))
            "#,
        )
        .bind(car_id)
        .bind(from)
        .bind(to)
        .fetch_one(&mut *conn)
        .await?;

        let bookings = sqlx::query_as::<_, Booking>(
            r#"
            SELECT id, car_id, user_id, start_at, end_at, created_at
              FROM car_booking
             WHERE car_id = $1
               AND ($2::timestamptz IS NULL
                    OR (start_at <= $2 AND end_at > $2)
                    OR (start_at > $2 AND start_at < $3))
             ORDER BY start_at, id
             LIMIT $4 OFFSET $5
            "#,
        )
        .bind(car_id)
        .bind(from)
        .bind(to)
        .bind(page.limit())
        .bind(page.offset())
        .fetch_all(&mut *conn)
        .await?;

        Ok::<_, RepoError>(Some((total, bookings)))
    })
    .await
}

fn bounds(range: Option<TimeRange>) -> (Option<OffsetDateTime>, Option<OffsetDateTime>) {
    match range {
        Some(r) => (Some(r.from), Some(r.to)),
        None => (None, None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cars::repo_types::NewCar;
    use crate::users::repo_types::NewUser;
    use crate::{config::DbConfig, db, schema};

    async fn pool() -> PgPool {
        let cfg = DbConfig::from_env().expect("DB_* variables required");
        let pool = db::create_pool(&cfg, Some(&cfg.name)).await.expect("pool");
        schema::create_tables(&pool).await.expect("schema");
        pool
    }

    async fn fixtures(pool: &PgPool) -> (Uuid, Uuid) {
        let car = cars::repo::create(
            pool,
            NewCar {
                license_number: format!("B{}", &Uuid::new_v4().simple().to_string()[..12]),
                manufacturer: "Hyundai".into(),
                model: "i20".into(),
                base_price: 300,
                price_per_hour: 90,
                security_deposit: 1500,
                available: true,
            },
        )
        .await
        .expect("car");
        let user = users::repo::create(
            pool,
            NewUser {
                user_id: None,
                mobile: "5551234".into(),
            },
        )
        .await
        .expect("user");
        (car.id, user.id)
    }

    fn booking(car_id: Uuid, user_id: Uuid, from: i64, to: i64) -> NewBooking {
        NewBooking {
            car_id,
            user_id,
            range: TimeRange::from_body(Some(from), Some(to)).unwrap(),
        }
    }

    #[test]
    fn bounds_unpack_optional_range() {
        assert_eq!(bounds(None), (None, None));
        let r = TimeRange::from_unix(Some(10), Some(20)).unwrap();
        assert_eq!(bounds(Some(r)), (Some(r.from), Some(r.to)));
    }

    #[tokio::test]
    #[ignore = "requires database"]
    async fn overlapping_booking_is_rejected() {
        let pool = pool().await;
        let (car_id, user_id) = fixtures(&pool).await;

        create(&pool, booking(car_id, user_id, 1_900_000_000, 1_900_007_200))
            .await
            .expect("first booking");

        let err = create(&pool, booking(car_id, user_id, 1_900_003_600, 1_900_010_800))
            .await
            .unwrap_err();
        assert!(matches!(err, BookingError::Unavailable(id) if id == car_id));

        // back-to-back is fine
        create(&pool, booking(car_id, user_id, 1_900_007_200, 1_900_010_800))
            .await
            .expect("adjacent booking");
    }

    #[tokio::test]
    #[ignore = "requires database"]
    async fn concurrent_bookings_for_same_slot_admit_one() {
        let pool = pool().await;
        let (car_id, user_id) = fixtures(&pool).await;

        let attempts = (0..4).map(|_| {
            let pool = pool.clone();
            tokio::spawn(async move {
                create(&pool, booking(car_id, user_id, 1_910_000_000, 1_910_003_600)).await
            })
        });
        let mut ok = 0;
        for handle in attempts.collect::<Vec<_>>() {
            if handle.await.unwrap().is_ok() {
                ok += 1;
            }
        }
        assert_eq!(ok, 1);
    }

    #[tokio::test]
    #[ignore = "requires database"]
    async fn unknown_car_and_user_are_reported() {
        let pool = pool().await;
        let (car_id, user_id) = fixtures(&pool).await;

        let missing = Uuid::new_v4();
        let err = create(&pool, booking(missing, user_id, 1_920_000_000, 1_920_000_600))
            .await
            .unwrap_err();
        assert!(matches!(err, BookingError::CarNotFound(id) if id == missing));

        let err = create(&pool, booking(car_id, missing, 1_920_000_000, 1_920_000_600))
            .await
            .unwrap_err();
        assert!(matches!(err, BookingError::UserNotFound(id) if id == missing));
    }

    #[tokio::test]
    #[ignore = "requires database"]
    async fn listing_filters_by_range() {
        let pool = pool().await;
        let (car_id, user_id) = fixtures(&pool).await;
        for i in 0..3 {
            let start = 1_930_000_000 + i * 7_200;
            create(&pool, booking(car_id, user_id, start, start + 3_600))
                .await
                .expect("booking");
        }

        let (total, all) = list_for_car(&pool, car_id, None, Page::default())
            .await
            .unwrap()
            .expect("car exists");
        assert_eq!(total, 3);
        assert_eq!(all.len(), 3);

        let window = TimeRange::from_unix(Some(1_930_000_000), Some(1_930_007_200)).unwrap();
        let (total, _) = list_for_user(&pool, user_id, Some(window), Page::default())
            .await
            .unwrap()
            .expect("user exists");
        assert_eq!(total, 1);

        assert!(list_for_car(&pool, Uuid::new_v4(), None, Page::default())
            .await
            .unwrap()
            .is_none());
    }
}
