use sqlx::FromRow;
use thiserror::Error;
use time::OffsetDateTime;
use uuid::Uuid;

use crate::error::RepoError;
use crate::time_range::TimeRange;

/// Booking record in the database; covers `[start_at, end_at)`.
#[derive(Debug, Clone, FromRow)]
pub struct Booking {
    pub id: Uuid,
    pub car_id: Uuid,
    pub user_id: Uuid,
    pub start_at: OffsetDateTime,
    pub end_at: OffsetDateTime,
    #[allow(dead_code)]
    pub created_at: OffsetDateTime,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewBooking {
    pub car_id: Uuid,
    pub user_id: Uuid,
    pub range: TimeRange,
}

#[derive(Debug, Error)]
pub enum BookingError {
    #[error("car {0} does not exist")]
    CarNotFound(Uuid),

    #[error("account {0} does not exist or is inactive")]
    UserNotFound(Uuid),

    #[error("car {0} is not available for the requested interval")]
    Unavailable(Uuid),

    #[error(transparent)]
    Repo(#[from] RepoError),
}

impl From<sqlx::Error> for BookingError {
    fn from(e: sqlx::Error) -> Self {
        BookingError::Repo(e.into())
    }
}
