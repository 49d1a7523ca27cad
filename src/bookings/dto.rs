use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use uuid::Uuid;

use super::repo_types::{Booking, NewBooking};
use crate::time_range::TimeRange;

#[derive(Debug, Deserialize)]
pub struct BookCarRequest {
    pub user_id: Uuid,
    #[serde(rename = "fromDateTime")]
    pub from_date_time: Option<i64>,
    #[serde(rename = "toDateTime")]
    pub to_date_time: Option<i64>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BookingListQuery {
    pub from_date_time: Option<i64>,
    pub to_date_time: Option<i64>,
    pub page: Option<i64>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct BookingResponseData {
    pub data: BookingResponse,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct BookingResponse {
    pub id: Uuid,
    pub car_id: Uuid,
    pub user_id: Uuid,
    #[serde(rename = "fromDateTime", with = "time::serde::rfc3339")]
    pub from_date_time: OffsetDateTime,
    #[serde(rename = "toDateTime", with = "time::serde::rfc3339")]
    pub to_date_time: OffsetDateTime,
}

impl BookCarRequest {
    /// `range` is the already validated `fromDateTime`/`toDateTime` pair.
    pub fn into_model(self, car_id: Uuid, range: TimeRange) -> NewBooking {
        NewBooking {
            car_id,
            user_id: self.user_id,
            range,
        }
    }
}

impl From<Booking> for BookingResponse {
    fn from(b: Booking) -> Self {
        Self {
            id: b.id,
            car_id: b.car_id,
            user_id: b.user_id,
            from_date_time: b.start_at,
            to_date_time: b.end_at,
        }
    }
}

impl From<Booking> for BookingResponseData {
    fn from(b: Booking) -> Self {
        Self { data: b.into() }
    }
}
