use sqlx::FromRow;
use time::OffsetDateTime;
use uuid::Uuid;

/// Car record in the database. Prices are whole currency units.
#[derive(Debug, Clone, FromRow)]
pub struct Car {
    pub id: Uuid,
    pub license_number: String,
    pub manufacturer: String,
    pub model: String,
    pub base_price: i64,
    pub price_per_hour: i64,
    pub security_deposit: i64,
    pub available: bool,
    #[allow(dead_code)]
    pub created_at: OffsetDateTime,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewCar {
    pub license_number: String,
    pub manufacturer: String,
    pub model: String,
    pub base_price: i64,
    pub price_per_hour: i64,
    pub security_deposit: i64,
    pub available: bool,
}

/// Cost of renting one car over a time range.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PriceQuote {
    pub car_id: Uuid,
    pub hours: i64,
    pub base_price: i64,
    pub price_per_hour: i64,
    pub security_deposit: i64,
    pub rental_price: i64,
    pub total_payable: i64,
}
