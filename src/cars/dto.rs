use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::repo_types::{Car, NewCar, PriceQuote};

#[derive(Debug, Deserialize)]
pub struct CreateCarRequest {
    pub license_number: String,
    pub manufacturer: String,
    pub model: String,
    pub base_price: i64,
    pub price_per_hour: i64,
    pub security_deposit: i64,
    #[serde(default = "default_available")]
    pub available: bool,
}

fn default_available() -> bool {
    true
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchCarsQuery {
    pub from_date_time: Option<i64>,
    pub to_date_time: Option<i64>,
    pub page: Option<i64>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PriceQuery {
    pub car_id: Option<String>,
    pub from_date_time: Option<i64>,
    pub to_date_time: Option<i64>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct CarResponseData {
    pub data: CarResponse,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct CarResponse {
    pub id: Uuid,
    pub license_number: String,
    pub manufacturer: String,
    pub model: String,
    pub base_price: i64,
    pub price_per_hour: i64,
    pub security_deposit: i64,
    pub available: bool,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct PriceQuoteResponseData {
    pub data: PriceQuoteResponse,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct PriceQuoteResponse {
    pub car_id: Uuid,
    pub hours: i64,
    pub base_price: i64,
    pub price_per_hour: i64,
    pub security_deposit: i64,
    pub rental_price: i64,
    pub total_payable: i64,
}

impl CreateCarRequest {
    pub fn into_model(self) -> NewCar {
        NewCar {
            license_number: self.license_number,
            manufacturer: self.manufacturer,
            model: self.model,
            base_price: self.base_price,
            price_per_hour: self.price_per_hour,
            security_deposit: self.security_deposit,
            available: self.available,
        }
    }
}

impl From<Car> for CarResponse {
    fn from(car: Car) -> Self {
        Self {
            id: car.id,
            license_number: car.license_number,
            manufacturer: car.manufacturer,
            model: car.model,
            base_price: car.base_price,
            price_per_hour: car.price_per_hour,
            security_deposit: car.security_deposit,
            available: car.available,
        }
    }
}

impl From<Car> for CarResponseData {
    fn from(car: Car) -> Self {
        Self { data: car.into() }
    }
}

impl From<PriceQuote> for PriceQuoteResponseData {
    fn from(q: PriceQuote) -> Self {
        Self {
            data: PriceQuoteResponse {
                car_id: q.car_id,
                hours: q.hours,
                base_price: q.base_price,
                price_per_hour: q.price_per_hour,
                security_deposit: q.security_deposit,
                rental_price: q.rental_price,
                total_payable: q.total_payable,
            },
        }
    }
}
