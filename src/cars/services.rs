use super::repo_types::{Car, PriceQuote};
use crate::time_range::TimeRange;

/// `base_price + price_per_hour * hours`, hours rounded up, deposit on top.
pub fn quote(car: &Car, range: &TimeRange) -> PriceQuote {
    let hours = range.billable_hours();
    let rental_price = car
        .base_price
        .saturating_add(car.price_per_hour.saturating_mul(hours));
    PriceQuote {
        car_id: car.id,
        hours,
        base_price: car.base_price,
        price_per_hour: car.price_per_hour,
        security_deposit: car.security_deposit,
        rental_price,
        total_payable: rental_price.saturating_add(car.security_deposit),
    }
}
