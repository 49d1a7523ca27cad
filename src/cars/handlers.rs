use axum::{
    extract::State,
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use tracing::{error, instrument, warn};

use super::dto::{
    CarResponse, CarResponseData, CreateCarRequest, PriceQuery, PriceQuoteResponseData,
    SearchCarsQuery,
};
use super::{repo, services};
use crate::{
    error::ApiError,
    extractors::{path_id, JsonBody, QueryParams},
    pagination::{ListResponseData, Page},
    state::AppState,
    time_range::TimeRange,
};

const MAX_LICENSE_LEN: usize = 20;
const MAX_NAME_LEN: usize = 50;

pub fn car_routes() -> Router<AppState> {
    Router::new()
        .route("/v1/cars", post(add_car))
        .route("/v1/searchCars", get(search_cars))
        .route("/v1/calculatePrice", get(calculate_price))
}

fn check_text(value: &str, field: &str, max: usize) -> Result<(), ApiError> {
    if value.is_empty() || value.len() > max {
        return Err(ApiError::bad_request(
            "invalid_parameter_error",
            format!("Invalid value for {field}"),
        ));
    }
    Ok(())
}

#[instrument(skip(state, payload))]
pub async fn add_car(
    State(state): State<AppState>,
    JsonBody(mut payload): JsonBody<CreateCarRequest>,
) -> Result<(StatusCode, Json<CarResponseData>), ApiError> {
    payload.license_number = payload.license_number.trim().to_uppercase();
    payload.manufacturer = payload.manufacturer.trim().to_string();
    payload.model = payload.model.trim().to_string();

    check_text(&payload.license_number, "license_number", MAX_LICENSE_LEN)?;
    check_text(&payload.manufacturer, "manufacturer", MAX_NAME_LEN)?;
    check_text(&payload.model, "model", MAX_NAME_LEN)?;
    for (field, value) in [
        ("base_price", payload.base_price),
        ("price_per_hour", payload.price_per_hour),
        ("security_deposit", payload.security_deposit),
    ] {
        if value < 0 {
            warn!(field, value, "negative price");
            return Err(ApiError::bad_request(
                "invalid_parameter_error",
                format!("Invalid value for {field}: must not be negative"),
            ));
        }
    }

    let car = repo::create(&state.db, payload.into_model())
        .await
        .map_err(|e| {
            if e.is_unique_violation() {
                warn!(error = %e, "license number already registered");
                ApiError::conflict(
                    "car_already_exists",
                    "Car with this license number already exists",
                )
            } else {
                error!(error = %e, "create car failed");
                ApiError::internal("create_car_error", "Unable to create car")
            }
        })?;

    Ok((StatusCode::CREATED, Json(car.into())))
}

#[instrument(skip(state))]
pub async fn search_cars(
    State(state): State<AppState>,
    QueryParams(query): QueryParams<SearchCarsQuery>,
) -> Result<Json<ListResponseData<CarResponse>>, ApiError> {
    let range = TimeRange::from_unix(query.from_date_time, query.to_date_time)?;
    let page = Page::parse(query.page)?;

    let (total, cars) = repo::search_available(&state.db, range, page)
        .await
        .map_err(|e| {
            error!(error = %e, "search cars failed");
            ApiError::internal("fetch_list_error", "Unable to fetch list")
        })?;

    let data = cars.into_iter().map(CarResponse::from).collect();
    let params = [
        ("fromDateTime", range.from.unix_timestamp().to_string()),
        ("toDateTime", range.to.unix_timestamp().to_string()),
    ];
    Ok(Json(ListResponseData::new(data, total, page, "/v1/searchCars", &params)))
}

#[instrument(skip(state))]
pub async fn calculate_price(
    State(state): State<AppState>,
    QueryParams(query): QueryParams<PriceQuery>,
) -> Result<Json<PriceQuoteResponseData>, ApiError> {
    let raw_id = query.car_id.unwrap_or_default();
    let range = TimeRange::from_unix(query.from_date_time, query.to_date_time)?;

    let not_found = || {
        ApiError::not_found(
            "no_car_found",
            format!("No car with id {} exists", raw_id.trim()),
        )
    };
    let Some(car_id) = path_id(&raw_id, "car")? else {
        return Err(not_found());
    };

    let car = match repo::find(&state.db, car_id).await {
        Ok(Some(car)) => car,
        Ok(None) => return Err(not_found()),
        Err(e) => {
            error!(error = %e, %car_id, "calculate price failed");
            return Err(ApiError::internal(
                "calculate_price_error",
                "Unable to calculate price",
            ));
        }
    };

    Ok(Json(services::quote(&car, &range).into()))
}
