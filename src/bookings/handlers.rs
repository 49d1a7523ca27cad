use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use tracing::{error, info, instrument};

use super::dto::{BookCarRequest, BookingListQuery, BookingResponse, BookingResponseData};
use super::repo;
use super::repo_types::BookingError;
use crate::{
    error::ApiError,
    extractors::{path_id, JsonBody, QueryParams},
    pagination::{ListResponseData, Page},
    state::AppState,
    time_range::TimeRange,
};

pub fn booking_routes() -> Router<AppState> {
    Router::new()
        .route("/v1/cars/:id/book", post(book_car))
        .route("/v1/cars/:id/bookings", get(list_car_bookings))
        .route("/v1/user/:id/bookings", get(list_user_bookings))
}

fn no_account(id: &str) -> ApiError {
    ApiError::not_found("no_account_found", format!("No account with id {id} exists"))
}

fn no_car(id: &str) -> ApiError {
    ApiError::not_found("no_car_found", format!("No car with id {id} exists"))
}

#[instrument(skip(state, payload))]
pub async fn book_car(
    State(state): State<AppState>,
    Path(raw_id): Path<String>,
    JsonBody(payload): JsonBody<BookCarRequest>,
) -> Result<(StatusCode, Json<BookingResponseData>), ApiError> {
    let Some(car_id) = path_id(&raw_id, "car")? else {
        return Err(no_car(raw_id.trim()));
    };
    let range = TimeRange::from_body(payload.from_date_time, payload.to_date_time)?;

    let booking = repo::create(&state.db, payload.into_model(car_id, range))
        .await
        .map_err(booking_error)?;

    info!(booking_id = %booking.id, %car_id, "car booked");
    Ok((StatusCode::CREATED, Json(booking.into())))
}

fn booking_error(e: BookingError) -> ApiError {
    match e {
        BookingError::CarNotFound(id) => no_car(&id.to_string()),
        BookingError::UserNotFound(id) => no_account(&id.to_string()),
        BookingError::Unavailable(_) => ApiError::conflict(
            "car_not_available",
            "Car is not available for the requested interval",
        ),
        BookingError::Repo(e) => {
            error!(error = %e, "create booking failed");
            ApiError::internal("create_booking_error", "Unable to create booking")
        }
    }
}

#[instrument(skip(state))]
pub async fn list_user_bookings(
    State(state): State<AppState>,
    Path(raw_id): Path<String>,
    QueryParams(query): QueryParams<BookingListQuery>,
) -> Result<Json<ListResponseData<BookingResponse>>, ApiError> {
    let Some(user_id) = path_id(&raw_id, "account")? else {
        return Err(no_account(raw_id.trim()));
    };
    let range = TimeRange::optional_from_unix(query.from_date_time, query.to_date_time)?;
    let page = Page::parse(query.page)?;

    let listed = repo::list_for_user(&state.db, user_id, range, page)
        .await
        .map_err(|e| {
            error!(error = %e, %user_id, "list user bookings failed");
            ApiError::internal("fetch_list_error", "Unable to fetch list")
        })?;
    let Some((total, bookings)) = listed else {
        return Err(no_account(&user_id.to_string()));
    };

    Ok(Json(list_body(
        bookings.into_iter().map(BookingResponse::from).collect(),
        total,
        page,
        &format!("/v1/user/{user_id}/bookings"),
        range,
    )))
}

#[instrument(skip(state))]
pub async fn list_car_bookings(
    State(state): State<AppState>,
    Path(raw_id): Path<String>,
    QueryParams(query): QueryParams<BookingListQuery>,
) -> Result<Json<ListResponseData<BookingResponse>>, ApiError> {
    let Some(car_id) = path_id(&raw_id, "car")? else {
        return Err(no_car(raw_id.trim()));
    };
    let range = TimeRange::optional_from_unix(query.from_date_time, query.to_date_time)?;
    let page = Page::parse(query.page)?;

    let listed = repo::list_for_car(&state.db, car_id, range, page)
        .await
        .map_err(|e| {
            error!(error = %e, %car_id, "list car bookings failed");
            ApiError::internal("fetch_list_error", "Unable to fetch list")
        })?;
    let Some((total, bookings)) = listed else {
        return Err(no_car(&car_id.to_string()));
    };

    Ok(Json(list_body(
        bookings.into_iter().map(BookingResponse::from).collect(),
        total,
        page,
        &format!("/v1/cars/{car_id}/bookings"),
        range,
    )))
}

fn list_body(
    data: Vec<BookingResponse>,
    total: i64,
    page: Page,
    path: &str,
    range: Option<TimeRange>,
) -> ListResponseData<BookingResponse> {
    let params: Vec<(&str, String)> = match range {
        Some(r) => vec![
            ("fromDateTime", r.from.unix_timestamp().to_string()),
            ("toDateTime", r.to.unix_timestamp().to_string()),
        ],
        None => Vec::new(),
    };
    ListResponseData::new(data, total, page, path, &params)
}
