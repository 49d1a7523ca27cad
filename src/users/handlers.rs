use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use tracing::{error, info, instrument, warn};

use super::dto::{CreateUserRequest, ListUsersQuery, UserResponse, UserResponseData};
use super::repo;
use crate::{
    error::ApiError,
    extractors::{path_id, JsonBody, QueryParams},
    pagination::{ListResponseData, Page},
    state::AppState,
};
use uuid::Uuid;

const MAX_MOBILE_LEN: usize = 20;
const MAX_USER_REF_LEN: usize = 50;

pub fn user_routes() -> Router<AppState> {
    Router::new()
        .route("/v1/user", post(create_user).get(list_users))
        .route("/v1/user/:id", get(get_user).delete(delete_user))
}

#[instrument(skip(state, payload))]
pub async fn create_user(
    State(state): State<AppState>,
    JsonBody(mut payload): JsonBody<CreateUserRequest>,
) -> Result<(StatusCode, Json<UserResponseData>), ApiError> {
    payload.mobile = payload.mobile.trim().to_string();
    payload.user_id = payload
        .user_id
        .map(|r| r.trim().to_string())
        .filter(|r| !r.is_empty());

    if payload.mobile.is_empty() || payload.mobile.len() > MAX_MOBILE_LEN {
        warn!(mobile = %payload.mobile, "invalid mobile number");
        return Err(ApiError::bad_request(
            "invalid_parameter_error",
            "Invalid value for mobile_no",
        ));
    }
    if payload.user_id.as_ref().is_some_and(|r| r.len() > MAX_USER_REF_LEN) {
        return Err(ApiError::bad_request(
            "invalid_parameter_error",
            "Invalid value for user_id",
        ));
    }

    let user = repo::create(&state.db, payload.into_model())
        .await
        .map_err(|e| {
            if e.is_unique_violation() {
                warn!(error = %e, "account reference already registered");
                ApiError::conflict(
                    "account_already_exists",
                    "Account with this user_id already exists",
                )
            } else {
                error!(error = %e, "create account failed");
                ApiError::internal("create_account_error", "Unable to create account")
            }
        })?;

    Ok((StatusCode::CREATED, Json(user.into())))
}

#[instrument(skip(state))]
pub async fn list_users(
    State(state): State<AppState>,
    QueryParams(query): QueryParams<ListUsersQuery>,
) -> Result<Json<ListResponseData<UserResponse>>, ApiError> {
    let page = Page::parse(query.page)?;

    let (total, users) = repo::list_active(&state.db, page).await.map_err(|e| {
        error!(error = %e, "list accounts failed");
        ApiError::internal("fetch_list_error", "Unable to fetch list")
    })?;

    let data = users.into_iter().map(UserResponse::from).collect();
    Ok(Json(ListResponseData::new(data, total, page, "/v1/user", &[])))
}

#[instrument(skip(state))]
pub async fn get_user(
    State(state): State<AppState>,
    Path(raw_id): Path<String>,
) -> Result<Json<UserResponseData>, ApiError> {
    let Some(id) = path_id(&raw_id, "account")? else {
        return Err(no_account(raw_id.trim()));
    };

    match repo::find_active(&state.db, id).await {
        Ok(Some(user)) => Ok(Json(user.into())),
        Ok(None) => Err(no_account(raw_id.trim())),
        Err(e) => {
            error!(error = %e, %id, "get account failed");
            Err(ApiError::internal(
                "get_account_error",
                "Unable to fetch account details",
            ))
        }
    }
}

#[instrument(skip(state))]
pub async fn delete_user(
    State(state): State<AppState>,
    Path(raw_id): Path<String>,
) -> Result<StatusCode, ApiError> {
    let Some(id) = path_id(&raw_id, "account")? else {
        return Err(no_account(raw_id.trim()));
    };

    let affected = repo::deactivate(&state.db, id).await.map_err(|e| {
        error!(error = %e, %id, "delete account failed");
        ApiError::internal("delete_account_error", "Unable to delete account details")
    })?;

    let status = deletion_status(id, affected)?;
    info!(%id, "account deactivated");
    Ok(status)
}

fn no_account(id: &str) -> ApiError {
    ApiError::not_found("no_account_found", format!("No account with id {id} exists"))
}

/// Nothing deactivated means the account never existed or was already deleted.
fn deletion_status(id: Uuid, affected: u64) -> Result<StatusCode, ApiError> {
    if affected == 0 {
        return Err(no_account(&id.to_string()));
    }
    Ok(StatusCode::NO_CONTENT)
}
