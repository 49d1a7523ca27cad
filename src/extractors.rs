use axum::{
    async_trait,
    extract::{FromRequest, FromRequestParts, Query, Request},
    http::request::Parts,
    Json,
};
use serde::de::DeserializeOwned;
use tracing::warn;
use uuid::Uuid;

use crate::error::ApiError;

/// JSON body whose rejection renders as `request_binding_error`.
pub struct JsonBody<T>(pub T);

#[async_trait]
impl<S, T> FromRequest<S> for JsonBody<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        match Json::<T>::from_request(req, state).await {
            Ok(Json(value)) => Ok(Self(value)),
            Err(rejection) => {
                warn!(error = %rejection, "unable to bind request");
                Err(ApiError::binding())
            }
        }
    }
}

/// Query string whose rejection renders as `invalid_parameter_error`.
pub struct QueryParams<T>(pub T);

#[async_trait]
impl<S, T> FromRequestParts<S> for QueryParams<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        match Query::<T>::from_request_parts(parts, state).await {
            Ok(Query(value)) => Ok(Self(value)),
            Err(rejection) => {
                warn!(error = %rejection, "invalid query string");
                Err(ApiError::bad_request(
                    "invalid_parameter_error",
                    "Invalid value in query parameters",
                ))
            }
        }
    }
}

/// Trim and check a path identifier. An id that is not a UUID cannot match any
/// row, so it comes back as `None` rather than an error.
pub fn path_id(raw: &str, entity: &str) -> Result<Option<Uuid>, ApiError> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Err(ApiError::bad_request(
            "invalid_param_error",
            format!("Value for {entity} id not set in request"),
        ));
    }
    Ok(Uuid::parse_str(raw).ok())
}
