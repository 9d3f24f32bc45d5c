//! Request body extraction and validation helpers
//!
//! Bodies are validated completely before any handler touches the store:
//! a malformed body never leaves a partial write behind.

use crate::{ApiError, ApiResult};
use axum::{
    async_trait,
    extract::{rejection::JsonRejection, FromRequest, Request},
    Json,
};
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};
use std::collections::BTreeMap;

/// JSON body extractor whose rejections use the API error envelope
pub struct ApiJson<T>(pub T);

#[async_trait]
impl<S, T> FromRequest<S> for ApiJson<T>
where
    Json<T>: FromRequest<S, Rejection = JsonRejection>,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        match Json::<T>::from_request(req, state).await {
            Ok(Json(value)) => Ok(ApiJson(value)),
            Err(rejection) => Err(ApiError::BadRequest(rejection.body_text())),
        }
    }
}

/// The body as a JSON object
pub fn body_object(body: &Value) -> ApiResult<&Map<String, Value>> {
    body.as_object()
        .ok_or_else(|| ApiError::BadRequest("Request body must be a JSON object".to_string()))
}

/// Required non-empty array of non-empty string ids
pub fn id_list(body: &Value, field: &str) -> ApiResult<Vec<String>> {
    let value = body_object(body)?
        .get(field)
        .filter(|v| !v.is_null())
        .ok_or_else(|| ApiError::BadRequest(format!("{} is required", field)))?;

    let items = value
        .as_array()
        .ok_or_else(|| ApiError::BadRequest(format!("{} must be an array", field)))?;

    if items.is_empty() {
        return Err(ApiError::BadRequest(format!("{} must not be empty", field)));
    }

    items
        .iter()
        .map(|item| match item.as_str() {
            Some(id) if !id.trim().is_empty() => Ok(id.to_string()),
            _ => Err(ApiError::BadRequest(format!(
                "{} must contain only non-empty strings",
                field
            ))),
        })
        .collect()
}

/// Required array of objects, each deserialized as `T`
///
/// An empty array is valid. Element errors name their index.
pub fn record_list<T: DeserializeOwned>(body: &Value, field: &str) -> ApiResult<Vec<T>> {
    let value = body_object(body)?
        .get(field)
        .filter(|v| !v.is_null())
        .ok_or_else(|| ApiError::BadRequest(format!("{} is required", field)))?;

    let items = value
        .as_array()
        .ok_or_else(|| ApiError::BadRequest(format!("{} must be an array", field)))?;

    items
        .iter()
        .enumerate()
        .map(|(index, item)| {
            serde_json::from_value(item.clone())
                .map_err(|e| ApiError::BadRequest(format!("{}[{}]: {}", field, index, e)))
        })
        .collect()
}

/// Optional boolean flag, false when absent
pub fn optional_bool(body: &Value, field: &str) -> ApiResult<bool> {
    match body_object(body)?.get(field) {
        None | Some(Value::Null) => Ok(false),
        Some(Value::Bool(flag)) => Ok(*flag),
        Some(_) => Err(ApiError::BadRequest(format!("{} must be a boolean", field))),
    }
}

/// Required non-blank string field
pub fn required_string(body: &Value, field: &str) -> ApiResult<String> {
    match body_object(body)?.get(field) {
        Some(Value::String(s)) if !s.trim().is_empty() => Ok(s.trim().to_string()),
        Some(Value::String(_)) | None | Some(Value::Null) => {
            Err(ApiError::BadRequest(format!("{} is required", field)))
        }
        Some(_) => Err(ApiError::BadRequest(format!("{} must be a string", field))),
    }
}

/// Required object field
pub fn required_object<'a>(body: &'a Value, field: &str) -> ApiResult<&'a Map<String, Value>> {
    match body_object(body)?.get(field) {
        None | Some(Value::Null) => Err(ApiError::BadRequest(format!("{} is required", field))),
        Some(Value::Object(map)) => Ok(map),
        Some(_) => Err(ApiError::BadRequest(format!("{} must be an object", field))),
    }
}

/// Required map of id -> finite number
pub fn score_map(body: &Value, field: &str) -> ApiResult<BTreeMap<String, f64>> {
    let map = required_object(body, field)?;
    map.iter()
        .map(|(id, value)| {
            if id.trim().is_empty() {
                return Err(ApiError::BadRequest(format!("{} keys must be non-empty", field)));
            }
            match value.as_f64() {
                Some(score) if score.is_finite() => Ok((id.clone(), score)),
                _ => Err(ApiError::BadRequest(format!(
                    "{} values must be numbers",
                    field
                ))),
            }
        })
        .collect()
}
