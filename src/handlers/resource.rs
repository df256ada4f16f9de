//! Single handler behind every generated resource route.

use crate::error::AppError;
use crate::request::ApiRequest;
use crate::response::ApiResponse;
use crate::routes::RouteName;
use crate::state::AppState;
use axum::{
    body::Bytes,
    extract::{Path, State},
    http::HeaderMap,
    Extension,
};
use serde_json::{Map, Value};
use std::collections::HashMap;
use tracing::Instrument;

/// GET|POST|PUT|PATCH|DELETE on any resource route. The attached `RouteName` says which resource and action.
pub async fn dispatch(
    State(state): State<AppState>,
    Extension(route): Extension<RouteName>,
    params: Option<Path<HashMap<String, String>>>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<ApiResponse, AppError> {
    let span = tracing::info_span!(
        "resource_request",
        route = %route,
        request_id = %uuid::Uuid::new_v4()
    );
    async move {
        let request = ApiRequest {
            params: params.map(|Path(p)| p).unwrap_or_default(),
            headers,
            body: body_to_map(&body)?,
            validated_by: None,
        };
        state.controller.handle(route.as_str(), request).await
    }
    .instrument(span)
    .await
}

/// Empty body is an empty attribute set; anything else must be a JSON object.
fn body_to_map(bytes: &[u8]) -> Result<Map<String, Value>, AppError> {
    if bytes.iter().all(u8::is_ascii_whitespace) {
        return Ok(Map::new());
    }
    match serde_json::from_slice::<Value>(bytes) {
        Ok(Value::Object(m)) => Ok(m),
        Ok(_) => Err(AppError::BadRequest("body must be a JSON object".into())),
        Err(e) => Err(AppError::BadRequest(format!("invalid JSON body: {}", e))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_and_object_bodies_are_accepted() {
        assert!(body_to_map(b"").unwrap().is_empty());
        assert!(body_to_map(b" \n").unwrap().is_empty());
        assert_eq!(body_to_map(br#"{"a":1}"#).unwrap().len(), 1);
    }

    #[test]
    fn non_object_bodies_are_bad_requests() {
        assert!(matches!(body_to_map(b"[1]"), Err(AppError::BadRequest(_))));
        assert!(matches!(body_to_map(b"{oops"), Err(AppError::BadRequest(_))));
    }
}
