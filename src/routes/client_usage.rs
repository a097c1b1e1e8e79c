//! The client usage lookup endpoint.

use axum::{
    Json,
    extract::{State, rejection::BytesRejection},
    http::StatusCode,
};
use bytes::Bytes;
use serde_json::Value;

use super::ApiError;
use crate::{
    AppState,
    models::{UsageSnapshot, is_valid_client_id},
    observability::metrics,
};

/// Look up traffic usage for the client id in the request body.
///
/// Expects `{ "clientId": "<uuid>" }`. The body is parsed by hand so that
/// malformed input maps onto the endpoint's own error bodies instead of the
/// framework's rejection responses.
#[tracing::instrument(name = "client_usage.lookup", skip_all)]
pub async fn lookup_client(
    State(state): State<AppState>,
    body: Result<Bytes, BytesRejection>,
) -> Result<Json<UsageSnapshot>, ApiError> {
    let body = match body {
        Ok(body) => body,
        Err(rejection) => {
            let err = body_rejection(rejection);
            metrics::record_lookup(match err {
                ApiError::PayloadTooLarge => "invalid",
                _ => "error",
            });
            return Err(err);
        }
    };

    let client_id = match parse_client_id(&body) {
        Ok(id) => id,
        Err(e) => {
            metrics::record_lookup("invalid");
            return Err(e);
        }
    };

    match state.lookup.resolve(&client_id).await {
        Ok(snapshot) => {
            metrics::record_lookup("found");
            Ok(Json(snapshot))
        }
        Err(e) => {
            let err = ApiError::from(e);
            metrics::record_lookup(match err {
                ApiError::NotFound => "not_found",
                ApiError::Database => "store_error",
                _ => "error",
            });
            Err(err)
        }
    }
}

/// Preflight requests that were not answered by the CORS layer.
pub async fn preflight() -> StatusCode {
    StatusCode::OK
}

pub async fn method_not_allowed() -> ApiError {
    ApiError::MethodNotAllowed
}

/// Map a failure to read the request body onto the endpoint's error bodies.
fn body_rejection(rejection: BytesRejection) -> ApiError {
    if rejection.status() == StatusCode::PAYLOAD_TOO_LARGE {
        tracing::debug!(error = %rejection, "Request body over the configured limit");
        ApiError::PayloadTooLarge
    } else {
        tracing::warn!(error = %rejection, "Failed to read request body");
        ApiError::Internal
    }
}

/// Extract and validate `clientId` from a raw request body.
///
/// A body that is not a JSON object, or whose `clientId` is absent, null or
/// empty, counts as a missing id. Any other non-string value is a format
/// error.
pub fn parse_client_id(body: &[u8]) -> Result<String, ApiError> {
    let value: Value = match serde_json::from_slice(body) {
        Ok(v) => v,
        Err(e) => {
            tracing::debug!(error = %e, "Request body is not valid JSON");
            return Err(ApiError::MissingClientId);
        }
    };

    match value.get("clientId") {
        None | Some(Value::Null) => Err(ApiError::MissingClientId),
        Some(Value::String(id)) if id.is_empty() => Err(ApiError::MissingClientId),
        Some(Value::String(id)) if is_valid_client_id(id) => Ok(id.clone()),
        Some(_) => Err(ApiError::InvalidClientId),
    }
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;

    #[test]
    fn test_parse_valid_id() {
        let id = parse_client_id(br#"{"clientId": "11111111-1111-1111-1111-111111111111"}"#)
            .unwrap();
        assert_eq!(id, "11111111-1111-1111-1111-111111111111");
    }

    #[test]
    fn test_parse_ignores_extra_fields() {
        let id = parse_client_id(
            br#"{"clientId": "3F2504E0-4F89-11D3-9A0C-0305E82C3301", "extra": true}"#,
        )
        .unwrap();
        assert_eq!(id, "3F2504E0-4F89-11D3-9A0C-0305E82C3301");
    }

    #[rstest]
    #[case(b"{}")]
    #[case(br#"{"clientId": null}"#)]
    #[case(br#"{"clientId": ""}"#)]
    #[case(br#"{"client_id": "11111111-1111-1111-1111-111111111111"}"#)]
    #[case(b"")]
    #[case(b"not json")]
    #[case(b"[]")]
    #[case(br#""11111111-1111-1111-1111-111111111111""#)]
    fn test_parse_missing(#[case] body: &[u8]) {
        assert!(matches!(
            parse_client_id(body),
            Err(ApiError::MissingClientId)
        ));
    }

    #[rstest]
    #[case(br#"{"clientId": "not-a-uuid"}"#)]
    #[case(br#"{"clientId": "11111111-1111-1111-1111-11111111111"}"#)]
    #[case(br#"{"clientId": "111111111-111-1111-1111-111111111111"}"#)]
    #[case(br#"{"clientId": " 11111111-1111-1111-1111-111111111111"}"#)]
    #[case(br#"{"clientId": 42}"#)]
    #[case(br#"{"clientId": true}"#)]
    #[case(br#"{"clientId": ["11111111-1111-1111-1111-111111111111"]}"#)]
    fn test_parse_invalid(#[case] body: &[u8]) {
        assert!(matches!(
            parse_client_id(body),
            Err(ApiError::InvalidClientId)
        ));
    }
}
