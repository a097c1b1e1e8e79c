use axum::{
    Json,
    extract::{Request, State},
    http::{HeaderMap, HeaderValue, Method, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
};
use serde_json::json;

use crate::{
    AppState, config::RateLimitConfig, observability::metrics, rate_limiter::RateLimitResult,
};

#[derive(Debug)]
pub enum RateLimitError {
    Exceeded {
        limit: u32,
        current: u32,
        retry_after: u64,
    },
}

impl IntoResponse for RateLimitError {
    fn into_response(self) -> Response {
        let RateLimitError::Exceeded {
            limit,
            current,
            retry_after,
        } = self;

        let mut response = (
            StatusCode::TOO_MANY_REQUESTS,
            Json(json!({ "error": "Too many requests" })),
        )
            .into_response();

        let remaining = limit.saturating_sub(current);
        let headers = response.headers_mut();
        headers.insert("X-RateLimit-Limit", HeaderValue::from(limit));
        headers.insert("X-RateLimit-Remaining", HeaderValue::from(remaining));
        headers.insert("X-RateLimit-Reset", HeaderValue::from(retry_after));
        headers.insert("Retry-After", HeaderValue::from(retry_after));

        response
    }
}

/// Per-caller rate limiting for the lookup endpoint.
///
/// Runs before any body parsing. Preflight requests pass through without
/// spending budget.
pub async fn rate_limit_middleware(
    State(state): State<AppState>,
    req: Request,
    next: Next,
) -> Result<Response, RateLimitError> {
    let config = &state.config.limits.rate_limit;
    if !config.enabled || req.method() == Method::OPTIONS {
        return Ok(next.run(req).await);
    }

    let key = caller_key(req.headers(), config);
    let result = state.rate_limiter.admit(&key);

    if !result.allowed {
        metrics::record_rate_limit("rejected");
        tracing::debug!(
            caller = %key,
            limit = result.limit,
            retry_after = result.reset_secs,
            tracked_keys = state.rate_limiter.tracked_keys(),
            "Rate limit exceeded"
        );
        return Err(RateLimitError::Exceeded {
            limit: result.limit,
            current: result.current,
            retry_after: result.reset_secs,
        });
    }

    metrics::record_rate_limit("allowed");

    let response = next.run(req).await;
    Ok(add_rate_limit_headers(response, &result))
}

/// Derive the rate limiter key from the caller's claimed address.
///
/// Headers are consulted in configured order; for a comma-separated value
/// (as in `X-Forwarded-For`) the leftmost entry is used. The values are
/// taken as-is without checking that they parse as addresses.
pub fn caller_key(headers: &HeaderMap, config: &RateLimitConfig) -> String {
    config
        .caller_key_headers
        .iter()
        .filter_map(|name| headers.get(name.as_str()))
        .filter_map(|value| value.to_str().ok())
        .filter_map(|value| value.split(',').next())
        .map(str::trim)
        .find(|candidate| !candidate.is_empty())
        .unwrap_or(config.fallback_key.as_str())
        .to_string()
}

pub fn add_rate_limit_headers(mut response: Response, rate_limit: &RateLimitResult) -> Response {
    let headers = response.headers_mut();
    headers.insert("X-RateLimit-Limit", HeaderValue::from(rate_limit.limit));
    headers.insert(
        "X-RateLimit-Remaining",
        HeaderValue::from(rate_limit.remaining()),
    );
    headers.insert("X-RateLimit-Reset", HeaderValue::from(rate_limit.reset_secs));

    response
}
