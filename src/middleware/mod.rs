mod rate_limit;
mod request_id;

pub use rate_limit::{RateLimitError, add_rate_limit_headers, caller_key, rate_limit_middleware};
pub use request_id::{REQUEST_ID_HEADER, RequestId, request_id_middleware};
