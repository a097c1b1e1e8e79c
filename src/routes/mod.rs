pub mod client_usage;
mod error;
pub mod health;

pub use client_usage::{lookup_client, method_not_allowed, preflight};
pub use error::ApiError;
