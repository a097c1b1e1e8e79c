mod client_traffic;
mod validators;

pub use client_traffic::*;
pub use validators::*;
