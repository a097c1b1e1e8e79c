mod client_traffic;

pub use client_traffic::*;
