pub mod format;
mod lookup;

pub use lookup::{LookupError, LookupService};
