//! Repository tests against in-memory SQLite.
//!
//! The panel owns the schema, so there are no migrations to run; the harness
//! creates the two tables this service reads with the column types the panel
//! uses.

pub mod harness;
