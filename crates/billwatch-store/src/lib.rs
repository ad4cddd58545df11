//! Persistent store: one JSON document holding every tracked bill.

mod error;
mod json;

pub use error::StoreError;
pub use json::{BillStore, SCHEMA_VERSION, StoreDocument};
