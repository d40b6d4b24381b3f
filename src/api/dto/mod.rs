//! Data Transfer Objects for REST request/response serialization.
//!
//! Scheduler-facing bodies use camelCase keys; everything else keeps the
//! snake_case field names.

pub mod result_dto;
pub mod scrape_dto;

pub use result_dto::*;
pub use scrape_dto::*;
