//! Per-service request handlers.

pub mod devicehub;
pub mod tools;
