//! Foundational types: instruments, price series, run records and errors.

pub mod error;
pub mod instrument;
pub mod price_series;
pub mod records;
