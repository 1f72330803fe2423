//! Base types and error handling.
//!
//! - [`neterror::HttpError`]: every failure the crate reports, with stable codes
//! - [`timing::Timings`]: lifecycle timestamps captured during an exchange

pub mod context;
pub mod neterror;
pub mod timing;
