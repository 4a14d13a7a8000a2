//! Core types, errors, amounts, dates, retry and configuration.
//!
//! Everything here is free of XML and provider concerns so the parser, the
//! carrier reconciliation and the ledger writer can share it.

mod calendar;
mod config;
mod error;
pub mod money;
mod retry;
mod types;

pub use calendar::*;
pub use config::*;
pub use error::*;
pub use retry::*;
pub use types::*;
