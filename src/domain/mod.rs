//! Core domain types and logic.

pub mod bar;
pub mod config_validation;
pub mod error;
pub mod indicator;
pub mod ledger;
pub mod session;
pub mod signal;
pub mod trade;
