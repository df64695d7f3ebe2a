//! Data models: receipts, vendors and configuration.

pub mod config;
pub mod receipt;
pub mod vendor;
