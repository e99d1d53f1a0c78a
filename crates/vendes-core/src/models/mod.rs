//! Data models for sales-line extraction.

pub mod config;
pub mod record;
pub mod summary;
