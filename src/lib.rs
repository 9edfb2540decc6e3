//! Desktop viewer and CSV exporter for the CRIM relationship dataset.
//!
//! The dataset is fetched once per session, flattened into a table of
//! dot-path columns, filtered per category and exported as CSV.

pub mod app;
pub mod color;
pub mod config;
pub mod data;
pub mod error;
pub mod export;
pub mod session;
pub mod state;
pub mod ui;
