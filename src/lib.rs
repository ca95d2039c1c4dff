pub mod cli;
pub mod config;
pub mod curation;
pub mod models;
pub mod service;
pub mod store;
pub mod telemetry;
pub mod ui;
