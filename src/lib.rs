pub mod catalog_source;
pub mod cli;
pub mod config;
pub mod error;
pub mod export;
pub mod fill;
pub mod logging;
pub mod session;
pub mod store;
