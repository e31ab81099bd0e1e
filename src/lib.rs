pub mod cli;
pub mod config;
pub mod dashboard;
pub mod data_loader;
pub mod error;
pub mod logging;
pub mod models;
pub mod timestamp;
pub mod validation;

pub use error::{Error, Result};
