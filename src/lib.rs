#[macro_use]
extern crate rust_i18n;

pub mod assistant;
pub mod config;
pub mod conflict;
pub mod error;
pub mod models;
pub mod proxy;
pub mod server;
pub mod shutdown;
pub mod startup;
pub mod store;
pub mod utils;

// Initialize i18n
i18n!("locales", fallback = "en");
