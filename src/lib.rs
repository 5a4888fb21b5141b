pub mod app;
pub mod config;
pub mod errors;
pub mod gcp;
pub mod types;
pub mod verification;
