pub mod cleanup;
pub mod config;
pub mod display;
pub mod errors;
pub mod runner;
pub mod stats;
pub mod types;
