pub mod cli_args;
pub mod client;
pub mod config;
pub mod diagnostics;
pub mod error;
pub mod model;
pub mod runner;
pub mod scenario;
mod utils;
pub mod verify;
