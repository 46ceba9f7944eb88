//! Navigation kernel library
//!
//! Menu models, the navigation cache, change propagation, and rendering.
//! The main entry point for running the server is the `navigation` binary.

pub mod config;
pub mod db;
pub mod error;
pub mod models;
pub mod nav;
pub mod routes;
pub mod state;
pub mod store;

pub use config::Config;
pub use error::{AppError, AppResult, NavError, NavResult};
pub use state::AppState;
