//! Biblioteca Library Reservation System
//!
//! A Rust REST API server managing a library catalog, its users, and the
//! reservation workflow that keeps a book's availability in step with its
//! reservation lifecycle.

use std::sync::Arc;

pub mod api;
pub mod config;
pub mod error;
pub mod models;
pub mod repository;
pub mod services;

pub use config::AppConfig;
pub use error::{AppError, AppResult};

/// Application state shared across all handlers
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub services: Arc<services::Services>,
}
