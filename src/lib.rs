//! EquipTrack Equipment Inventory Server
//!
//! Tracks physical equipment items against equipment types that define
//! fixed-format serial-number masks. The core is the serial-number
//! validation and bulk-registration engine in [`services::equipment`] and
//! the mask grammar in [`mask`]; a thin REST layer exposes it.

use std::sync::Arc;

pub mod api;
pub mod config;
pub mod error;
pub mod mask;
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
