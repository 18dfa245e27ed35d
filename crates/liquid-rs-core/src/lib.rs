//! # liquid-rs-core
//!
//! Error types, settings, and logging setup shared by the liquid-rs crates.
//!
//! ## Modules
//!
//! - [`error`] - The [`LiquidError`] taxonomy and result alias
//! - [`settings`] - Engine settings
//! - [`settings_loader`] - Loading settings from TOML, JSON, and the environment
//! - [`logging`] - Tracing-based logging integration

pub mod error;
pub mod logging;
pub mod settings;
pub mod settings_loader;

// Re-export the most commonly used types at the crate root.
pub use error::{LiquidError, LiquidResult};
pub use settings::Settings;
