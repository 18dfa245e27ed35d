//! # liquid-rs-cli
//!
//! The `liquid` command-line tool.
//!
//! - **Command framework** - The [`Command`] trait and [`CommandRegistry`]
//! - **Built-in commands** - `render` and `check`
//!
//! ## Quick Start
//!
//! ```rust
//! use liquid_rs_cli::command::CommandRegistry;
//! use liquid_rs_cli::commands::register_builtin_commands;
//!
//! let mut registry = CommandRegistry::new();
//! register_builtin_commands(&mut registry);
//!
//! assert_eq!(registry.list_commands(), vec!["check", "render"]);
//! ```

pub mod command;
pub mod commands;

pub use command::{Command, CommandRegistry};

use liquid_rs_core::{settings_loader, LiquidResult, Settings};

/// Loads settings for a CLI invocation: the `--config` TOML file if one was
/// given, otherwise defaults, with `LIQUID_*` environment overrides on top.
pub fn load_settings(matches: &clap::ArgMatches) -> LiquidResult<Settings> {
    match matches.get_one::<String>("config") {
        Some(path) => settings_loader::from_toml_file_with_env(path),
        None => settings_loader::from_env(),
    }
}
