//! Command framework for the `liquid` tool.
//!
//! This module provides the [`Command`] trait for defining subcommands and
//! [`CommandRegistry`] for registering and dispatching them.
//!
//! ## Defining a Custom Command
//!
//! ```rust
//! use std::io::Write;
//! use liquid_rs_cli::command::{Command, CommandRegistry};
//! use liquid_rs_core::{LiquidResult, Settings};
//!
//! struct VersionCommand;
//!
//! impl Command for VersionCommand {
//!     fn name(&self) -> &'static str { "version" }
//!     fn help(&self) -> &'static str { "Print the version" }
//!
//!     fn handle(
//!         &self,
//!         _matches: &clap::ArgMatches,
//!         _settings: &Settings,
//!         out: &mut dyn Write,
//!     ) -> LiquidResult<()> {
//!         writeln!(out, "0.1.0")?;
//!         Ok(())
//!     }
//! }
//!
//! let mut registry = CommandRegistry::new();
//! registry.register(Box::new(VersionCommand));
//! assert_eq!(registry.list_commands(), vec!["version"]);
//! ```

use std::collections::HashMap;
use std::io::Write;

use liquid_rs_core::{LiquidError, LiquidResult, Settings};

/// A subcommand that can be registered and invoked through the CLI.
pub trait Command: Send + Sync {
    /// Returns the name used to invoke this command.
    fn name(&self) -> &'static str;

    /// Returns a short help description.
    fn help(&self) -> &'static str;

    /// Adds arguments to the clap command. The default adds none.
    fn add_arguments(&self, cmd: clap::Command) -> clap::Command {
        cmd
    }

    /// Runs the command, writing its output to `out`.
    fn handle(
        &self,
        matches: &clap::ArgMatches,
        settings: &Settings,
        out: &mut dyn Write,
    ) -> LiquidResult<()>;
}

/// A registry of commands, keyed by name.
pub struct CommandRegistry {
    commands: HashMap<&'static str, Box<dyn Command>>,
}

impl Default for CommandRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl CommandRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self {
            commands: HashMap::new(),
        }
    }

    /// Registers a command, replacing any command with the same name.
    pub fn register(&mut self, command: Box<dyn Command>) {
        self.commands.insert(command.name(), command);
    }

    /// Returns the command with the given name, if registered.
    pub fn get(&self, name: &str) -> Option<&dyn Command> {
        self.commands.get(name).map(AsRef::as_ref)
    }

    /// Returns the sorted command names.
    pub fn list_commands(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.commands.keys().copied().collect();
        names.sort_unstable();
        names
    }

    /// Returns the number of registered commands.
    pub fn len(&self) -> usize {
        self.commands.len()
    }

    /// Returns `true` if no commands are registered.
    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }

    /// Builds the top-level clap command with every registered subcommand.
    ///
    /// The global `--config` option names a TOML settings file.
    pub fn build_cli(&self) -> clap::Command {
        let mut app = clap::Command::new("liquid")
            .about("Render and check Liquid templates")
            .subcommand_required(true)
            .arg(
                clap::Arg::new("config")
                    .long("config")
                    .short('c')
                    .global(true)
                    .value_name("FILE")
                    .help("TOML settings file"),
            );

        let mut entries: Vec<_> = self.commands.values().collect();
        entries.sort_by_key(|cmd| cmd.name());

        for cmd in entries {
            let subcmd = clap::Command::new(cmd.name()).about(cmd.help());
            app = app.subcommand(cmd.add_arguments(subcmd));
        }

        app
    }

    /// Dispatches to the subcommand selected in `matches`.
    pub fn execute(
        &self,
        matches: &clap::ArgMatches,
        settings: &Settings,
        out: &mut dyn Write,
    ) -> LiquidResult<()> {
        let (name, sub_matches) = matches
            .subcommand()
            .ok_or_else(|| LiquidError::Configuration("No subcommand specified".to_string()))?;

        let cmd = self
            .get(name)
            .ok_or_else(|| LiquidError::Configuration(format!("Unknown command: {name}")))?;

        tracing::debug!(command = name, "running command");
        cmd.handle(sub_matches, settings, out)
    }
}
