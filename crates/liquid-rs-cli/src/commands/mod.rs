//! Built-in commands.
//!
//! Each command implements the [`Command`](crate::command::Command) trait.

pub mod check;
pub mod render;

pub use check::CheckCommand;
pub use render::RenderCommand;

use std::path::PathBuf;

use liquid_rs_core::{LiquidResult, Settings};
use liquid_rs_template::{Engine, Template};

use crate::command::CommandRegistry;

/// Registers every built-in command into the given registry.
pub fn register_builtin_commands(registry: &mut CommandRegistry) {
    registry.register(Box::new(RenderCommand));
    registry.register(Box::new(CheckCommand));
}

/// Adds the `<file>` and `--templates` arguments shared by the built-in commands.
fn template_arguments(cmd: clap::Command) -> clap::Command {
    cmd.arg(
        clap::Arg::new("file")
            .required(true)
            .value_name("FILE")
            .help("Template file"),
    )
    .arg(
        clap::Arg::new("templates")
            .long("templates")
            .short('t')
            .value_name("DIR")
            .action(clap::ArgAction::Append)
            .help("Directory searched for included partials"),
    )
}

/// Builds an engine from `settings` plus any `--templates` directories, then
/// reads and parses the `<file>` argument.
fn load_template(matches: &clap::ArgMatches, settings: &Settings) -> LiquidResult<(Engine, Template)> {
    let mut settings = settings.clone();
    if let Some(dirs) = matches.get_many::<String>("templates") {
        settings.template_dirs.extend(dirs.map(PathBuf::from));
    }
    let engine = Engine::from_settings(&settings);

    let file = matches
        .get_one::<String>("file")
        .map(String::as_str)
        .unwrap_or_default();
    let source = std::fs::read_to_string(file)?;
    let template = engine.parse(&source)?;
    Ok((engine, template))
}
