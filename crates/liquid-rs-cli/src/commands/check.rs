//! The `check` command.
//!
//! Parses a template file, including any partials it pulls in, and reports
//! the first syntax error without rendering anything.

use std::io::Write;

use liquid_rs_core::{LiquidResult, Settings};

use crate::command::Command;

/// Validates a template file.
pub struct CheckCommand;

impl Command for CheckCommand {
    fn name(&self) -> &'static str {
        "check"
    }

    fn help(&self) -> &'static str {
        "Check a template for syntax errors"
    }

    fn add_arguments(&self, cmd: clap::Command) -> clap::Command {
        super::template_arguments(cmd)
    }

    fn handle(
        &self,
        matches: &clap::ArgMatches,
        settings: &Settings,
        out: &mut dyn Write,
    ) -> LiquidResult<()> {
        let file = matches
            .get_one::<String>("file")
            .map(String::as_str)
            .unwrap_or_default();

        match super::load_template(matches, settings) {
            Ok((_, template)) => {
                tracing::info!(file, nodes = template.nodes().len(), "template is valid");
                writeln!(out, "{file}: ok")?;
                Ok(())
            }
            Err(e) => {
                tracing::warn!(file, error = %e, "template check failed");
                Err(e)
            }
        }
    }
}
