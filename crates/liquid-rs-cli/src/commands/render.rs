//! The `render` command.
//!
//! Parses a template file and renders it with data from a JSON object,
//! given inline with `--data` or read from `--data-file`.

use std::io::Write;

use liquid_rs_core::{LiquidError, LiquidResult, Settings};
use liquid_rs_template::Value;

use crate::command::Command;

/// Renders a template file to the output.
pub struct RenderCommand;

/// Parses `json` into the top-level assigns of a render.
///
/// The document must be a JSON object; its keys become global variables.
pub fn context_data(json: &str) -> LiquidResult<Vec<(String, Value)>> {
    let parsed: serde_json::Value = serde_json::from_str(json)
        .map_err(|e| LiquidError::Configuration(format!("Invalid JSON data: {e}")))?;

    match Value::from(parsed) {
        Value::Dict(map) => Ok(map.into_iter().collect()),
        other => Err(LiquidError::Configuration(format!(
            "Template data must be a JSON object, got {}",
            other.to_json()
        ))),
    }
}

impl Command for RenderCommand {
    fn name(&self) -> &'static str {
        "render"
    }

    fn help(&self) -> &'static str {
        "Render a template with JSON data"
    }

    fn add_arguments(&self, cmd: clap::Command) -> clap::Command {
        super::template_arguments(cmd)
            .arg(
                clap::Arg::new("data")
                    .long("data")
                    .short('d')
                    .value_name("JSON")
                    .conflicts_with("data-file")
                    .help("Template data as a JSON object"),
            )
            .arg(
                clap::Arg::new("data-file")
                    .long("data-file")
                    .value_name("FILE")
                    .help("Read template data from a JSON file"),
            )
    }

    fn handle(
        &self,
        matches: &clap::ArgMatches,
        settings: &Settings,
        out: &mut dyn Write,
    ) -> LiquidResult<()> {
        let (engine, template) = super::load_template(matches, settings)?;

        let data = if let Some(json) = matches.get_one::<String>("data") {
            context_data(json)?
        } else if let Some(path) = matches.get_one::<String>("data-file") {
            context_data(&std::fs::read_to_string(path)?)?
        } else {
            Vec::new()
        };

        let mut context = engine.new_context();
        context.merge(data);
        let output = template.render(&mut context)?;
        out.write_all(output.as_bytes())?;
        Ok(())
    }
}
