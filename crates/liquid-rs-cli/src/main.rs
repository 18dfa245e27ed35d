use std::io::Write;
use std::process::ExitCode;

use liquid_rs_cli::command::CommandRegistry;
use liquid_rs_cli::commands::register_builtin_commands;
use liquid_rs_cli::load_settings;
use liquid_rs_core::logging::setup_logging;

fn main() -> ExitCode {
    let mut registry = CommandRegistry::new();
    register_builtin_commands(&mut registry);

    let matches = registry.build_cli().get_matches();

    let settings = match load_settings(&matches) {
        Ok(settings) => settings,
        Err(e) => {
            eprintln!("error: {e}");
            return ExitCode::FAILURE;
        }
    };
    setup_logging(&settings);

    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    let result = registry.execute(&matches, &settings, &mut out);
    out.flush().ok();

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e}");
            ExitCode::FAILURE
        }
    }
}
