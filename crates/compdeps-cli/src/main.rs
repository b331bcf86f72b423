use std::path::PathBuf;
use std::process::ExitCode;

use compdeps_cli::commands::register_builtin_commands;
use compdeps_cli::{load_settings, CommandRegistry};
use compdeps_core::logging::setup_logging;

#[tokio::main]
async fn main() -> ExitCode {
    let mut registry = CommandRegistry::new();
    register_builtin_commands(&mut registry);
    let matches = registry.build_cli().get_matches();

    let settings_file = matches.get_one::<PathBuf>("settings").map(PathBuf::as_path);
    let settings = match load_settings(settings_file) {
        Ok(settings) => settings,
        Err(e) => {
            eprintln!("compdeps: {e}");
            return ExitCode::FAILURE;
        }
    };
    setup_logging(&settings);

    match registry.execute(&matches, &settings).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!(error = %e, "Command failed");
            eprintln!("compdeps: {e}");
            ExitCode::FAILURE
        }
    }
}
