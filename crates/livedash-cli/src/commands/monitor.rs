use std::path::Path;

use livedash_core::{Dashboard, PollMode};

use crate::SourceArgs;

pub fn run(source: &SourceArgs, mode: &str, log_file: Option<&Path>) {
    // The dashboard owns the terminal, so logs go to a file or nowhere.
    if let Some(path) = log_file {
        match std::fs::File::create(path) {
            Ok(file) => {
                env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
                    .target(env_logger::Target::Pipe(Box::new(file)))
                    .init();
            }
            Err(e) => {
                eprintln!("Error: cannot open log file {}: {e}", path.display());
                std::process::exit(1);
            }
        }
    }

    let (config, transport) = super::connect(source);
    let initial = match mode {
        "active" => PollMode::ActiveAuto,
        "passive" => PollMode::PassiveAuto,
        _ => PollMode::Manual,
    };

    let mut app = crate::tui::app::App::new(Dashboard::new(transport, config), initial);
    if let Err(e) = app.run() {
        eprintln!("TUI error: {e}");
        std::process::exit(1);
    }
}
