use std::cell::RefCell;
use std::path::PathBuf;
use std::process::ExitCode;
use std::rc::Rc;

use clap::{Parser, Subcommand};

use ct_scan_analyzer::app::{self, AppEvent, AppState, Command, SessionEnd, SessionMode};
use ct_scan_analyzer::backend::Backend;
use ct_scan_analyzer::config::Config;
use ct_scan_analyzer::ui::terminal::TerminalView;

#[derive(Parser, Debug)]
#[command(version, about)]
struct Cli {
    #[command(subcommand)]
    command: Option<Mode>,

    /// Origin of the prediction backend (overrides config and CT_SCAN_BACKEND_URL).
    #[arg(long, global = true, value_name = "URL")]
    backend_url: Option<String>,

    /// Fabricate results locally instead of calling the backend.
    #[arg(long, global = true, default_value_t = false)]
    simulate: bool,

    /// Write the effective configuration back to the config file.
    #[arg(long, global = true, default_value_t = false)]
    save_config: bool,
}

#[derive(Debug, Subcommand)]
enum Mode {
    /// Interactive session (default).
    Shell,
    /// Analyze one scan and exit.
    Analyze {
        #[arg(value_name = "FILE")]
        file: PathBuf,
    },
    /// Check whether the backend is up.
    Health,
}

fn main() -> ExitCode {
    env_logger::init();
    log::info!("CT scan analyzer starting");

    let cli = Cli::parse();

    let mut config = Config::load();
    if let Some(url) = cli.backend_url {
        config.backend_url = url;
    }
    if cli.simulate {
        config.simulate.enabled = true;
    }
    if cli.save_config {
        match config.save() {
            Ok(()) => println!("Saved config to {}", Config::path().display()),
            Err(e) => log::warn!("Failed to save config: {e}"),
        }
    }

    let runtime = match tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
    {
        Ok(rt) => rt,
        Err(e) => {
            eprintln!("Failed to create tokio runtime: {e}");
            return ExitCode::FAILURE;
        }
    };

    let code = match cli.command.unwrap_or(Mode::Shell) {
        Mode::Health => runtime.block_on(check_health(&config)),
        Mode::Analyze { file } => {
            runtime.block_on(run_session(config, SessionMode::OneShot, Some(file)))
        }
        Mode::Shell => runtime.block_on(run_session(config, SessionMode::Interactive, None)),
    };

    // The stdin reader may still be blocked on a read.
    runtime.shutdown_background();
    code
}

async fn run_session(config: Config, mode: SessionMode, file: Option<PathBuf>) -> ExitCode {
    let (sender, events) = async_channel::unbounded::<AppEvent>();

    let mut app_state = AppState::new(config, mode, sender.clone());
    app_state.view = Some(TerminalView::new());
    let state = Rc::new(RefCell::new(app_state));

    app::start_session(&state);

    match file {
        Some(path) => {
            let _ = sender.send(AppEvent::Command(Command::Open(path))).await;
        }
        None => {
            println!("{}", app::HELP);
            app::spawn_input_reader(sender);
        }
    }

    let end = app::run(&state, events).await;
    {
        let mut s = state.borrow_mut();
        s.indicator.hide();
        s.flow.reset();
    }

    match end {
        SessionEnd::Failed => ExitCode::FAILURE,
        SessionEnd::Quit | SessionEnd::Verdict => ExitCode::SUCCESS,
    }
}

async fn check_health(config: &Config) -> ExitCode {
    match Backend::from_config(config) {
        Backend::Remote(client) => match client.health().await {
            Ok(report) => {
                TerminalView::new().show_health(client.origin(), &report);
                ExitCode::SUCCESS
            }
            Err(e) => {
                eprintln!("Backend at {} is unavailable: {e}", client.origin());
                ExitCode::FAILURE
            }
        },
        Backend::Simulated(_) => {
            println!("Simulated backend: always available");
            ExitCode::SUCCESS
        }
    }
}
