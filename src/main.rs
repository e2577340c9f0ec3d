use std::path::PathBuf;
use std::process::ExitCode;

mod columns;
mod config;
mod controller;
mod domain;
mod events;
mod lineage;
mod model;
mod ui;

use clap::Parser;
use tracing::info;
use tracing_error::ErrorLayer;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use config::AppConfig;
use controller::Controller;
use domain::{CatvConfig, CatvError};
use events::ActionLog;
use model::{Model, Status};
use ui::TableUI;

#[derive(Parser)]
#[command(version, about = "A tui based data catalog column browser.")]
struct Args {
    /// Path to a table metadata JSON file
    path: String,

    /// Path to an application config JSON file
    #[arg(short, long)]
    config: Option<String>,
}

fn main() -> ExitCode {
    match run() {
        Err(e) => {
            ratatui::restore();
            eprintln!("Error: {:?}", e);
            ExitCode::FAILURE
        }
        Ok(_) => {
            ratatui::restore();
            ExitCode::SUCCESS
        }
    }
}

// The terminal owns stdout, so tracing goes to a log file and only when
// asked for via RUST_LOG.
fn init_tracing() -> Result<(), CatvError> {
    if std::env::var_os("RUST_LOG").is_none() {
        return Ok(());
    }
    let log_file = std::fs::File::create("catv.log")?;
    tracing_subscriber::registry()
        .with(EnvFilter::from_default_env())
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(log_file)
                .with_ansi(false),
        )
        .with(ErrorLayer::default())
        .try_init()
        .map_err(|e| CatvError::LoadingFailed(format!("tracing init failed: {e}")))?;
    Ok(())
}

fn expand_path(raw: &str) -> Result<PathBuf, CatvError> {
    let expanded = shellexpand::full(raw)
        .map_err(|e| CatvError::LoadingFailed(format!("cannot expand path {raw:?}: {e}")))?;
    Ok(PathBuf::from(expanded.into_owned()))
}

fn run() -> Result<(), CatvError> {
    let args = Args::parse();
    init_tracing()?;

    let app_config = match &args.config {
        Some(raw) => AppConfig::load(&expand_path(raw)?)?,
        None => AppConfig::default(),
    };
    let cfg = CatvConfig::default();

    // Drain action events out-of-band. The model never waits for this.
    let (action_log, events) = ActionLog::channel();
    std::thread::spawn(move || {
        for event in events {
            info!(
                command = %event.command,
                label = %event.label,
                target_id = %event.target_id,
                target_type = %event.target_type,
                "user action"
            );
        }
    });

    let mut model = Model::new(app_config, action_log);
    model.load_table_file(&expand_path(&args.path)?)?;

    let mut ui = TableUI::new();
    let controller = Controller::new(&cfg);
    let mut terminal = ratatui::init();

    while model.status != Status::Quitting {
        terminal.draw(|f| ui.draw(model.get_uidata(), f))?;
        if let Some(message) = controller.handle_event()? {
            model.update(message)?;
        }
    }

    Ok(())
}
