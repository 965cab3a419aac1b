mod surface;
mod theme;
mod tui;

use anyhow::Result;
use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::mpsc::{UnboundedReceiver, unbounded_channel};
use tracing::{info, warn};

use surface::ChannelSurface;
use theme::ThemeStore;
use tutor_orchestrator::{Command, HttpBackend, ScriptedBackend, TurnOrchestrator, TutorBackend};

/// Terminal chat for practising English with an AI teacher.
#[derive(Parser, Debug)]
#[command(name = "tutor_client", version)]
struct Args {
    /// Base URL of the tutoring backend.
    #[arg(long, env = "TUTOR_SERVER_URL", default_value = "http://localhost:8000")]
    server: String,

    /// Use canned offline replies instead of the backend.
    #[arg(long)]
    mock: bool,

    #[arg(long)]
    debug: bool,

    /// Log destination; the terminal itself belongs to the UI.
    #[arg(long)]
    log_file: Option<PathBuf>,
}

fn main() -> Result<()> {
    let args = Args::parse();
    let log_path = args
        .log_file
        .clone()
        .unwrap_or_else(|| std::env::temp_dir().join("tutor_client.log"));
    tutor_common::log::init_to_file(&log_path, args.debug)?;

    let backend: Arc<dyn TutorBackend> = if args.mock {
        info!("[client] Using scripted backend");
        Arc::new(ScriptedBackend::default())
    } else {
        info!("[client] Using backend at {}", args.server);
        Arc::new(HttpBackend::new(&args.server))
    };

    let (ui_tx, ui_rx) = crossbeam_channel::unbounded();
    let (cmd_tx, cmd_rx) = unbounded_channel::<Command>();

    let orchestrator = TurnOrchestrator::new(backend, Arc::new(ChannelSurface::new(ui_tx)));
    let gate = orchestrator.gate();

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?;
    // Not joined: quitting the UI ends the process, cancelling requests in flight.
    std::thread::Builder::new()
        .name("orchestrator".into())
        .spawn(move || runtime.block_on(run_orchestrator(orchestrator, cmd_rx)))?;

    tui::run(ui_rx, cmd_tx, gate, ThemeStore::from_default_dir())?;
    info!("[client] Session ended");
    Ok(())
}

async fn run_orchestrator(
    mut orchestrator: TurnOrchestrator,
    commands: UnboundedReceiver<Command>,
) {
    orchestrator.load_config().await;
    // The greeting translation completes in the background.
    let _ = orchestrator.reset();

    orchestrator.serve(commands).await;
    warn!("[orchestrator] UI hung up");
}
