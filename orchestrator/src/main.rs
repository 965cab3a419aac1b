mod console;

use anyhow::Result;
use clap::Parser;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc::{UnboundedSender, unbounded_channel};
use tracing::info;

use console::{ConsoleSurface, admit_line};
use tutor_orchestrator::{
    Command, HttpBackend, ScriptedBackend, SubmitGate, TurnOrchestrator, TutorBackend,
};

/// Line-mode English practice chat. Plain lines are sent to the teacher;
/// lines starting with `/` are commands (`/help` lists them).
#[derive(Parser, Debug)]
#[command(name = "tutor_orchestrator", version)]
struct Args {
    /// Base URL of the tutoring backend.
    #[arg(long, env = "TUTOR_SERVER_URL", default_value = "http://localhost:8000")]
    server: String,

    /// Use canned offline replies instead of the backend.
    #[arg(long)]
    mock: bool,

    #[arg(long)]
    debug: bool,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let args = Args::parse();
    tutor_common::log::init(args.debug)?;

    let backend: Arc<dyn TutorBackend> = if args.mock {
        info!("[orchestrator] Using scripted backend");
        Arc::new(ScriptedBackend::default())
    } else {
        info!("[orchestrator] Using backend at {}", args.server);
        Arc::new(HttpBackend::new(&args.server))
    };

    let surface = Arc::new(ConsoleSurface::default());
    let mut orchestrator = TurnOrchestrator::new(backend, surface.clone());
    orchestrator.load_config().await;
    // The greeting translation finishes in the background.
    let _ = orchestrator.reset();

    info!("[orchestrator] Ready. Type text and press Enter (Ctrl+D to quit, /help for commands).");

    let (tx, rx) = unbounded_channel();
    let reader = tokio::spawn(read_commands(tx, orchestrator.gate(), surface));
    orchestrator.serve(rx).await;
    reader.await??;

    info!("[orchestrator] Session ended.");
    Ok(())
}

/// Read stdin on its own task so lines typed during a pending reply are
/// judged against the gate when they arrive, not after the reply lands.
async fn read_commands(
    commands: UnboundedSender<Command>,
    gate: SubmitGate,
    surface: Arc<ConsoleSurface>,
) -> std::io::Result<()> {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        if let Some(command) = admit_line(&line, !gate.is_open(), &*surface)
            && commands.send(command).is_err()
        {
            break;
        }
    }
    Ok(())
}
