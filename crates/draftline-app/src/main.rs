// Draftline entry point.
//
// Startup sequence:
// 1. Resolve the base directory and initialize tracing (log to file)
// 2. Load config, copying defaults on first run
// 3. Build the app state (player pool, tiers, trade advisor)
// 4. Create mpsc channels
// 5. Spawn the command loop and the reply printer
// 6. Read chat lines from stdin until EOF
// 7. Wait for outstanding replies, then exit

use draftline_app::app;
use draftline_app::config;
use draftline_app::protocol::{Inbound, MessageAssembler, Reply};

use anyhow::Context;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;
use tracing::{error, info};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // 1. Tracing goes to a file; stdout carries the replies.
    let base_dir = config::resolve_base_dir().context("failed to locate config directory")?;
    init_tracing(&base_dir)?;
    info!("Draftline starting up (base dir {})", base_dir.display());

    // 2. Load config
    let config = config::load_config().context("failed to load configuration")?;
    info!(
        "Config loaded: league={}, {} teams, you are team {}",
        config.league.name, config.league.league_size, config.league.user_team
    );

    // 3-4. Channels first so the state can hand out advice senders.
    let (inbound_tx, inbound_rx) = mpsc::channel::<Inbound>(64);
    let (advice_tx, advice_rx) = mpsc::channel(16);
    let (reply_tx, mut reply_rx) = mpsc::channel::<Reply>(64);

    let state = app::AppState::from_config(config, advice_tx)?;

    // 5. Command loop and printer
    let app_handle = tokio::spawn(async move {
        if let Err(e) = app::run(inbound_rx, advice_rx, reply_tx, state).await {
            error!("Command loop error: {}", e);
        }
    });
    let printer_handle = tokio::spawn(async move {
        while let Some(reply) = reply_rx.recv().await {
            println!("{}\n", reply.text);
        }
    });

    // 6. stdin transport
    println!("Draftline ready. Type !help for commands.");
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut assembler = MessageAssembler::default();
    let mut next_id: u64 = 1;

    while let Some(line) = lines.next_line().await.context("failed to read stdin")? {
        if let Some(text) = assembler.push_line(&line) {
            let msg = Inbound { id: next_id, text };
            next_id += 1;
            if inbound_tx.send(msg).await.is_err() {
                error!("Command loop stopped; no longer reading input");
                break;
            }
        }
    }
    if let Some(text) = assembler.finish() {
        let _ = inbound_tx.send(Inbound { id: next_id, text }).await;
    }

    // 7. Closing the inbound side lets the loop drain pending trade advice.
    drop(inbound_tx);
    let _ = app_handle.await;
    let _ = printer_handle.await;

    info!("Draftline shut down cleanly");
    Ok(())
}

/// Initialize tracing to log to `<base>/logs/draftline.log`.
fn init_tracing(base_dir: &std::path::Path) -> anyhow::Result<()> {
    use tracing_subscriber::fmt;
    use tracing_subscriber::EnvFilter;

    let log_dir = base_dir.join("logs");
    std::fs::create_dir_all(&log_dir)
        .with_context(|| format!("failed to create {}", log_dir.display()))?;

    let log_file = std::fs::File::create(log_dir.join("draftline.log"))?;

    let subscriber = fmt::Subscriber::builder()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                EnvFilter::new(
                    "draftline=info,draftline_app=info,draftline_core=info,draftline_llm=info,warn",
                )
            }),
        )
        .with_writer(log_file)
        .with_ansi(false)
        .with_target(true)
        .with_thread_ids(true)
        .with_line_number(true)
        .finish();

    tracing::subscriber::set_global_default(subscriber)
        .context("failed to set tracing subscriber")?;

    Ok(())
}
