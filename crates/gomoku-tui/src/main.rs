// Face Gomoku entry point.
//
// Startup sequence:
// 1. Initialize tracing (log to file, not terminal)
// 2. Load config
// 3. Load preferences (theme, last nickname)
// 4. Create mpsc channels
// 5. Build the HTTP API client and the STOMP broker
// 6. Spawn app logic task
// 7. Run the TUI until the user quits
// 8. Cleanup on exit

use std::sync::Arc;

use gomoku_core::api::HttpApi;
use gomoku_core::config;
use gomoku_core::transport::StompBroker;
use gomoku_tui::app;
use gomoku_tui::tui;

use anyhow::Context;
use tokio::sync::mpsc;
use tracing::{error, info};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // 1. Initialize tracing (log to file, not terminal)
    init_tracing()?;
    info!("Face Gomoku starting up");

    // 2. Load config
    let config = config::load_config().context("failed to load configuration")?;
    info!(
        "Config loaded: server={}, ws={}",
        config.server.http_base(),
        config.server.ws_url()
    );

    // 3. Load preferences
    let prefs_path = app::default_prefs_path();
    let prefs = app::load_prefs(prefs_path.as_deref());
    info!("Preferences loaded: theme={:?}", prefs.theme);

    // 4. Create mpsc channels
    let (transport_tx, transport_rx) = mpsc::channel(256);
    let (api_tx, api_rx) = mpsc::channel(64);
    let (cmd_tx, cmd_rx) = mpsc::channel(64);
    let (ui_tx, ui_rx) = mpsc::channel(256);

    // 5. Server clients
    let api = Arc::new(HttpApi::new(&config.server));
    let broker = Arc::new(StompBroker::new(&config.server));

    let view_state = tui::ViewState::new(&config);
    let app_state = app::AppState::new(config, prefs, prefs_path, api, broker, api_tx, transport_tx);

    // 6. Spawn app logic task
    let app_handle = tokio::spawn(async move {
        if let Err(e) = app::run(transport_rx, api_rx, cmd_rx, ui_tx, app_state).await {
            error!("Application loop error: {}", e);
        }
    });

    // 7. Run the TUI event loop (blocking until user quits)
    info!("Application ready");
    if let Err(e) = tui::run(ui_rx, cmd_tx, view_state).await {
        error!("TUI error: {}", e);
    }

    // 8. Cleanup: wait for app task to finish (with timeout)
    let _ = tokio::time::timeout(std::time::Duration::from_secs(5), async {
        let _ = app_handle.await;
    })
    .await;

    info!("Face Gomoku shut down cleanly");
    Ok(())
}

/// Initialize tracing to log to a file (not the terminal, which is used by the TUI).
fn init_tracing() -> anyhow::Result<()> {
    use tracing_subscriber::fmt;
    use tracing_subscriber::EnvFilter;

    let log_dir = std::env::current_dir()?.join("logs");
    std::fs::create_dir_all(&log_dir)?;

    let log_file = std::fs::File::create(log_dir.join("face-gomoku.log"))?;

    let subscriber = fmt::Subscriber::builder()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("face_gomoku=info,gomoku_core=info,gomoku_tui=info,warn")),
        )
        .with_writer(log_file)
        .with_ansi(false)
        .with_target(true)
        .with_thread_ids(true)
        .with_line_number(true)
        .finish();

    tracing::subscriber::set_global_default(subscriber).context("failed to set tracing subscriber")?;

    Ok(())
}
