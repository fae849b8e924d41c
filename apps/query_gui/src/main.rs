mod backend_bridge;
mod controller;
mod ui;

use anyhow::{anyhow, Context, Result};
use clap::Parser;
use crossbeam_channel::bounded;
use eframe::egui;
use query_client::{load_settings, SettingsOverrides};
use tracing_subscriber::EnvFilter;

use crate::backend_bridge::commands::BackendCommand;
use crate::controller::events::UiEvent;
use crate::ui::QueryConsoleApp;

#[derive(Parser, Debug)]
#[command(about = "Desktop window for asking the query backend")]
struct Args {
    /// Backend query endpoint, e.g. http://localhost:5000/query
    #[arg(long)]
    endpoint: Option<String>,
    /// Number of context chunks the backend should retrieve
    #[arg(long)]
    k: Option<u32>,
    #[arg(long)]
    timeout_ms: Option<u64>,
    /// Escape server-supplied error text before rendering it
    #[arg(long)]
    escape_server_errors: bool,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();
    let args = Args::parse();

    let settings = load_settings()
        .context("failed to load query console settings")?
        .with_overrides(SettingsOverrides {
            endpoint: args.endpoint,
            top_k: args.k,
            request_timeout_ms: args.timeout_ms,
            escape_server_errors: args.escape_server_errors,
        })
        .context("invalid command-line settings")?;
    tracing::info!(endpoint = %settings.endpoint, "starting query console");

    let (cmd_tx, cmd_rx) = bounded::<BackendCommand>(64);
    let (ui_tx, ui_rx) = bounded::<UiEvent>(256);

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_title("Query Console")
            .with_inner_size([820.0, 560.0])
            .with_min_inner_size([480.0, 360.0]),
        ..Default::default()
    };
    eframe::run_native(
        "Query Console",
        options,
        Box::new(move |cc| {
            let egui_ctx = cc.egui_ctx.clone();
            backend_bridge::runtime::launch(cmd_rx, ui_tx, settings.clone(), move || {
                egui_ctx.request_repaint()
            });
            Ok(Box::new(QueryConsoleApp::new(cmd_tx, ui_rx, settings)))
        }),
    )
    .map_err(|err| anyhow!("query console window failed: {err}"))
}
