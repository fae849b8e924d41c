use std::{
    io::{self, Write},
    process::ExitCode,
};

use anyhow::{Context, Result};
use clap::Parser;
use query_client::{
    load_settings, markup::to_plain_text, Applied, HttpQueryTransport, QueryController,
    QueryTransport, QueryView, SettingsOverrides, StatusUpdate,
};
use shared::{domain::StatusKind, protocol::RetrievedChunk};
use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader};
use tracing_subscriber::EnvFilter;

const RULE_WIDTH: usize = 60;
const CHUNK_PREVIEW_CHARS: usize = 200;

#[derive(Parser, Debug)]
#[command(about = "Send queries to the query backend from a terminal")]
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
    /// Hide the retrieved context chunks
    #[arg(long)]
    no_sources: bool,
    /// Query text; reads one query per stdin line when omitted
    query: Vec<String>,
}

struct TerminalView<W: Write> {
    out: W,
    query: String,
    show_sources: bool,
    write_error: Option<io::Error>,
}

impl<W: Write> TerminalView<W> {
    fn new(out: W, show_sources: bool) -> Self {
        Self {
            out,
            query: String::new(),
            show_sources,
            write_error: None,
        }
    }

    fn emit(&mut self, text: &str) {
        if self.write_error.is_some() {
            return;
        }
        if let Err(err) = writeln!(self.out, "{text}").and_then(|()| self.out.flush()) {
            self.write_error = Some(err);
        }
    }

    fn take_write_error(&mut self) -> Option<io::Error> {
        self.write_error.take()
    }
}

impl<W: Write> QueryView for TerminalView<W> {
    fn query_text(&self) -> String {
        self.query.clone()
    }

    fn set_submit_enabled(&mut self, enabled: bool) {
        tracing::trace!(enabled, "submit control");
    }

    fn clear_output(&mut self) {}

    fn show_output(&mut self, markup: String) {
        let text = to_plain_text(&markup);
        let rule = "=".repeat(RULE_WIDTH);
        self.emit(&format!("{rule}\n{text}\n{rule}"));
    }

    fn show_status(&mut self, status: StatusUpdate) {
        let line = match status.kind {
            StatusKind::Loading => format!("... {}", status.message),
            StatusKind::Error => format!("!! {}", status.message),
            StatusKind::Success | StatusKind::Idle => format!("-- {}", status.message),
        };
        self.emit(&line);
    }

    fn deactivate_status(&mut self) {}

    fn show_sources(&mut self, chunks: &[RetrievedChunk]) {
        if !self.show_sources || chunks.is_empty() {
            return;
        }
        self.emit("Top Retrieved Chunks:");
        for (idx, chunk) in chunks.iter().enumerate() {
            self.emit(&format_chunk(idx + 1, chunk));
        }
    }
}

fn format_chunk(rank: usize, chunk: &RetrievedChunk) -> String {
    let preview: String = chunk
        .text
        .chars()
        .take(CHUNK_PREVIEW_CHARS)
        .collect::<String>()
        .replace('\n', " ");
    format!(
        "{rank}. {} ({}) score={:.4}\n    {preview} ...",
        chunk.id, chunk.source, chunk.score
    )
}

async fn ask<W: Write>(
    controller: &mut QueryController<TerminalView<W>>,
    transport: &dyn QueryTransport,
    query: String,
) -> Result<Applied> {
    controller.view_mut().query = query;
    let applied = controller.submit(transport).await;
    if let Some(err) = controller.view_mut().take_write_error() {
        return Err(err).context("failed to write query output");
    }
    Ok(applied)
}

/// Submits each input line; returns the outcome of the last one.
async fn run_lines<R, W>(
    controller: &mut QueryController<TerminalView<W>>,
    transport: &dyn QueryTransport,
    reader: R,
) -> Result<Option<Applied>>
where
    R: AsyncBufRead + Unpin,
    W: Write,
{
    let mut lines = reader.lines();
    let mut last = None;
    while let Some(line) = lines.next_line().await.context("failed to read query")? {
        last = Some(ask(controller, transport, line).await?);
    }
    Ok(last)
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(io::stderr)
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
    let transport = HttpQueryTransport::new(&settings).context("failed to build HTTP client")?;
    let view = TerminalView::new(io::stdout(), !args.no_sources);
    let mut controller = QueryController::new(view, settings);

    let last = if args.query.is_empty() {
        let stdin = BufReader::new(tokio::io::stdin());
        run_lines(&mut controller, &transport, stdin).await?
    } else {
        Some(ask(&mut controller, &transport, args.query.join(" ")).await?)
    };

    Ok(match last {
        Some(applied) if applied.is_error() => ExitCode::FAILURE,
        _ => ExitCode::SUCCESS,
    })
}
