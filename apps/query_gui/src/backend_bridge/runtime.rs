//! Runtime bridge between UI command queue and backend event intake.

use std::{sync::Arc, thread};

use crossbeam_channel::{Receiver, Sender};
use query_client::{ClientSettings, HttpQueryTransport, QueryTransport};
use shared::domain::RequestToken;
use tokio::task::JoinHandle;

use crate::backend_bridge::commands::BackendCommand;
use crate::controller::events::UiEvent;

struct InFlight {
    token: RequestToken,
    task: JoinHandle<()>,
}

impl InFlight {
    fn cancel(self) {
        if !self.task.is_finished() {
            tracing::debug!(token = %self.token, "aborting in-flight query");
        }
        self.task.abort();
    }
}

pub fn launch(
    cmd_rx: Receiver<BackendCommand>,
    ui_tx: Sender<UiEvent>,
    settings: ClientSettings,
    repaint: impl Fn() + Send + Sync + 'static,
) {
    thread::spawn(move || {
        let repaint = Arc::new(repaint);
        let runtime = match tokio::runtime::Builder::new_multi_thread()
            .worker_threads(1)
            .enable_all()
            .build()
        {
            Ok(runtime) => runtime,
            Err(err) => {
                let _ = ui_tx.try_send(UiEvent::WorkerFailed(format!(
                    "backend worker startup failure: failed to build runtime: {err}"
                )));
                tracing::error!("failed to build backend runtime: {err}");
                return;
            }
        };

        let transport: Arc<dyn QueryTransport> = match HttpQueryTransport::new(&settings) {
            Ok(transport) => Arc::new(transport),
            Err(err) => {
                let _ = ui_tx.try_send(UiEvent::WorkerFailed(format!(
                    "backend worker startup failure: {err}"
                )));
                tracing::error!("failed to build query transport: {err}");
                return;
            }
        };

        runtime.block_on(async move {
            let _ = ui_tx.try_send(UiEvent::Info(format!(
                "Backend worker ready ({})",
                settings.endpoint
            )));
            repaint();

            let mut in_flight: Option<InFlight> = None;
            while let Ok(cmd) = cmd_rx.recv() {
                match cmd {
                    BackendCommand::Query { token, request } => {
                        if let Some(previous) = in_flight.take() {
                            previous.cancel();
                        }
                        tracing::info!(%token, "backend: query");

                        let transport = Arc::clone(&transport);
                        let ui_tx = ui_tx.clone();
                        let repaint = Arc::clone(&repaint);
                        let task = tokio::spawn(async move {
                            let outcome = transport.send_query(&request).await;
                            if let Err(err) = &outcome {
                                tracing::warn!(%token, "backend: query failed: {err}");
                            }
                            if ui_tx
                                .try_send(UiEvent::QueryResolved { token, outcome })
                                .is_err()
                            {
                                tracing::error!(%token, "backend: ui event queue unavailable");
                            }
                            repaint();
                        });
                        in_flight = Some(InFlight { token, task });
                    }
                    BackendCommand::CancelInFlight => {
                        if let Some(previous) = in_flight.take() {
                            previous.cancel();
                        }
                    }
                }
            }
            tracing::info!("backend: command queue closed; worker exiting");
        });
    });
}
