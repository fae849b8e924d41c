use std::time::{Duration, Instant};

use crossbeam_channel::{Receiver, Sender};
use eframe::egui;
use query_client::{markup::to_plain_text, ClientSettings, PanelState, QueryController};
use shared::domain::StatusKind;

use crate::backend_bridge::commands::BackendCommand;
use crate::controller::events::UiEvent;
use crate::controller::orchestration::{dispatch_backend_command, submit_query};

const ERROR_COLOR: egui::Color32 = egui::Color32::from_rgb(0x8b, 0x45, 0x13);
const SUCCESS_COLOR: egui::Color32 = egui::Color32::from_rgb(0x6b, 0x8e, 0x23);
const SOURCE_PREVIEW_CHARS: usize = 200;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum OutputTone {
    Answer,
    Error,
}

fn output_tone(markup: &str) -> OutputTone {
    if markup.starts_with(r#"<p class="error">"#) {
        OutputTone::Error
    } else {
        OutputTone::Answer
    }
}

fn status_color(kind: StatusKind, fallback: egui::Color32) -> egui::Color32 {
    match kind {
        StatusKind::Error => ERROR_COLOR,
        StatusKind::Success => SUCCESS_COLOR,
        StatusKind::Idle | StatusKind::Loading => fallback,
    }
}

fn preview(text: &str) -> String {
    let flat = text.replace('\n', " ");
    if flat.chars().count() <= SOURCE_PREVIEW_CHARS {
        flat
    } else {
        let cut: String = flat.chars().take(SOURCE_PREVIEW_CHARS).collect();
        format!("{cut}...")
    }
}

pub struct QueryConsoleApp {
    controller: QueryController<PanelState>,
    cmd_tx: Sender<BackendCommand>,
    ui_rx: Receiver<UiEvent>,
    worker_status: String,
    worker_failed: bool,
    focus_input: bool,
}

impl QueryConsoleApp {
    pub fn new(
        cmd_tx: Sender<BackendCommand>,
        ui_rx: Receiver<UiEvent>,
        settings: ClientSettings,
    ) -> Self {
        Self {
            controller: QueryController::new(PanelState::default(), settings),
            cmd_tx,
            ui_rx,
            worker_status: "Backend worker starting...".to_string(),
            worker_failed: false,
            focus_input: true,
        }
    }

    fn process_ui_events(&mut self) {
        while let Ok(event) = self.ui_rx.try_recv() {
            match event {
                UiEvent::Info(message) => {
                    self.worker_status = message;
                }
                UiEvent::QueryResolved { token, outcome } => {
                    self.controller.apply_outcome(token, outcome);
                    self.focus_input = true;
                }
                UiEvent::WorkerFailed(message) => {
                    tracing::error!("backend worker failed: {message}");
                    self.worker_status = message;
                    self.worker_failed = true;
                }
            }
        }
    }

    fn submit(&mut self) {
        submit_query(&mut self.controller, &self.cmd_tx);
    }

    fn show_query_row(&mut self, ui: &mut egui::Ui) {
        ui.horizontal(|ui| {
            let submit_enabled = self.controller.view().submit_enabled;
            let button_width = 96.0;
            let input = ui.add(
                egui::TextEdit::singleline(&mut self.controller.view_mut().query_input)
                    .id(egui::Id::new("query-input"))
                    .hint_text("Ask a question...")
                    .desired_width(ui.available_width() - button_width),
            );
            if self.focus_input {
                input.request_focus();
                self.focus_input = false;
            }

            let enter_pressed =
                input.lost_focus() && ui.input(|i| i.key_pressed(egui::Key::Enter));
            let clicked = ui
                .add_enabled(
                    submit_enabled,
                    egui::Button::new("Submit").min_size(egui::vec2(button_width - 8.0, 0.0)),
                )
                .clicked();

            if clicked || enter_pressed {
                self.submit();
                self.focus_input = true;
            }
        });
    }

    fn show_output_area(&self, ui: &mut egui::Ui, now: Instant) {
        let panel = self.controller.view();
        egui::Frame::group(ui.style()).show(ui, |ui| {
            ui.set_min_height(160.0);
            ui.set_width(ui.available_width());
            if panel.output.is_empty() {
                ui.weak("The answer will appear here.");
                return;
            }

            ui.set_opacity(panel.output.opacity_at(now));
            let text = to_plain_text(&panel.output.markup);
            egui::ScrollArea::vertical()
                .id_salt("output-area")
                .show(ui, |ui| match output_tone(&panel.output.markup) {
                    OutputTone::Answer => {
                        ui.label(egui::RichText::new(text).size(15.0));
                    }
                    OutputTone::Error => {
                        ui.label(egui::RichText::new(text).italics().color(ERROR_COLOR));
                    }
                });
        });

        if !panel.sources.is_empty() {
            egui::CollapsingHeader::new(format!("Sources ({})", panel.sources.len()))
                .id_salt("answer-sources")
                .show(ui, |ui| {
                    for (idx, chunk) in panel.sources.iter().enumerate() {
                        ui.label(
                            egui::RichText::new(format!(
                                "{}. {} ({}) score={:.4}",
                                idx + 1,
                                chunk.id,
                                chunk.source,
                                chunk.score
                            ))
                            .strong(),
                        );
                        ui.weak(preview(&chunk.text));
                        ui.add_space(4.0);
                    }
                });
        }
    }

    fn show_status_indicator(&self, ui: &mut egui::Ui) {
        let status = &self.controller.view().status;
        ui.horizontal(|ui| {
            if status.active {
                if status.is_loading() {
                    ui.spinner();
                }
                let color = status_color(status.kind, ui.visuals().text_color());
                ui.label(egui::RichText::new(&status.message).color(color));
            }
            ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                let worker = egui::RichText::new(&self.worker_status).small();
                if self.worker_failed {
                    ui.label(worker.color(ERROR_COLOR));
                } else {
                    ui.weak(worker);
                }
            });
        });
    }

    fn schedule_repaint(&self, ctx: &egui::Context, now: Instant) {
        let animating = self.controller.in_flight().is_some()
            || self.controller.view().output.is_fading(now);
        if animating {
            ctx.request_repaint_after(Duration::from_millis(16));
        } else if let Some(deadline) = self.controller.success_deadline() {
            ctx.request_repaint_after(deadline.saturating_duration_since(now));
        }
    }
}

impl eframe::App for QueryConsoleApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.process_ui_events();
        let now = Instant::now();
        self.controller.tick(now);

        egui::TopBottomPanel::bottom("status-indicator").show(ctx, |ui| {
            self.show_status_indicator(ui);
        });
        egui::CentralPanel::default().show(ctx, |ui| {
            ui.heading("Query Console");
            ui.weak(format!("Endpoint: {}", self.controller.settings().endpoint));
            ui.add_space(8.0);
            self.show_query_row(ui);
            ui.add_space(12.0);
            self.show_output_area(ui, now);
        });

        self.schedule_repaint(ctx, now);
    }
}

impl Drop for QueryConsoleApp {
    fn drop(&mut self) {
        if let Err(err) = dispatch_backend_command(&self.cmd_tx, BackendCommand::CancelInFlight) {
            tracing::debug!("cancel on shutdown not delivered: {err}");
        }
    }
}
