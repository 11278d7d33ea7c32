//! Desktop shell: draws the upload widget with egui and runs submissions on
//! the background tokio runtime.

use std::{path::PathBuf, sync::Arc};

use eframe::{egui, App, Frame};
use egui::{CursorIcon, Margin, Sense, Stroke};
// OnceCell for single-time runtime initialization
use once_cell::sync::OnceCell;
use rfd::FileDialog;
use tokio::{
    runtime::Runtime,
    sync::mpsc::{unbounded_channel, UnboundedReceiver},
};
use tracing::{info, warn};

use crate::{
    config::Config,
    error::UploadError,
    model::SelectedFile,
    upload::{annotate, Outcome, ReqwestTransport, SettleGuard, ARTIFACT_FILE_NAME},
    widget::UploadWidget,
};

// Global Tokio runtime stored in a OnceCell; set once by `main`
pub static RUNTIME: OnceCell<Arc<Runtime>> = OnceCell::new();

const MSG_NO_RUNTIME: &str = "Background runtime is not running.";

/// Application state for the GUI
pub struct AnnotatorApp {
    widget: UploadWidget,
    transport: Arc<ReqwestTransport>,
    /// Outcome of the submission in flight
    outcome_rx: Option<UnboundedReceiver<Outcome>>,
    /// Result of a "Save as..." in flight
    save_rx: Option<UnboundedReceiver<Result<PathBuf, UploadError>>>,
    /// Last save result: (text, is_error)
    save_notice: Option<(String, bool)>,
}

impl AnnotatorApp {
    pub fn new(config: &Config) -> Result<Self, UploadError> {
        let transport = ReqwestTransport::new(&config.server)?;
        info!(endpoint = %transport.endpoint(), "annotator ready");
        Ok(Self {
            widget: UploadWidget::new(),
            transport: Arc::new(transport),
            outcome_rx: None,
            save_rx: None,
            save_notice: None,
        })
    }

    fn poll_background(&mut self) {
        if let Some(rx) = self.outcome_rx.as_mut() {
            if let Ok(outcome) = rx.try_recv() {
                self.widget.settle(outcome);
                self.outcome_rx = None;
            }
        }
        if let Some(rx) = self.save_rx.as_mut() {
            if let Ok(result) = rx.try_recv() {
                self.save_notice = Some(match result {
                    Ok(path) => (format!("Saved to {}", path.display()), false),
                    Err(err) => {
                        warn!(%err, "saving artifact failed");
                        (format!("Save failed: {}", err), true)
                    }
                });
                self.save_rx = None;
            }
        }
    }

    fn handle_file_drag(&mut self, ctx: &egui::Context) {
        let (hovering, dropped) = ctx.input(|i| {
            (!i.raw.hovered_files.is_empty(), i.raw.dropped_files.clone())
        });
        apply_file_drag(&mut self.widget, hovering, &dropped);
    }

    fn submit(&mut self, ctx: &egui::Context) {
        let Some(file) = self.widget.begin_submit() else {
            return;
        };
        self.save_notice = None;
        let Some(rt) = RUNTIME.get() else {
            self.widget
                .settle(Err(UploadError::Transport(MSG_NO_RUNTIME.to_string())));
            return;
        };

        let (tx, rx) = unbounded_channel();
        self.outcome_rx = Some(rx);
        let transport = Arc::clone(&self.transport);
        let ctx_c = ctx.clone();
        rt.spawn(async move {
            let guard = SettleGuard::new(tx);
            let outcome = annotate(transport.as_ref(), file).await;
            guard.finish(outcome);
            ctx_c.request_repaint();
        });
    }

    fn save_as(&mut self, ctx: &egui::Context, url: String) {
        let Some(dest) = FileDialog::new()
            .set_file_name(ARTIFACT_FILE_NAME)
            .add_filter("PDF", &["pdf"])
            .save_file()
        else {
            return;
        };
        let Some(rt) = RUNTIME.get() else {
            self.save_notice = Some((MSG_NO_RUNTIME.to_string(), true));
            return;
        };

        let (tx, rx) = unbounded_channel();
        self.save_rx = Some(rx);
        self.save_notice = None;
        let transport = Arc::clone(&self.transport);
        let ctx_c = ctx.clone();
        rt.spawn(async move {
            let _ = tx.send(transport.save_artifact(url, dest).await);
            ctx_c.request_repaint();
        });
    }

    fn drop_zone(&mut self, ui: &mut egui::Ui) {
        let visuals = ui.visuals();
        let (stroke, fill) = if self.widget.is_dragging() {
            (
                Stroke::new(2.0, visuals.selection.stroke.color),
                visuals.selection.bg_fill.gamma_multiply(0.3),
            )
        } else {
            (visuals.widgets.noninteractive.bg_stroke, visuals.faint_bg_color)
        };
        let hint = if self.widget.is_dragging() {
            "Release to select the file"
        } else {
            "Drop a PDF score here, or click to choose one"
        };

        let response = egui::Frame::group(ui.style())
            .stroke(stroke)
            .fill(fill)
            .inner_margin(Margin::same(24.0))
            .show(ui, |ui| {
                ui.set_min_size(egui::vec2(ui.available_width(), 96.0));
                ui.centered_and_justified(|ui| ui.label(hint));
            })
            .response
            .interact(Sense::click())
            .on_hover_cursor(CursorIcon::PointingHand);

        if response.clicked() {
            if let Some(path) = FileDialog::new().add_filter("PDF score", &["pdf"]).pick_file() {
                self.widget.pick(SelectedFile::on_disk(path));
            }
        }
    }

    fn status_line(&self, ui: &mut egui::Ui) {
        let status = self.widget.status();
        if status.text.is_empty() {
            return;
        }
        let color = if status.is_error {
            ui.visuals().error_fg_color
        } else {
            ui.visuals().text_color()
        };
        ui.colored_label(color, status.text);
    }

    fn download_panel(&mut self, ui: &mut egui::Ui, ctx: &egui::Context) {
        let Some(meta) = self.widget.download() else {
            return;
        };
        let url = self.transport.resolve(&meta.download_url);
        let caption = meta.caption();

        let mut save_clicked = false;
        ui.group(|ui| {
            ui.horizontal(|ui| {
                ui.hyperlink_to("Download annotated PDF", &url);
                let saving = self.save_rx.is_some();
                save_clicked = ui.add_enabled(!saving, egui::Button::new("Save as...")).clicked();
            });
            if !caption.is_empty() {
                ui.label(caption);
            }
            if let Some((text, is_error)) = &self.save_notice {
                let color = if *is_error {
                    ui.visuals().error_fg_color
                } else {
                    ui.visuals().weak_text_color()
                };
                ui.colored_label(color, text.as_str());
            }
        });

        if save_clicked {
            self.save_as(ctx, url);
        }
    }
}

/// Maps one frame of egui file hover/drop input onto the widget's drag
/// transitions. Drops whose entries carry neither a path nor bytes count as
/// empty drops.
fn apply_file_drag(widget: &mut UploadWidget, hovering: bool, dropped: &[egui::DroppedFile]) {
    if !dropped.is_empty() {
        widget.drop_files(dropped.iter().filter_map(dropped_to_selection));
    } else if hovering {
        widget.drag_enter();
    } else {
        widget.drag_leave();
    }
}

/// Prefers the on-disk path; falls back to the bytes egui carried with the drop.
fn dropped_to_selection(file: &egui::DroppedFile) -> Option<SelectedFile> {
    match (&file.path, &file.bytes) {
        (Some(path), _) => Some(SelectedFile::on_disk(path.clone())),
        (None, Some(bytes)) => Some(SelectedFile::in_memory(file.name.clone(), bytes.clone())),
        (None, None) => None,
    }
}

impl App for AnnotatorApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut Frame) {
        self.poll_background();
        self.handle_file_drag(ctx);

        egui::CentralPanel::default().show(ctx, |ui| {
            ui.heading("Chord Annotator");
            ui.label("Upload a PDF score to add a chord part above the staff.");
            ui.add_space(8.0);

            self.drop_zone(ui);
            ui.add_space(8.0);

            let submit = ui.add_enabled(self.widget.submit_enabled(), egui::Button::new("Annotate"));
            if !self.widget.submit_enabled() {
                ui.spinner();
            }
            if submit.clicked() {
                self.submit(ctx);
            }

            self.status_line(ui);
            ui.add_space(8.0);
            self.download_panel(ui, ctx);
        });

        // Keep polling while work is in flight
        if self.outcome_rx.is_some() || self.save_rx.is_some() {
            ctx.request_repaint_after(std::time::Duration::from_millis(100));
        }
    }
}
