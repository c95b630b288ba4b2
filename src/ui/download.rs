use super::{
    ActiveTheme, AnyElement, AppView, Context, DownloadMessage, DownloadState, IntoElement,
    ParentElement, Sender, Styled, StyledExt, Tag, div, h_flex, thread, v_flex,
};
use crate::{
    model_download::{DownloadEvent, ModelKind, ensure_model_ready},
    tracker::TrackerBackend,
};

impl AppView {
    pub(super) fn poll_download_events(&mut self, state: &mut DownloadState) {
        while let Ok(msg) = self.download_rx.try_recv() {
            match msg {
                DownloadMessage::Event(DownloadEvent::AlreadyPresent { model }) => {
                    state.current = format!("{} model already present", model.label());
                }
                DownloadMessage::Event(DownloadEvent::Started { model, total }) => {
                    state.current = format!("Downloading the {} model...", model.label());
                    state.downloaded = 0;
                    state.total = total;
                }
                DownloadMessage::Event(DownloadEvent::Progress {
                    downloaded, total, ..
                }) => {
                    state.downloaded = downloaded;
                    state.total = total;
                }
                DownloadMessage::Event(DownloadEvent::Finished { .. }) => {
                    state.models_done += 1;
                }
                DownloadMessage::AllDone => {
                    state.finished = true;
                    state.current = "Models ready, starting the pipeline...".to_string();
                }
                DownloadMessage::Error(err) => {
                    state.error = Some(err);
                    state.finished = false;
                    state.current = "Model download failed".to_string();
                }
            }
        }
    }

    pub(super) fn render_download_view(
        &self,
        state: &DownloadState,
        cx: &mut Context<'_, Self>,
    ) -> AnyElement {
        let theme = cx.theme();
        let bar = progress_bar_string(state.downloaded, state.total);
        let detail = format!("{} of {} models ready", state.models_done, state.models_total);

        let (status_text, status_color) = if state.finished && state.error.is_none() {
            ("Models ready", theme.success)
        } else if state.error.is_some() {
            ("Model download failed", theme.accent)
        } else {
            ("Fetching landmark models", theme.foreground)
        };

        let mut container = v_flex()
            .gap_3()
            .p_6()
            .rounded_lg()
            .border_1()
            .border_color(theme.border)
            .bg(theme.group_box)
            .child(
                h_flex()
                    .gap_2()
                    .items_center()
                    .child(
                        div()
                            .text_color(status_color)
                            .font_semibold()
                            .child(status_text),
                    )
                    .child(
                        div()
                            .text_sm()
                            .text_color(theme.muted_foreground)
                            .child(detail),
                    ),
            )
            .child(
                div()
                    .px_3()
                    .py_2()
                    .rounded_md()
                    .border_1()
                    .border_color(theme.border)
                    .bg(theme.muted)
                    .font_family(theme.mono_font_family.clone())
                    .text_color(theme.foreground)
                    .child(bar),
            )
            .child(
                div()
                    .text_color(theme.foreground)
                    .child(state.current.clone()),
            );

        if let Some(err) = &state.error {
            container = container.child(Tag::danger().rounded_full().child(format!("error: {err}")));
        }

        v_flex()
            .size_full()
            .items_center()
            .justify_center()
            .bg(theme.background)
            .child(container)
            .into_any_element()
    }
}

/// Fetches every model in sequence on a worker thread, forwarding
/// progress to the UI.
pub(super) fn spawn_model_downloads(
    backend: TrackerBackend,
    tx: Sender<DownloadMessage>,
) -> thread::JoinHandle<()> {
    thread::spawn(move || {
        let models = [
            (ModelKind::PalmDetector, backend.palm_model.clone()),
            (ModelKind::HandLandmarker, backend.hand_model.clone()),
            (ModelKind::FaceDetector, backend.face_model.clone()),
            (ModelKind::FaceMesh, backend.mesh_model.clone()),
        ];

        for (kind, path) in models {
            let result = ensure_model_ready(kind, &path, |event| {
                let _ = tx.send(DownloadMessage::Event(event));
            });

            if let Err(err) = result {
                log::error!("failed to fetch {} model: {err:?}", kind.label());
                let _ = tx.send(DownloadMessage::Error(format!("{err:#}")));
                return;
            }
        }

        let _ = tx.send(DownloadMessage::AllDone);
    })
}

fn progress_bar_string(downloaded: u64, total: Option<u64>) -> String {
    const BAR_LEN: usize = 30;
    match total {
        Some(total) if total > 0 => {
            let pct = (downloaded as f64 / total as f64).clamp(0.0, 1.0);
            let filled = ((pct * BAR_LEN as f64).round() as usize).min(BAR_LEN);
            let empty = BAR_LEN.saturating_sub(filled);
            format!(
                "[{}{}] {:>5.1}%",
                "=".repeat(filled),
                " ".repeat(empty),
                pct * 100.0
            )
        }
        _ => {
            let spinner_width = ((downloaded / 64) as usize % (BAR_LEN.max(1))) + 1;
            format!(
                "[{:-<width$}] unknown size",
                ">",
                width = spinner_width.min(BAR_LEN)
            )
        }
    }
}
