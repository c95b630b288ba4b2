use std::{sync::Arc, thread};

use crossbeam_channel::{Receiver, Sender, unbounded};
use gpui::prelude::FluentBuilder;
use gpui::{
    AnyElement, App, AppContext, Context, FocusHandle, Focusable, InteractiveElement, IntoElement,
    KeyDownEvent, ObjectFit, ParentElement, Render, RenderImage, SharedString, Styled,
    StyledImage, TitlebarOptions, Window, WindowOptions, div, img, px,
};
use gpui_component::{
    ActiveTheme, Root, StyledExt,
    button::{Button, ButtonVariants},
    h_flex,
    tag::Tag,
    v_flex,
};
use image::{Frame as ImageFrame, ImageBuffer, Rgba};

use crate::{
    model_download::DownloadEvent,
    pipeline::{
        CameraDevice, CameraStream, CompositorCommand, available_cameras, start_frame_compositor,
    },
    tracker::{self, TrackerBackend},
    types::{CompositedFrame, EffectKind, Frame, TrackedFrame},
};

mod camera_view;
mod download;
mod main_view;
mod render_util;

/// All channel endpoints the UI either keeps or hands to the workers.
pub struct PipelineChannels {
    pub cam_frame_tx: Sender<Frame>,
    pub cam_frame_rx: Receiver<Frame>,
    pub track_frame_tx: Sender<Frame>,
    pub track_frame_rx: Receiver<Frame>,
    pub tracked_tx: Sender<TrackedFrame>,
    pub tracked_rx: Receiver<TrackedFrame>,
    pub command_tx: Sender<CompositorCommand>,
    pub command_rx: Receiver<CompositorCommand>,
    pub out_tx: Sender<CompositedFrame>,
    pub out_rx: Receiver<CompositedFrame>,
}

pub fn launch_ui(
    app: &mut App,
    channels: PipelineChannels,
    backend: TrackerBackend,
) -> gpui::Result<()> {
    let window_options = WindowOptions {
        titlebar: Some(TitlebarOptions {
            title: Some("riftcam".into()),
            ..Default::default()
        }),
        ..Default::default()
    };

    app.open_window(window_options, move |window, app| {
        let view = app.new(|cx| AppView::new(cx, channels, backend));
        app.new(|cx| Root::new(view, window, cx))
    })?;

    Ok(())
}

struct AppView {
    screen: Screen,
    // Worker-side endpoints, taken out when the workers spawn.
    cam_frame_rx: Option<Receiver<Frame>>,
    track_frame_rx: Option<Receiver<Frame>>,
    tracked_tx: Option<Sender<TrackedFrame>>,
    tracked_rx: Option<Receiver<TrackedFrame>>,
    command_rx: Option<Receiver<CompositorCommand>>,
    out_tx: Option<Sender<CompositedFrame>>,
    // Endpoints the UI keeps for itself.
    cam_frame_tx: Sender<Frame>,
    track_frame_tx: Sender<Frame>,
    command_tx: Sender<CompositorCommand>,
    out_rx: Receiver<CompositedFrame>,

    backend: TrackerBackend,
    tracker_handle: Option<thread::JoinHandle<()>>,
    compositor_handle: Option<thread::JoinHandle<()>>,
    camera_stream: Option<CameraStream>,
    available_cameras: Vec<CameraDevice>,
    selected_camera_idx: Option<usize>,
    camera_error: Option<String>,
    camera_picker_open: bool,

    selected_effect: EffectKind,
    latest: Option<CompositedFrame>,
    latest_image: Option<Arc<RenderImage>>,

    download_rx: Receiver<DownloadMessage>,
    _download_handle: thread::JoinHandle<()>,

    focus_handle: FocusHandle,
    focused_once: bool,
}

enum Screen {
    Camera(CameraState),
    Download(DownloadState),
    Main,
}

enum CameraState {
    Unavailable {
        message: String,
    },
    Selection {
        options: Vec<CameraDevice>,
        selected: usize,
        start_error: Option<String>,
    },
    Ready,
}

struct DownloadState {
    current: String,
    downloaded: u64,
    total: Option<u64>,
    models_done: usize,
    models_total: usize,
    error: Option<String>,
    finished: bool,
}

impl DownloadState {
    fn new(models_total: usize) -> Self {
        Self {
            current: "Preparing model downloads...".to_string(),
            downloaded: 0,
            total: None,
            models_done: 0,
            models_total,
            error: None,
            finished: false,
        }
    }
}

enum DownloadMessage {
    Event(DownloadEvent),
    AllDone,
    Error(String),
}

impl AppView {
    fn new(cx: &mut Context<'_, Self>, channels: PipelineChannels, backend: TrackerBackend) -> Self {
        let (download_tx, download_rx) = unbounded();
        let download_handle = download::spawn_model_downloads(backend.clone(), download_tx);

        let (initial_camera_state, available_cameras) = Self::initial_camera_state();
        let selected_camera_idx = if available_cameras.is_empty() {
            None
        } else {
            Some(0)
        };

        Self {
            screen: Screen::Camera(initial_camera_state),
            cam_frame_rx: Some(channels.cam_frame_rx),
            track_frame_rx: Some(channels.track_frame_rx),
            tracked_tx: Some(channels.tracked_tx),
            tracked_rx: Some(channels.tracked_rx),
            command_rx: Some(channels.command_rx),
            out_tx: Some(channels.out_tx),
            cam_frame_tx: channels.cam_frame_tx,
            track_frame_tx: channels.track_frame_tx,
            command_tx: channels.command_tx,
            out_rx: channels.out_rx,
            backend,
            tracker_handle: None,
            compositor_handle: None,
            camera_stream: None,
            available_cameras,
            selected_camera_idx,
            camera_error: None,
            camera_picker_open: false,
            selected_effect: EffectKind::Skeleton,
            latest: None,
            latest_image: None,
            download_rx,
            _download_handle: download_handle,
            focus_handle: cx.focus_handle(),
            focused_once: false,
        }
    }

    fn start_workers_if_needed(&mut self) {
        if self.tracker_handle.is_none() {
            match (self.track_frame_rx.take(), self.tracked_tx.take()) {
                (Some(frame_rx), Some(tracked_tx)) => {
                    self.tracker_handle = Some(tracker::start_tracker(
                        self.backend.clone(),
                        frame_rx,
                        tracked_tx,
                    ));
                }
                _ => log::warn!("tracker endpoints already taken"),
            }
        }

        if self.compositor_handle.is_none() {
            match (
                self.cam_frame_rx.take(),
                self.tracked_rx.take(),
                self.command_rx.take(),
                self.out_tx.take(),
            ) {
                (Some(frame_rx), Some(tracked_rx), Some(command_rx), Some(out_tx)) => {
                    self.compositor_handle = Some(start_frame_compositor(
                        self.selected_effect,
                        frame_rx,
                        tracked_rx,
                        command_rx,
                        out_tx,
                    ));
                }
                _ => log::warn!("compositor endpoints already taken"),
            }
        }
    }

    fn select_effect(&mut self, kind: EffectKind) {
        if self.selected_effect != kind {
            self.selected_effect = kind;
            let _ = self.command_tx.send(CompositorCommand::SelectEffect(kind));
        }
    }

    fn handle_key(&mut self, event: &KeyDownEvent, _: &mut Window, cx: &mut Context<'_, Self>) {
        match event.keystroke.key.as_str() {
            "q" | "escape" => cx.quit(),
            key => {
                if let Some(kind) = key
                    .chars()
                    .next()
                    .and_then(|c| c.to_digit(10))
                    .and_then(EffectKind::from_digit)
                {
                    self.select_effect(kind);
                    cx.notify();
                }
            }
        }
    }
}

impl Focusable for AppView {
    fn focus_handle(&self, _cx: &App) -> FocusHandle {
        self.focus_handle.clone()
    }
}

impl Render for AppView {
    fn render(
        &mut self,
        window: &mut Window,
        cx: &mut Context<'_, Self>,
    ) -> impl gpui::IntoElement {
        cx.defer_in(window, |_, _, cx| {
            cx.notify();
        });

        let mut screen = std::mem::replace(&mut self.screen, Screen::Main);
        let view = match screen {
            Screen::Camera(mut state) => {
                let view = self.render_camera_view(&mut state, cx);
                match state {
                    CameraState::Ready => {
                        screen = Screen::Download(DownloadState::new(
                            crate::model_download::ModelKind::ALL.len(),
                        ));
                    }
                    _ => {
                        screen = Screen::Camera(state);
                    }
                }
                view
            }
            Screen::Download(mut state) => {
                self.poll_download_events(&mut state);
                let should_switch = state.finished && state.error.is_none();
                let view = self.render_download_view(&state, cx);
                if should_switch {
                    self.start_workers_if_needed();
                    screen = Screen::Main;
                } else {
                    screen = Screen::Download(state);
                }
                view
            }
            Screen::Main => {
                screen = Screen::Main;
                self.render_main(window, cx)
            }
        };
        self.screen = screen;
        view
    }
}
