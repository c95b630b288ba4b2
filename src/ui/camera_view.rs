use super::{
    ActiveTheme, AnyElement, AppView, Button, ButtonVariants, CameraDevice, CameraState, Context,
    FluentBuilder, InteractiveElement, IntoElement, ParentElement, Screen, SharedString, Styled,
    StyledExt, available_cameras, div, h_flex, px, v_flex,
};
use crate::pipeline::start_camera_stream;

impl AppView {
    pub(super) fn initial_camera_state() -> (CameraState, Vec<CameraDevice>) {
        match available_cameras() {
            Ok(cameras) if cameras.is_empty() => (
                CameraState::Unavailable {
                    message: "No camera devices were found.".to_string(),
                },
                Vec::new(),
            ),
            Ok(cameras) => (
                CameraState::Selection {
                    options: cameras.clone(),
                    selected: 0,
                    start_error: None,
                },
                cameras,
            ),
            Err(err) => {
                log::error!("failed to enumerate cameras: {err:?}");
                (
                    CameraState::Unavailable {
                        message: format!("Camera enumeration failed: {err:#}"),
                    },
                    Vec::new(),
                )
            }
        }
    }

    pub(super) fn render_camera_view(
        &mut self,
        state: &mut CameraState,
        cx: &mut Context<'_, Self>,
    ) -> AnyElement {
        let theme = cx.theme();
        let background = theme.background;
        let foreground = theme.foreground;
        let muted_foreground = theme.muted_foreground;
        let accent = theme.accent;

        match state {
            CameraState::Unavailable { message } => v_flex()
                .size_full()
                .items_center()
                .justify_center()
                .gap_2()
                .bg(background)
                .child(
                    div()
                        .text_sm()
                        .font_semibold()
                        .text_color(accent)
                        .child("No camera available"),
                )
                .child(
                    div()
                        .text_xs()
                        .text_color(muted_foreground)
                        .child("Check the connection and the camera permission."),
                )
                .child(div().text_color(foreground).child(message.clone()))
                .into_any_element(),
            CameraState::Selection {
                options,
                selected,
                start_error,
            } => {
                // A single device needs no picker; start it directly.
                if options.len() == 1 && self.camera_stream.is_none() && start_error.is_none() {
                    match self.start_camera_for_device(&options[0].clone()) {
                        Ok(()) => {
                            *state = CameraState::Ready;
                            return div()
                                .child(div().child("Starting camera..."))
                                .into_any_element();
                        }
                        Err(err) => {
                            *start_error = Some(format!("Could not start the camera: {err}"));
                        }
                    }
                }

                let error_msg = start_error.clone();
                let picker = self.render_camera_picker(options.clone(), *selected, error_msg, cx);

                div()
                    .size_full()
                    .flex()
                    .items_center()
                    .justify_center()
                    .bg(background)
                    .child(div().w(px(450.0)).child(picker))
                    .into_any_element()
            }
            CameraState::Ready => v_flex()
                .size_full()
                .items_center()
                .justify_center()
                .bg(background)
                .child(
                    div()
                        .text_sm()
                        .text_color(foreground)
                        .child("Starting camera..."),
                )
                .into_any_element(),
        }
    }

    fn render_camera_picker(
        &mut self,
        cameras: Vec<CameraDevice>,
        selected_idx: usize,
        error_msg: Option<String>,
        cx: &mut Context<'_, Self>,
    ) -> AnyElement {
        let theme = cx.theme();
        let group_box = theme.group_box;
        let border = theme.border;
        let foreground = theme.foreground;
        let muted = theme.muted;
        let accent = theme.accent;

        let mut picker = v_flex()
            .gap_2()
            .p_4()
            .rounded_xl()
            .bg(group_box)
            .border_1()
            .border_color(border)
            .shadow_lg()
            .child(
                div()
                    .text_sm()
                    .font_semibold()
                    .text_color(foreground)
                    .child("Select a camera"),
            );

        for (idx, device) in cameras.iter().enumerate() {
            let is_selected = selected_idx == idx;

            picker = picker.child(
                h_flex()
                    .w_full()
                    .gap_3()
                    .items_center()
                    .p_3()
                    .rounded_lg()
                    .cursor_pointer()
                    .when(is_selected, |this| {
                        this.bg(muted).border_1().border_color(border)
                    })
                    .on_mouse_down(
                        gpui::MouseButton::Left,
                        cx.listener(move |this, _, _, cx| {
                            this.select_camera(idx);
                            cx.notify();
                        }),
                    )
                    .child(
                        div()
                            .flex_1()
                            .text_sm()
                            .text_color(foreground)
                            .overflow_hidden()
                            .text_ellipsis()
                            .whitespace_nowrap()
                            .child(device.label.clone()),
                    )
                    .when(is_selected, |this| {
                        this.child(
                            div()
                                .text_sm()
                                .flex_shrink_0()
                                .text_color(accent)
                                .child("selected"),
                        )
                    }),
            );
        }

        if let Some(err) = error_msg {
            picker = picker.child(
                div()
                    .mt_2()
                    .p_3()
                    .rounded_lg()
                    .text_xs()
                    .text_color(accent)
                    .border_1()
                    .border_color(border)
                    .child(err),
            );
        }

        picker = picker.child(
            Button::new(SharedString::from("camera-confirm"))
                .primary()
                .label("Use this camera")
                .w_full()
                .mt_2()
                .on_click(cx.listener(|this, _, _, cx| {
                    this.start_selected_camera();
                    cx.notify();
                })),
        );

        picker.into_any_element()
    }

    pub(super) fn render_camera_picker_main(&mut self, cx: &mut Context<'_, Self>) -> AnyElement {
        let cameras = self.available_cameras.clone();
        let selected = self.selected_camera_idx.unwrap_or(0);
        let error = self.camera_error.clone();
        self.render_camera_picker(cameras, selected, error, cx)
    }

    pub(super) fn switch_camera(&mut self, idx: usize) {
        let Some(device) = self.available_cameras.get(idx).cloned() else {
            self.camera_error = Some("The selected camera is gone.".to_string());
            return;
        };

        match self.start_camera_for_device(&device) {
            Ok(()) => {
                self.selected_camera_idx = Some(idx);
                self.camera_error = None;
                self.camera_picker_open = false;
            }
            Err(err) => {
                self.camera_error = Some(format!("Could not start the camera: {err}"));
            }
        }
    }

    fn select_camera(&mut self, selected: usize) {
        match &mut self.screen {
            Screen::Camera(CameraState::Selection {
                options,
                selected: current,
                start_error,
            }) => {
                if selected < options.len() {
                    *current = selected;
                    *start_error = None;
                    self.selected_camera_idx = Some(selected);
                    self.available_cameras = options.clone();
                }
            }
            Screen::Main => self.switch_camera(selected),
            _ => {}
        }
    }

    fn stop_camera_stream(&mut self) {
        if let Some(stream) = self.camera_stream.take() {
            stream.stop();
        }
    }

    fn start_camera_for_device(&mut self, device: &CameraDevice) -> Result<(), String> {
        self.stop_camera_stream();

        start_camera_stream(
            device.index.clone(),
            self.cam_frame_tx.clone(),
            self.track_frame_tx.clone(),
        )
        .map(|stream| {
            self.camera_stream = Some(stream);
            self.latest = None;
            self.latest_image = None;
            self.camera_error = None;
        })
        .map_err(|err| format!("{err:#}"))
    }

    fn start_selected_camera(&mut self) {
        let selected_device = match &self.screen {
            Screen::Camera(CameraState::Selection {
                options, selected, ..
            }) => {
                self.available_cameras = options.clone();
                options
                    .get(*selected)
                    .cloned()
                    .map(|device| (*selected, device))
            }
            _ => None,
        };

        let Some((selected_idx, device)) = selected_device else {
            if let Screen::Camera(CameraState::Selection { start_error, .. }) = &mut self.screen {
                *start_error = Some("The selected camera is gone.".to_string());
            }
            return;
        };

        match self.start_camera_for_device(&device) {
            Ok(()) => {
                self.selected_camera_idx = Some(selected_idx);
                self.camera_error = None;
                self.screen = Screen::Download(super::DownloadState::new(
                    crate::model_download::ModelKind::ALL.len(),
                ));
            }
            Err(err) => {
                if let Screen::Camera(CameraState::Selection { start_error, .. }) = &mut self.screen
                {
                    *start_error = Some(format!("Could not start the camera: {err}"));
                }
            }
        }
    }
}
