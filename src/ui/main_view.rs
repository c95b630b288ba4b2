use super::render_util::frame_to_image;
use super::{
    ActiveTheme, AnyElement, AppView, Button, ButtonVariants, Context, InteractiveElement,
    IntoElement, ObjectFit, ParentElement, RenderImage, SharedString, Styled, StyledImage, Window,
    div, h_flex, img, px, v_flex,
};
use crate::types::EffectKind;
use std::sync::Arc;

impl AppView {
    pub(super) fn render_main(
        &mut self,
        window: &mut Window,
        cx: &mut Context<'_, Self>,
    ) -> AnyElement {
        if !self.focused_once {
            window.focus(&self.focus_handle);
            self.focused_once = true;
        }

        // Drain composited frames; only the newest becomes a texture.
        let mut newest = None;
        while let Ok(composited) = self.out_rx.try_recv() {
            newest = Some(composited);
        }
        if let Some(composited) = newest {
            if let Some(image) = frame_to_image(&composited.frame) {
                self.replace_latest_image(image, window, cx);
            }
            self.latest = Some(composited);
        }

        // Hsla is Copy; taking the colors out keeps the theme borrow
        // from overlapping the listeners below.
        let theme = cx.theme();
        let background = theme.background;
        let group_box = theme.group_box;
        let border = theme.border;
        let foreground = theme.foreground;
        let muted_foreground = theme.muted_foreground;
        let accent = theme.accent;

        let camera_label = self
            .selected_camera_idx
            .and_then(|idx| self.available_cameras.get(idx))
            .map(|c| c.label.clone())
            .unwrap_or_else(|| "no camera".to_string());

        let frame_view: AnyElement = if let Some(image) = &self.latest_image {
            img(image.clone())
                .size_full()
                .object_fit(ObjectFit::Contain)
                .into_any_element()
        } else {
            div()
                .size_full()
                .flex()
                .items_center()
                .justify_center()
                .text_sm()
                .text_color(muted_foreground)
                .child("Waiting for the first frame...")
                .into_any_element()
        };

        let mut effect_row = h_flex().gap_2().items_center();
        for (idx, kind) in EffectKind::ALL.into_iter().enumerate() {
            let selected = self.selected_effect == kind;
            let mut button = Button::new(SharedString::from(format!("effect-{idx}")))
                .label(format!("{} {}", idx + 1, kind.display_name()))
                .on_click(cx.listener(move |this, _, _, cx| {
                    this.select_effect(kind);
                    cx.notify();
                }));
            button = if selected {
                button.primary()
            } else {
                button.outline()
            };
            effect_row = effect_row.child(button);
        }

        if self.available_cameras.len() > 1 {
            let picker_label = if self.camera_picker_open {
                "close cameras"
            } else {
                "cameras"
            };
            effect_row = effect_row.child(
                Button::new(SharedString::from("camera-picker-toggle"))
                    .ghost()
                    .label(picker_label)
                    .on_click(cx.listener(|this, _, _, cx| {
                        this.camera_picker_open = !this.camera_picker_open;
                        cx.notify();
                    })),
            );
        }

        let status_text = self
            .latest
            .as_ref()
            .map(|c| {
                let mut parts = vec![c.effect.display_name().to_string()];
                if let Some(status) = &c.status {
                    parts.push(status.clone());
                }
                if c.fps > 0.0 {
                    parts.push(format!("{:.0} fps", c.fps));
                }
                parts.join("  ·  ")
            })
            .unwrap_or_else(|| self.selected_effect.hint().to_string());

        let status_bar = h_flex()
            .w_full()
            .justify_between()
            .items_center()
            .gap_3()
            .p_3()
            .bg(group_box)
            .child(effect_row)
            .child(
                v_flex()
                    .gap_1()
                    .items_end()
                    .child(div().text_xs().text_color(foreground).child(status_text))
                    .child(
                        div()
                            .text_xs()
                            .text_color(muted_foreground)
                            .overflow_hidden()
                            .text_ellipsis()
                            .whitespace_nowrap()
                            .child(format!("{camera_label}  ·  q or esc quits")),
                    ),
            );

        let mut stage = div()
            .relative()
            .flex_1()
            .w_full()
            .overflow_hidden()
            .bg(gpui::rgb(0x000000))
            .child(frame_view);

        if self.camera_picker_open && !self.available_cameras.is_empty() {
            let picker = self.render_camera_picker_main(cx);
            stage = stage.child(
                div()
                    .absolute()
                    .top(px(16.0))
                    .left(px(16.0))
                    .w(px(400.0))
                    .child(picker),
            );
        } else if let Some(err) = &self.camera_error {
            stage = stage.child(
                div()
                    .absolute()
                    .top(px(16.0))
                    .left(px(16.0))
                    .p_3()
                    .rounded_lg()
                    .bg(group_box)
                    .border_1()
                    .border_color(border)
                    .text_xs()
                    .text_color(accent)
                    .child(err.clone()),
            );
        }

        v_flex()
            .size_full()
            .bg(background)
            .track_focus(&self.focus_handle)
            .on_key_down(cx.listener(Self::handle_key))
            .child(stage)
            .child(status_bar)
            .into_any_element()
    }

    fn replace_latest_image(
        &mut self,
        new_image: Arc<RenderImage>,
        window: &mut Window,
        cx: &mut Context<'_, Self>,
    ) {
        if let Some(old_image) = self.latest_image.replace(new_image) {
            // Explicitly drop the previous GPU texture; otherwise the sprite
            // atlas keeps every frame and memory climbs while running.
            cx.drop_image(old_image, Some(window));
        }
    }
}
