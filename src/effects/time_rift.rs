use std::collections::VecDeque;

use super::{Effect, raster, raster::Mask};
use crate::{
    interpret::Signals,
    types::{EffectKind, Frame, TrackedFrame},
};

/// ~2 seconds of history at 30 fps.
const BUFFER_FRAMES: usize = 60;
const HULL_DILATE_PX: u32 = 10;
const HULL_FEATHER_PX: u32 = 12;
const PAST_HUE_SHIFT_DEG: f32 = 80.0;
const PAST_SATURATION_ADD: f32 = 0.2;

/// A window into the past: the area inside the tracked hand reveals the
/// oldest frame in a bounded ring buffer, restyled so the delay reads
/// as a tear rather than lag.
pub struct TimeRift {
    buffer: VecDeque<Frame>,
    mask: Option<Mask>,
    status: Option<String>,
}

impl TimeRift {
    pub fn new() -> Self {
        Self {
            buffer: VecDeque::with_capacity(BUFFER_FRAMES),
            mask: None,
            status: None,
        }
    }

    fn mask_for(&mut self, width: u32, height: u32) -> &mut Mask {
        let stale = self
            .mask
            .as_ref()
            .is_none_or(|m| m.width != width || m.height != height);
        if stale {
            self.mask = Some(Mask::new(width, height));
        }
        self.mask.as_mut().expect("mask was just created")
    }
}

impl Default for TimeRift {
    fn default() -> Self {
        Self::new()
    }
}

impl Effect for TimeRift {
    fn kind(&self) -> EffectKind {
        EffectKind::TimeRift
    }

    fn render(&mut self, frame: &mut Frame, tracked: Option<&TrackedFrame>, _signals: &Signals) {
        // Resolution change invalidates the whole history.
        if self
            .buffer
            .front()
            .is_some_and(|f| f.width != frame.width || f.height != frame.height)
        {
            self.reset();
        }

        // The clean frame goes into history before any compositing.
        if self.buffer.len() == BUFFER_FRAMES {
            self.buffer.pop_front();
        }
        self.buffer.push_back(frame.clone());

        if self.buffer.len() < BUFFER_FRAMES {
            self.status = Some(format!(
                "charging {}/{}",
                self.buffer.len(),
                BUFFER_FRAMES
            ));
            return;
        }

        let hulls: Vec<Vec<(f32, f32)>> = tracked
            .map(|t| {
                t.hands
                    .iter()
                    .map(|pose| raster::convex_hull(&pose.points))
                    .filter(|hull| hull.len() >= 3)
                    .collect()
            })
            .unwrap_or_default();

        if hulls.is_empty() {
            self.status = Some("rift ready, show a hand".to_string());
            return;
        }

        let mut past = self
            .buffer
            .front()
            .expect("buffer is full at this point")
            .rgba
            .clone();
        raster::shift_hue_saturation(&mut past, PAST_HUE_SHIFT_DEG, PAST_SATURATION_ADD);

        let mask = self.mask_for(frame.width, frame.height);
        mask.clear();
        for hull in &hulls {
            mask.fill_convex_polygon(hull, 255);
        }
        // Open the hole a little wider than the hand, then feather the
        // edge so the tear looks like mist instead of a cutout.
        mask.dilate(HULL_DILATE_PX);
        mask.blur(HULL_FEATHER_PX);

        raster::composite_masked(&mut frame.rgba, &past, mask);
        self.status = Some("rift active: -2.0s".to_string());
    }

    fn status(&self) -> Option<String> {
        self.status.clone()
    }

    fn reset(&mut self) {
        self.buffer.clear();
        self.mask = None;
        self.status = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Instant;

    fn frame(tag: u8, width: u32, height: u32) -> Frame {
        Frame {
            rgba: vec![tag; (width * height * 4) as usize],
            width,
            height,
            timestamp: Instant::now(),
        }
    }

    #[test]
    fn buffer_charges_then_caps_at_capacity() {
        let mut rift = TimeRift::new();
        let signals = Signals::default();

        for i in 0..BUFFER_FRAMES {
            let mut f = frame(i as u8, 8, 8);
            rift.render(&mut f, None, &signals);
        }
        assert_eq!(rift.buffer.len(), BUFFER_FRAMES);
        assert!(rift.status().unwrap().contains("rift ready"));

        // One more frame evicts the oldest.
        let mut f = frame(200, 8, 8);
        rift.render(&mut f, None, &signals);
        assert_eq!(rift.buffer.len(), BUFFER_FRAMES);
        assert_eq!(rift.buffer.front().unwrap().rgba[0], 1);
    }

    #[test]
    fn charging_status_counts_up_without_compositing() {
        let mut rift = TimeRift::new();
        let mut f = frame(9, 4, 4);
        rift.render(&mut f, None, &Signals::default());
        assert_eq!(rift.status().unwrap(), format!("charging 1/{BUFFER_FRAMES}"));
        // Frame left untouched while charging.
        assert!(f.rgba.iter().all(|&b| b == 9));
    }

    #[test]
    fn resolution_change_resets_history() {
        let mut rift = TimeRift::new();
        let signals = Signals::default();
        let mut f = frame(1, 8, 8);
        rift.render(&mut f, None, &signals);
        let mut f = frame(2, 16, 8);
        rift.render(&mut f, None, &signals);
        assert_eq!(rift.buffer.len(), 1);
        assert_eq!(rift.buffer.front().unwrap().width, 16);
    }
}
