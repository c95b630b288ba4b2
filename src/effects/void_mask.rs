use super::{
    Effect,
    contours::{self, indexed_points},
    raster::{self, Color},
};
use crate::{
    interpret::Signals,
    types::{EffectKind, Frame, TrackedFrame, face},
};

const VOID_COLOR: Color = [10, 10, 16, 255];
const EDGE_COLOR: Color = [0, 200, 255, 255];
const FEATURE_COLOR: Color = [0, 255, 128, 255];

/// Expand the hull past the face so nothing identifiable leaks out.
const EXPANSION_RATIO: f32 = 1.2;
/// Shift the hull up to cover the forehead.
const VERTICAL_OFFSET: f32 = -20.0;

/// Privacy scrambler: the face is deleted under an expanded convex
/// hull, then the eye and lip contours are redrawn inside the void so
/// expressions stay legible.
pub struct VoidMask {
    status: Option<String>,
}

impl VoidMask {
    pub fn new() -> Self {
        Self { status: None }
    }
}

impl Default for VoidMask {
    fn default() -> Self {
        Self::new()
    }
}

impl Effect for VoidMask {
    fn kind(&self) -> EffectKind {
        EffectKind::VoidMask
    }

    fn render(&mut self, frame: &mut Frame, tracked: Option<&TrackedFrame>, _signals: &Signals) {
        let Some(face_pose) = tracked.and_then(|t| t.face.as_ref()) else {
            self.status = Some("scanning for a face".to_string());
            return;
        };
        let (w, h) = (frame.width, frame.height);

        let hull = raster::convex_hull(&face_pose.points);
        if hull.len() < 3 {
            self.status = Some("scanning for a face".to_string());
            return;
        }
        let void = raster::expand_polygon(&hull, EXPANSION_RATIO, VERTICAL_OFFSET);

        // Delete the face pixels, then trace the void's edge.
        raster::fill_convex_polygon_rgba(&mut frame.rgba, w, h, &void, VOID_COLOR);
        raster::draw_polyline(&mut frame.rgba, w, h, &void, true, EDGE_COLOR, 2);

        // Features come back as solid voids with wireframe outlines.
        for ring in [contours::LEFT_EYE, contours::RIGHT_EYE] {
            let eye = raster::convex_hull(&indexed_points(&face_pose.points, ring));
            raster::fill_convex_polygon_rgba(&mut frame.rgba, w, h, &eye, VOID_COLOR);
            raster::draw_polyline(&mut frame.rgba, w, h, &eye, true, EDGE_COLOR, 1);
        }
        let lips = indexed_points(&face_pose.points, contours::LIPS);
        raster::draw_polyline(&mut frame.rgba, w, h, &lips, true, EDGE_COLOR, 1);

        let oval = indexed_points(&face_pose.points, contours::FACE_OVAL);
        raster::draw_polyline(&mut frame.rgba, w, h, &oval, true, FEATURE_COLOR, 1);

        // Stable fake subject tag, derived from the forehead position so
        // it does not flicker frame to frame.
        let tag = face_pose
            .points
            .get(face::FOREHEAD)
            .map(|&(x, y)| ((x as u32 + y as u32).wrapping_mul(999)) & 0xFFFF)
            .unwrap_or(0);
        self.status = Some(format!("encryption active, SUBJ 0x{tag:04X}"));
    }

    fn status(&self) -> Option<String> {
        self.status.clone()
    }

    fn reset(&mut self) {
        self.status = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::FacePose;
    use std::time::Instant;

    #[test]
    fn face_pixels_are_replaced_by_the_void() {
        let mut effect = VoidMask::new();
        let mut frame = Frame {
            rgba: vec![200; 64 * 64 * 4],
            width: 64,
            height: 64,
            timestamp: Instant::now(),
        };

        // A face filling the middle of the frame.
        let points: Vec<(f32, f32)> = (0..face::LANDMARKS)
            .map(|i| {
                let angle = i as f32 / face::LANDMARKS as f32 * std::f32::consts::TAU;
                (32.0 + 12.0 * angle.cos(), 36.0 + 12.0 * angle.sin())
            })
            .collect();
        let mut tracked = TrackedFrame::empty(64, 64, frame.timestamp);
        tracked.face = Some(FacePose {
            points,
            confidence: 0.9,
        });

        effect.render(&mut frame, Some(&tracked), &Signals::default());

        // Center of the (upward-shifted) void is void-colored now.
        let center = ((16 * 64 + 32) * 4) as usize;
        assert_eq!(frame.rgba[center], VOID_COLOR[0]);
        // A far corner is untouched.
        assert_eq!(frame.rgba[0], 200);
        assert!(effect.status().unwrap().starts_with("encryption active"));
    }

    #[test]
    fn no_face_means_no_change() {
        let mut effect = VoidMask::new();
        let mut frame = Frame {
            rgba: vec![50; 16 * 16 * 4],
            width: 16,
            height: 16,
            timestamp: Instant::now(),
        };
        let tracked = TrackedFrame::empty(16, 16, frame.timestamp);
        effect.render(&mut frame, Some(&tracked), &Signals::default());
        assert!(frame.rgba.iter().all(|&b| b == 50));
        assert_eq!(effect.status().unwrap(), "scanning for a face");
    }
}
