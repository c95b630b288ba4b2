use super::{
    Effect,
    contours::{self, indexed_points},
    raster::{self, Color},
};
use crate::{
    interpret::Signals,
    types::{EffectKind, Frame, TrackedFrame},
};

const BONE_COLOR: Color = [56, 189, 248, 255];
const JOINT_COLOR: Color = [248, 113, 113, 255];
const BOX_COLOR: Color = [16, 185, 129, 200];
const CONTOUR_COLOR: Color = [134, 239, 172, 255];
const LINE_THICKNESS: i32 = 3;

/// Debug overlay: hand skeletons, detection boxes and face contours
/// drawn straight onto the live frame.
pub struct SkeletonOverlay {
    last_status: Option<String>,
}

impl SkeletonOverlay {
    pub fn new() -> Self {
        Self { last_status: None }
    }
}

impl Default for SkeletonOverlay {
    fn default() -> Self {
        Self::new()
    }
}

impl Effect for SkeletonOverlay {
    fn kind(&self) -> EffectKind {
        EffectKind::Skeleton
    }

    fn render(&mut self, frame: &mut Frame, tracked: Option<&TrackedFrame>, _signals: &Signals) {
        let Some(tracked) = tracked else {
            self.last_status = None;
            return;
        };
        let (w, h) = (frame.width, frame.height);

        for pose in &tracked.hands {
            raster::draw_rect_outline(
                &mut frame.rgba,
                w,
                h,
                (pose.bbox[0], pose.bbox[1]),
                (pose.bbox[2], pose.bbox[3]),
                BOX_COLOR,
                2,
            );

            for &(a, b) in contours::HAND_CONNECTIONS {
                if let (Some(&pa), Some(&pb)) = (pose.points.get(a), pose.points.get(b)) {
                    raster::draw_line(&mut frame.rgba, w, h, pa, pb, BONE_COLOR, LINE_THICKNESS);
                }
            }
            for &(x, y) in &pose.points {
                raster::draw_circle(&mut frame.rgba, w, h, (x as i32, y as i32), 3, JOINT_COLOR);
            }
        }

        if let Some(face) = &tracked.face {
            for ring in [
                contours::FACE_OVAL,
                contours::LEFT_EYE,
                contours::RIGHT_EYE,
                contours::LIPS,
            ] {
                let points = indexed_points(&face.points, ring);
                raster::draw_polyline(&mut frame.rgba, w, h, &points, true, CONTOUR_COLOR, 1);
            }
        }

        let face_part = match &tracked.face {
            Some(face) => format!("face {:.0}%", face.confidence * 100.0),
            None => "no face".to_string(),
        };
        self.last_status = Some(match tracked.hands.len() {
            0 => format!("no hands, {face_part}"),
            1 => format!("1 hand, {face_part}"),
            n => format!("{n} hands, {face_part}"),
        });
    }

    fn status(&self) -> Option<String> {
        self.last_status.clone()
    }

    fn reset(&mut self) {
        self.last_status = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{HandPose, hand};
    use std::time::Instant;

    fn black_frame(width: u32, height: u32) -> Frame {
        Frame {
            rgba: vec![0; (width * height * 4) as usize],
            width,
            height,
            timestamp: Instant::now(),
        }
    }

    #[test]
    fn drawing_changes_pixels_only_when_something_is_tracked() {
        let mut overlay = SkeletonOverlay::new();
        let signals = Signals::default();

        let mut frame = black_frame(64, 64);
        overlay.render(&mut frame, None, &signals);
        assert!(frame.rgba.iter().all(|&b| b == 0));
        assert!(overlay.status().is_none());

        let mut tracked = TrackedFrame::empty(64, 64, frame.timestamp);
        tracked.hands.push(HandPose {
            raw: vec![[0.0; 3]; hand::LANDMARKS],
            points: (0..hand::LANDMARKS)
                .map(|i| (10.0 + i as f32, 10.0 + i as f32))
                .collect(),
            confidence: 0.9,
            handedness: 0.9,
            bbox: [5.0, 5.0, 40.0, 40.0],
        });
        overlay.render(&mut frame, Some(&tracked), &signals);
        assert!(frame.rgba.iter().any(|&b| b != 0));
        assert_eq!(overlay.status().unwrap(), "1 hand, no face");
    }
}
