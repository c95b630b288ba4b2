use std::time::Instant;

/// A camera frame in RGBA byte order.
#[derive(Clone, Debug)]
pub struct Frame {
    pub rgba: Vec<u8>,
    pub width: u32,
    pub height: u32,
    pub timestamp: Instant,
}

impl Frame {
    pub fn expected_len(&self) -> usize {
        (self.width as usize)
            .saturating_mul(self.height as usize)
            .saturating_mul(4)
    }

    /// True when the buffer length matches the stated dimensions.
    pub fn is_well_formed(&self) -> bool {
        self.rgba.len() == self.expected_len()
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum HandSide {
    Left,
    Right,
}

/// One tracked hand: 21 landmarks, already projected to pixel space.
#[derive(Clone, Debug)]
pub struct HandPose {
    /// Landmarks in the cropped model space, used for pose geometry.
    pub raw: Vec<[f32; 3]>,
    /// Landmarks projected onto the source frame, in pixels.
    pub points: Vec<(f32, f32)>,
    pub confidence: f32,
    /// Model handedness score; >= 0.5 means right hand.
    pub handedness: f32,
    /// Detection box in frame pixels, [x1, y1, x2, y2].
    pub bbox: [f32; 4],
}

impl HandPose {
    pub fn side(&self) -> HandSide {
        if self.handedness >= 0.5 {
            HandSide::Right
        } else {
            HandSide::Left
        }
    }
}

/// One tracked face: the full mesh projected to pixel space.
#[derive(Clone, Debug)]
pub struct FacePose {
    pub points: Vec<(f32, f32)>,
    pub confidence: f32,
}

/// Tracker output for one input frame.
#[derive(Clone, Debug)]
pub struct TrackedFrame {
    pub width: u32,
    pub height: u32,
    pub timestamp: Instant,
    pub hands: Vec<HandPose>,
    pub face: Option<FacePose>,
}

impl TrackedFrame {
    pub fn empty(width: u32, height: u32, timestamp: Instant) -> Self {
        Self {
            width,
            height,
            timestamp,
            hands: Vec::new(),
            face: None,
        }
    }

    pub fn hand(&self, side: HandSide) -> Option<&HandPose> {
        self.hands.iter().find(|h| h.side() == side)
    }
}

/// The selectable camera effects, in keyboard order (keys 1-4).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EffectKind {
    Skeleton,
    TimeRift,
    VoidMask,
    SpatialCanvas,
}

impl EffectKind {
    pub const ALL: [EffectKind; 4] = [
        EffectKind::Skeleton,
        EffectKind::TimeRift,
        EffectKind::VoidMask,
        EffectKind::SpatialCanvas,
    ];

    pub fn display_name(&self) -> &'static str {
        match self {
            EffectKind::Skeleton => "Skeleton",
            EffectKind::TimeRift => "Time Rift",
            EffectKind::VoidMask => "Void Mask",
            EffectKind::SpatialCanvas => "Spatial Canvas",
        }
    }

    pub fn hint(&self) -> &'static str {
        match self {
            EffectKind::Skeleton => "raw hand and face tracking overlay",
            EffectKind::TimeRift => "hold up a hand to reveal the past",
            EffectKind::VoidMask => "face is replaced by a contour void",
            EffectKind::SpatialCanvas => "right pinch draws, left pinch moves",
        }
    }

    pub fn from_digit(digit: u32) -> Option<EffectKind> {
        Self::ALL.get(digit.checked_sub(1)? as usize).copied()
    }
}

/// A frame after the active effect ran, plus what the UI should report.
#[derive(Clone, Debug)]
pub struct CompositedFrame {
    pub frame: Frame,
    pub effect: EffectKind,
    /// Effect-specific status, e.g. "charging 42/60" for the time rift.
    pub status: Option<String>,
    pub fps: f32,
}

/// Hand landmark indices (21-point topology).
pub mod hand {
    pub const WRIST: usize = 0;
    pub const THUMB_TIP: usize = 4;
    pub const INDEX_TIP: usize = 8;
    pub const MIDDLE_TIP: usize = 12;
    pub const RING_TIP: usize = 16;
    pub const PINKY_TIP: usize = 20;
    pub const LANDMARKS: usize = 21;
}

/// Face mesh landmark indices used by the interpreter and effects.
pub mod face {
    pub const NOSE_TIP: usize = 1;
    pub const FOREHEAD: usize = 10;
    pub const CHIN: usize = 152;
    pub const LEFT_CHEEK: usize = 234;
    pub const RIGHT_CHEEK: usize = 454;
    pub const UPPER_LIP: usize = 13;
    pub const LOWER_LIP: usize = 14;

    pub const LEFT_EYE_TOP: usize = 386;
    pub const LEFT_EYE_BOTTOM: usize = 374;
    pub const LEFT_EYE_OUTER: usize = 263;
    pub const LEFT_EYE_INNER: usize = 362;
    pub const RIGHT_EYE_TOP: usize = 159;
    pub const RIGHT_EYE_BOTTOM: usize = 145;
    pub const RIGHT_EYE_OUTER: usize = 33;
    pub const RIGHT_EYE_INNER: usize = 133;

    pub const LANDMARKS: usize = 468;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn frame_well_formed_checks_buffer_length() {
        let frame = Frame {
            rgba: vec![0; 8 * 4 * 4],
            width: 8,
            height: 4,
            timestamp: Instant::now(),
        };
        assert!(frame.is_well_formed());

        let short = Frame {
            rgba: vec![0; 7],
            width: 8,
            height: 4,
            timestamp: Instant::now(),
        };
        assert!(!short.is_well_formed());
    }

    #[test]
    fn effect_kind_digit_selection() {
        assert_eq!(EffectKind::from_digit(1), Some(EffectKind::Skeleton));
        assert_eq!(EffectKind::from_digit(4), Some(EffectKind::SpatialCanvas));
        assert_eq!(EffectKind::from_digit(0), None);
        assert_eq!(EffectKind::from_digit(5), None);
    }

    #[test]
    fn hand_side_from_handedness_score() {
        let mut pose = HandPose {
            raw: Vec::new(),
            points: Vec::new(),
            confidence: 1.0,
            handedness: 0.9,
            bbox: [0.0; 4],
        };
        assert_eq!(pose.side(), HandSide::Right);
        pose.handedness = 0.1;
        assert_eq!(pose.side(), HandSide::Left);
    }
}
