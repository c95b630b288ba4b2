//! Turns landmark positions into discrete application state: pinches,
//! head turns, mouth opening, squinting. Everything here is fixed
//! geometric thresholds plus small hysteresis counters; no models.

use std::collections::VecDeque;
use std::time::Instant;

use crate::types::{FacePose, Frame, HandPose, HandSide, TrackedFrame, face, hand};

/// Index tip to thumb tip distance, in pixels, below which a hand is
/// considered pinched.
pub const PINCH_DISTANCE_PX: f32 = 40.0;

/// Head turn value (percent of frame width) past which a turn counts.
pub const HEAD_TURN_THRESHOLD: f32 = 4.0;
/// Frames a turn must be held before it fires.
pub const HEAD_TURN_HOLD_FRAMES: u32 = 15;

/// Inner-lip gap as percent of face height: opening / wide open.
pub const MOUTH_OPEN_RATIO: f32 = 5.0;
pub const MOUTH_WIDE_RATIO: f32 = 8.0;

/// Eye openness (vertical over horizontal extent) below which the eye
/// counts as squinting, and the frames of hysteresis before toggling.
pub const SQUINT_OPENNESS: f32 = 0.18;
pub const SQUINT_HOLD_FRAMES: u32 = 8;

/// Distance between the index and thumb tips, if both are tracked.
pub fn pinch_distance(pose: &HandPose) -> Option<f32> {
    let (ix, iy) = *pose.points.get(hand::INDEX_TIP)?;
    let (tx, ty) = *pose.points.get(hand::THUMB_TIP)?;
    Some(((ix - tx).powi(2) + (iy - ty).powi(2)).sqrt())
}

pub fn is_pinched(pose: &HandPose) -> bool {
    pinch_distance(pose).is_some_and(|d| d < PINCH_DISTANCE_PX)
}

/// Signed head turn: nose offset from the cheek midpoint, as a percent
/// of frame width. Negative is a turn to the subject's left.
pub fn head_turn(pose: &FacePose, frame_width: u32) -> Option<f32> {
    if frame_width == 0 {
        return None;
    }
    let (nose_x, _) = *pose.points.get(face::NOSE_TIP)?;
    let (left_x, _) = *pose.points.get(face::LEFT_CHEEK)?;
    let (right_x, _) = *pose.points.get(face::RIGHT_CHEEK)?;
    let mid_x = (left_x + right_x) / 2.0;
    Some((nose_x - mid_x) / frame_width as f32 * 100.0)
}

/// Inner-lip gap normalized by face height, times 100. Camera distance
/// cancels out of the ratio.
pub fn mouth_open_ratio(pose: &FacePose) -> Option<f32> {
    let (_, upper_y) = *pose.points.get(face::UPPER_LIP)?;
    let (_, lower_y) = *pose.points.get(face::LOWER_LIP)?;
    let (_, forehead_y) = *pose.points.get(face::FOREHEAD)?;
    let (_, chin_y) = *pose.points.get(face::CHIN)?;

    let face_height = chin_y - forehead_y;
    if face_height <= 0.0 {
        return None;
    }
    Some((lower_y - upper_y).max(0.0) / face_height * 100.0)
}

/// Eye openness: vertical lid gap over horizontal eye extent.
pub fn eye_openness(pose: &FacePose, side: HandSide) -> Option<f32> {
    let (top, bottom, outer, inner) = match side {
        HandSide::Left => (
            face::LEFT_EYE_TOP,
            face::LEFT_EYE_BOTTOM,
            face::LEFT_EYE_OUTER,
            face::LEFT_EYE_INNER,
        ),
        HandSide::Right => (
            face::RIGHT_EYE_TOP,
            face::RIGHT_EYE_BOTTOM,
            face::RIGHT_EYE_OUTER,
            face::RIGHT_EYE_INNER,
        ),
    };

    let (_, top_y) = *pose.points.get(top)?;
    let (_, bottom_y) = *pose.points.get(bottom)?;
    let (outer_x, _) = *pose.points.get(outer)?;
    let (inner_x, _) = *pose.points.get(inner)?;

    let width = (outer_x - inner_x).abs();
    if width <= 0.0 {
        return None;
    }
    Some((bottom_y - top_y).abs() / width)
}

/// Edge-detecting pinch state for one hand.
#[derive(Clone, Copy, Debug, Default)]
pub struct PinchState {
    active: bool,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PinchEdge {
    Idle,
    Pressed,
    Held,
    Released,
}

impl PinchState {
    pub fn update(&mut self, pinched: bool) -> PinchEdge {
        let edge = match (self.active, pinched) {
            (false, true) => PinchEdge::Pressed,
            (true, true) => PinchEdge::Held,
            (true, false) => PinchEdge::Released,
            (false, false) => PinchEdge::Idle,
        };
        self.active = pinched;
        edge
    }

    pub fn is_active(&self) -> bool {
        self.active
    }
}

impl PinchEdge {
    pub fn is_down(&self) -> bool {
        matches!(self, PinchEdge::Pressed | PinchEdge::Held)
    }
}

/// Counts consecutive frames a condition holds and fires once when the
/// hold target is reached; it re-arms only after the condition drops.
#[derive(Clone, Copy, Debug)]
pub struct HoldCounter {
    needed: u32,
    frames: u32,
    latched: bool,
}

impl HoldCounter {
    pub fn new(needed: u32) -> Self {
        Self {
            needed,
            frames: 0,
            latched: false,
        }
    }

    pub fn update(&mut self, active: bool) -> bool {
        if !active {
            self.frames = 0;
            self.latched = false;
            return false;
        }

        self.frames += 1;
        if self.frames > self.needed && !self.latched {
            self.latched = true;
            self.frames = 0;
            return true;
        }
        false
    }

    /// Progress toward firing, 0.0 to 1.0.
    pub fn progress(&self) -> f32 {
        if self.latched {
            return 1.0;
        }
        (self.frames as f32 / self.needed as f32).min(1.0)
    }
}

/// Toggles a boolean after a condition holds for a fixed frame count.
#[derive(Clone, Copy, Debug)]
pub struct ToggleOnHold {
    needed: u32,
    frames: u32,
    state: bool,
}

impl ToggleOnHold {
    pub fn new(needed: u32) -> Self {
        Self {
            needed,
            frames: 0,
            state: false,
        }
    }

    /// Returns the current state; flips it once per sustained hold.
    pub fn update(&mut self, active: bool) -> bool {
        if active {
            self.frames += 1;
            if self.frames >= self.needed {
                self.state = !self.state;
                self.frames = 0;
            }
        } else {
            self.frames = 0;
        }
        self.state
    }

    pub fn state(&self) -> bool {
        self.state
    }
}

/// Bounded history of recent point positions, overwrite-oldest.
#[derive(Clone, Debug)]
pub struct PointTrail {
    points: VecDeque<(f32, f32, Instant)>,
    capacity: usize,
}

impl PointTrail {
    pub fn new(capacity: usize) -> Self {
        Self {
            points: VecDeque::with_capacity(capacity),
            capacity: capacity.max(2),
        }
    }

    pub fn push(&mut self, point: (f32, f32), at: Instant) {
        if self.points.len() == self.capacity {
            self.points.pop_front();
        }
        self.points.push_back((point.0, point.1, at));
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (f32, f32)> + '_ {
        self.points.iter().map(|&(x, y, _)| (x, y))
    }

    /// Average velocity across the retained window, pixels per second.
    pub fn velocity(&self) -> Option<(f32, f32)> {
        let (fx, fy, ft) = *self.points.front()?;
        let (bx, by, bt) = *self.points.back()?;
        let dt = bt.duration_since(ft).as_secs_f32();
        if dt <= 0.0 {
            return None;
        }
        Some(((bx - fx) / dt, (by - fy) / dt))
    }

    pub fn clear(&mut self) {
        self.points.clear();
    }
}

/// One hand's digest for the effects.
#[derive(Clone, Copy, Debug)]
pub struct HandSignal {
    pub pinch: PinchEdge,
    pub index_tip: (f32, f32),
}

/// Per-frame digest of discrete states, consumed by the effects.
#[derive(Clone, Copy, Debug)]
pub struct Signals {
    pub right: Option<HandSignal>,
    pub left: Option<HandSignal>,
    pub face_present: bool,
    pub head_turn: f32,
    pub turned_left: bool,
    pub turned_right: bool,
    pub turn_progress: f32,
    pub mouth_open: bool,
    pub mouth_wide: bool,
    pub squint_active: bool,
}

impl Default for Signals {
    fn default() -> Self {
        Self {
            right: None,
            left: None,
            face_present: false,
            head_turn: 0.0,
            turned_left: false,
            turned_right: false,
            turn_progress: 0.0,
            mouth_open: false,
            mouth_wide: false,
            squint_active: false,
        }
    }
}

/// Stateful interpreter run once per composited frame.
pub struct Interpreter {
    right_pinch: PinchState,
    left_pinch: PinchState,
    turn_left: HoldCounter,
    turn_right: HoldCounter,
    squint: ToggleOnHold,
}

impl Interpreter {
    pub fn new() -> Self {
        Self {
            right_pinch: PinchState::default(),
            left_pinch: PinchState::default(),
            turn_left: HoldCounter::new(HEAD_TURN_HOLD_FRAMES),
            turn_right: HoldCounter::new(HEAD_TURN_HOLD_FRAMES),
            squint: ToggleOnHold::new(SQUINT_HOLD_FRAMES),
        }
    }

    pub fn update(&mut self, frame: &Frame, tracked: Option<&TrackedFrame>) -> Signals {
        let mut signals = Signals::default();

        let Some(tracked) = tracked else {
            // Keep edge state consistent when tracking drops out.
            self.right_pinch.update(false);
            self.left_pinch.update(false);
            self.turn_left.update(false);
            self.turn_right.update(false);
            return signals;
        };

        signals.right = self.hand_signal(tracked, HandSide::Right);
        signals.left = self.hand_signal(tracked, HandSide::Left);

        if let Some(face_pose) = &tracked.face {
            signals.face_present = true;

            let turn = head_turn(face_pose, frame.width).unwrap_or(0.0);
            signals.head_turn = turn;
            signals.turned_left = self.turn_left.update(turn < -HEAD_TURN_THRESHOLD);
            signals.turned_right = self.turn_right.update(turn > HEAD_TURN_THRESHOLD);
            signals.turn_progress = self.turn_left.progress().max(self.turn_right.progress());

            if let Some(ratio) = mouth_open_ratio(face_pose) {
                signals.mouth_open = ratio > MOUTH_OPEN_RATIO;
                signals.mouth_wide = ratio > MOUTH_WIDE_RATIO;
            }

            let squinting = [HandSide::Left, HandSide::Right]
                .into_iter()
                .filter_map(|side| eye_openness(face_pose, side))
                .all(|openness| openness < SQUINT_OPENNESS)
                && eye_openness(face_pose, HandSide::Left).is_some();
            signals.squint_active = self.squint.update(squinting);
        } else {
            self.turn_left.update(false);
            self.turn_right.update(false);
            signals.squint_active = self.squint.state();
        }

        signals
    }

    fn hand_signal(&mut self, tracked: &TrackedFrame, side: HandSide) -> Option<HandSignal> {
        let state = match side {
            HandSide::Right => &mut self.right_pinch,
            HandSide::Left => &mut self.left_pinch,
        };

        match tracked.hand(side) {
            Some(pose) => {
                let pinch = state.update(is_pinched(pose));
                let index_tip = *pose.points.get(hand::INDEX_TIP)?;
                Some(HandSignal { pinch, index_tip })
            }
            None => {
                state.update(false);
                None
            }
        }
    }
}

impl Default for Interpreter {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use rstest::rstest;
    use std::time::Duration;

    fn hand_with_pinch_gap(gap: f32) -> HandPose {
        let mut points = vec![(0.0, 0.0); hand::LANDMARKS];
        points[hand::THUMB_TIP] = (100.0, 100.0);
        points[hand::INDEX_TIP] = (100.0 + gap, 100.0);
        HandPose {
            raw: vec![[0.0; 3]; hand::LANDMARKS],
            points,
            confidence: 0.9,
            handedness: 0.9,
            bbox: [0.0; 4],
        }
    }

    fn face_with(points: &[(usize, (f32, f32))]) -> FacePose {
        let mut all = vec![(0.0, 0.0); face::LANDMARKS];
        for &(idx, p) in points {
            all[idx] = p;
        }
        FacePose {
            points: all,
            confidence: 0.9,
        }
    }

    #[rstest]
    #[case(10.0, true)]
    #[case(39.9, true)]
    #[case(40.0, false)]
    #[case(120.0, false)]
    fn pinch_threshold_is_exclusive(#[case] gap: f32, #[case] expected: bool) {
        assert_eq!(is_pinched(&hand_with_pinch_gap(gap)), expected);
    }

    #[test]
    fn pinch_state_reports_edges_in_order() {
        let mut state = PinchState::default();
        assert_eq!(state.update(false), PinchEdge::Idle);
        assert_eq!(state.update(true), PinchEdge::Pressed);
        assert_eq!(state.update(true), PinchEdge::Held);
        assert_eq!(state.update(false), PinchEdge::Released);
        assert_eq!(state.update(false), PinchEdge::Idle);
    }

    #[test]
    fn hold_counter_fires_once_after_the_hold_target() {
        let mut counter = HoldCounter::new(3);
        assert!(!counter.update(true));
        assert!(!counter.update(true));
        assert!(!counter.update(true));
        // Fires on the first frame strictly past the hold target.
        assert!(counter.update(true));
        // Latched: holding further does not re-fire.
        assert!(!counter.update(true));
        assert!(!counter.update(true));
        // Releasing re-arms.
        assert!(!counter.update(false));
        assert!(!counter.update(true));
    }

    #[test]
    fn toggle_on_hold_flips_after_exact_frame_count() {
        let mut toggle = ToggleOnHold::new(2);
        assert!(!toggle.update(true));
        assert!(toggle.update(true));
        // Dropping the condition keeps the toggled state.
        assert!(toggle.update(false));
        // A second sustained hold flips it back.
        assert!(toggle.update(true));
        assert!(!toggle.update(true));
    }

    #[test]
    fn mouth_ratio_matches_hand_computation() {
        let pose = face_with(&[
            (face::FOREHEAD, (0.0, 100.0)),
            (face::CHIN, (0.0, 300.0)),
            (face::UPPER_LIP, (0.0, 240.0)),
            (face::LOWER_LIP, (0.0, 252.0)),
        ]);
        // 12px gap over 200px face height = 6.0.
        assert_relative_eq!(mouth_open_ratio(&pose).unwrap(), 6.0, epsilon = 1e-4);
    }

    #[test]
    fn head_turn_is_signed_and_frame_relative() {
        let pose = face_with(&[
            (face::NOSE_TIP, (340.0, 0.0)),
            (face::LEFT_CHEEK, (260.0, 0.0)),
            (face::RIGHT_CHEEK, (380.0, 0.0)),
        ]);
        // Nose 20px right of the cheek midpoint in a 640px frame.
        assert_relative_eq!(head_turn(&pose, 640).unwrap(), 3.125, epsilon = 1e-4);

        let pose = face_with(&[
            (face::NOSE_TIP, (300.0, 0.0)),
            (face::LEFT_CHEEK, (260.0, 0.0)),
            (face::RIGHT_CHEEK, (380.0, 0.0)),
        ]);
        assert!(head_turn(&pose, 640).unwrap() < 0.0);
    }

    #[test]
    fn eye_openness_is_vertical_over_horizontal() {
        let pose = face_with(&[
            (face::RIGHT_EYE_TOP, (0.0, 95.0)),
            (face::RIGHT_EYE_BOTTOM, (0.0, 105.0)),
            (face::RIGHT_EYE_OUTER, (50.0, 100.0)),
            (face::RIGHT_EYE_INNER, (100.0, 100.0)),
        ]);
        assert_relative_eq!(
            eye_openness(&pose, HandSide::Right).unwrap(),
            0.2,
            epsilon = 1e-4
        );
    }

    #[test]
    fn point_trail_overwrites_oldest_and_estimates_velocity() {
        let start = Instant::now();
        let mut trail = PointTrail::new(3);
        trail.push((0.0, 0.0), start);
        trail.push((10.0, 0.0), start + Duration::from_millis(100));
        trail.push((20.0, 0.0), start + Duration::from_millis(200));
        trail.push((30.0, 0.0), start + Duration::from_millis(300));
        assert_eq!(trail.len(), 3);

        let (vx, vy) = trail.velocity().unwrap();
        assert_relative_eq!(vx, 100.0, epsilon = 1e-2);
        assert_relative_eq!(vy, 0.0, epsilon = 1e-2);
    }

    #[test]
    fn interpreter_reports_pinch_for_tracked_hand() {
        let mut interpreter = Interpreter::new();
        let frame = Frame {
            rgba: vec![0; 4],
            width: 640,
            height: 480,
            timestamp: Instant::now(),
        };
        let mut tracked = TrackedFrame::empty(640, 480, frame.timestamp);
        tracked.hands.push(hand_with_pinch_gap(10.0));

        let signals = interpreter.update(&frame, Some(&tracked));
        let right = signals.right.expect("right hand signal");
        assert_eq!(right.pinch, PinchEdge::Pressed);
        assert!(signals.left.is_none());

        // Losing tracking releases the pinch edge state.
        let signals = interpreter.update(&frame, None);
        assert!(signals.right.is_none());
        let signals = interpreter.update(&frame, Some(&tracked));
        assert_eq!(signals.right.unwrap().pinch, PinchEdge::Pressed);
    }
}
