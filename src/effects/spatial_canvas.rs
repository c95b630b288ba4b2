use super::{
    Effect,
    raster::{self, Color},
};
use crate::{
    interpret::{PinchEdge, PointTrail, Signals},
    types::{EffectKind, Frame, TrackedFrame},
};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Tool {
    Brush,
    Rect,
    Circle,
}

impl Tool {
    pub const ALL: [Tool; 3] = [Tool::Brush, Tool::Rect, Tool::Circle];

    pub fn name(&self) -> &'static str {
        match self {
            Tool::Brush => "BRUSH",
            Tool::Rect => "RECT",
            Tool::Circle => "CIRCLE",
        }
    }
}

pub const PALETTE: [(&str, Color); 4] = [
    ("CYAN", [0, 255, 255, 255]),
    ("RED", [255, 60, 60, 255]),
    ("GREEN", [0, 255, 0, 255]),
    ("PURPLE", [255, 0, 255, 255]),
];

const HIGHLIGHT: Color = [255, 255, 255, 255];
const GRAB_CURSOR: Color = [200, 200, 200, 255];
const BRUSH_THICKNESS: i32 = 5;

#[derive(Clone, Debug)]
enum Shape {
    Rect {
        x: f32,
        y: f32,
        w: f32,
        h: f32,
        color: Color,
    },
    Circle {
        cx: f32,
        cy: f32,
        r: f32,
        color: Color,
    },
    Path {
        points: Vec<(f32, f32)>,
        color: Color,
    },
}

impl Shape {
    fn draw(&self, buffer: &mut [u8], width: u32, height: u32, highlighted: bool) {
        match self {
            Shape::Rect { x, y, w, h, color } => {
                let c = if highlighted { HIGHLIGHT } else { *color };
                raster::fill_convex_polygon_rgba(
                    buffer,
                    width,
                    height,
                    &[(*x, *y), (x + w, *y), (x + w, y + h), (*x, y + h)],
                    *color,
                );
                raster::draw_rect_outline(buffer, width, height, (*x, *y), (x + w, y + h), c, 2);
            }
            Shape::Circle { cx, cy, r, color } => {
                let c = if highlighted { HIGHLIGHT } else { *color };
                raster::draw_circle(
                    buffer,
                    width,
                    height,
                    (*cx as i32, *cy as i32),
                    *r as i32,
                    *color,
                );
                raster::draw_circle_outline(
                    buffer,
                    width,
                    height,
                    (*cx as i32, *cy as i32),
                    *r as i32,
                    c,
                    2,
                );
            }
            Shape::Path { points, color } => {
                let c = if highlighted { HIGHLIGHT } else { *color };
                raster::draw_polyline(buffer, width, height, points, false, c, BRUSH_THICKNESS);
            }
        }
    }

    fn contains(&self, x: f32, y: f32) -> bool {
        match self {
            Shape::Rect {
                x: ox,
                y: oy,
                w,
                h,
                ..
            } => x > *ox && x < ox + w && y > *oy && y < oy + h,
            Shape::Circle { cx, cy, r, .. } => (x - cx).hypot(y - cy) < *r,
            Shape::Path { points, .. } => {
                // Bounding-box test is enough for grabbing a stroke.
                let (mut min_x, mut min_y) = (f32::MAX, f32::MAX);
                let (mut max_x, mut max_y) = (f32::MIN, f32::MIN);
                for &(px, py) in points {
                    min_x = min_x.min(px);
                    min_y = min_y.min(py);
                    max_x = max_x.max(px);
                    max_y = max_y.max(py);
                }
                x > min_x && x < max_x && y > min_y && y < max_y
            }
        }
    }

    fn anchor(&self) -> (f32, f32) {
        match self {
            Shape::Rect { x, y, .. } => (*x, *y),
            Shape::Circle { cx, cy, .. } => (*cx, *cy),
            Shape::Path { points, .. } => points.first().copied().unwrap_or((0.0, 0.0)),
        }
    }

    fn move_anchor_to(&mut self, x: f32, y: f32) {
        let (ax, ay) = self.anchor();
        let (dx, dy) = (x - ax, y - ay);
        match self {
            Shape::Rect { x, y, .. } => {
                *x += dx;
                *y += dy;
            }
            Shape::Circle { cx, cy, .. } => {
                *cx += dx;
                *cy += dy;
            }
            Shape::Path { points, .. } => {
                for p in points.iter_mut() {
                    p.0 += dx;
                    p.1 += dy;
                }
            }
        }
    }
}

/// Pinch-to-draw workspace. The right hand draws with the active tool,
/// the left hand grabs and drags existing shapes, head turns cycle the
/// tool and the color, and a wide-open mouth wipes the canvas.
pub struct SpatialCanvas {
    shapes: Vec<Shape>,
    tool_idx: usize,
    color_idx: usize,
    draw_anchor: Option<(f32, f32)>,
    drawing_path: bool,
    held: Option<usize>,
    grab_offset: (f32, f32),
    cursor_trail: PointTrail,
}

const TRAIL_CAPACITY: usize = 20;

impl SpatialCanvas {
    pub fn new() -> Self {
        Self {
            shapes: Vec::new(),
            tool_idx: 0,
            color_idx: 0,
            draw_anchor: None,
            drawing_path: false,
            held: None,
            grab_offset: (0.0, 0.0),
            cursor_trail: PointTrail::new(TRAIL_CAPACITY),
        }
    }

    pub fn tool(&self) -> Tool {
        Tool::ALL[self.tool_idx]
    }

    fn color(&self) -> Color {
        PALETTE[self.color_idx].1
    }

    pub fn shape_count(&self) -> usize {
        self.shapes.len()
    }

    fn update_right_hand(&mut self, signals: &Signals) {
        let Some(right) = signals.right else {
            // Tracking dropped mid-gesture; abandon the preview.
            self.draw_anchor = None;
            self.drawing_path = false;
            return;
        };
        let (rx, ry) = right.index_tip;

        match right.pinch {
            PinchEdge::Pressed => match self.tool() {
                Tool::Brush => {
                    self.shapes.push(Shape::Path {
                        points: vec![(rx, ry)],
                        color: self.color(),
                    });
                    self.drawing_path = true;
                }
                Tool::Rect | Tool::Circle => {
                    self.draw_anchor = Some((rx, ry));
                }
            },
            PinchEdge::Held => {
                if self.drawing_path {
                    if let Some(Shape::Path { points, .. }) = self.shapes.last_mut() {
                        points.push((rx, ry));
                    }
                }
            }
            PinchEdge::Released => {
                if let Some((ax, ay)) = self.draw_anchor.take() {
                    let shape = match self.tool() {
                        Tool::Rect => Shape::Rect {
                            x: ax.min(rx),
                            y: ay.min(ry),
                            w: (rx - ax).abs(),
                            h: (ry - ay).abs(),
                            color: self.color(),
                        },
                        Tool::Circle => Shape::Circle {
                            cx: ax,
                            cy: ay,
                            r: (rx - ax).hypot(ry - ay),
                            color: self.color(),
                        },
                        Tool::Brush => return,
                    };
                    self.shapes.push(shape);
                }
                self.drawing_path = false;
            }
            PinchEdge::Idle => {}
        }
    }

    fn update_left_hand(&mut self, signals: &Signals) {
        let Some(left) = signals.left else {
            self.held = None;
            return;
        };
        let (lx, ly) = left.index_tip;

        match left.pinch {
            PinchEdge::Pressed => {
                // Grab the topmost shape under the cursor.
                self.held = self
                    .shapes
                    .iter()
                    .rposition(|shape| shape.contains(lx, ly));
                if let Some(idx) = self.held {
                    let (ax, ay) = self.shapes[idx].anchor();
                    self.grab_offset = (lx - ax, ly - ay);
                }
            }
            PinchEdge::Held => {
                if let Some(idx) = self.held {
                    let (ox, oy) = self.grab_offset;
                    self.shapes[idx].move_anchor_to(lx - ox, ly - oy);
                }
            }
            PinchEdge::Released | PinchEdge::Idle => {
                self.held = None;
            }
        }
    }

    fn draw_preview(&self, frame: &mut Frame, signals: &Signals) {
        let (Some((ax, ay)), Some(right)) = (self.draw_anchor, signals.right) else {
            return;
        };
        if !right.pinch.is_down() {
            return;
        }
        let (rx, ry) = right.index_tip;
        let (w, h) = (frame.width, frame.height);

        match self.tool() {
            Tool::Rect => {
                raster::draw_rect_outline(&mut frame.rgba, w, h, (ax, ay), (rx, ry), self.color(), 1);
            }
            Tool::Circle => {
                let r = (rx - ax).hypot(ry - ay) as i32;
                raster::draw_circle_outline(
                    &mut frame.rgba,
                    w,
                    h,
                    (ax as i32, ay as i32),
                    r,
                    self.color(),
                    1,
                );
            }
            Tool::Brush => {}
        }
    }

    fn draw_cursors(&self, frame: &mut Frame, signals: &Signals) {
        let (w, h) = (frame.width, frame.height);
        if let Some(right) = signals.right {
            let (x, y) = right.index_tip;
            let c = self.color();

            let trail: Vec<(f32, f32)> = self.cursor_trail.iter().collect();
            raster::draw_polyline(&mut frame.rgba, w, h, &trail, false, c, 1);
            for (dx, dy) in [(10.0, 10.0), (-10.0, -10.0), (10.0, -10.0), (-10.0, 10.0)] {
                raster::draw_line(&mut frame.rgba, w, h, (x, y), (x + dx, y + dy), c, 2);
            }
        }
        if let Some(left) = signals.left {
            let (x, y) = left.index_tip;
            raster::draw_circle_outline(
                &mut frame.rgba,
                w,
                h,
                (x as i32, y as i32),
                20,
                GRAB_CURSOR,
                1,
            );
        }
    }
}

impl Default for SpatialCanvas {
    fn default() -> Self {
        Self::new()
    }
}

impl Effect for SpatialCanvas {
    fn kind(&self) -> EffectKind {
        EffectKind::SpatialCanvas
    }

    fn render(&mut self, frame: &mut Frame, _tracked: Option<&TrackedFrame>, signals: &Signals) {
        if signals.turned_right {
            self.tool_idx = (self.tool_idx + 1) % Tool::ALL.len();
        }
        if signals.turned_left {
            self.color_idx = (self.color_idx + 1) % PALETTE.len();
        }
        if signals.mouth_wide {
            self.shapes.clear();
            self.held = None;
            self.draw_anchor = None;
            self.drawing_path = false;
        }

        self.update_right_hand(signals);
        self.update_left_hand(signals);

        match signals.right {
            Some(right) => self.cursor_trail.push(right.index_tip, frame.timestamp),
            None => self.cursor_trail.clear(),
        }

        let (w, h) = (frame.width, frame.height);
        for (idx, shape) in self.shapes.iter().enumerate() {
            shape.draw(&mut frame.rgba, w, h, self.held == Some(idx));
        }
        self.draw_preview(frame, signals);
        self.draw_cursors(frame, signals);
    }

    fn status(&self) -> Option<String> {
        Some(format!(
            "tool {}, color {}, {} shapes",
            self.tool().name(),
            PALETTE[self.color_idx].0,
            self.shapes.len()
        ))
    }

    fn reset(&mut self) {
        *self = Self::new();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::interpret::HandSignal;
    use std::time::Instant;

    fn blank_frame() -> Frame {
        Frame {
            rgba: vec![0; 64 * 64 * 4],
            width: 64,
            height: 64,
            timestamp: Instant::now(),
        }
    }

    fn right(pinch: PinchEdge, at: (f32, f32)) -> Signals {
        Signals {
            right: Some(HandSignal {
                pinch,
                index_tip: at,
            }),
            ..Signals::default()
        }
    }

    fn left(pinch: PinchEdge, at: (f32, f32)) -> Signals {
        Signals {
            left: Some(HandSignal {
                pinch,
                index_tip: at,
            }),
            ..Signals::default()
        }
    }

    #[test]
    fn rect_is_committed_on_release() {
        let mut canvas = SpatialCanvas::new();
        canvas.tool_idx = 1; // RECT
        let mut frame = blank_frame();

        canvas.render(&mut frame, None, &right(PinchEdge::Pressed, (10.0, 10.0)));
        canvas.render(&mut frame, None, &right(PinchEdge::Held, (30.0, 25.0)));
        assert_eq!(canvas.shape_count(), 0);
        canvas.render(&mut frame, None, &right(PinchEdge::Released, (30.0, 25.0)));
        assert_eq!(canvas.shape_count(), 1);

        match &canvas.shapes[0] {
            Shape::Rect { x, y, w, h, .. } => {
                assert_eq!((*x, *y), (10.0, 10.0));
                assert_eq!((*w, *h), (20.0, 15.0));
            }
            other => panic!("expected a rect, got {other:?}"),
        }
    }

    #[test]
    fn brush_path_grows_while_held() {
        let mut canvas = SpatialCanvas::new();
        let mut frame = blank_frame();

        canvas.render(&mut frame, None, &right(PinchEdge::Pressed, (5.0, 5.0)));
        canvas.render(&mut frame, None, &right(PinchEdge::Held, (6.0, 6.0)));
        canvas.render(&mut frame, None, &right(PinchEdge::Held, (7.0, 7.0)));
        canvas.render(&mut frame, None, &right(PinchEdge::Released, (7.0, 7.0)));

        assert_eq!(canvas.shape_count(), 1);
        match &canvas.shapes[0] {
            Shape::Path { points, .. } => assert_eq!(points.len(), 3),
            other => panic!("expected a path, got {other:?}"),
        }
    }

    #[test]
    fn left_pinch_grabs_and_drags_the_topmost_shape() {
        let mut canvas = SpatialCanvas::new();
        canvas.shapes.push(Shape::Rect {
            x: 10.0,
            y: 10.0,
            w: 20.0,
            h: 20.0,
            color: PALETTE[0].1,
        });
        let mut frame = blank_frame();

        canvas.render(&mut frame, None, &left(PinchEdge::Pressed, (15.0, 15.0)));
        assert_eq!(canvas.held, Some(0));
        canvas.render(&mut frame, None, &left(PinchEdge::Held, (25.0, 30.0)));
        match &canvas.shapes[0] {
            Shape::Rect { x, y, .. } => {
                assert_eq!((*x, *y), (20.0, 25.0));
            }
            other => panic!("expected a rect, got {other:?}"),
        }
        canvas.render(&mut frame, None, &left(PinchEdge::Released, (25.0, 30.0)));
        assert_eq!(canvas.held, None);
    }

    #[test]
    fn wide_open_mouth_clears_the_canvas() {
        let mut canvas = SpatialCanvas::new();
        canvas.shapes.push(Shape::Circle {
            cx: 5.0,
            cy: 5.0,
            r: 3.0,
            color: PALETTE[1].1,
        });
        let mut frame = blank_frame();
        let signals = Signals {
            mouth_wide: true,
            face_present: true,
            ..Signals::default()
        };
        canvas.render(&mut frame, None, &signals);
        assert_eq!(canvas.shape_count(), 0);
    }

    #[test]
    fn head_turns_cycle_tool_and_color() {
        let mut canvas = SpatialCanvas::new();
        let mut frame = blank_frame();

        let signals = Signals {
            turned_right: true,
            face_present: true,
            ..Signals::default()
        };
        canvas.render(&mut frame, None, &signals);
        assert_eq!(canvas.tool(), Tool::Rect);

        let signals = Signals {
            turned_left: true,
            face_present: true,
            ..Signals::default()
        };
        canvas.render(&mut frame, None, &signals);
        assert_eq!(PALETTE[canvas.color_idx].0, "RED");
    }

    #[test]
    fn lost_tracking_abandons_the_preview() {
        let mut canvas = SpatialCanvas::new();
        canvas.tool_idx = 2; // CIRCLE
        let mut frame = blank_frame();

        canvas.render(&mut frame, None, &right(PinchEdge::Pressed, (10.0, 10.0)));
        assert!(canvas.draw_anchor.is_some());
        canvas.render(&mut frame, None, &Signals::default());
        assert!(canvas.draw_anchor.is_none());
        assert_eq!(canvas.shape_count(), 0);
    }
}
