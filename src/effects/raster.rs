//! Software raster primitives for drawing into RGBA frame buffers and
//! single-channel masks. Everything clips at the buffer edges.

use rayon::prelude::*;

pub type Color = [u8; 4];

pub fn put_pixel(buffer: &mut [u8], width: u32, height: u32, x: i32, y: i32, color: Color) {
    if x < 0 || y < 0 {
        return;
    }
    let (ux, uy) = (x as u32, y as u32);
    if ux >= width || uy >= height {
        return;
    }
    let idx = ((uy * width + ux) as usize) * 4;
    if idx + 3 < buffer.len() {
        buffer[idx..idx + 4].copy_from_slice(&color);
    }
}

/// Bresenham line with a diamond-shaped brush of the given thickness.
pub fn draw_line(
    buffer: &mut [u8],
    width: u32,
    height: u32,
    p0: (f32, f32),
    p1: (f32, f32),
    color: Color,
    thickness: i32,
) {
    let (mut x0, mut y0) = (p0.0 as i32, p0.1 as i32);
    let (x1, y1) = (p1.0 as i32, p1.1 as i32);
    let dx = (x1 - x0).abs();
    let sx = if x0 < x1 { 1 } else { -1 };
    let dy = -(y1 - y0).abs();
    let sy = if y0 < y1 { 1 } else { -1 };
    let mut err = dx + dy;
    let radius = (thickness.max(1) - 1) / 2;

    loop {
        put_pixel(buffer, width, height, x0, y0, color);
        if radius > 0 {
            for ox in -radius..=radius {
                for oy in -radius..=radius {
                    if (ox != 0 || oy != 0) && ox.abs() + oy.abs() <= radius {
                        put_pixel(buffer, width, height, x0 + ox, y0 + oy, color);
                    }
                }
            }
        }
        if x0 == x1 && y0 == y1 {
            break;
        }
        let e2 = 2 * err;
        if e2 >= dy {
            err += dy;
            x0 += sx;
        }
        if e2 <= dx {
            err += dx;
            y0 += sy;
        }
    }
}

pub fn draw_circle(
    buffer: &mut [u8],
    width: u32,
    height: u32,
    center: (i32, i32),
    radius: i32,
    color: Color,
) {
    let (cx, cy) = center;
    for dy in -radius..=radius {
        for dx in -radius..=radius {
            if dx * dx + dy * dy <= radius * radius {
                put_pixel(buffer, width, height, cx + dx, cy + dy, color);
            }
        }
    }
}

pub fn draw_circle_outline(
    buffer: &mut [u8],
    width: u32,
    height: u32,
    center: (i32, i32),
    radius: i32,
    color: Color,
    thickness: i32,
) {
    let steps = (radius.max(4) * 8) as usize;
    let mut prev = None;
    for i in 0..=steps {
        let angle = i as f32 / steps as f32 * std::f32::consts::TAU;
        let point = (
            center.0 as f32 + radius as f32 * angle.cos(),
            center.1 as f32 + radius as f32 * angle.sin(),
        );
        if let Some(prev) = prev {
            draw_line(buffer, width, height, prev, point, color, thickness);
        }
        prev = Some(point);
    }
}

pub fn draw_rect_outline(
    buffer: &mut [u8],
    width: u32,
    height: u32,
    top_left: (f32, f32),
    bottom_right: (f32, f32),
    color: Color,
    thickness: i32,
) {
    let (x1, y1) = top_left;
    let (x2, y2) = bottom_right;
    draw_line(buffer, width, height, (x1, y1), (x2, y1), color, thickness);
    draw_line(buffer, width, height, (x2, y1), (x2, y2), color, thickness);
    draw_line(buffer, width, height, (x2, y2), (x1, y2), color, thickness);
    draw_line(buffer, width, height, (x1, y2), (x1, y1), color, thickness);
}

pub fn draw_polyline(
    buffer: &mut [u8],
    width: u32,
    height: u32,
    points: &[(f32, f32)],
    closed: bool,
    color: Color,
    thickness: i32,
) {
    for pair in points.windows(2) {
        draw_line(buffer, width, height, pair[0], pair[1], color, thickness);
    }
    if closed && points.len() > 2 {
        draw_line(
            buffer,
            width,
            height,
            points[points.len() - 1],
            points[0],
            color,
            thickness,
        );
    }
}

/// Convex hull via Andrew's monotone chain, counter-clockwise order.
pub fn convex_hull(points: &[(f32, f32)]) -> Vec<(f32, f32)> {
    if points.len() <= 2 {
        return points.to_vec();
    }

    let mut sorted = points.to_vec();
    sorted.sort_by(|a, b| {
        a.0.partial_cmp(&b.0)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then(a.1.partial_cmp(&b.1).unwrap_or(std::cmp::Ordering::Equal))
    });
    sorted.dedup();

    if sorted.len() <= 2 {
        return sorted;
    }

    let cross = |o: (f32, f32), a: (f32, f32), b: (f32, f32)| -> f32 {
        (a.0 - o.0) * (b.1 - o.1) - (a.1 - o.1) * (b.0 - o.0)
    };

    let mut lower: Vec<(f32, f32)> = Vec::with_capacity(sorted.len());
    for &p in &sorted {
        while lower.len() >= 2 && cross(lower[lower.len() - 2], lower[lower.len() - 1], p) <= 0.0 {
            lower.pop();
        }
        lower.push(p);
    }

    let mut upper: Vec<(f32, f32)> = Vec::with_capacity(sorted.len());
    for &p in sorted.iter().rev() {
        while upper.len() >= 2 && cross(upper[upper.len() - 2], upper[upper.len() - 1], p) <= 0.0 {
            upper.pop();
        }
        upper.push(p);
    }

    // Chain endpoints repeat each other's start.
    lower.pop();
    upper.pop();
    lower.extend(upper);
    lower
}

/// Scales hull points outward from their centroid and shifts them
/// vertically, producing the "safety zone" polygon.
pub fn expand_polygon(points: &[(f32, f32)], scale: f32, offset_y: f32) -> Vec<(f32, f32)> {
    if points.is_empty() {
        return Vec::new();
    }
    let n = points.len() as f32;
    let (sum_x, sum_y) = points
        .iter()
        .fold((0.0, 0.0), |acc, p| (acc.0 + p.0, acc.1 + p.1));
    let centroid = (sum_x / n, sum_y / n);

    points
        .iter()
        .map(|&(x, y)| {
            (
                centroid.0 + (x - centroid.0) * scale,
                centroid.1 + (y - centroid.1) * scale + offset_y,
            )
        })
        .collect()
}

/// A single-channel byte mask matching a frame's dimensions.
#[derive(Clone, Debug)]
pub struct Mask {
    pub data: Vec<u8>,
    pub width: u32,
    pub height: u32,
}

impl Mask {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            data: vec![0; (width as usize) * (height as usize)],
            width,
            height,
        }
    }

    pub fn clear(&mut self) {
        self.data.fill(0);
    }

    /// Scanline fill of a convex polygon.
    pub fn fill_convex_polygon(&mut self, polygon: &[(f32, f32)], value: u8) {
        let width = self.width;
        for_each_polygon_span(polygon, self.width, self.height, |y, start, end| {
            let row = (y * width) as usize;
            for x in start..=end {
                self.data[row + x as usize] = value;
            }
        });
    }

    /// Grows set pixels by `radius` using a square structuring element.
    /// The square max filter separates into a horizontal and a vertical
    /// pass, keeping the cost linear in the radius.
    pub fn dilate(&mut self, radius: u32) {
        if radius == 0 {
            return;
        }
        self.max_filter_pass(radius, true);
        self.max_filter_pass(radius, false);
    }

    fn max_filter_pass(&mut self, radius: u32, horizontal: bool) {
        let (w, h) = (self.width as i32, self.height as i32);
        let r = radius as i32;
        let src = self.data.clone();

        self.data
            .par_chunks_mut(self.width as usize)
            .enumerate()
            .for_each(|(y, row)| {
                let y = y as i32;
                for x in 0..w {
                    let mut best = 0u8;
                    for d in -r..=r {
                        let (sx, sy) = if horizontal { (x + d, y) } else { (x, y + d) };
                        if sx < 0 || sx >= w || sy < 0 || sy >= h {
                            continue;
                        }
                        let v = src[(sy * w + sx) as usize];
                        if v > best {
                            best = v;
                            if best == 255 {
                                break;
                            }
                        }
                    }
                    row[x as usize] = best;
                }
            });
    }

    /// Two-pass box blur, run twice; close enough to a Gaussian for a
    /// soft mask edge at a fraction of the cost.
    pub fn blur(&mut self, radius: u32) {
        if radius == 0 {
            return;
        }
        for _ in 0..2 {
            self.box_blur_pass(radius, true);
            self.box_blur_pass(radius, false);
        }
    }

    fn box_blur_pass(&mut self, radius: u32, horizontal: bool) {
        let (w, h) = (self.width as i32, self.height as i32);
        let r = radius as i32;
        let window = (2 * r + 1) as u32;
        let src = self.data.clone();

        self.data
            .par_chunks_mut(self.width as usize)
            .enumerate()
            .for_each(|(y, row)| {
                let y = y as i32;
                for x in 0..w {
                    let mut sum: u32 = 0;
                    for d in -r..=r {
                        let (sx, sy) = if horizontal { (x + d, y) } else { (x, y + d) };
                        let sx = sx.clamp(0, w - 1);
                        let sy = sy.clamp(0, h - 1);
                        sum += src[(sy * w + sx) as usize] as u32;
                    }
                    row[x as usize] = (sum / window) as u8;
                }
            });
    }
}

/// Scanline fill of a convex polygon straight into an RGBA buffer.
pub fn fill_convex_polygon_rgba(
    buffer: &mut [u8],
    width: u32,
    height: u32,
    polygon: &[(f32, f32)],
    color: Color,
) {
    for_each_polygon_span(polygon, width, height, |y, start, end| {
        for x in start..=end {
            let idx = ((y * width + x) as usize) * 4;
            if idx + 3 < buffer.len() {
                buffer[idx..idx + 4].copy_from_slice(&color);
            }
        }
    });
}

/// Walks the horizontal spans covered by a convex polygon, clipped to
/// the buffer, calling `f(y, x_start, x_end)` per row.
fn for_each_polygon_span(
    polygon: &[(f32, f32)],
    width: u32,
    height: u32,
    mut f: impl FnMut(u32, u32, u32),
) {
    if polygon.len() < 3 || width == 0 || height == 0 {
        return;
    }

    let min_y = polygon
        .iter()
        .map(|p| p.1)
        .fold(f32::INFINITY, f32::min)
        .max(0.0) as u32;
    let max_y = polygon
        .iter()
        .map(|p| p.1)
        .fold(f32::NEG_INFINITY, f32::max)
        .min((height - 1) as f32);
    if max_y < 0.0 {
        return;
    }

    let mut crossings: Vec<f32> = Vec::new();
    for y in min_y..=max_y as u32 {
        let scan = y as f32 + 0.5;
        crossings.clear();
        for i in 0..polygon.len() {
            let (x1, y1) = polygon[i];
            let (x2, y2) = polygon[(i + 1) % polygon.len()];
            if (y1 <= scan && y2 > scan) || (y2 <= scan && y1 > scan) {
                let t = (scan - y1) / (y2 - y1);
                crossings.push(x1 + t * (x2 - x1));
            }
        }
        if crossings.len() < 2 {
            continue;
        }
        crossings.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
        let first = crossings[0];
        let last = *crossings.last().unwrap();
        if last < 0.0 || first > (width - 1) as f32 {
            continue;
        }
        let start = first.max(0.0) as u32;
        let end = last.min((width - 1) as f32) as u32;
        f(y, start, end);
    }
}

/// Per-pixel blend: where the mask is high, `overlay` shows through.
pub fn composite_masked(frame: &mut [u8], overlay: &[u8], mask: &Mask) {
    let pixels = mask.data.len();
    if frame.len() < pixels * 4 || overlay.len() < pixels * 4 {
        return;
    }

    frame
        .par_chunks_exact_mut(4)
        .zip(overlay.par_chunks_exact(4))
        .zip(mask.data.par_iter())
        .for_each(|((dst, src), &m)| {
            let alpha = m as u16;
            let inverse = 255 - alpha;
            for c in 0..3 {
                dst[c] = ((src[c] as u16 * alpha + dst[c] as u16 * inverse) / 255) as u8;
            }
        });
}

/// Shifts hue (degrees) and adds saturation, for the "other dimension"
/// look on past frames.
pub fn shift_hue_saturation(rgba: &mut [u8], hue_shift_deg: f32, saturation_add: f32) {
    rgba.par_chunks_exact_mut(4).for_each(|px| {
        let (h, s, v) = rgb_to_hsv(px[0], px[1], px[2]);
        let h = (h + hue_shift_deg).rem_euclid(360.0);
        let s = (s + saturation_add).clamp(0.0, 1.0);
        let (r, g, b) = hsv_to_rgb(h, s, v);
        px[0] = r;
        px[1] = g;
        px[2] = b;
    });
}

fn rgb_to_hsv(r: u8, g: u8, b: u8) -> (f32, f32, f32) {
    let r = r as f32 / 255.0;
    let g = g as f32 / 255.0;
    let b = b as f32 / 255.0;
    let max = r.max(g).max(b);
    let min = r.min(g).min(b);
    let delta = max - min;

    let h = if delta == 0.0 {
        0.0
    } else if max == r {
        60.0 * (((g - b) / delta).rem_euclid(6.0))
    } else if max == g {
        60.0 * ((b - r) / delta + 2.0)
    } else {
        60.0 * ((r - g) / delta + 4.0)
    };
    let s = if max == 0.0 { 0.0 } else { delta / max };
    (h, s, max)
}

fn hsv_to_rgb(h: f32, s: f32, v: f32) -> (u8, u8, u8) {
    let c = v * s;
    let x = c * (1.0 - ((h / 60.0).rem_euclid(2.0) - 1.0).abs());
    let m = v - c;

    let (r, g, b) = match h {
        h if h < 60.0 => (c, x, 0.0),
        h if h < 120.0 => (x, c, 0.0),
        h if h < 180.0 => (0.0, c, x),
        h if h < 240.0 => (0.0, x, c),
        h if h < 300.0 => (x, 0.0, c),
        _ => (c, 0.0, x),
    };

    (
        ((r + m) * 255.0).round() as u8,
        ((g + m) * 255.0).round() as u8,
        ((b + m) * 255.0).round() as u8,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hull_of_a_square_with_interior_points() {
        let points = vec![
            (0.0, 0.0),
            (10.0, 0.0),
            (10.0, 10.0),
            (0.0, 10.0),
            (5.0, 5.0),
            (3.0, 7.0),
        ];
        let hull = convex_hull(&points);
        assert_eq!(hull.len(), 4);
        for corner in [(0.0, 0.0), (10.0, 0.0), (10.0, 10.0), (0.0, 10.0)] {
            assert!(hull.contains(&corner), "missing corner {corner:?}");
        }
    }

    #[test]
    fn expand_polygon_scales_away_from_centroid() {
        let square = vec![(0.0, 0.0), (10.0, 0.0), (10.0, 10.0), (0.0, 10.0)];
        let expanded = expand_polygon(&square, 2.0, 0.0);
        assert_eq!(expanded[0], (-5.0, -5.0));
        assert_eq!(expanded[2], (15.0, 15.0));
    }

    #[test]
    fn mask_fill_covers_the_polygon_interior_only() {
        let mut mask = Mask::new(20, 20);
        mask.fill_convex_polygon(&[(5.0, 5.0), (15.0, 5.0), (15.0, 15.0), (5.0, 15.0)], 255);
        assert_eq!(mask.data[(10 * 20 + 10) as usize], 255);
        assert_eq!(mask.data[0], 0);
        assert_eq!(mask.data[(19 * 20 + 19) as usize], 0);
    }

    #[test]
    fn mask_fill_clips_out_of_bounds_polygons() {
        let mut mask = Mask::new(8, 8);
        mask.fill_convex_polygon(&[(-10.0, -10.0), (30.0, -10.0), (30.0, 30.0), (-10.0, 30.0)], 255);
        assert!(mask.data.iter().all(|&v| v == 255));
    }

    #[test]
    fn dilate_grows_a_point() {
        let mut mask = Mask::new(9, 9);
        mask.data[4 * 9 + 4] = 255;
        mask.dilate(2);
        assert_eq!(mask.data[2 * 9 + 2], 255);
        assert_eq!(mask.data[0], 0);
    }

    #[test]
    fn blur_softens_edges_but_keeps_range() {
        let mut mask = Mask::new(16, 16);
        mask.fill_convex_polygon(&[(4.0, 4.0), (12.0, 4.0), (12.0, 12.0), (4.0, 12.0)], 255);
        mask.blur(2);
        let center = mask.data[8 * 16 + 8];
        let edge = mask.data[4 * 16 + 4];
        assert!(center > edge);
        assert!(mask.data.iter().all(|&v| v <= 255));
    }

    #[test]
    fn composite_follows_the_mask() {
        let mut frame = vec![0u8, 0, 0, 255, 0, 0, 0, 255];
        let overlay = vec![200u8, 100, 50, 255, 200, 100, 50, 255];
        let mut mask = Mask::new(2, 1);
        mask.data[0] = 255;
        mask.data[1] = 0;

        composite_masked(&mut frame, &overlay, &mask);
        assert_eq!(&frame[0..3], &[200, 100, 50]);
        assert_eq!(&frame[4..7], &[0, 0, 0]);
    }

    #[test]
    fn hue_shift_round_trips_grayscale_unchanged() {
        let mut px = vec![128u8, 128, 128, 255];
        shift_hue_saturation(&mut px, 40.0, 0.0);
        assert_eq!(&px[..3], &[128, 128, 128]);
    }

    #[test]
    fn line_drawing_stays_in_bounds() {
        let mut buffer = vec![0u8; 8 * 8 * 4];
        draw_line(
            &mut buffer,
            8,
            8,
            (-5.0, -5.0),
            (20.0, 20.0),
            [255, 0, 0, 255],
            3,
        );
        // Diagonal pixels inside the buffer are set.
        let idx = (3 * 8 + 3) * 4;
        assert_eq!(buffer[idx], 255);
    }
}
