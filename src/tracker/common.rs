use anyhow::{Context, Result, anyhow};
use fast_image_resize as fir;
use ndarray::Array4;
use rayon::prelude::*;

use crate::types::Frame;

/// Letterbox geometry used to project model-space points back onto the
/// source frame.
#[derive(Clone, Debug)]
pub struct Letterbox {
    pub scale: f32,
    pub pad_x: f32,
    pub pad_y: f32,
    pub orig_w: u32,
    pub orig_h: u32,
}

impl Letterbox {
    /// Maps a point in model input pixels back to frame pixels.
    pub fn unproject(&self, x: f32, y: f32) -> (f32, f32) {
        let px = (x - self.pad_x) / self.scale;
        let py = (y - self.pad_y) / self.scale;
        (
            px.clamp(0.0, (self.orig_w.saturating_sub(1)) as f32),
            py.clamp(0.0, (self.orig_h.saturating_sub(1)) as f32),
        )
    }
}

/// A square, optionally rotated crop taken out of a frame.
#[derive(Clone, Debug)]
pub struct CropTransform {
    pub center: (f32, f32),
    pub side: f32,
    pub angle: f32,
    pub output_size: u32,
    pub orig_w: u32,
    pub orig_h: u32,
}

impl CropTransform {
    /// Maps a point in crop pixels back to frame pixels.
    pub fn unproject(&self, x: f32, y: f32) -> (f32, f32) {
        let half = self.output_size as f32 / 2.0;
        let scale = self.side / self.output_size as f32;
        let dx = (x - half) * scale;
        let dy = (y - half) * scale;
        let (sin, cos) = self.angle.sin_cos();
        let ox = self.center.0 + dx * cos - dy * sin;
        let oy = self.center.1 + dx * sin + dy * cos;
        (
            ox.clamp(0.0, (self.orig_w.saturating_sub(1)) as f32),
            oy.clamp(0.0, (self.orig_h.saturating_sub(1)) as f32),
        )
    }
}

fn check_frame(frame: &Frame) -> Result<()> {
    if !frame.is_well_formed() {
        return Err(anyhow!(
            "frame buffer size mismatch: got {}, expected {}",
            frame.rgba.len(),
            frame.expected_len()
        ));
    }
    Ok(())
}

/// Letterboxes the frame into a square `target x target` NHWC tensor,
/// normalized to [0, 1].
pub fn letterbox_tensor(frame: &Frame, target: u32) -> Result<(Array4<f32>, Letterbox)> {
    check_frame(frame)?;

    let scale = target as f32 / frame.width.max(frame.height) as f32;
    let new_w = ((frame.width as f32 * scale).round().max(1.0)) as u32;
    let new_h = ((frame.height as f32 * scale).round().max(1.0)) as u32;

    let src = fir::images::Image::from_vec_u8(
        frame.width,
        frame.height,
        frame.rgba.clone(),
        fir::PixelType::U8x4,
    )?;
    let mut dst = fir::images::Image::new(new_w, new_h, fir::PixelType::U8x4);
    let options = fir::ResizeOptions::new()
        .resize_alg(fir::ResizeAlg::Interpolation(fir::FilterType::Bilinear));
    fir::Resizer::new()
        .resize(&src, &mut dst, Some(&options))
        .context("letterbox resize failed")?;
    let resized = dst.into_vec();

    let pad_x = ((target as i64 - new_w as i64) / 2).max(0) as usize;
    let pad_y = ((target as i64 - new_h as i64) / 2).max(0) as usize;

    let side = target as usize;
    let mut canvas = vec![0u8; side * side * 4];
    let dst_stride = side * 4;
    let src_stride = new_w as usize * 4;
    for row in 0..new_h as usize {
        let dst_off = (pad_y + row) * dst_stride + pad_x * 4;
        canvas[dst_off..dst_off + src_stride]
            .copy_from_slice(&resized[row * src_stride..(row + 1) * src_stride]);
    }

    let normalized: Vec<f32> = canvas
        .par_chunks_exact(4)
        .flat_map_iter(|px| {
            [
                px[0] as f32 / 255.0,
                px[1] as f32 / 255.0,
                px[2] as f32 / 255.0,
            ]
        })
        .collect();
    let tensor = Array4::from_shape_vec((1, side, side, 3), normalized)
        .map_err(|err| anyhow!("failed to shape letterbox tensor: {err}"))?;

    Ok((
        tensor,
        Letterbox {
            scale,
            pad_x: pad_x as f32,
            pad_y: pad_y as f32,
            orig_w: frame.width,
            orig_h: frame.height,
        },
    ))
}

/// Samples a rotated square region of the frame into an NHWC tensor,
/// bilinear, normalized to [0, 1]. Out-of-frame samples read as black.
pub fn crop_tensor(
    frame: &Frame,
    center: (f32, f32),
    side: f32,
    angle: f32,
    output_size: u32,
) -> Result<(Array4<f32>, CropTransform)> {
    check_frame(frame)?;

    let out = output_size as usize;
    let mut data = Vec::with_capacity(out * out * 3);
    let half = output_size as f32 / 2.0;
    let scale = side / output_size as f32;
    let (sin, cos) = angle.sin_cos();

    for y in 0..output_size {
        let dy = (y as f32 + 0.5 - half) * scale;
        for x in 0..output_size {
            let dx = (x as f32 + 0.5 - half) * scale;
            let src_x = center.0 + dx * cos - dy * sin;
            let src_y = center.1 + dx * sin + dy * cos;
            data.extend_from_slice(&sample_rgb(frame, src_x, src_y));
        }
    }

    let tensor = Array4::from_shape_vec((1, out, out, 3), data)
        .map_err(|err| anyhow!("failed to shape crop tensor: {err}"))?;

    Ok((
        tensor,
        CropTransform {
            center,
            side,
            angle,
            output_size,
            orig_w: frame.width,
            orig_h: frame.height,
        },
    ))
}

/// Splits a flat (x, y, z) buffer into `count` landmark triples.
pub fn decode_landmarks(flat: &[f32], count: usize) -> Result<Vec<[f32; 3]>> {
    if flat.len() < count * 3 {
        return Err(anyhow!(
            "unexpected landmark buffer length: got {}, need {}",
            flat.len(),
            count * 3
        ));
    }

    Ok(flat
        .chunks_exact(3)
        .take(count)
        .map(|c| [c[0], c[1], c[2]])
        .collect())
}

/// Projects model-space landmarks into frame pixels through a crop.
pub fn project_landmarks(landmarks: &[[f32; 3]], transform: &CropTransform) -> Vec<(f32, f32)> {
    landmarks
        .iter()
        .map(|[x, y, _z]| transform.unproject(*x, *y))
        .collect()
}

pub fn sigmoid(x: f32) -> f32 {
    1.0 / (1.0 + (-x).exp())
}

fn sample_rgb(frame: &Frame, x: f32, y: f32) -> [f32; 3] {
    if x.is_nan() || y.is_nan() {
        return [0.0, 0.0, 0.0];
    }
    let x0 = x.floor();
    let y0 = y.floor();

    let (w, h) = (frame.width as i32, frame.height as i32);
    let fetch = |cx: f32, cy: f32| -> [f32; 3] {
        let (ix, iy) = (cx as i32, cy as i32);
        if ix < 0 || iy < 0 || ix >= w || iy >= h {
            return [0.0, 0.0, 0.0];
        }
        let idx = (iy as u32 * frame.width + ix as u32) as usize * 4;
        if idx + 2 >= frame.rgba.len() {
            return [0.0, 0.0, 0.0];
        }
        [
            frame.rgba[idx] as f32 / 255.0,
            frame.rgba[idx + 1] as f32 / 255.0,
            frame.rgba[idx + 2] as f32 / 255.0,
        ]
    };

    let fx = x - x0;
    let fy = y - y0;
    let c00 = fetch(x0, y0);
    let c10 = fetch(x0 + 1.0, y0);
    let c01 = fetch(x0, y0 + 1.0);
    let c11 = fetch(x0 + 1.0, y0 + 1.0);

    let lerp = |a: f32, b: f32, t: f32| a + (b - a) * t;
    [
        lerp(lerp(c00[0], c10[0], fx), lerp(c01[0], c11[0], fx), fy),
        lerp(lerp(c00[1], c10[1], fx), lerp(c01[1], c11[1], fx), fy),
        lerp(lerp(c00[2], c10[2], fx), lerp(c01[2], c11[2], fx), fy),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Instant;

    fn solid_frame(width: u32, height: u32, value: u8) -> Frame {
        Frame {
            rgba: vec![value; (width * height * 4) as usize],
            width,
            height,
            timestamp: Instant::now(),
        }
    }

    #[test]
    fn letterbox_pads_the_short_axis() {
        let frame = solid_frame(64, 32, 255);
        let (tensor, letterbox) = letterbox_tensor(&frame, 32).unwrap();
        assert_eq!(tensor.shape(), &[1, 32, 32, 3]);
        assert_eq!(letterbox.pad_x, 0.0);
        assert_eq!(letterbox.pad_y, 8.0);
        assert!((letterbox.scale - 0.5).abs() < f32::EPSILON);

        // Padding rows stay black, content rows carry the frame.
        assert_eq!(tensor[[0, 0, 0, 0]], 0.0);
        assert_eq!(tensor[[0, 16, 16, 0]], 1.0);
    }

    #[test]
    fn letterbox_unproject_round_trips() {
        let letterbox = Letterbox {
            scale: 0.25,
            pad_x: 0.0,
            pad_y: 24.0,
            orig_w: 640,
            orig_h: 480,
        };
        // Model-space center of the content maps back to frame center.
        let (x, y) = letterbox.unproject(80.0, 84.0);
        assert!((x - 320.0).abs() < 1e-3);
        assert!((y - 240.0).abs() < 1e-3);
    }

    #[test]
    fn crop_unproject_is_clamped_to_frame() {
        let transform = CropTransform {
            center: (10.0, 10.0),
            side: 400.0,
            angle: 0.0,
            output_size: 100,
            orig_w: 64,
            orig_h: 64,
        };
        let (x, y) = transform.unproject(0.0, 0.0);
        assert_eq!((x, y), (0.0, 0.0));
        let (x, y) = transform.unproject(100.0, 100.0);
        assert_eq!((x, y), (63.0, 63.0));
    }

    #[test]
    fn landmark_decode_checks_length() {
        assert!(decode_landmarks(&[0.0; 10], 4).is_err());
        let flat: Vec<f32> = (0..12).map(|v| v as f32).collect();
        let landmarks = decode_landmarks(&flat, 4).unwrap();
        assert_eq!(landmarks.len(), 4);
        assert_eq!(landmarks[1], [3.0, 4.0, 5.0]);
    }

    #[test]
    fn crop_of_uniform_frame_is_uniform() {
        let frame = solid_frame(32, 32, 128);
        let (tensor, _) = crop_tensor(&frame, (16.0, 16.0), 16.0, 0.0, 8).unwrap();
        let expected = 128.0 / 255.0;
        for value in tensor.iter() {
            assert!((value - expected).abs() < 1e-4);
        }
    }
}
