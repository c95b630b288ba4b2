use anyhow::{Result, anyhow};

use super::common::Letterbox;

/// Tunables for decoding a single-shot detector head.
#[derive(Clone, Debug)]
pub struct DetectorConfig {
    pub score_threshold: f32,
    pub nms_threshold: f32,
    pub top_k: usize,
    /// Keypoints regressed alongside each box (7 for palms, 6 for faces).
    pub num_keypoints: usize,
}

/// One decoded detection, in source-frame pixels.
#[derive(Clone, Debug)]
pub struct Detection {
    pub bbox: [f32; 4],
    pub keypoints: Vec<(f32, f32)>,
    pub score: f32,
}

/// Decodes raw SSD outputs (box+keypoint regressors and logits) against
/// the anchor grid, maps through the letterbox into frame pixels, and
/// applies non-maximum suppression.
pub fn decode_detections(
    regressors: &[f32],
    regressor_shape: &[usize],
    logits: &[f32],
    logit_shape: &[usize],
    anchors: &[[f32; 2]],
    input_size: u32,
    letterbox: &Letterbox,
    cfg: &DetectorConfig,
) -> Result<Vec<Detection>> {
    let (anchor_dim, feature_dim) = trailing_dims(regressor_shape)
        .ok_or_else(|| anyhow!("unexpected regressor shape {regressor_shape:?}"))?;
    let (score_anchor_dim, score_dim) =
        trailing_dims(logit_shape).ok_or_else(|| anyhow!("unexpected logit shape {logit_shape:?}"))?;

    if feature_dim < 4 + cfg.num_keypoints * 2 {
        return Err(anyhow!("regressor feature dimension too small: {feature_dim}"));
    }
    if anchor_dim != score_anchor_dim {
        return Err(anyhow!(
            "anchor dimension mismatch: boxes {anchor_dim}, scores {score_anchor_dim}"
        ));
    }

    let usable = anchors.len().min(anchor_dim);
    let input = input_size as f32;
    let frame_scale = letterbox.orig_w.max(letterbox.orig_h) as f32;
    let bias_x = letterbox.pad_x / letterbox.scale;
    let bias_y = letterbox.pad_y / letterbox.scale;

    let mut candidates = Vec::new();
    for (idx, anchor) in anchors.iter().enumerate().take(usable) {
        let logit = logits
            .get(idx * score_dim)
            .copied()
            .ok_or_else(|| anyhow!("missing score for anchor {idx}"))?;
        let score = super::common::sigmoid(logit);
        if score < cfg.score_threshold {
            continue;
        }

        let features = regressors
            .get(idx * feature_dim..(idx + 1) * feature_dim)
            .ok_or_else(|| anyhow!("missing regressors for anchor {idx}"))?;

        let cx = features[0] / input + anchor[0];
        let cy = features[1] / input + anchor[1];
        let hw = features[2] / input / 2.0;
        let hh = features[3] / input / 2.0;

        let mut x1 = (cx - hw) * frame_scale - bias_x;
        let mut y1 = (cy - hh) * frame_scale - bias_y;
        let mut x2 = (cx + hw) * frame_scale - bias_x;
        let mut y2 = (cy + hh) * frame_scale - bias_y;
        if x2 <= x1 || y2 <= y1 {
            continue;
        }
        clamp_box(&mut x1, &mut y1, &mut x2, &mut y2, letterbox.orig_w, letterbox.orig_h);

        let keypoints = (0..cfg.num_keypoints)
            .map(|k| {
                let kx = features[4 + k * 2] / input + anchor[0];
                let ky = features[4 + k * 2 + 1] / input + anchor[1];
                (kx * frame_scale - bias_x, ky * frame_scale - bias_y)
            })
            .collect();

        candidates.push(Detection {
            bbox: [x1, y1, x2, y2],
            keypoints,
            score,
        });
    }

    Ok(suppress(candidates, cfg.nms_threshold, cfg.top_k))
}

fn trailing_dims(shape: &[usize]) -> Option<(usize, usize)> {
    if shape.len() < 3 {
        return None;
    }
    Some((shape[shape.len() - 2], shape[shape.len() - 1]))
}

fn clamp_box(x1: &mut f32, y1: &mut f32, x2: &mut f32, y2: &mut f32, w: u32, h: u32) {
    let max_w = w.saturating_sub(1) as f32;
    let max_h = h.saturating_sub(1) as f32;
    *x1 = x1.clamp(0.0, max_w);
    *y1 = y1.clamp(0.0, max_h);
    *x2 = x2.clamp(0.0, max_w);
    *y2 = y2.clamp(0.0, max_h);
}

/// Greedy NMS: keeps candidates in descending score order, discarding
/// any that overlap an already-kept box past the threshold.
fn suppress(mut candidates: Vec<Detection>, threshold: f32, top_k: usize) -> Vec<Detection> {
    candidates.sort_by(|a, b| {
        b.score
            .partial_cmp(&a.score)
            .unwrap_or(std::cmp::Ordering::Equal)
    });

    let mut kept: Vec<Detection> = Vec::new();
    for candidate in candidates {
        if kept.len() >= top_k {
            break;
        }
        if kept.iter().all(|k| iou(&candidate.bbox, &k.bbox) < threshold) {
            kept.push(candidate);
        }
    }
    kept
}

fn iou(a: &[f32; 4], b: &[f32; 4]) -> f32 {
    let x1 = a[0].max(b[0]);
    let y1 = a[1].max(b[1]);
    let x2 = a[2].min(b[2]);
    let y2 = a[3].min(b[3]);

    let inter = (x2 - x1).max(0.0) * (y2 - y1).max(0.0);
    if inter <= 0.0 {
        return 0.0;
    }

    let area_a = (a[2] - a[0]).max(0.0) * (a[3] - a[1]).max(0.0);
    let area_b = (b[2] - b[0]).max(0.0) * (b[3] - b[1]).max(0.0);
    let union = area_a + area_b - inter;
    if union <= 0.0 { 0.0 } else { inter / union }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn detection(bbox: [f32; 4], score: f32) -> Detection {
        Detection {
            bbox,
            keypoints: Vec::new(),
            score,
        }
    }

    #[test]
    fn iou_of_identical_boxes_is_one() {
        let b = [0.0, 0.0, 10.0, 10.0];
        assert!((iou(&b, &b) - 1.0).abs() < 1e-6);
    }

    #[test]
    fn iou_of_disjoint_boxes_is_zero() {
        assert_eq!(iou(&[0.0, 0.0, 5.0, 5.0], &[10.0, 10.0, 20.0, 20.0]), 0.0);
    }

    #[test]
    fn suppression_keeps_the_strongest_of_overlapping_boxes() {
        let kept = suppress(
            vec![
                detection([0.0, 0.0, 10.0, 10.0], 0.6),
                detection([1.0, 1.0, 11.0, 11.0], 0.9),
                detection([50.0, 50.0, 60.0, 60.0], 0.5),
            ],
            0.3,
            10,
        );
        assert_eq!(kept.len(), 2);
        assert!((kept[0].score - 0.9).abs() < 1e-6);
        assert!((kept[1].score - 0.5).abs() < 1e-6);
    }

    #[test]
    fn suppression_respects_top_k() {
        let kept = suppress(
            vec![
                detection([0.0, 0.0, 5.0, 5.0], 0.9),
                detection([20.0, 0.0, 25.0, 5.0], 0.8),
                detection([40.0, 0.0, 45.0, 5.0], 0.7),
            ],
            0.3,
            2,
        );
        assert_eq!(kept.len(), 2);
    }
}
