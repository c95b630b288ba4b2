use std::{f32::consts::FRAC_PI_2, path::Path};

use anyhow::{Context, Result, anyhow};
use ort::session::{Session, builder::GraphOptimizationLevel};
use ort::value::Tensor;

use super::{
    common::{self, crop_tensor, letterbox_tensor},
    detector::{Detection, DetectorConfig, decode_detections},
};
use crate::types::{Frame, HandPose, hand};

pub const PALM_INPUT_SIZE: u32 = 192;
pub const POSE_INPUT_SIZE: u32 = 224;

/// Two tracked hands cover every effect; anything past that is noise.
const MAX_HANDS: usize = 2;
const MIN_POSE_CONFIDENCE: f32 = 0.2;

fn default_palm_config() -> DetectorConfig {
    DetectorConfig {
        score_threshold: 0.5,
        nms_threshold: 0.3,
        top_k: 8,
        num_keypoints: 7,
    }
}

/// Palm detection plus per-region 21-point landmark regression.
pub struct HandEngine {
    palm: Session,
    pose: Session,
    anchors: Vec<[f32; 2]>,
    cfg: DetectorConfig,
}

impl HandEngine {
    pub fn load(palm_path: &Path, pose_path: &Path) -> Result<Self> {
        Ok(Self {
            palm: load_session(palm_path).context("loading palm detector")?,
            pose: load_session(pose_path).context("loading hand landmark model")?,
            anchors: super::anchors::anchor_grid(PALM_INPUT_SIZE),
            cfg: default_palm_config(),
        })
    }

    pub fn infer(&mut self, frame: &Frame) -> Result<Vec<HandPose>> {
        let regions = self.detect_palms(frame)?;

        let mut hands = Vec::new();
        for region in regions.iter().take(MAX_HANDS) {
            match self.estimate_pose(frame, region) {
                Ok(Some(pose)) => hands.push(pose),
                Ok(None) => {}
                Err(err) => log::warn!("hand landmark regression failed: {err:?}"),
            }
        }
        Ok(hands)
    }

    fn detect_palms(&mut self, frame: &Frame) -> Result<Vec<Detection>> {
        let (input, letterbox) = letterbox_tensor(frame, PALM_INPUT_SIZE)?;
        let tensor = Tensor::from_array(input)?;
        let outputs = self
            .palm
            .run(ort::inputs![tensor])
            .context("palm detector inference failed")?;
        if outputs.len() < 2 {
            return Err(anyhow!(
                "palm detector returned {} outputs, expected 2",
                outputs.len()
            ));
        }

        let regressors = outputs[0].try_extract_array::<f32>()?;
        let logits = outputs[1].try_extract_array::<f32>()?;

        decode_detections(
            regressors
                .as_slice()
                .ok_or_else(|| anyhow!("palm regressors not contiguous"))?,
            &regressors.shape().to_vec(),
            logits
                .as_slice()
                .ok_or_else(|| anyhow!("palm scores not contiguous"))?,
            &logits.shape().to_vec(),
            &self.anchors,
            PALM_INPUT_SIZE,
            &letterbox,
            &self.cfg,
        )
    }

    fn estimate_pose(&mut self, frame: &Frame, region: &Detection) -> Result<Option<HandPose>> {
        let (center, side, angle) = pose_crop(region);
        let (input, transform) = crop_tensor(frame, center, side, angle, POSE_INPUT_SIZE)?;
        let tensor = Tensor::from_array(input)?;
        let outputs = self
            .pose
            .run(ort::inputs![tensor])
            .context("hand landmark inference failed")?;
        if outputs.len() < 1 {
            return Err(anyhow!("hand landmark model returned no outputs"));
        }

        let coords = outputs[0].try_extract_array::<f32>()?;
        let flat: Vec<f32> = coords.iter().copied().collect();
        let raw = common::decode_landmarks(&flat, hand::LANDMARKS)?;

        let confidence = if outputs.len() > 1 {
            outputs[1]
                .try_extract_array::<f32>()
                .ok()
                .and_then(|arr| arr.iter().next().copied())
                .unwrap_or(0.0)
        } else {
            0.0
        };
        let handedness = if outputs.len() > 2 {
            outputs[2]
                .try_extract_array::<f32>()
                .ok()
                .and_then(|arr| arr.iter().next().copied())
                .unwrap_or(0.0)
        } else {
            0.0
        };

        let confidence = (confidence * region.score).clamp(0.0, 1.0);
        if confidence < MIN_POSE_CONFIDENCE {
            return Ok(None);
        }

        let points = common::project_landmarks(&raw, &transform);
        Ok(Some(HandPose {
            raw,
            points,
            confidence,
            handedness,
            bbox: region.bbox,
        }))
    }
}

pub(super) fn load_session(path: &Path) -> Result<Session> {
    Session::builder()?
        .with_optimization_level(GraphOptimizationLevel::Level3)?
        .with_intra_threads(2)?
        .commit_from_file(path)
        .with_context(|| format!("failed to load model from {}", path.display()))
}

/// Crop geometry for the landmark model: centered between the wrist and
/// the middle-finger base, rotated so the hand points up, and expanded
/// well past the detection box so fingertips stay inside.
fn pose_crop(region: &Detection) -> ((f32, f32), f32, f32) {
    let bbox_center = (
        (region.bbox[0] + region.bbox[2]) * 0.5,
        (region.bbox[1] + region.bbox[3]) * 0.5,
    );

    let (center, angle) = match (region.keypoints.first(), region.keypoints.get(2)) {
        (Some(&wrist), Some(&middle_mcp)) => {
            let center = (
                (wrist.0 + middle_mcp.0) * 0.5,
                (wrist.1 + middle_mcp.1) * 0.5,
            );
            let angle = (middle_mcp.1 - wrist.1).atan2(middle_mcp.0 - wrist.0) + FRAC_PI_2;
            (center, angle)
        }
        _ => (bbox_center, 0.0),
    };

    let base = (region.bbox[2] - region.bbox[0])
        .abs()
        .max((region.bbox[3] - region.bbox[1]).abs());
    let side = base.max(80.0) * 2.6;

    (center, side, angle)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pose_crop_expands_past_the_detection_box() {
        let region = Detection {
            bbox: [100.0, 100.0, 200.0, 220.0],
            keypoints: vec![(150.0, 210.0), (150.0, 190.0), (150.0, 120.0)],
            score: 0.9,
        };
        let (center, side, angle) = pose_crop(&region);
        assert!(side > 120.0);
        // Wrist below middle-finger base means the hand already points up.
        assert!(angle.abs() < 1e-3);
        assert!((center.0 - 150.0).abs() < 1e-3);
        assert!((center.1 - 165.0).abs() < 1e-3);
    }

    #[test]
    fn pose_crop_without_keypoints_falls_back_to_the_box() {
        let region = Detection {
            bbox: [0.0, 0.0, 40.0, 40.0],
            keypoints: Vec::new(),
            score: 0.5,
        };
        let (center, side, angle) = pose_crop(&region);
        assert_eq!(center, (20.0, 20.0));
        assert_eq!(angle, 0.0);
        // Small regions are clamped up to a usable crop size.
        assert!(side >= 80.0 * 2.6 - 1.0);
    }
}
