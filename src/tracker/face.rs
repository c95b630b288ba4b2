use std::path::Path;

use anyhow::{Context, Result, anyhow};
use ort::session::Session;
use ort::value::Tensor;

use super::{
    common::{self, crop_tensor, letterbox_tensor},
    detector::{Detection, DetectorConfig, decode_detections},
    hand::load_session,
};
use crate::types::{face, FacePose, Frame};

pub const FACE_INPUT_SIZE: u32 = 128;
pub const MESH_INPUT_SIZE: u32 = 192;

const MIN_MESH_CONFIDENCE: f32 = 0.3;

fn default_face_config() -> DetectorConfig {
    DetectorConfig {
        score_threshold: 0.6,
        nms_threshold: 0.3,
        top_k: 4,
        num_keypoints: 6,
    }
}

/// Short-range face detection plus dense mesh regression for the best
/// detection. Effects only consume one face, so the strongest wins.
pub struct FaceEngine {
    detector: Session,
    mesh: Session,
    anchors: Vec<[f32; 2]>,
    cfg: DetectorConfig,
}

impl FaceEngine {
    pub fn load(detector_path: &Path, mesh_path: &Path) -> Result<Self> {
        Ok(Self {
            detector: load_session(detector_path).context("loading face detector")?,
            mesh: load_session(mesh_path).context("loading face mesh model")?,
            anchors: super::anchors::anchor_grid(FACE_INPUT_SIZE),
            cfg: default_face_config(),
        })
    }

    pub fn infer(&mut self, frame: &Frame) -> Result<Option<FacePose>> {
        let detections = self.detect_faces(frame)?;
        let Some(best) = detections.first() else {
            return Ok(None);
        };

        self.estimate_mesh(frame, best)
    }

    fn detect_faces(&mut self, frame: &Frame) -> Result<Vec<Detection>> {
        let (input, letterbox) = letterbox_tensor(frame, FACE_INPUT_SIZE)?;
        let tensor = Tensor::from_array(input)?;
        let outputs = self
            .detector
            .run(ort::inputs![tensor])
            .context("face detector inference failed")?;
        if outputs.len() < 2 {
            return Err(anyhow!(
                "face detector returned {} outputs, expected 2",
                outputs.len()
            ));
        }

        let regressors = outputs[0].try_extract_array::<f32>()?;
        let logits = outputs[1].try_extract_array::<f32>()?;

        decode_detections(
            regressors
                .as_slice()
                .ok_or_else(|| anyhow!("face regressors not contiguous"))?,
            &regressors.shape().to_vec(),
            logits
                .as_slice()
                .ok_or_else(|| anyhow!("face scores not contiguous"))?,
            &logits.shape().to_vec(),
            &self.anchors,
            FACE_INPUT_SIZE,
            &letterbox,
            &self.cfg,
        )
    }

    fn estimate_mesh(&mut self, frame: &Frame, region: &Detection) -> Result<Option<FacePose>> {
        let (center, side, angle) = mesh_crop(region);
        let (input, transform) = crop_tensor(frame, center, side, angle, MESH_INPUT_SIZE)?;
        let tensor = Tensor::from_array(input)?;
        let outputs = self
            .mesh
            .run(ort::inputs![tensor])
            .context("face mesh inference failed")?;
        if outputs.len() < 1 {
            return Err(anyhow!("face mesh model returned no outputs"));
        }

        let coords = outputs[0].try_extract_array::<f32>()?;
        let flat: Vec<f32> = coords.iter().copied().collect();
        let raw = common::decode_landmarks(&flat, face::LANDMARKS)?;

        let confidence = if outputs.len() > 1 {
            outputs[1]
                .try_extract_array::<f32>()
                .ok()
                .and_then(|arr| arr.iter().next().copied())
                .map(|v| v.clamp(0.0, 1.0))
                .unwrap_or(region.score)
        } else {
            region.score
        };

        if confidence < MIN_MESH_CONFIDENCE {
            return Ok(None);
        }

        let points = common::project_landmarks(&raw, &transform);
        Ok(Some(FacePose { points, confidence }))
    }
}

/// Crop geometry for the mesh model: the detection box scaled up so the
/// forehead and chin stay inside, rotated level with the eye line.
fn mesh_crop(region: &Detection) -> ((f32, f32), f32, f32) {
    let center = (
        (region.bbox[0] + region.bbox[2]) * 0.5,
        (region.bbox[1] + region.bbox[3]) * 0.5,
    );

    // Detector keypoints 0 and 1 are the right and left eye.
    let angle = match (region.keypoints.first(), region.keypoints.get(1)) {
        (Some(&right_eye), Some(&left_eye)) => {
            (left_eye.1 - right_eye.1).atan2(left_eye.0 - right_eye.0)
        }
        _ => 0.0,
    };

    let base = (region.bbox[2] - region.bbox[0])
        .abs()
        .max((region.bbox[3] - region.bbox[1]).abs());
    let side = base.max(60.0) * 1.6;

    (center, side, angle)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mesh_crop_is_level_for_level_eyes() {
        let region = Detection {
            bbox: [100.0, 100.0, 200.0, 200.0],
            keypoints: vec![(130.0, 140.0), (170.0, 140.0)],
            score: 0.8,
        };
        let (center, side, angle) = mesh_crop(&region);
        assert_eq!(center, (150.0, 150.0));
        assert!((side - 160.0).abs() < 1e-3);
        assert!(angle.abs() < 1e-6);
    }

    #[test]
    fn mesh_crop_tilts_with_the_eye_line() {
        let region = Detection {
            bbox: [0.0, 0.0, 100.0, 100.0],
            keypoints: vec![(30.0, 40.0), (70.0, 80.0)],
            score: 0.8,
        };
        let (_, _, angle) = mesh_crop(&region);
        assert!((angle - std::f32::consts::FRAC_PI_4).abs() < 1e-3);
    }
}
