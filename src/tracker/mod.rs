mod anchors;
mod common;
mod detector;
pub mod face;
pub mod hand;

use std::{path::PathBuf, thread};

use crossbeam_channel::{Receiver, Sender};

use crate::{
    model_download::{ModelKind, default_model_path, ensure_model_ready_with_console},
    types::{Frame, TrackedFrame},
};

use self::{face::FaceEngine, hand::HandEngine};

/// Seam for the landmark models, so the pipeline can be exercised
/// without ONNX sessions in tests.
pub(crate) trait TrackEngine: Send + 'static {
    fn infer(&mut self, frame: &Frame) -> anyhow::Result<TrackedFrame>;
}

/// Model file locations for the tracker worker.
#[derive(Clone, Debug)]
pub struct TrackerBackend {
    pub palm_model: PathBuf,
    pub hand_model: PathBuf,
    pub face_model: PathBuf,
    pub mesh_model: PathBuf,
}

impl Default for TrackerBackend {
    fn default() -> Self {
        Self {
            palm_model: default_model_path(ModelKind::PalmDetector),
            hand_model: default_model_path(ModelKind::HandLandmarker),
            face_model: default_model_path(ModelKind::FaceDetector),
            mesh_model: default_model_path(ModelKind::FaceMesh),
        }
    }
}

impl TrackerBackend {
    fn models(&self) -> [(ModelKind, &PathBuf); 4] {
        [
            (ModelKind::PalmDetector, &self.palm_model),
            (ModelKind::HandLandmarker, &self.hand_model),
            (ModelKind::FaceDetector, &self.face_model),
            (ModelKind::FaceMesh, &self.mesh_model),
        ]
    }
}

/// Spawns the tracker worker. It drains its input to the newest frame,
/// runs hand and face inference, and offers the result downstream;
/// it exits when the frame channel disconnects.
pub fn start_tracker(
    backend: TrackerBackend,
    frame_rx: Receiver<Frame>,
    tracked_tx: Sender<TrackedFrame>,
) -> thread::JoinHandle<()> {
    thread::spawn(move || {
        for (kind, path) in backend.models() {
            if let Err(err) = ensure_model_ready_with_console(kind, path) {
                log::error!(
                    "failed to prepare {} model at {}: {err:?}",
                    kind.label(),
                    path.display()
                );
                return;
            }
        }

        let engine = match OrtEngine::load(&backend) {
            Ok(engine) => {
                log::info!("landmark tracker ready (hands + face mesh)");
                engine
            }
            Err(err) => {
                log::error!("failed to load landmark models: {err:?}");
                return;
            }
        };

        run_worker_loop(engine, frame_rx, tracked_tx);
    })
}

fn run_worker_loop<E: TrackEngine>(
    mut engine: E,
    frame_rx: Receiver<Frame>,
    tracked_tx: Sender<TrackedFrame>,
) {
    while let Some(frame) = recv_latest(&frame_rx) {
        match engine.infer(&frame) {
            Ok(tracked) => {
                let _ = tracked_tx.try_send(tracked);
            }
            Err(err) => {
                log::warn!("landmark inference failed: {err:?}");
            }
        }
    }
}

/// Blocks for one frame, then drains everything queued behind it so the
/// worker always processes the most recent capture.
fn recv_latest(frame_rx: &Receiver<Frame>) -> Option<Frame> {
    let mut frame = frame_rx.recv().ok()?;
    while let Ok(newer) = frame_rx.try_recv() {
        frame = newer;
    }
    Some(frame)
}

struct OrtEngine {
    hands: HandEngine,
    faces: FaceEngine,
}

impl OrtEngine {
    fn load(backend: &TrackerBackend) -> anyhow::Result<Self> {
        Ok(Self {
            hands: HandEngine::load(&backend.palm_model, &backend.hand_model)?,
            faces: FaceEngine::load(&backend.face_model, &backend.mesh_model)?,
        })
    }
}

impl TrackEngine for OrtEngine {
    fn infer(&mut self, frame: &Frame) -> anyhow::Result<TrackedFrame> {
        let mut tracked = TrackedFrame::empty(frame.width, frame.height, frame.timestamp);

        // A failed detector only costs this frame's overlay.
        match self.hands.infer(frame) {
            Ok(hands) => tracked.hands = hands,
            Err(err) => log::warn!("hand tracking failed: {err:?}"),
        }
        match self.faces.infer(frame) {
            Ok(face) => tracked.face = face,
            Err(err) => log::warn!("face tracking failed: {err:?}"),
        }

        Ok(tracked)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crossbeam_channel::bounded;
    use std::time::Instant;

    fn frame(tag: u8) -> Frame {
        Frame {
            rgba: vec![tag; 4],
            width: 1,
            height: 1,
            timestamp: Instant::now(),
        }
    }

    #[test]
    fn recv_latest_drains_to_the_newest_frame() {
        let (tx, rx) = bounded(8);
        tx.send(frame(1)).unwrap();
        tx.send(frame(2)).unwrap();
        tx.send(frame(3)).unwrap();

        let newest = recv_latest(&rx).unwrap();
        assert_eq!(newest.rgba[0], 3);
        assert!(rx.is_empty());
    }

    #[test]
    fn recv_latest_returns_none_when_disconnected() {
        let (tx, rx) = bounded::<Frame>(1);
        drop(tx);
        assert!(recv_latest(&rx).is_none());
    }

    struct CountingEngine {
        seen: Sender<u8>,
    }

    impl TrackEngine for CountingEngine {
        fn infer(&mut self, frame: &Frame) -> anyhow::Result<TrackedFrame> {
            self.seen.send(frame.rgba[0]).unwrap();
            Ok(TrackedFrame::empty(frame.width, frame.height, frame.timestamp))
        }
    }

    #[test]
    fn worker_loop_processes_frames_until_disconnect() {
        let (frame_tx, frame_rx) = bounded(8);
        let (tracked_tx, tracked_rx) = bounded(8);
        let (seen_tx, seen_rx) = bounded(8);

        frame_tx.send(frame(7)).unwrap();
        drop(frame_tx);

        run_worker_loop(CountingEngine { seen: seen_tx }, frame_rx, tracked_tx);

        assert_eq!(seen_rx.try_recv().unwrap(), 7);
        assert!(tracked_rx.try_recv().is_ok());
    }
}
