use std::{
    sync::{
        Arc,
        atomic::{AtomicBool, Ordering},
    },
    thread,
    time::{Duration, Instant},
};

use anyhow::{Result, anyhow};
use crossbeam_channel::Sender;
use nokhwa::{
    Camera,
    pixel_format::RgbFormat,
    query,
    utils::{ApiBackend, CameraIndex, FrameFormat, RequestedFormat, RequestedFormatType},
};

use super::rgba;
use crate::types::Frame;

// The tracker is much slower than the camera; only hand it a subset of
// frames so inference latency stays bounded.
const TRACKER_TARGET_FPS: u64 = 15;
const TRACKER_FRAME_INTERVAL: Duration = Duration::from_millis(1_000 / TRACKER_TARGET_FPS);

// Formats that decode reliably across backends. Some built-in cameras
// advertise YUYV but reject it when opened, so raw formats come first.
const PREFERRED_PIXEL_FORMATS: &[FrameFormat] = &[
    FrameFormat::RAWRGB,
    FrameFormat::RAWBGR,
    FrameFormat::GRAY,
    FrameFormat::YUYV,
    FrameFormat::NV12,
    FrameFormat::MJPEG,
];

fn requested_formats() -> [RequestedFormat<'static>; 4] {
    [
        RequestedFormat::with_formats(
            RequestedFormatType::AbsoluteHighestFrameRate,
            PREFERRED_PIXEL_FORMATS,
        ),
        RequestedFormat::with_formats(
            RequestedFormatType::AbsoluteHighestResolution,
            PREFERRED_PIXEL_FORMATS,
        ),
        RequestedFormat::new::<RgbFormat>(RequestedFormatType::AbsoluteHighestFrameRate),
        RequestedFormat::new::<RgbFormat>(RequestedFormatType::None),
    ]
}

#[derive(Clone, Debug)]
pub struct CameraDevice {
    pub index: CameraIndex,
    pub label: String,
}

/// Handle to the capture thread. Stops and joins on drop.
#[derive(Debug)]
pub struct CameraStream {
    stop: Arc<AtomicBool>,
    handle: Option<thread::JoinHandle<()>>,
}

impl CameraStream {
    pub fn stop(mut self) {
        self.shutdown();
    }

    fn shutdown(&mut self) {
        self.stop.store(true, Ordering::SeqCst);
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}

impl Drop for CameraStream {
    fn drop(&mut self) {
        self.shutdown();
    }
}

pub fn available_cameras() -> Result<Vec<CameraDevice>> {
    let cameras = query(ApiBackend::Auto)?;
    Ok(cameras
        .into_iter()
        .map(|info| CameraDevice {
            index: info.index().clone(),
            label: info.human_name(),
        })
        .collect())
}

fn open_camera(index: CameraIndex) -> Result<Camera> {
    let mut last_err = None;

    for requested in requested_formats() {
        match Camera::new(index.clone(), requested) {
            Ok(mut camera) => match camera.open_stream() {
                Ok(()) => return Ok(camera),
                Err(err) => last_err = Some(err.into()),
            },
            Err(err) => last_err = Some(err.into()),
        }
    }

    Err(last_err.unwrap_or_else(|| anyhow!("no supported camera format")))
}

/// Spawns the capture thread. Every decoded frame is offered to the
/// compositor; a rate-limited subset goes to the tracker. Both channels
/// are bounded and frames are dropped when a consumer is busy, so the
/// newest frame always wins.
pub fn start_camera_stream(
    index: CameraIndex,
    compositor_tx: Sender<Frame>,
    tracker_tx: Sender<Frame>,
) -> Result<CameraStream> {
    // Fail fast before spawning the capture thread.
    open_camera(index.clone())?;

    let stop = Arc::new(AtomicBool::new(false));
    let stop_flag = stop.clone();

    let handle = thread::spawn(move || {
        let mut camera = match open_camera(index) {
            Ok(cam) => cam,
            Err(err) => {
                log::error!("failed to open camera: {err:?}");
                return;
            }
        };

        let mut last_tracker_send = Instant::now() - TRACKER_FRAME_INTERVAL;

        while !stop_flag.load(Ordering::Relaxed) {
            let read_start = Instant::now();
            let buffer = match camera.frame() {
                Ok(buffer) => buffer,
                Err(err) => {
                    log::warn!(
                        "camera frame read failed (after {:?}): {err:?}",
                        read_start.elapsed()
                    );
                    continue;
                }
            };

            let decoded = match rgba::decode_camera_buffer(&buffer) {
                Ok(decoded) => decoded,
                Err(err) => {
                    log::warn!("failed to decode camera frame: {err:?}");
                    continue;
                }
            };

            let frame = Frame {
                rgba: decoded.rgba,
                width: decoded.width,
                height: decoded.height,
                timestamp: Instant::now(),
            };

            if frame.timestamp.duration_since(last_tracker_send) >= TRACKER_FRAME_INTERVAL {
                if tracker_tx.try_send(frame.clone()).is_ok() {
                    last_tracker_send = frame.timestamp;
                }
            }

            // Drop if the compositor is busy; staleness only costs smoothness.
            let _ = compositor_tx.try_send(frame);
        }
    });

    Ok(CameraStream {
        stop,
        handle: Some(handle),
    })
}
