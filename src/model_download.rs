use std::{
    fs,
    io::{Read, Write},
    path::{Path, PathBuf},
    thread,
    time::Duration,
};

use anyhow::Context;
use indicatif::{ProgressBar, ProgressStyle};
use reqwest::blocking::Client;

const MODEL_DIR: &str = "models";
const DOWNLOAD_ATTEMPTS: u32 = 3;
const RETRY_BASE_DELAY: Duration = Duration::from_millis(500);

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ModelKind {
    PalmDetector,
    HandLandmarker,
    FaceDetector,
    FaceMesh,
}

impl ModelKind {
    pub const ALL: [ModelKind; 4] = [
        ModelKind::PalmDetector,
        ModelKind::HandLandmarker,
        ModelKind::FaceDetector,
        ModelKind::FaceMesh,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            ModelKind::PalmDetector => "palm detector",
            ModelKind::HandLandmarker => "hand landmarker",
            ModelKind::FaceDetector => "face detector",
            ModelKind::FaceMesh => "face mesh",
        }
    }

    fn filename(&self) -> &'static str {
        match self {
            ModelKind::PalmDetector => "palm_detection_mediapipe_2023feb.onnx",
            ModelKind::HandLandmarker => "handpose_estimation_mediapipe_2023feb.onnx",
            ModelKind::FaceDetector => "face_detection_short_range_2021nov.onnx",
            ModelKind::FaceMesh => "facemesh_mediapipe_2021nov.onnx",
        }
    }

    fn url(&self) -> String {
        format!(
            "https://raw.githubusercontent.com/riftcam/model-zoo/main/models/{}",
            self.filename()
        )
    }
}

pub fn default_model_path(kind: ModelKind) -> PathBuf {
    PathBuf::from(MODEL_DIR).join(kind.filename())
}

#[derive(Clone, Debug)]
pub enum DownloadEvent {
    AlreadyPresent {
        model: ModelKind,
    },
    Started {
        model: ModelKind,
        total: Option<u64>,
    },
    Progress {
        model: ModelKind,
        downloaded: u64,
        total: Option<u64>,
    },
    Finished {
        model: ModelKind,
    },
}

/// Makes sure the model file exists at `path`, downloading it with
/// retries and exponential backoff when missing.
pub fn ensure_model_ready<F>(kind: ModelKind, path: &Path, mut on_event: F) -> anyhow::Result<()>
where
    F: FnMut(DownloadEvent),
{
    if path.exists() {
        on_event(DownloadEvent::AlreadyPresent { model: kind });
        on_event(DownloadEvent::Finished { model: kind });
        return Ok(());
    }

    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("failed to create model directory {}", parent.display()))?;
    }

    let url = kind.url();
    let mut delay = RETRY_BASE_DELAY;
    let mut last_err = None;
    for attempt in 1..=DOWNLOAD_ATTEMPTS {
        match download_to_path(kind, &url, path, &mut on_event) {
            Ok(()) => return Ok(()),
            Err(err) => {
                log::warn!(
                    "{} download attempt {attempt}/{DOWNLOAD_ATTEMPTS} failed: {err:?}",
                    kind.label()
                );
                last_err = Some(err);
                if attempt < DOWNLOAD_ATTEMPTS {
                    thread::sleep(delay);
                    delay *= 2;
                }
            }
        }
    }

    Err(last_err.unwrap_or_else(|| anyhow::anyhow!("model download failed")))
        .with_context(|| format!("failed to fetch {} model to {}", kind.label(), path.display()))
}

/// Console variant: same as [`ensure_model_ready`] but drives an
/// indicatif progress bar instead of a caller-supplied callback.
pub fn ensure_model_ready_with_console(kind: ModelKind, path: &Path) -> anyhow::Result<()> {
    let mut progress: Option<ProgressBar> = None;
    ensure_model_ready(kind, path, |event| match event {
        DownloadEvent::Started { total, .. } => {
            progress = Some(create_progress_bar(total));
        }
        DownloadEvent::Progress { downloaded, .. } => {
            if let Some(pb) = progress.as_ref() {
                pb.set_position(downloaded);
            }
        }
        DownloadEvent::Finished { model } => {
            if let Some(pb) = progress.take() {
                pb.finish_with_message(format!("{} ready", model.label()));
            }
        }
        DownloadEvent::AlreadyPresent { .. } => {}
    })
}

fn download_to_path<F>(
    kind: ModelKind,
    url: &str,
    dest: &Path,
    on_event: &mut F,
) -> anyhow::Result<()>
where
    F: FnMut(DownloadEvent),
{
    log::info!(
        "downloading {} model from {url} to {}",
        kind.label(),
        dest.display()
    );

    let client = Client::new();
    let mut response = client
        .get(url)
        .send()
        .context("failed to start model download")?
        .error_for_status()
        .context("model download returned error status")?;

    let total = response.content_length();
    on_event(DownloadEvent::Started { model: kind, total });

    // Stream into a sibling temp file, then move into place so a killed
    // download never leaves a truncated model behind.
    let tmp_path = dest.with_extension("download");
    let mut file = fs::File::create(&tmp_path)
        .with_context(|| format!("failed to create {}", tmp_path.display()))?;

    let mut downloaded: u64 = 0;
    let mut buffer = [0u8; 16 * 1024];
    loop {
        let bytes_read = response
            .read(&mut buffer)
            .context("failed while reading model bytes")?;
        if bytes_read == 0 {
            break;
        }

        file.write_all(&buffer[..bytes_read])
            .context("failed while writing model to disk")?;
        downloaded += bytes_read as u64;
        on_event(DownloadEvent::Progress {
            model: kind,
            downloaded,
            total,
        });
    }

    file.sync_all()
        .context("failed to flush downloaded model to disk")?;
    fs::rename(&tmp_path, dest).with_context(|| {
        format!(
            "failed to move {} into place at {}",
            tmp_path.display(),
            dest.display()
        )
    })?;

    on_event(DownloadEvent::Finished { model: kind });
    Ok(())
}

fn create_progress_bar(total: Option<u64>) -> ProgressBar {
    match total {
        Some(total) if total > 0 => {
            let pb = ProgressBar::new(total);
            let style = ProgressStyle::with_template(
                "{spinner:.green} [{elapsed_precise}] [{wide_bar:.cyan/blue}] {bytes}/{total_bytes} ({eta})",
            )
            .unwrap()
            .progress_chars("=>-");
            pb.set_style(style);
            pb
        }
        _ => {
            let pb = ProgressBar::new_spinner();
            let style = ProgressStyle::with_template("{spinner:.green} downloading model").unwrap();
            pb.set_style(style);
            pb.enable_steady_tick(Duration::from_millis(100));
            pb
        }
    }
}
