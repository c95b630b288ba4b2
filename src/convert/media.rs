//! Audio and video conversion by marshalling arguments into ffmpeg.

use std::{
    path::{Path, PathBuf},
    process::Command,
};

use super::{ConvertError, converted_sibling};

pub const AUDIO_TARGETS: &[&str] = &["mp3", "wav", "flac", "ogg", "aac", "m4a"];
pub const VIDEO_TARGETS: &[&str] = &["mp4", "mkv", "mov", "webm", "avi"];

/// Re-encodes `input` into the target container/codec, letting ffmpeg
/// pick sensible defaults from the output extension.
pub fn convert(input: &Path, target_ext: &str) -> Result<PathBuf, ConvertError> {
    if !AUDIO_TARGETS.contains(&target_ext) && !VIDEO_TARGETS.contains(&target_ext) {
        return Err(ConvertError::UnsupportedTarget(target_ext.to_string()));
    }

    let ffmpeg = which::which("ffmpeg").map_err(|_| ConvertError::ToolMissing { tool: "ffmpeg" })?;
    let output_path = converted_sibling(input, target_ext);

    let output = Command::new(ffmpeg)
        .arg("-y")
        .arg("-loglevel")
        .arg("error")
        .arg("-i")
        .arg(input)
        .arg(&output_path)
        .output()?;

    if !output.status.success() {
        let detail = String::from_utf8_lossy(&output.stderr)
            .lines()
            .last()
            .unwrap_or("exited with an error")
            .to_string();
        return Err(ConvertError::ToolFailed {
            tool: "ffmpeg",
            detail,
        });
    }

    Ok(output_path)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_target_is_rejected_before_running_anything() {
        let err = convert(Path::new("in.mp3"), "doc").unwrap_err();
        assert!(matches!(err, ConvertError::UnsupportedTarget(t) if t == "doc"));
    }
}
