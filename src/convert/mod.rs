pub mod archive;
pub mod console;
pub mod document;
pub mod image;
pub mod media;

use std::path::{Path, PathBuf};

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConvertError {
    #[error("input has no file extension")]
    MissingExtension,
    #[error("no converter knows the '.{0}' extension")]
    UnknownExtension(String),
    #[error("unsupported target format '{0}'")]
    UnsupportedTarget(String),
    #[error("'{tool}' was not found on PATH")]
    ToolMissing { tool: &'static str },
    #[error("{tool} failed: {detail}")]
    ToolFailed { tool: &'static str, detail: String },
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error("image codec error: {0}")]
    Image(#[from] ::image::ImageError),
}

/// The converter families, keyed off the input file's extension.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Category {
    Image,
    Audio,
    Video,
    Document,
    Archive,
}

impl Category {
    pub fn label(&self) -> &'static str {
        match self {
            Category::Image => "Image",
            Category::Audio => "Audio",
            Category::Video => "Video",
            Category::Document => "Document",
            Category::Archive => "Archive",
        }
    }
}

const AUDIO_EXTENSIONS: &[&str] = &["mp3", "wav", "flac", "aac", "ogg", "wma", "m4a", "aiff"];
const VIDEO_EXTENSIONS: &[&str] = &["mp4", "mkv", "mov", "avi", "wmv", "flv", "webm"];
const IMAGE_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg", "gif", "bmp", "tiff", "webp"];
const DOCUMENT_EXTENSIONS: &[&str] = &["docx", "odt", "rtf", "txt", "html", "htm", "md"];
const ARCHIVE_EXTENSIONS: &[&str] = &["zip", "tar", "gz", "bz2", "xz", "tgz"];

/// Identifies the converter family for a path from its extension.
pub fn category_for(path: &Path) -> Result<Category, ConvertError> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
        .ok_or(ConvertError::MissingExtension)?;

    let table: [(&[&str], Category); 5] = [
        (AUDIO_EXTENSIONS, Category::Audio),
        (VIDEO_EXTENSIONS, Category::Video),
        (IMAGE_EXTENSIONS, Category::Image),
        (DOCUMENT_EXTENSIONS, Category::Document),
        (ARCHIVE_EXTENSIONS, Category::Archive),
    ];
    for (extensions, category) in table {
        if extensions.contains(&ext.as_str()) {
            return Ok(category);
        }
    }
    Err(ConvertError::UnknownExtension(ext))
}

/// Output path convention: `<base>_converted.<ext>` next to the input.
pub fn converted_sibling(input: &Path, ext: &str) -> PathBuf {
    let stem = input
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "output".to_string());
    input.with_file_name(format!("{stem}_converted.{ext}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn categories_resolve_from_extensions() {
        assert_eq!(category_for(Path::new("a.mp3")).unwrap(), Category::Audio);
        assert_eq!(category_for(Path::new("b.MKV")).unwrap(), Category::Video);
        assert_eq!(category_for(Path::new("c.png")).unwrap(), Category::Image);
        assert_eq!(
            category_for(Path::new("d.docx")).unwrap(),
            Category::Document
        );
        assert_eq!(category_for(Path::new("e.tar")).unwrap(), Category::Archive);
    }

    #[test]
    fn unknown_and_missing_extensions_are_reported() {
        assert!(matches!(
            category_for(Path::new("weird.xyz")),
            Err(ConvertError::UnknownExtension(ext)) if ext == "xyz"
        ));
        assert!(matches!(
            category_for(Path::new("no_extension")),
            Err(ConvertError::MissingExtension)
        ));
    }

    #[test]
    fn converted_sibling_keeps_the_directory() {
        let out = converted_sibling(Path::new("/tmp/music/song.wav"), "mp3");
        assert_eq!(out, Path::new("/tmp/music/song_converted.mp3"));
    }
}
