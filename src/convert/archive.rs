//! Archive repacking through the system `tar` and `zip` tools,
//! unpack-then-repack, the same flow as every other converter here.

use std::{
    fs,
    path::{Path, PathBuf},
    process::Command,
};

use tempfile::TempDir;

use super::{ConvertError, converted_sibling};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ArchiveFormat {
    Tar,
    TarGz,
    TarBz2,
    TarXz,
    Zip,
}

impl ArchiveFormat {
    pub const ALL: [ArchiveFormat; 5] = [
        ArchiveFormat::Zip,
        ArchiveFormat::Tar,
        ArchiveFormat::TarGz,
        ArchiveFormat::TarBz2,
        ArchiveFormat::TarXz,
    ];

    pub fn extension(&self) -> &'static str {
        match self {
            ArchiveFormat::Tar => "tar",
            ArchiveFormat::TarGz => "tar.gz",
            ArchiveFormat::TarBz2 => "tar.bz2",
            ArchiveFormat::TarXz => "tar.xz",
            ArchiveFormat::Zip => "zip",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            ArchiveFormat::Tar => "plain TAR, no compression, preserves permissions",
            ArchiveFormat::TarGz => "TAR with GZip, the Linux/macOS standard",
            ArchiveFormat::TarBz2 => "TAR with BZip2, slower but tighter",
            ArchiveFormat::TarXz => "TAR with XZ, best ratio",
            ArchiveFormat::Zip => "best compatibility across platforms",
        }
    }

    fn compression_flag(&self) -> Option<&'static str> {
        match self {
            ArchiveFormat::Tar => None,
            ArchiveFormat::TarGz => Some("-z"),
            ArchiveFormat::TarBz2 => Some("-j"),
            ArchiveFormat::TarXz => Some("-J"),
            ArchiveFormat::Zip => None,
        }
    }

    fn pack_tool(&self) -> &'static str {
        match self {
            ArchiveFormat::Zip => "zip",
            _ => "tar",
        }
    }

    fn unpack_tool(&self) -> &'static str {
        match self {
            ArchiveFormat::Zip => "unzip",
            _ => "tar",
        }
    }

    /// True when the tools this format needs exist on PATH.
    pub fn is_available(&self) -> bool {
        which::which(self.pack_tool()).is_ok() && which::which(self.unpack_tool()).is_ok()
    }

    /// Detects the format from a file name, honoring the compound
    /// `.tar.*` extensions.
    pub fn detect(path: &Path) -> Option<ArchiveFormat> {
        let name = path.file_name()?.to_str()?.to_ascii_lowercase();
        if name.ends_with(".tar.gz") || name.ends_with(".tgz") {
            Some(ArchiveFormat::TarGz)
        } else if name.ends_with(".tar.bz2") {
            Some(ArchiveFormat::TarBz2)
        } else if name.ends_with(".tar.xz") {
            Some(ArchiveFormat::TarXz)
        } else if name.ends_with(".tar") {
            Some(ArchiveFormat::Tar)
        } else if name.ends_with(".zip") {
            Some(ArchiveFormat::Zip)
        } else {
            None
        }
    }
}

/// Formats whose external tools are actually installed.
pub fn available_formats() -> Vec<ArchiveFormat> {
    ArchiveFormat::ALL
        .into_iter()
        .filter(|f| f.is_available())
        .collect()
}

fn run_tool(tool: &'static str, cmd: &mut Command) -> Result<(), ConvertError> {
    let output = cmd.output().map_err(|err| {
        if err.kind() == std::io::ErrorKind::NotFound {
            ConvertError::ToolMissing { tool }
        } else {
            ConvertError::Io(err)
        }
    })?;

    if !output.status.success() {
        let detail = String::from_utf8_lossy(&output.stderr)
            .lines()
            .last()
            .unwrap_or("exited with an error")
            .to_string();
        return Err(ConvertError::ToolFailed { tool, detail });
    }
    Ok(())
}

/// Extracts `archive` into `dest`, which must already exist.
pub fn unpack(archive: &Path, dest: &Path) -> Result<(), ConvertError> {
    let format = ArchiveFormat::detect(archive).ok_or_else(|| {
        ConvertError::UnknownExtension(
            archive
                .extension()
                .map(|e| e.to_string_lossy().into_owned())
                .unwrap_or_default(),
        )
    })?;

    match format {
        ArchiveFormat::Zip => run_tool(
            "unzip",
            Command::new("unzip")
                .arg("-q")
                .arg("-o")
                .arg(archive)
                .arg("-d")
                .arg(dest),
        ),
        _ => {
            let mut cmd = Command::new("tar");
            cmd.arg("-x");
            if let Some(flag) = format.compression_flag() {
                cmd.arg(flag);
            }
            cmd.arg("-f").arg(archive).arg("-C").arg(dest);
            run_tool("tar", &mut cmd)
        }
    }
}

/// Packs the contents of `dir` into `dest` (full output path).
pub fn pack(dir: &Path, dest: &Path, format: ArchiveFormat) -> Result<(), ConvertError> {
    // The tools run with the archive's directory as an anchor, so the
    // destination has to be absolute before changing directories.
    let dest = if dest.is_absolute() {
        dest.to_path_buf()
    } else {
        std::env::current_dir()?.join(dest)
    };

    match format {
        ArchiveFormat::Zip => run_tool(
            "zip",
            Command::new("zip")
                .current_dir(dir)
                .arg("-q")
                .arg("-r")
                .arg(&dest)
                .arg("."),
        ),
        _ => {
            let mut cmd = Command::new("tar");
            cmd.arg("-C").arg(dir).arg("-c");
            if let Some(flag) = format.compression_flag() {
                cmd.arg(flag);
            }
            cmd.arg("-f").arg(&dest).arg(".");
            run_tool("tar", &mut cmd)
        }
    }
}

/// Unpack-then-repack into the target format; returns the new path.
pub fn convert(input: &Path, target: ArchiveFormat) -> Result<PathBuf, ConvertError> {
    let staging = TempDir::new()?;
    unpack(input, staging.path())?;

    // Strip the full (possibly compound) archive extension for the base.
    let base = converted_base(input);
    let dest = base.with_file_name(format!(
        "{}.{}",
        base.file_name().unwrap_or_default().to_string_lossy(),
        target.extension()
    ));
    pack(staging.path(), &dest, target)?;
    Ok(dest)
}

fn converted_base(input: &Path) -> PathBuf {
    let name = input
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "archive".to_string());
    let lower = name.to_ascii_lowercase();
    let stem_len = ["tar.gz", "tar.bz2", "tar.xz", "tgz", "tar", "zip", "gz", "bz2", "xz"]
        .iter()
        .find(|ext| lower.ends_with(&format!(".{ext}")))
        .map(|ext| name.len() - ext.len() - 1)
        .unwrap_or(name.len());
    input.with_file_name(format!("{}_converted", &name[..stem_len]))
}

/// Paths of all files below `dir`, relative and sorted; used to check
/// that a repack kept every member.
pub fn list_files(dir: &Path) -> Result<Vec<String>, ConvertError> {
    let mut files = Vec::new();
    collect_files(dir, dir, &mut files)?;
    files.sort();
    Ok(files)
}

fn collect_files(root: &Path, dir: &Path, out: &mut Vec<String>) -> Result<(), ConvertError> {
    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        let path = entry.path();
        if path.is_dir() {
            collect_files(root, &path, out)?;
        } else {
            let rel = path
                .strip_prefix(root)
                .unwrap_or(&path)
                .to_string_lossy()
                .into_owned();
            out.push(rel);
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn format_detection_handles_compound_extensions() {
        assert_eq!(
            ArchiveFormat::detect(Path::new("x.tar.gz")),
            Some(ArchiveFormat::TarGz)
        );
        assert_eq!(
            ArchiveFormat::detect(Path::new("x.tgz")),
            Some(ArchiveFormat::TarGz)
        );
        assert_eq!(
            ArchiveFormat::detect(Path::new("x.tar")),
            Some(ArchiveFormat::Tar)
        );
        assert_eq!(
            ArchiveFormat::detect(Path::new("x.zip")),
            Some(ArchiveFormat::Zip)
        );
        assert_eq!(ArchiveFormat::detect(Path::new("x.rar")), None);
    }

    #[test]
    fn converted_base_strips_the_whole_archive_extension() {
        assert_eq!(
            converted_base(Path::new("/data/backup.tar.gz")),
            Path::new("/data/backup_converted")
        );
        assert_eq!(
            converted_base(Path::new("site.zip")),
            Path::new("site_converted")
        );
    }

    #[test]
    fn roundtrip_preserves_the_file_set() {
        if !ArchiveFormat::Tar.is_available() {
            eprintln!("tar not on PATH, skipping roundtrip test");
            return;
        }

        let source = TempDir::new().unwrap();
        fs::write(source.path().join("a.txt"), b"alpha").unwrap();
        fs::create_dir(source.path().join("nested")).unwrap();
        fs::write(source.path().join("nested/b.txt"), b"beta").unwrap();
        let original = list_files(source.path()).unwrap();
        assert_eq!(original, vec!["a.txt".to_string(), "nested/b.txt".to_string()]);

        // Pack, unpack elsewhere, and repack through convert().
        let work = TempDir::new().unwrap();
        let archive = work.path().join("sample.tar");
        pack(source.path(), &archive, ArchiveFormat::Tar).unwrap();

        let unpacked = TempDir::new().unwrap();
        unpack(&archive, unpacked.path()).unwrap();
        assert_eq!(list_files(unpacked.path()).unwrap(), original);

        let repacked = convert(&archive, ArchiveFormat::Tar).unwrap();
        assert_eq!(repacked.file_name().unwrap(), "sample_converted.tar");
        let again = TempDir::new().unwrap();
        unpack(&repacked, again.path()).unwrap();
        assert_eq!(list_files(again.path()).unwrap(), original);
    }
}
