//! Document conversion by marshalling arguments into pandoc.

use std::{
    path::{Path, PathBuf},
    process::Command,
};

use super::{ConvertError, converted_sibling};

pub const TARGETS: &[&str] = &["docx", "odt", "rtf", "html", "md", "txt"];

pub fn convert(input: &Path, target_ext: &str) -> Result<PathBuf, ConvertError> {
    if !TARGETS.contains(&target_ext) {
        return Err(ConvertError::UnsupportedTarget(target_ext.to_string()));
    }

    let pandoc = which::which("pandoc").map_err(|_| ConvertError::ToolMissing { tool: "pandoc" })?;
    let output_path = converted_sibling(input, target_ext);

    let mut cmd = Command::new(pandoc);
    cmd.arg(input);
    // Pandoc infers most writers from the extension; plain text needs
    // to be named explicitly.
    if target_ext == "txt" {
        cmd.arg("-t").arg("plain");
    }
    cmd.arg("-o").arg(&output_path);

    let output = cmd.output()?;
    if !output.status.success() {
        let detail = String::from_utf8_lossy(&output.stderr)
            .lines()
            .last()
            .unwrap_or("exited with an error")
            .to_string();
        return Err(ConvertError::ToolFailed {
            tool: "pandoc",
            detail,
        });
    }

    Ok(output_path)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_target_is_rejected() {
        assert!(matches!(
            convert(Path::new("x.md"), "pdfx"),
            Err(ConvertError::UnsupportedTarget(_))
        ));
    }
}
