//! Universal file converter: detects the category from the input
//! extension, asks for a target format, and writes a sibling
//! `<base>_converted.<ext>` file.

use std::path::{Path, PathBuf};

use clap::Parser;

use riftcam::convert::{
    self, Category, ConvertError, archive, console, document, image as image_convert, media,
};

#[derive(Parser, Debug)]
#[command(name = "reconvert", version, about)]
struct Args {
    /// File to convert; prompted for when omitted.
    input: Option<PathBuf>,
}

fn main() {
    env_logger::init();
    let args = Args::parse();

    console::panel(
        "Universal File Converter",
        "Enter the path to any supported file and this tool\nwill re-encode it with the right converter.",
    );

    let input = match args.input {
        Some(path) if path.is_file() => path,
        Some(path) => {
            console::error_panel(
                "File not found",
                &format!("{} does not exist or is not a file.", path.display()),
            );
            std::process::exit(1);
        }
        None => prompt_for_existing_file(),
    };

    let category = match convert::category_for(&input) {
        Ok(category) => category,
        Err(err) => {
            console::error_panel("Unknown file type", &err.to_string());
            std::process::exit(1);
        }
    };

    console::info_panel(
        "File type detected",
        &format!(
            "{} looks like a {} file.",
            input.display(),
            category.label()
        ),
    );

    let outcome = run_converter(&input, category);
    match outcome {
        Ok(output) => console::panel(
            "Complete",
            &format!("Success! New file saved at:\n{}", output.display()),
        ),
        Err(err) => console::error_panel("Conversion failed", &err.to_string()),
    }
}

fn prompt_for_existing_file() -> PathBuf {
    loop {
        match console::prompt("Path to the file to convert:") {
            Ok(answer) => {
                let path = PathBuf::from(answer);
                if path.is_file() {
                    return path;
                }
                println!("That file does not exist. Check the path and try again.");
            }
            Err(err) => {
                console::error_panel("Input closed", &err.to_string());
                std::process::exit(1);
            }
        }
    }
}

fn run_converter(input: &Path, category: Category) -> Result<PathBuf, ConvertError> {
    match category {
        Category::Image => {
            let target = pick_format("image", image_convert::TARGETS)?;
            let spinner = console::status_spinner("Re-encoding image...");
            let result = image_convert::convert(input, target);
            spinner.finish_and_clear();
            result
        }
        Category::Audio => {
            let target = pick_format("audio", media::AUDIO_TARGETS)?;
            let spinner = console::status_spinner("Running ffmpeg...");
            let result = media::convert(input, target);
            spinner.finish_and_clear();
            result
        }
        Category::Video => {
            let target = pick_format("video", media::VIDEO_TARGETS)?;
            let spinner = console::status_spinner("Running ffmpeg...");
            let result = media::convert(input, target);
            spinner.finish_and_clear();
            result
        }
        Category::Document => {
            let target = pick_format("document", document::TARGETS)?;
            let spinner = console::status_spinner("Running pandoc...");
            let result = document::convert(input, target);
            spinner.finish_and_clear();
            result
        }
        Category::Archive => {
            let formats = archive::available_formats();
            if formats.is_empty() {
                return Err(ConvertError::ToolMissing { tool: "tar" });
            }

            println!("Available archive formats:");
            for (idx, format) in formats.iter().enumerate() {
                println!(
                    "  {}. {:<8} {}",
                    idx + 1,
                    format.extension(),
                    format.description()
                );
            }
            let choice = console::prompt_index("Target format number:", formats.len())?;

            let spinner = console::status_spinner("Repacking archive...");
            let result = archive::convert(input, formats[choice]);
            spinner.finish_and_clear();
            result
        }
    }
}

fn pick_format(kind: &str, targets: &[&'static str]) -> Result<&'static str, ConvertError> {
    println!("Available {kind} formats:");
    for (idx, target) in targets.iter().enumerate() {
        println!("  {}. {target}", idx + 1);
    }
    let choice = console::prompt_index("Target format number:", targets.len())?;
    Ok(targets[choice])
}
