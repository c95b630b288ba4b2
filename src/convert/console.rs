//! Minimal console panels and prompts for the converter binary.

use std::io::{self, BufRead, Write};
use std::time::Duration;

use indicatif::{ProgressBar, ProgressStyle};

const BOLD: &str = "\x1b[1m";
const GREEN: &str = "\x1b[32m";
const RED: &str = "\x1b[31m";
const CYAN: &str = "\x1b[36m";
const RESET: &str = "\x1b[0m";

fn boxed(color: &str, title: &str, body: &str) {
    let width = body
        .lines()
        .map(|l| l.chars().count())
        .chain([title.chars().count() + 2])
        .max()
        .unwrap_or(0)
        .max(20);

    println!("{color}┌─ {BOLD}{title}{RESET}{color} {}┐{RESET}", "─".repeat(width.saturating_sub(title.chars().count() + 2)));
    for line in body.lines() {
        let pad = width.saturating_sub(line.chars().count());
        println!("{color}│{RESET} {line}{} {color}│{RESET}", " ".repeat(pad));
    }
    println!("{color}└{}┘{RESET}", "─".repeat(width + 2));
}

pub fn panel(title: &str, body: &str) {
    boxed(GREEN, title, body);
}

pub fn info_panel(title: &str, body: &str) {
    boxed(CYAN, title, body);
}

pub fn error_panel(title: &str, body: &str) {
    boxed(RED, title, body);
}

/// Reads one trimmed line from stdin, stripping stray shell quotes.
pub fn prompt(question: &str) -> io::Result<String> {
    print!("{BOLD}{question}{RESET} ");
    io::stdout().flush()?;

    let mut line = String::new();
    let bytes_read = io::stdin().lock().read_line(&mut line)?;
    if bytes_read == 0 {
        return Err(io::Error::new(
            io::ErrorKind::UnexpectedEof,
            "input stream closed",
        ));
    }
    Ok(line.trim().trim_matches(|c| c == '\'' || c == '"').to_string())
}

/// Prompts until the user picks a number in `1..=max`; returns the
/// zero-based index.
pub fn prompt_index(question: &str, max: usize) -> io::Result<usize> {
    loop {
        let answer = prompt(question)?;
        match answer.parse::<usize>() {
            Ok(n) if (1..=max).contains(&n) => return Ok(n - 1),
            _ => println!("{RED}Please enter a number between 1 and {max}.{RESET}"),
        }
    }
}

/// Spinner shown while an external tool runs.
pub fn status_spinner(message: &str) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    let style = ProgressStyle::with_template("{spinner:.green} {msg}").unwrap();
    pb.set_style(style);
    pb.set_message(message.to_string());
    pb.enable_steady_tick(Duration::from_millis(100));
    pb
}
