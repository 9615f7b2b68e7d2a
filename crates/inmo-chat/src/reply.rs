//! Assistant reply cleanup

use std::sync::OnceLock;

use regex::Regex;

static HEADING: OnceLock<Result<Regex, regex::Error>> = OnceLock::new();
static BLANK_RUN: OnceLock<Result<Regex, regex::Error>> = OnceLock::new();

fn heading() -> Option<&'static Regex> {
    HEADING
        .get_or_init(|| Regex::new(r"(?m)^[ \t]*#{1,6}[ \t]*"))
        .as_ref()
        .ok()
}

fn blank_run() -> Option<&'static Regex> {
    BLANK_RUN
        .get_or_init(|| Regex::new(r"\n[ \t]*\n(?:[ \t]*\n)+"))
        .as_ref()
        .ok()
}

/// Strip Markdown decoration the transcript does not render.
///
/// Removes `**`/`__` emphasis and heading hashes at line start, collapses
/// three or more line breaks into a single blank line and trims the result.
pub fn clean_reply(text: &str) -> String {
    let mut cleaned = text.replace("\r\n", "\n").replace("**", "").replace("__", "");

    if let Some(re) = heading() {
        cleaned = re.replace_all(&cleaned, "").into_owned();
    }
    if let Some(re) = blank_run() {
        cleaned = re.replace_all(&cleaned, "\n\n").into_owned();
    }

    cleaned.trim().to_string()
}
