//! Terminal rendering of lyric frames.

use linguasync_core::{LyricFrame, TranslatedLine};

fn format_timestamp(offset_ms: u64) -> String {
    let total_secs = offset_ms / 1000;
    format!(
        "{:02}:{:02}.{:02}",
        total_secs / 60,
        total_secs % 60,
        (offset_ms % 1000) / 10
    )
}

fn format_line(marker: &str, line: &TranslatedLine) -> String {
    let stamp = format_timestamp(line.offset_ms);
    if line.translation == line.text {
        format!("{marker} [{stamp}] {}", line.text)
    } else {
        format!("{marker} [{stamp}] {}\n{marker}            {}", line.text, line.translation)
    }
}

/// Render the current and upcoming line with their translations
pub fn format_frame(frame: &LyricFrame) -> String {
    let mut out = format!(
        "== {} - {} ({}){}",
        frame.track.artist,
        frame.track.name,
        frame.language,
        if frame.is_playing { "" } else { " [paused]" }
    );

    match &frame.current {
        Some(line) => {
            out.push('\n');
            out.push_str(&format_line(">", line));
        }
        None => out.push_str("\n> ..."),
    }
    if let Some(line) = &frame.next {
        out.push('\n');
        out.push_str(&format_line(" ", line));
    }
    out
}
