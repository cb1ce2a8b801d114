// Human-readable sizes and durations for chat replies.

use std::time::Duration;

/// Decimal byte size with three significant digits (e.g. 1337 -> "1.34 kB").
pub fn pretty_bytes(bytes: u64) -> String {
    const UNITS: [&str; 9] = ["B", "kB", "MB", "GB", "TB", "PB", "EB", "ZB", "YB"];

    let mut size = bytes as f64;
    let mut unit_idx = 0usize;

    while size >= 1000.0 && unit_idx < UNITS.len() - 1 {
        size /= 1000.0;
        unit_idx += 1;
    }

    format!("{} {}", three_significant(size), UNITS[unit_idx])
}

/// Whole-unit duration, leading zero units omitted (e.g. "2h 0m 5s").
pub fn pretty_duration(duration: Duration) -> String {
    let seconds = duration.as_secs();
    let days = seconds / 86_400;
    let hours = (seconds % 86_400) / 3_600;
    let minutes = (seconds % 3_600) / 60;
    let secs = seconds % 60;

    if days > 0 {
        format!("{days}d {hours}h {minutes}m {secs}s")
    } else if hours > 0 {
        format!("{hours}h {minutes}m {secs}s")
    } else if minutes > 0 {
        format!("{minutes}m {secs}s")
    } else {
        format!("{secs}s")
    }
}

// Expects a value in [0, 1000).
fn three_significant(value: f64) -> f64 {
    let decimals = if value >= 100.0 {
        0
    } else if value >= 10.0 {
        1
    } else {
        2
    };
    let scale = 10f64.powi(decimals);
    (value * scale).round() / scale
}
