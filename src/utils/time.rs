//! Time parsing and formatting utilities

use crate::domain::errors::DomainError;

/// Parse `MM:SS` or `HH:MM:SS` into seconds.
///
/// The last field may carry a fraction (`1:05.5`). Anything else is rejected
/// so callers never build a clip from a malformed time.
pub fn parse_clock(text: &str) -> Result<f64, DomainError> {
    let trimmed = text.trim();
    let invalid = || DomainError::InvalidTime(format!("'{}' (expected MM:SS or HH:MM:SS)", trimmed));

    let parts: Vec<&str> = trimmed.split(':').collect();
    if parts.len() != 2 && parts.len() != 3 {
        return Err(invalid());
    }

    let (leading, last) = parts.split_at(parts.len() - 1);
    let mut whole = Vec::with_capacity(leading.len());
    for part in leading {
        if part.is_empty() || !part.chars().all(|c| c.is_ascii_digit()) {
            return Err(invalid());
        }
        whole.push(part.parse::<u64>().map_err(|_| invalid())?);
    }

    let seconds_text = last[0];
    if seconds_text.is_empty() || !seconds_text.chars().all(|c| c.is_ascii_digit() || c == '.') {
        return Err(invalid());
    }
    let seconds: f64 = seconds_text.parse().map_err(|_| invalid())?;
    if seconds >= 60.0 {
        return Err(DomainError::InvalidTime(format!(
            "'{}' (seconds must be less than 60)",
            trimmed
        )));
    }

    match whole.as_slice() {
        [minutes] => Ok(*minutes as f64 * 60.0 + seconds),
        [hours, minutes] => {
            if *minutes >= 60 {
                return Err(DomainError::InvalidTime(format!(
                    "'{}' (minutes must be less than 60)",
                    trimmed
                )));
            }
            Ok(*hours as f64 * 3600.0 + *minutes as f64 * 60.0 + seconds)
        }
        _ => Err(invalid()),
    }
}

/// Format seconds as `M:SS`, or `H:MM:SS` from one hour on
pub fn format_clock(seconds: f64) -> String {
    let total = if seconds.is_finite() && seconds > 0.0 {
        seconds.floor() as u64
    } else {
        0
    };
    let hours = total / 3600;
    let minutes = (total % 3600) / 60;
    let secs = total % 60;

    if hours > 0 {
        format!("{}:{:02}:{:02}", hours, minutes, secs)
    } else {
        format!("{}:{:02}", minutes, secs)
    }
}
