use chrono::{DateTime, Utc};

use crate::models::Coordinate;

/// Truncate a string to a maximum number of characters, adding ellipsis if needed
pub fn truncate_string(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else if max_len <= 3 {
        s.chars().take(max_len).collect()
    } else {
        let truncated: String = s.chars().take(max_len - 3).collect();
        format!("{}...", truncated)
    }
}

/// Format a timestamp the way Brazilian users read dates (dd/mm/yyyy hh:mm, UTC)
pub fn format_date(date: &DateTime<Utc>) -> String {
    date.format("%d/%m/%Y %H:%M").to_string()
}

/// Format a position as "lat, lng"
pub fn format_coordinate(coordinate: &Coordinate) -> String {
    format!("{}, {}", coordinate.latitude, coordinate.longitude)
}
