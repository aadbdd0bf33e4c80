//! Identifier and date helpers for catalog data

use chrono::NaiveDate;

/// Length of every Spotify base-62 identifier
pub const SPOTIFY_ID_LEN: usize = 22;

/// True when `id` is exactly 22 ASCII alphanumeric characters
pub fn is_valid_spotify_id(id: &str) -> bool {
    id.len() == SPOTIFY_ID_LEN && id.bytes().all(|b| b.is_ascii_alphanumeric())
}

/// Parse an album release date honoring its precision
///
/// "year" maps to January 1st, "month" to the first of the month. Missing
/// precision is treated as "day". Returns None when the text does not match.
pub fn parse_release_date(date: &str, precision: Option<&str>) -> Option<NaiveDate> {
    match precision.unwrap_or("day") {
        "year" => {
            let year: i32 = date.get(..4)?.parse().ok()?;
            NaiveDate::from_ymd_opt(year, 1, 1)
        }
        "month" => NaiveDate::parse_from_str(&format!("{}-01", date.get(..7)?), "%Y-%m-%d").ok(),
        _ => NaiveDate::parse_from_str(date, "%Y-%m-%d").ok(),
    }
}

/// Split ids into request-sized groups, preserving order
pub fn group_ids(ids: &[String], group_size: usize) -> Vec<&[String]> {
    ids.chunks(group_size.max(1)).collect()
}
