//! Display formatting for route metrics.

use super::RouteDuration;

/// Meters at or above which distances are shown in miles.
const MILE_THRESHOLD_METERS: u64 = 1609;

/// Meters per statute mile.
const METERS_PER_MILE: f64 = 1609.34;

/// Format a provider duration as `"{h}h {m}m"` or `"{m} min"`.
///
/// Zero, negative or unparseable values are echoed back unchanged.
///
/// # Examples
///
/// ```
/// use tidoo_server::domain::{RouteDuration, format_duration};
///
/// assert_eq!(format_duration(&RouteDuration::new("5400s")), "1h 30m");
/// assert_eq!(format_duration(&RouteDuration::new("300s")), "5 min");
/// assert_eq!(format_duration(&RouteDuration::new("later")), "later");
/// ```
pub fn format_duration(duration: &RouteDuration) -> String {
    match duration.seconds() {
        Some(secs) if secs > 0 => {
            let hours = secs / 3600;
            let mins = (secs % 3600) / 60;
            if hours > 0 {
                format!("{hours}h {mins}m")
            } else {
                format!("{mins} min")
            }
        }
        _ => duration.as_str().to_string(),
    }
}

/// Format a distance as miles (one decimal) from 1609 m upwards, else meters.
///
/// # Examples
///
/// ```
/// use tidoo_server::domain::format_distance;
///
/// assert_eq!(format_distance(1609), "1.0 mi");
/// assert_eq!(format_distance(500), "500 m");
/// ```
pub fn format_distance(meters: u64) -> String {
    if meters >= MILE_THRESHOLD_METERS {
        format!("{:.1} mi", meters as f64 / METERS_PER_MILE)
    } else {
        format!("{meters} m")
    }
}
