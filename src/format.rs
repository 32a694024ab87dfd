//! Display helpers for places, wind and times

use chrono::NaiveDateTime;

use crate::weather::{Place, Unit};

/// Shown in place of a value that is missing or unreadable
pub const PLACEHOLDER: &str = "—";

const COMPASS_POINTS: [&str; 16] = [
    "N", "NNE", "NE", "ENE", "E", "ESE", "SE", "SSE", "S", "SSW", "SW", "WSW", "W", "WNW", "NW",
    "NNW",
];

/// "Name, Region, Country" with empty parts skipped
pub fn format_place(place: &Place) -> String {
    [Some(place.name.as_str()), place.admin1.as_deref(), place.country.as_deref()]
        .into_iter()
        .flatten()
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join(", ")
}

pub fn format_coordinates(place: &Place) -> String {
    format!("{:.2}, {:.2}", place.latitude, place.longitude)
}

/// 16-point compass direction for a bearing in degrees
pub fn deg_to_compass(degrees: f64) -> &'static str {
    let index = (degrees / 22.5 + 0.5).floor() as i64;
    COMPASS_POINTS[index.rem_euclid(16) as usize]
}

/// Round for display, halves going up (-2.5 shows as -2)
pub fn rounded(value: f64) -> i64 {
    (value + 0.5).floor() as i64
}

pub fn format_temperature(value: f64, unit: Unit) -> String {
    format!("{}°{}", rounded(value), unit.temperature_symbol())
}

pub fn format_wind_speed(value: f64, unit: Unit) -> String {
    format!("{} {}", rounded(value), unit.wind_label())
}

pub fn format_wind_direction(degrees: f64) -> String {
    format!("{} • {}°", deg_to_compass(degrees), rounded(degrees))
}

pub fn format_precipitation(value: f64, unit: Unit) -> String {
    format!("{:.1} {}", value, unit.precipitation_label())
}

pub fn format_humidity(value: f64) -> String {
    format!("{}%", rounded(value))
}

/// Parse the forecast API's local ISO time ("2026-10-16T07:12")
pub fn parse_local_time(iso: &str) -> Option<NaiveDateTime> {
    NaiveDateTime::parse_from_str(iso, "%Y-%m-%dT%H:%M")
        .or_else(|_| NaiveDateTime::parse_from_str(iso, "%Y-%m-%dT%H:%M:%S"))
        .ok()
}

/// "HH:MM", or the placeholder when the time is absent
pub fn format_local_time(time: Option<NaiveDateTime>) -> String {
    match time {
        Some(t) => t.format("%H:%M").to_string(),
        None => PLACEHOLDER.to_string(),
    }
}
