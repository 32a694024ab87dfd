//! Weather data from Open-Meteo
//!
//! Types shared by the client, the search debouncer and the UI. Places come
//! straight from the geocoder, snapshots are rebuilt from each forecast
//! response and never merged.

pub mod client;
pub mod search;

use chrono::{NaiveDateTime, Timelike};
use serde::{Deserialize, Serialize};

pub use client::OpenMeteoClient;

/// A geocoding candidate, kept verbatim from the search response
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Place {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<u64>,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub admin1: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub country: Option<String>,
    pub latitude: f64,
    pub longitude: f64,
}

impl Place {
    /// "Name, Region, Country" with empty parts skipped
    pub fn display_name(&self) -> String {
        crate::format::format_place(self)
    }
}

/// Temperature/wind unit preference, persisted as a single token
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum Unit {
    #[default]
    #[serde(rename = "c")]
    Metric,
    #[serde(rename = "f")]
    Imperial,
}

impl Unit {
    pub fn temperature_param(self) -> &'static str {
        match self {
            Self::Metric => "celsius",
            Self::Imperial => "fahrenheit",
        }
    }

    pub fn wind_param(self) -> &'static str {
        match self {
            Self::Metric => "kmh",
            Self::Imperial => "mph",
        }
    }

    pub fn precipitation_param(self) -> &'static str {
        match self {
            Self::Metric => "mm",
            Self::Imperial => "inch",
        }
    }

    /// "C" or "F", without the degree sign
    pub fn temperature_symbol(self) -> &'static str {
        match self {
            Self::Metric => "C",
            Self::Imperial => "F",
        }
    }

    pub fn wind_label(self) -> &'static str {
        match self {
            Self::Metric => "km/h",
            Self::Imperial => "mph",
        }
    }

    pub fn precipitation_label(self) -> &'static str {
        match self {
            Self::Metric => "mm",
            Self::Imperial => "in",
        }
    }

    pub fn token(self) -> &'static str {
        match self {
            Self::Metric => "c",
            Self::Imperial => "f",
        }
    }

    pub fn toggled(self) -> Self {
        match self {
            Self::Metric => Self::Imperial,
            Self::Imperial => Self::Metric,
        }
    }
}

impl std::str::FromStr for Unit {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "c" | "celsius" | "metric" => Ok(Self::Metric),
            "f" | "fahrenheit" | "imperial" => Ok(Self::Imperial),
            other => Err(format!("unknown unit '{}' (expected 'c' or 'f')", other)),
        }
    }
}

/// The `current` block of a forecast
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CurrentConditions {
    pub time: Option<NaiveDateTime>,
    pub temperature: f64,
    pub apparent_temperature: f64,
    pub relative_humidity: f64,
    pub is_day: bool,
    pub precipitation: f64,
    pub weather_code: i32,
    pub wind_speed: f64,
    pub wind_direction: f64,
}

/// One hour of the hourly series
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HourlyPoint {
    pub time: NaiveDateTime,
    pub temperature: Option<f64>,
    pub precipitation_probability: Option<u8>,
}

/// One point-in-time reading for a place
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WeatherSnapshot {
    pub unit: Unit,
    pub current: CurrentConditions,
    pub sunrise: Option<NaiveDateTime>,
    pub sunset: Option<NaiveDateTime>,
    pub hourly: Vec<HourlyPoint>,
}

impl WeatherSnapshot {
    /// Hourly points from the current hour onward, at most `count` of them
    pub fn upcoming_hours(&self, count: usize) -> Vec<&HourlyPoint> {
        let from = self
            .current
            .time
            .and_then(|t| t.date().and_hms_opt(t.hour(), 0, 0));

        self.hourly
            .iter()
            .filter(|h| from.map(|f| h.time >= f).unwrap_or(true))
            .take(count)
            .collect()
    }

    pub fn condition(&self) -> WmoCondition {
        WmoCondition::from_code(self.current.weather_code)
    }
}

/// Label and icon for a WMO weather interpretation code
/// See: https://open-meteo.com/en/docs#weathervariables
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WmoCondition {
    pub code: i32,
    pub label: &'static str,
    icon: &'static str,
}

impl WmoCondition {
    pub fn from_code(code: i32) -> Self {
        let (label, icon) = match code {
            0 => ("Clear sky", ""),
            1 => ("Mainly clear", "🌤️"),
            2 => ("Partly cloudy", "⛅"),
            3 => ("Overcast", "☁️"),
            45 => ("Fog", "🌫️"),
            48 => ("Depositing rime fog", "🌫️"),
            51 => ("Light drizzle", "🌦️"),
            53 => ("Drizzle", "🌦️"),
            55 => ("Dense drizzle", "🌧️"),
            56 | 57 => ("Freezing drizzle", "🌧️"),
            61 => ("Light rain", "🌦️"),
            63 => ("Rain", "🌧️"),
            65 => ("Heavy rain", "🌧️"),
            66 => ("Freezing rain", "🌧️"),
            67 => ("Heavy freezing rain", "🌧️"),
            71 => ("Light snow", "🌨️"),
            73 => ("Snow", "🌨️"),
            75 => ("Heavy snow", "❄️"),
            77 => ("Snow grains", "❄️"),
            80 => ("Rain showers", "🌦️"),
            81 => ("Rain showers", "🌧️"),
            82 => ("Violent rain showers", "⛈️"),
            85 | 86 => ("Snow showers", "🌨️"),
            95 => ("Thunderstorm", "⛈️"),
            96 => ("Thunderstorm w/ hail", "⛈️"),
            99 => ("Thunderstorm w/ heavy hail", "⛈️"),
            _ => ("Unknown", "❓"),
        };
        Self { code, label, icon }
    }

    /// Icon for the condition; clear sky depends on daylight
    pub fn icon(&self, is_day: bool) -> &'static str {
        if !self.icon.is_empty() {
            self.icon
        } else if is_day {
            "☀️"
        } else {
            "🌙"
        }
    }

    pub fn is_known(&self) -> bool {
        self.label != "Unknown"
    }
}

/// Errors from the Open-Meteo endpoints
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),
    #[error("HTTP status {0}")]
    Status(reqwest::StatusCode),
    #[error("Parse error: {0}")]
    Parse(String),
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn at(h: u32, m: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2026, 10, 16)
            .and_then(|d| d.and_hms_opt(h, m, 0))
            .unwrap()
    }

    #[test]
    fn test_unit_tokens() {
        assert_eq!("c".parse::<Unit>().unwrap(), Unit::Metric);
        assert_eq!("F".parse::<Unit>().unwrap(), Unit::Imperial);
        assert!("k".parse::<Unit>().is_err());
        assert_eq!(Unit::Metric.toggled(), Unit::Imperial);
        assert_eq!(Unit::Imperial.token(), "f");
    }

    #[test]
    fn test_unit_serializes_as_token() {
        assert_eq!(serde_json::to_string(&Unit::Imperial).unwrap(), "\"f\"");
        let unit: Unit = serde_json::from_str("\"c\"").unwrap();
        assert_eq!(unit, Unit::Metric);
    }

    #[test]
    fn test_wmo_clear_sky_follows_daylight() {
        let clear = WmoCondition::from_code(0);
        assert_eq!(clear.label, "Clear sky");
        assert_eq!(clear.icon(true), "☀️");
        assert_eq!(clear.icon(false), "🌙");
    }

    #[test]
    fn test_wmo_known_codes() {
        assert_eq!(WmoCondition::from_code(3).label, "Overcast");
        assert_eq!(WmoCondition::from_code(57).label, "Freezing drizzle");
        assert_eq!(WmoCondition::from_code(96).label, "Thunderstorm w/ hail");
        assert_eq!(WmoCondition::from_code(75).icon(true), "❄️");
    }

    #[test]
    fn test_wmo_unknown_code() {
        let unknown = WmoCondition::from_code(42);
        assert!(!unknown.is_known());
        assert_eq!(unknown.icon(true), "❓");
    }

    #[test]
    fn test_upcoming_hours_starts_at_current_hour() {
        let snapshot = WeatherSnapshot {
            unit: Unit::Metric,
            current: CurrentConditions {
                time: Some(at(10, 45)),
                temperature: 12.0,
                apparent_temperature: 11.0,
                relative_humidity: 70.0,
                is_day: true,
                precipitation: 0.0,
                weather_code: 1,
                wind_speed: 5.0,
                wind_direction: 180.0,
            },
            sunrise: None,
            sunset: None,
            hourly: (8..14)
                .map(|h| HourlyPoint {
                    time: at(h, 0),
                    temperature: Some(h as f64),
                    precipitation_probability: Some(10),
                })
                .collect(),
        };

        let hours = snapshot.upcoming_hours(2);
        assert_eq!(hours.len(), 2);
        assert_eq!(hours[0].time, at(10, 0));
        assert_eq!(hours[1].time, at(11, 0));
    }
}
