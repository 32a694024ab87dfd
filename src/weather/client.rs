use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;

use super::{ApiError, CurrentConditions, HourlyPoint, Place, Unit, WeatherSnapshot};
use crate::config::ApiConfig;
use crate::format::parse_local_time;

const USER_AGENT: &str = concat!("weathernow/", env!("CARGO_PKG_VERSION"));

const CURRENT_FIELDS: &[&str] = &[
    "temperature_2m",
    "apparent_temperature",
    "relative_humidity_2m",
    "is_day",
    "precipitation",
    "weather_code",
    "wind_speed_10m",
    "wind_direction_10m",
];
const HOURLY_FIELDS: &[&str] = &["temperature_2m", "precipitation_probability"];
const DAILY_FIELDS: &[&str] = &["sunrise", "sunset"];

#[derive(Debug, Deserialize)]
struct GeocodingResponse {
    // Absent when nothing matched
    #[serde(default)]
    results: Option<Vec<Place>>,
}

#[derive(Debug, Deserialize)]
struct ForecastResponse {
    current: Option<RawCurrent>,
    hourly: Option<RawHourly>,
    daily: Option<RawDaily>,
}

#[derive(Debug, Deserialize)]
struct RawCurrent {
    time: Option<String>,
    temperature_2m: f64,
    apparent_temperature: f64,
    relative_humidity_2m: f64,
    #[serde(default)]
    is_day: u8,
    #[serde(default)]
    precipitation: Option<f64>,
    #[serde(default)]
    weather_code: Option<i32>,
    wind_speed_10m: f64,
    wind_direction_10m: f64,
}

#[derive(Debug, Deserialize)]
struct RawHourly {
    #[serde(default)]
    time: Vec<String>,
    #[serde(default)]
    temperature_2m: Vec<Option<f64>>,
    #[serde(default)]
    precipitation_probability: Vec<Option<f64>>,
}

#[derive(Debug, Deserialize)]
struct RawDaily {
    #[serde(default)]
    sunrise: Vec<String>,
    #[serde(default)]
    sunset: Vec<String>,
}

impl ForecastResponse {
    fn into_snapshot(self, unit: Unit) -> Result<WeatherSnapshot, ApiError> {
        let current = self
            .current
            .ok_or_else(|| ApiError::Parse("forecast response has no current block".into()))?;

        let hourly = self
            .hourly
            .map(|h| {
                h.time
                    .iter()
                    .enumerate()
                    .filter_map(|(i, t)| {
                        Some(HourlyPoint {
                            time: parse_local_time(t)?,
                            temperature: h.temperature_2m.get(i).copied().flatten(),
                            precipitation_probability: h
                                .precipitation_probability
                                .get(i)
                                .copied()
                                .flatten()
                                .map(|p| p.clamp(0.0, 100.0).round() as u8),
                        })
                    })
                    .collect()
            })
            .unwrap_or_default();

        let (sunrise, sunset) = match &self.daily {
            Some(d) => (
                d.sunrise.first().and_then(|s| parse_local_time(s)),
                d.sunset.first().and_then(|s| parse_local_time(s)),
            ),
            None => (None, None),
        };

        Ok(WeatherSnapshot {
            unit,
            current: CurrentConditions {
                time: current.time.as_deref().and_then(parse_local_time),
                temperature: current.temperature_2m,
                apparent_temperature: current.apparent_temperature,
                relative_humidity: current.relative_humidity_2m,
                is_day: current.is_day == 1,
                precipitation: current.precipitation.unwrap_or(0.0),
                weather_code: current.weather_code.unwrap_or(0),
                wind_speed: current.wind_speed_10m,
                wind_direction: current.wind_direction_10m,
            },
            sunrise,
            sunset,
            hourly,
        })
    }
}

/// Client for the Open-Meteo geocoding and forecast endpoints
#[derive(Debug, Clone)]
pub struct OpenMeteoClient {
    client: Client,
    geocoding_url: String,
    forecast_url: String,
    result_count: u8,
    language: String,
}

impl OpenMeteoClient {
    pub fn new(config: &ApiConfig) -> Result<Self, ApiError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .user_agent(USER_AGENT)
            .build()?;

        Ok(Self {
            client,
            geocoding_url: config.geocoding_url.clone(),
            forecast_url: config.forecast_url.clone(),
            result_count: config.result_count,
            language: config.language.clone(),
        })
    }

    /// Look up places by name. An empty query returns no places without a request.
    pub async fn search(&self, query: &str) -> Result<Vec<Place>, ApiError> {
        let query = query.trim();
        if query.is_empty() {
            return Ok(Vec::new());
        }

        let count = self.result_count.to_string();
        let response = self
            .client
            .get(&self.geocoding_url)
            .query(&[
                ("name", query),
                ("count", count.as_str()),
                ("format", "json"),
                ("language", self.language.as_str()),
            ])
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(ApiError::Status(response.status()));
        }

        let parsed: GeocodingResponse = response.json().await.map_err(body_error)?;

        let places = parsed.results.unwrap_or_default();
        tracing::debug!("Search '{}' returned {} places", query, places.len());
        Ok(places)
    }

    /// Fetch current conditions, today's sunrise/sunset and the hourly series
    pub async fn forecast(&self, place: &Place, unit: Unit) -> Result<WeatherSnapshot, ApiError> {
        let latitude = place.latitude.to_string();
        let longitude = place.longitude.to_string();
        let current = CURRENT_FIELDS.join(",");
        let hourly = HOURLY_FIELDS.join(",");
        let daily = DAILY_FIELDS.join(",");

        let response = self
            .client
            .get(&self.forecast_url)
            .query(&[
                ("latitude", latitude.as_str()),
                ("longitude", longitude.as_str()),
                ("timezone", "auto"),
                ("current", current.as_str()),
                ("hourly", hourly.as_str()),
                ("daily", daily.as_str()),
                ("temperature_unit", unit.temperature_param()),
                ("wind_speed_unit", unit.wind_param()),
                ("precipitation_unit", unit.precipitation_param()),
            ])
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(ApiError::Status(response.status()));
        }

        let parsed: ForecastResponse = response.json().await.map_err(body_error)?;

        tracing::info!("Fetched conditions for {} ({})", place.name, unit.token());
        parsed.into_snapshot(unit)
    }
}

/// A body that arrived but did not decode is a parse error, anything else is network
fn body_error(e: reqwest::Error) -> ApiError {
    if e.is_decode() {
        ApiError::Parse(e.to_string())
    } else {
        ApiError::Network(e)
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    pub(crate) fn test_api_config(server: &MockServer) -> ApiConfig {
        ApiConfig {
            geocoding_url: format!("{}/v1/search", server.uri()),
            forecast_url: format!("{}/v1/forecast", server.uri()),
            ..ApiConfig::default()
        }
    }

    pub(crate) fn place_json(id: u64, name: &str) -> serde_json::Value {
        serde_json::json!({
            "id": id,
            "name": name,
            "latitude": 39.73915,
            "longitude": -104.9847,
            "elevation": 1609.0,
            "feature_code": "PPLA",
            "country_code": "US",
            "admin1": "Colorado",
            "country": "United States",
            "timezone": "America/Denver"
        })
    }

    pub(crate) fn forecast_json(temperature: f64) -> serde_json::Value {
        serde_json::json!({
            "latitude": 39.73,
            "longitude": -104.98,
            "timezone": "America/Denver",
            "current_units": { "time": "iso8601" },
            "current": {
                "time": "2026-10-16T10:45",
                "interval": 900,
                "temperature_2m": temperature,
                "apparent_temperature": temperature - 1.5,
                "relative_humidity_2m": 41,
                "is_day": 1,
                "precipitation": 0.0,
                "weather_code": 2,
                "wind_speed_10m": 11.3,
                "wind_direction_10m": 204
            },
            "hourly": {
                "time": ["2026-10-16T09:00", "2026-10-16T10:00", "2026-10-16T11:00"],
                "temperature_2m": [temperature - 2.0, temperature, null],
                "precipitation_probability": [0, 5, 20]
            },
            "daily": {
                "time": ["2026-10-16"],
                "sunrise": ["2026-10-16T07:12"],
                "sunset": ["2026-10-16T18:21"]
            }
        })
    }

    pub(crate) fn denver() -> Place {
        serde_json::from_value(place_json(5419384, "Denver")).unwrap()
    }

    #[tokio::test]
    async fn test_search_returns_places_in_order() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/v1/search"))
            .and(query_param("name", "Den"))
            .and(query_param("count", "8"))
            .and(query_param("format", "json"))
            .and(query_param("language", "en"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "results": [place_json(1, "Denver"), place_json(2, "Denton")],
                "generationtime_ms": 0.5
            })))
            .expect(1)
            .mount(&mock_server)
            .await;

        let client = OpenMeteoClient::new(&test_api_config(&mock_server)).unwrap();
        let places = client.search("Den").await.unwrap();

        assert_eq!(places.len(), 2);
        assert_eq!(places[0].name, "Denver");
        assert_eq!(places[0].admin1.as_deref(), Some("Colorado"));
        assert_eq!(places[1].name, "Denton");
    }

    #[tokio::test]
    async fn test_search_without_results_key_is_empty() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/v1/search"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "generationtime_ms": 0.3
            })))
            .mount(&mock_server)
            .await;

        let client = OpenMeteoClient::new(&test_api_config(&mock_server)).unwrap();
        assert!(client.search("zzzzqqq").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_empty_search_makes_no_request() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&mock_server)
            .await;

        let client = OpenMeteoClient::new(&test_api_config(&mock_server)).unwrap();
        assert!(client.search("").await.unwrap().is_empty());
        assert!(client.search("   ").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_search_server_error() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/v1/search"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&mock_server)
            .await;

        let client = OpenMeteoClient::new(&test_api_config(&mock_server)).unwrap();
        let err = client.search("Denver").await.unwrap_err();
        assert!(err.to_string().contains("503"), "unexpected error: {}", err);
    }

    #[tokio::test]
    async fn test_forecast_requests_unit_system() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/v1/forecast"))
            .and(query_param("latitude", "39.73915"))
            .and(query_param("longitude", "-104.9847"))
            .and(query_param("timezone", "auto"))
            .and(query_param("daily", "sunrise,sunset"))
            .and(query_param("temperature_unit", "fahrenheit"))
            .and(query_param("wind_speed_unit", "mph"))
            .and(query_param("precipitation_unit", "inch"))
            .respond_with(ResponseTemplate::new(200).set_body_json(forecast_json(64.2)))
            .expect(1)
            .mount(&mock_server)
            .await;

        let client = OpenMeteoClient::new(&test_api_config(&mock_server)).unwrap();
        let snapshot = client.forecast(&denver(), Unit::Imperial).await.unwrap();

        assert_eq!(snapshot.unit, Unit::Imperial);
        assert_eq!(snapshot.current.temperature, 64.2);
        assert_eq!(snapshot.current.relative_humidity, 41.0);
        assert!(snapshot.current.is_day);
        assert_eq!(snapshot.current.weather_code, 2);
        assert_eq!(
            crate::format::format_local_time(snapshot.sunrise),
            "07:12"
        );
        assert_eq!(crate::format::format_local_time(snapshot.sunset), "18:21");
        assert_eq!(snapshot.hourly.len(), 3);
        assert_eq!(snapshot.hourly[2].temperature, None);
        assert_eq!(snapshot.hourly[2].precipitation_probability, Some(20));
    }

    #[tokio::test]
    async fn test_forecast_current_fields_list() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/v1/forecast"))
            .and(query_param(
                "current",
                "temperature_2m,apparent_temperature,relative_humidity_2m,is_day,precipitation,weather_code,wind_speed_10m,wind_direction_10m",
            ))
            .and(query_param("hourly", "temperature_2m,precipitation_probability"))
            .and(query_param("temperature_unit", "celsius"))
            .and(query_param("wind_speed_unit", "kmh"))
            .respond_with(ResponseTemplate::new(200).set_body_json(forecast_json(17.8)))
            .expect(1)
            .mount(&mock_server)
            .await;

        let client = OpenMeteoClient::new(&test_api_config(&mock_server)).unwrap();
        let snapshot = client.forecast(&denver(), Unit::Metric).await.unwrap();
        assert_eq!(snapshot.unit, Unit::Metric);
    }

    #[tokio::test]
    async fn test_forecast_status_error() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/v1/forecast"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&mock_server)
            .await;

        let client = OpenMeteoClient::new(&test_api_config(&mock_server)).unwrap();
        let result = client.forecast(&denver(), Unit::Metric).await;
        assert!(matches!(result, Err(ApiError::Status(s)) if s.as_u16() == 500));
    }

    #[tokio::test]
    async fn test_forecast_without_current_block() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/v1/forecast"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "latitude": 39.73,
                "longitude": -104.98
            })))
            .mount(&mock_server)
            .await;

        let client = OpenMeteoClient::new(&test_api_config(&mock_server)).unwrap();
        let result = client.forecast(&denver(), Unit::Metric).await;
        assert!(matches!(result, Err(ApiError::Parse(_))));
    }

    #[tokio::test]
    async fn test_forecast_unreadable_body_is_parse_error() {
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v1/forecast"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html>busy</html>"))
            .mount(&mock_server)
            .await;

        let client = OpenMeteoClient::new(&test_api_config(&mock_server)).unwrap();
        let result = client.forecast(&denver(), Unit::Metric).await;
        assert!(matches!(result, Err(ApiError::Parse(_))));
    }
}
