use chrono::{NaiveDate, NaiveDateTime, Timelike};
use futures::future::try_join_all;
use log::error;
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use std::time::Duration;
use thiserror::Error;

use crate::models::ModelId;
use crate::request::ForecastRequest;

const FORECAST_URL: &str = "https://api.open-meteo.com/v1/forecast";
const HOURLY_VARIABLES: &str = "temperature_2m,precipitation,wind_speed_10m";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

// Hourly timestamps come back in the requested zone as "2025-08-19T12:00".
const TIME_FORMAT: &str = "%Y-%m-%dT%H:%M";

#[derive(Debug, Deserialize)]
struct OpenMeteoResponse {
    hourly: HourlySeries,
}

// Parallel arrays; values may be null where a model has no data.
#[derive(Debug, Deserialize)]
struct HourlySeries {
    time: Vec<String>,
    temperature_2m: Vec<Option<f64>>,
    precipitation: Vec<Option<f64>>,
    wind_speed_10m: Vec<Option<f64>>,
}

// Error body shape: {"error": true, "reason": "..."}
#[derive(Debug, Deserialize)]
struct ApiReject {
    reason: String,
}

/// One hour of forecast data from one model.
#[derive(Debug, Clone, PartialEq)]
pub struct HourlyPoint {
    pub time: NaiveDateTime,
    pub temp: Option<f64>,
    pub precip: Option<f64>,
    pub wind: Option<f64>,
}

#[derive(Debug, Clone)]
pub struct ModelSeries {
    pub model: ModelId,
    pub points: Vec<HourlyPoint>,
}

/// Everything fetched for a single `/forecast`, one series per requested
/// model, already narrowed to the requested date and hour window.
#[derive(Debug, Clone)]
pub struct ForecastTable {
    pub series: Vec<ModelSeries>,
}

impl ForecastTable {
    /// True when no model had any data inside the window, e.g. a date
    /// beyond the provider's forecast horizon.
    pub fn is_empty(&self) -> bool {
        self.series.iter().all(|s| s.points.is_empty())
    }
}

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("could not reach the forecast service: {0}")]
    Request(reqwest::Error),
    #[error("forecast service rejected the request ({status}): {reason}")]
    Rejected { status: StatusCode, reason: String },
    #[error("forecast service returned malformed data: {0}")]
    Malformed(String),
}

#[derive(Clone)]
pub struct OpenMeteoClient {
    client: Client,
}

impl OpenMeteoClient {
    pub fn new() -> Self {
        Self {
            client: Client::new(),
        }
    }

    /// Fetches every requested model concurrently. Any single failure fails
    /// the whole request; there is no partial result.
    pub async fn fetch(&self, request: &ForecastRequest) -> Result<ForecastTable, FetchError> {
        let fetches = request
            .models
            .iter()
            .map(|model| self.fetch_model(request, *model));
        let series = try_join_all(fetches).await?;
        Ok(ForecastTable { series })
    }

    async fn fetch_model(
        &self,
        request: &ForecastRequest,
        model: ModelId,
    ) -> Result<ModelSeries, FetchError> {
        let response = self
            .client
            .get(FORECAST_URL)
            .timeout(REQUEST_TIMEOUT)
            .query(&[
                ("latitude", request.latitude.to_string()),
                ("longitude", request.longitude.to_string()),
                ("hourly", HOURLY_VARIABLES.to_string()),
                ("timezone", request.timezone.clone()),
                ("models", model.api_name().to_string()),
            ])
            .send()
            .await
            .map_err(|e| {
                error!("network error fetching {} from Open-Meteo: {}", model, e);
                FetchError::Request(e)
            })?;

        if !response.status().is_success() {
            let status = response.status();
            // Open-Meteo puts the human-readable cause (bad timezone,
            // out-of-range coordinates) in the error body.
            let reason = match response.json::<ApiReject>().await {
                Ok(reject) => reject.reason,
                Err(_) => "no details given".to_string(),
            };
            error!("Open-Meteo rejected {} request: {} - {}", model, status, reason);
            return Err(FetchError::Rejected { status, reason });
        }

        let payload: OpenMeteoResponse = response.json().await.map_err(|e| {
            error!("failed to decode Open-Meteo response for {}: {}", model, e);
            FetchError::Malformed(e.to_string())
        })?;

        let points = window_points(
            &payload.hourly,
            request.date,
            request.hour_from,
            request.hour_to,
        )?;
        Ok(ModelSeries { model, points })
    }
}

/// Narrows the full hourly series to rows on `date` with hour inside
/// [hour_from, hour_to].
fn window_points(
    hourly: &HourlySeries,
    date: NaiveDate,
    hour_from: u8,
    hour_to: u8,
) -> Result<Vec<HourlyPoint>, FetchError> {
    let n = hourly.time.len();
    if hourly.temperature_2m.len() != n
        || hourly.precipitation.len() != n
        || hourly.wind_speed_10m.len() != n
    {
        return Err(FetchError::Malformed(
            "hourly arrays have mismatched lengths".to_string(),
        ));
    }

    let mut points = Vec::new();
    for (i, raw_time) in hourly.time.iter().enumerate() {
        let time = NaiveDateTime::parse_from_str(raw_time, TIME_FORMAT)
            .map_err(|_| FetchError::Malformed(format!("unparseable timestamp '{raw_time}'")))?;

        let hour = time.hour() as u8;
        if time.date() == date && hour >= hour_from && hour <= hour_to {
            points.push(HourlyPoint {
                time,
                temp: hourly.temperature_2m[i],
                precip: hourly.precipitation[i],
                wind: hourly.wind_speed_10m[i],
            });
        }
    }
    Ok(points)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn series_for(date: &str, hours: std::ops::Range<u32>) -> HourlySeries {
        let time: Vec<String> = hours.clone().map(|h| format!("{date}T{h:02}:00")).collect();
        let n = time.len();
        HourlySeries {
            time,
            temperature_2m: (0..n).map(|i| Some(20.0 + i as f64)).collect(),
            precipitation: vec![Some(0.0); n],
            wind_speed_10m: vec![Some(10.0); n],
        }
    }

    #[test]
    fn window_keeps_only_requested_hours() {
        let hourly = series_for("2025-08-19", 0..24);
        let date = NaiveDate::from_ymd_opt(2025, 8, 19).unwrap();

        let points = window_points(&hourly, date, 12, 18).unwrap();
        assert_eq!(points.len(), 7);
        assert_eq!(points[0].time.hour(), 12);
        assert_eq!(points[6].time.hour(), 18);
        assert_eq!(points[0].temp, Some(32.0));
    }

    #[test]
    fn window_excludes_other_dates() {
        let hourly = series_for("2025-08-19", 0..24);
        let other = NaiveDate::from_ymd_opt(2025, 8, 20).unwrap();
        assert!(window_points(&hourly, other, 0, 23).unwrap().is_empty());
    }

    #[test]
    fn mismatched_arrays_are_malformed() {
        let mut hourly = series_for("2025-08-19", 0..24);
        hourly.precipitation.pop();

        let date = NaiveDate::from_ymd_opt(2025, 8, 19).unwrap();
        let err = window_points(&hourly, date, 0, 23).unwrap_err();
        assert!(err.to_string().contains("mismatched lengths"));
    }

    #[test]
    fn bad_timestamp_is_malformed() {
        let mut hourly = series_for("2025-08-19", 0..3);
        hourly.time[1] = "yesterday".to_string();

        let date = NaiveDate::from_ymd_opt(2025, 8, 19).unwrap();
        let err = window_points(&hourly, date, 0, 23).unwrap_err();
        assert!(err.to_string().contains("unparseable timestamp"));
    }

    #[test]
    fn decodes_provider_payload_with_nulls() {
        let json = r#"{
            "latitude": 22.25,
            "longitude": 69.375,
            "timezone": "Asia/Kolkata",
            "hourly_units": {"temperature_2m": "°C"},
            "hourly": {
                "time": ["2025-08-19T12:00", "2025-08-19T13:00"],
                "temperature_2m": [31.2, null],
                "precipitation": [0.0, 0.4],
                "wind_speed_10m": [14.8, 15.1]
            }
        }"#;

        let payload: OpenMeteoResponse = serde_json::from_str(json).unwrap();
        let date = NaiveDate::from_ymd_opt(2025, 8, 19).unwrap();
        let points = window_points(&payload.hourly, date, 12, 18).unwrap();

        assert_eq!(points.len(), 2);
        assert_eq!(points[0].temp, Some(31.2));
        assert_eq!(points[1].temp, None);
        assert_eq!(points[1].precip, Some(0.4));
    }

    #[test]
    fn decodes_provider_reject_body() {
        let json = r#"{"error": true, "reason": "Invalid timezone"}"#;
        let reject: ApiReject = serde_json::from_str(json).unwrap();
        assert_eq!(reject.reason, "Invalid timezone");
    }

    #[test]
    fn empty_table_is_detected() {
        let table = ForecastTable {
            series: vec![ModelSeries {
                model: ModelId::Gfs,
                points: Vec::new(),
            }],
        };
        assert!(table.is_empty());
    }
}
