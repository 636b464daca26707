use chrono::NaiveDate;
use thiserror::Error;

use crate::models::ModelId;

pub const USAGE: &str =
    "Usage: /forecast <lat> <lon> <timezone> <YYYY-MM-DD> <start_hr> <end_hr> <models>";

/// One parsed `/forecast` invocation. Built from the raw argument string,
/// used for a single fetch, then dropped.
#[derive(Debug, Clone, PartialEq)]
pub struct ForecastRequest {
    pub latitude: f64,
    pub longitude: f64,
    /// IANA zone name, passed through to the provider unvalidated.
    pub timezone: String,
    pub date: NaiveDate,
    pub hour_from: u8,
    pub hour_to: u8,
    pub models: Vec<ModelId>,
}

#[derive(Debug, Error, PartialEq)]
pub enum RequestError {
    #[error("expected 7 arguments, got {0}\n{USAGE}")]
    WrongArgumentCount(usize),
    #[error("latitude must be a number between -90 and 90, got '{0}'")]
    BadLatitude(String),
    #[error("longitude must be a number between -180 and 180, got '{0}'")]
    BadLongitude(String),
    #[error("date must be YYYY-MM-DD, got '{0}'")]
    BadDate(String),
    #[error("{field} hour must be an integer between 0 and 23, got '{value}'")]
    BadHour { field: &'static str, value: String },
    #[error("end hour {to} is before start hour {from}")]
    InvertedWindow { from: u8, to: u8 },
    #[error("unknown model '{0}', see /models for the supported list")]
    UnknownModel(String),
    #[error("no models given, expected a comma-separated list like GFS,ICON")]
    NoModels,
}

impl ForecastRequest {
    /// Parses the text after `/forecast`: exactly seven whitespace-separated
    /// fields, the last a comma-separated model list with no spaces.
    pub fn parse(args: &str) -> Result<ForecastRequest, RequestError> {
        let fields: Vec<&str> = args.split_whitespace().collect();
        if fields.len() != 7 {
            return Err(RequestError::WrongArgumentCount(fields.len()));
        }

        let latitude: f64 = fields[0]
            .parse()
            .ok()
            .filter(|v: &f64| (-90.0..=90.0).contains(v))
            .ok_or_else(|| RequestError::BadLatitude(fields[0].to_string()))?;

        let longitude: f64 = fields[1]
            .parse()
            .ok()
            .filter(|v: &f64| (-180.0..=180.0).contains(v))
            .ok_or_else(|| RequestError::BadLongitude(fields[1].to_string()))?;

        let timezone = fields[2].to_string();

        let date = NaiveDate::parse_from_str(fields[3], "%Y-%m-%d")
            .map_err(|_| RequestError::BadDate(fields[3].to_string()))?;

        let hour_from = parse_hour("start", fields[4])?;
        let hour_to = parse_hour("end", fields[5])?;
        if hour_to < hour_from {
            return Err(RequestError::InvertedWindow {
                from: hour_from,
                to: hour_to,
            });
        }

        let mut models = Vec::new();
        for token in fields[6].split(',').filter(|t| !t.is_empty()) {
            let model: ModelId = token
                .parse()
                .map_err(|_| RequestError::UnknownModel(token.to_string()))?;
            // Duplicate identifiers collapse to one fetch.
            if !models.contains(&model) {
                models.push(model);
            }
        }
        if models.is_empty() {
            return Err(RequestError::NoModels);
        }

        Ok(ForecastRequest {
            latitude,
            longitude,
            timezone,
            date,
            hour_from,
            hour_to,
            models,
        })
    }
}

fn parse_hour(field: &'static str, value: &str) -> Result<u8, RequestError> {
    value
        .parse::<u8>()
        .ok()
        .filter(|h| *h <= 23)
        .ok_or_else(|| RequestError::BadHour {
            field,
            value: value.to_string(),
        })
}
