//! # Weather Forecasts
//!
//! Mock data. Routes:
//! - GET /v1/weatherforecast: public
//! - GET /v2/weatherforecastv2: requires a caller identity

use axum::Json;
use chrono::{Days, NaiveDate, Utc};
use rand::Rng;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::auth::CallerIdentity;
use crate::error::ErrorBody;

/// Days covered by one forecast response, starting tomorrow.
pub const FORECAST_DAYS: u64 = 5;

pub const SUMMARIES: [&str; 10] = [
    "Freezing",
    "Bracing",
    "Chilly",
    "Cool",
    "Mild",
    "Warm",
    "Balmy",
    "Hot",
    "Sweltering",
    "Scorching",
];

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct WeatherForecast {
    pub date: NaiveDate,
    pub temperature_c: i32,
    pub temperature_f: i32,
    pub summary: String,
}

impl WeatherForecast {
    pub fn new(date: NaiveDate, temperature_c: i32, summary: impl Into<String>) -> Self {
        Self {
            date,
            temperature_c,
            temperature_f: fahrenheit(temperature_c),
            summary: summary.into(),
        }
    }
}

/// `32 + C / 0.5556`, truncated toward zero.
pub fn fahrenheit(celsius: i32) -> i32 {
    32 + (f64::from(celsius) / 0.5556) as i32
}

/// `days` forecasts for the days after `today`, temperatures in [-20, 55).
pub fn generate<R: Rng + ?Sized>(rng: &mut R, today: NaiveDate, days: u64) -> Vec<WeatherForecast> {
    (1..=days)
        .filter_map(|offset| today.checked_add_days(Days::new(offset)))
        .map(|date| {
            let temperature_c = rng.gen_range(-20..55);
            let summary = SUMMARIES[rng.gen_range(0..SUMMARIES.len())];
            WeatherForecast::new(date, temperature_c, summary)
        })
        .collect()
}

fn upcoming() -> Vec<WeatherForecast> {
    generate(&mut rand::thread_rng(), Utc::now().date_naive(), FORECAST_DAYS)
}

/// GET /v1/weatherforecast: Five days of mock forecasts.
#[utoipa::path(
    get,
    path = "/v1/weatherforecast",
    responses(
        (status = 200, description = "Upcoming forecasts", body = [WeatherForecast]),
    ),
    tag = "forecast"
)]
pub async fn weather_forecast() -> Json<Vec<WeatherForecast>> {
    Json(upcoming())
}

/// GET /v2/weatherforecastv2: Five days of mock forecasts for an authenticated caller.
#[utoipa::path(
    get,
    path = "/v2/weatherforecastv2",
    responses(
        (status = 200, description = "Upcoming forecasts", body = [WeatherForecast]),
        (status = 401, description = "Missing or invalid credential", body = ErrorBody),
    ),
    tag = "forecast"
)]
pub async fn weather_forecast_v2(caller: CallerIdentity) -> Json<Vec<WeatherForecast>> {
    tracing::debug!(subject = %caller.subject, scheme = %caller.scheme, "serving v2 forecast");
    Json(upcoming())
}
