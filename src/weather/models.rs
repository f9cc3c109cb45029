use chrono::{DateTime, Local, TimeZone};
use serde::Deserialize;
use std::fmt::Display;

/// Forecast entries come in 3-hour steps, so eight of them span one day
pub const SAMPLES_PER_DAY: usize = 8;

// ============================================================================
// Typed views over the upstream payloads
// The handlers return the raw JSON; these only read the fields the page renders
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct CurrentWeatherResult {
    pub name: String,
    #[serde(default)]
    pub sys: SysInfo,
    pub main: MainInfo,
    #[serde(default)]
    pub weather: Vec<WeatherInfo>,
    #[serde(default)]
    pub wind: WindInfo,
}

#[derive(Debug, Deserialize, Default)]
pub struct SysInfo {
    #[serde(default)]
    pub country: String,
}

#[derive(Debug, Deserialize)]
pub struct MainInfo {
    pub temp: f64,
    #[serde(default)]
    pub humidity: f64,
}

#[derive(Debug, Deserialize)]
pub struct WeatherInfo {
    pub description: String,
}

#[derive(Debug, Deserialize, Default)]
pub struct WindInfo {
    #[serde(default)]
    pub speed: f64,
}

#[derive(Debug, Deserialize)]
pub struct ForecastResult {
    pub list: Vec<ForecastEntry>,
    pub city: Option<ForecastCity>,
}

#[derive(Debug, Deserialize)]
pub struct ForecastEntry {
    pub dt: i64,
    pub main: MainInfo,
    #[serde(default)]
    pub weather: Vec<WeatherInfo>,
}

#[derive(Debug, Deserialize)]
pub struct ForecastCity {
    pub name: String,
}

impl ForecastResult {
    /// One entry per day, picked by position
    pub fn daily(&self) -> Vec<&ForecastEntry> {
        daily_samples(&self.list)
    }
}

/// Keep every entry whose index is a multiple of eight, starting at 0.
///
/// Positional only: the first sample decides the time of day for all others.
pub fn daily_samples<T>(list: &[T]) -> Vec<&T> {
    list.iter().step_by(SAMPLES_PER_DAY).collect()
}

/// Round like JavaScript's `Math.round`, halves go toward positive infinity
pub fn round_half_up(value: f64) -> i64 {
    (value + 0.5).floor() as i64
}

fn first_description(weather: &[WeatherInfo]) -> String {
    weather
        .first()
        .map(|w| w.description.clone())
        .unwrap_or_default()
}

// ============================================================================
// Display strings, identical to what public/app.js renders
// ============================================================================

#[derive(Debug, Clone, PartialEq)]
pub struct CurrentConditions {
    pub location: String,
    pub temperature: String,
    pub description: String,
    pub humidity: String,
    pub wind: String,
}

impl From<&CurrentWeatherResult> for CurrentConditions {
    fn from(w: &CurrentWeatherResult) -> Self {
        Self {
            location: format!("{}, {}", w.name, w.sys.country),
            temperature: format!("{}°C", round_half_up(w.main.temp)),
            description: first_description(&w.weather),
            humidity: format!("Humidity: {}%", w.main.humidity),
            wind: format!("Wind: {} m/s", w.wind.speed),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct DailySample {
    pub weekday: String,
    pub temperature: String,
    pub description: String,
}

impl DailySample {
    /// Render an entry with the weekday taken in the server's local timezone
    pub fn local(entry: &ForecastEntry) -> Self {
        Self::in_timezone(entry, &Local)
    }

    pub fn in_timezone<Tz>(entry: &ForecastEntry, tz: &Tz) -> Self
    where
        Tz: TimeZone,
        Tz::Offset: Display,
    {
        Self {
            weekday: weekday_label(entry.dt, tz),
            temperature: format!("{}°C", round_half_up(entry.main.temp)),
            description: first_description(&entry.weather),
        }
    }
}

/// Abbreviated weekday ("Mon") for an epoch-seconds timestamp
pub fn weekday_label<Tz>(timestamp: i64, tz: &Tz) -> String
where
    Tz: TimeZone,
    Tz::Offset: Display,
{
    DateTime::from_timestamp(timestamp, 0)
        .map(|dt| dt.with_timezone(tz).format("%a").to_string())
        .unwrap_or_default()
}
