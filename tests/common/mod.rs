#![allow(dead_code)]

use chrono::NaiveDate;
use navpredictor::domain::error::AnalysisError;
use navpredictor::domain::features::FeatureFrame;
use navpredictor::domain::instrument::Instrument;
use navpredictor::domain::series::{Observation, TimeSeries};
use navpredictor::domain::trend::Forecast;
use navpredictor::ports::chart_port::ChartPort;
use navpredictor::ports::series_port::SeriesPort;
use std::collections::HashMap;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

pub fn date(year: i32, month: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(year, month, day).unwrap()
}

/// One observation per calendar day starting 2023-01-02.
pub fn make_series(instrument: Instrument, values: &[f64]) -> TimeSeries {
    let start = date(2023, 1, 2);
    TimeSeries::new(
        instrument,
        values
            .iter()
            .enumerate()
            .map(|(i, &v)| Observation::new(start + chrono::Duration::days(i as i64), v))
            .collect(),
    )
}

/// Deterministic pseudo-noise in [-1, 1] without pulling in an RNG.
pub fn noise(i: usize) -> f64 {
    let x = (i as f64 * 12.9898).sin() * 43758.5453;
    2.0 * (x - x.floor()) - 1.0
}

/// `n` values rising linearly from `start` to `end` plus noise of the given amplitude.
pub fn linear_with_noise(n: usize, start: f64, end: f64, amplitude: f64) -> Vec<f64> {
    (0..n)
        .map(|i| start + (end - start) * i as f64 / (n - 1) as f64 + amplitude * noise(i))
        .collect()
}

pub struct MockSeriesPort {
    pub data: HashMap<String, Vec<f64>>,
    pub errors: HashMap<String, String>,
}

impl MockSeriesPort {
    pub fn new() -> Self {
        Self {
            data: HashMap::new(),
            errors: HashMap::new(),
        }
    }

    pub fn with_values(mut self, symbol: &str, values: Vec<f64>) -> Self {
        self.data.insert(symbol.to_string(), values);
        self
    }

    pub fn with_error(mut self, symbol: &str, reason: &str) -> Self {
        self.errors.insert(symbol.to_string(), reason.to_string());
        self
    }
}

impl SeriesPort for MockSeriesPort {
    fn fetch_series(&self, instrument: &Instrument) -> Result<TimeSeries, AnalysisError> {
        if let Some(reason) = self.errors.get(&instrument.symbol) {
            return Err(AnalysisError::Data {
                reason: reason.clone(),
            });
        }
        let values = self.data.get(&instrument.symbol).cloned().unwrap_or_default();
        Ok(make_series(instrument.clone(), &values))
    }
}

/// Renderer that always fails.
pub struct FailingChartPort;

impl ChartPort for FailingChartPort {
    fn render(&self, _: &FeatureFrame, _: &Forecast) -> Result<String, AnalysisError> {
        Err(AnalysisError::Render {
            reason: "renderer offline".into(),
        })
    }
}

/// Renderer that records the symbols it drew and checks it is never
/// entered by two threads at once.
pub struct RecordingChartPort {
    pub rendered: Mutex<Vec<String>>,
    active: AtomicUsize,
    pub max_concurrent: AtomicUsize,
}

impl RecordingChartPort {
    pub fn new() -> Self {
        Self {
            rendered: Mutex::new(Vec::new()),
            active: AtomicUsize::new(0),
            max_concurrent: AtomicUsize::new(0),
        }
    }
}

impl ChartPort for RecordingChartPort {
    fn render(&self, frame: &FeatureFrame, _: &Forecast) -> Result<String, AnalysisError> {
        let now = self.active.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_concurrent.fetch_max(now, Ordering::SeqCst);
        std::thread::sleep(Duration::from_millis(2));
        let symbol = frame.instrument.symbol.clone();
        self.rendered.lock().unwrap().push(symbol.clone());
        self.active.fetch_sub(1, Ordering::SeqCst);
        Ok(format!("mem://{symbol}"))
    }
}
