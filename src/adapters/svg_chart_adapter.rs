//! SVG chart writer.
//!
//! Draws the value history, each rolling mean, the Bollinger band and a
//! forecast cone running from the last observation to the prediction
//! interval at the horizon. One file per instrument and last date:
//! `<dir>/<symbol>_<kind>_<YYYYMMDD>.svg`.

use crate::domain::error::AnalysisError;
use crate::domain::features::FeatureFrame;
use crate::domain::trend::Forecast;
use crate::ports::chart_port::ChartPort;
use std::fmt::Write as _;
use std::fs;
use std::path::PathBuf;

const WIDTH: f64 = 800.0;
const HEIGHT: f64 = 360.0;
const PADDING: f64 = 40.0;
const MEAN_COLORS: [&str; 4] = ["#e67e22", "#27ae60", "#8e44ad", "#7f8c8d"];

pub struct SvgChartAdapter {
    output_dir: PathBuf,
}

impl SvgChartAdapter {
    pub fn new(output_dir: PathBuf) -> Self {
        Self { output_dir }
    }

    fn chart_path(&self, frame: &FeatureFrame) -> Result<PathBuf, AnalysisError> {
        let last = frame.rows.last().ok_or_else(|| AnalysisError::Render {
            reason: "empty feature frame".into(),
        })?;
        let file = format!(
            "{}_{}_{}.svg",
            sanitize(&frame.instrument.symbol),
            frame.instrument.kind,
            last.date.format("%Y%m%d")
        );
        Ok(self.output_dir.join(file))
    }
}

impl ChartPort for SvgChartAdapter {
    fn render(&self, frame: &FeatureFrame, forecast: &Forecast) -> Result<String, AnalysisError> {
        let path = self.chart_path(frame)?;
        let svg = format_chart(frame, forecast);

        fs::create_dir_all(&self.output_dir).map_err(|e| AnalysisError::Render {
            reason: format!("cannot create {}: {}", self.output_dir.display(), e),
        })?;
        fs::write(&path, svg).map_err(|e| AnalysisError::Render {
            reason: format!("cannot write {}: {}", path.display(), e),
        })?;

        Ok(path.display().to_string())
    }
}

fn sanitize(symbol: &str) -> String {
    symbol
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '-' { c } else { '_' })
        .collect()
}

/// Maps observation index and value onto the plot area.
struct Scale {
    min: f64,
    scale_x: f64,
    scale_y: f64,
}

impl Scale {
    fn new(min: f64, max: f64, last_index: f64) -> Self {
        let plot_width = WIDTH - 2.0 * PADDING;
        let plot_height = HEIGHT - 2.0 * PADDING;
        let range = max - min;
        Self {
            min,
            scale_x: if last_index > 0.0 { plot_width / last_index } else { 0.0 },
            scale_y: if range > 0.0 { plot_height / range } else { 1.0 },
        }
    }

    fn point(&self, index: f64, value: f64) -> String {
        let x = PADDING + index * self.scale_x;
        let y = HEIGHT - PADDING - (value - self.min) * self.scale_y;
        format!("{:.1},{:.1}", x, y)
    }
}

/// Builds the SVG document for a frame and its forecast.
pub fn format_chart(frame: &FeatureFrame, forecast: &Forecast) -> String {
    let n = frame.len();
    let last_index = n.saturating_sub(1) as f64;
    let end_index = last_index + forecast.horizon as f64;

    let mut min = forecast.lower;
    let mut max = forecast.upper;
    for row in &frame.rows {
        min = min.min(row.value);
        max = max.max(row.value);
        if let Some(band) = row.bollinger {
            min = min.min(band.lower);
            max = max.max(band.upper);
        }
    }
    let scale = Scale::new(min, max, end_index);

    let mut svg = String::new();
    let _ = write!(
        svg,
        r#"<svg xmlns="http://www.w3.org/2000/svg" width="{w:.0}" height="{h:.0}" viewBox="0 0 {w:.0} {h:.0}">"#,
        w = WIDTH,
        h = HEIGHT
    );
    let _ = write!(
        svg,
        r#"<rect width="100%" height="100%" fill="white"/><text x="{PADDING:.0}" y="24" font-family="sans-serif" font-size="14">{} ({})</text>"#,
        frame.instrument.symbol, frame.instrument.kind
    );
    let _ = write!(
        svg,
        r##"<line x1="{p:.0}" y1="{p:.0}" x2="{p:.0}" y2="{b:.0}" stroke="#333"/><line x1="{p:.0}" y1="{b:.0}" x2="{r:.0}" y2="{b:.0}" stroke="#333"/>"##,
        p = PADDING,
        b = HEIGHT - PADDING,
        r = WIDTH - PADDING
    );

    // Bollinger band as a closed polygon: upper edge forward, lower edge back.
    let band: Vec<(usize, f64, f64)> = frame
        .rows
        .iter()
        .enumerate()
        .filter_map(|(i, row)| row.bollinger.map(|b| (i, b.upper, b.lower)))
        .collect();
    if band.len() > 1 {
        let upper = band.iter().map(|&(i, u, _)| scale.point(i as f64, u));
        let lower = band.iter().rev().map(|&(i, _, l)| scale.point(i as f64, l));
        let points: Vec<String> = upper.chain(lower).collect();
        let _ = write!(
            svg,
            r##"<polygon class="bollinger" points="{}" fill="#3498db" fill-opacity="0.12" stroke="none"/>"##,
            points.join(" ")
        );
    }

    for (k, &window) in frame.windows.iter().enumerate() {
        let segments = defined_runs(frame.rolling_mean(window).iter().copied(), &scale);
        for segment in segments {
            let _ = write!(
                svg,
                r#"<polyline class="sma-{window}" points="{segment}" fill="none" stroke="{}" stroke-width="1" stroke-dasharray="4 2"/>"#,
                MEAN_COLORS[k % MEAN_COLORS.len()]
            );
        }
    }

    let history: Vec<String> = frame
        .rows
        .iter()
        .enumerate()
        .map(|(i, row)| scale.point(i as f64, row.value))
        .collect();
    let _ = write!(
        svg,
        r##"<polyline class="value" points="{}" fill="none" stroke="#2c3e50" stroke-width="1.5"/>"##,
        history.join(" ")
    );

    let cone = [
        scale.point(last_index, forecast.last_value),
        scale.point(end_index, forecast.upper),
        scale.point(end_index, forecast.lower),
    ];
    let _ = write!(
        svg,
        r##"<polygon class="forecast-band" points="{}" fill="#e74c3c" fill-opacity="0.2" stroke="none"/>"##,
        cone.join(" ")
    );
    let _ = write!(
        svg,
        r##"<polyline class="forecast" points="{} {}" fill="none" stroke="#e74c3c" stroke-width="1.5" stroke-dasharray="6 3"/>"##,
        scale.point(last_index, forecast.last_value),
        scale.point(end_index, forecast.point)
    );

    svg.push_str("</svg>\n");
    svg
}

/// Splits an indicator series into polyline point lists over its defined
/// stretches; undefined entries break the line rather than plotting as zero.
fn defined_runs(values: impl Iterator<Item = Option<f64>>, scale: &Scale) -> Vec<String> {
    let mut runs = Vec::new();
    let mut current: Vec<String> = Vec::new();
    for (i, value) in values.enumerate() {
        match value {
            Some(v) => current.push(scale.point(i as f64, v)),
            None => {
                if current.len() > 1 {
                    runs.push(current.join(" "));
                }
                current.clear();
            }
        }
    }
    if current.len() > 1 {
        runs.push(current.join(" "));
    }
    runs
}
