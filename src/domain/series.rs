//! Time series of closing prices or NAVs for one instrument.

use crate::domain::instrument::Instrument;
use chrono::NaiveDate;
use std::collections::BTreeMap;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Observation {
    pub date: NaiveDate,
    pub value: f64,
}

impl Observation {
    pub fn new(date: NaiveDate, value: f64) -> Self {
        Self { date, value }
    }
}

/// Observations as supplied by the fetch collaborator. Order and uniqueness
/// are not trusted until [`TimeSeries::normalized`] is called.
#[derive(Debug, Clone)]
pub struct TimeSeries {
    pub instrument: Instrument,
    pub observations: Vec<Observation>,
}

impl TimeSeries {
    pub fn new(instrument: Instrument, observations: Vec<Observation>) -> Self {
        Self {
            instrument,
            observations,
        }
    }

    pub fn len(&self) -> usize {
        self.observations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.observations.is_empty()
    }

    /// Ascending, timestamp-unique copy. For a repeated date the value
    /// supplied last wins.
    pub fn normalized(&self) -> Vec<Observation> {
        let mut by_date: BTreeMap<NaiveDate, f64> = BTreeMap::new();
        for obs in &self.observations {
            by_date.insert(obs.date, obs.value);
        }
        by_date
            .into_iter()
            .map(|(date, value)| Observation { date, value })
            .collect()
    }

    pub fn first_date(&self) -> Option<NaiveDate> {
        self.observations.iter().map(|o| o.date).min()
    }

    pub fn last_date(&self) -> Option<NaiveDate> {
        self.observations.iter().map(|o| o.date).max()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 3, day).unwrap()
    }

    fn series(points: &[(u32, f64)]) -> TimeSeries {
        TimeSeries::new(
            Instrument::equity("TCS", "INR"),
            points
                .iter()
                .map(|&(day, v)| Observation::new(d(day), v))
                .collect(),
        )
    }

    #[test]
    fn normalized_sorts_ascending() {
        let ts = series(&[(5, 3.0), (1, 1.0), (3, 2.0)]);
        let norm = ts.normalized();
        let dates: Vec<_> = norm.iter().map(|o| o.date).collect();
        assert_eq!(dates, vec![d(1), d(3), d(5)]);
    }

    #[test]
    fn normalized_keeps_latest_duplicate() {
        let ts = series(&[(1, 1.0), (2, 2.0), (1, 9.0)]);
        let norm = ts.normalized();
        assert_eq!(norm.len(), 2);
        assert_eq!(norm[0], Observation::new(d(1), 9.0));
    }

    #[test]
    fn gaps_are_preserved() {
        let ts = series(&[(1, 1.0), (10, 2.0)]);
        let norm = ts.normalized();
        assert_eq!(norm[1].date, d(10));
        assert_eq!(ts.first_date(), Some(d(1)));
        assert_eq!(ts.last_date(), Some(d(10)));
    }

    #[test]
    fn empty_series() {
        let ts = series(&[]);
        assert!(ts.is_empty());
        assert!(ts.normalized().is_empty());
        assert_eq!(ts.last_date(), None);
    }
}
