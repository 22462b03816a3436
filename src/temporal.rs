//! CF time axis decoding and temporal subsetting

use crate::errors::{BasinGridError, Result};
use crate::raster::{AxisKind, CoordinateAxis, RasterDataset};
use chrono::{Duration, NaiveDate, NaiveDateTime, NaiveTime};
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::{info, warn};

const DATETIME_FORMATS: [&str; 4] = [
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
    "%Y-%m-%dT%H:%M",
];

fn parse_datetime(text: &str) -> Option<NaiveDateTime> {
    let text = text.trim().trim_end_matches('Z');
    DATETIME_FORMATS
        .iter()
        .find_map(|f| NaiveDateTime::parse_from_str(text, f).ok())
        .or_else(|| {
            NaiveDate::parse_from_str(text, "%Y-%m-%d")
                .ok()
                .map(|d| d.and_time(NaiveTime::MIN))
        })
}

/// Decoded CF `"<unit> since <epoch>"` time units
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TimeUnits {
    /// Milliseconds per axis unit
    step_ms: f64,
    epoch: NaiveDateTime,
}

impl TimeUnits {
    pub fn parse(units: &str) -> Result<Self> {
        let (unit, epoch) = units
            .split_once(" since ")
            .ok_or_else(|| BasinGridError::TimeError(format!("unsupported time units '{units}'")))?;

        let step_ms = match unit.trim().to_ascii_lowercase().as_str() {
            "days" | "day" | "d" => 86_400_000.0,
            "hours" | "hour" | "h" => 3_600_000.0,
            "minutes" | "minute" | "min" => 60_000.0,
            "seconds" | "second" | "s" => 1_000.0,
            other => {
                return Err(BasinGridError::TimeError(format!(
                    "unsupported time unit '{other}'"
                )))
            }
        };
        let epoch = parse_datetime(epoch)
            .ok_or_else(|| BasinGridError::TimeError(format!("unparseable epoch in '{units}'")))?;

        Ok(Self { step_ms, epoch })
    }

    pub fn decode(&self, value: f64) -> Result<NaiveDateTime> {
        if !value.is_finite() {
            return Err(BasinGridError::TimeError(format!(
                "non-finite time value {value}"
            )));
        }
        Duration::try_milliseconds((value * self.step_ms).round() as i64)
            .and_then(|offset| self.epoch.checked_add_signed(offset))
            .ok_or_else(|| BasinGridError::TimeError(format!("time value {value} out of range")))
    }
}

/// Timestamps of a time axis; the axis must carry CF units
pub fn decode_time_axis(axis: &CoordinateAxis) -> Result<Vec<NaiveDateTime>> {
    let units = axis.units.as_deref().ok_or_else(|| {
        BasinGridError::TimeError(format!("time axis '{}' has no units", axis.name))
    })?;
    let units = TimeUnits::parse(units)?;
    axis.values.iter().map(|&v| units.decode(v)).collect()
}

/// Inclusive time window
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeRange {
    pub start: NaiveDateTime,
    pub end: NaiveDateTime,
}

impl TimeRange {
    /// Parse ISO dates; a date-only `end` covers that whole day
    pub fn parse(start: &str, end: &str) -> Result<Self> {
        let start_dt = parse_datetime(start)
            .ok_or_else(|| BasinGridError::TimeError(format!("invalid start date '{start}'")))?;
        let end_dt = match NaiveDate::parse_from_str(end.trim(), "%Y-%m-%d") {
            Ok(day) => day.and_time(NaiveTime::MIN) + Duration::days(1) - Duration::milliseconds(1),
            Err(_) => parse_datetime(end)
                .ok_or_else(|| BasinGridError::TimeError(format!("invalid end date '{end}'")))?,
        };
        if start_dt > end_dt {
            return Err(BasinGridError::TimeError(format!(
                "time range start {start} is after end {end}"
            )));
        }
        Ok(Self {
            start: start_dt,
            end: end_dt,
        })
    }

    pub fn contains(&self, t: &NaiveDateTime) -> bool {
        *t >= self.start && *t <= self.end
    }
}

impl fmt::Display for TimeRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} to {}", self.start, self.end)
    }
}

/// Keep time steps inside `range`
///
/// Datasets without a time axis are returned unchanged.
pub fn temporal_subset(dataset: &RasterDataset, range: &TimeRange) -> Result<RasterDataset> {
    let Some(axis) = dataset.find_axis(AxisKind::Time) else {
        warn!("no time dimension found, skipping temporal subsetting");
        return Ok(dataset.clone());
    };

    info!("temporal subsetting: {range}");
    let keep: Vec<usize> = decode_time_axis(axis)?
        .iter()
        .enumerate()
        .filter(|(_, t)| range.contains(t))
        .map(|(i, _)| i)
        .collect();
    info!(kept = keep.len(), total = axis.len(), "time steps selected");

    dataset.select_indices(&axis.name, &keep)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cf_units_decode() {
        let units = TimeUnits::parse("days since 2000-01-01").unwrap();
        let t = units.decode(31.0).unwrap();
        assert_eq!(t.date(), NaiveDate::from_ymd_opt(2000, 2, 1).unwrap());

        let units = TimeUnits::parse("hours since 1900-01-01 00:00:00").unwrap();
        let t = units.decode(36.0).unwrap();
        assert_eq!(t.to_string(), "1900-01-02 12:00:00");
    }

    #[test]
    fn date_only_end_covers_whole_day() {
        let range = TimeRange::parse("2010-01-01", "2010-01-31").unwrap();
        let late = parse_datetime("2010-01-31T18:00:00").unwrap();
        assert!(range.contains(&late));
        assert!(TimeRange::parse("2011-01-01", "2010-01-01").is_err());
    }
}
