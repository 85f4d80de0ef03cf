//! Reducers applied to the cell values collected for one zone
//!
//! A reducer turns the valid values under a polygon into one number.
//! Every reducer returns `None` for an empty slice.

use serde::{Deserialize, Serialize};
use standgis_core::{Error, Result};
use std::fmt;
use std::str::FromStr;

/// A statistic computed over the values of one zone.
///
/// Implementations may reorder `values` (sorting for order statistics);
/// the slice never contains no-data.
pub trait ZonalReducer: Send + Sync {
    /// Column label, used as attribute prefix (`mean` -> `mean_elev`)
    fn label(&self) -> String;

    /// Reduce the zone's values, `None` when there are none
    fn reduce(&self, values: &mut [f64]) -> Option<f64>;
}

impl<R: ZonalReducer + ?Sized> ZonalReducer for Box<R> {
    fn label(&self) -> String {
        (**self).label()
    }

    fn reduce(&self, values: &mut [f64]) -> Option<f64> {
        (**self).reduce(values)
    }
}

impl<R: ZonalReducer + ?Sized> ZonalReducer for &R {
    fn label(&self) -> String {
        (**self).label()
    }

    fn reduce(&self, values: &mut [f64]) -> Option<f64> {
        (**self).reduce(values)
    }
}

/// Built-in zonal statistics
///
/// Written and parsed as `mean`, `min`, `max`, `sum`, `count`, `std`,
/// `median` and `pNN` (e.g. `p90`).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum ZonalStatistic {
    /// Arithmetic mean
    Mean,
    /// Minimum value
    Min,
    /// Maximum value
    Max,
    /// Sum of values
    Sum,
    /// Number of contributing cells
    Count,
    /// Standard deviation (population)
    StdDev,
    /// Median value
    Median,
    /// Percentile (0-100), linear interpolation between order statistics
    Percentile(f64),
}

impl ZonalReducer for ZonalStatistic {
    fn label(&self) -> String {
        self.to_string()
    }

    fn reduce(&self, values: &mut [f64]) -> Option<f64> {
        if values.is_empty() {
            return None;
        }
        let value = match self {
            ZonalStatistic::Mean => running_mean(values),
            ZonalStatistic::Min => values.iter().copied().fold(f64::INFINITY, f64::min),
            ZonalStatistic::Max => values.iter().copied().fold(f64::NEG_INFINITY, f64::max),
            ZonalStatistic::Sum => values.iter().sum(),
            ZonalStatistic::Count => values.len() as f64,
            ZonalStatistic::StdDev => population_std(values),
            ZonalStatistic::Median => percentile(values, 50.0),
            ZonalStatistic::Percentile(p) => percentile(values, *p),
        };
        Some(value)
    }
}

/// Incremental mean; a constant input returns that constant exactly
fn running_mean(values: &[f64]) -> f64 {
    let mut mean = 0.0;
    for (i, &v) in values.iter().enumerate() {
        mean += (v - mean) / (i + 1) as f64;
    }
    mean
}

/// Welford's algorithm
fn population_std(values: &[f64]) -> f64 {
    let mut mean = 0.0;
    let mut m2 = 0.0;
    for (i, &v) in values.iter().enumerate() {
        let delta = v - mean;
        mean += delta / (i + 1) as f64;
        m2 += delta * (v - mean);
    }
    (m2 / values.len() as f64).sqrt()
}

fn percentile(values: &mut [f64], p: f64) -> f64 {
    values.sort_by(f64::total_cmp);
    let rank = (p / 100.0).clamp(0.0, 1.0) * (values.len() - 1) as f64;
    let lo = rank.floor() as usize;
    let hi = rank.ceil() as usize;
    if lo == hi {
        values[lo]
    } else {
        values[lo] + (values[hi] - values[lo]) * (rank - lo as f64)
    }
}

impl fmt::Display for ZonalStatistic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ZonalStatistic::Mean => write!(f, "mean"),
            ZonalStatistic::Min => write!(f, "min"),
            ZonalStatistic::Max => write!(f, "max"),
            ZonalStatistic::Sum => write!(f, "sum"),
            ZonalStatistic::Count => write!(f, "count"),
            ZonalStatistic::StdDev => write!(f, "std"),
            ZonalStatistic::Median => write!(f, "median"),
            ZonalStatistic::Percentile(p) => write!(f, "p{}", p),
        }
    }
}

impl FromStr for ZonalStatistic {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let name = s.trim().to_ascii_lowercase();
        let stat = match name.as_str() {
            "mean" => ZonalStatistic::Mean,
            "min" => ZonalStatistic::Min,
            "max" => ZonalStatistic::Max,
            "sum" => ZonalStatistic::Sum,
            "count" => ZonalStatistic::Count,
            "std" | "stddev" => ZonalStatistic::StdDev,
            "median" => ZonalStatistic::Median,
            other => {
                let p = other
                    .strip_prefix('p')
                    .and_then(|n| n.parse::<f64>().ok())
                    .filter(|p| (0.0..=100.0).contains(p))
                    .ok_or_else(|| Error::InvalidParameter {
                        name: "statistic",
                        value: s.to_string(),
                        reason: "expected mean, min, max, sum, count, std, median or pNN with NN in 0..=100"
                            .to_string(),
                    })?;
                ZonalStatistic::Percentile(p)
            }
        };
        Ok(stat)
    }
}

impl TryFrom<String> for ZonalStatistic {
    type Error = Error;

    fn try_from(value: String) -> Result<Self> {
        value.parse()
    }
}

impl From<ZonalStatistic> for String {
    fn from(stat: ZonalStatistic) -> Self {
        stat.to_string()
    }
}
