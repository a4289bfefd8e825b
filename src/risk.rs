use std::fmt;

use serde::Serialize;

/// Coarse classification of an absence rate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum RateBand {
    Low,
    Moderate,
    High,
}

impl RateBand {
    pub fn as_str(&self) -> &'static str {
        match self {
            RateBand::Low => "low",
            RateBand::Moderate => "moderate",
            RateBand::High => "high",
        }
    }
}

impl fmt::Display for RateBand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Bands a percentage: `[0,39]` low, `[40,69]` moderate, `[70,100]` high.
///
/// Out of range values are clamped first and NaN counts as 0, so every input has a band.
pub fn band_of(rate_percent: f64) -> RateBand {
    let rate = if rate_percent.is_nan() {
        0.0
    } else {
        rate_percent.clamp(0.0, 100.0)
    };

    match rate {
        r if r < 40.0 => RateBand::Low,
        r if r < 70.0 => RateBand::Moderate,
        _ => RateBand::High,
    }
}

/// Rounded percentage of `part` over `total`, 0 when there is nothing to divide by.
pub fn rate_percent(part: usize, total: usize) -> u32 {
    if total == 0 {
        0
    } else {
        ((part as f64 / total as f64) * 100.0).round() as u32
    }
}
