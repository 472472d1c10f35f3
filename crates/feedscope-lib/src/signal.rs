use std::fmt;

use crate::io::line::{parse_line, Unparseable};

/// Multiplier applied to the device-reported sigma for the gap bands.
pub const BAND_SCALE: f64 = 1.3;

/// Number of chart series every sample contributes.
pub const SERIES_PER_SAMPLE: usize = 3;

/// Record grammar a pipeline instance consumes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Variant {
    Rate,
    Gap,
}

impl Variant {
    /// Literal token that starts a record of this variant on the wire.
    pub fn tag(self) -> &'static str {
        match self {
            Variant::Rate => "rate",
            Variant::Gap => "gap",
        }
    }

    /// Parse a line, accepting only records of this variant.
    pub fn try_parse(self, line: &str) -> Result<Record, Unparseable> {
        let record = parse_line(line)?;
        if record.variant() == self {
            Ok(record)
        } else {
            Err(Unparseable)
        }
    }

    /// Legend labels for the three derived series, in `series_values` order.
    pub fn series_labels(self) -> [&'static str; SERIES_PER_SAMPLE] {
        match self {
            Variant::Rate => ["rawRate", "emaFast", "emaSlow"],
            Variant::Gap => ["emaGap", "+1.3x sigma", "-1.3x sigma"],
        }
    }

    pub fn y_label(self) -> &'static str {
        match self {
            Variant::Rate => "Rate",
            Variant::Gap => "Signal",
        }
    }
}

impl fmt::Display for Variant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

/// Feed-rate line as printed by the firmware, before index assignment.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RateRecord {
    pub raw_rate: f64,
    pub ema_fast: f64,
    pub ema_slow: f64,
}

/// EMA gap line: the difference between slow and fast EMA plus its running variance.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GapRecord {
    pub ema_diff: f64,
    pub variance: f64,
}

/// A successfully parsed line.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Record {
    Rate(RateRecord),
    Gap(GapRecord),
}

impl Record {
    pub fn variant(&self) -> Variant {
        match self {
            Record::Rate(_) => Variant::Rate,
            Record::Gap(_) => Variant::Gap,
        }
    }

    /// Attach the pipeline-assigned index. Gap bands are derived here, once.
    pub fn into_sample(self, index: u64) -> Sample {
        match self {
            Record::Rate(r) => Sample::Rate(RateSample {
                index,
                raw_rate: r.raw_rate,
                ema_fast: r.ema_fast,
                ema_slow: r.ema_slow,
            }),
            Record::Gap(g) => Sample::Gap(GapSample::from_variance(index, g.ema_diff, g.variance)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RateSample {
    pub index: u64,
    pub raw_rate: f64,
    pub ema_fast: f64,
    pub ema_slow: f64,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GapSample {
    pub index: u64,
    pub ema_diff: f64,
    pub upper_band: f64,
    pub lower_band: f64,
}

impl GapSample {
    pub fn from_variance(index: u64, ema_diff: f64, variance: f64) -> Self {
        let upper = BAND_SCALE * band_sigma(variance);
        Self {
            index,
            ema_diff,
            upper_band: upper,
            lower_band: -upper,
        }
    }

    /// Whether the gap sits above its upper band, the firmware's stop criterion.
    pub fn is_breach(&self) -> bool {
        self.ema_diff > self.upper_band
    }
}

/// Standard deviation from a reported variance; non-positive variance maps to 0.
pub fn band_sigma(variance: f64) -> f64 {
    if variance > 0.0 {
        variance.sqrt()
    } else {
        0.0
    }
}

/// One indexed telemetry sample.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Sample {
    Rate(RateSample),
    Gap(GapSample),
}

impl Sample {
    pub fn index(&self) -> u64 {
        match self {
            Sample::Rate(s) => s.index,
            Sample::Gap(s) => s.index,
        }
    }

    pub fn variant(&self) -> Variant {
        match self {
            Sample::Rate(_) => Variant::Rate,
            Sample::Gap(_) => Variant::Gap,
        }
    }

    /// Chart values in the order of `Variant::series_labels`.
    pub fn series_values(&self) -> [f64; SERIES_PER_SAMPLE] {
        match self {
            Sample::Rate(s) => [s.raw_rate, s.ema_fast, s.ema_slow],
            Sample::Gap(s) => [s.ema_diff, s.upper_band, s.lower_band],
        }
    }

    pub fn is_breach(&self) -> bool {
        match self {
            Sample::Rate(_) => false,
            Sample::Gap(s) => s.is_breach(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn non_positive_variance_collapses_bands() {
        for v in [0.0, -0.0, -1.0, -1e-12] {
            let s = GapSample::from_variance(0, 0.1, v);
            assert_eq!(s.upper_band, 0.0);
            assert_eq!(s.lower_band, 0.0);
        }
    }

    #[test]
    fn bands_are_symmetric() {
        let s = GapSample::from_variance(3, 0.05, 0.04);
        assert!((s.upper_band - 0.26).abs() < 1e-12);
        assert_eq!(s.lower_band, -s.upper_band);
        assert!(!s.is_breach());
    }

    #[test]
    fn breach_needs_gap_above_band() {
        assert!(GapSample::from_variance(0, 0.5, 0.04).is_breach());
        assert!(GapSample::from_variance(0, 0.01, 0.0).is_breach());
        assert!(!GapSample::from_variance(0, 0.0, 0.0).is_breach());
    }

    #[test]
    fn variant_filters_foreign_tags() {
        assert!(Variant::Rate.try_parse("gap,0.1,0.2").is_err());
        assert!(Variant::Gap.try_parse("rate,1,2,3").is_err());
        assert_eq!(
            Variant::Gap.try_parse("gap,0.1,0.2").map(|r| r.variant()),
            Ok(Variant::Gap)
        );
    }

    #[test]
    fn variant_displays_its_tag() {
        assert_eq!(Variant::Rate.to_string(), "rate");
        assert_eq!(Variant::Gap.to_string(), Variant::Gap.tag());
    }
}
