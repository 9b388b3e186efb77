use std::fmt;
use thiserror::Error;

const MINUTES_PER_HOUR: i64 = 60;

/// Slack allowed when mapping an hour value back onto whole minutes.
const MINUTE_TOLERANCE: f64 = 1e-6;

/// Prefix of every per-timepoint file written by the simulator.
pub const TIMEPOINT_FILE_PREFIX: &str = "t_";

#[derive(Debug, Error, PartialEq, Eq, Clone)]
pub enum TimepointError {
    #[error("'{0}' does not encode a timepoint (expected '<integer>h' or '<integer>m')")]
    Malformed(String),
}

/// A simulation time point, held exactly as whole minutes relative to the
/// protocol's reference event (negative values precede it).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct Timepoint {
    minutes: i64,
}

impl Timepoint {
    pub const fn from_minutes(minutes: i64) -> Self {
        Self { minutes }
    }

    pub const fn from_whole_hours(hours: i64) -> Self {
        Self {
            minutes: hours * MINUTES_PER_HOUR,
        }
    }

    pub fn minutes(self) -> i64 {
        self.minutes
    }

    pub fn hours(self) -> f64 {
        self.minutes as f64 / MINUTES_PER_HOUR as f64
    }

    /// Converts an hour value back to a timepoint, if it lands on a whole
    /// minute. Values produced by [`Timepoint::hours`] always map back.
    pub fn from_hours(hours: f64) -> Option<Self> {
        let minutes = hours * MINUTES_PER_HOUR as f64;
        let whole = minutes.round();
        if whole.is_finite() && (minutes - whole).abs() < MINUTE_TOLERANCE {
            Some(Self::from_minutes(whole as i64))
        } else {
            None
        }
    }

    /// Decodes a file stem such as `t_0012h`, `t_-5h`, `t_00-5h` or `30m`.
    ///
    /// The magnitude is the trailing `-?digits` run right before the unit
    /// suffix; anything in front of it (after the optional `t_` prefix) must
    /// be zero padding.
    pub fn from_stem(stem: &str) -> Result<Self, TimepointError> {
        let malformed = || TimepointError::Malformed(stem.to_string());

        let body = stem.strip_prefix(TIMEPOINT_FILE_PREFIX).unwrap_or(stem);
        let (number, per_hour) = if let Some(n) = body.strip_suffix('h') {
            (n, MINUTES_PER_HOUR)
        } else if let Some(n) = body.strip_suffix('m') {
            (n, 1)
        } else {
            return Err(malformed());
        };

        let digits_start = number
            .rfind(|c: char| !c.is_ascii_digit())
            .map_or(0, |i| i + 1);
        let digits = &number[digits_start..];
        if digits.is_empty() {
            return Err(malformed());
        }

        let mut padding = &number[..digits_start];
        let negative = padding.ends_with('-');
        if negative {
            padding = &padding[..padding.len() - 1];
        }
        if !padding.chars().all(|c| c.is_ascii_digit()) {
            return Err(malformed());
        }

        let magnitude: i64 = digits.parse().map_err(|_| malformed())?;
        let value = if negative { -magnitude } else { magnitude };
        value
            .checked_mul(per_hour)
            .map(Self::from_minutes)
            .ok_or_else(malformed)
    }

    /// Decodes a full file name, requiring the given extension (without dot).
    pub fn from_file_name(name: &str, extension: &str) -> Result<Self, TimepointError> {
        let stem = name
            .strip_suffix(extension)
            .and_then(|s| s.strip_suffix('.'))
            .ok_or_else(|| TimepointError::Malformed(name.to_string()))?;
        Self::from_stem(stem)
    }
}

impl fmt::Display for Timepoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.minutes % MINUTES_PER_HOUR == 0 {
            write!(f, "{}h", self.minutes / MINUTES_PER_HOUR)
        } else {
            write!(f, "{}m", self.minutes)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_hours_minutes_and_negative_values() {
        assert_eq!(
            Timepoint::from_file_name("t_-5h.csv", "csv").unwrap().hours(),
            -5.0
        );
        assert_eq!(
            Timepoint::from_file_name("t_30m.csv", "csv").unwrap().hours(),
            0.5
        );
        assert_eq!(
            Timepoint::from_file_name("t_0h.csv", "csv").unwrap().hours(),
            0.0
        );
    }

    #[test]
    fn decodes_zero_padded_simulator_names() {
        assert_eq!(
            Timepoint::from_stem("t_0012h").unwrap(),
            Timepoint::from_whole_hours(12)
        );
        assert_eq!(
            Timepoint::from_stem("t_00-5h").unwrap(),
            Timepoint::from_whole_hours(-5)
        );
        assert_eq!(
            Timepoint::from_stem("t_0090m").unwrap(),
            Timepoint::from_minutes(90)
        );
    }

    #[test]
    fn image_names_share_the_encoding() {
        assert_eq!(
            Timepoint::from_file_name("t_0024h.png", "png").unwrap(),
            Timepoint::from_whole_hours(24)
        );
        assert_eq!(
            Timepoint::from_file_name("15m.png", "png").unwrap(),
            Timepoint::from_minutes(15)
        );
    }

    #[test]
    fn rejects_malformed_names() {
        for name in ["t_.csv", "t_5.csv", "t_5d.csv", "t_abch.csv", "t_x-2h.csv", "t_5h.txt"] {
            assert!(
                Timepoint::from_file_name(name, "csv").is_err(),
                "{} should be rejected",
                name
            );
        }
    }

    #[test]
    fn from_hours_requires_whole_minutes() {
        assert_eq!(Timepoint::from_hours(0.5), Some(Timepoint::from_minutes(30)));
        assert_eq!(Timepoint::from_hours(-2.0), Some(Timepoint::from_minutes(-120)));
        assert_eq!(Timepoint::from_hours(0.001), None);
        assert_eq!(Timepoint::from_hours(f64::NAN), None);
    }

    #[test]
    fn hours_map_back_to_the_same_minute() {
        for minutes in [31, 62, 125, 245, 250, 490, 500, 965, 970, -7, -301] {
            let timepoint = Timepoint::from_minutes(minutes);
            assert_eq!(Timepoint::from_hours(timepoint.hours()), Some(timepoint));
        }
        for minutes in -1500..=1500 {
            let timepoint = Timepoint::from_minutes(minutes);
            assert_eq!(Timepoint::from_hours(timepoint.hours()), Some(timepoint));
        }
    }

    #[test]
    fn ordering_follows_time() {
        let mut points = vec![
            Timepoint::from_whole_hours(2),
            Timepoint::from_minutes(-30),
            Timepoint::from_minutes(30),
        ];
        points.sort();
        assert_eq!(
            points.iter().map(|t| t.hours()).collect::<Vec<_>>(),
            vec![-0.5, 0.5, 2.0]
        );
    }

    #[test]
    fn display_prefers_hours() {
        assert_eq!(Timepoint::from_whole_hours(-5).to_string(), "-5h");
        assert_eq!(Timepoint::from_minutes(90).to_string(), "90m");
    }
}
