use chrono::Duration;
use serde::{Deserialize, Serialize};

/// How often a scheduled task should run.
///
/// Parsed once at the data-model boundary; raw frequency strings never reach
/// the scheduler loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Frequency {
    Hourly,
    Daily,
    Weekly,
    Monthly,
    EveryMinutes(u32),
}

impl Frequency {
    /// Parse an enum label or an integer minute count; anything else
    /// defaults to daily
    pub fn parse(s: &str) -> Self {
        match s.trim().to_lowercase().as_str() {
            "hourly" => Frequency::Hourly,
            "daily" => Frequency::Daily,
            "weekly" => Frequency::Weekly,
            "monthly" => Frequency::Monthly,
            other => match other.parse::<u32>() {
                Ok(minutes) if minutes > 0 => Frequency::EveryMinutes(minutes),
                _ => Frequency::Daily,
            },
        }
    }

    /// Canonical string form, stored in the database
    pub fn canonical(&self) -> String {
        match self {
            Frequency::Hourly => "hourly".to_string(),
            Frequency::Daily => "daily".to_string(),
            Frequency::Weekly => "weekly".to_string(),
            Frequency::Monthly => "monthly".to_string(),
            Frequency::EveryMinutes(minutes) => minutes.to_string(),
        }
    }

    /// Minimum interval between two runs.
    ///
    /// Monthly is a fixed 30 days so that due-checks stay a pure comparison.
    pub fn interval(&self) -> Duration {
        match self {
            Frequency::Hourly => Duration::hours(1),
            Frequency::Daily => Duration::days(1),
            Frequency::Weekly => Duration::days(7),
            Frequency::Monthly => Duration::days(30),
            Frequency::EveryMinutes(minutes) => Duration::minutes(*minutes as i64),
        }
    }
}

impl Default for Frequency {
    fn default() -> Self {
        Frequency::Daily
    }
}

impl From<String> for Frequency {
    fn from(s: String) -> Self {
        Frequency::parse(&s)
    }
}

impl From<Frequency> for String {
    fn from(f: Frequency) -> Self {
        f.canonical()
    }
}

impl std::fmt::Display for Frequency {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.canonical())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_labels() {
        assert_eq!(Frequency::parse("hourly"), Frequency::Hourly);
        assert_eq!(Frequency::parse("Daily"), Frequency::Daily);
        assert_eq!(Frequency::parse(" weekly "), Frequency::Weekly);
        assert_eq!(Frequency::parse("monthly"), Frequency::Monthly);
    }

    #[test]
    fn test_parse_minutes() {
        assert_eq!(Frequency::parse("15"), Frequency::EveryMinutes(15));
        assert_eq!(Frequency::parse("1440"), Frequency::EveryMinutes(1440));
    }

    #[test]
    fn test_parse_garbage_defaults_to_daily() {
        assert_eq!(Frequency::parse("fortnightly"), Frequency::Daily);
        assert_eq!(Frequency::parse(""), Frequency::Daily);
        assert_eq!(Frequency::parse("0"), Frequency::Daily);
        assert_eq!(Frequency::parse("-5"), Frequency::Daily);
    }

    #[test]
    fn test_intervals() {
        assert_eq!(Frequency::Hourly.interval(), Duration::hours(1));
        assert_eq!(Frequency::Daily.interval(), Duration::days(1));
        assert_eq!(Frequency::Weekly.interval(), Duration::days(7));
        assert_eq!(Frequency::Monthly.interval(), Duration::days(30));
        assert_eq!(Frequency::EveryMinutes(45).interval(), Duration::minutes(45));
    }

    #[test]
    fn test_canonical_roundtrip() {
        for f in [
            Frequency::Hourly,
            Frequency::Daily,
            Frequency::Weekly,
            Frequency::Monthly,
            Frequency::EveryMinutes(90),
        ] {
            assert_eq!(Frequency::parse(&f.canonical()), f);
        }
    }
}
