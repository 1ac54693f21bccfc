use crate::EngineError;
use chrono::Weekday;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

const MORNING_START: u16 = 6 * 60;
const AFTERNOON_START: u16 = 12 * 60;
const EVENING_START: u16 = 18 * 60;
const NIGHT_START: u16 = 22 * 60;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TripType {
    #[default]
    OneWay,
    RoundTrip,
}

impl TripType {
    pub fn as_str(&self) -> &'static str {
        match self {
            TripType::OneWay => "one-way",
            TripType::RoundTrip => "round-trip",
        }
    }
}

impl fmt::Display for TripType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TripType {
    type Err = EngineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "one-way" | "oneway" | "one_way" | "单程" => Ok(TripType::OneWay),
            "round-trip" | "roundtrip" | "round_trip" | "往返" => Ok(TripType::RoundTrip),
            other => Err(EngineError::InvalidCriteria(format!(
                "unknown trip type '{}'",
                other
            ))),
        }
    }
}

/// Coarse departure time-of-day buckets.
///
/// Boundaries are half-open minute ranges: Morning [06:00, 12:00), Afternoon
/// [12:00, 18:00), Evening [18:00, 22:00), Night [22:00, 06:00) wrapping past
/// midnight. When the night window is configured to include the evening, Night
/// becomes [18:00, 06:00) and Evening stays selectable on its own.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TimeBucket {
    #[default]
    All,
    Morning,
    Afternoon,
    Evening,
    Night,
}

impl TimeBucket {
    pub const SELECTABLE: [TimeBucket; 5] = [
        TimeBucket::All,
        TimeBucket::Morning,
        TimeBucket::Afternoon,
        TimeBucket::Evening,
        TimeBucket::Night,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            TimeBucket::All => "all",
            TimeBucket::Morning => "morning",
            TimeBucket::Afternoon => "afternoon",
            TimeBucket::Evening => "evening",
            TimeBucket::Night => "night",
        }
    }

    /// Whether a departure at `minutes` since midnight falls in this bucket.
    pub fn contains(&self, minutes: u16, night_includes_evening: bool) -> bool {
        match self {
            TimeBucket::All => true,
            TimeBucket::Morning => (MORNING_START..AFTERNOON_START).contains(&minutes),
            TimeBucket::Afternoon => (AFTERNOON_START..EVENING_START).contains(&minutes),
            TimeBucket::Evening => (EVENING_START..NIGHT_START).contains(&minutes),
            TimeBucket::Night => {
                let start = if night_includes_evening {
                    EVENING_START
                } else {
                    NIGHT_START
                };
                minutes >= start || minutes < MORNING_START
            }
        }
    }
}

impl fmt::Display for TimeBucket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TimeBucket {
    type Err = EngineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_lowercase();
        TimeBucket::SELECTABLE
            .into_iter()
            .find(|b| b.as_str() == wanted)
            .ok_or_else(|| EngineError::InvalidCriteria(format!("unknown time bucket '{}'", s)))
    }
}

/// Every active filter dimension. The default value is fully unconstrained.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct FilterCriteria {
    pub trip_type: TripType,
    pub departure_query: String,
    pub destination_query: String,
    pub time_bucket: TimeBucket,
    pub availability_only: bool,
    pub operating_day: Option<Weekday>,
}

impl FilterCriteria {
    pub fn is_unconstrained(&self) -> bool {
        *self == FilterCriteria::default()
    }

    /// Human-readable description of the active filters.
    pub fn summary(&self) -> String {
        let mut parts = Vec::new();
        if self.trip_type == TripType::RoundTrip {
            parts.push("round trip".to_string());
        }
        let dep = self.departure_query.trim();
        if !dep.is_empty() {
            parts.push(format!("from \"{}\"", dep));
        }
        let dest = self.destination_query.trim();
        if !dest.is_empty() {
            parts.push(format!("to \"{}\"", dest));
        }
        if self.time_bucket != TimeBucket::All {
            parts.push(format!("{} departures", self.time_bucket));
        }
        if self.availability_only {
            parts.push("available only".to_string());
        }
        if let Some(day) = self.operating_day {
            parts.push(format!("operating {}", day));
        }

        if parts.is_empty() {
            "all flights".to_string()
        } else {
            parts.join(", ")
        }
    }
}
