use chrono::{NaiveTime, Timelike, Weekday};
use serde::{Deserialize, Serialize};

/// One row of the flight listing. Immutable once loaded into a [`crate::Dataset`].
///
/// Field names follow the listing's data keys (`departure`, `days`, ...) while also
/// accepting the longer camelCase spellings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct FlightRecord {
    #[serde(default)]
    pub airline: String,
    #[serde(default, alias = "flightNumber")]
    pub flight_number: String,
    #[serde(default, rename = "departure", alias = "departure_city", alias = "departureCity")]
    pub departure_city: String,
    #[serde(
        default,
        rename = "destination",
        alias = "destination_city",
        alias = "destinationCity"
    )]
    pub destination_city: String,
    #[serde(default, alias = "departureProvince")]
    pub departure_province: String,
    #[serde(default, alias = "destinationProvince")]
    pub destination_province: String,
    /// "HH:MM", 24h.
    #[serde(default, alias = "departureTime")]
    pub departure_time: String,
    #[serde(default, alias = "arrivalTime")]
    pub arrival_time: String,
    /// Weekday mask, e.g. "1234567" or "1-3-5--".
    #[serde(default, rename = "days", alias = "operating_days", alias = "operatingDays")]
    pub operating_days: String,
    #[serde(default, alias = "productType")]
    pub product_type: String,
    /// Precomputed by the data source. Never used for filtering.
    #[serde(default, alias = "isNight")]
    pub is_night: bool,
    #[serde(
        default,
        rename = "availability",
        alias = "availability_marker",
        alias = "availabilityMarker"
    )]
    pub availability_marker: Option<String>,
}

/// Parses "HH:MM" into minutes since midnight.
pub fn parse_clock(value: &str) -> Option<u16> {
    let time = NaiveTime::parse_from_str(value.trim(), "%H:%M").ok()?;
    u16::try_from(time.hour() * 60 + time.minute()).ok()
}

fn weekday_digit(day: Weekday) -> char {
    match day {
        Weekday::Mon => '1',
        Weekday::Tue => '2',
        Weekday::Wed => '3',
        Weekday::Thu => '4',
        Weekday::Fri => '5',
        Weekday::Sat => '6',
        Weekday::Sun => '7',
    }
}

impl FlightRecord {
    pub fn departure_minutes(&self) -> Option<u16> {
        parse_clock(&self.departure_time)
    }

    pub fn arrival_minutes(&self) -> Option<u16> {
        parse_clock(&self.arrival_time)
    }

    /// The availability code, ignoring blank values.
    pub fn marker(&self) -> Option<&str> {
        self.availability_marker
            .as_deref()
            .map(str::trim)
            .filter(|m| !m.is_empty())
    }

    pub fn operates_on(&self, day: Weekday) -> bool {
        self.operating_days.contains(weekday_digit(day))
    }

    /// Checks the structural invariants a record must satisfy to be loadable.
    /// Returns the first violation as a human-readable reason.
    pub fn validate(&self) -> Result<(), String> {
        let required = [
            ("flight_number", &self.flight_number),
            ("departure", &self.departure_city),
            ("destination", &self.destination_city),
        ];
        for (name, value) in required {
            if value.trim().is_empty() {
                return Err(format!("missing {}", name));
            }
        }

        if self.departure_minutes().is_none() {
            return Err(format!(
                "unparsable departure_time '{}'",
                self.departure_time
            ));
        }
        if self.arrival_minutes().is_none() {
            return Err(format!("unparsable arrival_time '{}'", self.arrival_time));
        }

        validate_day_mask(&self.operating_days)
    }
}

fn validate_day_mask(mask: &str) -> Result<(), String> {
    if mask.chars().count() > 7 {
        return Err(format!("days mask '{}' longer than 7", mask));
    }
    let mut seen = [false; 7];
    for c in mask.chars() {
        match c {
            '1'..='7' => {
                let idx = (c as usize) - ('1' as usize);
                if seen[idx] {
                    return Err(format!("days mask '{}' repeats '{}'", mask, c));
                }
                seen[idx] = true;
            }
            '-' | '.' | ' ' => {}
            _ => return Err(format!("days mask '{}' has invalid char '{}'", mask, c)),
        }
    }
    Ok(())
}

#[cfg(test)]
pub(crate) fn sample_record() -> FlightRecord {
    FlightRecord {
        airline: "中国国际航空".to_string(),
        flight_number: "CA1234".to_string(),
        departure_city: "北京".to_string(),
        destination_city: "上海".to_string(),
        departure_province: "北京市".to_string(),
        destination_province: "上海市".to_string(),
        departure_time: "08:30".to_string(),
        arrival_time: "10:45".to_string(),
        operating_days: "1234567".to_string(),
        product_type: "经济舱".to_string(),
        is_night: false,
        availability_marker: None,
    }
}
