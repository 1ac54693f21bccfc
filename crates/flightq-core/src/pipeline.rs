use crate::canonical::CanonicalCriteria;
use crate::config::EngineConfig;
use crate::criteria::{TimeBucket, TripType};
use crate::record::FlightRecord;
use serde::Serialize;
use std::sync::Arc;

/// Which leg of the requested journey a row represents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Leg {
    OneWay,
    Outbound,
    Return,
}

impl Leg {
    /// Label shown next to the row in the listing.
    pub fn label(&self) -> &'static str {
        match self {
            Leg::OneWay => "单程",
            Leg::Outbound => "去程",
            Leg::Return => "返程",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FlightRow {
    pub leg: Leg,
    pub record: Arc<FlightRecord>,
}

/// Case-insensitive substring match on the city, falling back to the province.
/// `query` must already be normalized.
fn place_matches(city: &str, province: &str, query: &str) -> bool {
    query.is_empty()
        || city.to_lowercase().contains(query)
        || province.to_lowercase().contains(query)
}

/// Ordered filter stages:
/// validity -> trip type -> city search -> time bucket -> availability -> operating day
/// -> round-trip pairing.
///
/// Each stage only sees the survivors of the previous one and keeps their order.
#[derive(Debug, Clone)]
pub struct FilterPipeline {
    availability_marker: String,
    night_includes_evening: bool,
}

impl FilterPipeline {
    pub fn new(config: &EngineConfig) -> Self {
        Self {
            availability_marker: config.availability_marker.trim().to_string(),
            night_includes_evening: config.night_includes_evening,
        }
    }

    pub fn run(
        &self,
        records: &[Arc<FlightRecord>],
        criteria: &CanonicalCriteria,
    ) -> Vec<FlightRow> {
        let valid = Self::validity_stage(records);
        let legs = Self::trip_type_stage(valid, criteria.trip_type);
        let rows = Self::city_stage(legs, &criteria.departure, &criteria.destination);
        let rows = self.time_stage(rows, criteria.time_bucket);
        let rows = self.availability_stage(rows, criteria.availability_only);
        let rows = Self::operating_day_stage(rows, criteria.operating_day);
        let rows = Self::pairing_stage(rows);

        log::trace!(
            "Pipeline kept {} of {} records",
            rows.len(),
            records.len()
        );
        rows
    }

    fn validity_stage(records: &[Arc<FlightRecord>]) -> Vec<Arc<FlightRecord>> {
        records
            .iter()
            .filter(|r| r.validate().is_ok())
            .cloned()
            .collect()
    }

    /// Round trips emit every candidate twice: the outbound block in dataset
    /// order, then the return block in dataset order.
    fn trip_type_stage(records: Vec<Arc<FlightRecord>>, trip_type: TripType) -> Vec<FlightRow> {
        let tag = |leg: Leg| {
            records.iter().map(move |record| FlightRow {
                leg,
                record: Arc::clone(record),
            })
        };

        match trip_type {
            TripType::OneWay => tag(Leg::OneWay).collect(),
            TripType::RoundTrip => tag(Leg::Outbound).chain(tag(Leg::Return)).collect(),
        }
    }

    fn city_stage(rows: Vec<FlightRow>, departure: &str, destination: &str) -> Vec<FlightRow> {
        if departure.is_empty() && destination.is_empty() {
            return rows;
        }

        rows.into_iter()
            .filter(|row| {
                // A return leg flies the requested route backwards.
                let (from, to) = match row.leg {
                    Leg::Return => (destination, departure),
                    Leg::OneWay | Leg::Outbound => (departure, destination),
                };
                let r = &row.record;
                place_matches(&r.departure_city, &r.departure_province, from)
                    && place_matches(&r.destination_city, &r.destination_province, to)
            })
            .collect()
    }

    fn time_stage(&self, rows: Vec<FlightRow>, bucket: TimeBucket) -> Vec<FlightRow> {
        if bucket == TimeBucket::All {
            return rows;
        }

        rows.into_iter()
            .filter(|row| {
                row.record
                    .departure_minutes()
                    .map(|m| bucket.contains(m, self.night_includes_evening))
                    .unwrap_or(false)
            })
            .collect()
    }

    fn availability_stage(&self, rows: Vec<FlightRow>, availability_only: bool) -> Vec<FlightRow> {
        if !availability_only {
            return rows;
        }

        rows.into_iter()
            .filter(|row| row.record.marker() == Some(self.availability_marker.as_str()))
            .collect()
    }

    /// Each return leg needs an outbound leg to pair with. Unpaired return legs
    /// are dropped from the end of the return block, so a round trip never
    /// lists more than twice the one-way rows.
    fn pairing_stage(mut rows: Vec<FlightRow>) -> Vec<FlightRow> {
        let outbound = rows.iter().filter(|r| r.leg == Leg::Outbound).count();
        let mut returns = 0;
        rows.retain(|row| {
            if row.leg != Leg::Return {
                return true;
            }
            returns += 1;
            returns <= outbound
        });
        rows
    }

    fn operating_day_stage(rows: Vec<FlightRow>, day: Option<chrono::Weekday>) -> Vec<FlightRow> {
        match day {
            None => rows,
            Some(day) => rows
                .into_iter()
                .filter(|row| row.record.operates_on(day))
                .collect(),
        }
    }
}
