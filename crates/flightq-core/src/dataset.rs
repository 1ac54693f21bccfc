use crate::criteria::TimeBucket;
use crate::record::FlightRecord;
use crate::EngineError;
use serde::Deserialize;
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;
use std::sync::Arc;

/// The loaded flight table. Filtering never mutates it.
#[derive(Debug, Clone, Default)]
pub struct Dataset {
    records: Vec<Arc<FlightRecord>>,
}

impl Dataset {
    /// Validates every record before building the table. On failure nothing is built.
    pub fn from_records(records: Vec<FlightRecord>) -> Result<Self, EngineError> {
        for (index, record) in records.iter().enumerate() {
            record
                .validate()
                .map_err(|reason| EngineError::InvalidDataset { index, reason })?;
        }

        Ok(Self {
            records: records.into_iter().map(Arc::new).collect(),
        })
    }

    pub fn all(&self) -> &[Arc<FlightRecord>] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Indices of records whose stored `is_night` disagrees with their departure time.
    pub fn stale_night_flags(&self, night_includes_evening: bool) -> Vec<usize> {
        self.records
            .iter()
            .enumerate()
            .filter(|(_, r)| {
                r.departure_minutes()
                    .map(|m| TimeBucket::Night.contains(m, night_includes_evening) != r.is_night)
                    .unwrap_or(false)
            })
            .map(|(i, _)| i)
            .collect()
    }
}

/// Accepts either a bare array or the `{ "flights": [...] }` wrapper.
#[derive(Deserialize)]
#[serde(untagged)]
enum JsonListing {
    Bare(Vec<FlightRecord>),
    Wrapped { flights: Vec<FlightRecord> },
}

pub struct DatasetLoader;

impl DatasetLoader {
    /// Reads records from a `.json` or `.csv` file, chosen by extension.
    pub fn load_file<P: AsRef<Path>>(path: P) -> Result<Vec<FlightRecord>, EngineError> {
        let path = path.as_ref();
        let file = File::open(path)?;
        let reader = BufReader::new(file);

        let is_csv = path
            .extension()
            .map(|ext| ext.eq_ignore_ascii_case("csv"))
            .unwrap_or(false);

        let records = if is_csv {
            Self::parse_csv(reader)?
        } else {
            Self::parse_json(reader)?
        };
        log::debug!(
            "Read flight listing {} ({} records)",
            path.display(),
            records.len()
        );
        Ok(records)
    }

    pub fn parse_json<R: Read>(reader: R) -> Result<Vec<FlightRecord>, EngineError> {
        let listing: JsonListing = serde_json::from_reader(reader)?;
        Ok(match listing {
            JsonListing::Bare(records) => records,
            JsonListing::Wrapped { flights } => flights,
        })
    }

    /// Expects a header row naming the listing columns.
    pub fn parse_csv<R: Read>(reader: R) -> Result<Vec<FlightRecord>, EngineError> {
        let mut rdr = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .from_reader(reader);

        let mut records = Vec::new();
        for row in rdr.deserialize::<FlightRecord>() {
            records.push(row?);
        }
        Ok(records)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::sample_record;
    use std::io::Cursor;

    #[test]
    fn test_from_records_rejects_whole_load() {
        let mut bad = sample_record();
        bad.arrival_time = "noon".to_string();
        let err = Dataset::from_records(vec![sample_record(), bad]).unwrap_err();
        match err {
            EngineError::InvalidDataset { index, reason } => {
                assert_eq!(index, 1);
                assert!(reason.contains("arrival_time"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_stale_night_flag_detection() {
        let mut stale = sample_record();
        stale.is_night = true;
        let mut late = sample_record();
        late.departure_time = "23:10".to_string();
        late.is_night = true;

        let dataset = Dataset::from_records(vec![sample_record(), stale, late]).unwrap();
        assert_eq!(dataset.stale_night_flags(false), vec![1]);
    }

    #[test]
    fn test_parse_wrapped_json() {
        let json = r#"{ "flights": [ {
            "airline": "东方航空", "flight_number": "MU5101",
            "departure": "上海", "destination": "北京",
            "departure_time": "21:00", "arrival_time": "23:15",
            "days": "1234567", "availability": "2666"
        } ] }"#;
        let records = DatasetLoader::parse_json(Cursor::new(json)).unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].flight_number, "MU5101");
        assert_eq!(records[0].marker(), Some("2666"));
        assert_eq!(records[0].departure_province, "");
    }

    #[test]
    fn test_parse_csv() {
        let data = "\
airline,flight_number,departure,destination,departure_province,destination_province,departure_time,arrival_time,days,product_type,is_night,availability
中国国际航空,CA1234,北京,上海,北京市,上海市,08:30,10:45,1234567,经济舱,false,
南方航空,CZ3999,广州,成都,广东省,四川省,23:40,01:55,135,经济舱,true,2666
";
        let records = DatasetLoader::parse_csv(Cursor::new(data)).unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0], sample_record());
        assert_eq!(records[1].marker(), Some("2666"));
        assert!(records[1].is_night);
    }

    #[test]
    fn test_load_file_by_extension() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("flights.json");
        std::fs::write(&path, serde_json::to_string(&vec![sample_record()]).unwrap()).unwrap();

        let records = DatasetLoader::load_file(&path).unwrap();
        assert_eq!(records, vec![sample_record()]);

        let missing = DatasetLoader::load_file(dir.path().join("nope.csv"));
        assert!(matches!(missing, Err(EngineError::Io(_))));
    }
}
