use flightq_core::{EngineConfig, EngineError, FlightRecord, QueryEngine, TimeBucket, TripType};

fn make_ca1234() -> FlightRecord {
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

fn make_engine() -> QueryEngine {
    QueryEngine::with_records(EngineConfig::default(), vec![make_ca1234()]).unwrap()
}

#[test]
fn test_single_record_city_search() {
    let mut engine = make_engine();

    engine.set_city_search("北京", "").unwrap();
    assert_eq!(engine.apply().unwrap().stats.filtered_count, 1);

    engine.set_city_search("不存在的城市", "").unwrap();
    let miss = engine.apply().unwrap();
    assert_eq!(miss.stats.filtered_count, 0);
    assert!(miss.stats.no_results());
    assert!(miss.rows.is_empty());

    let reset = engine.reset().unwrap();
    assert_eq!(reset.stats.filtered_count, 1);
    assert_eq!(reset.stats.filtered_count, reset.stats.total_count);
}

#[test]
fn test_single_record_time_buckets() {
    let mut engine = make_engine();

    engine.set_time_bucket(TimeBucket::Night);
    assert_eq!(engine.apply().unwrap().stats.filtered_count, 0);

    engine.set_time_bucket(TimeBucket::Morning);
    assert_eq!(engine.apply().unwrap().stats.filtered_count, 1);

    engine.select_time_bucket("all").unwrap();
    assert_eq!(engine.apply().unwrap().stats.filtered_count, 1);
}

#[test]
fn test_both_cities_unknown() {
    let mut engine = make_engine();
    engine
        .set_city_search("不存在的城市XYZ", "另一个不存在的城市ABC")
        .unwrap();
    let result = engine.apply().unwrap();
    assert!(result.stats.no_results());
    assert_eq!(result.stats.total_count, 1);
}

#[test]
fn test_empty_search_shows_everything() {
    let mut engine = make_engine();
    engine.set_city_search("", "").unwrap();
    assert_eq!(engine.apply().unwrap().stats.filtered_count, 1);
    engine.set_city_search("   ", " ").unwrap();
    assert_eq!(engine.apply().unwrap().stats.filtered_count, 1);
}

#[test]
fn test_availability_toggle_changes_count() {
    let mut available = make_ca1234();
    available.flight_number = "CA1501".to_string();
    available.availability_marker = Some("2666".to_string());

    let mut engine =
        QueryEngine::with_records(EngineConfig::default(), vec![make_ca1234(), available])
            .unwrap();

    engine.toggle_availability();
    let on = engine.apply().unwrap().stats.filtered_count;
    engine.toggle_availability();
    let off = engine.apply().unwrap().stats.filtered_count;

    assert_eq!((on, off), (1, 2));
}

#[test]
fn test_multiple_filters_keep_city_condition() {
    let mut late = make_ca1234();
    late.flight_number = "CA1901".to_string();
    late.departure_time = "22:40".to_string();
    late.arrival_time = "00:55".to_string();
    late.availability_marker = Some("2666".to_string());

    let mut engine =
        QueryEngine::with_records(EngineConfig::default(), vec![make_ca1234(), late]).unwrap();
    engine.set_city_search("北京", "上海").unwrap();
    engine.set_time_bucket(TimeBucket::Night);
    engine.set_availability_only(true);

    let result = engine.apply().unwrap();
    assert_eq!(result.stats.filtered_count, 1);
    assert_eq!(result.rows[0].record.flight_number, "CA1901");
    assert_eq!(engine.criteria().departure_query, "北京");
    assert_eq!(engine.criteria().destination_query, "上海");
    assert_eq!(
        result.stats.summary,
        "from \"北京\", to \"上海\", night departures, available only"
    );
}

#[test]
fn test_reload_clears_cache() {
    let mut engine = make_engine();
    engine.apply().unwrap();
    assert_eq!(engine.cache_stats().entries, 1);

    let mut second = make_ca1234();
    second.flight_number = "CA1235".to_string();
    engine.load(vec![make_ca1234(), second]).unwrap();
    assert_eq!(engine.cache_stats().entries, 0);

    let result = engine.apply().unwrap();
    assert!(!result.stats.cache_hit);
    assert_eq!(result.stats.filtered_count, 2);
}

#[test]
fn test_invalid_reload_is_rejected() {
    let mut engine = make_engine();
    let mut broken = make_ca1234();
    broken.departure_time = "8 o'clock".to_string();

    match engine.load(vec![broken]) {
        Err(EngineError::InvalidDataset { index, reason }) => {
            assert_eq!(index, 0);
            assert!(reason.contains("departure_time"));
        }
        other => panic!("expected InvalidDataset, got {:?}", other.map(|_| ())),
    }
    assert_eq!(engine.all()[0].flight_number, "CA1234");
}

#[test]
fn test_invalid_selector_is_ignored() {
    let mut engine = make_engine();
    engine.set_trip_type(TripType::RoundTrip);
    assert!(engine.select_trip_type("不知道").is_err());
    assert_eq!(engine.criteria().trip_type, TripType::RoundTrip);
}

#[test]
fn test_empty_engine_applies_cleanly() {
    let mut engine = QueryEngine::new(EngineConfig::default());
    let result = engine.apply().unwrap();
    assert_eq!(result.stats.total_count, 0);
    assert!(result.stats.no_results());
}
