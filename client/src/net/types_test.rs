use super::*;
use serde_json::json;

// =============================================================
// DisasterId
// =============================================================

#[test]
fn disaster_id_accepts_numbers_and_strings() {
    let from_number: DisasterId = serde_json::from_value(json!(42)).unwrap();
    let from_string: DisasterId = serde_json::from_value(json!("42")).unwrap();
    assert_eq!(from_number, from_string);
    assert_eq!(from_number.as_str(), "42");
}

#[test]
fn disaster_id_rejects_blank_and_structured_values() {
    assert!(DisasterId::from_value(&json!("  ")).is_none());
    assert!(DisasterId::from_value(&json!(null)).is_none());
    assert!(DisasterId::from_value(&json!({"id": 1})).is_none());
}

#[test]
fn disaster_id_serializes_as_string() {
    assert_eq!(serde_json::to_value(DisasterId::from("7")).unwrap(), json!("7"));
}

// =============================================================
// Records
// =============================================================

#[test]
fn disaster_parses_lenient_fields() {
    let disaster: Disaster = serde_json::from_value(json!({
        "id": 3,
        "title": "Flood",
        "tags": ["flood", 5, "urgent"],
        "latitude": "40.71",
        "longitude": -74.0,
        "created_at": "2025-06-01T10:00:00Z"
    }))
    .unwrap();
    assert_eq!(disaster.id, DisasterId::from("3"));
    assert_eq!(disaster.tags, vec!["flood".to_owned(), "urgent".to_owned()]);
    assert_eq!(disaster.latitude, Some(40.71));
    assert_eq!(disaster.longitude, Some(-74.0));
    assert!(disaster.description.is_none());
}

#[test]
fn parse_reports_tolerates_missing_list() {
    assert!(parse_reports(None).is_empty());
    assert!(parse_reports(Some(&json!({"reports": "nope"}))).is_empty());
    let reports = parse_reports(Some(&json!({"reports": [{"text": "need water", "timestamp": 1700000000}]})));
    assert_eq!(reports.len(), 1);
    assert_eq!(reports[0].text.as_deref(), Some("need water"));
    assert_eq!(reports[0].timestamp.as_deref(), Some("1700000000"));
}

#[test]
fn resource_display_location_prefers_location_name() {
    let resources = parse_resources(Some(&json!({"resources": [
        {"name": "Shelter", "type": "shelter", "location_name": "Lower East Side", "location": "POINT(1 2)"},
        {"name": "Clinic", "location": "Midtown", "distance": 120.5}
    ]})));
    assert_eq!(resources[0].kind.as_deref(), Some("shelter"));
    assert_eq!(resources[0].display_location(), Some("Lower East Side"));
    assert_eq!(resources[1].display_location(), Some("Midtown"));
    assert_eq!(resources[1].distance, Some(120.5));
}

#[test]
fn parse_disasters_skips_items_without_id() {
    let list = parse_disasters(Some(&json!([{"id": 1}, {"title": "no id"}, {"id": "b"}])));
    assert_eq!(list.len(), 2);
}

#[test]
fn created_disaster_read_from_envelope() {
    let payload = json!({"disaster": {"id": 42, "latitude": 5.0, "longitude": 12.0}});
    let disaster = parse_created_disaster(Some(&payload)).unwrap();
    assert_eq!(disaster.id.as_str(), "42");
    assert_eq!(disaster.latitude, Some(5.0));
    assert!(parse_created_disaster(Some(&json!({"message": "ok"}))).is_none());
}

// =============================================================
// Catalog
// =============================================================

#[test]
fn catalog_sorts_newest_first_and_dedupes_tags() {
    let disasters = parse_disasters(Some(&json!([
        {"id": 1, "tags": ["flood", "urgent"], "created_at": "2025-01-01T00:00:00Z"},
        {"id": 2, "tags": ["earthquake"], "created_at": "2025-03-01T00:00:00Z"},
        {"id": 3, "tags": ["flood"]}
    ])));
    let catalog = Catalog::from_disasters(disasters);
    let ids: Vec<&str> = catalog.disasters.iter().map(|d| d.id.as_str()).collect();
    assert_eq!(ids, vec!["2", "1", "3"]);
    assert_eq!(catalog.tags, vec!["earthquake", "flood", "urgent"]);
}

// =============================================================
// Geocoding
// =============================================================

#[test]
fn geocode_lng_and_location_name_are_normalized() {
    let result = normalize_geocode(Some(&json!({"coordinates": {"lng": 12, "lat": 5}, "location_name": "X"})));
    assert_eq!(result.coordinates.lon, Some(12.0));
    assert_eq!(result.coordinates.lat, Some(5.0));
    assert_eq!(result.location.as_deref(), Some("X"));
}

#[test]
fn geocode_longitud_variant_is_normalized() {
    let result = normalize_geocode(Some(&json!({"coordinates": {"longitud": -3.7, "lat": 40.4}, "location": "Madrid"})));
    assert_eq!(result.coordinates.pair(), Some((40.4, -3.7)));
    assert_eq!(result.location.as_deref(), Some("Madrid"));
}

#[test]
fn geocode_alternate_longitude_keys_take_precedence_over_lon() {
    let result = normalize_geocode(Some(&json!({"coordinates": {"lon": 1.0, "lng": 12.0, "lat": 5}})));
    assert_eq!(result.coordinates.lon, Some(12.0));
    let result = normalize_geocode(Some(&json!({"coordinates": {"lon": 1.0, "longitud": -3.7, "lat": 5}})));
    assert_eq!(result.coordinates.lon, Some(-3.7));
}

#[test]
fn geocode_without_coordinates_is_all_none() {
    let result = normalize_geocode(Some(&json!({"location_name": "Nowhere"})));
    assert_eq!(result.coordinates, Coordinates { lat: None, lon: None });
    assert!(result.coordinates.pair().is_none());

    let empty = normalize_geocode(None);
    assert_eq!(empty, GeocodeResult::default());
}

#[test]
fn geocode_missing_lat_is_none() {
    let result = normalize_geocode(Some(&json!({"coordinates": {"lon": 1.0}})));
    assert_eq!(result.coordinates.lat, None);
    assert_eq!(result.coordinates.lon, Some(1.0));
}

#[test]
fn normalized_geocode_serializes_with_null_axes() {
    let result = normalize_geocode(Some(&json!({})));
    assert_eq!(
        serde_json::to_value(&result).unwrap(),
        json!({"coordinates": {"lat": null, "lon": null}, "location": null})
    );
}

// =============================================================
// Push events
// =============================================================

#[test]
fn push_event_parses_known_names() {
    let event = PushEvent::from_wire("resources_updated", &json!({"disasterId": 9})).unwrap();
    assert_eq!(event.kind(), PushEventKind::ResourcesUpdated);
    assert_eq!(event.disaster_id().as_str(), "9");
}

#[test]
fn push_event_rejects_unknown_names_and_missing_ids() {
    assert!(PushEvent::from_wire("chat_message", &json!({"disasterId": 1})).is_none());
    assert!(PushEvent::from_wire("disaster_updated", &json!({})).is_none());
}

#[test]
fn push_event_kind_names_round_trip() {
    for kind in PushEventKind::ALL {
        assert_eq!(PushEventKind::from_event_name(kind.event_name()), Some(kind));
    }
}

// =============================================================
// Drafts
// =============================================================

#[test]
fn parse_tags_splits_and_drops_blanks() {
    assert_eq!(DisasterDraft::parse_tags(" flood, ,urgent ,"), vec!["flood", "urgent"]);
}

#[test]
fn trimmed_draft_strips_whitespace() {
    let draft = DisasterDraft {
        title: "  NYC Flood ".to_owned(),
        location: " Manhattan".to_owned(),
        description: String::new(),
        tags: vec![" flood ".to_owned(), " ".to_owned()],
    };
    let trimmed = draft.trimmed();
    assert_eq!(trimmed.title, "NYC Flood");
    assert_eq!(trimmed.location, "Manhattan");
    assert_eq!(trimmed.tags, vec!["flood"]);
}
