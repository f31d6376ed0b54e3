//! Wire DTOs for the disaster-response REST API and push events.
//!
//! DESIGN
//! ======
//! The backend is loose about number/string types (ids arrive as either,
//! coordinates sometimes as numeric strings) and about field names across
//! versions. Deserializers here accept every observed variant and normalize
//! them, so the rest of the crate only sees one shape.

#[cfg(test)]
#[path = "types_test.rs"]
mod types_test;

use std::collections::BTreeSet;
use std::fmt;

use serde::de::{DeserializeOwned, Error as _};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;

// =============================================================================
// IDS
// =============================================================================

/// Stable server-assigned disaster identifier.
///
/// Serialized as a string; deserialized from either a string or an integer.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DisasterId(String);

impl DisasterId {
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Interpret a JSON value as an id. Empty strings are not ids.
    #[must_use]
    pub fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::String(s) if !s.trim().is_empty() => Some(Self(s.trim().to_owned())),
            Value::Number(n) => {
                if let Some(int) = n.as_i64() {
                    Some(Self(int.to_string()))
                } else {
                    n.as_u64().map(|int| Self(int.to_string()))
                }
            }
            _ => None,
        }
    }
}

impl fmt::Display for DisasterId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for DisasterId {
    fn from(value: &str) -> Self {
        Self(value.to_owned())
    }
}

impl From<String> for DisasterId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl Serialize for DisasterId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.0)
    }
}

impl<'de> Deserialize<'de> for DisasterId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = Value::deserialize(deserializer)?;
        Self::from_value(&value).ok_or_else(|| D::Error::custom("expected string or integer disaster id"))
    }
}

// =============================================================================
// RECORDS
// =============================================================================

/// A disaster record as returned by `/api/disasters`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Disaster {
    pub id: DisasterId,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default, deserialize_with = "deserialize_tags")]
    pub tags: Vec<String>,
    #[serde(default, deserialize_with = "deserialize_optional_f64")]
    pub latitude: Option<f64>,
    #[serde(default, deserialize_with = "deserialize_optional_f64")]
    pub longitude: Option<f64>,
    /// ISO-8601 creation timestamp.
    #[serde(default)]
    pub created_at: Option<String>,
}

/// A social-media report attached to a disaster.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct SocialReport {
    #[serde(default, deserialize_with = "deserialize_optional_string")]
    pub text: Option<String>,
    #[serde(default, deserialize_with = "deserialize_optional_string")]
    pub image_url: Option<String>,
    #[serde(default, deserialize_with = "deserialize_optional_string")]
    pub author: Option<String>,
    #[serde(default, deserialize_with = "deserialize_optional_string")]
    pub timestamp: Option<String>,
    #[serde(default, deserialize_with = "deserialize_optional_string")]
    pub uri: Option<String>,
    #[serde(default, deserialize_with = "deserialize_optional_string")]
    pub cid: Option<String>,
}

/// A relief resource near the selected coordinates.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Resource {
    #[serde(default, deserialize_with = "deserialize_optional_string")]
    pub name: Option<String>,
    #[serde(rename = "type", default, deserialize_with = "deserialize_optional_string")]
    pub kind: Option<String>,
    #[serde(default, deserialize_with = "deserialize_optional_string")]
    pub location_name: Option<String>,
    #[serde(default, deserialize_with = "deserialize_optional_string")]
    pub location: Option<String>,
    #[serde(default, deserialize_with = "deserialize_optional_string")]
    pub availability: Option<String>,
    #[serde(default, deserialize_with = "deserialize_optional_string")]
    pub contact: Option<String>,
    /// Distance from the query point in meters.
    #[serde(default, deserialize_with = "deserialize_optional_f64")]
    pub distance: Option<f64>,
    #[serde(default, deserialize_with = "deserialize_optional_string")]
    pub created_at: Option<String>,
}

impl Resource {
    /// Display location, preferring the human-readable name.
    #[must_use]
    pub fn display_location(&self) -> Option<&str> {
        self.location_name.as_deref().or(self.location.as_deref())
    }
}

/// An official update posted for a disaster.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct OfficialUpdate {
    #[serde(default, deserialize_with = "deserialize_optional_string")]
    pub title: Option<String>,
    #[serde(default, deserialize_with = "deserialize_optional_string")]
    pub content: Option<String>,
    #[serde(default, deserialize_with = "deserialize_optional_string")]
    pub author: Option<String>,
    #[serde(default, deserialize_with = "deserialize_optional_string")]
    pub timestamp: Option<String>,
}

/// Parse the disaster list payload. Malformed items are skipped.
#[must_use]
pub fn parse_disasters(payload: Option<&Value>) -> Vec<Disaster> {
    parse_items(payload)
}

/// Parse `{ "reports": [...] }`. Anything else is an empty list.
#[must_use]
pub fn parse_reports(payload: Option<&Value>) -> Vec<SocialReport> {
    parse_items(payload.and_then(|v| v.get("reports")))
}

/// Parse `{ "resources": [...] }`. Anything else is an empty list.
#[must_use]
pub fn parse_resources(payload: Option<&Value>) -> Vec<Resource> {
    parse_items(payload.and_then(|v| v.get("resources")))
}

/// Parse the bare array returned by the updates endpoint.
#[must_use]
pub fn parse_updates(payload: Option<&Value>) -> Vec<OfficialUpdate> {
    parse_items(payload)
}

fn parse_items<T: DeserializeOwned>(payload: Option<&Value>) -> Vec<T> {
    payload
        .and_then(Value::as_array)
        .map(|items| {
            items
                .iter()
                .filter_map(|item| serde_json::from_value::<T>(item.clone()).ok())
                .collect()
        })
        .unwrap_or_default()
}

/// Disaster returned inside the `{ "disaster": {...} }` creation envelope.
#[must_use]
pub fn parse_created_disaster(payload: Option<&Value>) -> Option<Disaster> {
    let disaster = payload?.get("disaster")?;
    serde_json::from_value(disaster.clone()).ok()
}

// =============================================================================
// CATALOG
// =============================================================================

/// Every known disaster (newest first) and the union of their tags.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Catalog {
    pub disasters: Vec<Disaster>,
    pub tags: Vec<String>,
}

impl Catalog {
    #[must_use]
    pub fn from_disasters(mut disasters: Vec<Disaster>) -> Self {
        sort_newest_first(&mut disasters);
        let tags = disasters
            .iter()
            .flat_map(|d| d.tags.iter().cloned())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();
        Self { disasters, tags }
    }
}

/// Order by `created_at` descending; records without a timestamp sink last.
///
/// Timestamps are ISO-8601 so lexical order is chronological order.
pub fn sort_newest_first(disasters: &mut [Disaster]) {
    disasters.sort_by(|a, b| match (&a.created_at, &b.created_at) {
        (Some(a), Some(b)) => b.cmp(a),
        (Some(_), None) => std::cmp::Ordering::Less,
        (None, Some(_)) => std::cmp::Ordering::Greater,
        (None, None) => std::cmp::Ordering::Equal,
    });
}

// =============================================================================
// GEOCODING
// =============================================================================

#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize)]
pub struct Coordinates {
    pub lat: Option<f64>,
    pub lon: Option<f64>,
}

impl Coordinates {
    /// Both axes, when both are known.
    #[must_use]
    pub fn pair(&self) -> Option<(f64, f64)> {
        self.lat.zip(self.lon)
    }
}

/// Normalized geocoder response.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct GeocodeResult {
    pub coordinates: Coordinates,
    pub location: Option<String>,
}

/// Normalize the geocoder's response variants into one shape.
///
/// `lng` and `longitud` become `lon` and win over a plain `lon`;
/// `location_name` becomes `location`; any missing axis is `None`.
#[must_use]
pub fn normalize_geocode(payload: Option<&Value>) -> GeocodeResult {
    let coordinates = payload
        .and_then(|v| v.get("coordinates"))
        .filter(|c| c.is_object())
        .map(|c| Coordinates {
            lat: c.get("lat").and_then(value_as_f64),
            lon: ["lng", "longitud", "lon"]
                .iter()
                .find_map(|key| c.get(*key).and_then(value_as_f64)),
        })
        .unwrap_or_default();

    let location = payload.and_then(|v| {
        ["location_name", "location"]
            .iter()
            .find_map(|key| v.get(*key).and_then(Value::as_str))
            .map(ToOwned::to_owned)
    });

    GeocodeResult { coordinates, location }
}

// =============================================================================
// PUSH EVENTS
// =============================================================================

/// Category of a push notification; each has its own debounce window.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum PushEventKind {
    DisasterUpdated,
    SocialMediaUpdated,
    ResourcesUpdated,
}

impl PushEventKind {
    pub const ALL: [Self; 3] = [Self::DisasterUpdated, Self::SocialMediaUpdated, Self::ResourcesUpdated];

    /// Event name on the wire.
    #[must_use]
    pub fn event_name(self) -> &'static str {
        match self {
            Self::DisasterUpdated => "disaster_updated",
            Self::SocialMediaUpdated => "social_media_updated",
            Self::ResourcesUpdated => "resources_updated",
        }
    }

    #[must_use]
    pub fn from_event_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.event_name() == name)
    }
}

/// Server notification that some view of a disaster changed.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum PushEvent {
    DisasterUpdated { disaster_id: DisasterId },
    SocialMediaUpdated { disaster_id: DisasterId },
    ResourcesUpdated { disaster_id: DisasterId },
}

impl PushEvent {
    #[must_use]
    pub fn new(kind: PushEventKind, disaster_id: DisasterId) -> Self {
        match kind {
            PushEventKind::DisasterUpdated => Self::DisasterUpdated { disaster_id },
            PushEventKind::SocialMediaUpdated => Self::SocialMediaUpdated { disaster_id },
            PushEventKind::ResourcesUpdated => Self::ResourcesUpdated { disaster_id },
        }
    }

    /// Build from an event name and its payload (`{ "disasterId": ... }`).
    ///
    /// Returns `None` for unknown events or payloads without an id.
    #[must_use]
    pub fn from_wire(name: &str, payload: &Value) -> Option<Self> {
        let kind = PushEventKind::from_event_name(name)?;
        let disaster_id = payload
            .get("disasterId")
            .or_else(|| payload.get("disaster_id"))
            .and_then(DisasterId::from_value)?;
        Some(Self::new(kind, disaster_id))
    }

    #[must_use]
    pub fn kind(&self) -> PushEventKind {
        match self {
            Self::DisasterUpdated { .. } => PushEventKind::DisasterUpdated,
            Self::SocialMediaUpdated { .. } => PushEventKind::SocialMediaUpdated,
            Self::ResourcesUpdated { .. } => PushEventKind::ResourcesUpdated,
        }
    }

    #[must_use]
    pub fn disaster_id(&self) -> &DisasterId {
        match self {
            Self::DisasterUpdated { disaster_id }
            | Self::SocialMediaUpdated { disaster_id }
            | Self::ResourcesUpdated { disaster_id } => disaster_id,
        }
    }
}

// =============================================================================
// REQUEST BODIES
// =============================================================================

/// Fields for creating or updating a disaster.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct DisasterDraft {
    pub title: String,
    pub location: String,
    pub description: String,
    pub tags: Vec<String>,
}

impl DisasterDraft {
    /// Split a comma-separated tag field, dropping blanks.
    #[must_use]
    pub fn parse_tags(raw: &str) -> Vec<String> {
        raw.split(',')
            .map(str::trim)
            .filter(|tag| !tag.is_empty())
            .map(ToOwned::to_owned)
            .collect()
    }

    /// Copy with every text field trimmed.
    #[must_use]
    pub fn trimmed(&self) -> Self {
        Self {
            title: self.title.trim().to_owned(),
            location: self.location.trim().to_owned(),
            description: self.description.trim().to_owned(),
            tags: self.tags.iter().map(|t| t.trim().to_owned()).filter(|t| !t.is_empty()).collect(),
        }
    }
}

/// Operator input for a verification report.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ReportDraft {
    pub content: String,
    pub image_url: Option<String>,
}

/// Body of `POST /api/disasters/{id}/verify-image`.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ReportPayload {
    pub image_url: Option<String>,
    pub report_id: String,
    pub content: String,
}

// =============================================================================
// LENIENT DESERIALIZERS
// =============================================================================

fn value_as_f64(value: &Value) -> Option<f64> {
    let parsed = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    };
    parsed.filter(|f| f.is_finite())
}

fn deserialize_optional_f64<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value.as_ref().and_then(value_as_f64))
}

fn deserialize_optional_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(Value::String(s)) => Some(s),
        Some(Value::Number(n)) => Some(n.to_string()),
        Some(Value::Bool(b)) => Some(b.to_string()),
        _ => None,
    })
}

fn deserialize_tags<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(Value::Array(items)) => items
            .into_iter()
            .filter_map(|item| match item {
                Value::String(s) => Some(s),
                _ => None,
            })
            .collect(),
        _ => Vec::new(),
    })
}
