use chrono::{DateTime, Utc};
use geojson::{feature::Id, Feature, FeatureCollection, Geometry, Value as GeometryValue};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::utils::error::{MapError, Result};

/// The three overlays, one per feed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OverlayKind {
    Earthquakes,
    MajorEarthquakes,
    TectonicPlates,
}

impl OverlayKind {
    pub const ALL: [OverlayKind; 3] = [
        OverlayKind::Earthquakes,
        OverlayKind::MajorEarthquakes,
        OverlayKind::TectonicPlates,
    ];

    /// Name shown in the layer control.
    pub fn display_name(self) -> &'static str {
        match self {
            OverlayKind::Earthquakes => "Earthquakes",
            OverlayKind::MajorEarthquakes => "Major Earthquakes",
            OverlayKind::TectonicPlates => "Tectonic Plates",
        }
    }

    pub fn file_stem(self) -> &'static str {
        match self {
            OverlayKind::Earthquakes => "earthquakes",
            OverlayKind::MajorEarthquakes => "major_earthquakes",
            OverlayKind::TectonicPlates => "tectonic_plates",
        }
    }

    pub fn carries_magnitude(self) -> bool {
        !matches!(self, OverlayKind::TectonicPlates)
    }
}

impl fmt::Display for OverlayKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct LngLat {
    pub longitude: f64,
    pub latitude: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EarthquakeRecord {
    pub id: Option<String>,
    /// `None` when `properties.mag` is missing, null or not a number.
    pub magnitude: Option<f64>,
    pub place: String,
    pub location: LngLat,
    pub depth_km: Option<f64>,
    pub time: Option<DateTime<Utc>>,
}

pub const UNKNOWN_PLACE: &str = "Unknown location";

impl EarthquakeRecord {
    pub fn from_feature(feature: &Feature) -> Result<Self> {
        let coords = match feature.geometry.as_ref().map(|g| &g.value) {
            Some(GeometryValue::Point(coords)) => coords,
            Some(_) => return Err(processing("earthquake feature geometry is not a Point")),
            None => return Err(processing("earthquake feature has no geometry")),
        };
        if coords.len() < 2 {
            return Err(processing("Point geometry needs at least [lon, lat]"));
        }

        let magnitude = property(feature, "mag").and_then(|v| v.as_f64());
        let place = property(feature, "place")
            .and_then(|v| v.as_str())
            .unwrap_or(UNKNOWN_PLACE)
            .to_string();
        let time = property(feature, "time")
            .and_then(|v| v.as_i64())
            .and_then(DateTime::<Utc>::from_timestamp_millis);

        Ok(Self {
            id: feature.id.as_ref().map(id_to_string),
            magnitude,
            place,
            location: LngLat {
                longitude: coords[0],
                latitude: coords[1],
            },
            depth_km: coords.get(2).copied(),
            time,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlateBoundaryRecord {
    pub name: Option<String>,
    pub geometry: Geometry,
}

impl PlateBoundaryRecord {
    pub fn from_feature(feature: &Feature) -> Result<Self> {
        let geometry = feature
            .geometry
            .clone()
            .ok_or_else(|| processing("plate boundary feature has no geometry"))?;

        let name = feature
            .properties
            .as_ref()
            .and_then(|p| p.get("Name").or_else(|| p.get("name")))
            .and_then(|v| v.as_str())
            .map(str::to_string);

        Ok(Self { name, geometry })
    }
}

#[derive(Debug, Clone)]
pub enum FeedPayload {
    Earthquakes(Vec<EarthquakeRecord>),
    PlateBoundaries(Vec<PlateBoundaryRecord>),
}

impl FeedPayload {
    /// 依 feed 種類解析，無法使用的 feature 直接略過並計數
    pub fn from_collection(kind: OverlayKind, collection: &FeatureCollection) -> (Self, usize) {
        let mut skipped = 0;
        let payload = if kind.carries_magnitude() {
            let records = collection
                .features
                .iter()
                .filter_map(|f| match EarthquakeRecord::from_feature(f) {
                    Ok(record) => Some(record),
                    Err(e) => {
                        tracing::warn!("⚠️ Skipping {} feature: {}", kind, e);
                        skipped += 1;
                        None
                    }
                })
                .collect();
            FeedPayload::Earthquakes(records)
        } else {
            let records = collection
                .features
                .iter()
                .filter_map(|f| match PlateBoundaryRecord::from_feature(f) {
                    Ok(record) => Some(record),
                    Err(e) => {
                        tracing::warn!("⚠️ Skipping {} feature: {}", kind, e);
                        skipped += 1;
                        None
                    }
                })
                .collect();
            FeedPayload::PlateBoundaries(records)
        };
        (payload, skipped)
    }

    pub fn len(&self) -> usize {
        match self {
            FeedPayload::Earthquakes(records) => records.len(),
            FeedPayload::PlateBoundaries(records) => records.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// What one fetch produced. Each outcome feeds exactly one layer group.
#[derive(Debug, Clone)]
pub enum FeedOutcome {
    Loaded {
        kind: OverlayKind,
        payload: FeedPayload,
        skipped: usize,
    },
    Failed {
        kind: OverlayKind,
        reason: String,
    },
}

impl FeedOutcome {
    pub fn kind(&self) -> OverlayKind {
        match self {
            FeedOutcome::Loaded { kind, .. } | FeedOutcome::Failed { kind, .. } => *kind,
        }
    }

    pub fn is_loaded(&self) -> bool {
        matches!(self, FeedOutcome::Loaded { .. })
    }
}

fn property<'a>(feature: &'a Feature, key: &str) -> Option<&'a serde_json::Value> {
    feature.properties.as_ref().and_then(|p| p.get(key))
}

fn id_to_string(id: &Id) -> String {
    match id {
        Id::String(s) => s.clone(),
        Id::Number(n) => n.to_string(),
    }
}

fn processing(message: &str) -> MapError {
    MapError::ProcessingError {
        message: message.to_string(),
    }
}
