use geojson::Geometry;
use serde::Serialize;

use crate::domain::model::{EarthquakeRecord, PlateBoundaryRecord};
use crate::domain::style::{radius_for_optional, Palette, MIN_RADIUS};

pub const STROKE_COLOR: &str = "#000000";
pub const STROKE_WEIGHT: f64 = 0.5;

/// Leaflet `circleMarker` path options.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CircleMarkerStyle {
    pub radius: f64,
    pub fill_color: String,
    pub color: String,
    pub weight: f64,
    pub opacity: f64,
    pub fill_opacity: f64,
    pub stroke: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CircleMarker {
    pub id: Option<String>,
    /// `[lat, lng]`, Leaflet order.
    pub lat_lng: [f64; 2],
    pub magnitude: Option<f64>,
    pub place: String,
    pub style: CircleMarkerStyle,
    pub label: Vec<String>,
    pub popup: String,
}

/// Plate boundary geometry; drawn with the library's default path style.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BoundaryPath {
    pub name: Option<String>,
    pub geometry: Geometry,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type")]
pub enum MapLayer {
    CircleMarker(CircleMarker),
    Path(BoundaryPath),
}

pub struct FeatureRenderer<'a> {
    palette: &'a Palette,
}

impl<'a> FeatureRenderer<'a> {
    pub fn new(palette: &'a Palette) -> Self {
        Self { palette }
    }

    pub fn render_earthquake(&self, record: &EarthquakeRecord) -> CircleMarker {
        let color = self.palette.color_for_optional(record.magnitude).to_string();

        let mut radius = radius_for_optional(record.magnitude);
        if radius < 0.0 {
            tracing::debug!(
                "Negative magnitude {:?} at '{}', drawing minimum radius",
                record.magnitude,
                record.place
            );
            radius = MIN_RADIUS;
        }

        let label = vec![
            format!("Magnitude: {}", format_magnitude(record.magnitude)),
            format!("Location: {}", record.place),
        ];
        let popup = label
            .iter()
            .map(|line| escape_html(line))
            .collect::<Vec<_>>()
            .join("<br>");

        CircleMarker {
            id: record.id.clone(),
            lat_lng: [record.location.latitude, record.location.longitude],
            magnitude: record.magnitude,
            place: record.place.clone(),
            style: CircleMarkerStyle {
                radius,
                fill_color: color,
                color: STROKE_COLOR.to_string(),
                weight: STROKE_WEIGHT,
                opacity: 1.0,
                fill_opacity: 1.0,
                stroke: true,
            },
            label,
            popup,
        }
    }

    pub fn render_boundary(&self, record: &PlateBoundaryRecord) -> BoundaryPath {
        BoundaryPath {
            name: record.name.clone(),
            geometry: record.geometry.clone(),
        }
    }
}

pub fn format_magnitude(magnitude: Option<f64>) -> String {
    match magnitude {
        Some(m) => m.to_string(),
        None => "unknown".to_string(),
    }
}

pub fn escape_html(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            _ => escaped.push(c),
        }
    }
    escaped
}
