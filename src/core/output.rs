use geojson::{Feature, FeatureCollection, Geometry, JsonObject, Value as GeometryValue};
use serde::Serialize;
use std::io::Write;
use zip::write::{FileOptions, ZipWriter};

use crate::core::layers::{LayerGroup, MapState};
use crate::core::render::{escape_html, MapLayer};
use crate::domain::model::OverlayKind;
use crate::utils::error::{MapError, Result};

pub const OUTPUT_FORMATS: [&str; 4] = ["html", "json", "geojson", "csv"];
pub const HTML_FILENAME: &str = "index.html";
pub const DOCUMENT_FILENAME: &str = "map.json";
pub const CSV_FILENAME: &str = "earthquakes.csv";
pub const DEFAULT_BUNDLE_FILENAME: &str = "quake_map.zip";

const HTML_TEMPLATE: &str = include_str!("../../templates/map.html");

#[derive(Debug, Clone, PartialEq)]
pub struct OutputFile {
    pub name: String,
    pub bytes: Vec<u8>,
}

impl OutputFile {
    fn new(name: impl Into<String>, bytes: impl Into<Vec<u8>>) -> Self {
        Self {
            name: name.into(),
            bytes: bytes.into(),
        }
    }
}

/// 依設定的格式產生所有輸出檔案 (順序固定)
pub fn build_outputs(state: &MapState, formats: &[String]) -> Result<Vec<OutputFile>> {
    let wants = |format: &str| formats.iter().any(|f| f == format);
    let mut files = Vec::new();

    if wants("html") {
        files.push(OutputFile::new(HTML_FILENAME, render_html(state)?));
    }
    if wants("json") {
        files.push(OutputFile::new(DOCUMENT_FILENAME, state.to_document()?));
    }
    if wants("geojson") {
        for group in state.groups() {
            let name = format!("{}.geojson", group.kind.file_stem());
            files.push(OutputFile::new(name, render_geojson(group)?));
        }
    }
    if wants("csv") {
        files.push(OutputFile::new(CSV_FILENAME, render_csv(state)?));
    }

    if files.is_empty() {
        return Err(MapError::ConfigError {
            message: format!(
                "no output formats selected (choose from {})",
                OUTPUT_FORMATS.join(", ")
            ),
        });
    }
    Ok(files)
}

pub fn render_html(state: &MapState) -> Result<String> {
    // 內嵌 JSON 不可含 `<`，否則 `<!--<script` 會改變 script 區塊的解析狀態
    let document = serde_json::to_string(state)?.replace('<', "\\u003c");
    Ok(HTML_TEMPLATE
        .replace("{{TITLE}}", &escape_html(&state.title))
        .replace("{{MAP_DOCUMENT}}", &document))
}

/// One FeatureCollection per group with the resolved style copied into properties.
pub fn render_geojson(group: &LayerGroup) -> Result<String> {
    let features = group
        .layers()
        .iter()
        .map(|layer| layer_to_feature(group.kind, layer))
        .collect::<Result<Vec<_>>>()?;

    let collection = FeatureCollection {
        bbox: None,
        features,
        foreign_members: None,
    };
    Ok(serde_json::to_string_pretty(&collection)?)
}

fn layer_to_feature(kind: OverlayKind, layer: &MapLayer) -> Result<Feature> {
    let mut properties = JsonObject::new();
    properties.insert("group".to_string(), kind.display_name().into());

    let geometry = match layer {
        MapLayer::CircleMarker(marker) => {
            properties.insert("id".to_string(), serde_json::to_value(&marker.id)?);
            properties.insert("mag".to_string(), serde_json::to_value(marker.magnitude)?);
            properties.insert("place".to_string(), marker.place.clone().into());
            properties.insert("popup".to_string(), marker.popup.clone().into());
            properties.insert("style".to_string(), serde_json::to_value(&marker.style)?);
            let [lat, lng] = marker.lat_lng;
            Geometry::new(GeometryValue::Point(vec![lng, lat]))
        }
        MapLayer::Path(path) => {
            properties.insert("name".to_string(), serde_json::to_value(&path.name)?);
            path.geometry.clone()
        }
    };

    Ok(Feature {
        bbox: None,
        geometry: Some(geometry),
        id: None,
        properties: Some(properties),
        foreign_members: None,
    })
}

#[derive(Debug, Serialize)]
struct CsvRow<'a> {
    group: &'a str,
    id: Option<&'a str>,
    magnitude: Option<f64>,
    place: &'a str,
    latitude: f64,
    longitude: f64,
    color: &'a str,
    radius: f64,
}

/// Earthquake markers from both earthquake groups; plate boundaries are not tabular.
pub fn render_csv(state: &MapState) -> Result<Vec<u8>> {
    let mut writer = csv::Writer::from_writer(Vec::new());

    for group in state.groups() {
        for layer in group.layers() {
            if let MapLayer::CircleMarker(marker) = layer {
                writer.serialize(CsvRow {
                    group: &group.name,
                    id: marker.id.as_deref(),
                    magnitude: marker.magnitude,
                    place: &marker.place,
                    latitude: marker.lat_lng[0],
                    longitude: marker.lat_lng[1],
                    color: &marker.style.fill_color,
                    radius: marker.style.radius,
                })?;
            }
        }
    }

    writer.into_inner().map_err(|e| MapError::ProcessingError {
        message: format!("CSV flush failed: {}", e),
    })
}

pub fn bundle_zip(files: &[OutputFile]) -> Result<Vec<u8>> {
    let mut zip = ZipWriter::new(std::io::Cursor::new(Vec::new()));

    for file in files {
        zip.start_file::<_, ()>(file.name.as_str(), FileOptions::default())?;
        zip.write_all(&file.bytes)?;
    }

    let cursor = zip.finish()?;
    Ok(cursor.into_inner())
}
