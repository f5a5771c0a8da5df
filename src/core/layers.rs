//! Layer group manager.
//!
//! [`MapState`] is built once by [`MapState::initialize`] and owns everything
//! the page shows: both base layers, the three overlay groups, the legends and
//! a status line per feed. Feed outcomes are appended through
//! [`MapState::populate`]; nothing is ever removed from a group.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::fmt;
use std::str::FromStr;

use crate::core::render::{FeatureRenderer, MapLayer};
use crate::domain::legend::Legend;
use crate::domain::model::{FeedOutcome, FeedPayload, OverlayKind};
use crate::domain::style::PaletteKind;
use crate::utils::error::MapError;

pub const TILE_URL_TEMPLATE: &str =
    "https://api.mapbox.com/styles/v1/mapbox/{style}/tiles/{z}/{x}/{y}?access_token={accessToken}";

pub const TILE_ATTRIBUTION: &str = "Map data &copy; <a href=\"https://www.openstreetmap.org/\">OpenStreetMap</a> contributors, <a href=\"https://creativecommons.org/licenses/by-sa/2.0/\">CC-BY-SA</a>, Imagery (c) <a href=\"https://www.mapbox.com/\">Mapbox</a>";

pub const MAX_ZOOM: u8 = 18;
pub const DEFAULT_CENTER: [f64; 2] = [40.7, -94.5];
pub const DEFAULT_ZOOM: u8 = 3;
pub const DEFAULT_TITLE: &str = "Earthquakes This Week";
pub const LAYER_CONTROL_POSITION: &str = "topright";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum BaseLayerKind {
    Streets,
    Satellite,
}

impl BaseLayerKind {
    pub const ALL: [BaseLayerKind; 2] = [BaseLayerKind::Streets, BaseLayerKind::Satellite];
    pub const NAMES: [&'static str; 2] = ["streets", "satellite"];

    pub fn display_name(self) -> &'static str {
        match self {
            BaseLayerKind::Streets => "Streets",
            BaseLayerKind::Satellite => "Satellite",
        }
    }

    pub fn style_id(self) -> &'static str {
        match self {
            BaseLayerKind::Streets => "streets-v11",
            BaseLayerKind::Satellite => "satellite-streets-v11",
        }
    }
}

impl fmt::Display for BaseLayerKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}

impl FromStr for BaseLayerKind {
    type Err = MapError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "streets" => Ok(BaseLayerKind::Streets),
            "satellite" | "satellite-streets" => Ok(BaseLayerKind::Satellite),
            other => Err(MapError::InvalidConfigValueError {
                field: "base_layer".to_string(),
                value: other.to_string(),
                reason: format!("Unknown base layer. Allowed: {}", Self::NAMES.join(", ")),
            }),
        }
    }
}

/// Everything [`MapState::initialize`] needs; built from configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct MapSettings {
    pub title: String,
    pub access_token: String,
    pub center: [f64; 2],
    pub zoom: u8,
    pub default_base: BaseLayerKind,
    pub earthquake_palette: PaletteKind,
    pub major_palette: PaletteKind,
}

impl Default for MapSettings {
    fn default() -> Self {
        Self {
            title: DEFAULT_TITLE.to_string(),
            access_token: String::new(),
            center: DEFAULT_CENTER,
            zoom: DEFAULT_ZOOM,
            default_base: BaseLayerKind::Streets,
            earthquake_palette: PaletteKind::General,
            major_palette: PaletteKind::Major,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MapView {
    pub center: [f64; 2],
    pub zoom: u8,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BaseLayer {
    pub kind: BaseLayerKind,
    pub name: String,
    pub url: String,
    pub access_token: String,
    pub max_zoom: u8,
    pub attribution: String,
    pub active: bool,
}

impl BaseLayer {
    fn new(kind: BaseLayerKind, access_token: &str, active: bool) -> Self {
        Self {
            kind,
            name: kind.display_name().to_string(),
            url: TILE_URL_TEMPLATE.replace("{style}", kind.style_id()),
            access_token: access_token.to_string(),
            max_zoom: MAX_ZOOM,
            attribution: TILE_ATTRIBUTION.to_string(),
            active,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LayerGroup {
    pub kind: OverlayKind,
    pub name: String,
    pub visible: bool,
    pub palette: Option<PaletteKind>,
    layers: Vec<MapLayer>,
}

impl LayerGroup {
    fn new(kind: OverlayKind, palette: Option<PaletteKind>) -> Self {
        Self {
            kind,
            name: kind.display_name().to_string(),
            visible: true,
            palette,
            layers: Vec::new(),
        }
    }

    pub fn layers(&self) -> &[MapLayer] {
        &self.layers
    }

    pub fn len(&self) -> usize {
        self.layers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.layers.is_empty()
    }

    fn append_payload(&mut self, payload: FeedPayload) -> usize {
        let palette = self.palette.unwrap_or(PaletteKind::General).palette();
        let renderer = FeatureRenderer::new(&palette);
        let before = self.layers.len();

        match payload {
            FeedPayload::Earthquakes(records) => self.layers.extend(
                records
                    .iter()
                    .map(|r| MapLayer::CircleMarker(renderer.render_earthquake(r))),
            ),
            FeedPayload::PlateBoundaries(records) => self.layers.extend(
                records
                    .iter()
                    .map(|r| MapLayer::Path(renderer.render_boundary(r))),
            ),
        }

        self.layers.len() - before
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FeedStatus {
    pub kind: OverlayKind,
    pub name: String,
    pub loaded: bool,
    pub records: usize,
    pub skipped: usize,
    pub error: Option<String>,
}

impl FeedStatus {
    fn pending(kind: OverlayKind) -> Self {
        Self {
            kind,
            name: kind.display_name().to_string(),
            loaded: false,
            records: 0,
            skipped: 0,
            error: None,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct MapState {
    pub title: String,
    pub generated_at: DateTime<Utc>,
    pub view: MapView,
    pub control_position: String,
    base_layers: Vec<BaseLayer>,
    groups: Vec<LayerGroup>,
    legends: Vec<Legend>,
    feed_status: Vec<FeedStatus>,
}

fn slot(kind: OverlayKind) -> usize {
    match kind {
        OverlayKind::Earthquakes => 0,
        OverlayKind::MajorEarthquakes => 1,
        OverlayKind::TectonicPlates => 2,
    }
}

impl MapState {
    pub fn initialize(settings: &MapSettings) -> Self {
        let base_layers = BaseLayerKind::ALL
            .iter()
            .map(|&kind| BaseLayer::new(kind, &settings.access_token, kind == settings.default_base))
            .collect();

        // 順序必須和 slot() 一致
        let groups = vec![
            LayerGroup::new(OverlayKind::Earthquakes, Some(settings.earthquake_palette)),
            LayerGroup::new(OverlayKind::MajorEarthquakes, Some(settings.major_palette)),
            LayerGroup::new(OverlayKind::TectonicPlates, None),
        ];

        let mut legends = vec![Legend::from_palette(
            &settings.earthquake_palette.palette(),
            None,
        )];
        if settings.major_palette != settings.earthquake_palette {
            legends.push(Legend::from_palette(
                &settings.major_palette.palette(),
                Some(OverlayKind::MajorEarthquakes.display_name()),
            ));
        }

        Self {
            title: settings.title.clone(),
            generated_at: Utc::now(),
            view: MapView {
                center: settings.center,
                zoom: settings.zoom,
            },
            control_position: LAYER_CONTROL_POSITION.to_string(),
            base_layers,
            groups,
            legends,
            feed_status: OverlayKind::ALL.iter().map(|&k| FeedStatus::pending(k)).collect(),
        }
    }

    /// Appends one feed's records to the group named by the outcome's kind.
    pub fn populate(&mut self, outcome: FeedOutcome) {
        let kind = outcome.kind();
        let status = &mut self.feed_status[slot(kind)];

        match outcome {
            FeedOutcome::Loaded { payload, skipped, .. } => {
                let added = self.groups[slot(kind)].append_payload(payload);
                status.loaded = true;
                status.records += added;
                status.skipped += skipped;
                status.error = None;
                tracing::info!("🗺️ {}: {} layers added", kind, added);
            }
            FeedOutcome::Failed { reason, .. } => {
                tracing::warn!("⚠️ {} stays empty: {}", kind, reason);
                status.error = Some(reason);
            }
        }
    }

    pub fn group(&self, kind: OverlayKind) -> &LayerGroup {
        &self.groups[slot(kind)]
    }

    pub fn groups(&self) -> &[LayerGroup] {
        &self.groups
    }

    pub fn base_layers(&self) -> &[BaseLayer] {
        &self.base_layers
    }

    pub fn active_base(&self) -> Option<&BaseLayer> {
        self.base_layers.iter().find(|b| b.active)
    }

    pub fn select_base(&mut self, kind: BaseLayerKind) {
        for layer in &mut self.base_layers {
            layer.active = layer.kind == kind;
        }
    }

    pub fn set_overlay_visible(&mut self, kind: OverlayKind, visible: bool) {
        self.groups[slot(kind)].visible = visible;
    }

    pub fn visible_overlays(&self) -> impl Iterator<Item = &LayerGroup> {
        self.groups.iter().filter(|g| g.visible)
    }

    pub fn legends(&self) -> &[Legend] {
        &self.legends
    }

    pub fn feed_status(&self) -> &[FeedStatus] {
        &self.feed_status
    }

    pub fn marker_count(&self) -> usize {
        self.groups.iter().map(LayerGroup::len).sum()
    }

    /// The `map.json` document the page template reads.
    pub fn to_document(&self) -> Result<String, MapError> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}
