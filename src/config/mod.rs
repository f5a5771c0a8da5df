pub mod cli;
pub mod toml_config;

#[cfg(feature = "cli")]
use crate::core::layers::{BaseLayerKind, MapSettings, DEFAULT_TITLE};
#[cfg(feature = "cli")]
use crate::core::output::OUTPUT_FORMATS;
#[cfg(feature = "cli")]
use crate::core::ConfigProvider;
#[cfg(feature = "cli")]
use crate::domain::model::OverlayKind;
#[cfg(feature = "cli")]
use crate::domain::style::PaletteKind;
#[cfg(feature = "cli")]
use crate::utils::error::Result;
#[cfg(feature = "cli")]
use crate::utils::validation::{self, Validate};
#[cfg(feature = "cli")]
use clap::Parser;
#[cfg(feature = "cli")]
use serde::{Deserialize, Serialize};

pub const DEFAULT_ALL_WEEK_URL: &str =
    "https://earthquake.usgs.gov/earthquakes/feed/v1.0/summary/all_week.geojson";
pub const DEFAULT_MAJOR_WEEK_URL: &str =
    "https://earthquake.usgs.gov/earthquakes/feed/v1.0/summary/4.5_week.geojson";
pub const DEFAULT_PLATES_URL: &str =
    "https://raw.githubusercontent.com/fraxen/tectonicplates/master/GeoJSON/PB2002_boundaries.json";
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Tile provider token is read from here when not given explicitly.
pub const ACCESS_TOKEN_ENV: &str = "MAPBOX_API_KEY";

#[cfg(feature = "cli")]
#[derive(Debug, Clone, Serialize, Deserialize, Parser)]
#[command(name = "quake-map")]
#[command(about = "Build an earthquake and tectonic plate web map from USGS GeoJSON feeds")]
pub struct CliConfig {
    #[arg(long, default_value = DEFAULT_ALL_WEEK_URL)]
    pub all_week_url: String,

    #[arg(long, default_value = DEFAULT_MAJOR_WEEK_URL)]
    pub major_week_url: String,

    #[arg(long, default_value = DEFAULT_PLATES_URL)]
    pub plates_url: String,

    #[arg(long, default_value = "", help = "Mapbox access token (falls back to $MAPBOX_API_KEY)")]
    pub access_token: String,

    #[arg(long, default_value = "./output")]
    pub output_path: String,

    #[arg(long, value_delimiter = ',', default_value = "html,json")]
    pub formats: Vec<String>,

    #[arg(long, help = "Write every output into this zip file")]
    pub bundle: Option<String>,

    #[arg(long, default_value = "general")]
    pub earthquake_palette: String,

    #[arg(long, default_value = "major")]
    pub major_palette: String,

    #[arg(long, default_value = "streets")]
    pub base_layer: String,

    #[arg(long, default_value_t = 40.7, allow_negative_numbers = true)]
    pub center_lat: f64,

    #[arg(long, default_value_t = -94.5, allow_negative_numbers = true)]
    pub center_lng: f64,

    #[arg(long, default_value_t = 3)]
    pub zoom: u8,

    #[arg(long, default_value = DEFAULT_TITLE)]
    pub title: String,

    #[arg(long, default_value_t = DEFAULT_TIMEOUT_SECS)]
    pub timeout_secs: u64,

    #[arg(long, help = "Enable verbose output")]
    pub verbose: bool,

    #[arg(long, help = "Log phase timings and memory usage")]
    pub monitor: bool,

    #[arg(long, help = "Emit JSON log lines")]
    pub json_logs: bool,
}

#[cfg(feature = "cli")]
impl CliConfig {
    /// 未指定 `--access-token` 時改用環境變數
    pub fn resolve_access_token(&mut self) {
        if self.access_token.trim().is_empty() {
            if let Ok(token) = std::env::var(ACCESS_TOKEN_ENV) {
                self.access_token = token;
            }
        }
    }
}

#[cfg(feature = "cli")]
impl ConfigProvider for CliConfig {
    fn feed_url(&self, kind: OverlayKind) -> &str {
        match kind {
            OverlayKind::Earthquakes => &self.all_week_url,
            OverlayKind::MajorEarthquakes => &self.major_week_url,
            OverlayKind::TectonicPlates => &self.plates_url,
        }
    }

    fn output_path(&self) -> &str {
        &self.output_path
    }

    fn output_formats(&self) -> &[String] {
        &self.formats
    }

    fn bundle_filename(&self) -> Option<&str> {
        self.bundle.as_deref()
    }

    fn request_timeout_secs(&self) -> u64 {
        self.timeout_secs
    }

    fn map_settings(&self) -> Result<MapSettings> {
        Ok(MapSettings {
            title: self.title.clone(),
            access_token: self.access_token.clone(),
            center: [self.center_lat, self.center_lng],
            zoom: self.zoom,
            default_base: self.base_layer.parse::<BaseLayerKind>()?,
            earthquake_palette: self.earthquake_palette.parse::<PaletteKind>()?,
            major_palette: self.major_palette.parse::<PaletteKind>()?,
        })
    }
}

#[cfg(feature = "cli")]
impl Validate for CliConfig {
    fn validate(&self) -> Result<()> {
        validation::validate_url("all_week_url", &self.all_week_url)?;
        validation::validate_url("major_week_url", &self.major_week_url)?;
        validation::validate_url("plates_url", &self.plates_url)?;
        validation::validate_non_empty_string("access_token", &self.access_token)?;
        validation::validate_path("output_path", &self.output_path)?;
        validation::validate_choices("formats", &self.formats, &OUTPUT_FORMATS)?;
        if let Some(bundle) = &self.bundle {
            validation::validate_path("bundle", bundle)?;
        }
        validation::validate_range("center_lat", self.center_lat, -90.0, 90.0)?;
        validation::validate_range("center_lng", self.center_lng, -180.0, 180.0)?;
        validation::validate_range("zoom", self.zoom, 0, crate::core::layers::MAX_ZOOM)?;
        validation::validate_positive_number("timeout_secs", self.timeout_secs, 1)?;
        // 調色盤與底圖名稱在 map_settings() 解析
        self.map_settings().map(|_| ())
    }
}
