use crate::config::{
    ACCESS_TOKEN_ENV, DEFAULT_ALL_WEEK_URL, DEFAULT_MAJOR_WEEK_URL, DEFAULT_PLATES_URL,
    DEFAULT_TIMEOUT_SECS,
};
use crate::core::layers::{BaseLayerKind, MapSettings, DEFAULT_CENTER, DEFAULT_TITLE, DEFAULT_ZOOM, MAX_ZOOM};
use crate::core::output::{DEFAULT_BUNDLE_FILENAME, OUTPUT_FORMATS};
use crate::core::ConfigProvider;
use crate::domain::model::OverlayKind;
use crate::domain::style::PaletteKind;
use crate::utils::error::{MapError, Result};
use crate::utils::validation::{self, Validate};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TomlConfig {
    pub map: MapConfig,
    #[serde(default)]
    pub feeds: FeedsConfig,
    #[serde(default)]
    pub style: StyleConfig,
    pub output: OutputConfig,
    pub monitoring: Option<MonitoringConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MapConfig {
    #[serde(default = "default_title")]
    pub title: String,
    pub access_token: String,
    #[serde(default = "default_center")]
    pub center: [f64; 2],
    #[serde(default = "default_zoom")]
    pub zoom: u8,
    #[serde(default = "default_base_layer")]
    pub base_layer: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeedsConfig {
    #[serde(default = "default_all_week")]
    pub all_week: String,
    #[serde(default = "default_major_week")]
    pub major_week: String,
    #[serde(default = "default_plates")]
    pub tectonic_plates: String,
    pub timeout_seconds: Option<u64>,
}

impl Default for FeedsConfig {
    fn default() -> Self {
        Self {
            all_week: default_all_week(),
            major_week: default_major_week(),
            tectonic_plates: default_plates(),
            timeout_seconds: None,
        }
    }
}

/// 每個資料集各自選擇調色盤
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StyleConfig {
    #[serde(default = "default_general")]
    pub earthquakes: String,
    #[serde(default = "default_major")]
    pub major_earthquakes: String,
}

impl Default for StyleConfig {
    fn default() -> Self {
        Self {
            earthquakes: default_general(),
            major_earthquakes: default_major(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputConfig {
    pub path: String,
    pub formats: Vec<String>,
    pub bundle: Option<BundleConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BundleConfig {
    pub enabled: bool,
    pub filename: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MonitoringConfig {
    pub enabled: bool,
    pub json_logs: Option<bool>,
}

fn default_title() -> String {
    DEFAULT_TITLE.to_string()
}
fn default_center() -> [f64; 2] {
    DEFAULT_CENTER
}
fn default_zoom() -> u8 {
    DEFAULT_ZOOM
}
fn default_base_layer() -> String {
    "streets".to_string()
}
fn default_all_week() -> String {
    DEFAULT_ALL_WEEK_URL.to_string()
}
fn default_major_week() -> String {
    DEFAULT_MAJOR_WEEK_URL.to_string()
}
fn default_plates() -> String {
    DEFAULT_PLATES_URL.to_string()
}
fn default_general() -> String {
    PaletteKind::General.to_string()
}
fn default_major() -> String {
    PaletteKind::Major.to_string()
}

impl TomlConfig {
    /// 從 TOML 檔案載入配置
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path).map_err(MapError::IoError)?;
        Self::from_toml_str(&content)
    }

    /// 從 TOML 字串解析配置
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let processed_content = Self::substitute_env_vars(content)?;

        toml::from_str(&processed_content).map_err(|e| MapError::ConfigValidationError {
            field: "toml_parsing".to_string(),
            message: format!("TOML parsing error: {}", e),
        })
    }

    /// 替換環境變數 (例如 ${MAPBOX_API_KEY})，不存在的變數保持原樣
    fn substitute_env_vars(content: &str) -> Result<String> {
        let re = Regex::new(r"\$\{([^}]+)\}").map_err(|e| MapError::ConfigError {
            message: format!("env substitution pattern: {}", e),
        })?;

        let result = re.replace_all(content, |caps: &regex::Captures| {
            let var_name = &caps[1];
            std::env::var(var_name).unwrap_or_else(|_| format!("${{{}}}", var_name))
        });

        Ok(result.to_string())
    }

    pub fn validate_config(&self) -> Result<()> {
        validation::validate_url("feeds.all_week", &self.feeds.all_week)?;
        validation::validate_url("feeds.major_week", &self.feeds.major_week)?;
        validation::validate_url("feeds.tectonic_plates", &self.feeds.tectonic_plates)?;
        if let Some(timeout) = self.feeds.timeout_seconds {
            validation::validate_positive_number("feeds.timeout_seconds", timeout, 1)?;
        }

        validation::validate_substituted("map.access_token", &self.map.access_token)?;
        validation::validate_non_empty_string("map.access_token", &self.map.access_token)?;
        validation::validate_range("map.center[0]", self.map.center[0], -90.0, 90.0)?;
        validation::validate_range("map.center[1]", self.map.center[1], -180.0, 180.0)?;
        validation::validate_range("map.zoom", self.map.zoom, 0, MAX_ZOOM)?;

        validation::validate_path("output.path", &self.output.path)?;
        validation::validate_choices("output.formats", &self.output.formats, &OUTPUT_FORMATS)?;
        validation::validate_choices(
            "style",
            &[self.style.earthquakes.clone(), self.style.major_earthquakes.clone()],
            &PaletteKind::NAMES,
        )?;
        if let Some(bundle) = self.bundle_filename() {
            validation::validate_path("output.bundle.filename", bundle)?;
        }

        self.map_settings().map(|_| ())
    }

    pub fn monitoring_enabled(&self) -> bool {
        self.monitoring.as_ref().map(|m| m.enabled).unwrap_or(false)
    }

    pub fn json_logs(&self) -> bool {
        self.monitoring
            .as_ref()
            .and_then(|m| m.json_logs)
            .unwrap_or(false)
    }

    /// 提示使用者 token 應該放在環境變數
    pub fn token_hint() -> String {
        format!("access_token = \"${{{}}}\"", ACCESS_TOKEN_ENV)
    }
}

impl ConfigProvider for TomlConfig {
    fn feed_url(&self, kind: OverlayKind) -> &str {
        match kind {
            OverlayKind::Earthquakes => &self.feeds.all_week,
            OverlayKind::MajorEarthquakes => &self.feeds.major_week,
            OverlayKind::TectonicPlates => &self.feeds.tectonic_plates,
        }
    }

    fn output_path(&self) -> &str {
        &self.output.path
    }

    fn output_formats(&self) -> &[String] {
        &self.output.formats
    }

    fn bundle_filename(&self) -> Option<&str> {
        match &self.output.bundle {
            Some(bundle) if bundle.enabled => {
                Some(bundle.filename.as_deref().unwrap_or(DEFAULT_BUNDLE_FILENAME))
            }
            _ => None,
        }
    }

    fn request_timeout_secs(&self) -> u64 {
        self.feeds.timeout_seconds.unwrap_or(DEFAULT_TIMEOUT_SECS)
    }

    fn map_settings(&self) -> Result<MapSettings> {
        Ok(MapSettings {
            title: self.map.title.clone(),
            access_token: self.map.access_token.clone(),
            center: self.map.center,
            zoom: self.map.zoom,
            default_base: self.map.base_layer.parse::<BaseLayerKind>()?,
            earthquake_palette: self.style.earthquakes.parse::<PaletteKind>()?,
            major_palette: self.style.major_earthquakes.parse::<PaletteKind>()?,
        })
    }
}

impl Validate for TomlConfig {
    fn validate(&self) -> Result<()> {
        self.validate_config()
    }
}
