pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

#[cfg(feature = "cli")]
pub use config::CliConfig;
pub use config::{cli::LocalStorage, toml_config::TomlConfig};

pub use core::{
    engine::{MapEngine, RunReport},
    layers::{MapSettings, MapState},
    pipeline::QuakeMapPipeline,
};
pub use domain::style::{radius_for, Palette, PaletteKind};
pub use utils::error::{MapError, Result};
