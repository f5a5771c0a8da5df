//! Magnitude to marker style.
//!
//! A [`Palette`] is an ascending list of [`StyleBucket`]s. Every bucket except
//! the first is selected with a strict `>` against its lower bound, scanning
//! from the highest bucket down; the first bucket catches whatever is left
//! (zero, negatives, missing values). The same table feeds the legend.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::utils::error::MapError;

/// Radius used when the linear scale would produce a degenerate marker.
pub const MIN_RADIUS: f64 = 1.0;

/// Marker radius units per unit of magnitude.
pub const RADIUS_SCALE: f64 = 4.0;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StyleBucket {
    pub lower_bound: f64,
    pub color: String,
}

impl StyleBucket {
    fn new(lower_bound: f64, color: &str) -> Self {
        Self {
            lower_bound,
            color: color.to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PaletteKind {
    General,
    Major,
}

impl PaletteKind {
    pub const NAMES: [&'static str; 2] = ["general", "major"];

    pub fn palette(self) -> Palette {
        match self {
            PaletteKind::General => Palette::general(),
            PaletteKind::Major => Palette::major(),
        }
    }
}

impl fmt::Display for PaletteKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PaletteKind::General => write!(f, "general"),
            PaletteKind::Major => write!(f, "major"),
        }
    }
}

impl FromStr for PaletteKind {
    type Err = MapError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "general" => Ok(PaletteKind::General),
            "major" => Ok(PaletteKind::Major),
            other => Err(MapError::InvalidConfigValueError {
                field: "palette".to_string(),
                value: other.to_string(),
                reason: format!("Unknown palette. Allowed: {}", PaletteKind::NAMES.join(", ")),
            }),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Palette {
    kind: PaletteKind,
    buckets: Vec<StyleBucket>,
}

impl Palette {
    /// The six-bucket table used for the weekly feed and the main legend.
    pub fn general() -> Self {
        Self {
            kind: PaletteKind::General,
            buckets: vec![
                StyleBucket::new(0.0, "#98ee00"),
                StyleBucket::new(1.0, "#d4ee00"),
                StyleBucket::new(2.0, "#eecc00"),
                StyleBucket::new(3.0, "#ee9c00"),
                StyleBucket::new(4.0, "#ea822c"),
                StyleBucket::new(5.0, "#ea2c2c"),
            ],
        }
    }

    /// Table for the 4.5+ feed; the first bound is only a legend label.
    pub fn major() -> Self {
        Self {
            kind: PaletteKind::Major,
            buckets: vec![
                StyleBucket::new(4.5, "#ea822c"),
                StyleBucket::new(5.0, "#ea2c2c"),
                StyleBucket::new(6.0, "#c71585"),
                StyleBucket::new(7.0, "#800080"),
            ],
        }
    }

    pub fn kind(&self) -> PaletteKind {
        self.kind
    }

    pub fn buckets(&self) -> &[StyleBucket] {
        &self.buckets
    }

    pub fn bucket_for(&self, magnitude: f64) -> &StyleBucket {
        self.buckets
            .iter()
            .skip(1)
            .rev()
            .find(|bucket| magnitude > bucket.lower_bound)
            .unwrap_or(&self.buckets[0])
    }

    pub fn color_for(&self, magnitude: f64) -> &str {
        &self.bucket_for(magnitude).color
    }

    /// `None` (no usable `mag` on the feature) gets the lowest bucket.
    pub fn color_for_optional(&self, magnitude: Option<f64>) -> &str {
        match magnitude {
            Some(m) if m.is_finite() => self.color_for(m),
            _ => &self.buckets[0].color,
        }
    }
}

pub fn radius_for(magnitude: f64) -> f64 {
    if magnitude == 0.0 {
        return MIN_RADIUS;
    }
    magnitude * RADIUS_SCALE
}

pub fn radius_for_optional(magnitude: Option<f64>) -> f64 {
    match magnitude {
        Some(m) if m.is_finite() => radius_for(m),
        _ => MIN_RADIUS,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const GENERAL_COLORS: [&str; 6] = [
        "#98ee00", "#d4ee00", "#eecc00", "#ee9c00", "#ea822c", "#ea2c2c",
    ];

    #[test]
    fn test_general_palette_scenarios() {
        let palette = Palette::general();
        assert_eq!(palette.color_for(5.2), "#ea2c2c");
        assert_eq!(radius_for(5.2), 5.2 * 4.0);
        assert_eq!(palette.color_for(0.0), "#98ee00");
        assert_eq!(radius_for(0.0), 1.0);
        // 等於門檻值不會進入該區間
        assert_eq!(palette.color_for(4.0), "#ee9c00");
        assert_eq!(palette.color_for(5.0), "#ea822c");
        assert_eq!(palette.color_for(1.0), "#98ee00");
        assert_eq!(palette.color_for(-1.3), "#98ee00");
        assert_eq!(palette.color_for(9.1), "#ea2c2c");
    }

    #[test]
    fn test_color_partition_is_exclusive() {
        let palette = Palette::general();
        let bounds: Vec<f64> = palette.buckets().iter().map(|b| b.lower_bound).collect();

        let mut m = -2.0;
        while m <= 8.0 {
            let color = palette.color_for(m);
            assert!(GENERAL_COLORS.contains(&color));

            let idx = GENERAL_COLORS.iter().position(|c| *c == color).unwrap();
            if idx > 0 {
                assert!(m > bounds[idx], "m={} should exceed {}", m, bounds[idx]);
            }
            for higher in (idx + 1)..bounds.len() {
                assert!(!(m > bounds[higher]), "m={} also matches bucket {}", m, higher);
            }
            m += 0.05;
        }
    }

    #[test]
    fn test_radius_is_linear_except_zero() {
        for m in [-1.5, 0.1, 1.0, 2.5, 4.5, 7.8] {
            assert_eq!(radius_for(m), m * 4.0);
        }
        assert_eq!(radius_for(0.0), MIN_RADIUS);
        assert_eq!(radius_for(-0.0), MIN_RADIUS);
    }

    #[test]
    fn test_missing_magnitude_falls_back() {
        let palette = Palette::general();
        assert_eq!(palette.color_for_optional(None), "#98ee00");
        assert_eq!(palette.color_for_optional(Some(f64::NAN)), "#98ee00");
        assert_eq!(radius_for_optional(None), MIN_RADIUS);
        assert_eq!(radius_for_optional(Some(3.0)), 12.0);
    }

    #[test]
    fn test_major_palette_is_reachable() {
        let palette = Palette::major();
        assert_eq!(palette.color_for(4.6), "#ea822c");
        assert_eq!(palette.color_for(5.5), "#ea2c2c");
        assert_eq!(palette.color_for(6.1), "#c71585");
        assert_eq!(palette.color_for(7.4), "#800080");
        assert_eq!(palette.color_for(2.0), "#ea822c");
    }

    #[test]
    fn test_palettes_are_strictly_ascending() {
        for palette in [Palette::general(), Palette::major()] {
            assert!(palette
                .buckets()
                .windows(2)
                .all(|w| w[0].lower_bound < w[1].lower_bound));
        }
    }

    #[test]
    fn test_palette_kind_parsing() {
        assert_eq!("Major".parse::<PaletteKind>().unwrap(), PaletteKind::Major);
        assert_eq!(" general ".parse::<PaletteKind>().unwrap(), PaletteKind::General);
        assert!("magenta".parse::<PaletteKind>().is_err());
    }
}
