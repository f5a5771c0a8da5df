use serde::Serialize;

use crate::domain::style::Palette;

pub const LEGEND_POSITION: &str = "bottomright";

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LegendEntry {
    pub color: String,
    pub label: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Legend {
    pub title: Option<String>,
    pub position: String,
    pub entries: Vec<LegendEntry>,
    /// Pre-rendered body of the legend control.
    pub html: String,
}

impl Legend {
    /// One entry per bucket, ascending: `"0–1"`, ..., `"5+"`.
    pub fn from_palette(palette: &Palette, title: Option<&str>) -> Self {
        let buckets = palette.buckets();
        let entries = buckets
            .iter()
            .enumerate()
            .map(|(i, bucket)| {
                let label = match buckets.get(i + 1) {
                    Some(next) => format!("{}–{}", bucket.lower_bound, next.lower_bound),
                    None => format!("{}+", bucket.lower_bound),
                };
                LegendEntry {
                    color: bucket.color.clone(),
                    label,
                }
            })
            .collect();

        let mut legend = Self {
            title: title.map(str::to_string),
            position: LEGEND_POSITION.to_string(),
            entries,
            html: String::new(),
        };
        legend.html = legend.to_html();
        legend
    }

    /// `<div class="info legend">` 的內容，和 Leaflet 範例的 markup 一致
    pub fn to_html(&self) -> String {
        let mut html = String::new();
        if let Some(title) = &self.title {
            html.push_str(&format!("<h4>{}</h4>", title));
        }
        for entry in &self.entries {
            html.push_str(&format!(
                "<i style='background: {}'></i> {}<br>",
                entry.color, entry.label
            ));
        }
        html
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_general_legend_matches_palette() {
        let palette = Palette::general();
        let legend = Legend::from_palette(&palette, None);

        assert_eq!(legend.entries.len(), 6);
        assert_eq!(legend.entries.len(), palette.buckets().len());
        assert_eq!(legend.position, "bottomright");
        for (entry, bucket) in legend.entries.iter().zip(palette.buckets()) {
            assert_eq!(entry.color, bucket.color);
        }
        assert_eq!(legend.entries[0].label, "0–1");
        assert_eq!(legend.entries[4].label, "4–5");
        assert_eq!(legend.entries[5].label, "5+");
    }

    #[test]
    fn test_legend_order_follows_color_thresholds() {
        let palette = Palette::general();
        let legend = Legend::from_palette(&palette, None);
        let probes = [0.5, 1.5, 2.5, 3.5, 4.5, 5.5];

        for (entry, m) in legend.entries.iter().zip(probes) {
            assert_eq!(entry.color, palette.color_for(m));
        }
    }

    #[test]
    fn test_major_legend_labels() {
        let legend = Legend::from_palette(&Palette::major(), Some("Major Earthquakes"));
        let labels: Vec<&str> = legend.entries.iter().map(|e| e.label.as_str()).collect();
        assert_eq!(labels, vec!["4.5–5", "5–6", "6–7", "7+"]);
        assert!(legend.to_html().starts_with("<h4>Major Earthquakes</h4>"));
    }

    #[test]
    fn test_legend_html_has_swatch_per_entry() {
        let html = Legend::from_palette(&Palette::general(), None).to_html();
        assert_eq!(html.matches("<i style=").count(), 6);
        assert!(html.contains("background: #ea2c2c'></i> 5+"));
        assert_eq!(Legend::from_palette(&Palette::general(), None).html, html);
    }
}
