use geojson::{FeatureCollection, GeoJson};
use reqwest::Client;
use std::time::Duration;

use crate::domain::model::{FeedOutcome, FeedPayload, OverlayKind};
use crate::utils::error::{MapError, Result};

const USER_AGENT: &str = concat!("quake-map/", env!("CARGO_PKG_VERSION"));

/// Fetches the GeoJSON feeds. One request per feed, no retry.
pub struct FeedLoader {
    client: Client,
}

impl FeedLoader {
    pub fn new(timeout_secs: u64) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .user_agent(USER_AGENT)
            .build()?;
        Ok(Self { client })
    }

    pub async fn fetch_collection(&self, url: &str) -> Result<FeatureCollection> {
        tracing::debug!("Making feed request to: {}", url);
        let response = self.client.get(url).send().await?;
        tracing::debug!("Feed response status: {}", response.status());

        let body = response.error_for_status()?.text().await?;
        parse_collection(&body)
    }

    /// Never fails: a broken feed becomes [`FeedOutcome::Failed`].
    pub async fn load(&self, kind: OverlayKind, url: &str) -> FeedOutcome {
        match self.fetch_collection(url).await {
            Ok(collection) => {
                let (payload, skipped) = FeedPayload::from_collection(kind, &collection);
                tracing::info!(
                    "📥 {}: {} features ({} skipped)",
                    kind,
                    payload.len(),
                    skipped
                );
                FeedOutcome::Loaded {
                    kind,
                    payload,
                    skipped,
                }
            }
            Err(e) => {
                let error = MapError::FeedError {
                    feed: kind.to_string(),
                    message: e.to_string(),
                };
                tracing::warn!("⚠️ {} ({})", error, e.user_friendly_message());
                FeedOutcome::Failed {
                    kind,
                    reason: e.to_string(),
                }
            }
        }
    }

    /// The three feeds are independent; completion order does not matter.
    pub async fn load_all(&self, all_week: &str, major_week: &str, plates: &str) -> Vec<FeedOutcome> {
        let (earthquakes, majors, boundaries) = tokio::join!(
            self.load(OverlayKind::Earthquakes, all_week),
            self.load(OverlayKind::MajorEarthquakes, major_week),
            self.load(OverlayKind::TectonicPlates, plates),
        );
        vec![earthquakes, majors, boundaries]
    }
}

/// Accepts a FeatureCollection or a lone Feature; bare geometries are rejected.
pub fn parse_collection(body: &str) -> Result<FeatureCollection> {
    match body.parse::<GeoJson>()? {
        GeoJson::FeatureCollection(collection) => Ok(collection),
        GeoJson::Feature(feature) => Ok(FeatureCollection {
            bbox: None,
            features: vec![feature],
            foreign_members: None,
        }),
        GeoJson::Geometry(_) => Err(MapError::ProcessingError {
            message: "expected a FeatureCollection, got a bare Geometry".to_string(),
        }),
    }
}
