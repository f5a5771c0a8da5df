use crate::core::layers::{MapSettings, MapState};
use crate::domain::model::{FeedOutcome, OverlayKind};
use crate::utils::error::Result;
use async_trait::async_trait;

/// Destination for generated map files.
pub trait Storage: Send + Sync {
    fn write_file(
        &self,
        path: &str,
        data: &[u8],
    ) -> impl std::future::Future<Output = Result<()>> + Send;
}

pub trait ConfigProvider: Send + Sync {
    fn feed_url(&self, kind: OverlayKind) -> &str;
    fn output_path(&self) -> &str;
    fn output_formats(&self) -> &[String];
    /// `Some(filename)` writes everything into one zip instead of separate files.
    fn bundle_filename(&self) -> Option<&str>;
    fn request_timeout_secs(&self) -> u64;
    fn map_settings(&self) -> Result<MapSettings>;
}

#[async_trait]
pub trait Pipeline: Send + Sync {
    async fn extract(&self) -> Result<Vec<FeedOutcome>>;
    async fn transform(&self, outcomes: Vec<FeedOutcome>) -> Result<MapState>;
    async fn load(&self, state: MapState) -> Result<String>;
}
