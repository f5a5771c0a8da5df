use crate::core::layers::MapState;
use crate::core::loader::FeedLoader;
use crate::core::output::{build_outputs, bundle_zip, HTML_FILENAME};
use crate::core::{ConfigProvider, FeedOutcome, Pipeline, Storage};
use crate::domain::model::OverlayKind;
use crate::utils::error::Result;

pub struct QuakeMapPipeline<S: Storage, C: ConfigProvider> {
    storage: S,
    config: C,
    loader: FeedLoader,
}

impl<S: Storage, C: ConfigProvider> QuakeMapPipeline<S, C> {
    pub fn new(storage: S, config: C) -> Result<Self> {
        let loader = FeedLoader::new(config.request_timeout_secs())?;
        Ok(Self {
            storage,
            config,
            loader,
        })
    }
}

#[async_trait::async_trait]
impl<S: Storage, C: ConfigProvider> Pipeline for QuakeMapPipeline<S, C> {
    async fn extract(&self) -> Result<Vec<FeedOutcome>> {
        let outcomes = self
            .loader
            .load_all(
                self.config.feed_url(OverlayKind::Earthquakes),
                self.config.feed_url(OverlayKind::MajorEarthquakes),
                self.config.feed_url(OverlayKind::TectonicPlates),
            )
            .await;

        let failed = outcomes.iter().filter(|o| !o.is_loaded()).count();
        if failed > 0 {
            tracing::warn!("⚠️ {} of {} feeds unavailable", failed, outcomes.len());
        }
        Ok(outcomes)
    }

    async fn transform(&self, outcomes: Vec<FeedOutcome>) -> Result<MapState> {
        let settings = self.config.map_settings()?;
        let mut state = MapState::initialize(&settings);

        for outcome in outcomes {
            state.populate(outcome);
        }

        tracing::info!("🔧 Map state ready: {} layers", state.marker_count());
        Ok(state)
    }

    async fn load(&self, state: MapState) -> Result<String> {
        let files = build_outputs(&state, self.config.output_formats())?;

        if let Some(bundle) = self.config.bundle_filename() {
            // 打包成單一 zip
            let zip_data = bundle_zip(&files)?;
            tracing::debug!("Writing bundle ({} bytes, {} files)", zip_data.len(), files.len());
            self.storage.write_file(bundle, &zip_data).await?;
            return Ok(format!("{}/{}", self.config.output_path(), bundle));
        }

        for file in &files {
            tracing::debug!("Writing {} ({} bytes)", file.name, file.bytes.len());
            self.storage.write_file(&file.name, &file.bytes).await?;
        }

        let entry = files
            .iter()
            .find(|f| f.name == HTML_FILENAME)
            .map(|f| format!("{}/{}", self.config.output_path(), f.name))
            .unwrap_or_else(|| self.config.output_path().to_string());
        Ok(entry)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::layers::MapSettings;
    use crate::domain::model::FeedPayload;
    use httpmock::prelude::*;
    use std::collections::HashMap;
    use std::sync::Arc;
    use tokio::sync::Mutex;

    #[derive(Clone)]
    struct MockStorage {
        files: Arc<Mutex<HashMap<String, Vec<u8>>>>,
    }

    impl MockStorage {
        fn new() -> Self {
            Self {
                files: Arc::new(Mutex::new(HashMap::new())),
            }
        }

        async fn read(&self, path: &str) -> Option<Vec<u8>> {
            self.files.lock().await.get(path).cloned()
        }

        async fn file_names(&self) -> Vec<String> {
            let files = self.files.lock().await;
            let mut names: Vec<String> = files.keys().cloned().collect();
            names.sort();
            names
        }
    }

    impl Storage for MockStorage {
        async fn write_file(&self, path: &str, data: &[u8]) -> Result<()> {
            let mut files = self.files.lock().await;
            files.insert(path.to_string(), data.to_vec());
            Ok(())
        }
    }

    struct MockConfig {
        urls: [String; 3],
        output_path: String,
        formats: Vec<String>,
        bundle: Option<String>,
    }

    impl MockConfig {
        fn new(base_url: &str) -> Self {
            Self {
                urls: [
                    format!("{}/all_week.geojson", base_url),
                    format!("{}/4.5_week.geojson", base_url),
                    format!("{}/plates.json", base_url),
                ],
                output_path: "test_output".to_string(),
                formats: vec!["html".to_string(), "json".to_string()],
                bundle: None,
            }
        }
    }

    impl ConfigProvider for MockConfig {
        fn feed_url(&self, kind: OverlayKind) -> &str {
            match kind {
                OverlayKind::Earthquakes => &self.urls[0],
                OverlayKind::MajorEarthquakes => &self.urls[1],
                OverlayKind::TectonicPlates => &self.urls[2],
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
            5
        }

        fn map_settings(&self) -> Result<MapSettings> {
            Ok(MapSettings {
                access_token: "pk.test".to_string(),
                ..MapSettings::default()
            })
        }
    }

    fn feed(features: serde_json::Value) -> serde_json::Value {
        serde_json::json!({"type": "FeatureCollection", "features": features})
    }

    fn quake_feature(id: &str, mag: f64, place: &str) -> serde_json::Value {
        serde_json::json!({
            "type": "Feature", "id": id,
            "properties": {"mag": mag, "place": place},
            "geometry": {"type": "Point", "coordinates": [142.0, 38.0, 10.0]}
        })
    }

    #[tokio::test]
    async fn test_extract_issues_three_fetches() {
        let server = MockServer::start();
        let all_mock = server.mock(|when, then| {
            when.method(GET).path("/all_week.geojson");
            then.status(200).json_body(feed(serde_json::json!([quake_feature("a", 1.1, "A")])));
        });
        let major_mock = server.mock(|when, then| {
            when.method(GET).path("/4.5_week.geojson");
            then.status(200).json_body(feed(serde_json::json!([quake_feature("m", 6.1, "M")])));
        });
        let plates_mock = server.mock(|when, then| {
            when.method(GET).path("/plates.json");
            then.status(200).json_body(feed(serde_json::json!([])));
        });

        let pipeline = QuakeMapPipeline::new(MockStorage::new(), MockConfig::new(&server.base_url())).unwrap();
        let outcomes = pipeline.extract().await.unwrap();

        all_mock.assert();
        major_mock.assert();
        plates_mock.assert();
        assert_eq!(outcomes.len(), 3);
        assert!(outcomes.iter().all(FeedOutcome::is_loaded));
    }

    #[tokio::test]
    async fn test_extract_tolerates_failed_feed() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(GET).path("/all_week.geojson");
            then.status(200).json_body(feed(serde_json::json!([])));
        });
        server.mock(|when, then| {
            when.method(GET).path("/4.5_week.geojson");
            then.status(200).json_body(feed(serde_json::json!([])));
        });
        server.mock(|when, then| {
            when.method(GET).path("/plates.json");
            then.status(502);
        });

        let pipeline = QuakeMapPipeline::new(MockStorage::new(), MockConfig::new(&server.base_url())).unwrap();
        let outcomes = pipeline.extract().await.unwrap();

        assert_eq!(outcomes.iter().filter(|o| o.is_loaded()).count(), 2);
        assert_eq!(outcomes[2].kind(), OverlayKind::TectonicPlates);
    }

    #[tokio::test]
    async fn test_transform_routes_by_feed() {
        let pipeline = QuakeMapPipeline::new(MockStorage::new(), MockConfig::new("http://test.com")).unwrap();
        let major = crate::domain::model::EarthquakeRecord::from_feature(
            &serde_json::from_value(quake_feature("m", 6.1, "M")).unwrap(),
        )
        .unwrap();

        let state = pipeline
            .transform(vec![
                FeedOutcome::Loaded {
                    kind: OverlayKind::MajorEarthquakes,
                    payload: FeedPayload::Earthquakes(vec![major]),
                    skipped: 0,
                },
                FeedOutcome::Failed {
                    kind: OverlayKind::Earthquakes,
                    reason: "timeout".to_string(),
                },
            ])
            .await
            .unwrap();

        assert_eq!(state.group(OverlayKind::MajorEarthquakes).len(), 1);
        assert!(state.group(OverlayKind::Earthquakes).is_empty());
    }

    #[tokio::test]
    async fn test_load_writes_selected_formats() {
        let storage = MockStorage::new();
        let pipeline = QuakeMapPipeline::new(storage.clone(), MockConfig::new("http://test.com")).unwrap();
        let state = pipeline.transform(vec![]).await.unwrap();

        let output_path = pipeline.load(state).await.unwrap();

        assert_eq!(output_path, "test_output/index.html");
        assert_eq!(storage.file_names().await, vec!["index.html", "map.json"]);

        let document = storage.read("map.json").await.unwrap();
        let value: serde_json::Value = serde_json::from_slice(&document).unwrap();
        assert_eq!(value["legends"][0]["entries"].as_array().unwrap().len(), 6);
    }

    #[tokio::test]
    async fn test_load_bundle() {
        let storage = MockStorage::new();
        let mut config = MockConfig::new("http://test.com");
        config.bundle = Some("quake_map.zip".to_string());
        config.formats.push("csv".to_string());
        let pipeline = QuakeMapPipeline::new(storage.clone(), config).unwrap();
        let state = pipeline.transform(vec![]).await.unwrap();

        let output_path = pipeline.load(state).await.unwrap();

        assert_eq!(output_path, "test_output/quake_map.zip");
        assert_eq!(storage.file_names().await, vec!["quake_map.zip"]);

        let zip_bytes = storage.read("quake_map.zip").await.unwrap();
        let archive = zip::ZipArchive::new(std::io::Cursor::new(zip_bytes)).unwrap();
        assert_eq!(archive.len(), 3);
    }
}
