use clap::Parser;
use httpmock::prelude::*;
use quake_map::{CliConfig, LocalStorage, MapEngine, QuakeMapPipeline};
use std::time::{Duration, Instant};
use tempfile::TempDir;

// 沒有任何服務在 port 1 監聽
const UNREACHABLE_URL: &str = "http://127.0.0.1:1/plates.json";

fn quake_feed(id: &str, mag: f64) -> serde_json::Value {
    serde_json::json!({
        "type": "FeatureCollection",
        "features": [
            {"type": "Feature", "id": id,
             "properties": {"mag": mag, "place": "Offshore Chile"},
             "geometry": {"type": "Point", "coordinates": [-72.0, -36.0, 20.0]}}
        ]
    })
}

fn config(all_week: &str, major_week: &str, plates: &str, output_path: &str) -> CliConfig {
    CliConfig::parse_from([
        "quake-map",
        "--access-token",
        "pk.network",
        "--all-week-url",
        all_week,
        "--major-week-url",
        major_week,
        "--plates-url",
        plates,
        "--output-path",
        output_path,
        "--formats",
        "json",
        "--timeout-secs",
        "1",
    ])
}

fn read_document(dir: &std::path::Path) -> serde_json::Value {
    serde_json::from_slice(&std::fs::read(dir.join("map.json")).unwrap()).unwrap()
}

#[tokio::test]
async fn test_unreachable_plate_feed_keeps_earthquake_layers() {
    let temp_dir = TempDir::new().unwrap();
    let output_path = temp_dir.path().to_str().unwrap().to_string();

    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(GET).path("/all_week.geojson");
        then.status(200).json_body(quake_feed("a1", 2.2));
    });
    server.mock(|when, then| {
        when.method(GET).path("/4.5_week.geojson");
        then.status(200).json_body(quake_feed("m1", 6.4));
    });

    let config = config(
        &server.url("/all_week.geojson"),
        &server.url("/4.5_week.geojson"),
        UNREACHABLE_URL,
        &output_path,
    );
    let pipeline = QuakeMapPipeline::new(LocalStorage::new(output_path.clone()), config).unwrap();
    let report = MapEngine::new(pipeline).run().await.unwrap();

    assert_eq!(report.layers, 2);
    let failed: Vec<&str> = report.failed_feeds().map(|f| f.name.as_str()).collect();
    assert_eq!(failed, vec!["Tectonic Plates"]);

    let document = read_document(temp_dir.path());
    assert_eq!(document["groups"][0]["layers"].as_array().unwrap().len(), 1);
    assert_eq!(document["groups"][1]["layers"].as_array().unwrap().len(), 1);
    assert!(document["groups"][2]["layers"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn test_hung_feed_is_cut_off_by_timeout() {
    let temp_dir = TempDir::new().unwrap();
    let output_path = temp_dir.path().to_str().unwrap().to_string();

    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(GET).path("/all_week.geojson");
        then.status(200).json_body(quake_feed("a1", 3.1));
    });
    server.mock(|when, then| {
        when.method(GET).path("/4.5_week.geojson");
        then.status(200)
            .delay(Duration::from_secs(5))
            .json_body(quake_feed("m1", 5.9));
    });
    server.mock(|when, then| {
        when.method(GET).path("/plates.json");
        then.status(200)
            .json_body(serde_json::json!({"type": "FeatureCollection", "features": []}));
    });

    let config = config(
        &server.url("/all_week.geojson"),
        &server.url("/4.5_week.geojson"),
        &server.url("/plates.json"),
        &output_path,
    );
    let pipeline = QuakeMapPipeline::new(LocalStorage::new(output_path.clone()), config).unwrap();

    let started = Instant::now();
    let report = MapEngine::new(pipeline).run().await.unwrap();
    let elapsed = started.elapsed();

    assert!(elapsed < Duration::from_secs(4), "run took {:?}", elapsed);

    let failed: Vec<&str> = report.failed_feeds().map(|f| f.name.as_str()).collect();
    assert_eq!(failed, vec!["Major Earthquakes"]);
    assert_eq!(report.feeds[0].records, 1);
    assert!(report.feeds[2].loaded);

    let document = read_document(temp_dir.path());
    assert_eq!(document["groups"][0]["layers"].as_array().unwrap().len(), 1);
    assert!(document["groups"][1]["layers"].as_array().unwrap().is_empty());
}
