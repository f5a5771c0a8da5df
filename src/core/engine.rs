use std::time::Instant;

use crate::core::layers::FeedStatus;
use crate::core::Pipeline;
use crate::utils::error::Result;
use crate::utils::monitor::{PhaseMonitor, PhaseTiming};

#[derive(Debug, Clone)]
pub struct RunReport {
    pub output_path: String,
    pub feeds: Vec<FeedStatus>,
    pub layers: usize,
    pub timings: Vec<PhaseTiming>,
}

impl RunReport {
    pub fn failed_feeds(&self) -> impl Iterator<Item = &FeedStatus> {
        self.feeds.iter().filter(|f| f.error.is_some())
    }
}

pub struct MapEngine<P: Pipeline> {
    pipeline: P,
    monitor: PhaseMonitor,
}

impl<P: Pipeline> MapEngine<P> {
    pub fn new(pipeline: P) -> Self {
        Self::new_with_monitoring(pipeline, false)
    }

    pub fn new_with_monitoring(pipeline: P, monitor_enabled: bool) -> Self {
        Self {
            pipeline,
            monitor: PhaseMonitor::new(monitor_enabled),
        }
    }

    pub async fn run(&self) -> Result<RunReport> {
        tracing::info!("🚀 Starting map build");

        let started = Instant::now();
        let outcomes = self.pipeline.extract().await?;
        self.monitor.finish_phase("Extract", started);

        let started = Instant::now();
        let state = self.pipeline.transform(outcomes).await?;
        self.monitor.finish_phase("Transform", started);

        let feeds = state.feed_status().to_vec();
        let layers = state.marker_count();

        let started = Instant::now();
        let output_path = self.pipeline.load(state).await?;
        self.monitor.finish_phase("Load", started);

        tracing::info!("📁 Map written to: {}", output_path);
        self.monitor.log_final_stats();

        Ok(RunReport {
            output_path,
            feeds,
            layers,
            timings: self.monitor.timings(),
        })
    }
}
