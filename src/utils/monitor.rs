use std::sync::Mutex;
use std::time::{Duration, Instant};

#[cfg(feature = "cli")]
use sysinfo::{Pid, System};

#[derive(Debug, Clone)]
pub struct PhaseTiming {
    pub phase: String,
    pub elapsed: Duration,
    /// 只有啟用監控且有 cli feature 時才有值
    pub memory_mb: Option<u64>,
}

/// Records how long each extract/transform/load phase took.
///
/// Timings are always kept; process memory is sampled through `sysinfo` only
/// when monitoring is enabled.
pub struct PhaseMonitor {
    enabled: bool,
    start_time: Instant,
    phases: Mutex<Vec<PhaseTiming>>,
    peak_memory_mb: Mutex<u64>,
    #[cfg(feature = "cli")]
    system: Option<Mutex<(System, Pid)>>,
}

impl PhaseMonitor {
    pub fn new(enabled: bool) -> Self {
        #[cfg(feature = "cli")]
        let system = if enabled {
            match sysinfo::get_current_pid() {
                Ok(pid) => Some(Mutex::new((System::new_all(), pid))),
                Err(e) => {
                    tracing::warn!("⚠️ Memory sampling disabled: {}", e);
                    None
                }
            }
        } else {
            None
        };

        Self {
            enabled,
            start_time: Instant::now(),
            phases: Mutex::new(Vec::new()),
            peak_memory_mb: Mutex::new(0),
            #[cfg(feature = "cli")]
            system,
        }
    }

    #[cfg(feature = "cli")]
    fn sample_memory_mb(&self) -> Option<u64> {
        let mut guard = self.system.as_ref()?.lock().ok()?;
        let (system, pid) = &mut *guard;
        system.refresh_all();
        let memory_mb = system.process(*pid)?.memory() / 1024 / 1024;

        if let Ok(mut peak) = self.peak_memory_mb.lock() {
            *peak = (*peak).max(memory_mb);
        }
        Some(memory_mb)
    }

    #[cfg(not(feature = "cli"))]
    fn sample_memory_mb(&self) -> Option<u64> {
        None
    }

    pub fn finish_phase(&self, phase: &str, started: Instant) {
        let elapsed = started.elapsed();
        let memory_mb = if self.enabled {
            self.sample_memory_mb()
        } else {
            None
        };

        if self.enabled {
            match memory_mb {
                Some(mb) => tracing::info!("📊 {} - Time: {:?}, Memory: {}MB", phase, elapsed, mb),
                None => tracing::info!("📊 {} - Time: {:?}", phase, elapsed),
            }
        } else {
            tracing::debug!("{} finished in {:?}", phase, elapsed);
        }

        if let Ok(mut phases) = self.phases.lock() {
            phases.push(PhaseTiming {
                phase: phase.to_string(),
                elapsed,
                memory_mb,
            });
        }
    }

    pub fn timings(&self) -> Vec<PhaseTiming> {
        self.phases.lock().map(|p| p.clone()).unwrap_or_default()
    }

    pub fn log_final_stats(&self) {
        if !self.enabled {
            return;
        }
        let peak = self.peak_memory_mb.lock().map(|p| *p).unwrap_or(0);
        tracing::info!(
            "📊 Final Stats - Total Time: {:?}, Peak Memory: {}MB",
            self.start_time.elapsed(),
            peak
        );
    }
}

impl Default for PhaseMonitor {
    fn default() -> Self {
        Self::new(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_phases_recorded_in_order() {
        let monitor = PhaseMonitor::new(false);
        let started = Instant::now();
        monitor.finish_phase("extract", started);
        monitor.finish_phase("transform", started);

        let timings = monitor.timings();
        assert_eq!(timings.len(), 2);
        assert_eq!(timings[0].phase, "extract");
        assert_eq!(timings[1].phase, "transform");
        assert!(timings.iter().all(|t| t.memory_mb.is_none()));
    }
}
