use std::collections::BTreeMap;
use std::time::Instant;

/// Observer for executor progress, stage timings and per-frame metrics.
pub trait PipelineLogger: Send {
    /// `current` analyzed frames out of an expected `total`.
    fn progress(&mut self, current: usize, total: usize);

    /// Duration of one named stage for one frame.
    fn timing(&mut self, stage: &str, duration_ms: f64);

    /// Point sample of a named metric, e.g. faces per frame.
    fn metric(&mut self, name: &str, value: f64);

    fn info(&mut self, message: &str);

    fn summary(&self) {}
}

/// Discards everything. Used by library callers and tests.
pub struct NullPipelineLogger;

impl PipelineLogger for NullPipelineLogger {
    fn progress(&mut self, _current: usize, _total: usize) {}
    fn timing(&mut self, _stage: &str, _duration_ms: f64) {}
    fn metric(&mut self, _name: &str, _value: f64) {}
    fn info(&mut self, _message: &str) {}
}

/// Running aggregate of samples for one stage or metric.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct SampleStats {
    pub count: usize,
    pub total: f64,
    pub max: f64,
}

impl SampleStats {
    fn push(&mut self, value: f64) {
        self.count += 1;
        self.total += value;
        if self.count == 1 || value > self.max {
            self.max = value;
        }
    }

    pub fn mean(&self) -> f64 {
        if self.count == 0 {
            0.0
        } else {
            self.total / self.count as f64
        }
    }
}

/// Logger for the command line: throttled progress through `log`, plus an
/// end-of-run table of stage timings and metric averages.
pub struct StdoutPipelineLogger {
    throttle_frames: usize,
    timings: BTreeMap<String, SampleStats>,
    metrics: BTreeMap<String, SampleStats>,
    started: Instant,
    frames_seen: usize,
}

impl StdoutPipelineLogger {
    pub fn new(throttle_frames: usize) -> Self {
        Self {
            throttle_frames: throttle_frames.max(1),
            timings: BTreeMap::new(),
            metrics: BTreeMap::new(),
            started: Instant::now(),
            frames_seen: 0,
        }
    }

    pub fn timing_stats(&self, stage: &str) -> Option<SampleStats> {
        self.timings.get(stage).copied()
    }

    pub fn metric_stats(&self, name: &str) -> Option<SampleStats> {
        self.metrics.get(name).copied()
    }

    /// `None` until at least one timing or metric has been recorded.
    pub fn summary_string(&self) -> Option<String> {
        if self.timings.is_empty() && self.metrics.is_empty() {
            return None;
        }

        let elapsed_s = self.started.elapsed().as_secs_f64();
        let mut lines = vec![format!(
            "Triage summary ({} analyzed frames, {elapsed_s:.1}s):",
            self.frames_seen
        )];

        for (stage, stats) in &self.timings {
            lines.push(format!(
                "  {stage:10} avg {:6.1}ms  max {:6.1}ms  total {:7.0}ms",
                stats.mean(),
                stats.max,
                stats.total
            ));
        }
        for (name, stats) in &self.metrics {
            lines.push(format!(
                "  {name}: avg {:.1}, max {:.0}",
                stats.mean(),
                stats.max
            ));
        }
        if self.frames_seen > 0 && elapsed_s > 0.0 {
            lines.push(format!(
                "  Throughput: {:.1} analyzed fps",
                self.frames_seen as f64 / elapsed_s
            ));
        }

        Some(lines.join("\n"))
    }
}

impl Default for StdoutPipelineLogger {
    fn default() -> Self {
        Self::new(25)
    }
}

impl PipelineLogger for StdoutPipelineLogger {
    fn progress(&mut self, current: usize, total: usize) {
        self.frames_seen = current;
        if current % self.throttle_frames == 0 || current == total {
            if total > 0 {
                let pct = (current as f64 / total as f64 * 100.0).min(100.0);
                log::info!("Analyzed {current}/{total} sampled frames ({pct:.1}%)");
            } else {
                log::info!("Analyzed {current} sampled frames");
            }
        }
    }

    fn timing(&mut self, stage: &str, duration_ms: f64) {
        self.timings
            .entry(stage.to_string())
            .or_default()
            .push(duration_ms);
    }

    fn metric(&mut self, name: &str, value: f64) {
        self.metrics.entry(name.to_string()).or_default().push(value);
    }

    fn info(&mut self, message: &str) {
        log::info!("{message}");
    }

    fn summary(&self) {
        if let Some(text) = self.summary_string() {
            log::info!("\n{text}");
        }
    }
}
