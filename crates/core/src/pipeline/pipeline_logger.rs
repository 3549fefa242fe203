use std::collections::BTreeMap;
use std::time::Instant;

/// Observer for executor events: progress ticks, per-frame stage timings
/// and sampled metrics such as queue depth.
pub trait PipelineLogger: Send {
    fn progress(&mut self, current: usize, total: usize);

    /// How long `stage` took for one frame.
    fn timing(&mut self, stage: &str, duration_ms: f64);

    fn metric(&mut self, name: &str, value: f64);

    /// End-of-run report. Default: no-op.
    fn summary(&self) {}
}

/// Discards everything. Used when the caller shows its own progress.
pub struct NullPipelineLogger;

impl PipelineLogger for NullPipelineLogger {
    fn progress(&mut self, _current: usize, _total: usize) {}
    fn timing(&mut self, _stage: &str, _duration_ms: f64) {}
    fn metric(&mut self, _name: &str, _value: f64) {}
}

#[derive(Debug, Default, Clone, Copy)]
struct RunningStat {
    count: usize,
    sum: f64,
    max: f64,
}

impl RunningStat {
    fn record(&mut self, value: f64) {
        self.count += 1;
        self.sum += value;
        self.max = self.max.max(value);
    }

    fn mean(&self) -> f64 {
        if self.count == 0 {
            0.0
        } else {
            self.sum / self.count as f64
        }
    }
}

/// Reports through the `log` facade: throttled progress lines and a
/// per-stage timing summary at the end.
///
/// Keeps running aggregates only, so memory stays flat on long videos.
pub struct StdoutPipelineLogger {
    throttle_frames: usize,
    progress_lines: bool,
    stages: BTreeMap<String, RunningStat>,
    metrics: BTreeMap<String, RunningStat>,
    start_time: Instant,
    frames: usize,
}

impl StdoutPipelineLogger {
    pub fn new(throttle_frames: usize) -> Self {
        Self {
            throttle_frames: throttle_frames.max(1),
            progress_lines: true,
            stages: BTreeMap::new(),
            metrics: BTreeMap::new(),
            start_time: Instant::now(),
            frames: 0,
        }
    }

    /// Counts frames without logging progress lines; only the summary is
    /// reported. For callers that draw their own progress bar.
    pub fn summary_only() -> Self {
        Self {
            progress_lines: false,
            ..Self::default()
        }
    }

    /// The line `progress` would log for this tick, if any.
    pub fn progress_line(&self, current: usize, total: usize) -> Option<String> {
        if !self.progress_lines || (current % self.throttle_frames != 0 && current != total) {
            return None;
        }
        if total > 0 {
            let pct = current as f64 / total as f64 * 100.0;
            Some(format!("Processing: {current}/{total} frames ({pct:.1}%)"))
        } else {
            Some(format!("Processing: {current} frames"))
        }
    }

    /// `None` until something has been recorded.
    pub fn summary_string(&self) -> Option<String> {
        if self.stages.is_empty() && self.metrics.is_empty() {
            return None;
        }

        let elapsed_ms = self.start_time.elapsed().as_secs_f64() * 1000.0;
        let mut lines = vec![format!(
            "Pipeline summary ({} frames, {:.1}s total):",
            self.frames,
            elapsed_ms / 1000.0
        )];

        for (stage, stat) in &self.stages {
            let share = if elapsed_ms > 0.0 {
                stat.sum / elapsed_ms * 100.0
            } else {
                0.0
            };
            lines.push(format!(
                "  {stage:8}: avg {:6.1}ms  max {:6.1}ms  total {:7.0}ms  ({share:4.1}%)",
                stat.mean(),
                stat.max,
                stat.sum
            ));
        }

        for (name, stat) in &self.metrics {
            lines.push(format!("  {name}: avg {:.1}  max {:.1}", stat.mean(), stat.max));
        }

        if self.frames > 0 && elapsed_ms > 0.0 {
            let fps = self.frames as f64 / (elapsed_ms / 1000.0);
            lines.push(format!("  Throughput: {fps:.1} fps"));
        }

        Some(lines.join("\n"))
    }

    pub fn mean_timing(&self, stage: &str) -> Option<f64> {
        self.stages.get(stage).map(RunningStat::mean)
    }

    pub fn timing_count(&self, stage: &str) -> usize {
        self.stages.get(stage).map_or(0, |s| s.count)
    }

    pub fn max_metric(&self, name: &str) -> Option<f64> {
        self.metrics.get(name).map(|s| s.max)
    }
}

impl Default for StdoutPipelineLogger {
    fn default() -> Self {
        Self::new(100)
    }
}

impl PipelineLogger for StdoutPipelineLogger {
    fn progress(&mut self, current: usize, total: usize) {
        self.frames = current;
        if let Some(line) = self.progress_line(current, total) {
            log::info!("{line}");
        }
    }

    fn timing(&mut self, stage: &str, duration_ms: f64) {
        self.stages
            .entry(stage.to_string())
            .or_default()
            .record(duration_ms);
    }

    fn metric(&mut self, name: &str, value: f64) {
        self.metrics.entry(name.to_string()).or_default().record(value);
    }

    fn summary(&self) {
        if let Some(text) = self.summary_string() {
            log::info!("\n\n{text}");
        }
    }
}
