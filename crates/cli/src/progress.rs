use std::io::IsTerminal;
use std::time::Duration;

use indicatif::{ProgressBar, ProgressDrawTarget, ProgressStyle};
use rotoscope_core::pipeline::pipeline_logger::{PipelineLogger, StdoutPipelineLogger};

const BAR_TEMPLATE: &str =
    "  Rotoscoping: {percent:>5.1}% [{bar:30}] {pos}/{len} frames ({elapsed_precise} / {eta_precise})";
const SPINNER_TEMPLATE: &str = "  Rotoscoping: {spinner} {pos} frames ({elapsed_precise})";

/// Frame progress on stderr. Containers that do not report a frame count
/// get a spinner instead of a bar.
pub fn frame_progress(total_frames: usize) -> ProgressBar {
    let pb = if total_frames > 0 {
        let pb = ProgressBar::new(total_frames as u64);
        pb.set_style(
            ProgressStyle::default_bar()
                .template(BAR_TEMPLATE)
                .unwrap_or_else(|_| ProgressStyle::default_bar())
                .progress_chars("##."),
        );
        pb
    } else {
        let pb = ProgressBar::new_spinner();
        pb.set_style(
            ProgressStyle::default_spinner()
                .template(SPINNER_TEMPLATE)
                .unwrap_or_else(|_| ProgressStyle::default_spinner()),
        );
        pb
    };

    if !std::io::stderr().is_terminal() {
        pb.set_draw_target(ProgressDrawTarget::hidden());
    }

    pb.enable_steady_tick(Duration::from_millis(100));
    pb
}

/// Adapts a bar to the pipeline's progress callback. Never cancels.
pub fn progress_callback(pb: ProgressBar) -> Box<dyn Fn(usize, usize) -> bool + Send> {
    Box::new(move |current, _total| {
        pb.set_position(current as u64);
        true
    })
}

/// Pipeline logger for runs that show a bar: no per-frame log lines, and the
/// bar is cleared before the timing summary is logged.
pub struct BarPipelineLogger {
    bar: ProgressBar,
    inner: StdoutPipelineLogger,
}

impl BarPipelineLogger {
    pub fn new(bar: ProgressBar) -> Self {
        Self {
            bar,
            inner: StdoutPipelineLogger::summary_only(),
        }
    }
}

impl PipelineLogger for BarPipelineLogger {
    fn progress(&mut self, current: usize, total: usize) {
        self.inner.progress(current, total);
    }

    fn timing(&mut self, stage: &str, duration_ms: f64) {
        self.inner.timing(stage, duration_ms);
    }

    fn metric(&mut self, name: &str, value: f64) {
        self.inner.metric(name, value);
    }

    fn summary(&self) {
        self.bar.finish_and_clear();
        self.inner.summary();
    }
}
