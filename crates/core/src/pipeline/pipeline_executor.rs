use std::path::Path;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;

use crate::effect::domain::frame_effect::FrameEffect;
use crate::shared::video_metadata::VideoMetadata;
use crate::video::domain::video_reader::VideoReader;
use crate::video::domain::video_writer::VideoWriter;

use super::pipeline_logger::{NullPipelineLogger, PipelineLogger};

/// Per-run observation and cancellation hooks.
pub struct PipelineConfig {
    /// Called after each written frame with `(written, total_frames)`;
    /// returning `false` aborts the run with [`MediaError::Cancelled`].
    ///
    /// [`MediaError::Cancelled`]: crate::video::infrastructure::media_error::MediaError::Cancelled
    pub on_progress: Option<Box<dyn Fn(usize, usize) -> bool + Send>>,
    /// Checked before each frame; when set the run stops early without error.
    pub cancelled: Arc<AtomicBool>,
    pub logger: Box<dyn PipelineLogger>,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            on_progress: None,
            cancelled: Arc::new(AtomicBool::new(false)),
            logger: Box::new(NullPipelineLogger),
        }
    }
}

/// Runs the read → effect → write loop over an opened reader.
///
/// Implementations open the writer with `metadata`, preserve frame order,
/// close both ends on every path and return the number of frames written.
pub trait PipelineExecutor: Send {
    fn execute(
        &self,
        reader: Box<dyn VideoReader>,
        writer: Box<dyn VideoWriter>,
        effect: Box<dyn FrameEffect>,
        metadata: &VideoMetadata,
        output_path: &Path,
        config: PipelineConfig,
    ) -> Result<usize, Box<dyn std::error::Error>>;
}
