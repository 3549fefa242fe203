use std::path::Path;
use std::sync::atomic::Ordering;
use std::time::Instant;

use crate::effect::domain::frame_effect::FrameEffect;
use crate::pipeline::pipeline_executor::{PipelineConfig, PipelineExecutor};
use crate::shared::video_metadata::VideoMetadata;
use crate::video::domain::video_reader::VideoReader;
use crate::video::domain::video_writer::VideoWriter;
use crate::video::infrastructure::media_error::MediaError;

/// Blocking read → effect → write, one frame in flight at a time.
pub struct SequentialPipelineExecutor;

impl SequentialPipelineExecutor {
    pub fn new() -> Self {
        Self
    }
}

impl Default for SequentialPipelineExecutor {
    fn default() -> Self {
        Self::new()
    }
}

impl PipelineExecutor for SequentialPipelineExecutor {
    fn execute(
        &self,
        mut reader: Box<dyn VideoReader>,
        mut writer: Box<dyn VideoWriter>,
        effect: Box<dyn FrameEffect>,
        metadata: &VideoMetadata,
        output_path: &Path,
        mut config: PipelineConfig,
    ) -> Result<usize, Box<dyn std::error::Error>> {
        if let Err(e) = writer.open(output_path, metadata) {
            reader.close();
            return Err(e);
        }

        let total_frames = metadata.total_frames;
        let mut processed = 0usize;
        let mut first_error: Option<Box<dyn std::error::Error>> = None;

        for frame_result in reader.frames() {
            if config.cancelled.load(Ordering::Relaxed) {
                log::info!("Cancelled after {processed} frames");
                break;
            }

            let mut frame = match frame_result {
                Ok(frame) => frame,
                Err(e) => {
                    first_error = Some(e);
                    break;
                }
            };

            let started = Instant::now();
            if let Err(e) = effect.apply(&mut frame) {
                first_error = Some(e);
                break;
            }
            config
                .logger
                .timing("effect", started.elapsed().as_secs_f64() * 1000.0);

            let started = Instant::now();
            if let Err(e) = writer.write(&frame) {
                first_error = Some(e);
                break;
            }
            config
                .logger
                .timing("write", started.elapsed().as_secs_f64() * 1000.0);

            processed += 1;
            config.logger.progress(processed, total_frames);

            if let Some(ref callback) = config.on_progress {
                if !callback(processed, total_frames) {
                    first_error = Some(MediaError::Cancelled.into());
                    break;
                }
            }
        }

        reader.close();
        if let Err(e) = writer.close() {
            first_error.get_or_insert(e);
        }
        config.logger.summary();

        match first_error {
            Some(e) => Err(e),
            None => Ok(processed),
        }
    }
}
