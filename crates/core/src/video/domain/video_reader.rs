use std::path::Path;

use crate::shared::frame::Frame;
use crate::shared::video_metadata::VideoMetadata;

/// Source of decoded RGB frames.
///
/// `frames` is a finite, non-restartable sequence; it ends at end-of-stream
/// rather than after `total_frames`, which containers often get wrong.
pub trait VideoReader: Send {
    fn open(&mut self, path: &Path) -> Result<VideoMetadata, Box<dyn std::error::Error>>;

    fn frames(
        &mut self,
    ) -> Box<dyn Iterator<Item = Result<Frame, Box<dyn std::error::Error>>> + '_>;

    /// Safe to call more than once.
    fn close(&mut self);
}
