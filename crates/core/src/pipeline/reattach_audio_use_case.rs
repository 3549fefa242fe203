use std::path::Path;

use crate::shared::paths::same_file;
use crate::video::domain::audio_muxer::{AudioMuxer, MuxSummary};

/// Audio re-attachment stage: the processed video's frames plus the
/// original file's audio, encoded into the final artifact.
pub struct ReattachAudioUseCase {
    muxer: Box<dyn AudioMuxer>,
}

impl ReattachAudioUseCase {
    pub fn new(muxer: Box<dyn AudioMuxer>) -> Self {
        Self { muxer }
    }

    pub fn execute(
        &self,
        processed_path: &Path,
        original_path: &Path,
        output_path: &Path,
    ) -> Result<MuxSummary, Box<dyn std::error::Error>> {
        for input in [processed_path, original_path] {
            if same_file(input, output_path) {
                return Err(format!(
                    "output {} would overwrite input {}",
                    output_path.display(),
                    input.display()
                )
                .into());
            }
        }

        let summary = self
            .muxer
            .mux(processed_path, original_path, output_path)?;
        log::info!(
            "Wrote {} ({} video / {} audio packets)",
            output_path.display(),
            summary.video_packets,
            summary.audio_packets
        );
        Ok(summary)
    }
}
