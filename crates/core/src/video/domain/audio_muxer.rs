use std::path::Path;

/// Packet counts written to the final container.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MuxSummary {
    pub video_packets: usize,
    pub audio_packets: usize,
}

/// Combines a processed (silent) video with the audio track of another file.
///
/// The visual stream always comes from `video_path`; only the audio of
/// `audio_source` is used. Fails when `audio_source` has no audio stream.
pub trait AudioMuxer: Send {
    fn mux(
        &self,
        video_path: &Path,
        audio_source: &Path,
        output_path: &Path,
    ) -> Result<MuxSummary, Box<dyn std::error::Error>>;
}
