use std::path::PathBuf;

/// Failures from the media adapters that callers may want to tell apart.
#[derive(Debug, thiserror::Error)]
pub enum MediaError {
    #[error("no video stream found in {}", .0.display())]
    NoVideoStream(PathBuf),

    #[error("no audio stream found in {}", .0.display())]
    NoAudioStream(PathBuf),

    #[error("encoder not found: {0}")]
    EncoderNotFound(String),

    #[error("{0}: not opened")]
    NotOpened(&'static str),

    #[error(
        "dimension mismatch: expected {}x{}, got {}x{}",
        .expected.0, .expected.1, .actual.0, .actual.1
    )]
    DimensionMismatch {
        expected: (u32, u32),
        actual: (u32, u32),
    },

    #[error("expected a 3-channel RGB frame, got {0} channel(s)")]
    UnsupportedChannels(u8),

    #[error("processing cancelled")]
    Cancelled,
}
