use crate::shared::frame::Frame;

/// Domain interface for a per-frame visual transform.
///
/// Implementations modify the frame in-place (`&mut Frame`) and keep no
/// state between frames.
pub trait FrameEffect: Send {
    fn apply(&self, frame: &mut Frame) -> Result<(), Box<dyn std::error::Error>>;
}
