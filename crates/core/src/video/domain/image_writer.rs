use std::path::Path;

use crate::shared::frame::Frame;

/// Writes a processed still image; the format follows the path's extension.
pub trait ImageWriter: Send {
    fn write(&self, path: &Path, frame: &Frame) -> Result<(), Box<dyn std::error::Error>>;
}
