use crate::shared::gray_frame::GrayFrame;

/// Classifies pixels of a single-channel image as edge (255) or not (0).
pub trait EdgeDetector: Send {
    fn detect(&self, luma: &GrayFrame) -> GrayFrame;
}
