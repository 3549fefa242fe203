use crate::shared::frame::Frame;
use crate::shared::gray_frame::GrayFrame;
use crate::video::infrastructure::media_error::MediaError;

/// Bitwise-ANDs each colour channel with the single-channel mask.
///
/// With a 0/255 mask, edge pixels keep their original colour and every
/// other pixel becomes black.
pub fn apply_mask(frame: &mut Frame, mask: &GrayFrame) -> Result<(), MediaError> {
    if frame.width() != mask.width() || frame.height() != mask.height() {
        return Err(MediaError::DimensionMismatch {
            expected: (frame.width(), frame.height()),
            actual: (mask.width(), mask.height()),
        });
    }

    let channels = frame.channels() as usize;
    for (pixel, &m) in frame
        .data_mut()
        .chunks_exact_mut(channels)
        .zip(mask.data())
    {
        for c in pixel {
            *c &= m;
        }
    }
    Ok(())
}
