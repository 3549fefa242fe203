use crate::shared::frame::Frame;
use crate::shared::gray_frame::GrayFrame;

// BT.601 weights in 14-bit fixed point; they sum to 1 << 14.
const WEIGHT_R: u32 = 4899;
const WEIGHT_G: u32 = 9617;
const WEIGHT_B: u32 = 1868;
const SHIFT: u32 = 14;
const ROUND: u32 = 1 << (SHIFT - 1);

/// Converts a packed RGB frame to its luma plane.
pub fn luma_from_rgb(frame: &Frame) -> GrayFrame {
    debug_assert!(frame.is_rgb(), "luma conversion expects an RGB frame");
    let luma: Vec<u8> = frame
        .data()
        .chunks_exact(3)
        .map(|px| {
            let y = px[0] as u32 * WEIGHT_R + px[1] as u32 * WEIGHT_G + px[2] as u32 * WEIGHT_B;
            ((y + ROUND) >> SHIFT) as u8
        })
        .collect();
    GrayFrame::new(luma, frame.width(), frame.height())
}
