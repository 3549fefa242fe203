use crate::shared::gray_frame::GrayFrame;

/// Fixed linear contrast stretch: `[low, high]` maps onto `[0, 255]`,
/// values outside the range are clipped.
///
/// The mapping is identical for every frame (no auto-levelling), so it is
/// baked into a lookup table once.
pub struct ContrastStretch {
    lut: [u8; 256],
}

impl ContrastStretch {
    /// `low` must be strictly less than `high`.
    pub fn new(low: u8, high: u8) -> Self {
        debug_assert!(low < high, "contrast range must satisfy low < high");
        let span = (high as f32 - low as f32).max(1.0);
        let mut lut = [0u8; 256];
        for (v, out) in lut.iter_mut().enumerate() {
            let v = v as u8;
            *out = if v <= low {
                0
            } else if v >= high {
                255
            } else {
                // Truncates like an integer cast of the scaled float
                ((v - low) as f32 * 255.0 / span) as u8
            };
        }
        Self { lut }
    }

    pub fn map(&self, value: u8) -> u8 {
        self.lut[value as usize]
    }

    pub fn apply(&self, luma: &mut GrayFrame) {
        for v in luma.data_mut() {
            *v = self.lut[*v as usize];
        }
    }
}
