use crate::shared::constants::{DEFAULT_DILATE_ITERATIONS, DEFAULT_DILATE_KERNEL};
use crate::shared::gray_frame::GrayFrame;

/// Grayscale dilation with a square all-ones structuring element.
///
/// The anchor sits at `kernel_size / 2`; pixels outside the image never
/// contribute. A rectangular max filter is separable, so each iteration is
/// a horizontal pass followed by a vertical pass.
pub struct Dilation {
    kernel_size: usize,
    iterations: usize,
}

impl Dilation {
    pub fn new(kernel_size: usize, iterations: usize) -> Self {
        debug_assert!(kernel_size >= 1, "kernel size must be at least 1");
        Self {
            kernel_size: kernel_size.max(1),
            iterations,
        }
    }

    pub fn apply(&self, mask: &GrayFrame) -> GrayFrame {
        let mut out = mask.clone();
        if self.kernel_size == 1 || mask.is_empty() {
            return out;
        }

        let w = mask.width() as usize;
        let h = mask.height() as usize;
        let mut temp = vec![0u8; w * h];
        for _ in 0..self.iterations {
            max_filter_rows(out.data(), &mut temp, w, h, self.kernel_size);
            max_filter_cols(&temp, out.data_mut(), w, h, self.kernel_size);
        }
        out
    }
}

impl Default for Dilation {
    fn default() -> Self {
        Self::new(DEFAULT_DILATE_KERNEL, DEFAULT_DILATE_ITERATIONS)
    }
}

/// Window `[i - anchor, i - anchor + k)` clipped to `[0, len)`.
fn window(i: usize, len: usize, k: usize) -> (usize, usize) {
    let anchor = k / 2;
    let start = i.saturating_sub(anchor);
    let end = (i + (k - anchor)).min(len);
    (start, end)
}

fn max_filter_rows(src: &[u8], dst: &mut [u8], w: usize, h: usize, k: usize) {
    for y in 0..h {
        let row = &src[y * w..(y + 1) * w];
        for x in 0..w {
            let (x0, x1) = window(x, w, k);
            dst[y * w + x] = row[x0..x1].iter().copied().max().unwrap_or(0);
        }
    }
}

fn max_filter_cols(src: &[u8], dst: &mut [u8], w: usize, h: usize, k: usize) {
    for y in 0..h {
        let (y0, y1) = window(y, h, k);
        for x in 0..w {
            dst[y * w + x] = (y0..y1).map(|yy| src[yy * w + x]).max().unwrap_or(0);
        }
    }
}
