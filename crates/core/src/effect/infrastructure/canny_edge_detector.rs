use ndarray::{Array2, ArrayView2, Zip};

use crate::effect::domain::edge_detector::EdgeDetector;
use crate::shared::constants::{DEFAULT_CANNY_HIGH, DEFAULT_CANNY_LOW};
use crate::shared::gray_frame::GrayFrame;

const TAN_22_5: f32 = 0.414_213_57;
const TAN_67_5: f32 = 2.414_213_6;

const NONE: u8 = 0;
const WEAK: u8 = 1;
const STRONG: u8 = 2;

/// Dual-threshold gradient edge detector (Canny).
///
/// 3x3 Sobel gradients with replicated borders, L1 magnitude, non-maximum
/// suppression over four quantized directions, then hysteresis: a pixel
/// above `high` seeds an edge and 8-connected local maxima above `low`
/// join it. No smoothing is applied beforehand.
pub struct CannyEdgeDetector {
    low: f32,
    high: f32,
}

impl CannyEdgeDetector {
    /// Thresholds given in reverse order are swapped.
    pub fn new(low: f32, high: f32) -> Self {
        let (low, high) = if low > high { (high, low) } else { (low, high) };
        Self { low, high }
    }

    pub fn thresholds(&self) -> (f32, f32) {
        (self.low, self.high)
    }
}

impl Default for CannyEdgeDetector {
    fn default() -> Self {
        Self::new(DEFAULT_CANNY_LOW, DEFAULT_CANNY_HIGH)
    }
}

impl EdgeDetector for CannyEdgeDetector {
    fn detect(&self, luma: &GrayFrame) -> GrayFrame {
        let (w, h) = (luma.width(), luma.height());
        if luma.is_empty() {
            return GrayFrame::filled(w, h, 0);
        }

        let (gx, gy) = sobel_gradients(luma.as_ndarray());
        let magnitude = Zip::from(&gx)
            .and(&gy)
            .map_collect(|&dx, &dy| dx.abs() + dy.abs());

        let (mut states, seeds) = suppress_non_maxima(&gx, &gy, &magnitude, self.low, self.high);
        trace_hysteresis(&mut states, seeds);

        let edges = states
            .iter()
            .map(|&s| if s == STRONG { 255 } else { 0 })
            .collect();
        GrayFrame::new(edges, w, h)
    }
}

fn sobel_gradients(luma: ArrayView2<'_, u8>) -> (Array2<i32>, Array2<i32>) {
    let (h, w) = luma.dim();
    let (hi, wi) = (h as isize, w as isize);
    let px = |y: isize, x: isize| -> i32 {
        luma[[y.clamp(0, hi - 1) as usize, x.clamp(0, wi - 1) as usize]] as i32
    };

    let mut gx = Array2::<i32>::zeros((h, w));
    let mut gy = Array2::<i32>::zeros((h, w));
    for y in 0..hi {
        for x in 0..wi {
            let dx = (px(y - 1, x + 1) + 2 * px(y, x + 1) + px(y + 1, x + 1))
                - (px(y - 1, x - 1) + 2 * px(y, x - 1) + px(y + 1, x - 1));
            let dy = (px(y + 1, x - 1) + 2 * px(y + 1, x) + px(y + 1, x + 1))
                - (px(y - 1, x - 1) + 2 * px(y - 1, x) + px(y - 1, x + 1));
            gx[[y as usize, x as usize]] = dx;
            gy[[y as usize, x as usize]] = dy;
        }
    }
    (gx, gy)
}

/// Marks local maxima along the gradient direction as weak or strong and
/// returns the strong pixels as hysteresis seeds.
///
/// Ties are broken toward the earlier neighbour on the horizontal and
/// vertical axes so a symmetric step produces a one-pixel-wide line.
fn suppress_non_maxima(
    gx: &Array2<i32>,
    gy: &Array2<i32>,
    magnitude: &Array2<i32>,
    low: f32,
    high: f32,
) -> (Array2<u8>, Vec<(usize, usize)>) {
    let (h, w) = magnitude.dim();
    let mag = |y: isize, x: isize| -> i32 {
        if y < 0 || x < 0 || y >= h as isize || x >= w as isize {
            0
        } else {
            magnitude[[y as usize, x as usize]]
        }
    };

    let mut states = Array2::<u8>::zeros((h, w));
    let mut seeds = Vec::new();

    for y in 0..h {
        for x in 0..w {
            let m = magnitude[[y, x]];
            if (m as f32) <= low {
                continue;
            }

            let (dx, dy) = (gx[[y, x]], gy[[y, x]]);
            let (ax, ay) = (dx.abs() as f32, dy.abs() as f32);
            let (yi, xi) = (y as isize, x as isize);

            let is_max = if ay < ax * TAN_22_5 {
                m > mag(yi, xi - 1) && m >= mag(yi, xi + 1)
            } else if ay > ax * TAN_67_5 {
                m > mag(yi - 1, xi) && m >= mag(yi + 1, xi)
            } else {
                let s: isize = if (dx < 0) != (dy < 0) { -1 } else { 1 };
                m > mag(yi - 1, xi - s) && m > mag(yi + 1, xi + s)
            };

            if !is_max {
                continue;
            }
            if m as f32 > high {
                states[[y, x]] = STRONG;
                seeds.push((y, x));
            } else {
                states[[y, x]] = WEAK;
            }
        }
    }

    (states, seeds)
}

fn trace_hysteresis(states: &mut Array2<u8>, mut stack: Vec<(usize, usize)>) {
    let (h, w) = states.dim();
    while let Some((y, x)) = stack.pop() {
        let y0 = y.saturating_sub(1);
        let y1 = (y + 1).min(h - 1);
        let x0 = x.saturating_sub(1);
        let x1 = (x + 1).min(w - 1);
        for ny in y0..=y1 {
            for nx in x0..=x1 {
                if states[[ny, nx]] == WEAK {
                    states[[ny, nx]] = STRONG;
                    stack.push((ny, nx));
                }
            }
        }
    }
    states.mapv_inplace(|s| if s == STRONG { STRONG } else { NONE });
}
