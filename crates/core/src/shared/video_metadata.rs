use std::path::PathBuf;

/// Exact frame rate as a rational `numerator / denominator` (e.g. 30000/1001).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FrameRate {
    pub numerator: i32,
    pub denominator: i32,
}

impl FrameRate {
    pub const fn new(numerator: i32, denominator: i32) -> Self {
        Self {
            numerator,
            denominator,
        }
    }

    pub fn is_valid(&self) -> bool {
        self.numerator > 0 && self.denominator > 0
    }

    pub fn as_f64(&self) -> f64 {
        if self.denominator == 0 {
            0.0
        } else {
            self.numerator as f64 / self.denominator as f64
        }
    }

    /// Duration of `frames` frames in seconds; 0 for an invalid rate.
    pub fn duration_secs(&self, frames: usize) -> f64 {
        if !self.is_valid() {
            return 0.0;
        }
        frames as f64 * self.denominator as f64 / self.numerator as f64
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct VideoMetadata {
    pub width: u32,
    pub height: u32,
    pub frame_rate: FrameRate,
    /// Container-reported frame count; 0 when the container doesn't know.
    pub total_frames: usize,
    pub codec: String,
    pub source_path: Option<PathBuf>,
}

impl VideoMetadata {
    pub fn fps(&self) -> f64 {
        self.frame_rate.as_f64()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use rstest::rstest;

    #[test]
    fn test_construction() {
        let meta = VideoMetadata {
            width: 1920,
            height: 1080,
            frame_rate: FrameRate::new(30, 1),
            total_frames: 900,
            codec: "h264".to_string(),
            source_path: Some(PathBuf::from("/tmp/input.mp4")),
        };
        assert_eq!(meta.width, 1920);
        assert_eq!(meta.height, 1080);
        assert_relative_eq!(meta.fps(), 30.0);
        assert_eq!(meta.total_frames, 900);
        assert_eq!(meta.source_path, Some(PathBuf::from("/tmp/input.mp4")));
    }

    #[test]
    fn test_ntsc_rate_is_exact() {
        let rate = FrameRate::new(30000, 1001);
        assert_relative_eq!(rate.as_f64(), 29.970_029_97, epsilon = 1e-6);
        assert_relative_eq!(rate.duration_secs(30000), 1001.0);
    }

    #[rstest]
    #[case::zero_denominator(FrameRate::new(30, 0))]
    #[case::zero_numerator(FrameRate::new(0, 1))]
    #[case::negative(FrameRate::new(-25, 1))]
    fn test_invalid_rates(#[case] rate: FrameRate) {
        assert!(!rate.is_valid());
        assert_relative_eq!(rate.duration_secs(100), 0.0);
    }

    #[test]
    fn test_still_image_metadata() {
        // Still images are one-frame sources without a frame rate
        let meta = VideoMetadata {
            width: 800,
            height: 600,
            frame_rate: FrameRate::new(0, 1),
            total_frames: 1,
            codec: "png".to_string(),
            source_path: None,
        };
        assert_eq!(meta.total_frames, 1);
        assert_relative_eq!(meta.fps(), 0.0);
    }
}
