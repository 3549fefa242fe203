use crate::effect::domain::edge_detector::EdgeDetector;
use crate::effect::domain::frame_effect::FrameEffect;
use crate::shared::frame::Frame;
use crate::shared::gray_frame::GrayFrame;
use crate::shared::settings::EffectSettings;
use crate::video::infrastructure::media_error::MediaError;

use super::canny_edge_detector::CannyEdgeDetector;
use super::contrast::ContrastStretch;
use super::luma::luma_from_rgb;
use super::mask::apply_mask;
use super::morphology::Dilation;

/// Edge-masked "rotoscope" look.
///
/// luma → fixed contrast stretch → edge detection → dilation, then the
/// resulting mask is ANDed into the original colour frame so only edge
/// pixels keep their colour.
pub struct RotoscopeEffect {
    contrast: ContrastStretch,
    detector: Box<dyn EdgeDetector>,
    dilation: Dilation,
}

impl RotoscopeEffect {
    pub fn new(
        contrast: ContrastStretch,
        detector: Box<dyn EdgeDetector>,
        dilation: Dilation,
    ) -> Self {
        Self {
            contrast,
            detector,
            dilation,
        }
    }

    pub fn from_settings(settings: &EffectSettings) -> Self {
        Self::new(
            ContrastStretch::new(settings.contrast_low, settings.contrast_high),
            Box::new(CannyEdgeDetector::new(
                settings.canny_low,
                settings.canny_high,
            )),
            Dilation::new(settings.dilate_kernel, settings.dilate_iterations),
        )
    }

    /// The dilated edge mask for `frame`, before it is applied.
    pub fn edge_mask(&self, frame: &Frame) -> GrayFrame {
        let mut luma = luma_from_rgb(frame);
        self.contrast.apply(&mut luma);
        let edges = self.detector.detect(&luma);
        self.dilation.apply(&edges)
    }
}

impl Default for RotoscopeEffect {
    fn default() -> Self {
        Self::from_settings(&EffectSettings::default())
    }
}

impl FrameEffect for RotoscopeEffect {
    fn apply(&self, frame: &mut Frame) -> Result<(), Box<dyn std::error::Error>> {
        if !frame.is_rgb() {
            return Err(MediaError::UnsupportedChannels(frame.channels()).into());
        }
        let mask = self.edge_mask(frame);
        apply_mask(frame, &mask)?;
        Ok(())
    }
}
