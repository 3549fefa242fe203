/// Input intensity range stretched to the full 0-255 output range.
pub const DEFAULT_CONTRAST_LOW: u8 = 50;
pub const DEFAULT_CONTRAST_HIGH: u8 = 200;

/// Hysteresis thresholds on the L1 Sobel gradient magnitude.
pub const DEFAULT_CANNY_LOW: f32 = 100.0;
pub const DEFAULT_CANNY_HIGH: f32 = 200.0;

pub const DEFAULT_DILATE_KERNEL: usize = 3;
pub const DEFAULT_DILATE_ITERATIONS: usize = 1;

/// MPEG-4 Part 2, the codec behind the `mp4v` tag.
pub const DEFAULT_INTERMEDIATE_CODEC: &str = "mpeg4";
pub const DEFAULT_VIDEO_CODEC: &str = "libx264";
pub const DEFAULT_AUDIO_CODEC: &str = "aac";

/// Codec name that requests packet passthrough instead of re-encoding.
pub const COPY_CODEC: &str = "copy";

pub const MAX_CRF: u32 = 51;

/// Used when the container reports no usable frame rate.
pub const FALLBACK_FPS: i32 = 30;

pub const DEFAULT_OUTPUT_NAME: &str = "rotoscoped_with_audio.mp4";
pub const DEFAULT_INTERMEDIATE_NAME: &str = "rotoscoped_silent.mp4";

pub const IMAGE_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "bmp", "tiff", "tif", "webp"];
