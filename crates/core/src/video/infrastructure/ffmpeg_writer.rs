use std::path::Path;

use crate::shared::constants::DEFAULT_INTERMEDIATE_CODEC;
use crate::shared::frame::Frame;
use crate::shared::video_metadata::VideoMetadata;
use crate::video::domain::video_writer::VideoWriter;

use super::ffmpeg_support::{
    encoder_frame_rate, fill_rgb, frame_time_base, output_time_base, usable_frame_rate,
    wants_global_header,
};
use super::media_error::MediaError;

/// Encodes frames into a silent video via ffmpeg-next.
///
/// The encoder is looked up by name (`mpeg4` by default). Frames get
/// consecutive timestamps in a `1 / frame rate` time base, so the output
/// keeps the source's rational rate. Rates whose terms exceed 65535 are
/// approximated to the nearest fraction the encoder accepts.
pub struct FfmpegWriter {
    codec_name: String,
    octx: Option<ffmpeg_next::format::context::Output>,
    encoder: Option<ffmpeg_next::codec::encoder::video::Encoder>,
    scaler: Option<ffmpeg_next::software::scaling::Context>,
    width: u32,
    height: u32,
    time_base: ffmpeg_next::Rational,
    frame_count: usize,
}

// Safety: FfmpegWriter is only used from a single thread at a time.
// The raw pointers inside ffmpeg types are not shared across threads.
unsafe impl Send for FfmpegWriter {}

const VIDEO_STREAM: usize = 0;

impl FfmpegWriter {
    pub fn new() -> Self {
        Self::with_codec(DEFAULT_INTERMEDIATE_CODEC)
    }

    pub fn with_codec(codec_name: impl Into<String>) -> Self {
        Self {
            codec_name: codec_name.into(),
            octx: None,
            encoder: None,
            scaler: None,
            width: 0,
            height: 0,
            time_base: ffmpeg_next::Rational(0, 1),
            frame_count: 0,
        }
    }

    fn write_pending_packets(&mut self) -> Result<(), Box<dyn std::error::Error>> {
        let (Some(encoder), Some(octx)) = (self.encoder.as_mut(), self.octx.as_mut()) else {
            return Err(MediaError::NotOpened("FfmpegWriter").into());
        };
        let ost_time_base = output_time_base(octx, VIDEO_STREAM)?;

        let mut encoded = ffmpeg_next::Packet::empty();
        while encoder.receive_packet(&mut encoded).is_ok() {
            encoded.set_stream(VIDEO_STREAM);
            encoded.rescale_ts(self.time_base, ost_time_base);
            encoded.write_interleaved(octx)?;
        }
        Ok(())
    }
}

impl Default for FfmpegWriter {
    fn default() -> Self {
        Self::new()
    }
}

impl VideoWriter for FfmpegWriter {
    fn open(
        &mut self,
        path: &Path,
        metadata: &VideoMetadata,
    ) -> Result<(), Box<dyn std::error::Error>> {
        ffmpeg_next::init()?;

        let rate = encoder_frame_rate(usable_frame_rate(metadata.frame_rate));
        self.time_base = frame_time_base(rate);
        self.width = metadata.width;
        self.height = metadata.height;

        let mut octx = ffmpeg_next::format::output(path)?;
        let global_header = wants_global_header(&octx);

        let codec = ffmpeg_next::encoder::find_by_name(&self.codec_name)
            .ok_or_else(|| MediaError::EncoderNotFound(self.codec_name.clone()))?;

        let mut ost = octx.add_stream(Some(codec))?;

        let mut encoder_ctx = ffmpeg_next::codec::context::Context::new_with_codec(codec)
            .encoder()
            .video()?;

        encoder_ctx.set_width(metadata.width);
        encoder_ctx.set_height(metadata.height);
        encoder_ctx.set_format(ffmpeg_next::format::Pixel::YUV420P);
        encoder_ctx.set_time_base(self.time_base);
        encoder_ctx.set_frame_rate(Some(ffmpeg_next::Rational(
            rate.numerator,
            rate.denominator,
        )));

        if global_header {
            encoder_ctx.set_flags(ffmpeg_next::codec::Flags::GLOBAL_HEADER);
        }

        let encoder = encoder_ctx.open_with(ffmpeg_next::Dictionary::new())?;
        ost.set_parameters(&encoder);
        ost.set_avg_frame_rate(ffmpeg_next::Rational(rate.numerator, rate.denominator));

        octx.write_header()?;

        let scaler = ffmpeg_next::software::scaling::Context::get(
            ffmpeg_next::format::Pixel::RGB24,
            metadata.width,
            metadata.height,
            ffmpeg_next::format::Pixel::YUV420P,
            metadata.width,
            metadata.height,
            ffmpeg_next::software::scaling::Flags::BILINEAR,
        )?;

        log::debug!(
            "Writing {} ({}, {}x{} @ {}/{})",
            path.display(),
            self.codec_name,
            metadata.width,
            metadata.height,
            rate.numerator,
            rate.denominator
        );

        self.octx = Some(octx);
        self.encoder = Some(encoder);
        self.scaler = Some(scaler);
        self.frame_count = 0;

        Ok(())
    }

    fn write(&mut self, frame: &Frame) -> Result<(), Box<dyn std::error::Error>> {
        let (Some(encoder), Some(scaler)) = (self.encoder.as_mut(), self.scaler.as_mut()) else {
            return Err(MediaError::NotOpened("FfmpegWriter").into());
        };
        if frame.width() != self.width || frame.height() != self.height {
            return Err(MediaError::DimensionMismatch {
                expected: (self.width, self.height),
                actual: (frame.width(), frame.height()),
            }
            .into());
        }

        let mut rgb_frame = ffmpeg_next::util::frame::video::Video::new(
            ffmpeg_next::format::Pixel::RGB24,
            self.width,
            self.height,
        );
        fill_rgb(&mut rgb_frame, frame.data(), self.width, self.height);

        let mut yuv_frame = ffmpeg_next::util::frame::video::Video::empty();
        scaler.run(&rgb_frame, &mut yuv_frame)?;
        yuv_frame.set_pts(Some(self.frame_count as i64));

        encoder.send_frame(&yuv_frame)?;
        self.write_pending_packets()?;

        self.frame_count += 1;
        Ok(())
    }

    fn close(&mut self) -> Result<(), Box<dyn std::error::Error>> {
        if let Some(encoder) = self.encoder.as_mut() {
            encoder.send_eof()?;
            self.write_pending_packets()?;
            if let Some(octx) = self.octx.as_mut() {
                octx.write_trailer()?;
            }
            log::debug!("Closed writer after {} frames", self.frame_count);
        }

        self.octx = None;
        self.encoder = None;
        self.scaler = None;

        Ok(())
    }
}
