use std::collections::VecDeque;
use std::path::Path;

use crate::shared::constants::{COPY_CODEC, DEFAULT_AUDIO_CODEC, DEFAULT_VIDEO_CODEC};
use crate::shared::settings::EncodingSettings;
use crate::shared::video_metadata::FrameRate;
use crate::video::domain::audio_muxer::{AudioMuxer, MuxSummary};

use super::ffmpeg_support::{
    encoder_frame_rate, frame_time_base, output_time_base, stream_frame_rate, usable_frame_rate,
    wants_global_header,
};
use super::media_error::MediaError;

/// Chunk size for audio encoders that accept any frame length.
const VARIABLE_FRAME_CHUNK: usize = 1024;

const PLANAR_F32: ffmpeg_next::format::Sample =
    ffmpeg_next::format::Sample::F32(ffmpeg_next::format::sample::Type::Planar);

/// Re-encodes a processed video together with another file's audio track.
///
/// Video and audio are encoded with the named codecs (`libx264` / `aac` by
/// default), or passed through untouched when a codec is `"copy"`. The
/// audio is cut at the end of the processed video.
pub struct FfmpegAudioMuxer {
    video_codec: String,
    audio_codec: String,
    crf: Option<u32>,
}

impl FfmpegAudioMuxer {
    pub fn new(video_codec: impl Into<String>, audio_codec: impl Into<String>) -> Self {
        Self {
            video_codec: video_codec.into(),
            audio_codec: audio_codec.into(),
            crf: None,
        }
    }

    /// Constant rate factor handed to the video encoder as the `crf` option.
    pub fn with_crf(mut self, crf: Option<u32>) -> Self {
        self.crf = crf;
        self
    }

    pub fn from_settings(settings: &EncodingSettings) -> Self {
        Self::new(&settings.video_codec, &settings.audio_codec).with_crf(settings.crf)
    }
}

impl Default for FfmpegAudioMuxer {
    fn default() -> Self {
        Self::new(DEFAULT_VIDEO_CODEC, DEFAULT_AUDIO_CODEC)
    }
}

impl AudioMuxer for FfmpegAudioMuxer {
    fn mux(
        &self,
        video_path: &Path,
        audio_source: &Path,
        output_path: &Path,
    ) -> Result<MuxSummary, Box<dyn std::error::Error>> {
        ffmpeg_next::init()?;

        let mut video_in = ffmpeg_next::format::input(video_path)?;
        let video_src = {
            let stream = video_in
                .streams()
                .best(ffmpeg_next::media::Type::Video)
                .ok_or_else(|| MediaError::NoVideoStream(video_path.to_path_buf()))?;
            SourceStream {
                index: stream.index(),
                time_base: stream.time_base(),
                parameters: stream.parameters(),
                rate: usable_frame_rate(stream_frame_rate(&stream)),
            }
        };

        let mut audio_in = ffmpeg_next::format::input(audio_source)?;
        let audio_src = {
            let stream = audio_in
                .streams()
                .best(ffmpeg_next::media::Type::Audio)
                .ok_or_else(|| MediaError::NoAudioStream(audio_source.to_path_buf()))?;
            SourceStream {
                index: stream.index(),
                time_base: stream.time_base(),
                parameters: stream.parameters(),
                rate: FrameRate::new(0, 1),
            }
        };

        let mut octx = ffmpeg_next::format::output(output_path)?;
        let global_header = wants_global_header(&octx);

        let mut video = if self.video_codec == COPY_CODEC {
            if let Some(crf) = self.crf {
                log::warn!("Ignoring CRF {crf}: the video stream is copied");
            }
            VideoRoute::Copy(StreamCopy::new(&mut octx, &video_src)?)
        } else {
            VideoRoute::Transcode(VideoTranscoder::new(
                &self.video_codec,
                self.crf,
                &video_src,
                &mut octx,
                global_header,
            )?)
        };
        let mut audio = if self.audio_codec == COPY_CODEC {
            AudioRoute::Copy(StreamCopy::new(&mut octx, &audio_src)?)
        } else {
            AudioRoute::Transcode(AudioTranscoder::new(
                &self.audio_codec,
                &audio_src,
                &mut octx,
                global_header,
            )?)
        };

        octx.write_header()?;

        let (video_packets, video_frames) = match &mut video {
            VideoRoute::Copy(copy) => {
                let packets = copy.run(&mut video_in, None, &mut octx)?;
                (packets, packets)
            }
            VideoRoute::Transcode(transcoder) => {
                let packets = transcoder.run(&mut video_in, video_src.index, &mut octx)?;
                (packets, transcoder.frames)
            }
        };

        let video_secs = video_src.rate.duration_secs(video_frames);
        log::debug!("Processed video: {video_frames} frames, {video_secs:.3}s");

        let audio_packets = match &mut audio {
            AudioRoute::Copy(copy) => copy.run(&mut audio_in, Some(video_secs), &mut octx)?,
            AudioRoute::Transcode(transcoder) => {
                transcoder.run(&mut audio_in, audio_src.index, video_secs, &mut octx)?
            }
        };

        octx.write_trailer()?;

        log::debug!(
            "Muxed {} ({video_packets} video / {audio_packets} audio packets)",
            output_path.display()
        );

        Ok(MuxSummary {
            video_packets,
            audio_packets,
        })
    }
}

struct SourceStream {
    index: usize,
    time_base: ffmpeg_next::Rational,
    parameters: ffmpeg_next::codec::Parameters,
    rate: FrameRate,
}

enum VideoRoute {
    Copy(StreamCopy),
    Transcode(VideoTranscoder),
}

enum AudioRoute {
    Copy(StreamCopy),
    Transcode(AudioTranscoder),
}

/// Packet passthrough for one input stream.
struct StreamCopy {
    input_index: usize,
    input_time_base: ffmpeg_next::Rational,
    ost_index: usize,
}

impl StreamCopy {
    fn new(
        octx: &mut ffmpeg_next::format::context::Output,
        source: &SourceStream,
    ) -> Result<Self, Box<dyn std::error::Error>> {
        let mut ost = octx.add_stream(ffmpeg_next::encoder::find(ffmpeg_next::codec::Id::None))?;
        ost.set_parameters(source.parameters.clone());
        // Let the output container choose its own tag
        unsafe {
            (*ost.parameters().as_mut_ptr()).codec_tag = 0;
        }
        Ok(Self {
            input_index: source.index,
            input_time_base: source.time_base,
            ost_index: ost.index(),
        })
    }

    /// Copies packets, dropping those that start at or after `limit_secs`.
    fn run(
        &mut self,
        ictx: &mut ffmpeg_next::format::context::Input,
        limit_secs: Option<f64>,
        octx: &mut ffmpeg_next::format::context::Output,
    ) -> Result<usize, Box<dyn std::error::Error>> {
        let ost_time_base = output_time_base(octx, self.ost_index)?;
        let mut written = 0;

        for (stream, mut packet) in ictx.packets() {
            if stream.index() != self.input_index {
                continue;
            }
            if let (Some(limit), Some(pts)) = (limit_secs, packet.pts()) {
                if seconds(pts, self.input_time_base) >= limit {
                    continue;
                }
            }
            packet.rescale_ts(self.input_time_base, ost_time_base);
            packet.set_position(-1);
            packet.set_stream(self.ost_index);
            packet.write_interleaved(octx)?;
            written += 1;
        }
        Ok(written)
    }
}

struct VideoTranscoder {
    decoder: ffmpeg_next::decoder::Video,
    encoder: ffmpeg_next::codec::encoder::video::Encoder,
    scaler: ffmpeg_next::software::scaling::Context,
    time_base: ffmpeg_next::Rational,
    ost_index: usize,
    frames: usize,
    packets: usize,
}

impl VideoTranscoder {
    fn new(
        codec_name: &str,
        crf: Option<u32>,
        source: &SourceStream,
        octx: &mut ffmpeg_next::format::context::Output,
        global_header: bool,
    ) -> Result<Self, Box<dyn std::error::Error>> {
        let decoder =
            ffmpeg_next::codec::context::Context::from_parameters(source.parameters.clone())?
                .decoder()
                .video()?;
        let codec = ffmpeg_next::encoder::find_by_name(codec_name)
            .ok_or_else(|| MediaError::EncoderNotFound(codec_name.to_string()))?;

        let (width, height) = (decoder.width(), decoder.height());
        let rate = encoder_frame_rate(source.rate);
        let time_base = frame_time_base(rate);

        let mut ost = octx.add_stream(Some(codec))?;
        let ost_index = ost.index();

        let mut encoder_ctx = ffmpeg_next::codec::context::Context::new_with_codec(codec)
            .encoder()
            .video()?;
        encoder_ctx.set_width(width);
        encoder_ctx.set_height(height);
        encoder_ctx.set_format(ffmpeg_next::format::Pixel::YUV420P);
        encoder_ctx.set_time_base(time_base);
        encoder_ctx.set_frame_rate(Some(ffmpeg_next::Rational(rate.numerator, rate.denominator)));
        if global_header {
            encoder_ctx.set_flags(ffmpeg_next::codec::Flags::GLOBAL_HEADER);
        }

        let mut options = ffmpeg_next::Dictionary::new();
        if let Some(crf) = crf {
            options.set("crf", &crf.to_string());
        }
        let encoder = encoder_ctx.open_with(options)?;
        ost.set_parameters(&encoder);

        let scaler = ffmpeg_next::software::scaling::Context::get(
            decoder.format(),
            width,
            height,
            ffmpeg_next::format::Pixel::YUV420P,
            width,
            height,
            ffmpeg_next::software::scaling::Flags::BILINEAR,
        )?;

        Ok(Self {
            decoder,
            encoder,
            scaler,
            time_base,
            ost_index,
            frames: 0,
            packets: 0,
        })
    }

    fn run(
        &mut self,
        ictx: &mut ffmpeg_next::format::context::Input,
        input_index: usize,
        octx: &mut ffmpeg_next::format::context::Output,
    ) -> Result<usize, Box<dyn std::error::Error>> {
        for (stream, packet) in ictx.packets() {
            if stream.index() != input_index {
                continue;
            }
            if let Err(e) = self.decoder.send_packet(&packet) {
                log::debug!("Skipping undecodable video packet: {e}");
                continue;
            }
            self.encode_decoded(octx)?;
        }

        self.decoder.send_eof()?;
        self.encode_decoded(octx)?;
        self.encoder.send_eof()?;
        self.write_packets(octx)?;
        Ok(self.packets)
    }

    fn encode_decoded(
        &mut self,
        octx: &mut ffmpeg_next::format::context::Output,
    ) -> Result<(), Box<dyn std::error::Error>> {
        let mut decoded = ffmpeg_next::util::frame::video::Video::empty();
        while self.decoder.receive_frame(&mut decoded).is_ok() {
            let mut yuv = ffmpeg_next::util::frame::video::Video::empty();
            self.scaler.run(&decoded, &mut yuv)?;
            yuv.set_pts(Some(self.frames as i64));
            self.encoder.send_frame(&yuv)?;
            self.frames += 1;
            self.write_packets(octx)?;
        }
        Ok(())
    }

    fn write_packets(
        &mut self,
        octx: &mut ffmpeg_next::format::context::Output,
    ) -> Result<(), Box<dyn std::error::Error>> {
        let ost_time_base = output_time_base(octx, self.ost_index)?;
        let mut encoded = ffmpeg_next::Packet::empty();
        while self.encoder.receive_packet(&mut encoded).is_ok() {
            encoded.set_stream(self.ost_index);
            encoded.rescale_ts(self.time_base, ost_time_base);
            encoded.write_interleaved(octx)?;
            self.packets += 1;
        }
        Ok(())
    }
}

/// Decode → resample to planar f32 → FIFO → fixed-size encoder frames.
struct AudioTranscoder {
    decoder: ffmpeg_next::decoder::Audio,
    encoder: ffmpeg_next::codec::encoder::audio::Encoder,
    resampler: ffmpeg_next::software::resampling::Context,
    fifo: SampleFifo,
    layout: ffmpeg_next::ChannelLayout,
    rate: u32,
    frame_size: usize,
    ost_index: usize,
    max_samples: usize,
    accepted: usize,
    samples_sent: i64,
    packets: usize,
}

impl AudioTranscoder {
    fn new(
        codec_name: &str,
        source: &SourceStream,
        octx: &mut ffmpeg_next::format::context::Output,
        global_header: bool,
    ) -> Result<Self, Box<dyn std::error::Error>> {
        let decoder =
            ffmpeg_next::codec::context::Context::from_parameters(source.parameters.clone())?
                .decoder()
                .audio()?;
        let codec = ffmpeg_next::encoder::find_by_name(codec_name)
            .ok_or_else(|| MediaError::EncoderNotFound(codec_name.to_string()))?;

        let layout = decoder_layout(&decoder);
        let rate = decoder.rate();

        let mut ost = octx.add_stream(Some(codec))?;
        let ost_index = ost.index();

        let mut encoder_ctx = ffmpeg_next::codec::context::Context::new_with_codec(codec)
            .encoder()
            .audio()?;
        encoder_ctx.set_rate(rate as i32);
        encoder_ctx.set_channel_layout(layout);
        encoder_ctx.set_format(PLANAR_F32);
        encoder_ctx.set_time_base(ffmpeg_next::Rational(1, rate as i32));
        if global_header {
            encoder_ctx.set_flags(ffmpeg_next::codec::Flags::GLOBAL_HEADER);
        }
        let encoder = encoder_ctx.open_as(codec)?;
        ost.set_parameters(&encoder);

        let frame_size = match encoder.frame_size() {
            0 => VARIABLE_FRAME_CHUNK,
            n => n as usize,
        };

        let resampler = ffmpeg_next::software::resampling::Context::get(
            decoder.format(),
            layout,
            rate,
            PLANAR_F32,
            layout,
            rate,
        )?;

        Ok(Self {
            decoder,
            encoder,
            resampler,
            fifo: SampleFifo::new(layout.channels().max(1) as usize),
            layout,
            rate,
            frame_size,
            ost_index,
            max_samples: usize::MAX,
            accepted: 0,
            samples_sent: 0,
            packets: 0,
        })
    }

    fn run(
        &mut self,
        ictx: &mut ffmpeg_next::format::context::Input,
        input_index: usize,
        limit_secs: f64,
        octx: &mut ffmpeg_next::format::context::Output,
    ) -> Result<usize, Box<dyn std::error::Error>> {
        self.max_samples = sample_limit(limit_secs, self.rate);

        for (stream, packet) in ictx.packets() {
            if self.accepted >= self.max_samples {
                break;
            }
            if stream.index() != input_index {
                continue;
            }
            if let Err(e) = self.decoder.send_packet(&packet) {
                log::debug!("Skipping undecodable audio packet: {e}");
                continue;
            }
            self.resample_decoded(octx)?;
        }

        self.decoder.send_eof()?;
        self.resample_decoded(octx)?;

        let mut tail = ffmpeg_next::util::frame::audio::Audio::new(
            PLANAR_F32,
            self.frame_size,
            self.layout,
        );
        if self.resampler.flush(&mut tail).is_ok() {
            self.accept(&tail);
        }

        self.encode_fifo(octx, true)?;
        self.encoder.send_eof()?;
        self.write_packets(octx)?;
        Ok(self.packets)
    }

    fn resample_decoded(
        &mut self,
        octx: &mut ffmpeg_next::format::context::Output,
    ) -> Result<(), Box<dyn std::error::Error>> {
        let mut decoded = ffmpeg_next::util::frame::audio::Audio::empty();
        while self.decoder.receive_frame(&mut decoded).is_ok() {
            if decoded.channel_layout().is_empty() {
                decoded.set_channel_layout(self.layout);
            }
            let mut resampled = ffmpeg_next::util::frame::audio::Audio::empty();
            self.resampler.run(&decoded, &mut resampled)?;
            self.accept(&resampled);
            self.encode_fifo(octx, false)?;
        }
        Ok(())
    }

    /// Queues samples up to the duration limit; the rest are discarded.
    fn accept(&mut self, frame: &ffmpeg_next::util::frame::audio::Audio) {
        let take = frame
            .samples()
            .min(self.max_samples.saturating_sub(self.accepted));
        if take == 0 {
            return;
        }
        let planes: Vec<&[f32]> = (0..self.fifo.channels())
            .map(|c| &frame.plane::<f32>(c)[..take])
            .collect();
        self.fifo.push(&planes);
        self.accepted += take;
    }

    /// Sends full encoder frames; with `drain` also the final short one.
    fn encode_fifo(
        &mut self,
        octx: &mut ffmpeg_next::format::context::Output,
        drain: bool,
    ) -> Result<(), Box<dyn std::error::Error>> {
        while self.fifo.len() >= self.frame_size || (drain && !self.fifo.is_empty()) {
            let n = self.fifo.len().min(self.frame_size);
            let planes = self.fifo.pop(n);

            let mut frame =
                ffmpeg_next::util::frame::audio::Audio::new(PLANAR_F32, n, self.layout);
            frame.set_rate(self.rate);
            frame.set_pts(Some(self.samples_sent));
            for (c, plane) in planes.iter().enumerate() {
                frame.plane_mut::<f32>(c)[..n].copy_from_slice(plane);
            }

            self.encoder.send_frame(&frame)?;
            self.samples_sent += n as i64;
            self.write_packets(octx)?;
        }
        Ok(())
    }

    fn write_packets(
        &mut self,
        octx: &mut ffmpeg_next::format::context::Output,
    ) -> Result<(), Box<dyn std::error::Error>> {
        let encoder_time_base = ffmpeg_next::Rational(1, self.rate as i32);
        let ost_time_base = output_time_base(octx, self.ost_index)?;
        let mut encoded = ffmpeg_next::Packet::empty();
        while self.encoder.receive_packet(&mut encoded).is_ok() {
            encoded.set_stream(self.ost_index);
            encoded.rescale_ts(encoder_time_base, ost_time_base);
            encoded.write_interleaved(octx)?;
            self.packets += 1;
        }
        Ok(())
    }
}

/// Streams such as raw PCM may not declare a layout; assume the default
/// one for their channel count.
fn decoder_layout(decoder: &ffmpeg_next::decoder::Audio) -> ffmpeg_next::ChannelLayout {
    let layout = decoder.channel_layout();
    if layout.is_empty() {
        ffmpeg_next::ChannelLayout::default(decoder.channels() as i32)
    } else {
        layout
    }
}

fn seconds(ts: i64, time_base: ffmpeg_next::Rational) -> f64 {
    ts as f64 * time_base.numerator() as f64 / time_base.denominator() as f64
}

fn sample_limit(limit_secs: f64, rate: u32) -> usize {
    (limit_secs.max(0.0) * rate as f64).round() as usize
}

/// Per-channel sample queue between the resampler and the encoder.
struct SampleFifo {
    planes: Vec<VecDeque<f32>>,
}

impl SampleFifo {
    fn new(channels: usize) -> Self {
        Self {
            planes: vec![VecDeque::new(); channels],
        }
    }

    fn channels(&self) -> usize {
        self.planes.len()
    }

    fn len(&self) -> usize {
        self.planes.first().map_or(0, VecDeque::len)
    }

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn push(&mut self, planes: &[&[f32]]) {
        for (queue, samples) in self.planes.iter_mut().zip(planes) {
            queue.extend(samples.iter().copied());
        }
    }

    fn pop(&mut self, n: usize) -> Vec<Vec<f32>> {
        self.planes
            .iter_mut()
            .map(|queue| {
                let n = n.min(queue.len());
                queue.drain(..n).collect()
            })
            .collect()
    }
}
