//! Synthetic clips for tests: MPEG-4 video of a moving square, optionally
//! with a mono AAC tone. Depends on nothing but ffmpeg-next so integration
//! tests can include it by path.

use std::path::Path;

pub const TONE_RATE: u32 = 44_100;

pub const SQUARE_COLOUR: [u8; 3] = [220, 180, 60];
const BACKGROUND: [u8; 3] = [10, 10, 10];

pub struct ClipSpec {
    pub frames: usize,
    pub width: u32,
    pub height: u32,
    pub fps: i32,
    /// Seconds of 440 Hz tone; `None` writes a file without audio.
    pub audio_secs: Option<f64>,
}

impl ClipSpec {
    pub fn video(frames: usize, width: u32, height: u32, fps: i32) -> Self {
        Self {
            frames,
            width,
            height,
            fps,
            audio_secs: None,
        }
    }

    pub fn with_audio(mut self, secs: f64) -> Self {
        self.audio_secs = Some(secs);
        self
    }
}

/// Packed RGB for frame `index`: a square drifting right over a dark field.
pub fn pattern_pixels(index: usize, width: u32, height: u32) -> Vec<u8> {
    let (w, h) = (width as usize, height as usize);
    let side = (w.min(h) / 3).max(2);
    let x0 = (4 + index * 2) % w.saturating_sub(side).max(1);
    let y0 = h.saturating_sub(side) / 2;

    let mut pixels = Vec::with_capacity(w * h * 3);
    for y in 0..h {
        for x in 0..w {
            let inside = (x0..x0 + side).contains(&x) && (y0..y0 + side).contains(&y);
            pixels.extend_from_slice(if inside { &SQUARE_COLOUR } else { &BACKGROUND });
        }
    }
    pixels
}

pub fn write_clip(path: &Path, spec: &ClipSpec) {
    ffmpeg_next::init().unwrap();

    let mut octx = ffmpeg_next::format::output(path).unwrap();
    let global_header = octx
        .format()
        .flags()
        .contains(ffmpeg_next::format::Flags::GLOBAL_HEADER);

    let video_tb = ffmpeg_next::Rational(1, spec.fps);
    let vcodec = ffmpeg_next::encoder::find(ffmpeg_next::codec::Id::MPEG4).unwrap();
    let mut vctx = ffmpeg_next::codec::context::Context::new_with_codec(vcodec)
        .encoder()
        .video()
        .unwrap();
    vctx.set_width(spec.width);
    vctx.set_height(spec.height);
    vctx.set_format(ffmpeg_next::format::Pixel::YUV420P);
    vctx.set_time_base(video_tb);
    vctx.set_frame_rate(Some(ffmpeg_next::Rational(spec.fps, 1)));
    if global_header {
        vctx.set_flags(ffmpeg_next::codec::Flags::GLOBAL_HEADER);
    }
    let mut venc = vctx.open_with(ffmpeg_next::Dictionary::new()).unwrap();
    let mut vost = octx.add_stream(Some(vcodec)).unwrap();
    vost.set_parameters(&venc);
    let video_index = vost.index();

    let mut audio = spec.audio_secs.map(|secs| {
        let acodec = ffmpeg_next::encoder::find(ffmpeg_next::codec::Id::AAC).unwrap();
        let mut actx = ffmpeg_next::codec::context::Context::new_with_codec(acodec)
            .encoder()
            .audio()
            .unwrap();
        actx.set_rate(TONE_RATE as i32);
        actx.set_channel_layout(ffmpeg_next::ChannelLayout::MONO);
        actx.set_format(ffmpeg_next::format::Sample::F32(
            ffmpeg_next::format::sample::Type::Planar,
        ));
        actx.set_time_base(ffmpeg_next::Rational(1, TONE_RATE as i32));
        actx.set_bit_rate(64_000);
        if global_header {
            actx.set_flags(ffmpeg_next::codec::Flags::GLOBAL_HEADER);
        }
        let aenc = actx.open_as(acodec).unwrap();
        let mut aost = octx.add_stream(Some(acodec)).unwrap();
        aost.set_parameters(&aenc);
        (aenc, aost.index(), secs)
    });

    octx.write_header().unwrap();

    let mut scaler = ffmpeg_next::software::scaling::Context::get(
        ffmpeg_next::format::Pixel::RGB24,
        spec.width,
        spec.height,
        ffmpeg_next::format::Pixel::YUV420P,
        spec.width,
        spec.height,
        ffmpeg_next::software::scaling::Flags::BILINEAR,
    )
    .unwrap();

    for i in 0..spec.frames {
        let mut rgb = ffmpeg_next::util::frame::video::Video::new(
            ffmpeg_next::format::Pixel::RGB24,
            spec.width,
            spec.height,
        );
        let stride = rgb.stride(0);
        let row_len = spec.width as usize * 3;
        let pixels = pattern_pixels(i, spec.width, spec.height);
        let data = rgb.data_mut(0);
        for row in 0..spec.height as usize {
            data[row * stride..row * stride + row_len]
                .copy_from_slice(&pixels[row * row_len..(row + 1) * row_len]);
        }

        let mut yuv = ffmpeg_next::util::frame::video::Video::empty();
        scaler.run(&rgb, &mut yuv).unwrap();
        yuv.set_pts(Some(i as i64));
        venc.send_frame(&yuv).unwrap();
        drain(&mut venc, &mut octx, video_index, video_tb);
    }
    venc.send_eof().unwrap();
    drain(&mut venc, &mut octx, video_index, video_tb);

    if let Some((aenc, audio_index, secs)) = audio.as_mut() {
        let audio_tb = ffmpeg_next::Rational(1, TONE_RATE as i32);
        let total = (*secs * TONE_RATE as f64) as usize;
        let frame_size = match aenc.frame_size() {
            0 => 1024,
            n => n as usize,
        };

        let mut sent = 0usize;
        while sent < total {
            let n = frame_size.min(total - sent);
            let mut frame = ffmpeg_next::util::frame::audio::Audio::new(
                ffmpeg_next::format::Sample::F32(ffmpeg_next::format::sample::Type::Planar),
                n,
                ffmpeg_next::ChannelLayout::MONO,
            );
            frame.set_rate(TONE_RATE);
            frame.set_pts(Some(sent as i64));
            for (k, sample) in frame.plane_mut::<f32>(0).iter_mut().enumerate() {
                let t = (sent + k) as f32 / TONE_RATE as f32;
                *sample = 0.3 * (2.0 * std::f32::consts::PI * 440.0 * t).sin();
            }
            aenc.send_frame(&frame).unwrap();
            drain(aenc, &mut octx, *audio_index, audio_tb);
            sent += n;
        }
        aenc.send_eof().unwrap();
        drain(aenc, &mut octx, *audio_index, audio_tb);
    }

    octx.write_trailer().unwrap();
}

fn drain(
    encoder: &mut ffmpeg_next::encoder::Encoder,
    octx: &mut ffmpeg_next::format::context::Output,
    stream_index: usize,
    encoder_tb: ffmpeg_next::Rational,
) {
    let ost_tb = octx.stream(stream_index).unwrap().time_base();
    let mut packet = ffmpeg_next::Packet::empty();
    while encoder.receive_packet(&mut packet).is_ok() {
        packet.set_stream(stream_index);
        packet.rescale_ts(encoder_tb, ost_tb);
        packet.write_interleaved(octx).unwrap();
    }
}

/// Stream counts and decoded video frame count of a finished file.
pub struct ClipInfo {
    pub width: u32,
    pub height: u32,
    pub frame_rate: (i32, i32),
    pub video_frames: usize,
    pub has_audio: bool,
    pub audio_secs: f64,
}

pub fn inspect(path: &Path) -> ClipInfo {
    ffmpeg_next::init().unwrap();
    let mut ictx = ffmpeg_next::format::input(path).unwrap();

    let vstream = ictx.streams().best(ffmpeg_next::media::Type::Video).unwrap();
    let video_index = vstream.index();
    let rate = vstream.avg_frame_rate();
    let mut decoder = ffmpeg_next::codec::context::Context::from_parameters(vstream.parameters())
        .unwrap()
        .decoder()
        .video()
        .unwrap();

    let audio = ictx
        .streams()
        .best(ffmpeg_next::media::Type::Audio)
        .map(|s| (s.index(), s.time_base()));

    let mut video_frames = 0;
    let mut audio_end = 0i64;
    let mut decoded = ffmpeg_next::util::frame::video::Video::empty();
    for (stream, packet) in ictx.packets() {
        if Some(stream.index()) == audio.map(|(i, _)| i) {
            let end = packet.pts().unwrap_or(0) + packet.duration();
            audio_end = audio_end.max(end);
            continue;
        }
        if stream.index() != video_index {
            continue;
        }
        decoder.send_packet(&packet).unwrap();
        while decoder.receive_frame(&mut decoded).is_ok() {
            video_frames += 1;
        }
    }
    decoder.send_eof().unwrap();
    while decoder.receive_frame(&mut decoded).is_ok() {
        video_frames += 1;
    }

    let audio_secs = audio
        .map(|(_, tb)| audio_end as f64 * tb.numerator() as f64 / tb.denominator() as f64)
        .unwrap_or(0.0);

    ClipInfo {
        width: decoder.width(),
        height: decoder.height(),
        frame_rate: (rate.numerator(), rate.denominator()),
        video_frames,
        has_audio: audio.is_some(),
        audio_secs,
    }
}

/// Every decoded video frame as packed RGB24.
pub fn decode_rgb(path: &Path) -> Vec<Vec<u8>> {
    ffmpeg_next::init().unwrap();
    let mut ictx = ffmpeg_next::format::input(path).unwrap();
    let vstream = ictx.streams().best(ffmpeg_next::media::Type::Video).unwrap();
    let video_index = vstream.index();
    let mut decoder = ffmpeg_next::codec::context::Context::from_parameters(vstream.parameters())
        .unwrap()
        .decoder()
        .video()
        .unwrap();
    let (w, h) = (decoder.width(), decoder.height());
    let mut scaler = ffmpeg_next::software::scaling::Context::get(
        decoder.format(),
        w,
        h,
        ffmpeg_next::format::Pixel::RGB24,
        w,
        h,
        ffmpeg_next::software::scaling::Flags::BILINEAR,
    )
    .unwrap();

    let mut out = Vec::new();
    let mut take = |decoder: &mut ffmpeg_next::decoder::Video, out: &mut Vec<Vec<u8>>| {
        let mut decoded = ffmpeg_next::util::frame::video::Video::empty();
        while decoder.receive_frame(&mut decoded).is_ok() {
            let mut rgb = ffmpeg_next::util::frame::video::Video::empty();
            scaler.run(&decoded, &mut rgb).unwrap();
            let stride = rgb.stride(0);
            let mut pixels = Vec::with_capacity((w * h * 3) as usize);
            for row in 0..h as usize {
                pixels.extend_from_slice(&rgb.data(0)[row * stride..row * stride + w as usize * 3]);
            }
            out.push(pixels);
        }
    };

    for (stream, packet) in ictx.packets() {
        if stream.index() == video_index {
            decoder.send_packet(&packet).unwrap();
            take(&mut decoder, &mut out);
        }
    }
    decoder.send_eof().unwrap();
    take(&mut decoder, &mut out);
    out
}
