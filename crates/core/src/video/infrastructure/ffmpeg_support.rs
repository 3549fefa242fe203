use crate::shared::constants::FALLBACK_FPS;
use crate::shared::video_metadata::FrameRate;

/// Exact stream frame rate: the average rate when known, else the real base
/// rate. May be invalid (0/0) for streams that carry neither.
pub(crate) fn stream_frame_rate(stream: &ffmpeg_next::format::stream::Stream) -> FrameRate {
    let avg = stream.avg_frame_rate();
    let avg = FrameRate::new(avg.numerator(), avg.denominator());
    if avg.is_valid() {
        return avg;
    }
    let base = stream.rate();
    FrameRate::new(base.numerator(), base.denominator())
}

/// `rate`, or the fallback rate when the container reported nothing usable.
pub(crate) fn usable_frame_rate(rate: FrameRate) -> FrameRate {
    if rate.is_valid() {
        rate
    } else {
        log::warn!("No usable frame rate, falling back to {FALLBACK_FPS} fps");
        FrameRate::new(FALLBACK_FPS, 1)
    }
}

/// Largest numerator or denominator MPEG-4 Part 2 accepts in a time base.
const MAX_TIME_BASE_TERM: i64 = 65_535;

/// `rate` as the closest fraction whose terms fit an encoder time base.
///
/// Demuxers may report an average rate such as `5394000/179993`; encoders
/// like `mpeg4` refuse time bases with terms above 65535. Uses the last
/// continued-fraction convergent within that bound.
pub(crate) fn encoder_frame_rate(rate: FrameRate) -> FrameRate {
    let (num, den) = (rate.numerator as i64, rate.denominator as i64);
    if num <= MAX_TIME_BASE_TERM && den <= MAX_TIME_BASE_TERM {
        return rate;
    }

    let (mut h_prev, mut h) = (0i64, 1i64);
    let (mut k_prev, mut k) = (1i64, 0i64);
    let (mut n, mut d) = (num, den);
    while d != 0 {
        let a = n / d;
        let h_next = a * h + h_prev;
        let k_next = a * k + k_prev;
        if h_next > MAX_TIME_BASE_TERM || k_next > MAX_TIME_BASE_TERM {
            break;
        }
        (h_prev, h) = (h, h_next);
        (k_prev, k) = (k, k_next);
        (n, d) = (d, n - a * d);
    }

    if k == 0 {
        return FrameRate::new(MAX_TIME_BASE_TERM as i32, 1);
    }
    log::debug!(
        "Approximating {}/{} fps as {h}/{k} for the encoder",
        rate.numerator,
        rate.denominator
    );
    FrameRate::new(h as i32, k as i32)
}

/// One tick per frame.
pub(crate) fn frame_time_base(rate: FrameRate) -> ffmpeg_next::Rational {
    ffmpeg_next::Rational(rate.denominator, rate.numerator)
}

pub(crate) fn output_time_base(
    octx: &ffmpeg_next::format::context::Output,
    index: usize,
) -> Result<ffmpeg_next::Rational, Box<dyn std::error::Error>> {
    Ok(octx
        .stream(index)
        .ok_or_else(|| format!("output stream {index} missing"))?
        .time_base())
}

pub(crate) fn wants_global_header(octx: &ffmpeg_next::format::context::Output) -> bool {
    octx.format()
        .flags()
        .contains(ffmpeg_next::format::Flags::GLOBAL_HEADER)
}

/// Strips row padding from an RGB24 frame (stride may exceed `width * 3`).
pub(crate) fn packed_rgb(
    rgb_frame: &ffmpeg_next::util::frame::video::Video,
    width: u32,
    height: u32,
) -> Vec<u8> {
    let stride = rgb_frame.stride(0);
    let data = rgb_frame.data(0);
    let row_len = width as usize * 3;

    let mut pixels = Vec::with_capacity(row_len * height as usize);
    for row in 0..height as usize {
        let start = row * stride;
        pixels.extend_from_slice(&data[start..start + row_len]);
    }
    pixels
}

/// Copies tightly packed RGB24 bytes into a (possibly padded) frame.
pub(crate) fn fill_rgb(
    rgb_frame: &mut ffmpeg_next::util::frame::video::Video,
    pixels: &[u8],
    width: u32,
    height: u32,
) {
    let stride = rgb_frame.stride(0);
    let data = rgb_frame.data_mut(0);
    let row_len = width as usize * 3;

    for row in 0..height as usize {
        let src = row * row_len;
        let dst = row * stride;
        data[dst..dst + row_len].copy_from_slice(&pixels[src..src + row_len]);
    }
}
