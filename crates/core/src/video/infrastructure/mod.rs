pub mod ffmpeg_audio_muxer;
pub mod ffmpeg_reader;
mod ffmpeg_support;
pub mod ffmpeg_writer;
pub mod image_file_reader;
pub mod image_file_writer;
pub mod media_error;
#[cfg(test)]
pub(crate) mod test_media;
