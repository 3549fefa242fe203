pub mod audio_muxer;
pub mod image_writer;
pub mod video_reader;
pub mod video_writer;
