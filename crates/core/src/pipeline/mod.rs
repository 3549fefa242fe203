pub mod infrastructure;
pub mod pipeline_executor;
pub mod pipeline_logger;
pub mod reattach_audio_use_case;
pub mod rotoscope_image_use_case;
pub mod rotoscope_video_use_case;
#[cfg(test)]
pub(crate) mod test_stubs;
