pub mod constants;
pub mod frame;
pub mod gray_frame;
pub mod paths;
pub mod settings;
pub mod video_metadata;
