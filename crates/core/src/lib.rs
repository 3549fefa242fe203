pub mod effect;
pub mod pipeline;
pub mod shared;
pub mod video;
