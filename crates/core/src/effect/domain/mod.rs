pub mod edge_detector;
pub mod frame_effect;
