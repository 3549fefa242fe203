pub mod canny_edge_detector;
pub mod contrast;
pub mod luma;
pub mod mask;
pub mod morphology;
pub mod rotoscope_effect;
