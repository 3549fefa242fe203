use std::path::Path;

use crate::effect::domain::frame_effect::FrameEffect;
use crate::video::domain::image_writer::ImageWriter;
use crate::video::domain::video_reader::VideoReader;

/// Single-image pipeline: read → effect → write.
pub struct RotoscopeImageUseCase {
    reader: Box<dyn VideoReader>,
    image_writer: Box<dyn ImageWriter>,
    effect: Box<dyn FrameEffect>,
}

impl RotoscopeImageUseCase {
    pub fn new(
        reader: Box<dyn VideoReader>,
        image_writer: Box<dyn ImageWriter>,
        effect: Box<dyn FrameEffect>,
    ) -> Self {
        Self {
            reader,
            image_writer,
            effect,
        }
    }

    pub fn execute(
        &mut self,
        input_path: &Path,
        output_path: &Path,
    ) -> Result<(), Box<dyn std::error::Error>> {
        self.reader.open(input_path)?;
        let first = self.reader.frames().next();
        self.reader.close();

        let mut frame = first.ok_or("No frames in image")??;
        self.effect.apply(&mut frame)?;
        self.image_writer.write(output_path, &frame)?;

        log::info!("Wrote {}", output_path.display());
        Ok(())
    }
}
