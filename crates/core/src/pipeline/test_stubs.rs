//! In-memory ports shared by the executor and use-case tests.

use std::path::Path;
use std::sync::{Arc, Mutex};

use crate::effect::domain::frame_effect::FrameEffect;
use crate::pipeline::pipeline_logger::PipelineLogger;
use crate::shared::frame::Frame;
use crate::shared::video_metadata::{FrameRate, VideoMetadata};
use crate::video::domain::video_reader::VideoReader;
use crate::video::domain::video_writer::VideoWriter;
use crate::video::infrastructure::media_error::MediaError;

pub type StubError = Box<dyn std::error::Error + Send + Sync>;

pub struct StubReader {
    frames: Vec<Result<Frame, StubError>>,
    pub closed: Arc<Mutex<bool>>,
}

impl StubReader {
    pub fn new(frames: Vec<Frame>) -> Self {
        Self::with_results(frames.into_iter().map(Ok).collect())
    }

    pub fn with_results(frames: Vec<Result<Frame, String>>) -> Self {
        Self::with_errors(
            frames
                .into_iter()
                .map(|r| r.map_err(|e| -> StubError { e.into() }))
                .collect(),
        )
    }

    pub fn with_errors(frames: Vec<Result<Frame, StubError>>) -> Self {
        Self {
            frames,
            closed: Arc::new(Mutex::new(false)),
        }
    }
}

impl VideoReader for StubReader {
    fn open(&mut self, _path: &Path) -> Result<VideoMetadata, Box<dyn std::error::Error>> {
        Ok(metadata(self.frames.len()))
    }

    fn frames(
        &mut self,
    ) -> Box<dyn Iterator<Item = Result<Frame, Box<dyn std::error::Error>>> + '_> {
        Box::new(
            self.frames
                .drain(..)
                .map(|r| r.map_err(|e| -> Box<dyn std::error::Error> { e })),
        )
    }

    fn close(&mut self) {
        *self.closed.lock().unwrap() = true;
    }
}

pub struct StubWriter {
    pub written: Arc<Mutex<Vec<Frame>>>,
    pub opened: Arc<Mutex<bool>>,
    pub closed: Arc<Mutex<bool>>,
    fail_at: Option<usize>,
    wrong_size: bool,
}

impl StubWriter {
    pub fn new() -> Self {
        Self {
            written: Arc::new(Mutex::new(Vec::new())),
            opened: Arc::new(Mutex::new(false)),
            closed: Arc::new(Mutex::new(false)),
            fail_at: None,
            wrong_size: false,
        }
    }

    /// Fails the write of the frame with this index.
    pub fn failing_at(index: usize) -> Self {
        Self {
            fail_at: Some(index),
            ..Self::new()
        }
    }

    /// Like `failing_at`, with a typed `DimensionMismatch`.
    pub fn rejecting_size_at(index: usize) -> Self {
        Self {
            fail_at: Some(index),
            wrong_size: true,
            ..Self::new()
        }
    }
}

impl VideoWriter for StubWriter {
    fn open(
        &mut self,
        _path: &Path,
        _metadata: &VideoMetadata,
    ) -> Result<(), Box<dyn std::error::Error>> {
        *self.opened.lock().unwrap() = true;
        Ok(())
    }

    fn write(&mut self, frame: &Frame) -> Result<(), Box<dyn std::error::Error>> {
        if self.fail_at == Some(frame.index()) {
            if self.wrong_size {
                return Err(MediaError::DimensionMismatch {
                    expected: (frame.width() + 1, frame.height()),
                    actual: (frame.width(), frame.height()),
                }
                .into());
            }
            return Err("disk full".into());
        }
        self.written.lock().unwrap().push(frame.clone());
        Ok(())
    }

    fn close(&mut self) -> Result<(), Box<dyn std::error::Error>> {
        *self.closed.lock().unwrap() = true;
        Ok(())
    }
}

/// Adds 1 to every byte and records which frames it saw.
pub struct IncrementEffect {
    pub seen: Arc<Mutex<Vec<usize>>>,
}

impl IncrementEffect {
    pub fn new() -> Self {
        Self {
            seen: Arc::new(Mutex::new(Vec::new())),
        }
    }
}

impl FrameEffect for IncrementEffect {
    fn apply(&self, frame: &mut Frame) -> Result<(), Box<dyn std::error::Error>> {
        self.seen.lock().unwrap().push(frame.index());
        for v in frame.data_mut() {
            *v = v.wrapping_add(1);
        }
        Ok(())
    }
}

pub struct FailingEffect;

impl FrameEffect for FailingEffect {
    fn apply(&self, _frame: &mut Frame) -> Result<(), Box<dyn std::error::Error>> {
        Err("effect error".into())
    }
}

pub fn make_frame(index: usize) -> Frame {
    Frame::new(vec![index as u8; 8 * 6 * 3], 8, 6, 3, index)
}

pub fn make_frames(count: usize) -> Vec<Frame> {
    (0..count).map(make_frame).collect()
}

pub fn metadata(total_frames: usize) -> VideoMetadata {
    VideoMetadata {
        width: 8,
        height: 6,
        frame_rate: FrameRate::new(25, 1),
        total_frames,
        codec: String::new(),
        source_path: None,
    }
}

/// Records stage and metric names in arrival order.
pub struct RecordingLogger {
    pub events: Arc<Mutex<Vec<String>>>,
}

impl RecordingLogger {
    pub fn new() -> Self {
        Self {
            events: Arc::new(Mutex::new(Vec::new())),
        }
    }
}

impl PipelineLogger for RecordingLogger {
    fn progress(&mut self, current: usize, _total: usize) {
        self.events.lock().unwrap().push(format!("progress:{current}"));
    }

    fn timing(&mut self, stage: &str, _duration_ms: f64) {
        self.events.lock().unwrap().push(format!("timing:{stage}"));
    }

    fn metric(&mut self, name: &str, _value: f64) {
        self.events.lock().unwrap().push(format!("metric:{name}"));
    }
}
