use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::Instant;

use crate::effect::domain::frame_effect::FrameEffect;
use crate::pipeline::pipeline_executor::{PipelineConfig, PipelineExecutor};
use crate::shared::frame::Frame;
use crate::shared::video_metadata::VideoMetadata;
use crate::video::domain::video_reader::VideoReader;
use crate::video::domain::video_writer::VideoWriter;
use crate::video::infrastructure::media_error::MediaError;

const DEFAULT_CHANNEL_CAPACITY: usize = 8;

type SendError = Box<dyn std::error::Error + Send + Sync>;

/// Executes the frame loop with dedicated threads for decoding and encoding.
///
/// Layout: `reader → main [effect] → writer`
///
/// The effect stays on the calling thread, so there is a single consumer
/// and frames reach the writer in decode order.
pub struct ThreadedPipelineExecutor {
    channel_capacity: usize,
}

impl ThreadedPipelineExecutor {
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_CHANNEL_CAPACITY)
    }

    pub fn with_capacity(channel_capacity: usize) -> Self {
        Self {
            channel_capacity: channel_capacity.max(1),
        }
    }
}

impl Default for ThreadedPipelineExecutor {
    fn default() -> Self {
        Self::new()
    }
}

impl PipelineExecutor for ThreadedPipelineExecutor {
    fn execute(
        &self,
        mut reader: Box<dyn VideoReader>,
        mut writer: Box<dyn VideoWriter>,
        effect: Box<dyn FrameEffect>,
        metadata: &VideoMetadata,
        output_path: &Path,
        mut config: PipelineConfig,
    ) -> Result<usize, Box<dyn std::error::Error>> {
        if let Err(e) = writer.open(output_path, metadata) {
            reader.close();
            return Err(e);
        }

        let cap = self.channel_capacity;
        let (frame_tx, frame_rx) = crossbeam_channel::bounded::<Result<Frame, SendError>>(cap);
        let (write_tx, write_rx) = crossbeam_channel::bounded::<Frame>(cap);

        let reader_handle = spawn_reader(reader, frame_tx, config.cancelled.clone());
        let writer_handle = spawn_writer(writer, write_rx);

        let outcome = run_main_loop(
            frame_rx,
            write_tx,
            &*effect,
            metadata.total_frames,
            &mut config,
        );

        let result = join_threads(reader_handle, writer_handle, outcome);
        config.logger.summary();
        result
    }
}

fn spawn_reader(
    mut reader: Box<dyn VideoReader>,
    frame_tx: crossbeam_channel::Sender<Result<Frame, SendError>>,
    cancelled: Arc<AtomicBool>,
) -> JoinHandle<()> {
    std::thread::spawn(move || {
        for frame_result in reader.frames() {
            if cancelled.load(Ordering::Relaxed) {
                break;
            }
            let mapped = frame_result.map_err(sendable);
            let failed = mapped.is_err();
            if frame_tx.send(mapped).is_err() || failed {
                break;
            }
        }
        reader.close();
    })
}

fn spawn_writer(
    mut writer: Box<dyn VideoWriter>,
    write_rx: crossbeam_channel::Receiver<Frame>,
) -> JoinHandle<Result<(), SendError>> {
    std::thread::spawn(move || {
        let mut write_error = None;
        for frame in write_rx {
            if let Err(e) = writer.write(&frame) {
                write_error = Some(sendable(e));
                break;
            }
        }
        let closed = writer.close().map_err(sendable);
        match (write_error, closed) {
            (Some(e), _) | (None, Err(e)) => Err(e),
            (None, Ok(())) => Ok(()),
        }
    })
}

/// Carries a port error to another thread. `MediaError` keeps its type so
/// callers can still downcast it; anything else travels as its message.
fn sendable(e: Box<dyn std::error::Error>) -> SendError {
    match e.downcast::<MediaError>() {
        Ok(media) => media,
        Err(other) => other.to_string().into(),
    }
}

/// What the main loop ended with. `WriterGone` means the writer thread hung
/// up early and its own error is the one to report.
enum MainOutcome {
    Finished(usize),
    Failed(Box<dyn std::error::Error>),
    WriterGone(usize),
}

fn run_main_loop(
    frame_rx: crossbeam_channel::Receiver<Result<Frame, SendError>>,
    write_tx: crossbeam_channel::Sender<Frame>,
    effect: &dyn FrameEffect,
    total_frames: usize,
    config: &mut PipelineConfig,
) -> MainOutcome {
    let mut processed = 0usize;

    loop {
        config
            .logger
            .metric("reader_queue_depth", frame_rx.len() as f64);

        let Ok(frame_result) = frame_rx.recv() else {
            break;
        };
        if config.cancelled.load(Ordering::Relaxed) {
            log::info!("Cancelled after {processed} frames");
            break;
        }

        let mut frame = match frame_result {
            Ok(frame) => frame,
            Err(e) => return MainOutcome::Failed(e),
        };

        let started = Instant::now();
        if let Err(e) = effect.apply(&mut frame) {
            return MainOutcome::Failed(e);
        }
        config
            .logger
            .timing("effect", started.elapsed().as_secs_f64() * 1000.0);

        if write_tx.send(frame).is_err() {
            return MainOutcome::WriterGone(processed);
        }

        processed += 1;
        config.logger.progress(processed, total_frames);

        if let Some(ref callback) = config.on_progress {
            if !callback(processed, total_frames) {
                return MainOutcome::Failed(MediaError::Cancelled.into());
            }
        }
    }

    MainOutcome::Finished(processed)
}

/// Joins both I/O threads and coalesces the first error encountered.
///
/// The receiver and sender owned by the main loop are already dropped here,
/// so neither thread can block on a full or empty channel.
fn join_threads(
    reader_handle: JoinHandle<()>,
    writer_handle: JoinHandle<Result<(), SendError>>,
    outcome: MainOutcome,
) -> Result<usize, Box<dyn std::error::Error>> {
    let (mut first_error, processed) = match outcome {
        MainOutcome::Finished(n) => (None, n),
        MainOutcome::Failed(e) => (Some(e), 0),
        MainOutcome::WriterGone(n) => (None, n),
    };

    if reader_handle.join().is_err() {
        first_error.get_or_insert_with(|| "Reader thread panicked".into());
    }

    match writer_handle.join() {
        Ok(Ok(())) => {}
        Ok(Err(e)) => {
            let e: Box<dyn std::error::Error> = e;
            first_error.get_or_insert(e);
        }
        Err(_) => {
            first_error.get_or_insert_with(|| "Writer thread panicked".into());
        }
    }

    match first_error {
        Some(e) => Err(e),
        None => Ok(processed),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::test_stubs::*;
    use rstest::rstest;

    fn run(
        executor: ThreadedPipelineExecutor,
        reader: StubReader,
        writer: StubWriter,
        effect: Box<dyn FrameEffect>,
        config: PipelineConfig,
    ) -> Result<usize, Box<dyn std::error::Error>> {
        executor.execute(
            Box::new(reader),
            Box::new(writer),
            effect,
            &metadata(0),
            Path::new("out.mp4"),
            config,
        )
    }

    #[rstest]
    #[case::unit_queue(1)]
    #[case::default_queue(DEFAULT_CHANNEL_CAPACITY)]
    #[case::oversized_queue(64)]
    fn test_preserves_frame_order(#[case] capacity: usize) {
        let writer = StubWriter::new();
        let written = writer.written.clone();

        let count = run(
            ThreadedPipelineExecutor::with_capacity(capacity),
            StubReader::new(make_frames(20)),
            writer,
            Box::new(IncrementEffect::new()),
            PipelineConfig::default(),
        )
        .unwrap();

        assert_eq!(count, 20);
        let indices: Vec<_> = written.lock().unwrap().iter().map(|f| f.index()).collect();
        assert_eq!(indices, (0..20).collect::<Vec<_>>());
    }

    #[test]
    fn test_empty_input_closes_both_ends() {
        let reader = StubReader::new(vec![]);
        let reader_closed = reader.closed.clone();
        let writer = StubWriter::new();
        let writer_closed = writer.closed.clone();

        let count = run(
            ThreadedPipelineExecutor::new(),
            reader,
            writer,
            Box::new(IncrementEffect::new()),
            PipelineConfig::default(),
        )
        .unwrap();

        assert_eq!(count, 0);
        assert!(*reader_closed.lock().unwrap());
        assert!(*writer_closed.lock().unwrap());
    }

    #[test]
    fn test_effect_error_propagates_and_closes_both_ends() {
        let reader = StubReader::new(make_frames(30));
        let reader_closed = reader.closed.clone();
        let writer = StubWriter::new();
        let writer_closed = writer.closed.clone();

        let err = run(
            ThreadedPipelineExecutor::new(),
            reader,
            writer,
            Box::new(FailingEffect),
            PipelineConfig::default(),
        )
        .unwrap_err();

        assert_eq!(err.to_string(), "effect error");
        assert!(*reader_closed.lock().unwrap());
        assert!(*writer_closed.lock().unwrap());
    }

    #[test]
    fn test_writer_error_is_reported() {
        let err = run(
            ThreadedPipelineExecutor::with_capacity(1),
            StubReader::new(make_frames(10)),
            StubWriter::failing_at(2),
            Box::new(IncrementEffect::new()),
            PipelineConfig::default(),
        )
        .unwrap_err();
        assert_eq!(err.to_string(), "disk full");
    }

    #[test]
    fn test_reader_error_is_reported() {
        let reader = StubReader::with_results(vec![
            Ok(make_frame(0)),
            Err("corrupt stream".to_string()),
        ]);
        let err = run(
            ThreadedPipelineExecutor::new(),
            reader,
            StubWriter::new(),
            Box::new(IncrementEffect::new()),
            PipelineConfig::default(),
        )
        .unwrap_err();
        assert_eq!(err.to_string(), "corrupt stream");
    }

    #[test]
    fn test_reader_media_error_keeps_its_type() {
        let reader = StubReader::with_errors(vec![
            Ok(make_frame(0)),
            Err(MediaError::NotOpened("StubReader").into()),
        ]);
        let err = run(
            ThreadedPipelineExecutor::new(),
            reader,
            StubWriter::new(),
            Box::new(IncrementEffect::new()),
            PipelineConfig::default(),
        )
        .unwrap_err();
        assert!(matches!(
            err.downcast_ref::<MediaError>(),
            Some(MediaError::NotOpened("StubReader"))
        ));
    }

    #[test]
    fn test_writer_media_error_keeps_its_type() {
        let err = run(
            ThreadedPipelineExecutor::with_capacity(1),
            StubReader::new(make_frames(10)),
            StubWriter::rejecting_size_at(3),
            Box::new(IncrementEffect::new()),
            PipelineConfig::default(),
        )
        .unwrap_err();
        assert!(matches!(
            err.downcast_ref::<MediaError>(),
            Some(MediaError::DimensionMismatch { .. })
        ));
    }

    #[test]
    fn test_callback_false_is_cancelled_error() {
        let config = PipelineConfig {
            on_progress: Some(Box::new(|current, _| current < 3)),
            ..PipelineConfig::default()
        };
        let err = run(
            ThreadedPipelineExecutor::new(),
            StubReader::new(make_frames(50)),
            StubWriter::new(),
            Box::new(IncrementEffect::new()),
            config,
        )
        .unwrap_err();
        assert!(matches!(
            err.downcast_ref::<MediaError>(),
            Some(MediaError::Cancelled)
        ));
    }

    #[test]
    fn test_cancel_flag_stops_early_without_error() {
        let cancelled = Arc::new(AtomicBool::new(false));
        let flag = cancelled.clone();
        let config = PipelineConfig {
            on_progress: Some(Box::new(move |current, _| {
                if current == 5 {
                    flag.store(true, Ordering::Relaxed);
                }
                true
            })),
            cancelled,
            ..PipelineConfig::default()
        };

        let count = run(
            ThreadedPipelineExecutor::new(),
            StubReader::new(make_frames(100)),
            StubWriter::new(),
            Box::new(IncrementEffect::new()),
            config,
        )
        .unwrap();
        assert_eq!(count, 5);
    }

    #[test]
    fn test_records_effect_timing_and_queue_depth() {
        let logger = RecordingLogger::new();
        let events = logger.events.clone();
        let config = PipelineConfig {
            logger: Box::new(logger),
            ..PipelineConfig::default()
        };
        run(
            ThreadedPipelineExecutor::new(),
            StubReader::new(make_frames(4)),
            StubWriter::new(),
            Box::new(IncrementEffect::new()),
            config,
        )
        .unwrap();

        let events = events.lock().unwrap();
        let count = |name: &str| events.iter().filter(|e| *e == name).count();
        assert_eq!(count("timing:effect"), 4);
        assert_eq!(count("progress:4"), 1);
        assert!(count("metric:reader_queue_depth") >= 4);
    }
}
