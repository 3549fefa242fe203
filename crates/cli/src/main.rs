mod progress;

use std::path::{Path, PathBuf};
use std::process;

use clap::Parser;

use rotoscope_core::effect::infrastructure::rotoscope_effect::RotoscopeEffect;
use rotoscope_core::pipeline::infrastructure::sequential_pipeline_executor::SequentialPipelineExecutor;
use rotoscope_core::pipeline::infrastructure::threaded_pipeline_executor::ThreadedPipelineExecutor;
use rotoscope_core::pipeline::pipeline_executor::PipelineExecutor;
use rotoscope_core::pipeline::reattach_audio_use_case::ReattachAudioUseCase;
use rotoscope_core::pipeline::rotoscope_image_use_case::RotoscopeImageUseCase;
use rotoscope_core::pipeline::rotoscope_video_use_case::RotoscopeVideoUseCase;
use rotoscope_core::shared::constants::{
    DEFAULT_INTERMEDIATE_NAME, DEFAULT_OUTPUT_NAME, IMAGE_EXTENSIONS,
};
use rotoscope_core::shared::paths::same_file;
use rotoscope_core::shared::settings::RotoscopeSettings;
use rotoscope_core::video::domain::video_reader::VideoReader;
use rotoscope_core::video::infrastructure::ffmpeg_audio_muxer::FfmpegAudioMuxer;
use rotoscope_core::video::infrastructure::ffmpeg_reader::FfmpegReader;
use rotoscope_core::video::infrastructure::ffmpeg_writer::FfmpegWriter;
use rotoscope_core::video::infrastructure::image_file_reader::ImageFileReader;
use rotoscope_core::video::infrastructure::image_file_writer::ImageFileWriter;

/// Rotoscope effect for videos and images: only edges keep their colour.
#[derive(Parser)]
#[command(name = "rotoscope", version)]
struct Cli {
    /// Input video or image file.
    input: PathBuf,

    /// Output file [default: rotoscoped_with_audio.mp4, or
    /// <input>_rotoscoped.<ext> for images].
    output: Option<PathBuf>,

    /// Silent intermediate video [default: rotoscoped_silent.mp4 next to
    /// the output].
    #[arg(long)]
    intermediate: Option<PathBuf>,

    /// JSON settings file [default: <config dir>/rotoscope/settings.json].
    #[arg(long)]
    config: Option<PathBuf>,

    /// Luma values at or below this become black.
    #[arg(long)]
    contrast_low: Option<u8>,

    /// Luma values at or above this become white.
    #[arg(long)]
    contrast_high: Option<u8>,

    /// Weak edge threshold.
    #[arg(long)]
    canny_low: Option<f32>,

    /// Strong edge threshold.
    #[arg(long)]
    canny_high: Option<f32>,

    /// Side of the square dilation kernel.
    #[arg(long)]
    dilate_size: Option<usize>,

    /// Dilation passes (0 disables dilation).
    #[arg(long)]
    dilate_iterations: Option<usize>,

    /// Encoder for the silent intermediate video.
    #[arg(long)]
    intermediate_codec: Option<String>,

    /// Encoder for the final video stream ("copy" to remux).
    #[arg(long)]
    video_codec: Option<String>,

    /// Encoder for the final audio stream ("copy" to remux).
    #[arg(long)]
    audio_codec: Option<String>,

    /// CRF quality for the final video encode (0=lossless, 51=worst).
    #[arg(long)]
    crf: Option<u32>,

    /// Decode and encode on separate threads.
    #[arg(long)]
    threaded: bool,

    /// Write the silent video straight to the output and stop there.
    #[arg(long)]
    skip_audio: bool,

    /// Delete the silent intermediate once the final output is written.
    #[arg(long)]
    remove_intermediate: bool,
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    if let Err(e) = run() {
        eprintln!("Error: {e}");
        process::exit(1);
    }
}

fn run() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    validate(&cli)?;
    let settings = resolve_settings(&cli)?;

    if is_image(&cli.input) {
        let output = cli
            .output
            .clone()
            .unwrap_or_else(|| default_image_output(&cli.input));
        run_image(&cli.input, &output, &settings)
    } else {
        run_video(&cli, &settings)
    }
}

fn run_image(
    input: &Path,
    output: &Path,
    settings: &RotoscopeSettings,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut use_case = RotoscopeImageUseCase::new(
        Box::new(ImageFileReader::new()),
        Box::new(ImageFileWriter::new()),
        Box::new(RotoscopeEffect::from_settings(&settings.effect)),
    );
    use_case.execute(input, output)
}

fn run_video(cli: &Cli, settings: &RotoscopeSettings) -> Result<(), Box<dyn std::error::Error>> {
    let output = cli
        .output
        .clone()
        .unwrap_or_else(|| PathBuf::from(DEFAULT_OUTPUT_NAME));
    let silent = if cli.skip_audio {
        output.clone()
    } else {
        cli.intermediate
            .clone()
            .unwrap_or_else(|| default_intermediate(&output))
    };
    ensure_input_untouched(&cli.input, &[silent.as_path(), output.as_path()])?;

    let mut reader: Box<dyn VideoReader> = Box::new(FfmpegReader::new());
    let metadata = reader.open(&cli.input)?;

    let executor: Box<dyn PipelineExecutor> = if cli.threaded {
        Box::new(ThreadedPipelineExecutor::new())
    } else {
        Box::new(SequentialPipelineExecutor::new())
    };

    let bar = progress::frame_progress(metadata.total_frames);
    let mut use_case = RotoscopeVideoUseCase::new(
        reader,
        Box::new(FfmpegWriter::with_codec(
            settings.encoding.intermediate_codec.clone(),
        )),
        Box::new(RotoscopeEffect::from_settings(&settings.effect)),
        executor,
        Some(progress::progress_callback(bar.clone())),
        None,
    )
    .with_logger(Box::new(progress::BarPipelineLogger::new(bar.clone())));

    let result = use_case.execute(&metadata, &silent);
    bar.finish_and_clear();
    result?;

    if cli.skip_audio {
        return Ok(());
    }

    ReattachAudioUseCase::new(Box::new(FfmpegAudioMuxer::from_settings(
        &settings.encoding,
    )))
    .execute(&silent, &cli.input, &output)?;

    if cli.remove_intermediate {
        std::fs::remove_file(&silent)?;
        log::debug!("Removed {}", silent.display());
    }
    Ok(())
}

/// Defaults < settings file < flags, then validated.
fn resolve_settings(cli: &Cli) -> Result<RotoscopeSettings, Box<dyn std::error::Error>> {
    let mut settings = match &cli.config {
        Some(path) => RotoscopeSettings::load_from(path)?,
        None => RotoscopeSettings::load_default()?,
    };
    apply_overrides(cli, &mut settings);
    settings.validate()?;
    Ok(settings)
}

fn apply_overrides(cli: &Cli, settings: &mut RotoscopeSettings) {
    let effect = &mut settings.effect;
    if let Some(v) = cli.contrast_low {
        effect.contrast_low = v;
    }
    if let Some(v) = cli.contrast_high {
        effect.contrast_high = v;
    }
    if let Some(v) = cli.canny_low {
        effect.canny_low = v;
    }
    if let Some(v) = cli.canny_high {
        effect.canny_high = v;
    }
    if let Some(v) = cli.dilate_size {
        effect.dilate_kernel = v;
    }
    if let Some(v) = cli.dilate_iterations {
        effect.dilate_iterations = v;
    }

    let encoding = &mut settings.encoding;
    if let Some(v) = &cli.intermediate_codec {
        encoding.intermediate_codec = v.clone();
    }
    if let Some(v) = &cli.video_codec {
        encoding.video_codec = v.clone();
    }
    if let Some(v) = &cli.audio_codec {
        encoding.audio_codec = v.clone();
    }
    if cli.crf.is_some() {
        encoding.crf = cli.crf;
    }
}

fn validate(cli: &Cli) -> Result<(), Box<dyn std::error::Error>> {
    if !cli.input.exists() {
        return Err(format!("Input file not found: {}", cli.input.display()).into());
    }
    let video_only = cli.skip_audio || cli.remove_intermediate || cli.intermediate.is_some();
    if is_image(&cli.input) && video_only {
        return Err(
            "--intermediate, --skip-audio and --remove-intermediate apply to videos only".into(),
        );
    }
    if cli.skip_audio && cli.remove_intermediate {
        return Err("--skip-audio and --remove-intermediate are mutually exclusive".into());
    }
    Ok(())
}

fn ensure_input_untouched(
    input: &Path,
    outputs: &[&Path],
) -> Result<(), Box<dyn std::error::Error>> {
    if outputs.iter().any(|output| same_file(input, output)) {
        return Err("Output must not overwrite the input file".into());
    }
    Ok(())
}

fn is_image(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| IMAGE_EXTENSIONS.contains(&ext.to_lowercase().as_str()))
        .unwrap_or(false)
}

fn default_intermediate(output: &Path) -> PathBuf {
    output.with_file_name(DEFAULT_INTERMEDIATE_NAME)
}

fn default_image_output(input: &Path) -> PathBuf {
    let stem = input
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("image");
    let ext = input.extension().and_then(|e| e.to_str()).unwrap_or("png");
    input.with_file_name(format!("{stem}_rotoscoped.{ext}"))
}
