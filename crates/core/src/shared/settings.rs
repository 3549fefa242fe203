use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::constants::{
    COPY_CODEC, DEFAULT_AUDIO_CODEC, DEFAULT_CANNY_HIGH, DEFAULT_CANNY_LOW, DEFAULT_CONTRAST_HIGH,
    DEFAULT_CONTRAST_LOW, DEFAULT_DILATE_ITERATIONS, DEFAULT_DILATE_KERNEL,
    DEFAULT_INTERMEDIATE_CODEC, DEFAULT_VIDEO_CODEC, MAX_CRF,
};

#[derive(Error, Debug)]
pub enum SettingsError {
    #[error("failed to read settings from {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse settings in {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("contrast range must satisfy low < high, got {low}..{high}")]
    ContrastRange { low: u8, high: u8 },
    #[error("edge thresholds must be non-negative with low <= high, got {low}/{high}")]
    EdgeThresholds { low: f32, high: f32 },
    #[error("dilation kernel size must be at least 1, got {0}")]
    KernelSize(usize),
    #[error("CRF must be between 0 and 51, got {0}")]
    Crf(u32),
    #[error("{0} codec must not be empty")]
    EmptyCodec(&'static str),
    #[error("the intermediate video must be encoded, 'copy' is not allowed")]
    IntermediateCopy,
    #[error("CRF {0} has no effect when the video stream is copied")]
    CrfWithCopy(u32),
}

/// Parameters of the per-frame rotoscope transform.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EffectSettings {
    pub contrast_low: u8,
    pub contrast_high: u8,
    pub canny_low: f32,
    pub canny_high: f32,
    pub dilate_kernel: usize,
    pub dilate_iterations: usize,
}

impl Default for EffectSettings {
    fn default() -> Self {
        Self {
            contrast_low: DEFAULT_CONTRAST_LOW,
            contrast_high: DEFAULT_CONTRAST_HIGH,
            canny_low: DEFAULT_CANNY_LOW,
            canny_high: DEFAULT_CANNY_HIGH,
            dilate_kernel: DEFAULT_DILATE_KERNEL,
            dilate_iterations: DEFAULT_DILATE_ITERATIONS,
        }
    }
}

/// Codec choices for the silent intermediate and the final muxed output.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EncodingSettings {
    pub intermediate_codec: String,
    pub video_codec: String,
    pub audio_codec: String,
    pub crf: Option<u32>,
}

impl Default for EncodingSettings {
    fn default() -> Self {
        Self {
            intermediate_codec: DEFAULT_INTERMEDIATE_CODEC.to_string(),
            video_codec: DEFAULT_VIDEO_CODEC.to_string(),
            audio_codec: DEFAULT_AUDIO_CODEC.to_string(),
            crf: None,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RotoscopeSettings {
    pub effect: EffectSettings,
    pub encoding: EncodingSettings,
}

impl RotoscopeSettings {
    /// `<config_dir>/rotoscope/settings.json`, if the platform has a config dir.
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|d| d.join("rotoscope").join("settings.json"))
    }

    /// Loads the settings file at the default location, falling back to
    /// built-in defaults when it does not exist.
    pub fn load_default() -> Result<Self, SettingsError> {
        match Self::default_path() {
            Some(path) if path.exists() => Self::load_from(&path),
            _ => Ok(Self::default()),
        }
    }

    /// Loads settings from a JSON file. Missing fields take their defaults.
    pub fn load_from(path: &Path) -> Result<Self, SettingsError> {
        let json = fs::read_to_string(path).map_err(|source| SettingsError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        serde_json::from_str(&json).map_err(|source| SettingsError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn validate(&self) -> Result<(), SettingsError> {
        let e = &self.effect;
        if e.contrast_low >= e.contrast_high {
            return Err(SettingsError::ContrastRange {
                low: e.contrast_low,
                high: e.contrast_high,
            });
        }
        if !(e.canny_low >= 0.0 && e.canny_low <= e.canny_high) {
            return Err(SettingsError::EdgeThresholds {
                low: e.canny_low,
                high: e.canny_high,
            });
        }
        if e.dilate_kernel == 0 {
            return Err(SettingsError::KernelSize(e.dilate_kernel));
        }

        let enc = &self.encoding;
        if enc.intermediate_codec.trim().is_empty() {
            return Err(SettingsError::EmptyCodec("intermediate"));
        }
        if enc.intermediate_codec == COPY_CODEC {
            return Err(SettingsError::IntermediateCopy);
        }
        if enc.video_codec.trim().is_empty() {
            return Err(SettingsError::EmptyCodec("video"));
        }
        if enc.audio_codec.trim().is_empty() {
            return Err(SettingsError::EmptyCodec("audio"));
        }
        if let Some(crf) = enc.crf {
            if crf > MAX_CRF {
                return Err(SettingsError::Crf(crf));
            }
            if enc.video_codec == COPY_CODEC {
                return Err(SettingsError::CrfWithCopy(crf));
            }
        }
        Ok(())
    }
}
