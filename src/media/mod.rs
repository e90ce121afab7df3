//! Audio acquisition for media ingestion.
//!
//! Wraps yt-dlp and ffmpeg as external collaborators; the pipeline only ever
//! sees a local audio file path.

mod downloader;

pub use downloader::{download_audio, extract_youtube_id, split_audio};

use crate::error::{KildeError, Result};
use std::path::PathBuf;

/// Audio codecs the downloader is allowed to request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AudioFormat {
    Mp3,
    Wav,
    Opus,
    M4a,
}

impl AudioFormat {
    /// The yt-dlp/ffmpeg codec name.
    pub fn codec(&self) -> &'static str {
        match self {
            AudioFormat::Mp3 => "mp3",
            AudioFormat::Wav => "wav",
            AudioFormat::Opus => "opus",
            AudioFormat::M4a => "m4a",
        }
    }
}

impl std::str::FromStr for AudioFormat {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "mp3" => Ok(AudioFormat::Mp3),
            "wav" => Ok(AudioFormat::Wav),
            "opus" => Ok(AudioFormat::Opus),
            "m4a" => Ok(AudioFormat::M4a),
            _ => Err(format!("Unknown audio format: {}", s)),
        }
    }
}

/// Validated download options.
///
/// Every recognized field is explicit and checked at construction; there is no
/// pass-through of arbitrary downloader flags.
#[derive(Debug, Clone)]
pub struct DownloadOptions {
    /// Requested audio codec.
    pub format: AudioFormat,
    /// Directory the audio file is written to.
    pub output_dir: PathBuf,
}

impl DownloadOptions {
    /// Create validated options.
    pub fn new(format: &str, output_dir: PathBuf) -> Result<Self> {
        let format = format
            .parse::<AudioFormat>()
            .map_err(KildeError::Config)?;

        if output_dir.as_os_str().is_empty() {
            return Err(KildeError::Config(
                "download output directory must not be empty".to_string(),
            ));
        }

        Ok(Self { format, output_dir })
    }
}
