//! Audio download and segmentation utilities.
//!
//! This module provides functions for downloading audio from YouTube using
//! yt-dlp and splitting audio files using ffmpeg.

use super::DownloadOptions;
use crate::error::{KildeError, Result};
use regex::Regex;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::sync::OnceLock;
use tokio::process::Command;
use tracing::{debug, info, instrument};

/// Extract the 11-character video id from a YouTube URL or bare id.
pub fn extract_youtube_id(input: &str) -> Option<String> {
    static VIDEO_ID_REGEX: OnceLock<Regex> = OnceLock::new();
    let regex = VIDEO_ID_REGEX.get_or_init(|| {
        Regex::new(
            r"(?x)
            (?:
                (?:https?://)?
                (?:www\.)?
                (?:youtube\.com/watch\?v=|youtu\.be/|youtube\.com/embed/|youtube\.com/v/)
                ([a-zA-Z0-9_-]{11})
            )
            |
            ^([a-zA-Z0-9_-]{11})$
        ",
        )
        .expect("Invalid regex")
    });

    let caps = regex.captures(input.trim())?;
    caps.get(1)
        .or_else(|| caps.get(2))
        .map(|m| m.as_str().to_string())
}

/// Downloads audio for a YouTube video in the requested codec.
///
/// If the target file already exists, it is returned without re-downloading.
#[instrument(skip(options), fields(video_id = %video_id))]
pub async fn download_audio(video_id: &str, options: &DownloadOptions) -> Result<PathBuf> {
    std::fs::create_dir_all(&options.output_dir)?;

    let codec = options.format.codec();
    let target_path = options.output_dir.join(format!("{}.{}", video_id, codec));

    if target_path.exists() {
        info!("Using cached audio file");
        return Ok(target_path);
    }

    let url = format!("https://www.youtube.com/watch?v={}", video_id);
    info!("Downloading audio from {}", url);

    let template = options.output_dir.join(format!("{}.%(ext)s", video_id));

    let result = Command::new("yt-dlp")
        .arg("--extract-audio")
        .arg("--audio-format").arg(codec)
        .arg("--audio-quality").arg("0")
        .arg("--output").arg(template.to_str().unwrap_or_default())
        .arg("--no-playlist")
        .arg("--quiet")
        .arg("--no-warnings")
        .arg(&url)
        .stdout(Stdio::null())
        .stderr(Stdio::piped())
        .output()
        .await;

    let output = match result {
        Ok(o) => o,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            return Err(KildeError::ToolNotFound("yt-dlp".into()));
        }
        Err(e) => {
            return Err(KildeError::AudioDownload(format!("yt-dlp execution failed: {e}")));
        }
    };

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(KildeError::AudioDownload(format!("yt-dlp failed: {stderr}")));
    }

    // yt-dlp may leave a different container; normalize to the requested codec
    let downloaded = find_audio_file(&options.output_dir, video_id)?;

    if downloaded != target_path {
        normalize_audio(&downloaded, &target_path).await?;
        let _ = std::fs::remove_file(&downloaded);
    }

    Ok(target_path)
}

/// Locates a downloaded audio file by video id.
fn find_audio_file(dir: &Path, video_id: &str) -> Result<PathBuf> {
    // Common audio formats that yt-dlp may produce
    for ext in &["mp3", "wav", "opus", "m4a", "webm", "ogg"] {
        let candidate = dir.join(format!("{}.{}", video_id, ext));
        if candidate.exists() {
            return Ok(candidate);
        }
    }

    // Fallback: scan directory for matching prefix
    let entries = std::fs::read_dir(dir)
        .map_err(|e| KildeError::AudioDownload(format!("Cannot read directory: {e}")))?;

    for entry in entries.flatten() {
        let name = entry.file_name();
        if name.to_string_lossy().starts_with(video_id) {
            return Ok(entry.path());
        }
    }

    Err(KildeError::AudioDownload("Audio file not found after download".into()))
}

/// Converts an audio file to the target path's codec using ffmpeg.
async fn normalize_audio(source: &Path, dest: &Path) -> Result<()> {
    debug!("Converting {:?} to {:?}", source, dest);

    let result = Command::new("ffmpeg")
        .arg("-i").arg(source)
        .arg("-vn")
        .arg("-qscale:a").arg("2")
        .arg("-y")
        .arg("-loglevel").arg("error")
        .arg(dest)
        .stdout(Stdio::null())
        .stderr(Stdio::piped())
        .output()
        .await;

    match result {
        Ok(out) if out.status.success() => Ok(()),
        Ok(out) => {
            let err = String::from_utf8_lossy(&out.stderr);
            Err(KildeError::AudioDownload(format!("ffmpeg conversion failed: {err}")))
        }
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            Err(KildeError::ToolNotFound("ffmpeg".into()))
        }
        Err(e) => Err(KildeError::AudioDownload(format!("ffmpeg error: {e}"))),
    }
}

/// Segments a long audio file into smaller chunks for transcription.
///
/// Each chunk will be approximately `chunk_seconds` long. Returns the chunk
/// paths in playback order.
#[instrument(skip_all)]
pub async fn split_audio(
    source: &Path,
    output_dir: &Path,
    chunk_seconds: u32,
) -> Result<Vec<PathBuf>> {
    std::fs::create_dir_all(output_dir)?;

    let total_duration = probe_duration(source).await?;
    info!("Total audio duration: {:.1}s", total_duration);

    let chunk_len = chunk_seconds as f64;

    // Short audio doesn't need splitting
    if total_duration <= chunk_len {
        return Ok(vec![source.to_path_buf()]);
    }

    let base_name = source
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("audio");

    let mut segments = Vec::new();
    let mut offset = 0.0;
    let mut idx = 0u32;

    while offset < total_duration {
        let segment_path = output_dir.join(format!("{}_{:04}.mp3", base_name, idx));
        let segment_len = chunk_len.min(total_duration - offset);

        extract_segment(source, &segment_path, offset, segment_len).await?;

        debug!("Created segment {} at offset {:.1}s", idx, offset);
        segments.push(segment_path);

        offset += chunk_len;
        idx += 1;
    }

    info!("Created {} audio segments", segments.len());
    Ok(segments)
}

/// Extracts a time segment from an audio file.
async fn extract_segment(source: &Path, dest: &Path, start: f64, length: f64) -> Result<()> {
    let result = Command::new("ffmpeg")
        .arg("-ss").arg(format!("{:.3}", start))
        .arg("-i").arg(source)
        .arg("-t").arg(format!("{:.3}", length))
        .arg("-codec:a").arg("libmp3lame")
        .arg("-qscale:a").arg("2")
        .arg("-y")
        .arg("-loglevel").arg("error")
        .arg(dest)
        .stdout(Stdio::null())
        .stderr(Stdio::piped())
        .output()
        .await;

    match result {
        Ok(out) if out.status.success() => Ok(()),
        Ok(out) => {
            let err = String::from_utf8_lossy(&out.stderr);
            Err(KildeError::AudioDownload(format!("Segment extraction failed: {err}")))
        }
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            Err(KildeError::ToolNotFound("ffmpeg".into()))
        }
        Err(e) => Err(KildeError::AudioDownload(format!("ffmpeg error: {e}"))),
    }
}

/// Queries the duration of an audio file using ffprobe with JSON output.
async fn probe_duration(path: &Path) -> Result<f64> {
    let result = Command::new("ffprobe")
        .arg("-v").arg("quiet")
        .arg("-print_format").arg("json")
        .arg("-show_format")
        .arg(path)
        .output()
        .await;

    let output = match result {
        Ok(o) => o,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            return Err(KildeError::ToolNotFound("ffprobe".into()));
        }
        Err(e) => {
            return Err(KildeError::AudioDownload(format!("ffprobe failed: {e}")));
        }
    };

    if !output.status.success() {
        return Err(KildeError::AudioDownload("ffprobe returned error".into()));
    }

    // Parse JSON output to extract duration
    let json_str = String::from_utf8_lossy(&output.stdout);
    let parsed: serde_json::Value = serde_json::from_str(&json_str)
        .map_err(|_| KildeError::AudioDownload("Invalid ffprobe output".into()))?;

    parsed["format"]["duration"]
        .as_str()
        .and_then(|s| s.parse::<f64>().ok())
        .ok_or_else(|| KildeError::AudioDownload("Could not determine audio duration".into()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_youtube_id_from_urls() {
        let id = "dQw4w9WgXcQ";
        assert_eq!(
            extract_youtube_id("https://www.youtube.com/watch?v=dQw4w9WgXcQ").as_deref(),
            Some(id)
        );
        assert_eq!(extract_youtube_id("https://youtu.be/dQw4w9WgXcQ").as_deref(), Some(id));
        assert_eq!(extract_youtube_id("dQw4w9WgXcQ").as_deref(), Some(id));
        assert_eq!(extract_youtube_id("not a video"), None);
    }
}
