//! Representative-frame extraction from source videos.
//!
//! Extraction is a capability picked once at startup: either an external
//! ffmpeg binary that answered a probe, or nothing at all. Callers only ever
//! see success or [`ExtractionFailed`]; too-short inputs, missing tools,
//! non-video files and non-zero exits all look the same to them.

use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;
use tokio::process::Command;
use tracing::{debug, info, warn};

use crate::library::atomic::staging_path;

/// The one failure signal a frame source reports.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
#[error("frame extraction failed")]
pub struct ExtractionFailed;

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait FrameSource: Send + Sync {
    /// Short name for logs and health output.
    fn name(&self) -> &'static str;

    /// Pull one frame from `source` and write it as a JPEG to `out`.
    ///
    /// On success `out` exists and is non-empty. On failure `out` is left
    /// untouched.
    async fn extract(&self, source: &Path, out: &Path) -> Result<(), ExtractionFailed>;
}

/// Settings for the external extractor.
#[derive(Debug, Clone)]
pub struct FrameSettings {
    pub program: PathBuf,
    pub seek_seconds: u32,
    pub frame_width: u32,
    pub timeout: Option<Duration>,
    pub disabled: bool,
}

impl Default for FrameSettings {
    fn default() -> Self {
        Self {
            program: PathBuf::from("ffmpeg"),
            seek_seconds: 3,
            frame_width: 640,
            timeout: Some(Duration::from_secs(120)),
            disabled: false,
        }
    }
}

#[derive(Debug, Clone)]
pub struct FfmpegFrameSource {
    settings: FrameSettings,
}

impl FfmpegFrameSource {
    pub fn new(settings: FrameSettings) -> Self {
        Self { settings }
    }

    fn command(&self, source: &Path, staged: &Path) -> Command {
        let FrameSettings {
            program,
            seek_seconds,
            frame_width,
            ..
        } = &self.settings;

        let mut cmd = Command::new(program);
        cmd.args(["-hide_banner", "-loglevel", "error", "-y"])
            .arg("-ss")
            .arg(seek_seconds.to_string())
            .arg("-i")
            .arg(source)
            .args(["-frames:v", "1"])
            .arg("-vf")
            .arg(format!("scale={frame_width}:-2"))
            .args(["-q:v", "3"])
            .arg(staged)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        cmd
    }

    async fn run(&self, source: &Path, staged: &Path) -> Result<(), ExtractionFailed> {
        let output = self.command(source, staged).output();

        let output = match self.settings.timeout {
            Some(limit) => match tokio::time::timeout(limit, output).await {
                Ok(result) => result,
                Err(_) => {
                    warn!(source = %source.display(), ?limit, "frame extraction timed out");
                    return Err(ExtractionFailed);
                }
            },
            None => output.await,
        };

        let output = output.map_err(|err| {
            warn!(program = %self.settings.program.display(), error = %err, "failed to spawn ffmpeg");
            ExtractionFailed
        })?;

        if !output.status.success() {
            debug!(
                source = %source.display(),
                status = %output.status,
                stderr = %String::from_utf8_lossy(&output.stderr).trim(),
                "ffmpeg exited unsuccessfully"
            );
            return Err(ExtractionFailed);
        }

        // Seeking past the end of a short clip exits 0 without writing a frame.
        match tokio::fs::metadata(staged).await {
            Ok(meta) if meta.len() > 0 => Ok(()),
            _ => {
                debug!(source = %source.display(), "ffmpeg produced no frame");
                Err(ExtractionFailed)
            }
        }
    }
}

#[async_trait]
impl FrameSource for FfmpegFrameSource {
    fn name(&self) -> &'static str {
        "ffmpeg"
    }

    async fn extract(&self, source: &Path, out: &Path) -> Result<(), ExtractionFailed> {
        let staged = staging_path(out, Some("jpg"));

        let result = match self.run(source, &staged).await {
            Ok(()) => tokio::fs::rename(&staged, out).await.map_err(|err| {
                warn!(out = %out.display(), error = %err, "failed to move extracted frame into place");
                ExtractionFailed
            }),
            Err(err) => Err(err),
        };

        if result.is_err() {
            let _ = tokio::fs::remove_file(&staged).await;
        }
        result
    }
}

/// Frame source used when no decoder is available.
#[derive(Debug, Clone, Copy, Default)]
pub struct UnavailableFrameSource;

#[async_trait]
impl FrameSource for UnavailableFrameSource {
    fn name(&self) -> &'static str {
        "unavailable"
    }

    async fn extract(&self, _source: &Path, _out: &Path) -> Result<(), ExtractionFailed> {
        Err(ExtractionFailed)
    }
}

/// Pick a frame source by asking the configured binary for its version.
pub async fn probe_frame_source(settings: FrameSettings) -> Arc<dyn FrameSource> {
    if settings.disabled {
        info!("frame extraction disabled by configuration");
        return Arc::new(UnavailableFrameSource);
    }

    let probe = Command::new(&settings.program)
        .arg("-version")
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::null())
        .kill_on_drop(true)
        .output();

    match tokio::time::timeout(Duration::from_secs(10), probe).await {
        Ok(Ok(output)) if output.status.success() => {
            let banner = String::from_utf8_lossy(&output.stdout);
            info!(
                program = %settings.program.display(),
                version = banner.lines().next().unwrap_or_default(),
                "ffmpeg detected, frame extraction enabled"
            );
            Arc::new(FfmpegFrameSource::new(settings))
        }
        _ => {
            warn!(
                program = %settings.program.display(),
                "ffmpeg not usable, thumbnails will fall back to slates"
            );
            Arc::new(UnavailableFrameSource)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn unavailable_source_always_fails() {
        let dir = tempfile::tempdir().expect("tmpdir");
        let out = dir.path().join("a.mp4.jpg");
        let result = UnavailableFrameSource
            .extract(&dir.path().join("a.mp4"), &out)
            .await;
        assert_eq!(result, Err(ExtractionFailed));
        assert!(!out.exists());
    }

    #[tokio::test]
    async fn disabled_settings_probe_as_unavailable() {
        let source = probe_frame_source(FrameSettings {
            disabled: true,
            ..FrameSettings::default()
        })
        .await;
        assert_eq!(source.name(), "unavailable");
    }

    #[tokio::test]
    async fn missing_binary_probes_as_unavailable() {
        let source = probe_frame_source(FrameSettings {
            program: PathBuf::from("/nonexistent/reelshelf-ffmpeg"),
            ..FrameSettings::default()
        })
        .await;
        assert_eq!(source.name(), "unavailable");
    }

    #[tokio::test]
    async fn failed_run_leaves_no_output_or_staging_files() {
        let dir = tempfile::tempdir().expect("tmpdir");
        let source_path = dir.path().join("a.mp4");
        tokio::fs::write(&source_path, b"not a video").await.unwrap();
        let out = dir.path().join("a.mp4.jpg");

        let extractor = FfmpegFrameSource::new(FrameSettings {
            program: PathBuf::from("/nonexistent/reelshelf-ffmpeg"),
            ..FrameSettings::default()
        });
        assert_eq!(extractor.extract(&source_path, &out).await, Err(ExtractionFailed));

        let mut entries = tokio::fs::read_dir(dir.path()).await.unwrap();
        let mut names = Vec::new();
        while let Some(entry) = entries.next_entry().await.unwrap() {
            names.push(entry.file_name().to_string_lossy().into_owned());
        }
        assert_eq!(names, vec!["a.mp4".to_string()]);
    }
}
