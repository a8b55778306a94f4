use std::path::{Path, PathBuf};

use crate::encode::ffmpeg::FfmpegSink;
use crate::encode::sink::{FrameSink, SinkConfig, sample_timing};
use crate::foundation::core::Rgba8;
use crate::foundation::error::{SparkreelError, SparkreelResult};
use crate::model::particle::Frame;
use crate::render::FrameRenderer;
use crate::render::surface::Surface;

/// Design-fixed average target bitrate for exported video.
pub const DEFAULT_BITRATE_BPS: u32 = 2_000_000;

/// Caller-supplied export parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExportSettings {
    /// Output width in pixels.
    pub width: u32,
    /// Output height in pixels.
    pub height: u32,
    /// Output frames per second.
    pub fps: u32,
    /// Average target bitrate in bits per second.
    pub bitrate_bps: u32,
    /// Background color frames are flattened over at the encoder.
    pub background: Rgba8,
}

impl ExportSettings {
    /// Settings with the design-fixed bitrate and an opaque black background.
    pub fn new(width: u32, height: u32, fps: u32) -> Self {
        Self {
            width,
            height,
            fps,
            bitrate_bps: DEFAULT_BITRATE_BPS,
            background: Rgba8::opaque(0, 0, 0),
        }
    }

    /// Validate the settings; a failure is fatal before any frame work.
    pub fn validate(&self) -> SparkreelResult<()> {
        self.sink_config().validate()
    }

    fn sink_config(&self) -> SinkConfig {
        SinkConfig {
            width: self.width,
            height: self.height,
            fps: self.fps,
            bitrate_bps: self.bitrate_bps,
            // One keyframe every two seconds of output.
            keyframe_interval_frames: 2 * self.fps,
        }
    }
}

/// A finished export: complete container bytes plus delivery metadata.
///
/// The artifact is the only state an export leaves behind; saving consumes
/// it, which releases the transient handle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VideoArtifact {
    data: Vec<u8>,
    filename: String,
}

impl VideoArtifact {
    /// MIME type of the container.
    pub fn mime_type(&self) -> &'static str {
        "video/mp4"
    }

    /// Complete MP4 container bytes.
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// Timestamp-derived download filename
    /// (`particle_simulation_<unix-millis>.mp4`).
    pub fn filename(&self) -> &str {
        &self.filename
    }

    /// Consume the artifact, returning the raw container bytes.
    pub fn into_bytes(self) -> Vec<u8> {
        self.data
    }

    /// Write the artifact into `dir` under its own filename and return the
    /// written path.
    pub fn save_to(self, dir: impl AsRef<Path>) -> SparkreelResult<PathBuf> {
        let path = dir.as_ref().join(&self.filename);
        std::fs::write(&path, &self.data).map_err(|e| {
            SparkreelError::encode(format!("failed to write '{}': {e}", path.display()))
        })?;
        Ok(path)
    }
}

/// Export `frames` through an arbitrary [`FrameSink`].
///
/// Steps, in order: validate settings and the gap-free `0..N-1` frame
/// indexing (fatal before any frame work), configure the sink, then for each
/// frame in presentation order paint it onto one reusable surface, compute
/// its exact presentation timing and submit it. Nothing per-frame outlives
/// its submission, so peak memory stays at O(1) frames regardless of N.
/// A draw or submit failure aborts the sink and propagates; no partial
/// output is returned.
#[tracing::instrument(skip_all, fields(frames = frames.len(), width = settings.width, height = settings.height, fps = settings.fps))]
pub fn export_with_sink(
    frames: &[Frame],
    renderer: &mut dyn FrameRenderer,
    settings: &ExportSettings,
    sink: &mut dyn FrameSink,
) -> SparkreelResult<Vec<u8>> {
    settings.validate()?;
    validate_frame_sequence(frames)?;

    sink.begin(settings.sink_config())?;

    let mut surface = Surface::new(settings.width, settings.height);
    for frame in frames {
        if let Err(e) = renderer.draw_frame(&mut surface, frame) {
            sink.abort();
            return Err(e);
        }
        let timing = sample_timing(frame.index, settings.fps);
        if let Err(e) = sink.push_frame(frame.index, &surface, timing) {
            sink.abort();
            return Err(e);
        }
    }

    let bytes = sink.finish()?;
    tracing::info!(frames = frames.len(), bytes = bytes.len(), "export finished");
    Ok(bytes)
}

/// Export `frames` to an H.264/MP4 [`VideoArtifact`] via the system ffmpeg.
pub fn export_to_mp4(
    frames: &[Frame],
    renderer: &mut dyn FrameRenderer,
    settings: &ExportSettings,
) -> SparkreelResult<VideoArtifact> {
    let mut sink = FfmpegSink::new(settings.background);
    let data = export_with_sink(frames, renderer, settings, &mut sink)?;
    Ok(VideoArtifact {
        data,
        filename: artifact_filename(unix_millis()),
    })
}

fn validate_frame_sequence(frames: &[Frame]) -> SparkreelResult<()> {
    if frames.is_empty() {
        return Err(SparkreelError::validation(
            "export requires at least one frame",
        ));
    }
    for (i, frame) in frames.iter().enumerate() {
        if frame.index != i as u64 {
            return Err(SparkreelError::validation(format!(
                "frames must be indexed 0..N-1 without gaps (position {i} has index {})",
                frame.index
            )));
        }
    }
    Ok(())
}

fn artifact_filename(unix_millis: u128) -> String {
    format!("particle_simulation_{unix_millis}.mp4")
}

fn unix_millis() -> u128 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_millis())
        .unwrap_or(0)
}

#[cfg(test)]
#[path = "../../tests/unit/export/pipeline.rs"]
mod tests;
