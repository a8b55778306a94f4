use crate::foundation::error::{SparkreelError, SparkreelResult};
use crate::foundation::math::round_div_u64;
use crate::render::surface::Surface;

/// Encoder/muxer configuration for one export run.
///
/// The output profile is fixed: H.264 video in an MP4 container.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SinkConfig {
    /// Output width in pixels.
    pub width: u32,
    /// Output height in pixels.
    pub height: u32,
    /// Output frames per second.
    pub fps: u32,
    /// Average target bitrate in bits per second.
    pub bitrate_bps: u32,
    /// Distance between forced keyframes, in frames.
    pub keyframe_interval_frames: u32,
}

impl SinkConfig {
    /// Validate the configuration. Called by sinks in `begin`; a failure is
    /// fatal to the export before any frame is processed.
    pub fn validate(&self) -> SparkreelResult<()> {
        if self.width == 0 || self.height == 0 {
            return Err(SparkreelError::validation(
                "sink width/height must be non-zero",
            ));
        }
        if self.fps == 0 {
            return Err(SparkreelError::validation("sink fps must be non-zero"));
        }
        if self.bitrate_bps == 0 {
            return Err(SparkreelError::validation("sink bitrate must be non-zero"));
        }
        if self.keyframe_interval_frames == 0 {
            return Err(SparkreelError::validation(
                "sink keyframe interval must be non-zero",
            ));
        }
        Ok(())
    }
}

/// Presentation timing for one submitted frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SampleTiming {
    /// Presentation timestamp in microseconds, starting at 0.
    pub timestamp_us: u64,
    /// Whether this frame must be an independently decodable keyframe.
    pub keyframe: bool,
}

/// Compute the presentation timing for frame `index` at `fps`.
///
/// The timestamp is `round(index * 1_000_000 / fps)` microseconds, computed
/// exactly per index rather than by accumulation, so it cannot drift over
/// long sequences. The keyframe flag is set exactly when
/// `index % (2 * fps) == 0`, bounding seek granularity to two seconds of
/// output.
pub fn sample_timing(index: u64, fps: u32) -> SampleTiming {
    let fps = u64::from(fps.max(1));
    SampleTiming {
        timestamp_us: round_div_u64(index * 1_000_000, fps),
        keyframe: index % (2 * fps) == 0,
    }
}

/// Sink contract for consuming painted frames in presentation order.
///
/// One sink instance serves one export: `begin` configures the encoder and
/// container (fatal on failure, before any frame work), `push_frame` is
/// called once per frame with strictly increasing indices and blocks until
/// the encoder accepted the input (submission backpressure), `finish`
/// flushes the encoder, finalizes the container and returns its bytes.
/// `abort` releases partial encode state when the export fails mid-run.
pub trait FrameSink: Send {
    /// Configure encoder and container. Called once, before any frame.
    fn begin(&mut self, cfg: SinkConfig) -> SparkreelResult<()>;

    /// Submit one painted frame with its presentation timing.
    fn push_frame(
        &mut self,
        index: u64,
        surface: &Surface,
        timing: SampleTiming,
    ) -> SparkreelResult<()>;

    /// Flush buffered samples, finalize the container and return its bytes.
    fn finish(&mut self) -> SparkreelResult<Vec<u8>>;

    /// Discard partial encode state. Default: nothing to release.
    fn abort(&mut self) {}
}

/// In-memory sink for tests and debugging.
///
/// Records the configuration and every submitted sample's timing; `finish`
/// returns an empty byte vector.
#[derive(Debug, Default)]
pub struct RecordingSink {
    cfg: Option<SinkConfig>,
    samples: Vec<(u64, SampleTiming)>,
    finished: bool,
    aborted: bool,
}

impl RecordingSink {
    /// Create an empty recording sink.
    pub fn new() -> Self {
        Self::default()
    }

    /// Configuration captured in `begin`, if any.
    pub fn config(&self) -> Option<SinkConfig> {
        self.cfg
    }

    /// Recorded `(index, timing)` samples in submission order.
    pub fn samples(&self) -> &[(u64, SampleTiming)] {
        &self.samples
    }

    /// Whether `finish` ran.
    pub fn finished(&self) -> bool {
        self.finished
    }

    /// Whether `abort` ran.
    pub fn aborted(&self) -> bool {
        self.aborted
    }
}

impl FrameSink for RecordingSink {
    fn begin(&mut self, cfg: SinkConfig) -> SparkreelResult<()> {
        cfg.validate()?;
        self.cfg = Some(cfg);
        self.samples.clear();
        self.finished = false;
        self.aborted = false;
        Ok(())
    }

    fn push_frame(
        &mut self,
        index: u64,
        _surface: &Surface,
        timing: SampleTiming,
    ) -> SparkreelResult<()> {
        if let Some((last, _)) = self.samples.last()
            && index <= *last
        {
            return Err(SparkreelError::encode(
                "recording sink received out-of-order frame index",
            ));
        }
        self.samples.push((index, timing));
        Ok(())
    }

    fn finish(&mut self) -> SparkreelResult<Vec<u8>> {
        self.finished = true;
        Ok(Vec::new())
    }

    fn abort(&mut self) {
        self.aborted = true;
    }
}

#[cfg(test)]
#[path = "../../tests/unit/encode/sink.rs"]
mod tests;
