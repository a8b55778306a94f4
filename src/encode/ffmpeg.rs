use std::io::Read;
use std::path::PathBuf;
use std::process::{Child, ChildStdin, Command, Stdio};

use crate::encode::sink::{FrameSink, SampleTiming, SinkConfig};
use crate::foundation::core::Rgba8;
use crate::foundation::error::{SparkreelError, SparkreelResult};
use crate::foundation::math::{mul_div255_u16, round_div_u64};
use crate::render::surface::Surface;

/// Production [`FrameSink`] that spawns the system `ffmpeg` binary.
///
/// Raw straight-alpha RGBA frames are flattened over a background color and
/// streamed to ffmpeg's stdin; ffmpeg encodes H.264 (baseline profile,
/// `yuv420p`) at the configured bitrate with a fixed GOP length and muxes
/// the result into an MP4 written to a process-unique temporary file, whose
/// bytes [`FrameSink::finish`] returns. Writes to the pipe block while the
/// encoder is busy, which bounds frames in flight (await-per-submit
/// backpressure).
///
/// Encoder failures are fatal to the export: a spawn failure aborts in
/// `begin`, a broken pipe surfaces on `push_frame`, and a non-zero exit
/// surfaces in `finish` together with ffmpeg's stderr.
pub struct FfmpegSink {
    bg: Rgba8,

    child: Option<Child>,
    stdin: Option<ChildStdin>,
    stderr_drain: Option<std::thread::JoinHandle<std::io::Result<Vec<u8>>>>,

    scratch: Vec<u8>,
    cfg: Option<SinkConfig>,
    last_index: Option<u64>,
    out_file: TempFileGuard,
}

impl FfmpegSink {
    /// Create a sink that flattens alpha over `background`.
    pub fn new(background: Rgba8) -> Self {
        Self {
            bg: background,
            child: None,
            stdin: None,
            stderr_drain: None,
            scratch: Vec::new(),
            cfg: None,
            last_index: None,
            out_file: TempFileGuard(None),
        }
    }
}

impl FrameSink for FfmpegSink {
    fn begin(&mut self, cfg: SinkConfig) -> SparkreelResult<()> {
        cfg.validate()?;
        if !cfg.width.is_multiple_of(2) || !cfg.height.is_multiple_of(2) {
            return Err(SparkreelError::validation(
                "ffmpeg sink width/height must be even (required for yuv420p mp4 output)",
            ));
        }
        if !is_ffmpeg_on_path() {
            return Err(SparkreelError::encode(
                "ffmpeg is required for MP4 encoding, but was not found on PATH",
            ));
        }

        let out_path = unique_temp_path();
        tracing::debug!(out = %out_path.display(), width = cfg.width, height = cfg.height, fps = cfg.fps, "spawning ffmpeg");

        let mut cmd = Command::new("ffmpeg");
        cmd.stdin(Stdio::piped())
            .stdout(Stdio::null())
            .stderr(Stdio::piped());

        // Input: raw straight-alpha RGBA8 frames at a constant rate.
        cmd.args([
            "-y",
            "-loglevel",
            "error",
            "-f",
            "rawvideo",
            "-pix_fmt",
            "rgba",
            "-s",
            &format!("{}x{}", cfg.width, cfg.height),
            "-r",
            &cfg.fps.to_string(),
            "-i",
            "pipe:0",
        ]);
        // Output: H.264 baseline in MP4. The GOP length realizes the
        // pipeline's keyframe placement.
        cmd.args([
            "-an",
            "-c:v",
            "libx264",
            "-profile:v",
            "baseline",
            "-pix_fmt",
            "yuv420p",
            "-b:v",
            &cfg.bitrate_bps.to_string(),
            "-g",
            &cfg.keyframe_interval_frames.to_string(),
            "-movflags",
            "+faststart",
        ]);
        cmd.arg(&out_path);

        let mut child = cmd.spawn().map_err(|e| {
            SparkreelError::encode(format!(
                "failed to spawn ffmpeg (is it installed and on PATH?): {e}"
            ))
        })?;

        let stdin = child
            .stdin
            .take()
            .ok_or_else(|| SparkreelError::encode("failed to open ffmpeg stdin (unexpected)"))?;
        let mut stderr = child
            .stderr
            .take()
            .ok_or_else(|| SparkreelError::encode("failed to open ffmpeg stderr (unexpected)"))?;
        let stderr_drain = std::thread::spawn(move || {
            let mut stderr_bytes = Vec::new();
            stderr.read_to_end(&mut stderr_bytes)?;
            Ok(stderr_bytes)
        });

        self.scratch = vec![0u8; (cfg.width * cfg.height * 4) as usize];
        self.child = Some(child);
        self.stdin = Some(stdin);
        self.stderr_drain = Some(stderr_drain);
        self.cfg = Some(cfg);
        self.last_index = None;
        self.out_file = TempFileGuard(Some(out_path));
        Ok(())
    }

    fn push_frame(
        &mut self,
        index: u64,
        surface: &Surface,
        timing: SampleTiming,
    ) -> SparkreelResult<()> {
        let cfg = self
            .cfg
            .as_ref()
            .ok_or_else(|| SparkreelError::encode("ffmpeg sink not started"))?;
        if let Some(last) = self.last_index
            && index <= last
        {
            return Err(SparkreelError::encode(
                "ffmpeg sink received out-of-order frame index",
            ));
        }
        self.last_index = Some(index);

        // The rawvideo input runs at a constant rate and the GOP is fixed in
        // the encoder config, so inconsistent timing would be silently
        // ignored. Reject it instead.
        let expected_ts = round_div_u64(index * 1_000_000, u64::from(cfg.fps));
        if timing.timestamp_us != expected_ts {
            return Err(SparkreelError::encode(format!(
                "frame {index} timestamp {}us does not match constant-rate input ({expected_ts}us)",
                timing.timestamp_us
            )));
        }
        let expected_keyframe = index % u64::from(cfg.keyframe_interval_frames) == 0;
        if timing.keyframe != expected_keyframe {
            return Err(SparkreelError::encode(format!(
                "frame {index} keyframe flag does not match configured GOP of {} frames",
                cfg.keyframe_interval_frames
            )));
        }

        if surface.width() != cfg.width || surface.height() != cfg.height {
            return Err(SparkreelError::validation(format!(
                "frame size mismatch: got {}x{}, expected {}x{}",
                surface.width(),
                surface.height(),
                cfg.width,
                cfg.height
            )));
        }

        flatten_straight_over_bg_to_opaque_rgba8(&mut self.scratch, surface.as_bytes(), self.bg)?;

        let Some(stdin) = self.stdin.as_mut() else {
            return Err(SparkreelError::encode("ffmpeg sink is already finalized"));
        };

        use std::io::Write as _;
        stdin.write_all(&self.scratch).map_err(|e| {
            SparkreelError::encode(format!("failed to write frame to ffmpeg stdin: {e}"))
        })
    }

    fn finish(&mut self) -> SparkreelResult<Vec<u8>> {
        drop(self.stdin.take());
        let mut child = self
            .child
            .take()
            .ok_or_else(|| SparkreelError::encode("ffmpeg sink not started"))?;

        let status = child.wait().map_err(|e| {
            SparkreelError::encode(format!("failed to wait for ffmpeg to finish: {e}"))
        })?;
        let stderr_bytes = match self.stderr_drain.take() {
            Some(handle) => handle
                .join()
                .map_err(|_| SparkreelError::encode("ffmpeg stderr drain thread panicked"))?
                .map_err(|e| SparkreelError::encode(format!("ffmpeg stderr read failed: {e}")))?,
            None => Vec::new(),
        };

        if !status.success() {
            let stderr = String::from_utf8_lossy(&stderr_bytes);
            return Err(SparkreelError::encode(format!(
                "ffmpeg exited with status {}: {}",
                status,
                stderr.trim()
            )));
        }

        let out_path = self
            .out_file
            .0
            .clone()
            .ok_or_else(|| SparkreelError::encode("ffmpeg sink output file missing"))?;
        let bytes = std::fs::read(&out_path).map_err(|e| {
            SparkreelError::encode(format!(
                "failed to read encoded output '{}': {e}",
                out_path.display()
            ))
        })?;
        self.out_file.remove_now();
        self.cfg = None;

        tracing::debug!(bytes = bytes.len(), "ffmpeg container finalized");
        Ok(bytes)
    }

    fn abort(&mut self) {
        drop(self.stdin.take());
        if let Some(mut child) = self.child.take() {
            let _ = child.kill();
            let _ = child.wait();
        }
        if let Some(handle) = self.stderr_drain.take() {
            let _ = handle.join();
        }
        self.out_file.remove_now();
        self.cfg = None;
    }
}

/// Flatten straight-alpha RGBA8 over an opaque background color.
fn flatten_straight_over_bg_to_opaque_rgba8(
    dst: &mut [u8],
    src: &[u8],
    bg: Rgba8,
) -> SparkreelResult<()> {
    if dst.len() != src.len() || !dst.len().is_multiple_of(4) {
        return Err(SparkreelError::validation(
            "flatten_straight_over_bg_to_opaque_rgba8 expects equal-length rgba8 buffers",
        ));
    }

    let bg_r = u16::from(bg.r);
    let bg_g = u16::from(bg.g);
    let bg_b = u16::from(bg.b);

    for (d, s) in dst.chunks_exact_mut(4).zip(src.chunks_exact(4)) {
        let a = u16::from(s[3]);
        if a == 255 {
            d.copy_from_slice(s);
            d[3] = 255;
            continue;
        }

        let inv = 255u16 - a;
        d[0] = (mul_div255_u16(u16::from(s[0]), a) + mul_div255_u16(bg_r, inv)).min(255) as u8;
        d[1] = (mul_div255_u16(u16::from(s[1]), a) + mul_div255_u16(bg_g, inv)).min(255) as u8;
        d[2] = (mul_div255_u16(u16::from(s[2]), a) + mul_div255_u16(bg_b, inv)).min(255) as u8;
        d[3] = 255;
    }

    Ok(())
}

/// Return `true` when `ffmpeg` can be invoked from `PATH`.
pub fn is_ffmpeg_on_path() -> bool {
    Command::new("ffmpeg")
        .arg("-version")
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()
        .map(|s| s.success())
        .unwrap_or(false)
}

fn unique_temp_path() -> PathBuf {
    std::env::temp_dir().join(format!(
        "sparkreel_export_{}_{}.mp4",
        std::process::id(),
        std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .map(|d| d.as_nanos())
            .unwrap_or(0)
    ))
}

struct TempFileGuard(Option<PathBuf>);

impl TempFileGuard {
    fn remove_now(&mut self) {
        if let Some(path) = self.0.take() {
            let _ = std::fs::remove_file(path);
        }
    }
}

impl Drop for TempFileGuard {
    fn drop(&mut self) {
        self.remove_now();
    }
}

#[cfg(test)]
#[path = "../../tests/unit/encode/ffmpeg.rs"]
mod tests;
