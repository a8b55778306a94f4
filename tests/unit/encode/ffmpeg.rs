use super::*;
use crate::encode::sink::sample_timing;

fn cfg(width: u32, height: u32, fps: u32) -> SinkConfig {
    SinkConfig {
        width,
        height,
        fps,
        bitrate_bps: 2_000_000,
        keyframe_interval_frames: 2 * fps,
    }
}

#[test]
fn begin_rejects_odd_dimensions_before_spawning_anything() {
    let mut sink = FfmpegSink::new(Rgba8::opaque(0, 0, 0));
    assert!(sink.begin(cfg(11, 10, 30)).is_err());
    assert!(sink.begin(cfg(10, 11, 30)).is_err());
}

#[test]
fn begin_rejects_invalid_config() {
    let mut sink = FfmpegSink::new(Rgba8::opaque(0, 0, 0));
    assert!(sink.begin(cfg(0, 10, 30)).is_err());
    assert!(sink.begin(cfg(10, 10, 0)).is_err());
}

#[test]
fn push_before_begin_is_an_encode_error() {
    let mut sink = FfmpegSink::new(Rgba8::opaque(0, 0, 0));
    let surface = Surface::new(2, 2);
    assert!(matches!(
        sink.push_frame(0, &surface, sample_timing(0, 30)),
        Err(SparkreelError::Encode(_))
    ));
}

#[test]
fn push_rejects_inconsistent_timing_and_sizes() {
    if !is_ffmpeg_on_path() {
        return;
    }

    let mut sink = FfmpegSink::new(Rgba8::opaque(0, 0, 0));
    sink.begin(cfg(4, 4, 10)).unwrap();

    // Wrong timestamp for a constant-rate input.
    let bad_ts = SampleTiming {
        timestamp_us: 1,
        keyframe: true,
    };
    assert!(sink.push_frame(0, &Surface::new(4, 4), bad_ts).is_err());

    // Wrong keyframe flag for the configured GOP.
    let bad_kf = SampleTiming {
        timestamp_us: 100_000,
        keyframe: true,
    };
    assert!(sink.push_frame(1, &Surface::new(4, 4), bad_kf).is_err());

    // Wrong surface size.
    assert!(
        sink.push_frame(2, &Surface::new(2, 2), sample_timing(2, 10))
            .is_err()
    );

    sink.abort();
}

#[test]
fn flatten_alpha_0_returns_bg() {
    let src = vec![90u8, 90, 90, 0];
    let mut dst = vec![0u8; 4];
    flatten_straight_over_bg_to_opaque_rgba8(&mut dst, &src, Rgba8::opaque(10, 20, 30)).unwrap();
    assert_eq!(dst, vec![10, 20, 30, 255]);
}

#[test]
fn flatten_alpha_255_is_identity() {
    let src = vec![1u8, 2, 3, 255];
    let mut dst = vec![0u8; 4];
    flatten_straight_over_bg_to_opaque_rgba8(&mut dst, &src, Rgba8::opaque(10, 20, 30)).unwrap();
    assert_eq!(dst, src);
}

#[test]
fn flatten_half_alpha_lerps_toward_bg() {
    // Straight red @ ~50% alpha over black => ~half red.
    let src = vec![255u8, 0, 0, 128];
    let mut dst = vec![0u8; 4];
    flatten_straight_over_bg_to_opaque_rgba8(&mut dst, &src, Rgba8::opaque(0, 0, 0)).unwrap();
    assert_eq!(dst, vec![128, 0, 0, 255]);
}

#[test]
fn flatten_rejects_mismatched_buffers() {
    let src = vec![0u8; 8];
    let mut dst = vec![0u8; 4];
    assert!(
        flatten_straight_over_bg_to_opaque_rgba8(&mut dst, &src, Rgba8::opaque(0, 0, 0)).is_err()
    );
}
