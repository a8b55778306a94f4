use super::*;

#[test]
fn config_validation_catches_bad_values() {
    let good = SinkConfig {
        width: 640,
        height: 480,
        fps: 24,
        bitrate_bps: 2_000_000,
        keyframe_interval_frames: 48,
    };
    assert!(good.validate().is_ok());

    assert!(SinkConfig { width: 0, ..good }.validate().is_err());
    assert!(SinkConfig { height: 0, ..good }.validate().is_err());
    assert!(SinkConfig { fps: 0, ..good }.validate().is_err());
    assert!(SinkConfig { bitrate_bps: 0, ..good }.validate().is_err());
    assert!(
        SinkConfig {
            keyframe_interval_frames: 0,
            ..good
        }
        .validate()
        .is_err()
    );
}

#[test]
fn timestamps_follow_the_rounding_law() {
    assert_eq!(sample_timing(0, 30).timestamp_us, 0);
    assert_eq!(sample_timing(1, 30).timestamp_us, 33_333);
    assert_eq!(sample_timing(2, 30).timestamp_us, 66_667);
    assert_eq!(sample_timing(89, 30).timestamp_us, 2_966_667);
    assert_eq!(sample_timing(1, 24).timestamp_us, 41_667);
    assert_eq!(sample_timing(47, 24).timestamp_us, 1_958_333);
}

#[test]
fn timestamps_are_exact_per_index_over_long_runs() {
    // Computed per index, so index 30_000 at 30 fps is exactly 1000 s.
    assert_eq!(sample_timing(30_000, 30).timestamp_us, 1_000_000_000);
    let mut last = 0;
    for i in 1..3000 {
        let t = sample_timing(i, 30).timestamp_us;
        assert!(t > last);
        last = t;
    }
}

#[test]
fn keyframes_land_every_two_seconds() {
    let keyframes: Vec<u64> = (0..90)
        .filter(|&i| sample_timing(i, 30).keyframe)
        .collect();
    assert_eq!(keyframes, vec![0, 60]);

    let keyframes: Vec<u64> = (0..48)
        .filter(|&i| sample_timing(i, 24).keyframe)
        .collect();
    assert_eq!(keyframes, vec![0]);
}

#[test]
fn recording_sink_captures_config_and_samples_in_order() {
    let cfg = SinkConfig {
        width: 64,
        height: 64,
        fps: 10,
        bitrate_bps: 2_000_000,
        keyframe_interval_frames: 20,
    };
    let surface = Surface::new(64, 64);

    let mut sink = RecordingSink::new();
    sink.begin(cfg).unwrap();
    for i in 0..5 {
        sink.push_frame(i, &surface, sample_timing(i, cfg.fps)).unwrap();
    }
    let bytes = sink.finish().unwrap();

    assert!(bytes.is_empty());
    assert_eq!(sink.config(), Some(cfg));
    assert_eq!(sink.samples().len(), 5);
    assert!(sink.finished());
    assert!(!sink.aborted());
}

#[test]
fn recording_sink_rejects_out_of_order_frames() {
    let cfg = SinkConfig {
        width: 8,
        height: 8,
        fps: 10,
        bitrate_bps: 2_000_000,
        keyframe_interval_frames: 20,
    };
    let surface = Surface::new(8, 8);

    let mut sink = RecordingSink::new();
    sink.begin(cfg).unwrap();
    sink.push_frame(1, &surface, sample_timing(1, 10)).unwrap();
    assert!(sink.push_frame(1, &surface, sample_timing(1, 10)).is_err());
    assert!(sink.push_frame(0, &surface, sample_timing(0, 10)).is_err());
}
