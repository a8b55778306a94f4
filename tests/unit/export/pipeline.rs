use super::*;

#[test]
fn settings_default_to_the_fixed_bitrate() {
    let settings = ExportSettings::new(640, 480, 24);
    assert_eq!(settings.bitrate_bps, 2_000_000);
    assert_eq!(settings.background, Rgba8::opaque(0, 0, 0));
    assert!(settings.validate().is_ok());
}

#[test]
fn settings_validation_is_fatal_before_any_work() {
    assert!(ExportSettings::new(0, 480, 24).validate().is_err());
    assert!(ExportSettings::new(640, 0, 24).validate().is_err());
    assert!(ExportSettings::new(640, 480, 0).validate().is_err());
}

#[test]
fn keyframe_interval_derives_from_fps() {
    let settings = ExportSettings::new(64, 64, 30);
    assert_eq!(settings.sink_config().keyframe_interval_frames, 60);
}

#[test]
fn frame_sequences_must_be_gap_free_from_zero() {
    let frame = |index| Frame {
        index,
        particles: Vec::new(),
    };

    assert!(validate_frame_sequence(&[]).is_err());
    assert!(validate_frame_sequence(&[frame(1)]).is_err());
    assert!(validate_frame_sequence(&[frame(0), frame(2)]).is_err());
    assert!(validate_frame_sequence(&[frame(0), frame(1), frame(2)]).is_ok());
}

#[test]
fn artifact_filename_is_timestamp_derived() {
    assert_eq!(
        artifact_filename(1_700_000_000_123),
        "particle_simulation_1700000000123.mp4"
    );
}

#[test]
fn artifact_reports_mp4_mime_and_saves_under_its_filename() {
    let artifact = VideoArtifact {
        data: vec![1, 2, 3],
        filename: "particle_simulation_1.mp4".to_owned(),
    };
    assert_eq!(artifact.mime_type(), "video/mp4");
    assert_eq!(artifact.data(), &[1, 2, 3]);

    let dir = tempfile::TempDir::new().unwrap();
    let path = artifact.save_to(dir.path()).unwrap();
    assert_eq!(
        path.file_name().and_then(|n| n.to_str()),
        Some("particle_simulation_1.mp4")
    );
    assert_eq!(std::fs::read(&path).unwrap(), vec![1, 2, 3]);
}
