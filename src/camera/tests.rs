use super::*;
use crate::config::{CameraConfig, SourceKind};
use crate::error::CameraError;
use crate::frame::Frame;
use std::time::SystemTime;

fn create_test_camera_config(source: SourceKind, image_dir: Option<String>) -> CameraConfig {
    CameraConfig {
        source,
        index: 0,
        resolution: (640, 480),
        fps: 30,
        image_dir,
    }
}

fn write_png(dir: &std::path::Path, name: &str, width: u32, height: u32) {
    let image = image::RgbaImage::from_pixel(width, height, image::Rgba([200, 10, 10, 255]));
    image.save(dir.join(name)).unwrap();
}

#[test]
fn test_builder_validation() {
    let result = VideoSourceBuilder::new().build();
    assert!(result.is_err());

    if let Err(crate::error::KioskError::System { message }) = result {
        assert!(message.contains("Camera configuration must be specified"));
    } else {
        panic!("Expected system error for missing configuration");
    }

    let result = VideoSourceBuilder::new()
        .config(create_test_camera_config(SourceKind::Images, None))
        .build();
    assert!(result.is_err());
}

#[test]
fn test_builder_images_source() {
    let dir = tempfile::tempdir().unwrap();
    let source = VideoSourceBuilder::new()
        .config(create_test_camera_config(
            SourceKind::Images,
            Some(dir.path().to_string_lossy().into_owned()),
        ))
        .build()
        .unwrap();

    assert!(source.name().starts_with("images:"));
    assert!(!source.is_live());
}

#[tokio::test]
async fn test_image_sequence_loops_in_name_order() {
    let dir = tempfile::tempdir().unwrap();
    write_png(dir.path(), "b.png", 4, 2);
    write_png(dir.path(), "a.png", 8, 6);
    std::fs::write(dir.path().join("notes.txt"), "not an image").unwrap();

    let mut source = ImageSequenceSource::new(dir.path());
    let info = source.start().await.unwrap();
    assert_eq!((info.width, info.height), (8, 6));
    assert_eq!(source.active_tracks(), 1);

    let first = source.current_frame().unwrap();
    let second = source.current_frame().unwrap();
    let third = source.current_frame().unwrap();

    assert_eq!((first.width, first.height), (8, 6));
    assert_eq!((second.width, second.height), (4, 2));
    assert_eq!((third.width, third.height), (8, 6));
    assert!(first.validate_size());
    assert_eq!(third.id, 2);

    source.stop();
    assert_eq!(source.active_tracks(), 0);
    assert!(source.current_frame().is_none());
}

#[tokio::test]
async fn test_image_sequence_acquisition_errors() {
    let mut missing = ImageSequenceSource::new("/nonexistent/kiosk-frames");
    assert_eq!(missing.start().await.unwrap_err(), CameraError::DeviceNotFound);

    let empty_dir = tempfile::tempdir().unwrap();
    let mut empty = ImageSequenceSource::new(empty_dir.path());
    assert_eq!(empty.start().await.unwrap_err(), CameraError::DeviceNotFound);
    assert!(!empty.is_live());
}

#[tokio::test]
async fn test_image_sequence_skips_corrupt_files() {
    let dir = tempfile::tempdir().unwrap();
    write_png(dir.path(), "a.png", 4, 4);
    std::fs::write(dir.path().join("b.png"), b"garbage").unwrap();

    let mut source = ImageSequenceSource::new(dir.path());
    source.start().await.unwrap();

    assert!(source.current_frame().is_some());
    assert!(source.current_frame().is_none());
    assert!(source.current_frame().is_some());
}

#[tokio::test]
async fn test_stop_before_start_is_noop() {
    let mut source = ImageSequenceSource::new("/nonexistent");
    source.stop();
    source.stop();
    assert_eq!(source.active_tracks(), 0);

    let mut mock = MockVideoSource::new();
    let probe = mock.probe();
    mock.stop();
    assert_eq!(probe.stop_calls(), 1);
    assert_eq!(probe.active_tracks(), 0);
}

#[tokio::test]
async fn test_mock_script_and_idle_frame() {
    let frame = Frame::new(9, SystemTime::now(), vec![0u8; 16], 2, 2);
    let mut mock = MockVideoSource::new()
        .with_frames(vec![None, Some(frame.clone())])
        .with_idle_frame(frame);
    let probe = mock.probe();

    // Not started: no frames and no request counted
    assert!(mock.current_frame().is_none());
    assert_eq!(probe.frame_requests(), 0);

    mock.start().await.unwrap();
    assert!(mock.current_frame().is_none());
    assert_eq!(mock.current_frame().unwrap().id, 9);
    assert_eq!(mock.current_frame().unwrap().id, 9);
    assert_eq!(probe.frame_requests(), 3);

    mock.stop();
    assert!(mock.current_frame().is_none());
    assert_eq!(probe.active_tracks(), 0);
}

#[tokio::test]
async fn test_mock_failing_start_holds_no_tracks() {
    let mut mock = MockVideoSource::failing(CameraError::PermissionDenied);
    let probe = mock.probe();

    let error = mock.start().await.unwrap_err();
    assert_eq!(error, CameraError::PermissionDenied);
    assert_eq!(error.kind(), "PermissionDenied");
    assert_eq!(probe.start_calls(), 1);
    assert_eq!(probe.active_tracks(), 0);
}
