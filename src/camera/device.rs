use super::interface::{StreamInfo, VideoSource};
use crate::config::CameraConfig;
use crate::error::CameraError;
use crate::frame::Frame;
use async_trait::async_trait;
use gstreamer::prelude::*;
use gstreamer::Pipeline;
use gstreamer_app::AppSink;
use gstreamer_video::VideoInfo;
use std::io::ErrorKind;
use std::path::Path;
use std::time::SystemTime;
use tracing::{debug, info, trace, warn};

const PREROLL_TIMEOUT_SECONDS: u64 = 5;

/// GStreamer-backed camera delivering RGBA frames from a V4L2 device
pub struct GstVideoSource {
    config: CameraConfig,
    device_path: String,
    pipeline: Option<Pipeline>,
    appsink: Option<AppSink>,
    frame_counter: u64,
}

impl GstVideoSource {
    pub fn new(config: CameraConfig) -> Self {
        let device_path = format!("/dev/video{}", config.index);
        Self {
            config,
            device_path,
            pipeline: None,
            appsink: None,
            frame_counter: 0,
        }
    }

    /// Build GStreamer pipeline string converting the camera output to RGBA
    fn build_pipeline_string(&self) -> String {
        let (width, height) = self.config.resolution;

        format!(
            "v4l2src device={} io-mode=mmap ! \
             videoconvert ! videoscale ! videorate ! \
             video/x-raw,format=RGBA,width={},height={},framerate={}/1 ! \
             appsink name=sink sync=false max-buffers=1 drop=true emit-signals=false",
            self.device_path, width, height, self.config.fps
        )
    }

    /// Bring up `pipeline_desc` and wait for it to preroll.
    ///
    /// The pipeline is held from the moment it is set playing, so `stop` tears it down even if
    /// this future is dropped mid-preroll.
    async fn launch(&mut self, pipeline_desc: &str) -> Result<(), CameraError> {
        gstreamer::init()
            .map_err(|e| CameraError::busy(format!("Failed to initialize GStreamer: {}", e)))?;

        info!("Creating GStreamer pipeline: {}", pipeline_desc);

        let pipeline = gstreamer::parse::launch(pipeline_desc)
            .map_err(|e| CameraError::busy(format!("Failed to create pipeline: {}", e)))?
            .downcast::<Pipeline>()
            .map_err(|_| CameraError::busy("Failed to downcast to Pipeline"))?;

        let appsink = pipeline
            .by_name("sink")
            .ok_or_else(|| CameraError::busy("Pipeline has no appsink"))?
            .downcast::<AppSink>()
            .map_err(|_| CameraError::busy("Failed to downcast to AppSink"))?;

        if let Err(e) = pipeline.set_state(gstreamer::State::Playing) {
            let _ = pipeline.set_state(gstreamer::State::Null);
            return Err(CameraError::busy(format!("Failed to start pipeline: {}", e)));
        }
        self.pipeline = Some(pipeline.clone());

        // Wait for the device to negotiate and preroll off the async runtime
        let state_change = tokio::task::spawn_blocking(move || {
            pipeline
                .state(gstreamer::ClockTime::from_seconds(PREROLL_TIMEOUT_SECONDS))
                .0
        })
        .await;

        let state_change = match state_change {
            Ok(state_change) => state_change,
            Err(e) => {
                self.stop();
                return Err(CameraError::busy(format!(
                    "Pipeline state query failed: {}",
                    e
                )));
            }
        };

        if let Err(e) = state_change {
            self.stop();
            return Err(CameraError::busy(format!(
                "Device did not start streaming: {}",
                e
            )));
        }

        self.appsink = Some(appsink);
        self.frame_counter = 0;
        Ok(())
    }

    fn pull_frame(&mut self, appsink: &AppSink) -> Option<Frame> {
        let sample = appsink.try_pull_sample(gstreamer::ClockTime::ZERO)?;
        let buffer = sample.buffer()?;
        let caps = sample.caps()?;

        let info = match VideoInfo::from_caps(caps) {
            Ok(info) => info,
            Err(e) => {
                warn!("Failed to read video info from sample caps: {}", e);
                return None;
            }
        };

        let map = match buffer.map_readable() {
            Ok(map) => map,
            Err(e) => {
                warn!("Failed to map camera buffer: {}", e);
                return None;
            }
        };

        let stride = info.stride().first().copied().unwrap_or_default().max(0) as usize;
        let id = self.frame_counter;
        let frame = Frame::from_strided_rgba(
            id,
            SystemTime::now(),
            map.as_slice(),
            info.width(),
            info.height(),
            stride,
        )?;
        self.frame_counter += 1;

        trace!(
            "Pulled camera frame {} ({}x{}, stride {})",
            id,
            info.width(),
            info.height(),
            stride
        );
        Some(frame)
    }
}

/// Classify why the device node cannot be used before GStreamer gets involved
fn check_device_access(path: &Path) -> Result<(), CameraError> {
    match std::fs::OpenOptions::new().read(true).open(path) {
        Ok(_) => Ok(()),
        Err(e) => match e.kind() {
            ErrorKind::NotFound => Err(CameraError::DeviceNotFound),
            ErrorKind::PermissionDenied => Err(CameraError::PermissionDenied),
            _ => Err(CameraError::busy(format!("{}: {}", path.display(), e))),
        },
    }
}

#[async_trait]
impl VideoSource for GstVideoSource {
    fn name(&self) -> &str {
        &self.device_path
    }

    async fn start(&mut self) -> Result<StreamInfo, CameraError> {
        if self.pipeline.is_some() {
            warn!("Camera {} is already streaming", self.device_path);
            let (width, height) = self.config.resolution;
            return Ok(StreamInfo {
                width,
                height,
                description: self.build_pipeline_string(),
            });
        }

        check_device_access(Path::new(&self.device_path))?;

        let pipeline_desc = self.build_pipeline_string();
        self.launch(&pipeline_desc).await?;

        let (width, height) = self.config.resolution;
        info!(
            "Camera {} streaming at {}x{} @ {}fps",
            self.device_path, width, height, self.config.fps
        );

        Ok(StreamInfo {
            width,
            height,
            description: pipeline_desc,
        })
    }

    fn stop(&mut self) {
        self.appsink = None;
        if let Some(pipeline) = self.pipeline.take() {
            if let Err(e) = pipeline.set_state(gstreamer::State::Null) {
                warn!("Failed to stop pipeline for {}: {}", self.device_path, e);
            }
            info!("Camera {} released", self.device_path);
        } else {
            debug!("Camera {} is not streaming", self.device_path);
        }
    }

    fn current_frame(&mut self) -> Option<Frame> {
        let appsink = self.appsink.clone()?;
        self.pull_frame(&appsink)
    }

    fn active_tracks(&self) -> usize {
        usize::from(self.pipeline.is_some())
    }
}

impl Drop for GstVideoSource {
    fn drop(&mut self) {
        self.stop();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn create_test_config(index: u32) -> CameraConfig {
        CameraConfig {
            source: crate::config::SourceKind::Device,
            index,
            resolution: (640, 480),
            fps: 15,
            image_dir: None,
        }
    }

    #[test]
    fn test_pipeline_string() {
        let source = GstVideoSource::new(create_test_config(2));
        let desc = source.build_pipeline_string();

        assert!(desc.contains("device=/dev/video2"));
        assert!(desc.contains("format=RGBA,width=640,height=480,framerate=15/1"));
        assert!(desc.contains("appsink name=sink"));
    }

    #[tokio::test]
    async fn test_missing_device_is_not_found() {
        let mut source = GstVideoSource::new(create_test_config(250));

        let result = source.start().await;
        assert_eq!(result.unwrap_err(), CameraError::DeviceNotFound);
        assert_eq!(source.active_tracks(), 0);

        source.stop();
        source.stop();
        assert!(source.current_frame().is_none());
    }

    #[tokio::test]
    async fn test_interrupted_launch_can_be_stopped() {
        let mut source = GstVideoSource::new(create_test_config(0));
        let desc = "videotestsrc is-live=true ! \
                    video/x-raw,format=RGBA,width=64,height=48,framerate=15/1 ! \
                    appsink name=sink sync=false max-buffers=1 drop=true emit-signals=false";

        // Give up on the launch while it waits for preroll
        let _ = tokio::time::timeout(std::time::Duration::ZERO, source.launch(desc)).await;
        assert_eq!(source.active_tracks(), 1);

        source.stop();
        assert_eq!(source.active_tracks(), 0);
        assert!(source.current_frame().is_none());
    }
}
