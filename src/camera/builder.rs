use super::images::ImageSequenceSource;
use super::interface::VideoSource;
use crate::config::{CameraConfig, SourceKind};
use crate::error::{KioskError, Result};
use tracing::info;

/// Builder that picks the frame source named by the camera configuration
pub struct VideoSourceBuilder {
    config: Option<CameraConfig>,
}

impl VideoSourceBuilder {
    pub fn new() -> Self {
        Self { config: None }
    }

    pub fn config(mut self, config: CameraConfig) -> Self {
        self.config = Some(config);
        self
    }

    pub fn build(self) -> Result<Box<dyn VideoSource>> {
        let config = self
            .config
            .ok_or_else(|| KioskError::system("Camera configuration must be specified"))?;

        match config.source {
            SourceKind::Images => {
                let dir = config.image_dir.clone().ok_or_else(|| {
                    KioskError::system("camera.image_dir is required for the images source")
                })?;
                info!("Using image sequence source from {}", dir);
                Ok(Box::new(ImageSequenceSource::new(dir)))
            }
            SourceKind::Device => Self::build_device(config),
        }
    }

    #[cfg(all(feature = "camera", target_os = "linux"))]
    fn build_device(config: CameraConfig) -> Result<Box<dyn VideoSource>> {
        info!("Using GStreamer camera source /dev/video{}", config.index);
        Ok(Box::new(super::device::GstVideoSource::new(config)))
    }

    #[cfg(not(all(feature = "camera", target_os = "linux")))]
    fn build_device(_config: CameraConfig) -> Result<Box<dyn VideoSource>> {
        Err(KioskError::system(
            "Camera support is not available in this build; set camera.source = \"images\"",
        ))
    }
}

impl Default for VideoSourceBuilder {
    fn default() -> Self {
        Self::new()
    }
}
