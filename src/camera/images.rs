use super::interface::{StreamInfo, VideoSource};
use crate::error::CameraError;
use crate::frame::Frame;
use async_trait::async_trait;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::time::SystemTime;
use tracing::{debug, info, trace, warn};

const IMAGE_EXTENSIONS: [&str; 3] = ["png", "jpg", "jpeg"];

/// Replays a directory of still images as a video stream, one image per frame, looping.
///
/// Images are read in file name order. An image that fails to decode yields no frame for
/// that sample, the same as a camera that has not buffered enough data.
pub struct ImageSequenceSource {
    dir: PathBuf,
    name: String,
    files: Vec<PathBuf>,
    position: usize,
    frame_counter: u64,
    live: bool,
}

impl ImageSequenceSource {
    pub fn new<P: Into<PathBuf>>(dir: P) -> Self {
        let dir = dir.into();
        let name = format!("images:{}", dir.display());
        Self {
            dir,
            name,
            files: Vec::new(),
            position: 0,
            frame_counter: 0,
            live: false,
        }
    }

    fn list_images(dir: &Path) -> Result<Vec<PathBuf>, CameraError> {
        let entries = std::fs::read_dir(dir).map_err(|e| match e.kind() {
            ErrorKind::NotFound => CameraError::DeviceNotFound,
            ErrorKind::PermissionDenied => CameraError::PermissionDenied,
            _ => CameraError::busy(format!("{}: {}", dir.display(), e)),
        })?;

        let mut files: Vec<PathBuf> = entries
            .filter_map(|entry| entry.ok().map(|entry| entry.path()))
            .filter(|path| path.is_file() && has_image_extension(path))
            .collect();
        files.sort();

        Ok(files)
    }

    fn load(&mut self, path: &Path) -> Option<Frame> {
        let image = match image::open(path) {
            Ok(image) => image.to_rgba8(),
            Err(e) => {
                warn!("Skipping unreadable image {}: {}", path.display(), e);
                return None;
            }
        };

        let (width, height) = image.dimensions();
        let id = self.frame_counter;
        self.frame_counter += 1;

        trace!("Loaded frame {} from {} ({}x{})", id, path.display(), width, height);
        Some(Frame::new(id, SystemTime::now(), image.into_raw(), width, height))
    }
}

fn has_image_extension(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| IMAGE_EXTENSIONS.contains(&ext.to_ascii_lowercase().as_str()))
        .unwrap_or(false)
}

#[async_trait]
impl VideoSource for ImageSequenceSource {
    fn name(&self) -> &str {
        &self.name
    }

    async fn start(&mut self) -> Result<StreamInfo, CameraError> {
        let files = Self::list_images(&self.dir)?;
        let first = files.first().ok_or(CameraError::DeviceNotFound)?;

        let (width, height) = image::image_dimensions(first)
            .map_err(|e| CameraError::busy(format!("{}: {}", first.display(), e)))?;

        info!(
            "Image sequence {} started with {} images",
            self.dir.display(),
            files.len()
        );

        self.files = files;
        self.position = 0;
        self.frame_counter = 0;
        self.live = true;

        Ok(StreamInfo {
            width,
            height,
            description: self.name.clone(),
        })
    }

    fn stop(&mut self) {
        if self.live {
            debug!("Image sequence {} stopped", self.dir.display());
        }
        self.live = false;
        self.files.clear();
        self.position = 0;
    }

    fn current_frame(&mut self) -> Option<Frame> {
        if !self.live || self.files.is_empty() {
            return None;
        }

        let path = self.files[self.position].clone();
        self.position = (self.position + 1) % self.files.len();
        self.load(&path)
    }

    fn active_tracks(&self) -> usize {
        usize::from(self.live)
    }
}
