use crate::error::CameraError;
use crate::frame::Frame;
use async_trait::async_trait;

/// Properties of a live stream reported once acquisition succeeds
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StreamInfo {
    pub width: u32,
    pub height: u32,
    pub description: String,
}

/// A platform capability that yields video frames.
///
/// Implementations own whatever hardware handles ("tracks") they open in [`VideoSource::start`]
/// and must release all of them in [`VideoSource::stop`]. `stop` is idempotent and must be a
/// no-op on a source that was never started.
#[async_trait]
pub trait VideoSource: Send {
    /// Short human-readable name used in logs
    fn name(&self) -> &str;

    /// Open the device and begin streaming
    async fn start(&mut self) -> Result<StreamInfo, CameraError>;

    /// Release every track held by the source
    fn stop(&mut self);

    /// The current frame, or `None` when the source has not buffered enough data to paint a
    /// full frame. Never blocks waiting for data.
    fn current_frame(&mut self) -> Option<Frame>;

    /// Number of hardware tracks currently held
    fn active_tracks(&self) -> usize;

    fn is_live(&self) -> bool {
        self.active_tracks() > 0
    }
}
