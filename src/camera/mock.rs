use super::interface::{StreamInfo, VideoSource};
use crate::error::CameraError;
use crate::frame::Frame;
use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

#[derive(Default)]
struct MockState {
    start_calls: usize,
    stop_calls: usize,
    frame_requests: usize,
    active_tracks: usize,
}

/// Counters shared with a [`MockVideoSource`] so tests can observe it after handing it off
#[derive(Clone)]
pub struct MockProbe {
    state: Arc<Mutex<MockState>>,
}

impl MockProbe {
    pub fn start_calls(&self) -> usize {
        self.state.lock().start_calls
    }

    pub fn stop_calls(&self) -> usize {
        self.state.lock().stop_calls
    }

    /// Ticks that asked the source for a frame
    pub fn frame_requests(&self) -> usize {
        self.state.lock().frame_requests
    }

    pub fn active_tracks(&self) -> usize {
        self.state.lock().active_tracks
    }
}

/// Scripted video source for testing without camera hardware.
///
/// Each frame request pops the next scripted entry; `None` entries model ticks where the
/// source has not buffered a full frame. Once the script runs out the source keeps answering
/// with the idle frame, if any.
pub struct MockVideoSource {
    start_result: Result<StreamInfo, CameraError>,
    start_delay: Option<Duration>,
    script: VecDeque<Option<Frame>>,
    idle_frame: Option<Frame>,
    state: Arc<Mutex<MockState>>,
}

impl MockVideoSource {
    /// A source that starts successfully at 640x480 with an empty script
    pub fn new() -> Self {
        Self {
            start_result: Ok(StreamInfo {
                width: 640,
                height: 480,
                description: "mock".to_string(),
            }),
            start_delay: None,
            script: VecDeque::new(),
            idle_frame: None,
            state: Arc::new(Mutex::new(MockState::default())),
        }
    }

    /// A source whose acquisition fails with the given error
    pub fn failing(error: CameraError) -> Self {
        Self {
            start_result: Err(error),
            ..Self::new()
        }
    }

    pub fn with_frames<I>(mut self, frames: I) -> Self
    where
        I: IntoIterator<Item = Option<Frame>>,
    {
        self.script.extend(frames);
        self
    }

    pub fn with_idle_frame(mut self, frame: Frame) -> Self {
        self.idle_frame = Some(frame);
        self
    }

    /// Delay acquisition, like a permission prompt the user has not answered yet
    pub fn with_start_delay(mut self, delay: Duration) -> Self {
        self.start_delay = Some(delay);
        self
    }

    pub fn probe(&self) -> MockProbe {
        MockProbe {
            state: Arc::clone(&self.state),
        }
    }
}

impl Default for MockVideoSource {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl VideoSource for MockVideoSource {
    fn name(&self) -> &str {
        "mock"
    }

    async fn start(&mut self) -> Result<StreamInfo, CameraError> {
        self.state.lock().start_calls += 1;

        if let Some(delay) = self.start_delay {
            tokio::time::sleep(delay).await;
        }

        let info = self.start_result.clone()?;
        self.state.lock().active_tracks = 1;
        debug!("Mock camera started");
        Ok(info)
    }

    fn stop(&mut self) {
        let mut state = self.state.lock();
        state.stop_calls += 1;
        state.active_tracks = 0;
    }

    fn current_frame(&mut self) -> Option<Frame> {
        {
            let mut state = self.state.lock();
            if state.active_tracks == 0 {
                return None;
            }
            state.frame_requests += 1;
        }

        match self.script.pop_front() {
            Some(entry) => entry,
            None => self.idle_frame.clone(),
        }
    }

    fn active_tracks(&self) -> usize {
        self.state.lock().active_tracks
    }
}
