use crate::camera::VideoSource;
use crate::frame::Frame;
use std::time::Duration;
use tokio::time::{interval_at, Instant, Interval, MissedTickBehavior};
use tracing::trace;

/// Longest accepted sampling period
pub const MAX_SAMPLE_INTERVAL: Duration = Duration::from_secs(60);

/// Fixed-cadence frame sampler.
///
/// The first tick fires one period after creation. A tick that falls behind (slow decode) is
/// delayed rather than replayed in a burst. Periods above [`MAX_SAMPLE_INTERVAL`] are clamped.
pub struct FrameSampler {
    interval: Interval,
    period: Duration,
    ticks: u64,
}

impl FrameSampler {
    pub fn new(period: Duration) -> Self {
        let period = period.min(MAX_SAMPLE_INTERVAL);
        let mut interval = interval_at(Instant::now() + period, period);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

        Self {
            interval,
            period,
            ticks: 0,
        }
    }

    pub fn period(&self) -> Duration {
        self.period
    }

    /// Ticks elapsed so far
    pub fn ticks(&self) -> u64 {
        self.ticks
    }

    /// Wait for the next tick, then capture the source's current frame.
    ///
    /// Returns `None` when the source has no full frame buffered; that tick is skipped.
    /// Cancel-safe: dropping the future before the tick fires captures nothing.
    pub async fn next_frame(&mut self, source: &mut dyn VideoSource) -> Option<Frame> {
        self.interval.tick().await;
        self.ticks += 1;

        let frame = source.current_frame();
        if frame.is_none() {
            trace!("Tick {}: {} has no frame ready", self.ticks, source.name());
        }
        frame
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::camera::MockVideoSource;
    use std::time::SystemTime;

    #[tokio::test(start_paused = true)]
    async fn test_first_tick_waits_one_period() {
        let frame = Frame::new(1, SystemTime::now(), vec![0u8; 4], 1, 1);
        let mut source = MockVideoSource::new().with_idle_frame(frame);
        source.start().await.unwrap();

        let mut sampler = FrameSampler::new(Duration::from_millis(300));
        let started = Instant::now();

        assert!(sampler.next_frame(&mut source).await.is_some());
        assert_eq!(started.elapsed(), Duration::from_millis(300));

        assert!(sampler.next_frame(&mut source).await.is_some());
        assert_eq!(started.elapsed(), Duration::from_millis(600));
        assert_eq!(sampler.ticks(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_missing_frames_are_skipped() {
        let frame = Frame::new(1, SystemTime::now(), vec![0u8; 4], 1, 1);
        let mut source = MockVideoSource::new().with_frames(vec![None, None, Some(frame)]);
        source.start().await.unwrap();

        let mut sampler = FrameSampler::new(Duration::from_millis(100));

        assert!(sampler.next_frame(&mut source).await.is_none());
        assert!(sampler.next_frame(&mut source).await.is_none());
        assert_eq!(sampler.next_frame(&mut source).await.unwrap().id, 1);
        assert_eq!(sampler.ticks(), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_stopped_source_yields_nothing() {
        let mut source = MockVideoSource::new();
        let mut sampler = FrameSampler::new(Duration::from_millis(100));

        assert!(sampler.next_frame(&mut source).await.is_none());
        assert_eq!(sampler.period(), Duration::from_millis(100));
    }

    #[tokio::test(start_paused = true)]
    async fn test_huge_period_is_clamped() {
        let frame = Frame::new(1, SystemTime::now(), vec![0u8; 4], 1, 1);
        let mut source = MockVideoSource::new().with_idle_frame(frame);
        source.start().await.unwrap();

        let mut sampler = FrameSampler::new(Duration::from_secs(u64::MAX));
        let started = Instant::now();

        assert_eq!(sampler.period(), MAX_SAMPLE_INTERVAL);
        assert!(sampler.next_frame(&mut source).await.is_some());
        assert_eq!(started.elapsed(), MAX_SAMPLE_INTERVAL);
    }
}
