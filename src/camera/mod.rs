mod builder;
#[cfg(all(feature = "camera", target_os = "linux"))]
mod device;
mod images;
mod interface;
mod mock;
#[cfg(test)]
mod tests;

pub use builder::VideoSourceBuilder;
#[cfg(all(feature = "camera", target_os = "linux"))]
pub use device::GstVideoSource;
pub use images::ImageSequenceSource;
pub use interface::{StreamInfo, VideoSource};
pub use mock::{MockProbe, MockVideoSource};
