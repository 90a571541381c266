use crate::frame::Frame;
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::trace;

/// Opaque payload extracted from a frame
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DecodedCode(String);

impl DecodedCode {
    pub fn new<S: Into<String>>(value: S) -> Self {
        Self(value.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl fmt::Display for DecodedCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Extracts an encoded string from a frame.
///
/// Implementations are pure functions of the pixel buffer: no state is carried between calls
/// and identical frames decode identically. A frame with no recognizable pattern yields `None`,
/// never an error.
pub trait Decoder: Send + Sync {
    fn decode(&self, frame: &Frame) -> Option<DecodedCode>;
}

/// QR code decoder backed by `rqrr`
#[derive(Debug, Default, Clone, Copy)]
pub struct QrDecoder;

impl QrDecoder {
    pub fn new() -> Self {
        Self
    }
}

impl Decoder for QrDecoder {
    fn decode(&self, frame: &Frame) -> Option<DecodedCode> {
        if !frame.validate_size() {
            trace!(
                "Frame {} has {} bytes, expected {}; skipping",
                frame.id,
                frame.data.len(),
                frame.expected_size()
            );
            return None;
        }

        let mut prepared = rqrr::PreparedImage::prepare_from_greyscale(
            frame.width as usize,
            frame.height as usize,
            |x, y| frame.luma_at(x, y),
        );

        let grids = prepared.detect_grids();
        trace!("Frame {}: {} candidate grids", frame.id, grids.len());

        grids.iter().find_map(|grid| match grid.decode() {
            Ok((_, content)) if !content.is_empty() => Some(DecodedCode::new(content)),
            Ok(_) => None,
            Err(e) => {
                trace!("Frame {}: grid failed to decode: {:?}", frame.id, e);
                None
            }
        })
    }
}
