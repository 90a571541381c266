use std::sync::Arc;
use std::time::SystemTime;

/// Bytes per pixel of an RGBA frame
pub const RGBA_BYTES_PER_PIXEL: usize = 4;

/// Immutable RGBA snapshot of one video frame
#[derive(Debug, Clone)]
pub struct Frame {
    /// Sequence number within the capturing source
    pub id: u64,
    /// Timestamp when frame was captured
    pub timestamp: SystemTime,
    /// RGBA pixel data, row-major, no padding
    pub data: Arc<Vec<u8>>,
    /// Frame width in pixels
    pub width: u32,
    /// Frame height in pixels
    pub height: u32,
}

impl Frame {
    /// Create a new frame from RGBA bytes
    pub fn new(id: u64, timestamp: SystemTime, data: Vec<u8>, width: u32, height: u32) -> Self {
        Self {
            id,
            timestamp,
            data: Arc::new(data),
            width,
            height,
        }
    }

    /// Build a frame from tightly packed RGBA rows that may carry a stride
    pub fn from_strided_rgba(
        id: u64,
        timestamp: SystemTime,
        bytes: &[u8],
        width: u32,
        height: u32,
        stride: usize,
    ) -> Option<Self> {
        let row_len = width as usize * RGBA_BYTES_PER_PIXEL;
        if stride < row_len || bytes.len() < stride * (height as usize).saturating_sub(1) + row_len
        {
            return None;
        }

        let data = if stride == row_len {
            bytes[..row_len * height as usize].to_vec()
        } else {
            bytes
                .chunks(stride)
                .take(height as usize)
                .flat_map(|row| &row[..row_len])
                .copied()
                .collect()
        };

        Some(Self::new(id, timestamp, data, width, height))
    }

    /// Expected buffer size for the frame dimensions
    pub fn expected_size(&self) -> usize {
        self.width as usize * self.height as usize * RGBA_BYTES_PER_PIXEL
    }

    /// Validate frame data size against expected size
    pub fn validate_size(&self) -> bool {
        self.width > 0 && self.height > 0 && self.data.len() == self.expected_size()
    }

    /// Luma of the pixel at (x, y), Rec. 601 weights
    pub fn luma_at(&self, x: usize, y: usize) -> u8 {
        let offset = (y * self.width as usize + x) * RGBA_BYTES_PER_PIXEL;
        let r = self.data[offset] as u32;
        let g = self.data[offset + 1] as u32;
        let b = self.data[offset + 2] as u32;
        ((r * 299 + g * 587 + b * 114) / 1000) as u8
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_frame_size_validation() {
        let frame = Frame::new(1, SystemTime::now(), vec![0u8; 4 * 3 * 4], 4, 3);
        assert_eq!(frame.expected_size(), 48);
        assert!(frame.validate_size());

        let short = Frame::new(2, SystemTime::now(), vec![0u8; 10], 4, 3);
        assert!(!short.validate_size());

        let empty = Frame::new(3, SystemTime::now(), Vec::new(), 0, 0);
        assert!(!empty.validate_size());
    }

    #[test]
    fn test_luma() {
        let data = vec![255, 255, 255, 255, 0, 0, 0, 255, 255, 0, 0, 255];
        let frame = Frame::new(1, SystemTime::now(), data, 3, 1);

        assert_eq!(frame.luma_at(0, 0), 255);
        assert_eq!(frame.luma_at(1, 0), 0);
        assert_eq!(frame.luma_at(2, 0), 76);
    }

    #[test]
    fn test_strided_rows_are_packed() {
        // 2x2 frame with 4 bytes of padding per row
        let mut bytes = Vec::new();
        bytes.extend_from_slice(&[1, 1, 1, 255, 2, 2, 2, 255, 9, 9, 9, 9]);
        bytes.extend_from_slice(&[3, 3, 3, 255, 4, 4, 4, 255, 9, 9, 9, 9]);

        let frame = Frame::from_strided_rgba(7, SystemTime::now(), &bytes, 2, 2, 12).unwrap();
        assert!(frame.validate_size());
        assert_eq!(frame.data[8], 3);
        assert!(!frame.data.contains(&9));

        assert!(Frame::from_strided_rgba(8, SystemTime::now(), &bytes[..10], 2, 2, 12).is_none());
    }
}
