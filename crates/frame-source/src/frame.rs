//! Decoded video frame type

use chrono::{DateTime, Utc};

/// Decoded RGB video frame
#[derive(Debug, Clone)]
pub struct VideoFrame {
    /// RGB pixel data (width * height * 3)
    pub data: Vec<u8>,
    /// Frame width
    pub width: u32,
    /// Frame height
    pub height: u32,
    /// Capture timestamp
    pub captured_at: DateTime<Utc>,
}

impl VideoFrame {
    /// Create a new video frame from raw RGB data, stamped now
    pub fn new(data: Vec<u8>, width: u32, height: u32) -> Self {
        Self {
            data,
            width,
            height,
            captured_at: Utc::now(),
        }
    }

    /// A frame with no pixels yet (source still warming up)
    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    /// Get pixel at (x, y)
    pub fn get_pixel(&self, x: u32, y: u32) -> Option<[u8; 3]> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let idx = ((y * self.width + x) * 3) as usize;
        Some([self.data[idx], self.data[idx + 1], self.data[idx + 2]])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_frame() {
        let frame = VideoFrame::new(Vec::new(), 0, 0);
        assert!(frame.is_empty());
        assert!(frame.get_pixel(0, 0).is_none());
    }

    #[test]
    fn test_pixel_access() {
        let frame = VideoFrame::new(vec![10, 20, 30, 40, 50, 60], 2, 1);
        assert!(!frame.is_empty());
        assert_eq!(frame.get_pixel(1, 0), Some([40, 50, 60]));
        assert_eq!(frame.get_pixel(2, 0), None);
    }
}
