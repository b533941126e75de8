//! Synthetic frame generator for tests and demos

use crate::frame::VideoFrame;
use crate::FrameSource;
use tracing::debug;

const PATTERN_WIDTH: u32 = 64;
const PATTERN_HEIGHT: u32 = 48;

/// Emits a moving gradient. The first `warmup_ticks` reads return no frame,
/// mimicking a camera that has not produced its first image yet.
pub struct TestPatternSource {
    warmup_remaining: u32,
    sequence: u32,
    closed: bool,
}

impl TestPatternSource {
    pub fn new(warmup_ticks: u32) -> Self {
        Self {
            warmup_remaining: warmup_ticks,
            sequence: 0,
            closed: false,
        }
    }
}

impl FrameSource for TestPatternSource {
    fn current_frame(&mut self) -> Option<VideoFrame> {
        if self.closed {
            return None;
        }
        if self.warmup_remaining > 0 {
            self.warmup_remaining -= 1;
            debug!(remaining = self.warmup_remaining, "test pattern warming up");
            return None;
        }

        self.sequence = self.sequence.wrapping_add(1);
        let shift = (self.sequence % 256) as u8;
        let mut data = Vec::with_capacity((PATTERN_WIDTH * PATTERN_HEIGHT * 3) as usize);
        for y in 0..PATTERN_HEIGHT {
            for x in 0..PATTERN_WIDTH {
                data.push((x as u8).wrapping_mul(4).wrapping_add(shift));
                data.push((y as u8).wrapping_mul(5));
                data.push(shift);
            }
        }
        Some(VideoFrame::new(data, PATTERN_WIDTH, PATTERN_HEIGHT))
    }

    fn close(&mut self) {
        self.closed = true;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_warmup_then_frames() {
        let mut source = TestPatternSource::new(2);
        assert!(source.current_frame().is_none());
        assert!(source.current_frame().is_none());
        let frame = source.current_frame().expect("warmed up");
        assert_eq!(frame.width, PATTERN_WIDTH);
        assert_eq!(frame.height, PATTERN_HEIGHT);
    }

    #[test]
    fn test_close_is_idempotent() {
        let mut source = TestPatternSource::new(0);
        assert!(source.current_frame().is_some());
        source.close();
        source.close();
        assert!(source.current_frame().is_none());
    }
}
