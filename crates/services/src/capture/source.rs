use std::sync::Arc;

use async_trait::async_trait;
use quiz_core::model::LandmarkFrame;

use crate::error::CaptureError;

/// One RGBA video frame from the camera.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    width: u32,
    height: u32,
    timestamp_ms: i64,
    pixels: Arc<[u8]>,
}

impl Frame {
    const BYTES_PER_PIXEL: usize = 4;

    /// Wraps raw RGBA pixels. Returns `None` if the buffer size does not match.
    #[must_use]
    pub fn new(width: u32, height: u32, timestamp_ms: i64, pixels: Vec<u8>) -> Option<Self> {
        let expected = (width as usize)
            .checked_mul(height as usize)?
            .checked_mul(Self::BYTES_PER_PIXEL)?;
        if pixels.len() != expected {
            return None;
        }
        Some(Self {
            width,
            height,
            timestamp_ms,
            pixels: pixels.into(),
        })
    }

    #[must_use]
    pub fn width(&self) -> u32 {
        self.width
    }

    #[must_use]
    pub fn height(&self) -> u32 {
        self.height
    }

    #[must_use]
    pub fn timestamp_ms(&self) -> i64 {
        self.timestamp_ms
    }

    #[must_use]
    pub fn pixels(&self) -> &[u8] {
        &self.pixels
    }

    /// Horizontally flipped copy, for a natural self-view.
    #[must_use]
    pub fn mirrored(&self) -> Self {
        let row_len = self.width as usize * Self::BYTES_PER_PIXEL;
        let mut flipped = Vec::with_capacity(self.pixels.len());
        if row_len > 0 {
            for row in self.pixels.chunks_exact(row_len) {
                for pixel in row.chunks_exact(Self::BYTES_PER_PIXEL).rev() {
                    flipped.extend_from_slice(pixel);
                }
            }
        }
        Self {
            width: self.width,
            height: self.height,
            timestamp_ms: self.timestamp_ms,
            pixels: flipped.into(),
        }
    }
}

/// Live video source. Exclusively owned by one session at a time.
///
/// `next_frame` is polled inside a `select!` loop and must be cancel-safe:
/// dropping the future before it resolves must not lose the camera.
#[async_trait]
pub trait CameraSource: Send {
    /// Opens the camera stream.
    ///
    /// # Errors
    ///
    /// Returns `CaptureError::CameraUnavailable` when permission is denied or no device exists.
    async fn acquire(&mut self) -> Result<(), CaptureError>;

    /// Waits for the next render callback. `None` means the stream has ended.
    async fn next_frame(&mut self) -> Option<Frame>;

    /// Stops every track of the stream. Irrevocable for this source.
    fn release(&mut self);
}

/// Presentation sink for the self-view. Called on every render callback
/// with the frame already mirrored.
pub trait FrameRenderer: Send {
    fn render(&mut self, frame: &Frame);

    fn overlay(&mut self, _landmarks: &LandmarkFrame) {}

    /// A headless renderer is never handed frames, so no mirrored copy is made.
    fn is_headless(&self) -> bool {
        false
    }
}

/// Renderer that draws nothing, for headless sessions.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullRenderer;

impl FrameRenderer for NullRenderer {
    fn render(&mut self, _frame: &Frame) {}

    fn is_headless(&self) -> bool {
        true
    }
}
