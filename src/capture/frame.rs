//! Frame type representing a captured image with metadata.

use std::time::Instant;

/// A single captured frame from the camera.
///
/// Holds the raw pixel buffer handed to the landmark detector together
/// with the dimensions the signal extractor needs to scale normalized
/// landmark coordinates back into pixels.
#[derive(Clone)]
pub struct Frame {
    /// Raw interleaved pixel data.
    pixels: Vec<u8>,
    /// Frame width in pixels.
    width: u32,
    /// Frame height in pixels.
    height: u32,
    /// Bytes per pixel (1 for grayscale, 3 for RGB).
    channels: u8,
    /// Capture timestamp.
    timestamp: Instant,
    /// Monotonic sequence number.
    sequence: u64,
}

impl Frame {
    /// Creates a new RGB frame.
    pub fn new(pixels: Vec<u8>, width: u32, height: u32, sequence: u64) -> Self {
        Self::with_channels(pixels, width, height, 3, sequence)
    }

    /// Creates a frame with an explicit channel count.
    pub fn with_channels(
        pixels: Vec<u8>,
        width: u32,
        height: u32,
        channels: u8,
        sequence: u64,
    ) -> Self {
        Self {
            pixels,
            width,
            height,
            channels: channels.max(1),
            timestamp: Instant::now(),
            sequence,
        }
    }

    /// Returns a reference to the raw pixel data.
    #[inline]
    pub fn pixels(&self) -> &[u8] {
        &self.pixels
    }

    /// Returns the frame width.
    #[inline]
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Returns the frame height.
    #[inline]
    pub fn height(&self) -> u32 {
        self.height
    }

    /// Returns the number of bytes per pixel.
    #[inline]
    pub fn channels(&self) -> u8 {
        self.channels
    }

    /// Returns the capture timestamp.
    #[inline]
    pub fn timestamp(&self) -> Instant {
        self.timestamp
    }

    /// Returns the sequence number.
    #[inline]
    pub fn sequence(&self) -> u64 {
        self.sequence
    }

    /// Returns the total number of pixels (width * height).
    #[inline]
    pub fn pixel_count(&self) -> usize {
        (self.width as usize) * (self.height as usize)
    }

    /// Validates that the pixel buffer size matches dimensions.
    pub fn is_valid(&self) -> bool {
        self.pixels.len() == self.pixel_count() * self.channels as usize
    }
}

impl std::fmt::Debug for Frame {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Frame")
            .field("width", &self.width)
            .field("height", &self.height)
            .field("channels", &self.channels)
            .field("sequence", &self.sequence)
            .field("pixel_bytes", &self.pixels.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rgb_frame_creation() {
        let pixels = vec![0u8; 640 * 480 * 3];
        let frame = Frame::new(pixels, 640, 480, 1);

        assert_eq!(frame.width(), 640);
        assert_eq!(frame.height(), 480);
        assert_eq!(frame.channels(), 3);
        assert_eq!(frame.sequence(), 1);
        assert!(frame.is_valid());
    }

    #[test]
    fn test_grayscale_frame_size() {
        let frame = Frame::with_channels(vec![0u8; 64], 8, 8, 1, 1);
        assert!(frame.is_valid());

        // Same buffer read as RGB is too short
        let frame = Frame::new(vec![0u8; 64], 8, 8, 1);
        assert!(!frame.is_valid());
    }
}
