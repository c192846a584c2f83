//! Frame type representing a captured image with metadata.

use std::time::Instant;

/// Bytes per pixel in a frame buffer (RGBA).
pub const CHANNELS: usize = 4;

/// A single captured frame from the video source.
///
/// Pixels are stored as row-major RGBA, the layout a drawing surface
/// hands back for a video frame.
#[derive(Clone)]
pub struct Frame {
    /// Raw RGBA pixel data.
    pixels: Vec<u8>,
    /// Frame width in pixels.
    width: u32,
    /// Frame height in pixels.
    height: u32,
    /// Capture timestamp.
    timestamp: Instant,
    /// Monotonic sequence number.
    sequence: u64,
}

impl Frame {
    /// Creates a new frame with the given parameters.
    pub fn new(pixels: Vec<u8>, width: u32, height: u32, sequence: u64) -> Self {
        Self {
            pixels,
            width,
            height,
            timestamp: Instant::now(),
            sequence,
        }
    }

    /// Creates a frame filled with a single RGBA color.
    pub fn filled(width: u32, height: u32, rgba: [u8; 4], sequence: u64) -> Self {
        let count = (width as usize) * (height as usize);
        let pixels = rgba.iter().copied().cycle().take(count * CHANNELS).collect();
        Self::new(pixels, width, height, sequence)
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
        self.pixels.len() == self.pixel_count() * CHANNELS
    }

    /// Returns the RGBA value at `(x, y)`, or `None` outside the frame.
    pub fn pixel(&self, x: u32, y: u32) -> Option<[u8; 4]> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let offset = ((y as usize) * (self.width as usize) + x as usize) * CHANNELS;
        let px = self.pixels.get(offset..offset + CHANNELS)?;
        Some([px[0], px[1], px[2], px[3]])
    }

    /// Converts the frame to grayscale in place.
    ///
    /// Each of the three color channels is replaced with the rounded luma
    /// `0.299 R + 0.587 G + 0.114 B`. Alpha is left untouched.
    pub fn to_grayscale(&mut self) {
        for px in self.pixels.chunks_exact_mut(CHANNELS) {
            let gray = luma(px[0], px[1], px[2]);
            px[0] = gray;
            px[1] = gray;
            px[2] = gray;
        }
    }

    /// Copies the lower half of the frame into a new frame.
    ///
    /// The result holds the last `height / 2` rows and keeps the
    /// sequence number of the source frame.
    pub fn lower_half(&self) -> Frame {
        let half = self.height / 2;
        let row_bytes = self.width as usize * CHANNELS;
        let start = ((self.height - half) as usize) * row_bytes;
        let end = (self.height as usize * row_bytes).min(self.pixels.len());
        let pixels = self.pixels.get(start..end).unwrap_or_default().to_vec();

        Frame {
            pixels,
            width: self.width,
            height: half,
            timestamp: self.timestamp,
            sequence: self.sequence,
        }
    }
}

/// Computes the 8-bit luma of an RGB triple, rounded to nearest.
#[inline]
pub fn luma(r: u8, g: u8, b: u8) -> u8 {
    let y = 0.299 * f64::from(r) + 0.587 * f64::from(g) + 0.114 * f64::from(b);
    y.round() as u8
}

impl std::fmt::Debug for Frame {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Frame")
            .field("width", &self.width)
            .field("height", &self.height)
            .field("sequence", &self.sequence)
            .field("pixel_bytes", &self.pixels.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_frame_creation() {
        let frame = Frame::filled(640, 480, [1, 2, 3, 255], 1);

        assert_eq!(frame.width(), 640);
        assert_eq!(frame.height(), 480);
        assert_eq!(frame.sequence(), 1);
        assert!(frame.is_valid());
        assert_eq!(frame.pixel(639, 479), Some([1, 2, 3, 255]));
        assert_eq!(frame.pixel(640, 0), None);
    }

    #[test]
    fn test_frame_invalid_size() {
        let pixels = vec![0u8; 100]; // Wrong size
        let frame = Frame::new(pixels, 640, 480, 1);

        assert!(!frame.is_valid());
    }

    #[test]
    fn test_luma_weights() {
        assert_eq!(luma(0, 0, 0), 0);
        assert_eq!(luma(255, 255, 255), 255);
        // 0.299 * 255 = 76.245
        assert_eq!(luma(255, 0, 0), 76);
        // 0.587 * 255 = 149.685
        assert_eq!(luma(0, 255, 0), 150);
        // 0.114 * 255 = 29.07
        assert_eq!(luma(0, 0, 255), 29);
    }

    #[test]
    fn test_grayscale_keeps_alpha() {
        let mut frame = Frame::filled(2, 2, [255, 0, 0, 17], 3);
        frame.to_grayscale();

        for y in 0..2 {
            for x in 0..2 {
                assert_eq!(frame.pixel(x, y), Some([76, 76, 76, 17]));
            }
        }
    }

    #[test]
    fn test_lower_half_takes_bottom_rows() {
        // 1x4 frame with a distinct red value per row
        let pixels: Vec<u8> = (0..4u8).flat_map(|row| [row, 0, 0, 255]).collect();
        let frame = Frame::new(pixels, 1, 4, 9);

        let lower = frame.lower_half();
        assert_eq!(lower.height(), 2);
        assert_eq!(lower.sequence(), 9);
        assert!(lower.is_valid());
        assert_eq!(lower.pixel(0, 0), Some([2, 0, 0, 255]));
        assert_eq!(lower.pixel(0, 1), Some([3, 0, 0, 255]));
    }

    #[test]
    fn test_lower_half_odd_height() {
        let pixels: Vec<u8> = (0..5u8).flat_map(|row| [row, 0, 0, 255]).collect();
        let frame = Frame::new(pixels, 1, 5, 1);

        let lower = frame.lower_half();
        assert_eq!(lower.height(), 2);
        assert_eq!(lower.pixel(0, 0), Some([3, 0, 0, 255]));
    }

    proptest! {
        #[test]
        fn prop_gray_pixels_map_to_themselves(v in any::<u8>()) {
            prop_assert_eq!(luma(v, v, v), v);
        }

        #[test]
        fn prop_luma_between_channel_extremes(r in any::<u8>(), g in any::<u8>(), b in any::<u8>()) {
            let y = luma(r, g, b);
            prop_assert!(y >= r.min(g).min(b));
            prop_assert!(y <= r.max(g).max(b));
        }
    }
}
