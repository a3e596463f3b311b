//! Frame representation for the compositing pipeline.

use std::path::Path;

use glam::Vec2;

/// One video frame or still. Always stored as RGBA f32, display-referred,
/// nominally in `[0, 1]`, row-major with the origin at the top-left.
#[derive(Debug, Clone, PartialEq)]
pub struct Frame {
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
    /// Pixel data, `width × height` entries.
    pub pixels: Vec<[f32; 4]>,
}

#[derive(Debug, thiserror::Error)]
pub enum FrameError {
    #[error("expected {expected} pixels for {width}x{height}, got {actual}")]
    SizeMismatch {
        width: u32,
        height: u32,
        expected: usize,
        actual: usize,
    },
    #[error("failed to decode image: {0}")]
    Decode(#[from] image::ImageError),
    #[error("frame {index} out of range for a {len}-frame source")]
    OutOfRange { index: usize, len: usize },
}

impl Frame {
    /// Wrap existing pixel data, checking it matches the dimensions.
    pub fn new(width: u32, height: u32, pixels: Vec<[f32; 4]>) -> Result<Self, FrameError> {
        let expected = width as usize * height as usize;
        if pixels.len() != expected {
            return Err(FrameError::SizeMismatch {
                width,
                height,
                expected,
                actual: pixels.len(),
            });
        }
        Ok(Self {
            width,
            height,
            pixels,
        })
    }

    /// A frame filled with one color.
    pub fn filled(width: u32, height: u32, rgba: [f32; 4]) -> Self {
        Self {
            width,
            height,
            pixels: vec![rgba; width as usize * height as usize],
        }
    }

    /// Decode tightly packed 8-bit RGBA, as delivered by a video decoder.
    pub fn from_rgba8(width: u32, height: u32, bytes: &[u8]) -> Result<Self, FrameError> {
        let expected = width as usize * height as usize;
        if bytes.len() != expected * 4 {
            return Err(FrameError::SizeMismatch {
                width,
                height,
                expected,
                actual: bytes.len() / 4,
            });
        }
        let pixels = bytes
            .chunks_exact(4)
            .map(|p| {
                [
                    p[0] as f32 / 255.0,
                    p[1] as f32 / 255.0,
                    p[2] as f32 / 255.0,
                    p[3] as f32 / 255.0,
                ]
            })
            .collect();
        Ok(Self {
            width,
            height,
            pixels,
        })
    }

    /// Quantize to tightly packed 8-bit RGBA for display.
    pub fn to_rgba8(&self) -> Vec<u8> {
        self.pixels
            .iter()
            .flat_map(|p| p.map(quantize))
            .collect()
    }

    /// Load a still from disk via the `image` crate (PNG, JPEG, TIFF, ...).
    pub fn load(path: &Path) -> Result<Self, FrameError> {
        let img = image::open(path)?;
        Ok(Self::from_image(&img))
    }

    pub fn from_image(img: &image::DynamicImage) -> Self {
        let rgba = img.to_rgba32f();
        let (width, height) = rgba.dimensions();
        let pixels = rgba
            .pixels()
            .map(|p| [p.0[0], p.0[1], p.0[2], p.0[3]])
            .collect();
        Self {
            width,
            height,
            pixels,
        }
    }

    /// Convert to an 8-bit `image` buffer, e.g. for saving a still.
    pub fn to_rgba_image(&self) -> image::RgbaImage {
        let bytes = self.to_rgba8();
        image::RgbaImage::from_raw(self.width, self.height, bytes)
            .unwrap_or_else(|| image::RgbaImage::new(self.width, self.height))
    }

    /// Raw bytes of the f32 pixel buffer, for GPU upload.
    pub fn as_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.pixels)
    }

    pub fn pixel_count(&self) -> usize {
        self.pixels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pixels.is_empty()
    }

    pub fn get(&self, x: u32, y: u32) -> [f32; 4] {
        self.pixels[(y * self.width + x) as usize]
    }

    /// Pixel containing a normalized UV, clamped to the edges.
    ///
    /// Matches `texel_at` in `composite.wgsl`. The frame must be non-empty.
    pub fn texel_at(&self, uv: Vec2) -> (u32, u32) {
        let x = (uv.x * self.width as f32).floor().clamp(0.0, (self.width - 1) as f32) as u32;
        let y = (uv.y * self.height as f32).floor().clamp(0.0, (self.height - 1) as f32) as u32;
        (x, y)
    }

    /// Nearest-neighbour sample at a normalized UV, clamped to the edges.
    pub fn sample_nearest(&self, uv: Vec2) -> [f32; 4] {
        let (x, y) = self.texel_at(uv);
        self.get(x, y)
    }
}

#[inline]
fn quantize(v: f32) -> u8 {
    (v.clamp(0.0, 1.0) * 255.0 + 0.5) as u8
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_rejects_wrong_length() {
        let err = Frame::new(2, 2, vec![[0.0; 4]; 3]).unwrap_err();
        assert!(matches!(err, FrameError::SizeMismatch { expected: 4, actual: 3, .. }));
    }

    #[test]
    fn test_rgba8_round_trip_is_lossless() {
        let bytes: Vec<u8> = (0..=255u8).flat_map(|v| [v, 255 - v, v / 2, 255]).collect();
        let frame = Frame::from_rgba8(16, 16, &bytes).unwrap();
        assert_eq!(frame.to_rgba8(), bytes);
    }

    #[test]
    fn test_sample_nearest_clamps_to_edges() {
        let mut frame = Frame::filled(2, 1, [0.0, 0.0, 0.0, 1.0]);
        frame.pixels[1] = [1.0, 1.0, 1.0, 1.0];
        assert_eq!(frame.sample_nearest(Vec2::new(-0.5, 0.5))[0], 0.0);
        assert_eq!(frame.sample_nearest(Vec2::new(0.75, 0.5))[0], 1.0);
        assert_eq!(frame.sample_nearest(Vec2::new(3.0, 3.0))[0], 1.0);
    }

    #[test]
    fn test_image_round_trip_through_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("still.png");
        let frame = Frame::filled(3, 2, [1.0, 0.0, 0.0, 1.0]);
        frame.to_rgba_image().save(&path).unwrap();
        let loaded = Frame::load(&path).unwrap();
        assert_eq!(loaded.width, 3);
        assert_eq!(loaded.get(2, 1), [1.0, 0.0, 0.0, 1.0]);
    }
}
