//! Sampling and PNG encoding.
//!
//! Everything here is pure: the same curves always give the same buffer, and
//! the same buffer always gives the same PNG bytes.

use image::codecs::png::{CompressionType, FilterType, PngEncoder};
use image::{ColorType, ImageBuffer, ImageEncoder, ImageFormat, Rgba};

use crate::curve::{Curve, DEFAULT_VALUE};
use crate::error::BakeError;

/// Samples per strip.
pub const WIDTH: u32 = 32;
pub const HEIGHT: u32 = 1;

/// One baked RGBA8 strip, left to right for t = 0 -> 1.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PixelBuffer {
    img: ImageBuffer<Rgba<u8>, Vec<u8>>,
}

impl PixelBuffer {
    pub fn width(&self) -> u32 {
        self.img.width()
    }

    /// Number of samples, always equal to the width.
    pub fn len(&self) -> usize {
        self.img.width() as usize
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn pixel(&self, x: u32) -> Option<[u8; 4]> {
        if x < self.img.width() {
            Some(self.img.get_pixel(x, 0).0)
        } else {
            None
        }
    }

    pub fn pixels(&self) -> impl Iterator<Item = [u8; 4]> + '_ {
        self.img.pixels().map(|px| px.0)
    }

    /// Raw RGBA bytes, four per sample.
    pub fn as_raw(&self) -> &[u8] {
        self.img.as_raw()
    }

    /// Wrap a decoded image. Only a full `WIDTH` x `HEIGHT` strip is accepted.
    pub fn from_image(img: ImageBuffer<Rgba<u8>, Vec<u8>>) -> Result<Self, BakeError> {
        if img.width() != WIDTH || img.height() != HEIGHT {
            return Err(BakeError::Dimensions {
                width: img.width(),
                height: img.height(),
                expected_width: WIDTH,
                expected_height: HEIGHT,
            });
        }
        Ok(Self { img })
    }
}

/// Position of sample `x` along the curve domain.
pub fn sample_position(x: u32, width: u32) -> f32 {
    if width <= 1 {
        return 0.0;
    }
    x as f32 / (width - 1) as f32
}

/// `round(clamp01(v) * 255)`. NaN maps to 0.
pub fn quantize(v: f32) -> u8 {
    (v.clamp(0.0, 1.0) * 255.0).round() as u8
}

/// Sample the four channel curves into a `width` x 1 strip.
///
/// A missing curve reads as a constant 1.0.
pub fn render(
    r: Option<&dyn Curve>,
    g: Option<&dyn Curve>,
    b: Option<&dyn Curve>,
    a: Option<&dyn Curve>,
    width: u32,
) -> PixelBuffer {
    let channels = [r, g, b, a];
    let mut img: ImageBuffer<Rgba<u8>, Vec<u8>> = ImageBuffer::new(width, HEIGHT);
    for (x, _, px) in img.enumerate_pixels_mut() {
        let t = sample_position(x, width);
        let mut out = [0u8; 4];
        for (slot, curve) in out.iter_mut().zip(channels) {
            let v = curve.map_or(DEFAULT_VALUE, |c| c.evaluate(t));
            *slot = quantize(v);
        }
        *px = Rgba(out);
    }
    PixelBuffer { img }
}

/// Encode with pinned settings so identical buffers give identical bytes.
pub fn encode_png(buf: &PixelBuffer) -> Result<Vec<u8>, BakeError> {
    let mut png = Vec::new();
    let encoder =
        PngEncoder::new_with_quality(&mut png, CompressionType::Default, FilterType::NoFilter);
    encoder.write_image(buf.as_raw(), buf.img.width(), buf.img.height(), ColorType::Rgba8)?;
    Ok(png)
}

pub fn decode_png(bytes: &[u8]) -> Result<PixelBuffer, BakeError> {
    let img = image::load_from_memory_with_format(bytes, ImageFormat::Png)?.into_rgba8();
    PixelBuffer::from_image(img)
}
