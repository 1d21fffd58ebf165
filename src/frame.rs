//! Owned video frames and the image plumbing shared by the stages.

use std::fmt;

use image::buffer::ConvertBuffer;
use image::imageops::{self, FilterType};
use image::{GrayImage, RgbImage};

use crate::geometry::PixelRect;
use crate::source::FrameView;

/// A full-resolution RGB frame with its capture timestamp. Frames are
/// published behind `Arc` so downstream stages share one pixel buffer.
#[derive(Clone)]
pub struct Frame {
    pixels: RgbImage,
    pub timestamp_ns: u64,
}

impl Frame {
    pub fn new(pixels: RgbImage, timestamp_ns: u64) -> Self {
        Self {
            pixels,
            timestamp_ns,
        }
    }

    /// Deep-copy a borrowed view into an owned frame. The capture stage calls
    /// this before the source's buffer is reused for the next frame.
    ///
    /// A view whose byte length does not match its dimensions is a source
    /// bug; debug builds panic, release builds substitute a black frame.
    pub fn from_view(view: &FrameView<'_>) -> Self {
        debug_assert_eq!(
            view.data.len(),
            view.width as usize * view.height as usize * 3,
            "frame view byte length does not match its dimensions"
        );
        let pixels = RgbImage::from_raw(view.width, view.height, view.data.to_vec())
            .unwrap_or_else(|| RgbImage::new(view.width, view.height));
        Self {
            pixels,
            timestamp_ns: view.timestamp_ns,
        }
    }

    pub fn width(&self) -> u32 {
        self.pixels.width()
    }

    pub fn height(&self) -> u32 {
        self.pixels.height()
    }

    pub fn pixels(&self) -> &RgbImage {
        &self.pixels
    }

    pub fn to_gray(&self) -> GrayImage {
        self.pixels.convert()
    }
}

impl fmt::Debug for Frame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Frame")
            .field("width", &self.width())
            .field("height", &self.height())
            .field("timestamp_ns", &self.timestamp_ns)
            .finish()
    }
}

/// Bilinear downsample to the coarse search resolution.
pub fn downsample(gray: &GrayImage, width: u32, height: u32) -> GrayImage {
    imageops::resize(gray, width, height, FilterType::Triangle)
}

/// Extract the region `rect` as an owned image. The caller guarantees the
/// rectangle lies within the frame.
pub fn crop(gray: &GrayImage, rect: &PixelRect) -> GrayImage {
    imageops::crop_imm(gray, rect.x, rect.y, rect.width, rect.height).to_image()
}
