//! Data Augmentation Module
//!
//! Deterministic augmentation variants applied before the final resize and
//! normalize step. Each base record expands into the original image plus
//! one sample per transform.

use image::imageops::FilterType;
use image::DynamicImage;

use crate::{CHANNEL_MEAN, CHANNEL_STD};

/// A deterministic transform applied to a base sample.
///
/// Encoded as an offset `0..=TRANSFORM_COUNT` where 0 means "original".
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AugmentationVariant {
    Original,
    Rotate90,
    FlipHorizontal,
    Brighten,
    Darken,
}

/// Number of non-original transforms
pub const TRANSFORM_COUNT: usize = 4;

impl AugmentationVariant {
    /// Variant for a given offset; `None` when out of range
    pub fn from_offset(offset: usize) -> Option<Self> {
        match offset {
            0 => Some(AugmentationVariant::Original),
            1 => Some(AugmentationVariant::Rotate90),
            2 => Some(AugmentationVariant::FlipHorizontal),
            3 => Some(AugmentationVariant::Brighten),
            4 => Some(AugmentationVariant::Darken),
            _ => None,
        }
    }

    /// Offset encoding of the variant
    pub fn offset(&self) -> usize {
        match self {
            AugmentationVariant::Original => 0,
            AugmentationVariant::Rotate90 => 1,
            AugmentationVariant::FlipHorizontal => 2,
            AugmentationVariant::Brighten => 3,
            AugmentationVariant::Darken => 4,
        }
    }
}

/// Applies augmentation variants and produces normalized sample arrays
#[derive(Debug, Clone)]
pub struct Augmenter {
    image_size: u32,
}

impl Augmenter {
    pub fn new(image_size: u32) -> Self {
        Self { image_size }
    }

    /// Apply the variant's transform to an image
    pub fn apply(&self, img: DynamicImage, variant: AugmentationVariant) -> DynamicImage {
        match variant {
            AugmentationVariant::Original => img,
            AugmentationVariant::Rotate90 => img.rotate90(),
            AugmentationVariant::FlipHorizontal => img.fliph(),
            AugmentationVariant::Brighten => img.brighten(30),
            AugmentationVariant::Darken => img.brighten(-30),
        }
    }

    /// Resize to the target square size
    pub fn resize(&self, img: DynamicImage) -> DynamicImage {
        img.resize_exact(self.image_size, self.image_size, FilterType::Triangle)
    }

    /// Convert to a channel-normalized CHW float array:
    /// `(pixel / 255 - mean) / std` per channel.
    pub fn normalize(&self, img: &DynamicImage) -> Vec<f32> {
        let rgb = img.to_rgb8();
        let (width, height) = (rgb.width() as usize, rgb.height() as usize);
        let mut data = vec![0.0f32; 3 * height * width];

        for y in 0..height {
            for x in 0..width {
                let pixel = rgb.get_pixel(x as u32, y as u32);
                for c in 0..3 {
                    let value = pixel[c] as f32 / 255.0;
                    data[c * height * width + y * width + x] =
                        (value - CHANNEL_MEAN[c]) / CHANNEL_STD[c];
                }
            }
        }

        data
    }

    /// Full pipeline: transform, resize, normalize
    pub fn process(&self, img: DynamicImage, variant: AugmentationVariant) -> Vec<f32> {
        let transformed = self.apply(img, variant);
        let resized = self.resize(transformed);
        self.normalize(&resized)
    }
}
