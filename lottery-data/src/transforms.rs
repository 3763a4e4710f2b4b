//! Image transforms applied when a sample is loaded.
//!
//! Everything operates on `image::DynamicImage` until the very end, where
//! [`to_chw`] turns the image into a planar `[C, H, W]` buffer in `[0, 1]` and
//! [`Normalize`] standardizes each channel.

use image::imageops::{self, FilterType};
use image::{DynamicImage, GenericImageView, ImageBuffer, Pixel};
use lottery_core::{LotteryError, Result};
use rand::Rng;

/// Per-example image transforms, in the order they are listed.
#[derive(Debug, Clone, PartialEq)]
pub enum ImageTransform {
    /// Resize so the shorter side equals the given size, keeping aspect.
    Resize(u32),
    /// Crop the central `size x size` square, padding with black if needed.
    CenterCrop(u32),
    /// Crop a random area/aspect region and resize it to `size x size`.
    RandomResizedCrop {
        size: u32,
        scale: (f32, f32),
        ratio: (f32, f32),
    },
    /// Mirror left-right with the given probability.
    RandomHorizontalFlip(f64),
    /// Pad every side by `padding` black pixels, then crop a random
    /// `size x size` window.
    RandomCrop { size: u32, padding: u32 },
}

impl ImageTransform {
    /// Random-resized-crop settings shared by the large-image datasets.
    pub fn imagenet_crop(size: u32) -> Self {
        ImageTransform::RandomResizedCrop {
            size,
            scale: (0.1, 1.0),
            ratio: (0.8, 1.25),
        }
    }

    pub fn apply<R: Rng + ?Sized>(&self, img: DynamicImage, rng: &mut R) -> DynamicImage {
        match *self {
            ImageTransform::Resize(size) => resize_shorter_side(&img, size),
            ImageTransform::CenterCrop(size) => center_crop(&img, size),
            ImageTransform::RandomResizedCrop { size, scale, ratio } => {
                random_resized_crop(&img, size, scale, ratio, rng)
            }
            ImageTransform::RandomHorizontalFlip(p) => {
                if rng.gen::<f64>() < p {
                    img.fliph()
                } else {
                    img
                }
            }
            ImageTransform::RandomCrop { size, padding } => {
                let (w, h) = img.dimensions();
                let padded = pad(&img, w + 2 * padding, h + 2 * padding, padding, padding);
                let max_x = (w + 2 * padding).saturating_sub(size);
                let max_y = (h + 2 * padding).saturating_sub(size);
                let x0 = rng.gen_range(0..=max_x);
                let y0 = rng.gen_range(0..=max_y);
                padded.crop_imm(x0, y0, size, size)
            }
        }
    }
}

/// Per-channel standardization `(x - mean) / std` of a `[C, H, W]` buffer.
#[derive(Debug, Clone, PartialEq)]
pub struct Normalize {
    mean: Vec<f32>,
    std: Vec<f32>,
}

impl Normalize {
    pub fn new(mean: Vec<f32>, std: Vec<f32>) -> Self {
        Self { mean, std }
    }

    /// Statistics used by the RGB datasets.
    pub fn imagenet() -> Self {
        Self::new(vec![0.485, 0.456, 0.406], vec![0.229, 0.224, 0.225])
    }

    pub fn channels(&self) -> usize {
        self.mean.len()
    }

    pub fn apply(&self, pixels: &mut [f32], shape: [usize; 3]) -> Result<()> {
        let [c, h, w] = shape;
        if c != self.mean.len() || c != self.std.len() || pixels.len() != c * h * w {
            return Err(LotteryError::ShapeMismatch {
                expected: vec![self.mean.len(), h, w],
                actual: vec![c, h, w],
            });
        }
        let plane = h * w;
        for (ch, chunk) in pixels.chunks_mut(plane.max(1)).enumerate().take(c) {
            let (mean, std) = (self.mean[ch], self.std[ch]);
            for v in chunk.iter_mut() {
                *v = (*v - mean) / std;
            }
        }
        Ok(())
    }
}

/// Converts an image to a planar `[C, H, W]` buffer with values in `[0, 1]`.
/// `channels` must be 1 (grayscale) or 3 (RGB).
pub fn to_chw(img: &DynamicImage, channels: usize) -> (Vec<f32>, [usize; 3]) {
    let (w, h) = img.dimensions();
    let npix = (w * h) as usize;
    if channels == 1 {
        let gray = img.to_luma8();
        let data = gray.as_raw().iter().map(|&v| v as f32 / 255.0).collect();
        (data, [1, h as usize, w as usize])
    } else {
        let rgb = img.to_rgb8();
        let raw = rgb.as_raw();
        // [H, W, C] interleaved to [C, H, W] planar
        let mut data = vec![0.0f32; 3 * npix];
        for i in 0..npix {
            data[i] = raw[i * 3] as f32 / 255.0;
            data[npix + i] = raw[i * 3 + 1] as f32 / 255.0;
            data[2 * npix + i] = raw[i * 3 + 2] as f32 / 255.0;
        }
        (data, [3, h as usize, w as usize])
    }
}

/// Blurs by shrinking each side by `factor` and resizing back.
pub fn blur(img: &DynamicImage, factor: f32) -> DynamicImage {
    let (w, h) = img.dimensions();
    let small_w = ((w as f32 / factor) as u32).max(1);
    let small_h = ((h as f32 / factor) as u32).max(1);
    img.resize_exact(small_w, small_h, FilterType::Triangle)
        .resize_exact(w, h, FilterType::Triangle)
}

/// Rotates counter-clockwise by `degrees` around the centre, keeping the
/// canvas size. Uncovered pixels are black.
pub fn rotate(img: &DynamicImage, degrees: f32) -> DynamicImage {
    if degrees.rem_euclid(360.0) == 0.0 {
        return img.clone();
    }
    match img {
        DynamicImage::ImageLuma8(gray) => DynamicImage::ImageLuma8(rotate_buffer(gray, degrees)),
        other => DynamicImage::ImageRgb8(rotate_buffer(&other.to_rgb8(), degrees)),
    }
}

fn rotate_buffer<P>(src: &ImageBuffer<P, Vec<u8>>, degrees: f32) -> ImageBuffer<P, Vec<u8>>
where
    P: Pixel<Subpixel = u8>,
{
    let (w, h) = src.dimensions();
    let mut out = ImageBuffer::new(w, h);
    let (sin, cos) = (degrees as f64).to_radians().sin_cos();
    let (cx, cy) = (w as f64 / 2.0, h as f64 / 2.0);
    for y in 0..h {
        for x in 0..w {
            // Inverse mapping from the output pixel centre into the source.
            let dx = x as f64 + 0.5 - cx;
            let dy = y as f64 + 0.5 - cy;
            let sx = (dx * cos - dy * sin + cx - 0.5).round();
            let sy = (dx * sin + dy * cos + cy - 0.5).round();
            if sx >= 0.0 && sy >= 0.0 && sx < w as f64 && sy < h as f64 {
                out.put_pixel(x, y, *src.get_pixel(sx as u32, sy as u32));
            }
        }
    }
    out
}

fn resize_shorter_side(img: &DynamicImage, size: u32) -> DynamicImage {
    let (w, h) = img.dimensions();
    let (new_w, new_h) = if w <= h {
        (size, ((size as u64 * h as u64) / w.max(1) as u64) as u32)
    } else {
        (((size as u64 * w as u64) / h.max(1) as u64) as u32, size)
    };
    if (new_w, new_h) == (w, h) {
        return img.clone();
    }
    img.resize_exact(new_w.max(1), new_h.max(1), FilterType::Triangle)
}

fn pad(img: &DynamicImage, width: u32, height: u32, x: u32, y: u32) -> DynamicImage {
    let mut canvas = match img {
        DynamicImage::ImageLuma8(_) => DynamicImage::new_luma8(width, height),
        _ => DynamicImage::new_rgb8(width, height),
    };
    imageops::overlay(&mut canvas, img, x as i64, y as i64);
    canvas
}

fn center_crop(img: &DynamicImage, size: u32) -> DynamicImage {
    let (w, h) = img.dimensions();
    let img = if w < size || h < size {
        let (pw, ph) = (w.max(size), h.max(size));
        pad(img, pw, ph, (pw - w) / 2, (ph - h) / 2)
    } else {
        img.clone()
    };
    let (w, h) = img.dimensions();
    let left = ((w - size) as f64 / 2.0).round() as u32;
    let top = ((h - size) as f64 / 2.0).round() as u32;
    img.crop_imm(left, top, size, size)
}

fn random_resized_crop<R: Rng + ?Sized>(
    img: &DynamicImage,
    size: u32,
    scale: (f32, f32),
    ratio: (f32, f32),
    rng: &mut R,
) -> DynamicImage {
    let (w, h) = img.dimensions();
    let area = (w * h) as f64;
    let (log_lo, log_hi) = ((ratio.0 as f64).ln(), (ratio.1 as f64).ln());

    for _ in 0..10 {
        let target_area = area * rng.gen_range(scale.0 as f64..=scale.1 as f64);
        let aspect = rng.gen_range(log_lo..=log_hi).exp();
        let crop_w = (target_area * aspect).sqrt().round() as u32;
        let crop_h = (target_area / aspect).sqrt().round() as u32;
        if crop_w > 0 && crop_h > 0 && crop_w <= w && crop_h <= h {
            let top = rng.gen_range(0..=h - crop_h);
            let left = rng.gen_range(0..=w - crop_w);
            return img
                .crop_imm(left, top, crop_w, crop_h)
                .resize_exact(size, size, FilterType::Triangle);
        }
    }

    // Fallback to a central crop with the aspect ratio clamped to `ratio`.
    let in_ratio = w as f64 / h.max(1) as f64;
    let (crop_w, crop_h) = if in_ratio < ratio.0 as f64 {
        (w, ((w as f64 / ratio.0 as f64).round() as u32).min(h))
    } else if in_ratio > ratio.1 as f64 {
        (((h as f64 * ratio.1 as f64).round() as u32).min(w), h)
    } else {
        (w, h)
    };
    let left = (w - crop_w) / 2;
    let top = (h - crop_h) / 2;
    img.crop_imm(left, top, crop_w.max(1), crop_h.max(1))
        .resize_exact(size, size, FilterType::Triangle)
}

#[cfg(test)]
#[path = "transforms_test.rs"]
mod tests;
