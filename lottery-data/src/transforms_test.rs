// lottery-data/src/transforms_test.rs

use super::*;
use approx::assert_relative_eq;
use image::{GrayImage, Luma, Rgb, RgbImage};
use rand::rngs::StdRng;
use rand::SeedableRng;

fn gray(width: u32, height: u32, values: &[u8]) -> DynamicImage {
    DynamicImage::ImageLuma8(GrayImage::from_raw(width, height, values.to_vec()).unwrap())
}

fn gray_values(img: &DynamicImage) -> Vec<u8> {
    img.to_luma8().into_raw()
}

#[test]
fn test_rotate_90_is_counter_clockwise() {
    // a b      b d
    // c d  ->  a c
    let img = gray(2, 2, &[1, 2, 3, 4]);
    let rotated = rotate(&img, 90.0);
    assert_eq!(gray_values(&rotated), vec![2, 4, 1, 3]);
}

#[test]
fn test_rotate_180_and_270() {
    let img = gray(3, 3, &[1, 2, 3, 4, 5, 6, 7, 8, 9]);
    assert_eq!(gray_values(&rotate(&img, 180.0)), vec![9, 8, 7, 6, 5, 4, 3, 2, 1]);
    assert_eq!(gray_values(&rotate(&img, 270.0)), vec![7, 4, 1, 8, 5, 2, 9, 6, 3]);
    assert_eq!(gray_values(&rotate(&img, -90.0)), vec![7, 4, 1, 8, 5, 2, 9, 6, 3]);
}

#[test]
fn test_rotate_full_turn_is_identity() {
    let img = gray(3, 2, &[1, 2, 3, 4, 5, 6]);
    assert_eq!(gray_values(&rotate(&img, 0.0)), vec![1, 2, 3, 4, 5, 6]);
    assert_eq!(gray_values(&rotate(&img, 360.0)), vec![1, 2, 3, 4, 5, 6]);
}

#[test]
fn test_rotate_keeps_canvas_and_fills_black() {
    let img = DynamicImage::ImageRgb8(RgbImage::from_pixel(8, 4, Rgb([200, 200, 200])));
    let rotated = rotate(&img, 45.0);
    assert_eq!(rotated.dimensions(), (8, 4));
    let rgb = rotated.to_rgb8();
    assert_eq!(*rgb.get_pixel(0, 0), Rgb([0, 0, 0]));
    assert_eq!(*rgb.get_pixel(4, 2), Rgb([200, 200, 200]));
}

#[test]
fn test_blur_keeps_size_and_smooths() {
    let mut checker = GrayImage::new(8, 8);
    for (x, y, p) in checker.enumerate_pixels_mut() {
        *p = Luma([if (x + y) % 2 == 0 { 255 } else { 0 }]);
    }
    let img = DynamicImage::ImageLuma8(checker);
    let blurred = blur(&img, 4.0);
    assert_eq!(blurred.dimensions(), (8, 8));
    let values = gray_values(&blurred);
    assert!(values.iter().all(|&v| v > 0 && v < 255));
}

#[test]
fn test_blur_factor_larger_than_image() {
    let img = gray(2, 2, &[0, 255, 255, 0]);
    let blurred = blur(&img, 16.0);
    assert_eq!(blurred.dimensions(), (2, 2));
}

#[test]
fn test_resize_shorter_side() {
    let mut rng = StdRng::seed_from_u64(0);
    let img = DynamicImage::new_rgb8(40, 20);
    let resized = ImageTransform::Resize(10).apply(img, &mut rng);
    assert_eq!(resized.dimensions(), (20, 10));
}

#[test]
fn test_center_crop_and_padding() {
    let mut rng = StdRng::seed_from_u64(0);
    let img = gray(4, 4, &[0, 0, 0, 0, 0, 9, 8, 0, 0, 7, 6, 0, 0, 0, 0, 0]);
    let cropped = ImageTransform::CenterCrop(2).apply(img, &mut rng);
    assert_eq!(gray_values(&cropped), vec![9, 8, 7, 6]);

    let small = DynamicImage::new_rgb8(2, 2);
    let padded = ImageTransform::CenterCrop(6).apply(small, &mut rng);
    assert_eq!(padded.dimensions(), (6, 6));
}

#[test]
fn test_random_resized_crop_output_size() {
    let mut rng = StdRng::seed_from_u64(42);
    let transform = ImageTransform::imagenet_crop(16);
    for _ in 0..5 {
        let out = transform.apply(DynamicImage::new_rgb8(50, 30), &mut rng);
        assert_eq!(out.dimensions(), (16, 16));
    }
}

#[test]
fn test_random_crop_with_padding() {
    let mut rng = StdRng::seed_from_u64(1);
    let transform = ImageTransform::RandomCrop { size: 32, padding: 4 };
    let out = transform.apply(DynamicImage::new_rgb8(32, 32), &mut rng);
    assert_eq!(out.dimensions(), (32, 32));
}

#[test]
fn test_horizontal_flip_probabilities() {
    let mut rng = StdRng::seed_from_u64(0);
    let img = gray(2, 1, &[1, 2]);
    let always = ImageTransform::RandomHorizontalFlip(1.0).apply(img.clone(), &mut rng);
    assert_eq!(gray_values(&always), vec![2, 1]);
    let never = ImageTransform::RandomHorizontalFlip(0.0).apply(img, &mut rng);
    assert_eq!(gray_values(&never), vec![1, 2]);
}

#[test]
fn test_to_chw_layout() {
    let mut rgb = RgbImage::new(2, 1);
    rgb.put_pixel(0, 0, Rgb([255, 0, 51]));
    rgb.put_pixel(1, 0, Rgb([0, 255, 102]));
    let (data, shape) = to_chw(&DynamicImage::ImageRgb8(rgb), 3);
    assert_eq!(shape, [3, 1, 2]);
    assert_relative_eq!(data[0], 1.0);
    assert_relative_eq!(data[1], 0.0);
    assert_relative_eq!(data[2], 0.0);
    assert_relative_eq!(data[3], 1.0);
    assert_relative_eq!(data[4], 0.2);
    assert_relative_eq!(data[5], 0.4);

    let (data, shape) = to_chw(&gray(2, 2, &[0, 255, 255, 0]), 1);
    assert_eq!(shape, [1, 2, 2]);
    assert_eq!(data, vec![0.0, 1.0, 1.0, 0.0]);
}

#[test]
fn test_normalize() {
    let norm = Normalize::new(vec![0.5, 0.0], vec![0.5, 2.0]);
    assert_eq!(norm.channels(), 2);
    let mut pixels = vec![1.0, 0.5, 2.0, 4.0];
    norm.apply(&mut pixels, [2, 1, 2]).unwrap();
    assert_eq!(pixels, vec![1.0, 0.0, 1.0, 2.0]);

    let mut wrong = vec![0.0; 3];
    assert!(norm.apply(&mut wrong, [3, 1, 1]).is_err());
    assert_eq!(Normalize::imagenet().channels(), 3);
}
