// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Image preprocessing for the YOLO detection model

use image::{imageops::FilterType, DynamicImage, GenericImageView, Rgb, RgbImage};
use ndarray::Array4;

/// Gray used by YOLO letterboxing for the padded border
pub const PAD_VALUE: u8 = 114;

/// Geometry of a letterbox resize, used to map detections back
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Letterbox {
    /// Scale factor applied to the original image
    pub scale: f32,
    /// Horizontal padding on the left side
    pub pad_x: f32,
    /// Vertical padding on the top side
    pub pad_y: f32,
    pub original_width: u32,
    pub original_height: u32,
}

impl Letterbox {
    /// Compute the letterbox for an image of `width`x`height` into the target size
    pub fn new(width: u32, height: u32, target_width: u32, target_height: u32) -> Self {
        if width == 0 || height == 0 {
            return Self {
                scale: 1.0,
                pad_x: 0.0,
                pad_y: 0.0,
                original_width: width,
                original_height: height,
            };
        }

        let scale = (target_width as f32 / width as f32).min(target_height as f32 / height as f32);
        let (new_w, new_h) = scaled_size(width, height, scale);

        Self {
            scale,
            pad_x: ((target_width - new_w) / 2) as f32,
            pad_y: ((target_height - new_h) / 2) as f32,
            original_width: width,
            original_height: height,
        }
    }

    /// Map a center-based box from model input space to original pixels,
    /// clipping it to the image.
    pub fn map_to_original(&self, x: f32, y: f32, w: f32, h: f32) -> (f32, f32, f32, f32) {
        let max_x = self.original_width as f32;
        let max_y = self.original_height as f32;

        let x1 = ((x - w / 2.0 - self.pad_x) / self.scale).clamp(0.0, max_x);
        let y1 = ((y - h / 2.0 - self.pad_y) / self.scale).clamp(0.0, max_y);
        let x2 = ((x + w / 2.0 - self.pad_x) / self.scale).clamp(0.0, max_x);
        let y2 = ((y + h / 2.0 - self.pad_y) / self.scale).clamp(0.0, max_y);

        ((x1 + x2) / 2.0, (y1 + y2) / 2.0, x2 - x1, y2 - y1)
    }
}

fn scaled_size(width: u32, height: u32, scale: f32) -> (u32, u32) {
    let new_w = ((width as f32 * scale).round() as u32).max(1);
    let new_h = ((height as f32 * scale).round() as u32).max(1);
    (new_w, new_h)
}

/// Letterbox an image into a `[1, 3, H, W]` tensor with values in [0, 1]
///
/// Steps:
/// 1. Resize preserving aspect ratio to fit target_width x target_height
/// 2. Pad the remainder with gray (114), image centered
/// 3. Scale RGB to [0, 1] in NCHW layout
pub fn preprocess_for_detection(
    image: &DynamicImage,
    target_width: u32,
    target_height: u32,
) -> (Array4<f32>, Letterbox) {
    let (orig_w, orig_h) = image.dimensions();
    let letterbox = Letterbox::new(orig_w, orig_h, target_width, target_height);

    let mut canvas = RgbImage::from_pixel(
        target_width,
        target_height,
        Rgb([PAD_VALUE, PAD_VALUE, PAD_VALUE]),
    );

    if orig_w > 0 && orig_h > 0 {
        let (new_w, new_h) = scaled_size(orig_w, orig_h, letterbox.scale);
        let resized = image
            .resize_exact(new_w, new_h, FilterType::Triangle)
            .to_rgb8();
        image::imageops::replace(
            &mut canvas,
            &resized,
            letterbox.pad_x as i64,
            letterbox.pad_y as i64,
        );
    }

    let mut tensor = Array4::zeros((1, 3, target_height as usize, target_width as usize));
    for (x, y, pixel) in canvas.enumerate_pixels() {
        for c in 0..3 {
            tensor[[0, c, y as usize, x as usize]] = pixel[c] as f32 / 255.0;
        }
    }

    (tensor, letterbox)
}
