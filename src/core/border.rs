//! Poster border transforms.
//!
//! Both transforms normalize the output to a fixed 1000x1500 canvas.

use crate::Result;
use image::{imageops::FilterType, DynamicImage, GenericImageView, Rgb, RgbImage};
use std::path::Path;

/// Border width in pixels.
pub const BORDER_WIDTH: u32 = 25;
/// Output canvas width.
pub const CANVAS_WIDTH: u32 = 1000;
/// Output canvas height.
pub const CANVAS_HEIGHT: u32 = 1500;

/// An RGB border color.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BorderColor(pub [u8; 3]);

impl BorderColor {
    pub const BLACK: BorderColor = BorderColor([0, 0, 0]);

    /// Parse `#rrggbb` (the `#` is optional).
    pub fn parse(value: &str) -> Result<Self> {
        let hex = value.trim().trim_start_matches('#');
        if hex.len() != 6 || !hex.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(crate::Error::InvalidBorderColor(value.to_string()));
        }

        let channel = |i: usize| {
            u8::from_str_radix(&hex[i..i + 2], 16)
                .map_err(|_| crate::Error::InvalidBorderColor(value.to_string()))
        };
        Ok(BorderColor([channel(0)?, channel(2)?, channel(4)?]))
    }

    /// Format as `#rrggbb`.
    pub fn to_hex(&self) -> String {
        format!("#{:02x}{:02x}{:02x}", self.0[0], self.0[1], self.0[2])
    }
}

/// Border transform chosen for a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BorderMode {
    /// Strip the border and letterbox the bottom edge.
    Remove,
    /// Repaint the border in a color.
    Paint(BorderColor),
}

impl BorderMode {
    /// Setting name stored in the cache.
    pub fn setting(&self) -> &'static str {
        match self {
            BorderMode::Remove => "remove",
            BorderMode::Paint(_) => "paint",
        }
    }

    /// Color stored in the cache.
    pub fn color_hex(&self) -> Option<String> {
        match self {
            BorderMode::Remove => None,
            BorderMode::Paint(color) => Some(color.to_hex()),
        }
    }
}

/// Remove the border: crop the left, top and right edges, paint the bottom
/// strip black and resize to the canvas.
pub fn crop_and_letterbox(image: &DynamicImage) -> DynamicImage {
    let rgb = DynamicImage::ImageRgb8(image.to_rgb8());
    let (width, height) = rgb.dimensions();

    if width <= 2 * BORDER_WIDTH || height <= 2 * BORDER_WIDTH {
        return rgb.resize_exact(CANVAS_WIDTH, CANVAS_HEIGHT, FilterType::Lanczos3);
    }

    let mut cropped = rgb
        .crop_imm(BORDER_WIDTH, BORDER_WIDTH, width - 2 * BORDER_WIDTH, height - BORDER_WIDTH)
        .to_rgb8();
    let cropped_height = cropped.height();
    for y in cropped_height - BORDER_WIDTH..cropped_height {
        for x in 0..cropped.width() {
            cropped.put_pixel(x, y, Rgb(BorderColor::BLACK.0));
        }
    }

    DynamicImage::ImageRgb8(cropped).resize_exact(CANVAS_WIDTH, CANVAS_HEIGHT, FilterType::Lanczos3)
}

/// Repaint the outer border in `color` after resizing to the canvas.
pub fn recolor_border(image: &DynamicImage, color: BorderColor) -> DynamicImage {
    let mut canvas: RgbImage = image
        .resize_exact(CANVAS_WIDTH, CANVAS_HEIGHT, FilterType::Lanczos3)
        .to_rgb8();

    for (x, y, pixel) in canvas.enumerate_pixels_mut() {
        let on_border = x < BORDER_WIDTH
            || y < BORDER_WIDTH
            || x >= CANVAS_WIDTH - BORDER_WIDTH
            || y >= CANVAS_HEIGHT - BORDER_WIDTH;
        if on_border {
            *pixel = Rgb(color.0);
        }
    }

    DynamicImage::ImageRgb8(canvas)
}

/// Apply `mode` to the image at `source` and save the result to `dest`.
pub fn apply_border(mode: BorderMode, source: &Path, dest: &Path) -> Result<()> {
    let image = image::open(source)?;
    let output = match mode {
        BorderMode::Remove => crop_and_letterbox(&image),
        BorderMode::Paint(color) => recolor_border(&image, color),
    };
    output.save(dest)?;
    tracing::debug!("Applied {} border: {:?} -> {:?}", mode.setting(), source, dest);
    Ok(())
}
