use image::{imageops, DynamicImage, GenericImageView, Rgba, RgbaImage};
use stowage_core::{FitType, Position, ResizeOptions};

/// Image resize operations
pub struct ImageResize;

impl ImageResize {
    /// Scale `(orig_width, orig_height)` proportionally so the result is bounded by the box.
    ///
    /// `cover_box` selects "at least the box" (`outside`, `cover`) instead of "at most the
    /// box" (`inside`, `contain`).
    fn scaled_to_box(
        orig_width: u32,
        orig_height: u32,
        width: u32,
        height: u32,
        cover_box: bool,
    ) -> (u32, u32) {
        let scale_width = width as f64 / orig_width as f64;
        let scale_height = height as f64 / orig_height as f64;
        let scale = if cover_box {
            scale_width.max(scale_height)
        } else {
            scale_width.min(scale_height)
        };

        let w = (orig_width as f64 * scale).round() as u32;
        let h = (orig_height as f64 * scale).round() as u32;
        (w.max(1), h.max(1))
    }

    /// Calculate the dimensions the image is resampled to, before any crop or pad.
    pub fn calculate_dimensions(
        orig_width: u32,
        orig_height: u32,
        width: Option<u32>,
        height: Option<u32>,
        fit: FitType,
    ) -> (u32, u32) {
        match (width, height) {
            (Some(w), Some(h)) => match fit {
                FitType::Fill => (w, h),
                FitType::Inside | FitType::Contain => {
                    Self::scaled_to_box(orig_width, orig_height, w, h, false)
                }
                FitType::Outside | FitType::Cover => {
                    Self::scaled_to_box(orig_width, orig_height, w, h, true)
                }
            },
            (Some(w), None) => {
                let aspect_ratio = orig_height as f64 / orig_width as f64;
                let h = (w as f64 * aspect_ratio).round() as u32;
                (w, h.max(1))
            }
            (None, Some(h)) => {
                let aspect_ratio = orig_width as f64 / orig_height as f64;
                let w = (h as f64 * aspect_ratio).round() as u32;
                (w.max(1), h)
            }
            (None, None) => (orig_width, orig_height),
        }
    }

    /// Select appropriate filter type based on resize ratio
    pub fn select_filter(
        orig_width: u32,
        orig_height: u32,
        new_width: u32,
        new_height: u32,
    ) -> imageops::FilterType {
        let width_ratio = orig_width as f32 / new_width as f32;
        let height_ratio = orig_height as f32 / new_height as f32;
        let max_ratio = width_ratio.max(height_ratio);

        if max_ratio > 2.0 {
            imageops::FilterType::Triangle
        } else if max_ratio > 1.5 {
            imageops::FilterType::CatmullRom
        } else {
            imageops::FilterType::Lanczos3
        }
    }

    /// Resize image to exact dimensions
    pub fn resize_image(img: &DynamicImage, width: u32, height: u32) -> DynamicImage {
        let (orig_width, orig_height) = img.dimensions();
        if (orig_width, orig_height) == (width, height) {
            return img.clone();
        }
        let filter = Self::select_filter(orig_width, orig_height, width, height);
        img.resize_exact(width, height, filter)
    }

    /// Offset of a `inner` span inside an `outer` span for the given anchor weight.
    fn anchor_offset(outer: u32, inner: u32, weight: f32) -> u32 {
        let slack = outer.saturating_sub(inner) as f32;
        (slack * weight).round() as u32
    }

    /// Crop the box out of an image that already covers it.
    fn crop_to_box(img: DynamicImage, width: u32, height: u32, position: Position) -> DynamicImage {
        let (img_width, img_height) = img.dimensions();
        let (wx, wy) = position.weights();
        let x = Self::anchor_offset(img_width, width, wx);
        let y = Self::anchor_offset(img_height, height, wy);
        img.crop_imm(x, y, width.min(img_width), height.min(img_height))
    }

    /// Place an image that fits in the box onto a transparent canvas of the box size.
    fn pad_to_box(img: &DynamicImage, width: u32, height: u32, position: Position) -> DynamicImage {
        let (img_width, img_height) = img.dimensions();
        let (wx, wy) = position.weights();
        let x = Self::anchor_offset(width, img_width, wx);
        let y = Self::anchor_offset(height, img_height, wy);

        let mut canvas =
            DynamicImage::ImageRgba8(RgbaImage::from_pixel(width, height, Rgba([0, 0, 0, 0])));
        imageops::overlay(&mut canvas, img, x as i64, y as i64);
        canvas
    }

    /// Apply a variant's resize: resample, then crop (`cover`) or pad (`contain`).
    pub fn apply_resize(
        img: &DynamicImage,
        width: Option<u32>,
        height: Option<u32>,
        options: ResizeOptions,
    ) -> DynamicImage {
        let (orig_width, orig_height) = img.dimensions();
        let (target_width, target_height) =
            Self::calculate_dimensions(orig_width, orig_height, width, height, options.fit);

        tracing::debug!(
            orig_width = orig_width,
            orig_height = orig_height,
            target_width = target_width,
            target_height = target_height,
            fit = %options.fit,
            "Resizing image"
        );

        let resized = Self::resize_image(img, target_width, target_height);

        match (width, height, options.fit) {
            (Some(w), Some(h), FitType::Cover) => Self::crop_to_box(resized, w, h, options.position),
            (Some(w), Some(h), FitType::Contain) => {
                Self::pad_to_box(&resized, w, h, options.position)
            }
            _ => resized,
        }
    }
}
