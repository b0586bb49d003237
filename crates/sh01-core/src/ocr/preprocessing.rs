//! Image preprocessing for region OCR.

use image::{DynamicImage, GenericImageView, GrayImage, Rgb};
use tracing::debug;

use crate::error::OcrError;

/// Rectangular region of a page, in whole percentages of its height and width.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CropRegion {
    pub top: u32,
    pub bottom: u32,
    pub left: u32,
    pub right: u32,
}

impl CropRegion {
    /// The whole page.
    pub const FULL: CropRegion = CropRegion::rows(0, 100);

    /// A horizontal band spanning the full page width.
    pub const fn rows(top: u32, bottom: u32) -> Self {
        Self {
            top,
            bottom,
            left: 0,
            right: 100,
        }
    }

    /// Pixel bounds `(x, y, width, height)` for an image of the given size.
    pub fn bounds(&self, width: u32, height: u32) -> (u32, u32, u32, u32) {
        let y0 = scale(self.top, height);
        let y1 = scale(self.bottom, height);
        let x0 = scale(self.left, width);
        let x1 = scale(self.right, width);
        (x0, y0, x1.saturating_sub(x0), y1.saturating_sub(y0))
    }
}

fn scale(percent: u32, extent: u32) -> u32 {
    (u64::from(percent.min(100)) * u64::from(extent) / 100) as u32
}

/// Image preprocessor for the region OCR pipeline.
pub struct ImagePreprocessor {
    /// Length of the structuring element used to find table rules.
    line_kernel: usize,
    /// Erosion/dilation passes when opening the line masks.
    iterations: usize,
    /// Half-width of the white band painted over detected rules.
    line_margin: usize,
}

impl ImagePreprocessor {
    /// Create a new preprocessor with default settings.
    pub fn new() -> Self {
        Self {
            line_kernel: 40,
            iterations: 2,
            line_margin: 2,
        }
    }

    /// Crop a percentage region out of a page image.
    pub fn crop(&self, image: &DynamicImage, region: CropRegion) -> Result<DynamicImage, OcrError> {
        let (width, height) = image.dimensions();
        let (x, y, w, h) = region.bounds(width, height);
        if w == 0 || h == 0 {
            return Err(OcrError::InvalidImage(format!(
                "region {:?} is empty on a {}x{} page",
                region, width, height
            )));
        }
        Ok(image.crop_imm(x, y, w, h))
    }

    /// Crop a region and optionally erase table gridlines from it.
    pub fn crop_region(
        &self,
        image: &DynamicImage,
        region: CropRegion,
        remove_borders: bool,
    ) -> Result<DynamicImage, OcrError> {
        let cropped = self.crop(image, region)?;
        if remove_borders {
            Ok(self.remove_table_borders(&cropped))
        } else {
            Ok(cropped)
        }
    }

    /// Paint long horizontal and vertical rules white, leaving text strokes intact.
    pub fn remove_table_borders(&self, image: &DynamicImage) -> DynamicImage {
        let gray = image.to_luma8();
        let (width, height) = gray.dimensions();
        let (w, h) = (width as usize, height as usize);

        let threshold = otsu_threshold(&gray);
        let ink: Vec<bool> = gray.pixels().map(|p| p[0] <= threshold).collect();

        let horizontal = self.open(&ink, w, h, Axis::Horizontal);
        let vertical = self.open(&ink, w, h, Axis::Vertical);
        let rules: Vec<bool> = horizontal
            .iter()
            .zip(&vertical)
            .map(|(a, b)| *a || *b)
            .collect();

        // Widen the mask so anti-aliased rule edges go too.
        let margin = 2 * self.line_margin + 1;
        let rules = dilate(&rules, w, h, Axis::Horizontal, margin);
        let rules = dilate(&rules, w, h, Axis::Vertical, margin);

        let mut result = image.to_rgb8();
        let mut erased = 0usize;
        for (idx, is_rule) in rules.iter().enumerate() {
            if *is_rule {
                result.put_pixel((idx % w) as u32, (idx / w) as u32, Rgb([255, 255, 255]));
                erased += 1;
            }
        }
        debug!(
            "Removed table borders: threshold {}, {} of {} pixels erased",
            threshold,
            erased,
            w * h
        );

        DynamicImage::ImageRgb8(result)
    }

    fn open(&self, mask: &[bool], w: usize, h: usize, axis: Axis) -> Vec<bool> {
        let mut current = mask.to_vec();
        for _ in 0..self.iterations {
            current = erode(&current, w, h, axis, self.line_kernel);
        }
        for _ in 0..self.iterations {
            current = dilate(&current, w, h, axis, self.line_kernel);
        }
        current
    }
}

impl Default for ImagePreprocessor {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug, Clone, Copy)]
enum Axis {
    Horizontal,
    Vertical,
}

fn erode(mask: &[bool], w: usize, h: usize, axis: Axis, kernel: usize) -> Vec<bool> {
    // Out-of-image pixels count as set, so borders do not erode.
    morph(mask, w, h, axis, kernel, |on, len, k| on + (k - len) == k)
}

fn dilate(mask: &[bool], w: usize, h: usize, axis: Axis, kernel: usize) -> Vec<bool> {
    morph(mask, w, h, axis, kernel, |on, _, _| on > 0)
}

/// Sliding-window morphology along one axis with a flat line kernel.
///
/// `keep(on, len, kernel)` receives the number of set pixels among the
/// `len` in-bounds pixels of the window.
fn morph(
    mask: &[bool],
    w: usize,
    h: usize,
    axis: Axis,
    kernel: usize,
    keep: impl Fn(usize, usize, usize) -> bool,
) -> Vec<bool> {
    let (lines, length) = match axis {
        Axis::Horizontal => (h, w),
        Axis::Vertical => (w, h),
    };
    let index = |line: usize, pos: usize| match axis {
        Axis::Horizontal => line * w + pos,
        Axis::Vertical => pos * w + line,
    };

    let anchor = kernel / 2;
    let mut out = vec![false; mask.len()];
    let mut prefix = vec![0usize; length + 1];

    for line in 0..lines {
        for pos in 0..length {
            prefix[pos + 1] = prefix[pos] + usize::from(mask[index(line, pos)]);
        }
        for pos in 0..length {
            let start = pos.saturating_sub(anchor);
            let end = (pos + kernel - anchor).min(length);
            let on = prefix[end] - prefix[start];
            out[index(line, pos)] = keep(on, end - start, kernel);
        }
    }

    out
}

/// Global threshold maximizing between-class variance.
fn otsu_threshold(image: &GrayImage) -> u8 {
    let mut histogram = [0u64; 256];
    for pixel in image.pixels() {
        histogram[pixel[0] as usize] += 1;
    }

    let total: u64 = histogram.iter().sum();
    if total == 0 {
        return 127;
    }
    let weighted_total: f64 = histogram
        .iter()
        .enumerate()
        .map(|(value, count)| value as f64 * *count as f64)
        .sum();

    let mut background_weight = 0u64;
    let mut background_sum = 0f64;
    let mut best_threshold = 0u8;
    let mut best_variance = -1f64;

    for (value, count) in histogram.iter().enumerate() {
        background_weight += count;
        if background_weight == 0 {
            continue;
        }
        let foreground_weight = total - background_weight;
        if foreground_weight == 0 {
            break;
        }

        background_sum += value as f64 * *count as f64;
        let background_mean = background_sum / background_weight as f64;
        let foreground_mean = (weighted_total - background_sum) / foreground_weight as f64;
        let variance = background_weight as f64
            * foreground_weight as f64
            * (background_mean - foreground_mean).powi(2);

        if variance > best_variance {
            best_variance = variance;
            best_threshold = value as u8;
        }
    }

    best_threshold
}
