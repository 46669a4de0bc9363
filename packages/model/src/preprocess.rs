//! Image → feature vector
//!
//! Decoding happens once at the boundary ([`decode`]); everything after that works
//! on a [`DynamicImage`]. The pipeline is grayscale → 32×32 → flatten → scale and
//! is fully deterministic.

use crate::error::PreprocessError;
use crate::store::Scaler;
use image::{DynamicImage, GrayImage, Luma, imageops, imageops::FilterType};
use ndarray::{Array2, ArrayView2};

/// Width and height the model was trained on.
pub const INPUT_SIDE: u32 = 32;

/// Length of the flattened feature vector.
pub const INPUT_LEN: usize = (INPUT_SIDE * INPUT_SIDE) as usize;

/// Bicubic (Catmull-Rom, a = -0.5) resampling. Changing this changes every prediction.
pub const RESIZE_FILTER: FilterType = FilterType::CatmullRom;

/// A single scaled sample, shaped `1 × INPUT_LEN`.
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureVector(Array2<f64>);

impl FeatureVector {
    pub(crate) fn new(row: Array2<f64>) -> Self {
        Self(row)
    }

    pub fn view(&self) -> ArrayView2<'_, f64> {
        self.0.view()
    }

    pub fn len(&self) -> usize {
        self.0.ncols()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

pub fn decode(bytes: &[u8]) -> Result<DynamicImage, PreprocessError> {
    if bytes.is_empty() {
        return Err(PreprocessError::Empty);
    }
    Ok(image::load_from_memory(bytes)?)
}

/// ITU-R 601-2 luma in 16.16 fixed point, the transform PIL's `convert("L")` uses.
#[inline]
fn luma_601(r: u8, g: u8, b: u8) -> u8 {
    let l = (u32::from(r) * 19595 + u32::from(g) * 38470 + u32::from(b) * 7471 + 0x8000) >> 16;
    l as u8
}

/// Single-channel 8-bit version of `img`. Alpha is dropped, not composited.
pub fn to_grayscale(img: &DynamicImage) -> GrayImage {
    match img {
        DynamicImage::ImageLuma8(gray) => gray.clone(),
        DynamicImage::ImageLumaA8(gray_alpha) => {
            GrayImage::from_fn(gray_alpha.width(), gray_alpha.height(), |x, y| {
                Luma([gray_alpha.get_pixel(x, y)[0]])
            })
        }
        other => {
            let rgb = other.to_rgb8();
            GrayImage::from_fn(rgb.width(), rgb.height(), |x, y| {
                let p = rgb.get_pixel(x, y);
                Luma([luma_601(p[0], p[1], p[2])])
            })
        }
    }
}

pub fn resize(gray: &GrayImage) -> GrayImage {
    if gray.dimensions() == (INPUT_SIDE, INPUT_SIDE) {
        return gray.clone();
    }
    imageops::resize(gray, INPUT_SIDE, INPUT_SIDE, RESIZE_FILTER)
}

/// Grayscale, resized and flattened row-major; values are raw 0–255 intensities.
pub fn raw_pixels(img: &DynamicImage) -> Vec<f32> {
    let gray = resize(&to_grayscale(img));
    gray.into_raw().into_iter().map(f32::from).collect()
}

pub fn preprocess(img: &DynamicImage, scaler: &Scaler) -> Result<FeatureVector, PreprocessError> {
    let raw = raw_pixels(img);
    let row = scaler.transform(&raw)?;
    Ok(FeatureVector::new(row))
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgb, RgbImage, Rgba, RgbaImage};
    use std::io::Cursor;

    fn png_bytes(img: &DynamicImage) -> Vec<u8> {
        let mut buf = Cursor::new(Vec::new());
        img.write_to(&mut buf, image::ImageFormat::Png).unwrap();
        buf.into_inner()
    }

    #[test]
    fn luma_matches_601_weights() {
        assert_eq!(luma_601(255, 0, 0), 76);
        assert_eq!(luma_601(0, 255, 0), 150);
        assert_eq!(luma_601(0, 0, 255), 29);
        assert_eq!(luma_601(255, 255, 255), 255);
        assert_eq!(luma_601(0, 0, 0), 0);
        assert_eq!(luma_601(128, 128, 128), 128);
    }

    #[test]
    fn rgba_alpha_is_ignored() {
        let img = DynamicImage::ImageRgba8(RgbaImage::from_pixel(4, 4, Rgba([255, 0, 0, 0])));
        let gray = to_grayscale(&img);
        assert!(gray.pixels().all(|p| p[0] == 76));
    }

    #[test]
    fn output_is_always_input_len() {
        for (w, h) in [(1, 1), (17, 40), (32, 32), (300, 200)] {
            let img = DynamicImage::ImageRgb8(RgbImage::from_pixel(w, h, Rgb([10, 20, 30])));
            assert_eq!(raw_pixels(&img).len(), INPUT_LEN);
        }
    }

    #[test]
    fn constant_image_stays_constant_after_resize() {
        let img = DynamicImage::ImageLuma8(GrayImage::from_pixel(64, 48, Luma([100])));
        assert!(raw_pixels(&img).iter().all(|&v| v == 100.0));
    }

    #[test]
    fn flattening_is_row_major() {
        let gray = GrayImage::from_fn(INPUT_SIDE, INPUT_SIDE, |x, y| Luma([(y * 2 + x % 2) as u8]));
        let raw = raw_pixels(&DynamicImage::ImageLuma8(gray));
        assert_eq!(raw[0], 0.0);
        assert_eq!(raw[1], 1.0);
        assert_eq!(raw[INPUT_SIDE as usize], 2.0);
        assert_eq!(raw[INPUT_SIDE as usize + 1], 3.0);
    }

    #[test]
    fn decode_roundtrips_png_and_rejects_garbage() {
        let img = DynamicImage::ImageLuma8(GrayImage::from_pixel(8, 8, Luma([42])));
        let decoded = decode(&png_bytes(&img)).unwrap();
        assert_eq!(decoded.to_luma8().get_pixel(3, 3)[0], 42);

        assert!(matches!(decode(b"not an image"), Err(PreprocessError::Decode(_))));
        assert!(matches!(decode(&[]), Err(PreprocessError::Empty)));
    }

    #[test]
    fn preprocess_applies_scaler() {
        let img = DynamicImage::ImageLuma8(GrayImage::from_pixel(32, 32, Luma([51])));
        let scaler = Scaler::new(
            ndarray::Array1::from_elem(INPUT_LEN, 1.0),
            ndarray::Array1::from_elem(INPUT_LEN, 10.0),
        )
        .unwrap();
        let features = preprocess(&img, &scaler).unwrap();
        assert_eq!(features.len(), INPUT_LEN);
        assert!(features.view().iter().all(|&v| (v - 5.0).abs() < 1e-12));
    }

    #[test]
    fn preprocess_reports_scaler_mismatch() {
        let img = DynamicImage::ImageLuma8(GrayImage::from_pixel(32, 32, Luma([0])));
        let err = preprocess(&img, &Scaler::identity(10)).unwrap_err();
        assert!(matches!(err, PreprocessError::ScalerMismatch { expected: 10, .. }));
    }

    #[test]
    fn same_image_gives_identical_features() {
        let img = DynamicImage::ImageRgb8(RgbImage::from_fn(50, 70, |x, y| {
            Rgb([(x * 5) as u8, (y * 3) as u8, ((x + y) % 256) as u8])
        }));
        let scaler = Scaler::identity(INPUT_LEN);
        assert_eq!(
            preprocess(&img, &scaler).unwrap(),
            preprocess(&img, &scaler).unwrap()
        );
    }
}
