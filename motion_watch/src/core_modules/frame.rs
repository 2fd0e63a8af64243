// THEORY:
// The `frame` module is the boundary between the engine and whatever produces
// pixels. The engine only ever asks one question of a frame: "what is the red
// channel at this point?" Red stands in for luminance; a single channel read per
// cell keeps sampling cheap, and the detection threshold is calibrated against it.
//
// A frame answers `None` for points outside its bounds. The engine turns that into
// an error instead of clamping, so a grid configured for a larger window than the
// camera delivers fails loudly.

use crate::error::{Result, WatchError};
use image::{DynamicImage, GenericImageView, RgbImage, RgbaImage};
use std::path::Path;
use std::sync::Arc;

const RGBA_CHANNELS: usize = 4;

/// Read-only access to a sampled image.
pub trait Frame {
    /// Width and height in pixels.
    fn dimensions(&self) -> (u32, u32);

    /// Red channel intensity at `(x, y)`, or `None` when the point is out of range.
    fn intensity_at(&self, x: u32, y: u32) -> Option<u8>;

    /// Like `intensity_at`, but reports an out-of-range point as an error.
    fn sample(&self, x: u32, y: u32) -> Result<u8> {
        self.intensity_at(x, y).ok_or_else(|| {
            let (width, height) = self.dimensions();
            WatchError::SampleOutOfBounds {
                x,
                y,
                width,
                height,
            }
        })
    }
}

impl Frame for RgbaImage {
    fn dimensions(&self) -> (u32, u32) {
        RgbaImage::dimensions(self)
    }

    fn intensity_at(&self, x: u32, y: u32) -> Option<u8> {
        self.get_pixel_checked(x, y).map(|p| p[0])
    }
}

impl Frame for RgbImage {
    fn dimensions(&self) -> (u32, u32) {
        RgbImage::dimensions(self)
    }

    fn intensity_at(&self, x: u32, y: u32) -> Option<u8> {
        self.get_pixel_checked(x, y).map(|p| p[0])
    }
}

impl Frame for DynamicImage {
    fn dimensions(&self) -> (u32, u32) {
        GenericImageView::dimensions(self)
    }

    fn intensity_at(&self, x: u32, y: u32) -> Option<u8> {
        if self.in_bounds(x, y) {
            Some(self.get_pixel(x, y)[0])
        } else {
            None
        }
    }
}

impl<F: Frame + ?Sized> Frame for Arc<F> {
    fn dimensions(&self) -> (u32, u32) {
        (**self).dimensions()
    }

    fn intensity_at(&self, x: u32, y: u32) -> Option<u8> {
        (**self).intensity_at(x, y)
    }
}

impl<F: Frame + ?Sized> Frame for &F {
    fn dimensions(&self) -> (u32, u32) {
        (**self).dimensions()
    }

    fn intensity_at(&self, x: u32, y: u32) -> Option<u8> {
        (**self).intensity_at(x, y)
    }
}

/// A tightly packed RGBA buffer, row-major, as delivered by most capture backends.
#[derive(Debug, Clone)]
pub struct RawFrame {
    width: u32,
    height: u32,
    data: Vec<u8>,
}

impl RawFrame {
    pub fn new(width: u32, height: u32, data: Vec<u8>) -> Result<Self> {
        let expected = width as usize * height as usize * RGBA_CHANNELS;
        if data.len() != expected {
            return Err(WatchError::InvalidFrameBuffer {
                width,
                height,
                expected,
                actual: data.len(),
            });
        }
        Ok(Self {
            width,
            height,
            data,
        })
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    pub fn into_data(self) -> Vec<u8> {
        self.data
    }
}

impl Frame for RawFrame {
    fn dimensions(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    fn intensity_at(&self, x: u32, y: u32) -> Option<u8> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let byte_index = (y as usize * self.width as usize + x as usize) * RGBA_CHANNELS;
        self.data.get(byte_index).copied()
    }
}

/// A per-pixel visibility mask. A zero red channel hides the cell sampled there.
#[derive(Debug, Clone)]
pub struct MaskImage {
    image: RgbaImage,
}

impl MaskImage {
    pub fn from_image(image: RgbaImage) -> Self {
        Self { image }
    }

    /// Loads a mask from disk and scales it to the window the grid samples from.
    pub fn open<P: AsRef<Path>>(path: P, window_width: u32, window_height: u32) -> Result<Self> {
        let loaded = image::open(path)?.to_rgba8();
        let image = if loaded.dimensions() == (window_width, window_height) {
            loaded
        } else {
            image::imageops::resize(
                &loaded,
                window_width,
                window_height,
                image::imageops::FilterType::Nearest,
            )
        };
        Ok(Self { image })
    }

    /// True when the point is visible (non-zero red); out-of-range points are an error.
    pub fn is_visible(&self, x: u32, y: u32) -> Result<bool> {
        Ok(self.sample(x, y)? != 0)
    }
}

impl Frame for MaskImage {
    fn dimensions(&self) -> (u32, u32) {
        self.image.dimensions()
    }

    fn intensity_at(&self, x: u32, y: u32) -> Option<u8> {
        self.image.get_pixel_checked(x, y).map(|p| p[0])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgba;

    #[test]
    fn raw_frame_reads_red_channel() {
        let mut data = vec![0u8; 2 * 2 * 4];
        // pixel (1, 1)
        data[12] = 77;
        data[13] = 200;
        let frame = RawFrame::new(2, 2, data).unwrap();
        assert_eq!(frame.intensity_at(1, 1), Some(77));
        assert_eq!(frame.intensity_at(0, 0), Some(0));
        assert_eq!(frame.intensity_at(2, 0), None);
    }

    #[test]
    fn raw_frame_rejects_short_buffer() {
        let err = RawFrame::new(4, 4, vec![0u8; 10]).unwrap_err();
        assert!(matches!(
            err,
            WatchError::InvalidFrameBuffer {
                expected: 64,
                actual: 10,
                ..
            }
        ));
    }

    #[test]
    fn sample_reports_out_of_bounds() {
        let image = RgbaImage::from_pixel(3, 3, Rgba([9, 0, 0, 255]));
        assert_eq!(image.sample(2, 2).unwrap(), 9);
        let err = image.sample(3, 0).unwrap_err();
        assert!(matches!(
            err,
            WatchError::SampleOutOfBounds {
                x: 3,
                y: 0,
                width: 3,
                height: 3
            }
        ));
    }

    #[test]
    fn mask_visibility_follows_red_channel() {
        let mut image = RgbaImage::from_pixel(4, 4, Rgba([255, 0, 0, 255]));
        image.put_pixel(1, 2, Rgba([0, 255, 255, 255]));
        let mask = MaskImage::from_image(image);
        assert!(mask.is_visible(0, 0).unwrap());
        assert!(!mask.is_visible(1, 2).unwrap());
        assert!(mask.is_visible(9, 9).is_err());
    }

    #[test]
    fn mask_open_scales_to_the_window() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("mask.png");
        let mut source = RgbaImage::from_pixel(2, 2, Rgba([0, 0, 0, 255]));
        source.put_pixel(0, 0, Rgba([255, 0, 0, 255]));
        source.put_pixel(0, 1, Rgba([255, 0, 0, 255]));
        source.save(&path).unwrap();

        let mask = MaskImage::open(&path, 8, 6).unwrap();
        assert_eq!(Frame::dimensions(&mask), (8, 6));
        assert_eq!(mask.intensity_at(0, 0), Some(255));
        assert!(mask.is_visible(0, 5).unwrap());
        assert!(!mask.is_visible(7, 0).unwrap());
        assert!(!mask.is_visible(7, 5).unwrap());

        let same = MaskImage::open(&path, 2, 2).unwrap();
        assert_eq!(Frame::dimensions(&same), (2, 2));
        assert!(same.is_visible(0, 1).unwrap());
    }

    #[test]
    fn mask_open_reports_missing_files() {
        let dir = tempfile::tempdir().unwrap();
        let err = MaskImage::open(dir.path().join("absent.png"), 4, 4).unwrap_err();
        assert!(matches!(err, WatchError::Image(_)));
    }

    #[test]
    fn rgb_image_reads_red_channel() {
        let mut image = RgbImage::from_pixel(3, 2, image::Rgb([1, 2, 3]));
        image.put_pixel(2, 1, image::Rgb([140, 7, 7]));
        assert_eq!(Frame::dimensions(&image), (3, 2));
        assert_eq!(image.intensity_at(2, 1), Some(140));
        assert_eq!(image.intensity_at(0, 0), Some(1));
        assert_eq!(image.intensity_at(3, 1), None);
        assert_eq!(image.intensity_at(0, 2), None);
    }

    #[test]
    fn dynamic_image_reads_red_channel() {
        let mut rgba = RgbaImage::from_pixel(4, 4, Rgba([0, 50, 50, 255]));
        rgba.put_pixel(3, 0, Rgba([33, 0, 0, 255]));
        let image = DynamicImage::ImageRgba8(rgba);
        assert_eq!(Frame::dimensions(&image), (4, 4));
        assert_eq!(image.intensity_at(3, 0), Some(33));
        assert_eq!(image.intensity_at(0, 0), Some(0));
        assert_eq!(image.intensity_at(4, 0), None);
        assert_eq!(image.intensity_at(0, 4), None);

        // Grey images expand to equal channels, so red is the luma value.
        let grey = DynamicImage::ImageLuma8(image::GrayImage::from_pixel(2, 2, image::Luma([90])));
        assert_eq!(grey.intensity_at(1, 1), Some(90));
        assert_eq!(grey.intensity_at(2, 2), None);
    }

    #[test]
    fn shared_and_borrowed_frames_delegate() {
        let mut rgba = RgbaImage::from_pixel(2, 2, Rgba([0, 0, 0, 255]));
        rgba.put_pixel(1, 0, Rgba([64, 0, 0, 255]));

        let shared = Arc::new(rgba.clone());
        assert_eq!(Frame::dimensions(&shared), (2, 2));
        assert_eq!(shared.intensity_at(1, 0), Some(64));
        assert_eq!(shared.intensity_at(2, 0), None);
        assert!(shared.sample(0, 2).is_err());

        let borrowed = &rgba;
        assert_eq!(Frame::intensity_at(&borrowed, 1, 0), Some(64));

        let dynamic: Arc<DynamicImage> = Arc::new(DynamicImage::ImageRgba8(rgba));
        assert_eq!(dynamic.sample(1, 0).unwrap(), 64);
    }
}
