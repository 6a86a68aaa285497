// THEORY:
// The `Frame` module is the bridge between whatever the caller hands us (a decoded
// image, an encoded buffer, a file on disk) and the fixed RGB grid the comparison
// layer works on. It plays the role a "chunk" of pixels plays in a streaming vision
// system: a plain data container that knows how to summarise and reshape itself, but
// not how to compare itself with anything.
//
// Key architectural principles:
// 1.  **Normalise Early**: Every input is flattened to 8-bit RGB the moment it becomes
//     a `Frame`. Downstream code never branches on pixel formats.
// 2.  **Reject Degenerate Input**: A zero-area image cannot be resampled into a
//     meaningful comparison. It is refused here, with the offending input named.
// 3.  **Geometry Alignment**: Two frames are only comparable at identical dimensions.
//     `resample` stretches a frame to an exact target size with a caller-chosen
//     filter. Aspect ratio is not preserved; both inputs of a comparison must be
//     resampled with the same filter and target.

pub mod frame {
    use crate::core_modules::pixel::pixel::Pixel;
    use crate::error::{EstimateError, InputRole};
    use image::imageops::{self, FilterType};
    use image::{DynamicImage, RgbImage};
    use serde::Deserialize;
    use std::fmt;
    use std::path::Path;
    use std::str::FromStr;

    /// The common resolution both images of a comparison are resampled to.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
    pub struct TargetSize {
        pub width: u32,
        pub height: u32,
    }

    impl TargetSize {
        pub const fn new(width: u32, height: u32) -> Self {
            Self { width, height }
        }

        pub fn pixel_count(&self) -> u64 {
            self.width as u64 * self.height as u64
        }

        pub fn validate(&self) -> Result<(), EstimateError> {
            if self.pixel_count() == 0 {
                return Err(EstimateError::TargetSize {
                    width: self.width,
                    height: self.height,
                });
            }
            Ok(())
        }
    }

    impl Default for TargetSize {
        fn default() -> Self {
            Self::new(600, 600)
        }
    }

    impl fmt::Display for TargetSize {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            write!(f, "{}x{}", self.width, self.height)
        }
    }

    impl FromStr for TargetSize {
        type Err = String;

        /// Parses `WIDTHxHEIGHT`, e.g. `600x600`.
        fn from_str(s: &str) -> Result<Self, Self::Err> {
            let (width, height) = s
                .split_once(['x', 'X'])
                .ok_or_else(|| format!("expected WIDTHxHEIGHT, got `{s}`"))?;
            let width = width
                .trim()
                .parse::<u32>()
                .map_err(|e| format!("invalid width `{width}`: {e}"))?;
            let height = height
                .trim()
                .parse::<u32>()
                .map_err(|e| format!("invalid height `{height}`: {e}"))?;
            Ok(Self::new(width, height))
        }
    }

    /// Resampling filter used when stretching a frame to the target size.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
    #[serde(rename_all = "lowercase")]
    pub enum Resampling {
        Nearest,
        #[default]
        Bilinear,
    }

    impl Resampling {
        fn filter(self) -> FilterType {
            match self {
                Resampling::Nearest => FilterType::Nearest,
                Resampling::Bilinear => FilterType::Triangle,
            }
        }
    }

    impl FromStr for Resampling {
        type Err = String;

        fn from_str(s: &str) -> Result<Self, Self::Err> {
            match s.to_ascii_lowercase().as_str() {
                "nearest" => Ok(Resampling::Nearest),
                "bilinear" => Ok(Resampling::Bilinear),
                other => Err(format!("unknown resampling filter `{other}`")),
            }
        }
    }

    /// A non-empty RGB image ready for comparison.
    #[derive(Debug, Clone, PartialEq)]
    pub struct Frame {
        image: RgbImage,
    }

    impl Frame {
        /// Wraps an already decoded image, flattening it to RGB.
        pub fn from_dynamic(image: &DynamicImage, input: InputRole) -> Result<Self, EstimateError> {
            Self::from_rgb(image.to_rgb8(), input)
        }

        pub fn from_rgb(image: RgbImage, input: InputRole) -> Result<Self, EstimateError> {
            let (width, height) = image.dimensions();
            if width == 0 || height == 0 {
                return Err(EstimateError::Dimension {
                    input,
                    width,
                    height,
                });
            }
            Ok(Self { image })
        }

        /// Decodes an encoded buffer, guessing the format from its content.
        pub fn decode(bytes: &[u8], input: InputRole) -> Result<Self, EstimateError> {
            let image = image::load_from_memory(bytes)
                .map_err(|source| EstimateError::Decode { input, source })?;
            Self::from_dynamic(&image, input)
        }

        /// Reads and decodes an image file. A missing or unreadable file is
        /// reported as a decode failure of that input.
        pub fn open(path: impl AsRef<Path>, input: InputRole) -> Result<Self, EstimateError> {
            let image =
                image::open(path).map_err(|source| EstimateError::Decode { input, source })?;
            Self::from_dynamic(&image, input)
        }

        pub fn width(&self) -> u32 {
            self.image.width()
        }

        pub fn height(&self) -> u32 {
            self.image.height()
        }

        pub fn dimensions(&self) -> (u32, u32) {
            self.image.dimensions()
        }

        pub fn pixel_count(&self) -> u64 {
            self.width() as u64 * self.height() as u64
        }

        pub fn pixel(&self, x: u32, y: u32) -> Pixel {
            Pixel::from(self.image.get_pixel(x, y))
        }

        /// Row-major iterator over every pixel.
        pub fn pixels(&self) -> impl Iterator<Item = Pixel> + '_ {
            self.image.pixels().map(Pixel::from)
        }

        /// Stretches the frame to exactly `target`. A frame already at the target
        /// size is copied untouched.
        pub fn resample(&self, target: TargetSize, resampling: Resampling) -> Frame {
            if self.dimensions() == (target.width, target.height) {
                return self.clone();
            }
            let image = imageops::resize(
                &self.image,
                target.width,
                target.height,
                resampling.filter(),
            );
            Frame { image }
        }

        pub fn as_image(&self) -> &RgbImage {
            &self.image
        }

        pub fn into_image(self) -> RgbImage {
            self.image
        }
    }
}

#[cfg(test)]
mod tests {
    use super::frame::*;
    use crate::core_modules::pixel::pixel::Pixel;
    use crate::error::{EstimateError, InputRole};
    use image::{DynamicImage, ImageFormat, Rgb, RgbImage, RgbaImage};
    use std::io::Cursor;

    #[test]
    fn rgba_input_is_flattened_to_rgb() {
        let rgba = RgbaImage::from_pixel(4, 3, image::Rgba([10, 20, 30, 0]));
        let frame = Frame::from_dynamic(&DynamicImage::ImageRgba8(rgba), InputRole::Before)
            .expect("valid frame");
        assert_eq!(frame.dimensions(), (4, 3));
        assert!(frame.pixels().all(|p| p == Pixel::new(10, 20, 30)));
    }

    #[test]
    fn zero_area_image_is_rejected_with_its_role() {
        let empty = RgbImage::new(0, 5);
        let err = Frame::from_rgb(empty, InputRole::After).unwrap_err();
        assert!(matches!(
            err,
            EstimateError::Dimension {
                input: InputRole::After,
                width: 0,
                height: 5
            }
        ));
    }

    #[test]
    fn garbage_bytes_fail_to_decode() {
        let err = Frame::decode(b"definitely not an image", InputRole::Before).unwrap_err();
        assert_eq!(err.input(), Some(InputRole::Before));
        assert!(err.to_string().contains("before"));
    }

    #[test]
    fn decodes_png_buffer() {
        let image = RgbImage::from_pixel(8, 8, Rgb([1, 2, 3]));
        let mut bytes = Vec::new();
        DynamicImage::ImageRgb8(image)
            .write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)
            .expect("encode png");
        let frame = Frame::decode(&bytes, InputRole::After).expect("decode png");
        assert_eq!(frame.pixel(7, 7), Pixel::new(1, 2, 3));
    }

    #[test]
    fn missing_file_is_a_decode_error() {
        let err = Frame::open("/nonexistent/forest_before.png", InputRole::Before).unwrap_err();
        assert!(matches!(
            err,
            EstimateError::Decode {
                input: InputRole::Before,
                ..
            }
        ));
    }

    #[test]
    fn resample_reaches_exact_target() {
        let frame = Frame::from_rgb(RgbImage::from_pixel(37, 91, Rgb([5, 5, 5])), InputRole::Before)
            .expect("valid frame");
        for resampling in [Resampling::Nearest, Resampling::Bilinear] {
            let resized = frame.resample(TargetSize::new(60, 40), resampling);
            assert_eq!(resized.dimensions(), (60, 40));
            assert!(resized.pixels().all(|p| p == Pixel::new(5, 5, 5)));
        }
    }

    #[test]
    fn resample_at_target_size_is_identity() {
        let mut image = RgbImage::from_pixel(10, 10, Rgb([0, 0, 0]));
        image.put_pixel(3, 4, Rgb([200, 100, 50]));
        let frame = Frame::from_rgb(image, InputRole::After).expect("valid frame");
        assert_eq!(frame.resample(TargetSize::new(10, 10), Resampling::Bilinear), frame);
    }

    #[test]
    fn target_size_parsing() {
        assert_eq!("600x600".parse::<TargetSize>(), Ok(TargetSize::new(600, 600)));
        assert_eq!("32X16".parse::<TargetSize>(), Ok(TargetSize::new(32, 16)));
        assert!("600".parse::<TargetSize>().is_err());
        assert!("ax3".parse::<TargetSize>().is_err());
        assert!(TargetSize::new(0, 10).validate().is_err());
        assert!(TargetSize::default().validate().is_ok());
    }
}
