// THEORY (Single-Pixel Heuristics):
// The `Pixel` module is the most fundamental unit of the change estimator. It is a
// "dumb" data container for one RGB sample plus the heuristics that can be computed
// from that sample alone, with no knowledge of neighbours or of the other image in a
// comparison. Anything that needs a second pixel (differences, magnitudes of change)
// belongs in `SmartPixel`.
//
// Satellite tiles and camera-trap photos arrive in every format the `image` crate can
// decode. Before they reach this layer they are flattened to 8-bit RGB; alpha carries
// no meaning for ground imagery and is dropped.
//
// Luma:
// The one heuristic that matters for change estimation is luma, the weighted sum
// of the three channels. We use the Rec. 601 weights (0.299, 0.587, 0.114) in integer
// fixed point so the result is an exact integer in [0, 255] on every platform:
//
//     luma = (299 * R + 587 * G + 114 * B + 500) / 1000
//
// The `+ 500` rounds to nearest. The weights sum to 1000, so pure white maps to 255
// and pure black maps to 0.

pub mod pixel {
    use image::Rgb;

    pub type Channel = u8;
    pub type Luma = u8;

    /// Rec. 601 weights in parts per thousand (R, G, B).
    pub const LUMA_WEIGHTS: [u32; 3] = [299, 587, 114];
    const LUMA_SCALE: u32 = 1000;

    /// A "dumb" data container representing a single RGB pixel.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Hash)]
    pub struct Pixel {
        /// The red channel value (0-255).
        pub red: Channel,
        /// The green channel value (0-255).
        pub green: Channel,
        /// The blue channel value (0-255).
        pub blue: Channel,
    }

    impl Pixel {
        /// Pure red, used to paint changed pixels in a highlighted report.
        pub const HIGHLIGHT: Pixel = Pixel::new(255, 0, 0);
        pub const BLACK: Pixel = Pixel::new(0, 0, 0);
        pub const WHITE: Pixel = Pixel::new(255, 255, 255);

        pub const fn new(red: Channel, green: Channel, blue: Channel) -> Self {
            Self { red, green, blue }
        }

        /// Rec. 601 luma, rounded to the nearest integer.
        pub fn luma(&self) -> Luma {
            let weighted = LUMA_WEIGHTS[0] * self.red as u32
                + LUMA_WEIGHTS[1] * self.green as u32
                + LUMA_WEIGHTS[2] * self.blue as u32;
            // Max is 255 * 1000 + 500, so the quotient always fits in a byte.
            ((weighted + LUMA_SCALE / 2) / LUMA_SCALE) as Luma
        }

        pub fn channels(&self) -> [Channel; 3] {
            [self.red, self.green, self.blue]
        }
    }

    impl From<Rgb<u8>> for Pixel {
        fn from(rgb: Rgb<u8>) -> Self {
            let [red, green, blue] = rgb.0;
            Pixel::new(red, green, blue)
        }
    }

    impl From<&Rgb<u8>> for Pixel {
        fn from(rgb: &Rgb<u8>) -> Self {
            Pixel::from(*rgb)
        }
    }

    impl From<Pixel> for Rgb<u8> {
        fn from(pixel: Pixel) -> Self {
            Rgb(pixel.channels())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::pixel::*;
    use image::Rgb;

    #[test]
    fn luma_of_extremes() {
        assert_eq!(Pixel::BLACK.luma(), 0);
        assert_eq!(Pixel::WHITE.luma(), 255);
    }

    #[test]
    fn luma_of_primaries_follows_rec601() {
        // 0.299 * 255 = 76.245
        assert_eq!(Pixel::new(255, 0, 0).luma(), 76);
        // 0.587 * 255 = 149.685
        assert_eq!(Pixel::new(0, 255, 0).luma(), 150);
        // 0.114 * 255 = 29.07
        assert_eq!(Pixel::new(0, 0, 255).luma(), 29);
    }

    #[test]
    fn gray_pixels_keep_their_level() {
        for level in [0u8, 10, 30, 31, 128, 240, 255] {
            assert_eq!(Pixel::new(level, level, level).luma(), level);
        }
    }

    #[test]
    fn converts_to_and_from_rgb() {
        let pixel = Pixel::from(Rgb([12, 34, 56]));
        assert_eq!(pixel, Pixel::new(12, 34, 56));
        assert_eq!(Rgb::<u8>::from(pixel), Rgb([12, 34, 56]));
        assert_eq!(pixel.channels(), [12, 34, 56]);
    }
}

// -----------------------------------------------------------------------------
// Glossary: Single-Pixel Terms
//
// - Luma: Perceived brightness approximated from gamma-encoded RGB with the
//   Rec. 601 weights. Not the same as CIE luminance (which needs linear light), but
//   it is what common grayscale conversions compute and is cheap and exact in integers.
//
// - Highlight: The fixed colour (pure red) used to mark changed pixels in the
//   visualisation produced by the change estimator.
