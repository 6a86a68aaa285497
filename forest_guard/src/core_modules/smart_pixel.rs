// THEORY:
// The `SmartPixel` module provides the comparative half of the pixel layer. It wraps a
// "dumb" `Pixel` and measures how far it sits from the pixel at the same location in
// another image.
//
// Key architectural principles:
// 1.  **Comparative Analysis**: Every method takes another `SmartPixel`. A `SmartPixel`
//     is meaningless on its own; its value is in the relationship.
// 2.  **Difference First, Collapse Second**: The per-channel absolute difference is
//     computed before any weighting. The resulting difference triple is itself a
//     `Pixel`, so its magnitude is simply that pixel's luma. Collapsing the channels
//     after differencing means a change from green forest to brown soil registers
//     even when both colours happen to share a similar brightness.
// 3.  **Caching**: The luma is pre-computed in the constructor. The estimator compares
//     each pixel exactly once, but the luma is also reported alongside the magnitude
//     when callers inspect individual samples.

pub mod smart_pixel {
    use crate::core_modules::pixel::pixel::{Luma, Pixel};

    pub type ChangeMagnitude = u8;

    /// An analytical tool that wraps a `Pixel` to compare it with its counterpart.
    #[derive(Debug, Clone, Copy)]
    pub struct SmartPixel {
        /// The raw `Pixel` data this `SmartPixel` is analyzing.
        pub pixel: Pixel,
        /// The pre-calculated luma of the pixel.
        luma: Luma,
    }

    impl SmartPixel {
        pub fn new(pixel: Pixel) -> Self {
            Self {
                luma: pixel.luma(),
                pixel,
            }
        }

        pub fn luma(&self) -> Luma {
            self.luma
        }

        /// Per-channel absolute difference, packed back into a `Pixel`.
        pub fn delta(&self, other: &SmartPixel) -> Pixel {
            Pixel::new(
                self.pixel.red.abs_diff(other.pixel.red),
                self.pixel.green.abs_diff(other.pixel.green),
                self.pixel.blue.abs_diff(other.pixel.blue),
            )
        }

        /// The luma-weighted magnitude of the per-channel difference.
        pub fn change_magnitude(&self, other: &SmartPixel) -> ChangeMagnitude {
            self.delta(other).luma()
        }

        /// True when the change magnitude strictly exceeds `threshold`.
        pub fn has_changed(&self, other: &SmartPixel, threshold: ChangeMagnitude) -> bool {
            self.change_magnitude(other) > threshold
        }
    }
}
