// THEORY:
// The `estimator` module is the top-level API of the change-detection engine. It wraps
// the frame, pixel and mask layers into one call: give it a "before" and an "after"
// image of the same footprint and it returns a highlighted visualisation plus the
// share of the frame that changed.
//
// Stages of a single estimation:
// 1.  Normalisation: both inputs become non-empty RGB `Frame`s.
// 2.  Alignment: both frames are resampled, independently and with the same filter,
//     to the configured target size.
// 3.  Comparison: a `ChangeMask` flags every pixel whose luma-weighted per-channel
//     difference exceeds the threshold.
// 4.  Reporting: changed pixels of the aligned "after" frame are painted red and the
//     changed share is computed.
//
// The estimator holds nothing but its configuration. It is `Send + Sync`, retains no
// state between calls, and produces bit-identical output for identical input.

use crate::core_modules::change_mask::ChangeMask;
use crate::core_modules::frame::frame::Frame;
use crate::core_modules::pixel::pixel::Pixel;
use crate::error::{EstimateError, InputRole};
use image::{DynamicImage, Rgb, RgbImage};
use serde::Deserialize;
use std::path::Path;
use tracing::debug;

// Re-export key data structures for the public API.
pub use crate::core_modules::frame::frame::{Resampling, TargetSize};

pub const DEFAULT_THRESHOLD: u8 = 30;

/// Configuration for the ChangeEstimator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct EstimatorConfig {
    /// A pixel counts as changed when its difference magnitude is strictly above this.
    pub threshold: u8,
    /// The common resolution both images are stretched to before comparison.
    pub target_size: TargetSize,
    pub resampling: Resampling,
}

impl Default for EstimatorConfig {
    fn default() -> Self {
        Self {
            threshold: DEFAULT_THRESHOLD,
            target_size: TargetSize::default(),
            resampling: Resampling::default(),
        }
    }
}

/// The result of comparing two images.
#[derive(Debug, Clone, PartialEq)]
pub struct ChangeReport {
    /// The resampled "after" image with every changed pixel painted pure red.
    pub highlighted: RgbImage,
    /// Changed pixels as a share of the frame, in [0, 100]. Not rounded.
    pub change_percent: f64,
    pub changed_pixels: u64,
    pub total_pixels: u64,
    pub threshold: u8,
}

/// Stateless before/after change estimator.
#[derive(Debug, Clone, Copy, Default)]
pub struct ChangeEstimator {
    config: EstimatorConfig,
}

impl ChangeEstimator {
    pub fn new(config: EstimatorConfig) -> Result<Self, EstimateError> {
        config.target_size.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &EstimatorConfig {
        &self.config
    }

    /// Compares two decoded images.
    pub fn estimate(
        &self,
        before: &DynamicImage,
        after: &DynamicImage,
    ) -> Result<ChangeReport, EstimateError> {
        let before = Frame::from_dynamic(before, InputRole::Before)?;
        let after = Frame::from_dynamic(after, InputRole::After)?;
        Ok(self.estimate_frames(&before, &after))
    }

    /// Compares two encoded buffers (PNG, JPEG, ...).
    pub fn estimate_bytes(&self, before: &[u8], after: &[u8]) -> Result<ChangeReport, EstimateError> {
        let before = Frame::decode(before, InputRole::Before)?;
        let after = Frame::decode(after, InputRole::After)?;
        Ok(self.estimate_frames(&before, &after))
    }

    /// Compares two image files.
    pub fn estimate_paths(
        &self,
        before: impl AsRef<Path>,
        after: impl AsRef<Path>,
    ) -> Result<ChangeReport, EstimateError> {
        let before = Frame::open(before, InputRole::Before)?;
        let after = Frame::open(after, InputRole::After)?;
        Ok(self.estimate_frames(&before, &after))
    }

    /// Compares two already normalised frames of any size.
    pub fn estimate_frames(&self, before: &Frame, after: &Frame) -> ChangeReport {
        let EstimatorConfig {
            threshold,
            target_size,
            resampling,
        } = self.config;

        // Stage 2: Alignment
        let before_aligned = before.resample(target_size, resampling);
        let after_aligned = after.resample(target_size, resampling);

        // Stage 3: Comparison
        let mask = ChangeMask::between(&before_aligned, &after_aligned, threshold);

        // Stage 4: Reporting
        let highlighted = Self::highlight(after_aligned.into_image(), &mask);
        let change_percent = mask.changed_percent();

        debug!(
            before = ?before.dimensions(),
            after = ?after.dimensions(),
            target = %target_size,
            threshold,
            changed = mask.changed_count(),
            change_percent,
            "estimated change"
        );

        ChangeReport {
            highlighted,
            change_percent,
            changed_pixels: mask.changed_count(),
            total_pixels: mask.total_count(),
            threshold,
        }
    }

    fn highlight(mut image: RgbImage, mask: &ChangeMask) -> RgbImage {
        debug_assert_eq!(image.dimensions(), mask.dimensions());
        let highlight: Rgb<u8> = Pixel::HIGHLIGHT.into();
        for (pixel, &changed) in image.pixels_mut().zip(mask.cells()) {
            if changed {
                *pixel = highlight;
            }
        }
        image
    }
}

/// One-shot convenience wrapper around `ChangeEstimator`.
pub fn estimate(
    before: &DynamicImage,
    after: &DynamicImage,
    threshold: u8,
    target_size: TargetSize,
) -> Result<ChangeReport, EstimateError> {
    ChangeEstimator::new(EstimatorConfig {
        threshold,
        target_size,
        ..EstimatorConfig::default()
    })?
    .estimate(before, after)
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{ImageFormat, Rgb, RgbImage};
    use std::io::Cursor;

    fn solid(width: u32, height: u32, rgb: [u8; 3]) -> DynamicImage {
        DynamicImage::ImageRgb8(RgbImage::from_pixel(width, height, Rgb(rgb)))
    }

    /// A deterministic, busy test pattern.
    fn pattern(width: u32, height: u32, seed: u32) -> DynamicImage {
        DynamicImage::ImageRgb8(RgbImage::from_fn(width, height, |x, y| {
            let v = x.wrapping_mul(31) ^ y.wrapping_mul(17) ^ seed.wrapping_mul(101);
            Rgb([(v % 256) as u8, ((v / 3) % 256) as u8, ((v / 7) % 256) as u8])
        }))
    }

    fn with_block(base: [u8; 3], block: [u8; 3]) -> DynamicImage {
        let mut image = RgbImage::from_pixel(600, 600, Rgb(base));
        for y in 250..350 {
            for x in 100..200 {
                image.put_pixel(x, y, Rgb(block));
            }
        }
        DynamicImage::ImageRgb8(image)
    }

    #[test]
    fn block_scenario_matches_expected_share() {
        let before = solid(600, 600, [10, 10, 10]);
        let after = with_block([10, 10, 10], [250, 250, 250]);

        let report = estimate(&before, &after, 30, TargetSize::new(600, 600)).expect("estimate");

        assert_eq!(report.changed_pixels, 100 * 100);
        assert_eq!(report.total_pixels, 600 * 600);
        let expected = (100.0 * 100.0) / (600.0 * 600.0) * 100.0;
        assert!((report.change_percent - expected).abs() < 1e-12);
        assert!((report.change_percent - 2.78).abs() < 0.01);

        let after_rgb = after.to_rgb8();
        for (x, y, pixel) in report.highlighted.enumerate_pixels() {
            let inside = (100..200).contains(&x) && (250..350).contains(&y);
            if inside {
                assert_eq!(*pixel, Rgb([255, 0, 0]));
            } else {
                assert_eq!(pixel, after_rgb.get_pixel(x, y));
            }
        }
    }

    #[test]
    fn identical_images_show_no_change() {
        let image = pattern(320, 240, 7);
        for threshold in [1u8, 30, 200] {
            let report = estimate(&image, &image.clone(), threshold, TargetSize::default())
                .expect("estimate");
            assert_eq!(report.change_percent, 0.0);
            assert_eq!(report.changed_pixels, 0);
        }
    }

    #[test]
    fn white_against_black_is_total_change() {
        let white = solid(64, 64, [255, 255, 255]);
        let black = solid(64, 64, [0, 0, 0]);
        for threshold in [0u8, 30, 254] {
            let report =
                estimate(&black, &white, threshold, TargetSize::new(64, 64)).expect("estimate");
            assert_eq!(report.change_percent, 100.0);
        }
        let report = estimate(&black, &white, 255, TargetSize::new(64, 64)).expect("estimate");
        assert_eq!(report.change_percent, 0.0);
    }

    #[test]
    fn repeated_calls_are_bit_identical() {
        let before = pattern(500, 333, 1);
        let after = pattern(611, 400, 2);
        let estimator = ChangeEstimator::default();
        let first = estimator.estimate(&before, &after).expect("estimate");
        let second = estimator.estimate(&before, &after).expect("estimate");
        assert_eq!(first.highlighted.as_raw(), second.highlighted.as_raw());
        assert_eq!(first.change_percent.to_bits(), second.change_percent.to_bits());
    }

    #[test]
    fn change_share_never_grows_with_threshold() {
        let before = pattern(120, 90, 3);
        let after = pattern(120, 90, 4);
        let mut previous = f64::INFINITY;
        for threshold in (0..=255u8).step_by(5) {
            let report =
                estimate(&before, &after, threshold, TargetSize::new(120, 90)).expect("estimate");
            assert!((0.0..=100.0).contains(&report.change_percent));
            assert!(report.change_percent <= previous);
            previous = report.change_percent;
        }
    }

    #[test]
    fn different_resolutions_are_aligned_to_target() {
        let before = solid(1024, 512, [30, 120, 30]);
        let after = solid(300, 700, [30, 120, 30]);
        let report = estimate(&before, &after, 30, TargetSize::new(200, 150)).expect("estimate");
        assert_eq!(report.highlighted.dimensions(), (200, 150));
        assert_eq!(report.change_percent, 0.0);
    }

    #[test]
    fn nearest_resampling_keeps_scenario_exact() {
        let before = solid(1200, 1200, [10, 10, 10]);
        let mut after = RgbImage::from_pixel(1200, 1200, Rgb([10, 10, 10]));
        for y in 0..600 {
            for x in 0..600 {
                after.put_pixel(x, y, Rgb([250, 250, 250]));
            }
        }
        let estimator = ChangeEstimator::new(EstimatorConfig {
            threshold: 30,
            target_size: TargetSize::new(600, 600),
            resampling: Resampling::Nearest,
        })
        .expect("valid config");
        let report = estimator
            .estimate(&before, &DynamicImage::ImageRgb8(after))
            .expect("estimate");
        assert_eq!(report.change_percent, 25.0);
    }

    #[test]
    fn zero_target_size_is_rejected() {
        let err = ChangeEstimator::new(EstimatorConfig {
            target_size: TargetSize::new(600, 0),
            ..EstimatorConfig::default()
        })
        .unwrap_err();
        assert!(matches!(err, EstimateError::TargetSize { width: 600, height: 0 }));
    }

    #[test]
    fn empty_input_is_rejected_with_role() {
        let err = estimate(
            &solid(10, 10, [0, 0, 0]),
            &DynamicImage::new_rgb8(0, 0),
            30,
            TargetSize::default(),
        )
        .unwrap_err();
        assert_eq!(err.input(), Some(InputRole::After));
    }

    #[test]
    fn undecodable_buffer_names_its_input() {
        let mut png = Vec::new();
        solid(16, 16, [1, 2, 3])
            .write_to(&mut Cursor::new(&mut png), ImageFormat::Png)
            .expect("encode png");

        let estimator = ChangeEstimator::default();
        let err = estimator.estimate_bytes(b"corrupt", &png).unwrap_err();
        assert_eq!(err.input(), Some(InputRole::Before));
        let err = estimator.estimate_bytes(&png, &png[..20]).unwrap_err();
        assert_eq!(err.input(), Some(InputRole::After));

        let report = estimator.estimate_bytes(&png, &png).expect("estimate");
        assert_eq!(report.change_percent, 0.0);
        assert_eq!(report.highlighted.dimensions(), (600, 600));
    }

    #[test]
    fn estimates_from_files() {
        let dir = tempfile::tempdir().expect("temp dir");
        let before_path = dir.path().join("before.png");
        let after_path = dir.path().join("after.png");
        solid(40, 40, [0, 0, 0]).save(&before_path).expect("save before");
        solid(40, 40, [255, 255, 255]).save(&after_path).expect("save after");

        let report = ChangeEstimator::default()
            .estimate_paths(&before_path, &after_path)
            .expect("estimate");
        assert_eq!(report.change_percent, 100.0);

        let err = ChangeEstimator::default()
            .estimate_paths(dir.path().join("missing.png"), &after_path)
            .unwrap_err();
        assert_eq!(err.input(), Some(InputRole::Before));
    }
}
