// THEORY:
// This file is the main entry point for the `forest_guard` library crate. It exports
// the `ChangeEstimator` and its data structures (`EstimatorConfig`, `ChangeReport`) as
// the high-level interface for satellite change detection, alongside the batch runner,
// the monitoring-session policy used by dashboards and the layered settings.
//
// The pixel-level building blocks live in `core_modules`. They are public so that
// callers can inspect individual frames and masks, but everyday use only needs the
// `estimator` module.

pub mod config;
pub mod core_modules;
pub mod error;
pub mod estimator;
pub mod monitor;
pub mod parallel_estimator;

pub use error::{ConfigError, EstimateError, InputRole, MonitorError};
pub use estimator::{estimate, ChangeEstimator, ChangeReport, EstimatorConfig, Resampling, TargetSize};
