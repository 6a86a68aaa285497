use std::fmt;
use thiserror::Error;

/// Identifies which caller-supplied image an error refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputRole {
    Before,
    After,
    CameraTrap,
}

impl fmt::Display for InputRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            InputRole::Before => "before",
            InputRole::After => "after",
            InputRole::CameraTrap => "camera-trap",
        };
        f.write_str(name)
    }
}

// Change estimation errors

#[derive(Error, Debug)]
pub enum EstimateError {
    #[error("Failed to decode {input} image: {source}")]
    Decode {
        input: InputRole,
        #[source]
        source: image::ImageError,
    },
    #[error("The {input} image has zero area ({width}x{height}).")]
    Dimension {
        input: InputRole,
        width: u32,
        height: u32,
    },
    #[error("Target size must have a non-zero area, got {width}x{height}.")]
    TargetSize { width: u32, height: u32 },
    #[error("Estimation worker failed: {0}")]
    Worker(#[from] tokio::task::JoinError),
    #[error("The estimation worker pool is closed.")]
    PoolClosed,
}

impl EstimateError {
    /// The input the error refers to, when it refers to one.
    pub fn input(&self) -> Option<InputRole> {
        match self {
            EstimateError::Decode { input, .. } | EstimateError::Dimension { input, .. } => {
                Some(*input)
            }
            _ => None,
        }
    }
}

// Settings errors

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to load settings: {0}")]
    Load(#[from] config::ConfigError),
    #[error("Invalid settings: {0}")]
    Invalid(String),
}

// Monitoring session errors

#[derive(Error, Debug)]
pub enum MonitorError {
    #[error("Change estimation failed: {0}")]
    Estimate(#[from] EstimateError),
    #[error("Satellite imagery request failed: {0}")]
    Imagery(#[source] Box<dyn std::error::Error + Send + Sync>),
    #[error("Intrusion detection failed: {0}")]
    Detection(#[source] Box<dyn std::error::Error + Send + Sync>),
    #[error("Unknown region: {0}")]
    UnknownRegion(String),
    #[error("Invalid bounding box: {0}")]
    InvalidBoundingBox(String),
    #[error("Start date {start} is after end date {end}.")]
    InvalidDateRange {
        start: chrono::NaiveDate,
        end: chrono::NaiveDate,
    },
}
