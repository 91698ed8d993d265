//! Error types for restoration operations.

use std::fmt;
use thiserror::Error;

/// Pipeline stage an error was raised in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Stage {
    /// Parameter and input checks before any computation
    Validate,
    /// Per-pixel chromaticity and specular estimates
    Chromaticity,
    /// Iterative bilateral refinement of the specular estimate
    Refinement,
    /// Diffuse reconstruction
    Diffuse,
    /// Transmission map estimation
    TransmissionMap,
    /// Atmospheric light estimation
    AtmosphericLight,
    /// Scene radiance recovery
    HazeRemoval,
    /// Post-processing and quantization into the output frame
    StoreResult,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Stage::Validate => "validate",
            Stage::Chromaticity => "chromaticity",
            Stage::Refinement => "refinement",
            Stage::Diffuse => "diffuse",
            Stage::TransmissionMap => "transmission map",
            Stage::AtmosphericLight => "atmospheric light",
            Stage::HazeRemoval => "haze removal",
            Stage::StoreResult => "store result",
        })
    }
}

/// Error type for restoration operations.
#[derive(Error, Debug)]
pub enum OpsError {
    /// A configuration value is out of its domain.
    #[error("{stage}: invalid parameter '{param}': {reason}")]
    InvalidParameter {
        /// Stage that rejected it
        stage: Stage,
        /// Parameter name
        param: &'static str,
        /// What is wrong
        reason: String,
    },

    /// The input frame cannot be processed.
    #[error("{stage}: {reason}")]
    Precondition {
        /// Stage that rejected it
        stage: Stage,
        /// What is wrong
        reason: String,
    },

    /// Plane or frame construction failed.
    #[error(transparent)]
    Core(#[from] restore_core::Error),
}

impl OpsError {
    /// Creates an [`OpsError::InvalidParameter`] error.
    pub fn invalid_parameter(stage: Stage, param: &'static str, reason: impl Into<String>) -> Self {
        Self::InvalidParameter {
            stage,
            param,
            reason: reason.into(),
        }
    }

    /// Creates an [`OpsError::Precondition`] error.
    pub fn precondition(stage: Stage, reason: impl Into<String>) -> Self {
        Self::Precondition {
            stage,
            reason: reason.into(),
        }
    }

    /// Stage the error belongs to, if it carries one.
    pub fn stage(&self) -> Option<Stage> {
        match self {
            Self::InvalidParameter { stage, .. } | Self::Precondition { stage, .. } => Some(*stage),
            Self::Core(_) => None,
        }
    }
}

/// Result type for restoration operations.
pub type OpsResult<T> = Result<T, OpsError>;
