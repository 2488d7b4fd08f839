// ============================================================
// Layer 3 — Tensor Shapes
// ============================================================
// The per-sample shape flowing between layers. The batch
// dimension is never part of a Shape.
//
//   Spatial  height x width x channels   (images, feature maps)
//   Flat     features                    (after flatten / dense)
//
// Shapes are written channel-last (30x30x3) because that is how
// the configuration is authored. The ml layer converts to the
// channel-first layout burn expects.

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Shape of one sample as it enters or leaves a layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Shape {
    Spatial {
        height:   usize,
        width:    usize,
        channels: usize,
    },
    Flat {
        features: usize,
    },
}

impl Shape {
    pub fn spatial(height: usize, width: usize, channels: usize) -> Self {
        Shape::Spatial { height, width, channels }
    }

    pub fn flat(features: usize) -> Self {
        Shape::Flat { features }
    }

    /// Number of scalar values in one sample of this shape.
    pub fn elements(&self) -> Result<usize, ShapeError> {
        match *self {
            Shape::Spatial { height, width, channels } => height
                .checked_mul(width)
                .and_then(|n| n.checked_mul(channels))
                .ok_or(ShapeError::TooLarge { what: "element count", input: *self }),
            Shape::Flat { features } => Ok(features),
        }
    }

    pub fn is_spatial(&self) -> bool {
        matches!(self, Shape::Spatial { .. })
    }
}

impl fmt::Display for Shape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Shape::Spatial { height, width, channels } => {
                write!(f, "{height}x{width}x{channels}")
            }
            Shape::Flat { features } => write!(f, "{features}"),
        }
    }
}

/// Ways a single layer can reject the shape it is given.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ShapeError {
    #[error("{layer} needs a spatial (HxWxC) input, got flat {input}")]
    ExpectedSpatial { layer: &'static str, input: Shape },

    #[error("{layer} needs a flat input, got {input}; insert a flatten layer first")]
    ExpectedFlat { layer: &'static str, input: Shape },

    #[error("kernel {kernel:?} does not fit input {input}")]
    KernelTooLarge { kernel: [usize; 2], input: Shape },

    #[error("pool {pool:?} does not fit input {input}")]
    PoolTooLarge { pool: [usize; 2], input: Shape },

    #[error("{what} must be greater than zero")]
    ZeroSized { what: &'static str },

    #[error("dropout rate {rate} is outside [0, 1)")]
    InvalidDropout { rate: f64 },

    #[error("{what} for input {input} overflows usize")]
    TooLarge { what: &'static str, input: Shape },
}
