// ============================================================
// Layer 3 — Layer Specifications
// ============================================================
// One entry of the layer stack: a tagged record naming the
// layer kind and its parameters. In JSON:
//
//   { "kind": "convolution", "filters": 32, "kernel_size": [3, 3], "activation": "relu" }
//   { "kind": "pooling", "pool_size": [2, 2] }
//   { "kind": "flatten" }
//   { "kind": "dense", "units": 128, "activation": "relu" }
//   { "kind": "dropout", "rate": 0.5 }
//
// Shape rules follow the framework defaults the configuration
// was written against: valid padding, unit stride for
// convolutions, stride = pool size for max pooling.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::domain::shape::{Shape, ShapeError};

/// Element-wise function applied to a layer's output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Activation {
    /// Identity
    #[default]
    Linear,
    Relu,
    Sigmoid,
    Tanh,
    /// Normalises the last dimension into a probability distribution
    Softmax,
}

impl fmt::Display for Activation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Activation::Linear  => "linear",
            Activation::Relu    => "relu",
            Activation::Sigmoid => "sigmoid",
            Activation::Tanh    => "tanh",
            Activation::Softmax => "softmax",
        };
        f.write_str(name)
    }
}

/// A single entry in the model's layer stack.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum LayerSpec {
    /// Learned filter bank over a spatial input
    Convolution {
        filters:     usize,
        kernel_size: [usize; 2],
        #[serde(default)]
        activation:  Activation,
    },

    /// Max pooling, stride equal to the pool size
    Pooling {
        pool_size: [usize; 2],
    },

    /// Spatial → flat, channel-last order
    Flatten,

    /// Fully-connected layer over a flat input
    Dense {
        units:      usize,
        #[serde(default)]
        activation: Activation,
    },

    /// Zeroes a fraction of activations during training; shape-preserving
    Dropout {
        rate: f64,
    },
}

impl LayerSpec {
    pub fn convolution(filters: usize, kernel_size: [usize; 2], activation: Activation) -> Self {
        LayerSpec::Convolution { filters, kernel_size, activation }
    }

    pub fn pooling(pool_size: [usize; 2]) -> Self {
        LayerSpec::Pooling { pool_size }
    }

    pub fn dense(units: usize, activation: Activation) -> Self {
        LayerSpec::Dense { units, activation }
    }

    pub fn dropout(rate: f64) -> Self {
        LayerSpec::Dropout { rate }
    }

    /// Short lowercase kind name, matching the JSON tag.
    pub fn kind(&self) -> &'static str {
        match self {
            LayerSpec::Convolution { .. } => "convolution",
            LayerSpec::Pooling { .. }     => "pooling",
            LayerSpec::Flatten            => "flatten",
            LayerSpec::Dense { .. }       => "dense",
            LayerSpec::Dropout { .. }     => "dropout",
        }
    }

    /// One-line summary, e.g. `conv 32 3x3 relu`.
    pub fn describe(&self) -> String {
        match self {
            LayerSpec::Convolution { filters, kernel_size: [kh, kw], activation } => {
                format!("conv {filters} {kh}x{kw} {activation}")
            }
            LayerSpec::Pooling { pool_size: [ph, pw] } => format!("maxpool {ph}x{pw}"),
            LayerSpec::Flatten                        => "flatten".to_string(),
            LayerSpec::Dense { units, activation }    => format!("dense {units} {activation}"),
            LayerSpec::Dropout { rate }               => format!("dropout {rate}"),
        }
    }

    /// True for layers that own learned weights.
    pub fn is_trainable(&self) -> bool {
        matches!(self, LayerSpec::Convolution { .. } | LayerSpec::Dense { .. })
    }

    /// The declared activation, if this kind of layer has one.
    pub fn activation(&self) -> Option<Activation> {
        match self {
            LayerSpec::Convolution { activation, .. } | LayerSpec::Dense { activation, .. } => {
                Some(*activation)
            }
            _ => None,
        }
    }

    /// Infer the shape this layer produces from `input`.
    pub fn output_shape(&self, input: Shape) -> Result<Shape, ShapeError> {
        match *self {
            LayerSpec::Convolution { filters, kernel_size, .. } => {
                let (height, width, _) = expect_spatial("convolution", input)?;
                if filters == 0 {
                    return Err(ShapeError::ZeroSized { what: "convolution filters" });
                }
                let [kh, kw] = kernel_size;
                if kh == 0 || kw == 0 {
                    return Err(ShapeError::ZeroSized { what: "kernel size" });
                }
                if kh > height || kw > width {
                    return Err(ShapeError::KernelTooLarge { kernel: kernel_size, input });
                }
                // Valid padding, stride 1
                Ok(Shape::spatial(height - kh + 1, width - kw + 1, filters))
            }

            LayerSpec::Pooling { pool_size } => {
                let (height, width, channels) = expect_spatial("pooling", input)?;
                let [ph, pw] = pool_size;
                if ph == 0 || pw == 0 {
                    return Err(ShapeError::ZeroSized { what: "pool size" });
                }
                if ph > height || pw > width {
                    return Err(ShapeError::PoolTooLarge { pool: pool_size, input });
                }
                Ok(Shape::spatial(height / ph, width / pw, channels))
            }

            LayerSpec::Flatten => {
                expect_spatial("flatten", input)?;
                Ok(Shape::flat(input.elements()?))
            }

            LayerSpec::Dense { units, .. } => {
                if input.is_spatial() {
                    return Err(ShapeError::ExpectedFlat { layer: "dense", input });
                }
                if units == 0 {
                    return Err(ShapeError::ZeroSized { what: "dense units" });
                }
                Ok(Shape::flat(units))
            }

            LayerSpec::Dropout { rate } => {
                // Also rejects NaN
                if !(0.0..1.0).contains(&rate) {
                    return Err(ShapeError::InvalidDropout { rate });
                }
                Ok(input)
            }
        }
    }

    /// Learned parameter count (weights + biases) for the given input.
    ///
    /// Assumes `input` has already been accepted by [`LayerSpec::output_shape`].
    pub fn param_count(&self, input: Shape) -> Result<usize, ShapeError> {
        let count = match (self, input) {
            (
                LayerSpec::Convolution { filters, kernel_size: [kh, kw], .. },
                Shape::Spatial { channels, .. },
            ) => kh
                .checked_mul(*kw)
                .and_then(|n| n.checked_mul(channels))
                .and_then(|n| n.checked_mul(*filters))
                .and_then(|n| n.checked_add(*filters)),
            (LayerSpec::Dense { units, .. }, Shape::Flat { features }) => features
                .checked_mul(*units)
                .and_then(|n| n.checked_add(*units)),
            _ => Some(0),
        };
        count.ok_or(ShapeError::TooLarge { what: "parameter count", input })
    }
}

fn expect_spatial(layer: &'static str, input: Shape) -> Result<(usize, usize, usize), ShapeError> {
    match input {
        Shape::Spatial { height, width, channels } => Ok((height, width, channels)),
        Shape::Flat { .. } => Err(ShapeError::ExpectedSpatial { layer, input }),
    }
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_convolution_shrinks_by_kernel() {
        let conv = LayerSpec::convolution(32, [3, 3], Activation::Relu);
        let out  = conv.output_shape(Shape::spatial(30, 30, 3)).unwrap();
        assert_eq!(out, Shape::spatial(28, 28, 32));
        assert_eq!(conv.param_count(Shape::spatial(30, 30, 3)), Ok(896));
    }

    #[test]
    fn test_pooling_floors_odd_sizes() {
        let pool = LayerSpec::pooling([2, 2]);
        let out  = pool.output_shape(Shape::spatial(13, 13, 64)).unwrap();
        assert_eq!(out, Shape::spatial(6, 6, 64));
        assert_eq!(pool.param_count(Shape::spatial(13, 13, 64)), Ok(0));
    }

    #[test]
    fn test_flatten_multiplies_dimensions() {
        let out = LayerSpec::Flatten.output_shape(Shape::spatial(6, 6, 64)).unwrap();
        assert_eq!(out, Shape::flat(2304));
    }

    #[test]
    fn test_flatten_overflow_is_rejected() {
        let err = LayerSpec::Flatten
            .output_shape(Shape::spatial(1 << 32, 1 << 32, 2))
            .unwrap_err();
        assert!(matches!(err, ShapeError::TooLarge { what: "element count", .. }));
    }

    #[test]
    fn test_param_count_overflow_is_rejected() {
        let dense = LayerSpec::dense(4, Activation::Linear);
        let err   = dense.param_count(Shape::flat(usize::MAX / 2)).unwrap_err();
        assert!(matches!(err, ShapeError::TooLarge { what: "parameter count", .. }));
        assert_eq!(dense.param_count(Shape::flat(10)), Ok(44));
    }

    #[test]
    fn test_dense_rejects_spatial_input() {
        let dense = LayerSpec::dense(128, Activation::Relu);
        let err   = dense.output_shape(Shape::spatial(6, 6, 64)).unwrap_err();
        assert!(matches!(err, ShapeError::ExpectedFlat { layer: "dense", .. }));
    }

    #[test]
    fn test_convolution_rejects_flat_input() {
        let conv = LayerSpec::convolution(8, [3, 3], Activation::Relu);
        let err  = conv.output_shape(Shape::flat(10)).unwrap_err();
        assert!(matches!(err, ShapeError::ExpectedSpatial { layer: "convolution", .. }));
    }

    #[test]
    fn test_kernel_larger_than_input() {
        let conv = LayerSpec::convolution(8, [5, 5], Activation::Relu);
        let err  = conv.output_shape(Shape::spatial(4, 4, 1)).unwrap_err();
        assert!(matches!(err, ShapeError::KernelTooLarge { .. }));
    }

    #[test]
    fn test_pool_larger_than_input() {
        let err = LayerSpec::pooling([3, 3]).output_shape(Shape::spatial(2, 2, 4)).unwrap_err();
        assert!(matches!(err, ShapeError::PoolTooLarge { .. }));
    }

    #[test]
    fn test_zero_sized_parameters() {
        let err = LayerSpec::dense(0, Activation::Relu).output_shape(Shape::flat(4)).unwrap_err();
        assert_eq!(err, ShapeError::ZeroSized { what: "dense units" });

        let err = LayerSpec::pooling([0, 2]).output_shape(Shape::spatial(4, 4, 1)).unwrap_err();
        assert_eq!(err, ShapeError::ZeroSized { what: "pool size" });
    }

    #[test]
    fn test_dropout_rate_bounds() {
        let input = Shape::flat(128);
        assert_eq!(LayerSpec::dropout(0.0).output_shape(input).unwrap(), input);
        assert_eq!(LayerSpec::dropout(0.5).output_shape(input).unwrap(), input);
        assert!(LayerSpec::dropout(1.0).output_shape(input).is_err());
        assert!(LayerSpec::dropout(-0.1).output_shape(input).is_err());
        assert!(LayerSpec::dropout(f64::NAN).output_shape(input).is_err());
    }

    #[test]
    fn test_describe_and_kind() {
        let conv = LayerSpec::convolution(64, [3, 3], Activation::Relu);
        assert_eq!(conv.describe(), "conv 64 3x3 relu");
        assert_eq!(conv.kind(), "convolution");
        assert!(conv.is_trainable());
        assert!(!LayerSpec::Flatten.is_trainable());
        assert_eq!(LayerSpec::dense(43, Activation::Softmax).describe(), "dense 43 softmax");
    }

    #[test]
    fn test_json_activation_defaults_to_linear() {
        let layer: LayerSpec = serde_json::from_str(r#"{"kind":"dense","units":10}"#).unwrap();
        assert_eq!(layer, LayerSpec::dense(10, Activation::Linear));

        let flatten: LayerSpec = serde_json::from_str(r#"{"kind":"flatten"}"#).unwrap();
        assert_eq!(flatten, LayerSpec::Flatten);
    }
}
