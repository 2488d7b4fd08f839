// ============================================================
// Layer 3 — Model Configuration
// ============================================================
// The ordered layer stack plus the input shape and category
// count it is meant for. Authored once (in code or as JSON),
// validated, then handed to the ml layer.
//
// Invariant: every layer must accept the shape its predecessor
// produces, the stack must end flat, and the last layer must be
// a dense layer with one unit per category. validate() walks the
// stack once and either returns the full ShapeTrace or the first
// violation.

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::layer::{Activation, LayerSpec};
use crate::domain::shape::{Shape, ShapeError};

/// Image side length of the traffic-sign dataset
pub const IMG_SIZE: usize = 30;
/// RGB
pub const IMG_CHANNELS: usize = 3;
/// Number of traffic-sign categories
pub const NUM_CATEGORIES: usize = 43;

// ─── CompileSettings ──────────────────────────────────────────────────────────
/// How the stack was compiled and trained when its metrics were recorded.
/// Descriptive only: nothing in this crate trains a model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompileSettings {
    pub optimizer:  String,
    pub loss:       String,
    pub metrics:    Vec<String>,
    pub epochs:     usize,
    /// Fraction of the data held out for evaluation
    pub test_split: f64,
}

impl Default for CompileSettings {
    fn default() -> Self {
        Self {
            optimizer:  "adam".to_string(),
            loss:       "categorical_crossentropy".to_string(),
            metrics:    vec!["accuracy".to_string()],
            epochs:     10,
            test_split: 0.4,
        }
    }
}

// ─── ConfigError ──────────────────────────────────────────────────────────────
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    #[error("the layer stack is empty")]
    EmptyStack,

    #[error("model input must be spatial (HxWxC), got {0}")]
    InputNotSpatial(Shape),

    #[error("layer {index} ({kind}) rejected its input")]
    Layer {
        index:  usize,
        kind:   &'static str,
        #[source]
        source: ShapeError,
    },

    #[error("the stack ends with spatial output {0}; a classifier must end flat")]
    SpatialOutput(Shape),

    #[error("the final layer must be dense, found {0}")]
    FinalLayerNotDense(&'static str),

    #[error("softmax is only allowed on the final layer, found it on layer {index}")]
    SoftmaxNotFinal { index: usize },

    #[error("final layer has {units} units but the model declares {categories} categories")]
    CategoryMismatch { units: usize, categories: usize },
}

// ─── ModelConfiguration ───────────────────────────────────────────────────────
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelConfiguration {
    pub name:       String,
    /// Shape of one input image
    pub input:      Shape,
    /// Number of output categories
    pub categories: usize,
    pub layers:     Vec<LayerSpec>,
    #[serde(default)]
    pub compile:    CompileSettings,
}

impl ModelConfiguration {
    /// Start an empty stack for the given input and category count.
    pub fn new(name: impl Into<String>, input: Shape, categories: usize) -> Self {
        Self {
            name: name.into(),
            input,
            categories,
            layers: Vec::new(),
            compile: CompileSettings::default(),
        }
    }

    pub fn with_layer(mut self, layer: LayerSpec) -> Self {
        self.layers.push(layer);
        self
    }

    /// The base architecture: two convolution/pooling stages, a 128-unit
    /// hidden layer with dropout, and a softmax output over 43 categories.
    pub fn base() -> Self {
        Self::new(
            "base",
            Shape::spatial(IMG_SIZE, IMG_SIZE, IMG_CHANNELS),
            NUM_CATEGORIES,
        )
        .with_layer(LayerSpec::convolution(32, [3, 3], Activation::Relu))
        .with_layer(LayerSpec::pooling([2, 2]))
        .with_layer(LayerSpec::convolution(64, [3, 3], Activation::Relu))
        .with_layer(LayerSpec::pooling([2, 2]))
        .with_layer(LayerSpec::Flatten)
        .with_layer(LayerSpec::dense(128, Activation::Relu))
        .with_layer(LayerSpec::dropout(0.5))
        .with_layer(LayerSpec::dense(NUM_CATEGORIES, Activation::Softmax))
    }

    /// Walk the stack, inferring every intermediate shape.
    pub fn validate(&self) -> Result<ShapeTrace, ConfigError> {
        if !self.input.is_spatial() {
            return Err(ConfigError::InputNotSpatial(self.input));
        }
        let last_index = self.layers.len().checked_sub(1).ok_or(ConfigError::EmptyStack)?;

        let mut rows  = Vec::with_capacity(self.layers.len());
        let mut shape = self.input;
        let mut total = 0usize;

        for (index, layer) in self.layers.iter().enumerate() {
            if layer.activation() == Some(Activation::Softmax) && index != last_index {
                return Err(ConfigError::SoftmaxNotFinal { index });
            }

            let rejected = |source: ShapeError| ConfigError::Layer { index, kind: layer.kind(), source };
            let output   = layer.output_shape(shape).map_err(rejected)?;
            let params   = layer.param_count(shape).map_err(rejected)?;

            // Keeps ShapeTrace::total_params from overflowing
            total = total
                .checked_add(params)
                .ok_or(ShapeError::TooLarge { what: "total parameter count", input: shape })
                .map_err(rejected)?;

            rows.push(TraceRow {
                index,
                layer:  layer.clone(),
                input:  shape,
                output,
                params,
            });
            shape = output;
        }

        if shape.is_spatial() {
            return Err(ConfigError::SpatialOutput(shape));
        }
        match &self.layers[last_index] {
            LayerSpec::Dense { units, .. } if *units != self.categories => {
                return Err(ConfigError::CategoryMismatch {
                    units:      *units,
                    categories: self.categories,
                });
            }
            LayerSpec::Dense { .. } => {}
            other => return Err(ConfigError::FinalLayerNotDense(other.kind())),
        }

        tracing::debug!(
            "Validated '{}': {} layers, output {}",
            self.name,
            rows.len(),
            shape
        );
        Ok(ShapeTrace { input: self.input, rows })
    }

    /// Number of convolution layers in the stack.
    pub fn conv_stages(&self) -> usize {
        self.layers
            .iter()
            .filter(|l| matches!(l, LayerSpec::Convolution { .. }))
            .count()
    }

    /// Dense layers other than the output layer.
    pub fn dense_hidden_layers(&self) -> usize {
        let dense = self
            .layers
            .iter()
            .filter(|l| matches!(l, LayerSpec::Dense { .. }))
            .count();
        dense.saturating_sub(1)
    }

    pub fn dropout_rates(&self) -> Vec<f64> {
        self.layers
            .iter()
            .filter_map(|l| match l {
                LayerSpec::Dropout { rate } => Some(*rate),
                _ => None,
            })
            .collect()
    }
}

// ─── ShapeTrace ───────────────────────────────────────────────────────────────
/// One validated layer with the shapes around it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TraceRow {
    pub index:  usize,
    pub layer:  LayerSpec,
    pub input:  Shape,
    pub output: Shape,
    pub params: usize,
}

/// Result of a successful validation.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ShapeTrace {
    pub input: Shape,
    pub rows:  Vec<TraceRow>,
}

impl ShapeTrace {
    /// Shape leaving the final layer.
    pub fn output(&self) -> Shape {
        self.rows.last().map(|r| r.output).unwrap_or(self.input)
    }

    pub fn total_params(&self) -> usize {
        self.rows.iter().map(|r| r.params).sum()
    }
}

impl fmt::Display for ShapeTrace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{:>3}  {:<22} {:>10}  {:>10}  {:>9}", "#", "layer", "input", "output", "params")?;
        for row in &self.rows {
            writeln!(
                f,
                "{:>3}  {:<22} {:>10}  {:>10}  {:>9}",
                row.index + 1,
                row.layer.describe(),
                row.input.to_string(),
                row.output.to_string(),
                row.params,
            )?;
        }
        write!(f, "total params: {}", self.total_params())
    }
}
