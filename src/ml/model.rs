use burn::{
    config::Config,
    module::{Ignored, Module},
    nn::{
        conv::{Conv2d, Conv2dConfig},
        pool::{MaxPool2d, MaxPool2dConfig},
        Dropout, DropoutConfig,
        Linear, LinearConfig,
    },
    tensor::{activation, backend::Backend, Tensor},
};

use crate::domain::layer::{Activation, LayerSpec};
use crate::domain::model_config::{ConfigError, ModelConfiguration};
use crate::domain::shape::Shape;

// NOTE: #[derive(Config)] already generates Clone and Serialize/Deserialize
// internally — do NOT add them again or you get conflicting impls.
#[derive(Config, Debug)]
pub struct CnnClassifierConfig {
    pub configuration: ModelConfiguration,
}

impl CnnClassifierConfig {
    /// Validate the layer stack and build the burn module for it.
    pub fn init<B: Backend>(&self, device: &B::Device) -> Result<CnnClassifier<B>, ConfigError> {
        let trace = self.configuration.validate()?;

        let mut features   = Vec::new();
        let mut classifier = Vec::new();

        for row in &trace.rows {
            match (&row.layer, row.input) {
                (
                    LayerSpec::Convolution { filters, kernel_size, activation },
                    Shape::Spatial { channels, .. },
                ) => {
                    // Valid padding and unit stride are the Conv2dConfig defaults
                    let conv = Conv2dConfig::new([channels, *filters], *kernel_size).init(device);
                    features.push(FeatureLayer::conv(conv, *activation));
                }
                (LayerSpec::Pooling { pool_size }, _) => {
                    let pool = MaxPool2dConfig::new(*pool_size).init();
                    features.push(FeatureLayer::pool(pool));
                }
                (LayerSpec::Dropout { rate }, Shape::Spatial { .. }) => {
                    features.push(FeatureLayer::dropout(DropoutConfig::new(*rate).init()));
                }
                (LayerSpec::Dropout { rate }, Shape::Flat { .. }) => {
                    classifier.push(ClassifierLayer::dropout(DropoutConfig::new(*rate).init()));
                }
                (LayerSpec::Dense { units, activation }, Shape::Flat { features: inputs }) => {
                    let dense = LinearConfig::new(inputs, *units).init(device);
                    classifier.push(ClassifierLayer::dense(dense, *activation));
                }
                // Flatten is the boundary between the two stacks
                (LayerSpec::Flatten, _) => {}
                // validate() rejects every other pairing
                _ => unreachable!("layer {} accepted an incompatible input", row.index),
            }
        }

        tracing::debug!(
            "Built '{}': {} feature layers, {} classifier layers",
            self.configuration.name,
            features.len(),
            classifier.len()
        );
        Ok(CnnClassifier { features, classifier })
    }
}

/// A layer operating on `[batch, channels, height, width]`.
/// Exactly one of `conv`, `pool`, `dropout` is set.
#[derive(Module, Debug)]
pub struct FeatureLayer<B: Backend> {
    pub conv:       Option<Conv2d<B>>,
    pub pool:       Option<MaxPool2d>,
    pub dropout:    Option<Dropout>,
    pub activation: Ignored<Activation>,
}

impl<B: Backend> FeatureLayer<B> {
    fn conv(conv: Conv2d<B>, activation: Activation) -> Self {
        Self { conv: Some(conv), pool: None, dropout: None, activation: Ignored(activation) }
    }

    fn pool(pool: MaxPool2d) -> Self {
        Self { conv: None, pool: Some(pool), dropout: None, activation: Ignored(Activation::Linear) }
    }

    fn dropout(dropout: Dropout) -> Self {
        Self { conv: None, pool: None, dropout: Some(dropout), activation: Ignored(Activation::Linear) }
    }

    pub fn forward(&self, x: Tensor<B, 4>) -> Tensor<B, 4> {
        let x = match (&self.conv, &self.pool, &self.dropout) {
            (Some(conv), _, _)    => conv.forward(x),
            (_, Some(pool), _)    => pool.forward(x),
            (_, _, Some(dropout)) => dropout.forward(x),
            _                     => x,
        };
        apply_activation(*self.activation, x)
    }
}

/// A layer operating on `[batch, features]`.
/// Exactly one of `dense`, `dropout` is set.
#[derive(Module, Debug)]
pub struct ClassifierLayer<B: Backend> {
    pub dense:      Option<Linear<B>>,
    pub dropout:    Option<Dropout>,
    pub activation: Ignored<Activation>,
}

impl<B: Backend> ClassifierLayer<B> {
    fn dense(dense: Linear<B>, activation: Activation) -> Self {
        Self { dense: Some(dense), dropout: None, activation: Ignored(activation) }
    }

    fn dropout(dropout: Dropout) -> Self {
        Self { dense: None, dropout: Some(dropout), activation: Ignored(Activation::Linear) }
    }

    pub fn forward(&self, x: Tensor<B, 2>) -> Tensor<B, 2> {
        let x = match (&self.dense, &self.dropout) {
            (Some(dense), _)   => dense.forward(x),
            (_, Some(dropout)) => dropout.forward(x),
            _                  => x,
        };
        apply_activation(*self.activation, x)
    }
}

#[derive(Module, Debug)]
pub struct CnnClassifier<B: Backend> {
    pub features:   Vec<FeatureLayer<B>>,
    pub classifier: Vec<ClassifierLayer<B>>,
}

impl<B: Backend> CnnClassifier<B> {
    /// images: [batch, channels, height, width] → [batch, categories]
    ///
    /// Every declared activation is applied, so a stack ending in softmax
    /// returns one probability distribution per row.
    pub fn forward(&self, images: Tensor<B, 4>) -> Tensor<B, 2> {
        let mut x = images;
        for layer in &self.features {
            x = layer.forward(x);
        }

        // Channel-last flatten, matching the HxWxC order of the declared shapes
        let mut x = x.permute([0, 2, 3, 1]).flatten::<2>(1, 3);

        for layer in &self.classifier {
            x = layer.forward(x);
        }
        x
    }
}

fn apply_activation<B: Backend, const D: usize>(act: Activation, x: Tensor<B, D>) -> Tensor<B, D> {
    match act {
        Activation::Linear  => x,
        Activation::Relu    => activation::relu(x),
        Activation::Sigmoid => activation::sigmoid(x),
        Activation::Tanh    => activation::tanh(x),
        Activation::Softmax => activation::softmax(x, D - 1),
    }
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;
    use burn::backend::NdArray;
    use burn::module::Param;
    use burn::tensor::TensorData;

    type TestBackend = NdArray;

    fn build(configuration: ModelConfiguration) -> CnnClassifier<TestBackend> {
        CnnClassifierConfig::new(configuration)
            .init::<TestBackend>(&Default::default())
            .unwrap()
    }

    #[test]
    fn test_base_model_layout() {
        let model = build(ModelConfiguration::base());
        // conv, pool, conv, pool | dense, dropout, dense
        assert_eq!(model.features.len(), 4);
        assert_eq!(model.classifier.len(), 3);
    }

    #[test]
    fn test_param_count_matches_trace() {
        let configuration = ModelConfiguration::base();
        let expected      = configuration.validate().unwrap().total_params();
        let model         = build(configuration);
        assert_eq!(model.num_params(), expected);
    }

    #[test]
    fn test_forward_output_is_distribution() {
        let model  = build(ModelConfiguration::base());
        let device = Default::default();
        let images = Tensor::<TestBackend, 4>::ones([2, 3, 30, 30], &device);

        let output = model.forward(images);
        assert_eq!(output.dims(), [2, 43]);

        let sums: Vec<f32> = output.sum_dim(1).into_data().to_vec::<f32>().unwrap();
        for sum in sums {
            assert!((sum - 1.0).abs() < 1e-4, "row sums to {sum}");
        }
    }

    #[test]
    fn test_invalid_configuration_is_rejected() {
        let configuration = ModelConfiguration::new("bad", Shape::spatial(8, 8, 1), 4)
            .with_layer(LayerSpec::dense(4, Activation::Softmax));
        let result = CnnClassifierConfig::new(configuration).init::<TestBackend>(&Default::default());
        assert!(matches!(result, Err(ConfigError::Layer { index: 0, .. })));
    }

    #[test]
    fn test_linear_head_passes_logits_through() {
        let configuration = ModelConfiguration::new("logits", Shape::spatial(4, 4, 1), 3)
            .with_layer(LayerSpec::Flatten)
            .with_layer(LayerSpec::dense(3, Activation::Linear));
        let model  = build(configuration);
        let output = model.forward(Tensor::<TestBackend, 4>::zeros([1, 1, 4, 4], &Default::default()));
        assert_eq!(output.dims(), [1, 3]);
    }

    #[test]
    fn test_flatten_is_channel_last() {
        let configuration = ModelConfiguration::new("order", Shape::spatial(2, 2, 2), 8)
            .with_layer(LayerSpec::Flatten)
            .with_layer(LayerSpec::dense(8, Activation::Linear));
        let mut model = build(configuration);
        let device    = Default::default();

        // Identity weights, no bias: the dense output is the flattened input
        let mut eye = vec![0.0f32; 64];
        for i in 0..8 {
            eye[i * 8 + i] = 1.0;
        }
        let dense = model.classifier[0].dense.as_mut().unwrap();
        dense.weight = Param::from_tensor(Tensor::from_data(TensorData::new(eye, [8, 8]), &device));
        dense.bias   = None;

        // value = 100 * channel + 10 * row + column, laid out [batch, channel, row, column]
        let pixels = vec![0.0f32, 1.0, 10.0, 11.0, 100.0, 101.0, 110.0, 111.0];
        let images = Tensor::<TestBackend, 4>::from_data(TensorData::new(pixels, [1, 2, 2, 2]), &device);

        let flat: Vec<f32> = model.forward(images).into_data().to_vec::<f32>().unwrap();
        assert_eq!(flat, vec![0.0, 100.0, 1.0, 101.0, 10.0, 110.0, 11.0, 111.0]);
    }

    #[test]
    fn test_dropout_between_convolutions() {
        let configuration = ModelConfiguration::new("spatial-dropout", Shape::spatial(8, 8, 1), 3)
            .with_layer(LayerSpec::convolution(4, [3, 3], Activation::Tanh))
            .with_layer(LayerSpec::dropout(0.25))
            .with_layer(LayerSpec::convolution(4, [3, 3], Activation::Sigmoid))
            .with_layer(LayerSpec::pooling([2, 2]))
            .with_layer(LayerSpec::Flatten)
            .with_layer(LayerSpec::dense(3, Activation::Softmax));
        let model = build(configuration);

        assert_eq!(model.features.len(), 4);
        assert!(model.features[1].dropout.is_some());
        assert_eq!(model.classifier.len(), 1);

        let images = Tensor::<TestBackend, 4>::ones([2, 1, 8, 8], &Default::default());
        let output = model.forward(images);
        assert_eq!(output.dims(), [2, 3]);

        let sums: Vec<f32> = output.sum_dim(1).into_data().to_vec::<f32>().unwrap();
        for sum in sums {
            assert!((sum - 1.0).abs() < 1e-4, "row sums to {sum}");
        }
    }

    #[test]
    fn test_sigmoid_and_tanh_activations() {
        let device = Default::default();
        let x = Tensor::<TestBackend, 2>::from_data(TensorData::new(vec![0.0f32, 2.0], [1, 2]), &device);

        let sigmoid: Vec<f32> = apply_activation(Activation::Sigmoid, x.clone())
            .into_data()
            .to_vec::<f32>()
            .unwrap();
        assert!((sigmoid[0] - 0.5).abs() < 1e-6);
        assert!((sigmoid[1] - 0.880_797).abs() < 1e-5);

        let tanh: Vec<f32> = apply_activation(Activation::Tanh, x)
            .into_data()
            .to_vec::<f32>()
            .unwrap();
        assert!(tanh[0].abs() < 1e-6);
        assert!((tanh[1] - 0.964_028).abs() < 1e-5);
    }
}
