// ============================================================
// Layer 5 — Forward-Pass Probe
// ============================================================
// Builds the classifier for a configuration and pushes one
// seeded synthetic batch through it. No dataset is involved:
// pixels are uniform in [0, 1), the range of normalised images.
//
// What the report tells you:
//   - the output shape burn actually produced
//   - whether each row is a probability distribution
//     (checked only when the final activation is softmax)
//   - the argmax category per row
//   - the learned parameter count burn reports
use anyhow::{anyhow, Result};
use burn::{
    module::Module,
    tensor::{backend::Backend, Tensor, TensorData},
};
use rand::{rngs::StdRng, Rng, SeedableRng};
use serde::Serialize;

use crate::domain::layer::Activation;
use crate::domain::model_config::ModelConfiguration;
use crate::domain::shape::Shape;
use crate::ml::model::CnnClassifierConfig;

#[cfg(not(feature = "wgpu"))]
type ProbeBackend = burn::backend::NdArray;
#[cfg(feature = "wgpu")]
type ProbeBackend = burn::backend::Wgpu;

/// Largest allowed deviation of a softmax row sum from 1
const SUM_TOLERANCE: f32 = 1e-4;

#[derive(Debug, Clone, Serialize)]
pub struct ProbeReport {
    pub batch_size:      usize,
    /// [batch, categories] as returned by the forward pass
    pub output_dims:     [usize; 2],
    pub row_sums:        Vec<f32>,
    pub predictions:     Vec<usize>,
    /// None when the final layer is not softmax
    pub is_distribution: Option<bool>,
    pub num_params:      usize,
}

/// Run one forward pass of `configuration` on the default probe backend.
pub fn run_probe(configuration: &ModelConfiguration, batch_size: usize, seed: u64) -> Result<ProbeReport> {
    let device: <ProbeBackend as Backend>::Device = Default::default();
    tracing::info!("Probing '{}' on {:?}", configuration.name, device);
    probe_on::<ProbeBackend>(configuration, batch_size, seed, &device)
}

fn probe_on<B: Backend>(
    configuration: &ModelConfiguration,
    batch_size:    usize,
    seed:          u64,
    device:        &B::Device,
) -> Result<ProbeReport> {
    if batch_size == 0 {
        return Err(anyhow!("batch size must be at least 1"));
    }

    let model = CnnClassifierConfig::new(configuration.clone()).init::<B>(device)?;
    let num_params = model.num_params();

    let images = synthetic_batch::<B>(configuration.input, batch_size, seed, device)?;
    let output = model.forward(images);
    let output_dims = output.dims();

    let values: Vec<f32> = output
        .into_data()
        .to_vec::<f32>()
        .map_err(|e| anyhow!("Cannot read probe output: {e:?}"))?;

    let width = output_dims[1];
    let rows: Vec<&[f32]> = values.chunks(width.max(1)).collect();
    let row_sums: Vec<f32> = rows.iter().map(|row| row.iter().sum()).collect();
    let predictions: Vec<usize> = rows.iter().map(|row| argmax(row)).collect();

    let final_softmax = configuration
        .layers
        .last()
        .and_then(|l| l.activation())
        == Some(Activation::Softmax);
    let is_distribution = final_softmax.then(|| {
        row_sums.iter().all(|s| (s - 1.0).abs() < SUM_TOLERANCE)
    });

    tracing::debug!("Probe output {:?}, row sums {:?}", output_dims, row_sums);
    if is_distribution == Some(false) {
        tracing::warn!("Softmax output rows do not sum to 1: {:?}", row_sums);
    }

    Ok(ProbeReport {
        batch_size,
        output_dims,
        row_sums,
        predictions,
        is_distribution,
        num_params,
    })
}

/// Uniform [0, 1) pixels laid out as [batch, channels, height, width].
fn synthetic_batch<B: Backend>(
    input:      Shape,
    batch_size: usize,
    seed:       u64,
    device:     &B::Device,
) -> Result<Tensor<B, 4>> {
    let Shape::Spatial { height, width, channels } = input else {
        return Err(anyhow!("probe needs a spatial input shape, got {input}"));
    };

    let len = input
        .elements()?
        .checked_mul(batch_size)
        .ok_or_else(|| anyhow!("a batch of {batch_size} x {input} does not fit in memory"))?;

    let mut rng = StdRng::seed_from_u64(seed);
    let pixels: Vec<f32> = (0..len).map(|_| rng.gen::<f32>()).collect();

    let data = TensorData::new(pixels, [batch_size, channels, height, width]);
    Ok(Tensor::<B, 4>::from_data(data, device))
}

fn argmax(row: &[f32]) -> usize {
    row.iter()
        .enumerate()
        .max_by(|(_, a), (_, b)| a.total_cmp(b))
        .map(|(i, _)| i)
        .unwrap_or(0)
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::layer::LayerSpec;
    use crate::domain::model_config::ConfigError;
    use burn::backend::NdArray;

    fn probe(configuration: &ModelConfiguration, batch: usize, seed: u64) -> Result<ProbeReport> {
        probe_on::<NdArray>(configuration, batch, seed, &Default::default())
    }

    #[test]
    fn test_base_probe_report() {
        let report = probe(&ModelConfiguration::base(), 4, 7).unwrap();
        assert_eq!(report.output_dims, [4, 43]);
        assert_eq!(report.predictions.len(), 4);
        assert!(report.predictions.iter().all(|&p| p < 43));
        assert_eq!(report.is_distribution, Some(true));
        assert_eq!(report.num_params, 319_979);
    }

    #[test]
    fn test_non_softmax_head_is_not_checked() {
        let configuration = ModelConfiguration::new("logits", Shape::spatial(6, 6, 1), 5)
            .with_layer(LayerSpec::Flatten)
            .with_layer(LayerSpec::dense(5, Activation::Linear));
        let report = probe(&configuration, 2, 1).unwrap();
        assert_eq!(report.output_dims, [2, 5]);
        assert_eq!(report.is_distribution, None);
    }

    #[test]
    fn test_zero_batch_rejected() {
        assert!(probe(&ModelConfiguration::base(), 0, 1).is_err());
    }

    #[test]
    fn test_invalid_configuration_propagates() {
        let configuration = ModelConfiguration::new("no-layers", Shape::spatial(6, 6, 1), 5);
        let err = probe(&configuration, 1, 1).unwrap_err();
        assert_eq!(err.downcast_ref::<ConfigError>(), Some(&ConfigError::EmptyStack));
    }

    #[test]
    fn test_oversized_batch_is_an_error() {
        let err = synthetic_batch::<NdArray>(
            Shape::spatial(1 << 20, 1 << 20, 1),
            1 << 30,
            1,
            &Default::default(),
        )
        .unwrap_err();
        assert!(err.to_string().contains("does not fit"));
    }

    #[test]
    fn test_argmax_picks_largest() {
        assert_eq!(argmax(&[0.1, 0.7, 0.2]), 1);
        assert_eq!(argmax(&[]), 0);
    }
}
