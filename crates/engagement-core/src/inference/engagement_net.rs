//! Student engagement CNN.
//!
//! A compact convolutional classifier over 224x224 RGB frames that predicts
//! one of six engagement states. Weights come from a safetensors export of the
//! trained model; this module only defines the architecture and forward pass.

use anyhow::{Context, Result};
use candle_core::{Device, Module, Tensor, D};
use candle_nn::{conv2d, linear, ops, Conv2d, Conv2dConfig, Linear, VarBuilder};

use crate::domain::{ClassProbabilities, ImageTensor, CLASS_COUNT, INPUT_SHAPE};
use crate::ports::Classifier;

/// Output channels of each convolution block.
const CONV_CHANNELS: [usize; 4] = [32, 64, 128, 128];

/// Width of the hidden fully connected layer.
const HIDDEN_UNITS: usize = 128;

/// Convolution kernel size.
const KERNEL: usize = 3;

/// Names and shapes of every parameter the model loads.
///
/// Convolution weights are `(out, in, k, k)`, linear weights `(out, in)`.
#[must_use]
pub fn parameter_shapes() -> Vec<(String, Vec<usize>)> {
    let mut shapes = Vec::new();
    let mut in_channels = INPUT_SHAPE[2];
    for (i, out_channels) in CONV_CHANNELS.iter().enumerate() {
        let name = format!("conv{}", i + 1);
        shapes.push((
            format!("{name}.weight"),
            vec![*out_channels, in_channels, KERNEL, KERNEL],
        ));
        shapes.push((format!("{name}.bias"), vec![*out_channels]));
        in_channels = *out_channels;
    }
    shapes.push(("fc1.weight".to_string(), vec![HIDDEN_UNITS, in_channels]));
    shapes.push(("fc1.bias".to_string(), vec![HIDDEN_UNITS]));
    shapes.push(("fc2.weight".to_string(), vec![CLASS_COUNT, HIDDEN_UNITS]));
    shapes.push(("fc2.bias".to_string(), vec![CLASS_COUNT]));
    shapes
}

/// Engagement classifier network.
///
/// Architecture: 4 blocks of 3x3 conv + ReLU + 2x2 max pool, global average
/// pool, then 2 FC layers and a softmax.
/// Input: `(1, 224, 224, 3)` NHWC in `[0, 1]`
/// Output: `(1, 6)` class probabilities
pub struct EngagementNet {
    convs: Vec<Conv2d>,
    fc1: Linear,
    fc2: Linear,
    device: Device,
}

impl EngagementNet {
    /// Builds the network from weights.
    ///
    /// # Errors
    ///
    /// Returns an error if a parameter is missing or has the wrong shape.
    #[allow(clippy::needless_pass_by_value)]
    pub fn new(vb: VarBuilder) -> Result<Self> {
        let device = vb.device().clone();
        let config = Conv2dConfig {
            padding: 1,
            ..Conv2dConfig::default()
        };

        let mut convs = Vec::with_capacity(CONV_CHANNELS.len());
        let mut in_channels = INPUT_SHAPE[2];
        for (i, out_channels) in CONV_CHANNELS.iter().enumerate() {
            let name = format!("conv{}", i + 1);
            let conv = conv2d(in_channels, *out_channels, KERNEL, config, vb.pp(&name))
                .with_context(|| format!("Failed to load {name}"))?;
            convs.push(conv);
            in_channels = *out_channels;
        }

        // 224 -> 112 -> 56 -> 28 -> 14, then averaged to a single vector
        let fc1 = linear(in_channels, HIDDEN_UNITS, vb.pp("fc1")).context("Failed to load fc1")?;
        let fc2 = linear(HIDDEN_UNITS, CLASS_COUNT, vb.pp("fc2")).context("Failed to load fc2")?;

        Ok(Self {
            convs,
            fc1,
            fc2,
            device,
        })
    }

    /// Device the weights live on.
    #[must_use]
    pub const fn device(&self) -> &Device {
        &self.device
    }

    /// Copies a normalized image onto the model device.
    ///
    /// # Errors
    ///
    /// Returns an error if tensor creation fails.
    pub fn to_input(&self, image: &ImageTensor) -> Result<Tensor> {
        let [n, h, w, c] = image.shape();
        Tensor::from_slice(image.as_slice(), (n, h, w, c), &self.device)
            .context("Failed to create input tensor")
    }
}

impl Module for EngagementNet {
    fn forward(&self, x: &Tensor) -> candle_core::Result<Tensor> {
        // NHWC -> NCHW
        let mut x = x.permute((0, 3, 1, 2))?.contiguous()?;

        for conv in &self.convs {
            x = conv.forward(&x)?.relu()?.max_pool2d(2)?;
        }

        // Global average pool over H and W
        let x = x.mean(D::Minus1)?.mean(D::Minus1)?;

        let x = self.fc1.forward(&x)?.relu()?;
        let logits = self.fc2.forward(&x)?;
        ops::softmax_last_dim(&logits)
    }
}

impl Classifier for EngagementNet {
    fn input_shape(&self) -> [usize; 3] {
        INPUT_SHAPE
    }

    fn predict(&self, input: &ImageTensor) -> Result<ClassProbabilities> {
        let x = self.to_input(input)?;
        let probs = self
            .forward(&x)
            .context("Forward pass failed")?
            .squeeze(0)?
            .to_vec1::<f32>()?;
        ClassProbabilities::from_slice(&probs).with_context(|| {
            format!(
                "Model produced {} outputs, expected {CLASS_COUNT}",
                probs.len()
            )
        })
    }
}
