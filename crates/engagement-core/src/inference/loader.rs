//! Model loading from safetensors artifacts.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use candle_core::{DType, Device, Tensor};
use candle_nn::VarBuilder;
use safetensors::SafeTensors;
use thiserror::Error;
use tracing::{debug, info};

use super::EngagementNet;
use crate::ports::Classifier;

/// The model artifact could not be loaded at startup.
#[derive(Debug, Error)]
pub enum ModelLoadError {
    /// No file at the configured path.
    #[error("model file not found: {}", path.display())]
    Missing {
        /// Configured path.
        path: PathBuf,
    },
    /// The file exists but is unreadable, corrupt, or does not fit the architecture.
    #[error("failed to load model from {}: {source:#}", path.display())]
    Invalid {
        /// Configured path.
        path: PathBuf,
        /// Underlying cause.
        #[source]
        source: anyhow::Error,
    },
}

/// Loads the engagement classifier from a safetensors file.
///
/// Logs the model's expected input shape on success.
///
/// # Errors
///
/// Returns [`ModelLoadError::Missing`] if `path` does not exist and
/// [`ModelLoadError::Invalid`] for any other failure.
pub fn load_model(path: impl AsRef<Path>, device: &Device) -> Result<EngagementNet, ModelLoadError> {
    let path = path.as_ref();
    if !path.is_file() {
        return Err(ModelLoadError::Missing {
            path: path.to_path_buf(),
        });
    }

    let model = load_safetensors(path, device)
        .and_then(EngagementNet::new)
        .map_err(|source| ModelLoadError::Invalid {
            path: path.to_path_buf(),
            source,
        })?;

    info!(
        path = %path.display(),
        input_shape = ?model.input_shape(),
        "Model loaded"
    );
    Ok(model)
}

/// Loads a safetensors file and creates a `VarBuilder` for the model.
///
/// # Errors
///
/// Returns an error if:
/// - The file cannot be read
/// - The safetensors data is invalid
pub fn load_safetensors(path: impl AsRef<Path>, device: &Device) -> Result<VarBuilder<'static>> {
    let path = path.as_ref();
    debug!("Loading safetensors from {}", path.display());

    let data = std::fs::read(path)
        .with_context(|| format!("Failed to read model file: {}", path.display()))?;

    let tensors = SafeTensors::deserialize(&data)
        .with_context(|| format!("Failed to parse safetensors: {}", path.display()))?;

    let mut tensor_map: HashMap<String, Tensor> = HashMap::new();
    for name in tensors.names() {
        let view = tensors
            .tensor(name)
            .with_context(|| format!("Failed to get tensor '{name}'"))?;

        let dtype = safetensors_dtype_to_candle(view.dtype())?;
        let tensor = Tensor::from_raw_buffer(view.data(), dtype, view.shape(), device)
            .with_context(|| format!("Failed to create tensor '{name}'"))?
            .to_dtype(DType::F32)
            .with_context(|| format!("Failed to convert tensor '{name}' to f32"))?;

        tensor_map.insert(name.clone(), tensor);
    }
    debug!(tensors = tensor_map.len(), "Parsed safetensors");

    Ok(VarBuilder::from_tensors(tensor_map, DType::F32, device))
}

/// Converts safetensors dtype to candle dtype.
fn safetensors_dtype_to_candle(dtype: safetensors::Dtype) -> Result<DType> {
    use safetensors::Dtype as S;
    match dtype {
        S::F32 => Ok(DType::F32),
        S::F64 => Ok(DType::F64),
        S::F16 => Ok(DType::F16),
        S::BF16 => Ok(DType::BF16),
        other => anyhow::bail!("Unsupported weight dtype: {other:?}"),
    }
}
