//! ML inference using Candle.
//!
//! Provides the engagement CNN, safetensors model loading and device selection.

mod device;
mod engagement_net;
mod loader;

pub use device::{select_device, DevicePreference};
pub use engagement_net::{parameter_shapes, EngagementNet};
pub use loader::{load_model, load_safetensors, ModelLoadError};
