//! Device selection for inference.

use candle_core::Device;
use tracing::info;
#[cfg(any(feature = "metal", feature = "cuda"))]
use tracing::warn;

/// Where to run the forward pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum DevicePreference {
    /// Use a GPU when one is compiled in and available, else the CPU.
    #[default]
    Auto,
    /// Always use the CPU.
    Cpu,
}

impl std::str::FromStr for DevicePreference {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "auto" => Ok(Self::Auto),
            "cpu" => Ok(Self::Cpu),
            other => Err(format!("unknown device '{other}', expected 'auto' or 'cpu'")),
        }
    }
}

/// Returns the device to load the model onto.
///
/// With [`DevicePreference::Auto`], uses Metal or CUDA when the matching
/// cargo feature is enabled and a device is present, falling back to CPU.
#[must_use]
pub fn select_device(preference: DevicePreference) -> Device {
    if preference == DevicePreference::Cpu {
        info!("Using CPU for inference");
        return Device::Cpu;
    }

    #[cfg(feature = "metal")]
    {
        match Device::new_metal(0) {
            Ok(device) => {
                info!("Using Metal device for inference");
                return device;
            }
            Err(e) => warn!("Metal device unavailable: {e}"),
        }
    }

    #[cfg(feature = "cuda")]
    {
        match Device::new_cuda(0) {
            Ok(device) => {
                info!("Using CUDA device for inference");
                return device;
            }
            Err(e) => warn!("CUDA device unavailable: {e}"),
        }
    }

    info!("Using CPU for inference");
    Device::Cpu
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cpu_preference_returns_cpu() {
        assert!(matches!(select_device(DevicePreference::Cpu), Device::Cpu));
    }

    #[test]
    fn test_auto_returns_a_device() {
        // Must not panic whether or not a GPU is present
        let _device = select_device(DevicePreference::Auto);
    }

    #[test]
    fn test_parse_preference() {
        assert_eq!("cpu".parse::<DevicePreference>(), Ok(DevicePreference::Cpu));
        assert_eq!("auto".parse::<DevicePreference>(), Ok(DevicePreference::Auto));
        assert!("tpu".parse::<DevicePreference>().is_err());
    }
}
