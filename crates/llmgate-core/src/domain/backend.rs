//! Backend selection: which device serves inference for this process.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;
use thiserror::Error;
use tracing::{info, warn};

use super::hardware::GpuInfo;

/// The device an inference backend runs on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Device {
    /// Tensor-parallel GPU engine.
    Gpu,
    /// Quantized CPU engine.
    Cpu,
}

impl Device {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Gpu => "gpu",
            Self::Cpu => "cpu",
        }
    }
}

impl fmt::Display for Device {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Operator-requested device.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum DevicePreference {
    #[default]
    Cuda,
    Cpu,
}

/// Error returned when a device preference string is not recognised.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("unknown device '{0}', expected 'cuda' or 'cpu'")]
pub struct ParseDeviceError(pub String);

impl FromStr for DevicePreference {
    type Err = ParseDeviceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "cuda" | "gpu" => Ok(Self::Cuda),
            "cpu" => Ok(Self::Cpu),
            _ => Err(ParseDeviceError(s.to_string())),
        }
    }
}

impl fmt::Display for DevicePreference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Cuda => "cuda",
            Self::Cpu => "cpu",
        })
    }
}

/// Outcome of backend resolution.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeviceResolution {
    pub device: Device,
    /// `cuda` was requested but no usable GPU was found.
    pub downgraded: bool,
}

/// Decide the effective device from the operator preference and a probe result.
///
/// A `cuda` preference without a usable GPU falls back to CPU with a warning;
/// startup continues. A `cpu` preference is always honoured.
pub fn resolve_device(preference: DevicePreference, gpu: &GpuInfo) -> DeviceResolution {
    let resolution = match preference {
        DevicePreference::Cpu => DeviceResolution {
            device: Device::Cpu,
            downgraded: false,
        },
        DevicePreference::Cuda if gpu.is_usable() => DeviceResolution {
            device: Device::Gpu,
            downgraded: false,
        },
        DevicePreference::Cuda => {
            if gpu.has_nvidia_gpu {
                warn!("NVIDIA device present but driver reports no GPUs, using CPU backend");
            } else {
                warn!("CUDA requested but no GPU detected, falling back to CPU backend");
            }
            DeviceResolution {
                device: Device::Cpu,
                downgraded: true,
            }
        }
    };

    info!(
        preference = %preference,
        device = %resolution.device,
        gpus = gpu.driver_gpu_count,
        "Backend resolved"
    );
    resolution
}

/// Process-wide backend decision, made once at startup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackendSelection {
    pub device: Device,
    /// Model identifier as served to clients.
    pub model_id: String,
    /// Validated artifact path on the models volume.
    pub model_path: PathBuf,
    /// Gateway listen port.
    pub port: u16,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn gpu_present() -> GpuInfo {
        GpuInfo {
            has_nvidia_gpu: true,
            driver_gpu_count: 1,
            cuda_version: Some("12.1".to_string()),
        }
    }

    #[test]
    fn test_cuda_with_gpu_selects_gpu() {
        let r = resolve_device(DevicePreference::Cuda, &gpu_present());
        assert_eq!(r.device, Device::Gpu);
        assert!(!r.downgraded);
    }

    #[test]
    fn test_cuda_without_gpu_downgrades() {
        let r = resolve_device(DevicePreference::Cuda, &GpuInfo::none());
        assert_eq!(r.device, Device::Cpu);
        assert!(r.downgraded);
    }

    #[test]
    fn test_cpu_preference_is_always_honoured() {
        let r = resolve_device(DevicePreference::Cpu, &gpu_present());
        assert_eq!(r.device, Device::Cpu);
        assert!(!r.downgraded);
    }

    #[test]
    fn test_parse_preference() {
        assert_eq!("cuda".parse(), Ok(DevicePreference::Cuda));
        assert_eq!("GPU".parse(), Ok(DevicePreference::Cuda));
        assert_eq!(" cpu ".parse(), Ok(DevicePreference::Cpu));
        assert!("tpu".parse::<DevicePreference>().is_err());
    }
}
