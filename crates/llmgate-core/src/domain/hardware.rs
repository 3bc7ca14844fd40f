//! Hardware detection result types.

/// GPU hardware detection result.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GpuInfo {
    /// NVIDIA GPU hardware detected (via nvidia-smi, lspci, etc.).
    pub has_nvidia_gpu: bool,
    /// GPUs enumerated by the NVIDIA driver (`nvidia-smi --list-gpus`).
    pub driver_gpu_count: u32,
    /// CUDA toolkit version, if installed.
    pub cuda_version: Option<String>,
}

impl GpuInfo {
    /// No GPU at all.
    pub const fn none() -> Self {
        Self {
            has_nvidia_gpu: false,
            driver_gpu_count: 0,
            cuda_version: None,
        }
    }

    /// A GPU is only usable for inference when the driver can enumerate it.
    pub const fn is_usable(&self) -> bool {
        self.driver_gpu_count > 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hardware_without_driver_is_not_usable() {
        let info = GpuInfo {
            has_nvidia_gpu: true,
            driver_gpu_count: 0,
            cuda_version: None,
        };
        assert!(!info.is_usable());
    }

    #[test]
    fn test_driver_enumerated_gpu_is_usable() {
        let info = GpuInfo {
            has_nvidia_gpu: true,
            driver_gpu_count: 2,
            cuda_version: Some("12.2".to_string()),
        };
        assert!(info.is_usable());
        assert!(!GpuInfo::none().is_usable());
    }
}
