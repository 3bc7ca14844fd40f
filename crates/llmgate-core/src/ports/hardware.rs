//! Hardware probe port used by backend resolution.

use crate::domain::GpuInfo;

/// Port for probing GPU hardware.
///
/// Implementations perform active probing (running `nvidia-smi` and
/// friends). Backend resolution only consumes the result, which keeps the
/// decision logic testable.
pub trait HardwareProbe: Send + Sync {
    /// Detect GPU hardware and acceleration software.
    fn detect_gpu(&self) -> GpuInfo;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Device, DevicePreference, resolve_device};

    struct FixedProbe(GpuInfo);

    impl HardwareProbe for FixedProbe {
        fn detect_gpu(&self) -> GpuInfo {
            self.0.clone()
        }
    }

    #[test]
    fn test_probe_drives_resolution() {
        let probe: &dyn HardwareProbe = &FixedProbe(GpuInfo::none());
        let resolution = resolve_device(DevicePreference::Cuda, &probe.detect_gpu());
        assert_eq!(resolution.device, Device::Cpu);
    }
}
