//! Hardware probe implementation.
//!
//! `DefaultHardwareProbe` implements `HardwareProbe` from llmgate-core by
//! running vendor tools. It should be constructed at the composition root
//! and passed to backend resolution.

mod gpu;

use llmgate_core::{GpuInfo, HardwareProbe};

pub use gpu::{check_cuda, detect_gpu_info, parse_gpu_list};

/// Default implementation of `HardwareProbe`.
#[derive(Debug, Default, Clone, Copy)]
pub struct DefaultHardwareProbe;

impl DefaultHardwareProbe {
    pub const fn new() -> Self {
        Self
    }
}

impl HardwareProbe for DefaultHardwareProbe {
    fn detect_gpu(&self) -> GpuInfo {
        detect_gpu_info()
    }
}
