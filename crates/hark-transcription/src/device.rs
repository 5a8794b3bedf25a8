//! Execution device selection.
//!
//! The device is probed once at startup and carried in explicit config;
//! nothing in the per-request path re-probes hardware.

/// Execution device the engine is bound to for the process lifetime.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Device {
    /// NVIDIA CUDA accelerator.
    Cuda,
    /// General-purpose processor.
    Cpu,
}

impl Device {
    /// Probe the runtime environment for an accelerator.
    ///
    /// `HARK_DEVICE=cuda|cpu` overrides the probe. Otherwise CUDA is
    /// selected when the NVIDIA kernel driver is visible, matching the
    /// "accelerator if available, else CPU" load-time rule.
    pub fn detect() -> Self {
        match std::env::var("HARK_DEVICE").ok().as_deref() {
            Some("cuda") => return Self::Cuda,
            Some("cpu") => return Self::Cpu,
            _ => {}
        }
        if cuda_driver_visible() {
            Self::Cuda
        } else {
            Self::Cpu
        }
    }
}

impl std::fmt::Display for Device {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Cuda => write!(f, "cuda"),
            Self::Cpu => write!(f, "cpu"),
        }
    }
}

fn cuda_driver_visible() -> bool {
    std::path::Path::new("/proc/driver/nvidia/version").exists()
}
