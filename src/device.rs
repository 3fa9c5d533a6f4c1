use std::fmt;

/// Compute target for the acoustic model and vocoder.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Device {
    Cpu,
    Cuda,
}

impl fmt::Display for Device {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Device::Cpu => f.write_str("cpu"),
            Device::Cuda => f.write_str("cuda"),
        }
    }
}

/// What the caller asked for; resolved to a [`Device`] once per request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DevicePreference {
    /// Use an accelerator when one is available.
    #[default]
    Auto,
    CpuOnly,
}

impl DevicePreference {
    /// Resolve the preference against the accelerators visible to this process.
    pub fn resolve(self) -> Device {
        self.resolve_with(accelerator_available())
    }

    fn resolve_with(self, accelerator: bool) -> Device {
        match self {
            DevicePreference::Auto if accelerator => Device::Cuda,
            _ => Device::Cpu,
        }
    }
}

#[cfg(feature = "cuda")]
fn accelerator_available() -> bool {
    use ort::execution_providers::{CUDAExecutionProvider, ExecutionProvider};

    match CUDAExecutionProvider::default().is_available() {
        Ok(available) => available,
        Err(e) => {
            log::warn!("Could not probe CUDA execution provider: {e}");
            false
        }
    }
}

#[cfg(not(feature = "cuda"))]
fn accelerator_available() -> bool {
    false
}
