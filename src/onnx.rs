//! ONNX Runtime session plumbing shared by the acoustic models and vocoder.

use std::path::{Path, PathBuf};

use ndarray::{ArrayD, Dimension};
use ort::execution_providers::{CPUExecutionProvider, ExecutionProviderDispatch};
use ort::session::builder::GraphOptimizationLevel;
use ort::session::{Session, SessionOutputs};

use crate::device::Device;
use crate::error::TtsError;

/// Parameters for building an inference session.
#[derive(Debug, Clone, Default)]
pub struct SessionParams {
    /// Number of CPU threads to use for inference.
    /// `None` uses the ORT default (typically all available cores).
    pub num_threads: Option<usize>,
}

fn execution_providers(device: Device) -> Vec<ExecutionProviderDispatch> {
    match device {
        #[cfg(feature = "cuda")]
        Device::Cuda => vec![
            ort::execution_providers::CUDAExecutionProvider::default()
                .build()
                .error_on_failure(),
            CPUExecutionProvider::default().build(),
        ],
        #[cfg(not(feature = "cuda"))]
        Device::Cuda => {
            log::warn!("CUDA requested but not compiled in; running on CPU");
            vec![CPUExecutionProvider::default().build()]
        }
        Device::Cpu => vec![CPUExecutionProvider::default().build()],
    }
}

/// Build a session for `onnx_path` placed on `device`.
pub fn init_session(
    onnx_path: &Path,
    device: Device,
    params: &SessionParams,
) -> Result<Session, TtsError> {
    let mut builder = Session::builder()?
        .with_optimization_level(GraphOptimizationLevel::Level3)?
        .with_execution_providers(execution_providers(device))?;

    if let Some(threads) = params.num_threads {
        builder = builder
            .with_intra_threads(threads)?
            .with_inter_threads(threads)?;
    }

    Ok(builder.commit_from_file(onnx_path)?)
}

/// Resolve a checkpoint path to an ONNX file.
///
/// A file path is used as-is. For a directory, `preferred` is used if
/// present, otherwise the first `.onnx` file found.
pub fn find_onnx_file(
    checkpoint: &Path,
    preferred: Option<&str>,
    what: &'static str,
) -> Result<PathBuf, TtsError> {
    if checkpoint.is_file() {
        return Ok(checkpoint.to_path_buf());
    }
    if !checkpoint.is_dir() {
        return Err(TtsError::MissingFile {
            what,
            path: checkpoint.to_path_buf(),
        });
    }

    if let Some(name) = preferred {
        let path = checkpoint.join(name);
        if path.exists() {
            return Ok(path);
        }
    }

    let mut candidates: Vec<PathBuf> = std::fs::read_dir(checkpoint)?
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|path| path.extension().and_then(|e| e.to_str()) == Some("onnx"))
        .collect();
    candidates.sort();

    match candidates.into_iter().next() {
        Some(path) => {
            log::info!("Using ONNX file: {}", path.display());
            Ok(path)
        }
        None => Err(TtsError::MissingFile {
            what,
            path: checkpoint.join("*.onnx"),
        }),
    }
}

/// Require a named file inside a checkpoint directory.
pub fn require_file(dir: &Path, name: &str, what: &'static str) -> Result<PathBuf, TtsError> {
    let path = dir.join(name);
    if path.is_file() {
        Ok(path)
    } else {
        Err(TtsError::MissingFile { what, path })
    }
}

/// Name of the first session input matching one of `candidates`, falling back
/// to the session's first input.
pub fn detect_input(session: &Session, candidates: &[&str]) -> Option<String> {
    session
        .inputs()
        .iter()
        .find(|input| candidates.contains(&input.name()))
        .or_else(|| session.inputs().first())
        .map(|input| input.name().to_string())
}

/// Whether the session has an input called `name`.
pub fn has_input(session: &Session, name: &str) -> bool {
    session.inputs().iter().any(|input| input.name() == name)
}

/// Copy a named float output into an owned array of dimension `D`.
pub fn extract<D: Dimension>(
    outputs: &SessionOutputs,
    name: &str,
) -> Result<ndarray::Array<f32, D>, TtsError> {
    let view = outputs[name].try_extract_array::<f32>()?;
    Ok(view.to_owned().into_dimensionality::<D>()?)
}

/// Copy the first output of a run, whatever its name.
pub fn extract_first(outputs: &SessionOutputs) -> Result<ArrayD<f32>, TtsError> {
    let (_, value) = outputs
        .iter()
        .next()
        .ok_or_else(|| TtsError::Ort(ort::Error::new("No output from model")))?;
    Ok(value.try_extract_array::<f32>()?.to_owned())
}
