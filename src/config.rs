//! Default configuration and vocoder path resolution.

use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use serde::{Deserialize, Serialize};

use crate::error::TtsError;

/// Location the CLI looks for the basic config when `--config` is not given.
pub const DEFAULT_CONFIG_PATH: &str = "configs/basic.json";

/// Process-wide defaults used when a request leaves vocoder paths unset.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BasicConfig {
    pub vocoder_state_path: PathBuf,
    pub vocoder_config_path: PathBuf,
}

impl Default for BasicConfig {
    fn default() -> Self {
        Self {
            vocoder_state_path: PathBuf::from("pretrained/hifigan-asc-v1/hifigan-asc.onnx"),
            vocoder_config_path: PathBuf::from("pretrained/hifigan-asc-v1/config.json"),
        }
    }
}

impl BasicConfig {
    /// Load from a JSON file. Missing fields take their built-in defaults.
    pub fn load(path: &Path) -> Result<Self, TtsError> {
        let content = std::fs::read_to_string(path)?;
        serde_json::from_str(&content)
            .map_err(|e| TtsError::Config(format!("{}: {e}", path.display())))
    }

    /// Load `path` if it exists, otherwise fall back to the built-in defaults.
    pub fn load_or_default(path: &Path) -> Result<Self, TtsError> {
        if path.exists() {
            log::info!("Loading basic config from {}", path.display());
            Self::load(path)
        } else {
            log::debug!("{} not found, using built-in defaults", path.display());
            Ok(Self::default())
        }
    }
}

/// Vocoder state and config paths, both present.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VocoderConfig {
    pub state_path: PathBuf,
    pub config_path: PathBuf,
}

type ConfigLoader = Box<dyn Fn() -> Result<BasicConfig, TtsError> + Send + Sync>;

/// Fills unset vocoder paths from the default configuration.
///
/// The default configuration is built by the injected loader on first need
/// and cached for the lifetime of the resolver. Construct one resolver at
/// process start and share it by reference.
pub struct ConfigResolver {
    loader: ConfigLoader,
    defaults: OnceLock<BasicConfig>,
}

impl ConfigResolver {
    pub fn new<F>(loader: F) -> Self
    where
        F: Fn() -> Result<BasicConfig, TtsError> + Send + Sync + 'static,
    {
        Self {
            loader: Box::new(loader),
            defaults: OnceLock::new(),
        }
    }

    /// Resolver whose defaults are an already-built config.
    pub fn with_defaults(config: BasicConfig) -> Self {
        let defaults = OnceLock::new();
        let _ = defaults.set(config.clone());
        Self {
            loader: Box::new(move || Ok(config.clone())),
            defaults,
        }
    }

    /// The cached default configuration, loading it on first call.
    pub fn defaults(&self) -> Result<&BasicConfig, TtsError> {
        if let Some(config) = self.defaults.get() {
            return Ok(config);
        }
        let config = (self.loader)()?;
        Ok(self.defaults.get_or_init(|| config))
    }

    /// Explicitly supplied paths are kept as-is. Existence is checked by the
    /// vocoder loader.
    pub fn resolve(
        &self,
        state_path: Option<&Path>,
        config_path: Option<&Path>,
    ) -> Result<VocoderConfig, TtsError> {
        if let (Some(state), Some(config)) = (state_path, config_path) {
            return Ok(VocoderConfig {
                state_path: state.to_path_buf(),
                config_path: config.to_path_buf(),
            });
        }

        let defaults = self.defaults()?;
        Ok(VocoderConfig {
            state_path: state_path
                .map(Path::to_path_buf)
                .unwrap_or_else(|| defaults.vocoder_state_path.clone()),
            config_path: config_path
                .map(Path::to_path_buf)
                .unwrap_or_else(|| defaults.vocoder_config_path.clone()),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    fn counting_resolver() -> (ConfigResolver, Arc<AtomicUsize>) {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&calls);
        let resolver = ConfigResolver::new(move || {
            counter.fetch_add(1, Ordering::SeqCst);
            Ok(BasicConfig {
                vocoder_state_path: "defaults/g_02500000.onnx".into(),
                vocoder_config_path: "defaults/config.json".into(),
            })
        });
        (resolver, calls)
    }

    #[test]
    fn both_absent_resolves_to_defaults() {
        let (resolver, _) = counting_resolver();
        let resolved = resolver.resolve(None, None).unwrap();
        assert_eq!(resolved.state_path, PathBuf::from("defaults/g_02500000.onnx"));
        assert_eq!(resolved.config_path, PathBuf::from("defaults/config.json"));
    }

    #[test]
    fn supplied_paths_are_never_overwritten() {
        let (resolver, _) = counting_resolver();

        let resolved = resolver.resolve(Some(Path::new("my/voc.onnx")), None).unwrap();
        assert_eq!(resolved.state_path, PathBuf::from("my/voc.onnx"));
        assert_eq!(resolved.config_path, PathBuf::from("defaults/config.json"));

        let resolved = resolver.resolve(None, Some(Path::new("my/config.json"))).unwrap();
        assert_eq!(resolved.state_path, PathBuf::from("defaults/g_02500000.onnx"));
        assert_eq!(resolved.config_path, PathBuf::from("my/config.json"));
    }

    #[test]
    fn defaults_are_loaded_lazily_and_once() {
        let (resolver, calls) = counting_resolver();

        resolver
            .resolve(Some(Path::new("a.onnx")), Some(Path::new("a.json")))
            .unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 0);

        resolver.resolve(None, None).unwrap();
        resolver.resolve(Some(Path::new("a.onnx")), None).unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn loader_failure_propagates() {
        let resolver = ConfigResolver::new(|| Err(TtsError::Config("broken".into())));
        assert!(matches!(resolver.resolve(None, None), Err(TtsError::Config(_))));
    }

    #[test]
    fn partial_json_keeps_builtin_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("basic.json");
        std::fs::write(&path, r#"{ "vocoder_state_path": "custom/hifigan.onnx" }"#).unwrap();

        let config = BasicConfig::load(&path).unwrap();
        assert_eq!(config.vocoder_state_path, PathBuf::from("custom/hifigan.onnx"));
        assert_eq!(config.vocoder_config_path, BasicConfig::default().vocoder_config_path);
    }

    #[test]
    fn shipped_config_file_parses() {
        let path = Path::new(env!("CARGO_MANIFEST_DIR")).join(DEFAULT_CONFIG_PATH);
        assert_eq!(BasicConfig::load(&path).unwrap(), BasicConfig::default());
    }

    #[test]
    fn extra_fields_are_ignored() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("basic.json");
        std::fs::write(&path, r#"{ "sample_rate": 22050, "vocoder_config_path": "c.json" }"#)
            .unwrap();

        let config = BasicConfig::load(&path).unwrap();
        assert_eq!(config.vocoder_config_path, PathBuf::from("c.json"));
        assert_eq!(config.vocoder_state_path, BasicConfig::default().vocoder_state_path);
    }

    #[test]
    fn missing_file_falls_back_to_builtin_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = BasicConfig::load_or_default(&dir.path().join("absent.json")).unwrap();
        assert_eq!(config, BasicConfig::default());
    }
}
