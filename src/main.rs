use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use clap::Parser;

use arabic_tts::app::{self, RunOptions};
use arabic_tts::config::DEFAULT_CONFIG_PATH;
use arabic_tts::engines::BackendRegistry;
use arabic_tts::onnx::SessionParams;
use arabic_tts::{BasicConfig, ConfigResolver, EspeakPhonemizer, TtsError};

/// Synthesize Arabic speech and write a WAV, a spectrogram and an HTML report.
#[derive(Parser, Debug)]
#[command(name = "arabic-tts", version, about)]
struct Cli {
    /// Text to synthesize
    #[arg(long, default_value = "اشتركوا في القناة")]
    text: String,

    /// Acoustic model: fastpitch or tacotron2
    #[arg(long, default_value = "fastpitch")]
    model: String,

    /// Acoustic model checkpoint
    #[arg(long, default_value = "pretrained/fastpitch_ar_adv.onnx")]
    checkpoint: PathBuf,

    /// Vocoder weights; defaults to the basic config's value
    #[arg(long = "vocoder_sd")]
    vocoder_sd: Option<PathBuf>,

    /// Vocoder config; defaults to the basic config's value
    #[arg(long = "vocoder_config")]
    vocoder_config: Option<PathBuf>,

    /// Denoiser strength, 0 disables denoising
    #[arg(long, default_value_t = 0.0)]
    denoise: f32,

    /// Output directory
    #[arg(long = "out_dir", default_value = "samples/test")]
    out_dir: PathBuf,

    /// External command that adds diacritics before phonemization
    #[arg(long)]
    vowelizer: Option<String>,

    /// Run on CPU even when an accelerator is available
    #[arg(long)]
    cpu: bool,

    /// Skip audio playback
    #[arg(long = "do_not_play")]
    do_not_play: bool,

    /// Basic config with default vocoder paths
    #[arg(long, default_value = DEFAULT_CONFIG_PATH)]
    config: PathBuf,

    /// Number of inference threads (ONNX Runtime default when unset)
    #[arg(long)]
    threads: Option<usize>,
}

impl Cli {
    fn options(&self) -> RunOptions {
        RunOptions {
            text: self.text.clone(),
            model: self.model.clone(),
            checkpoint: self.checkpoint.clone(),
            vocoder_sd: self.vocoder_sd.clone(),
            vocoder_config: self.vocoder_config.clone(),
            denoise: self.denoise,
            out_dir: self.out_dir.clone(),
            vowelizer: self.vowelizer.clone(),
            cpu: self.cpu,
            play: !self.do_not_play,
        }
    }
}

fn run(cli: Cli) -> Result<(), TtsError> {
    let options = cli.options();
    // Validates the model name and options before touching any file.
    options.request()?;

    let config_path = cli.config.clone();
    let resolver = ConfigResolver::new(move || BasicConfig::load_or_default(&config_path));

    let phonemizer = Arc::new(EspeakPhonemizer::default());
    let backends = BackendRegistry::onnx(
        phonemizer.clone(),
        SessionParams {
            num_threads: cli.threads,
        },
    );

    app::run(&options, &backends, &resolver, phonemizer.as_ref())?;
    Ok(())
}

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    match run(Cli::parse()) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            log::error!("{e}");
            ExitCode::FAILURE
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use arabic_tts::{DevicePreference, ModelKind};

    fn parse(args: &[&str]) -> Cli {
        Cli::try_parse_from(std::iter::once("arabic-tts").chain(args.iter().copied())).unwrap()
    }

    #[test]
    fn defaults_match_the_documented_cli() {
        let cli = parse(&[]);
        assert_eq!(cli.text, "اشتركوا في القناة");
        assert_eq!(cli.model, "fastpitch");
        assert_eq!(cli.out_dir, PathBuf::from("samples/test"));
        assert_eq!(cli.denoise, 0.0);
        assert!(!cli.cpu && !cli.do_not_play);

        let options = cli.options();
        assert!(options.play);
        let request = options.request().unwrap();
        assert_eq!(request.model(), ModelKind::FastPitch);
        assert!(request.vocoder_state_path().is_none());
        assert!(!request.wants_denoise());
    }

    #[test]
    fn underscore_flags_are_accepted() {
        let cli = parse(&[
            "--model",
            "tacotron2",
            "--vocoder_sd",
            "voc.onnx",
            "--vocoder_config",
            "voc.json",
            "--out_dir",
            "out",
            "--denoise",
            "0.01",
            "--cpu",
            "--do_not_play",
        ]);
        let options = cli.options();
        assert!(!options.play);
        assert_eq!(options.out_dir, PathBuf::from("out"));

        let request = options.request().unwrap();
        assert_eq!(request.model(), ModelKind::Tacotron2);
        assert_eq!(request.vocoder_state_path(), Some(std::path::Path::new("voc.onnx")));
        assert_eq!(request.vocoder_config_path(), Some(std::path::Path::new("voc.json")));
        assert_eq!(request.device(), DevicePreference::CpuOnly);
        assert!(request.wants_denoise());
    }

    #[test]
    fn unknown_model_is_rejected_before_any_io() {
        let dir = tempfile::tempdir().unwrap();
        let out_dir = dir.path().join("out");
        let cli = parse(&["--model", "wavenet", "--out_dir", out_dir.to_str().unwrap()]);

        let err = run(cli).unwrap_err();
        assert!(matches!(err, TtsError::UnsupportedModel(ref m) if m == "wavenet"));
        assert!(!out_dir.exists());
    }
}
