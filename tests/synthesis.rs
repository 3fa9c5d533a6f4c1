//! End-to-end runs of the pipeline and artifact writer with in-memory backends.

use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use ndarray::Array2;

use arabic_tts::app::{self, RunOptions};
use arabic_tts::engines::{AcousticModel, BackendRegistry};
use arabic_tts::report::{ArtifactWriter, MEL_FILE, REPORT_FILE, WAVE_FILE};
use arabic_tts::vocoder::Vocoder;
use arabic_tts::{
    BasicConfig, ConfigResolver, Device, DevicePreference, MelSpectrogram, ModelKind,
    PhonemeConverter, PipelineState, SynthesisPipeline, SynthesisRequest,
    SynthesisRequestBuilder, TtsError, Waveform,
};

const HOP: usize = 256;

struct LetterPhonemizer;

impl PhonemeConverter for LetterPhonemizer {
    fn to_phonemes(&self, text: &str, vowelizer: Option<&str>) -> Result<String, TtsError> {
        assert!(vowelizer.is_none(), "display phonemes are built without a vowelizer");
        Ok(text.replace(' ', " _ "))
    }
}

struct ToneModel {
    kind: ModelKind,
    device: Device,
    eval: bool,
}

impl AcousticModel for ToneModel {
    fn kind(&self) -> ModelKind {
        self.kind
    }

    fn device(&self) -> Device {
        self.device
    }

    fn eval(&mut self) {
        self.eval = true;
    }

    fn is_eval(&self) -> bool {
        self.eval
    }

    fn synthesize(&mut self, text: &str, _: Option<&str>) -> Result<MelSpectrogram, TtsError> {
        if !self.eval {
            return Err(TtsError::NotInEvalMode);
        }
        // Autoregressive decoding yields a different length than the parallel model.
        let per_char = if self.kind.is_autoregressive() { 5 } else { 3 };
        let frames = text.chars().count() * per_char;
        Ok(MelSpectrogram::new(Array2::from_shape_fn((80, frames), |(f, t)| {
            -4.0 + ((f * 7 + t) % 11) as f32 * 0.3
        })))
    }
}

struct HummingVocoder {
    device: Device,
    calls: Arc<AtomicUsize>,
}

impl Vocoder for HummingVocoder {
    fn device(&self) -> Device {
        self.device
    }

    fn sample_rate(&self) -> u32 {
        22_050
    }

    fn num_mels(&self) -> usize {
        80
    }

    fn infer(&mut self, mel: &MelSpectrogram) -> Result<Waveform, TtsError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let view = mel.view();
        Ok(Waveform::mono(
            (0..mel.frames() * HOP)
                .map(|i| {
                    let speech = 0.05 * (view[[10, i / HOP]] + 4.0) * (i as f32 * 0.07).sin();
                    let phase = 2.0 * std::f32::consts::PI * 1000.0 * i as f32 / 22_050.0;
                    let hum = 0.02 * phase.cos();
                    speech + hum
                })
                .collect(),
        ))
    }
}

struct Backends {
    registry: BackendRegistry,
    resolver: ConfigResolver,
    vocoder_calls: Arc<AtomicUsize>,
}

fn backends() -> Backends {
    backends_for(&ModelKind::ALL)
}

fn backends_for(kinds: &[ModelKind]) -> Backends {
    let vocoder_calls = Arc::new(AtomicUsize::new(0));
    let calls = Arc::clone(&vocoder_calls);
    let mut registry = BackendRegistry::new(move |_, device| {
        Ok(Box::new(HummingVocoder {
            device,
            calls: Arc::clone(&calls),
        }) as Box<dyn Vocoder>)
    });
    for &kind in kinds {
        registry.register(kind, move |_, device| {
            Ok(Box::new(ToneModel {
                kind,
                device,
                eval: false,
            }) as Box<dyn AcousticModel>)
        });
    }

    let resolver = ConfigResolver::with_defaults(BasicConfig {
        vocoder_state_path: PathBuf::from("pretrained/hifigan-asc-v1/hifigan-asc.onnx"),
        vocoder_config_path: PathBuf::from("pretrained/hifigan-asc-v1/config.json"),
    });

    Backends {
        registry,
        resolver,
        vocoder_calls,
    }
}

fn request(model: &str, denoise: f32) -> Result<SynthesisRequest, TtsError> {
    SynthesisRequestBuilder::default()
        .text("اشتركوا في القناة")
        .model(model.parse::<ModelKind>()?)
        .checkpoint_path("pretrained/checkpoint.onnx")
        .denoise_strength(denoise)
        .device(DevicePreference::CpuOnly)
        .build()
}

#[test]
fn fastpitch_run_writes_a_playable_report() {
    let b = backends();
    let dir = tempfile::tempdir().unwrap();
    let out_dir = dir.path().join("samples").join("test");

    let request = request("fastpitch", 0.0).unwrap();
    let mut pipeline = SynthesisPipeline::new(&b.registry, &b.resolver, &LetterPhonemizer);
    let result = pipeline.run(&request).unwrap();
    assert_eq!(pipeline.state(), PipelineState::Done);

    ArtifactWriter::new(&out_dir).write(&result, request.text()).unwrap();

    let wav = hound::WavReader::open(out_dir.join(WAVE_FILE)).unwrap();
    assert_eq!(wav.spec().sample_rate, 22_050);
    assert_eq!(wav.duration() as usize, result.mel.frames() * HOP);
    assert!(out_dir.join(MEL_FILE).is_file());

    let html = std::fs::read_to_string(out_dir.join(REPORT_FILE)).unwrap();
    assert!(html.contains("./wave.wav"));
    assert!(html.contains("./mel_spec.png"));
    assert!(html.contains("اشتركوا في القناة"));
}

#[test]
fn both_model_kinds_share_the_vocoder() {
    let b = backends();
    let fast = SynthesisPipeline::new(&b.registry, &b.resolver, &LetterPhonemizer)
        .run(&request("fastpitch", 0.0).unwrap())
        .unwrap();
    let taco = SynthesisPipeline::new(&b.registry, &b.resolver, &LetterPhonemizer)
        .run(&request("tacotron2", 0.0).unwrap())
        .unwrap();

    assert_eq!(fast.mel.freq_bins(), taco.mel.freq_bins());
    assert_ne!(fast.mel.frames(), taco.mel.frames());
    assert_eq!(fast.sample_rate, taco.sample_rate);
    assert_eq!(b.vocoder_calls.load(Ordering::SeqCst), 2);
}

#[test]
fn denoising_changes_audio_only_when_requested() {
    let b = backends();
    let run = |strength| {
        SynthesisPipeline::new(&b.registry, &b.resolver, &LetterPhonemizer)
            .run(&request("fastpitch", strength).unwrap())
            .unwrap()
    };

    let plain = run(0.0);
    let calls_plain = b.vocoder_calls.load(Ordering::SeqCst);
    let denoised = run(0.01);

    assert_eq!(calls_plain, 1);
    assert_eq!(b.vocoder_calls.load(Ordering::SeqCst), 1 + 2);
    assert_eq!(denoised.wave.shape(), plain.wave.shape());
    assert_ne!(denoised.wave, plain.wave);
    assert_eq!(denoised.phonemes_display, plain.phonemes_display);
}

#[test]
fn display_phonemes_are_simplified() {
    let b = backends();
    let result = SynthesisPipeline::new(&b.registry, &b.resolver, &LetterPhonemizer)
        .run(&request("fastpitch", 0.0).unwrap())
        .unwrap();
    assert_eq!(result.phonemes_raw, "اشتركوا _ في _ القناة");
    assert_eq!(result.phonemes_display, "اشتركوا في القناة");
}

fn run_options(model: &str, out_dir: PathBuf) -> RunOptions {
    RunOptions {
        text: "اشتركوا في القناة".to_string(),
        model: model.to_string(),
        checkpoint: PathBuf::from("pretrained/checkpoint.onnx"),
        vocoder_sd: None,
        vocoder_config: None,
        denoise: 0.0,
        out_dir,
        vowelizer: None,
        cpu: true,
        play: false,
    }
}

#[test]
fn app_run_writes_all_artifacts() {
    let b = backends();
    let dir = tempfile::tempdir().unwrap();
    let out_dir = dir.path().join("samples").join("test");

    let result = app::run(
        &run_options("fastpitch", out_dir.clone()),
        &b.registry,
        &b.resolver,
        &LetterPhonemizer,
    )
    .unwrap();

    assert_eq!(result.sample_rate, 22_050);
    for file in [WAVE_FILE, MEL_FILE, REPORT_FILE] {
        assert!(out_dir.join(file).is_file(), "{file} missing");
    }
}

#[test]
fn unknown_model_fails_before_anything_is_written() {
    let b = backends();
    let dir = tempfile::tempdir().unwrap();
    let out_dir = dir.path().join("out");

    let err = app::run(
        &run_options("wavenet", out_dir.clone()),
        &b.registry,
        &b.resolver,
        &LetterPhonemizer,
    )
    .unwrap_err();

    assert!(matches!(err, TtsError::UnsupportedModel(ref m) if m == "wavenet"));
    assert!(err.to_string().contains("wavenet"));
    assert_eq!(b.vocoder_calls.load(Ordering::SeqCst), 0);
    assert!(!out_dir.exists());
}

#[test]
fn unregistered_backend_fails_before_anything_is_written() {
    let b = backends_for(&[ModelKind::FastPitch]);
    let dir = tempfile::tempdir().unwrap();
    let out_dir = dir.path().join("out");

    let err = app::run(
        &run_options("tacotron2", out_dir.clone()),
        &b.registry,
        &b.resolver,
        &LetterPhonemizer,
    )
    .unwrap_err();

    assert!(matches!(err, TtsError::UnsupportedModel(ref m) if m == "tacotron2"));
    assert_eq!(b.vocoder_calls.load(Ordering::SeqCst), 0);
    assert!(!out_dir.exists());
}

#[test]
fn case_variants_of_model_names_are_unsupported() {
    let b = backends();
    let dir = tempfile::tempdir().unwrap();
    let out_dir = dir.path().join("out");

    let err = app::run(
        &run_options("FastPitch", out_dir.clone()),
        &b.registry,
        &b.resolver,
        &LetterPhonemizer,
    )
    .unwrap_err();

    assert!(matches!(err, TtsError::UnsupportedModel(ref m) if m == "FastPitch"));
    assert!(!out_dir.exists());
}

#[test]
fn negative_denoise_strength_is_rejected() {
    let err = request("fastpitch", -0.5).unwrap_err();
    assert!(matches!(err, TtsError::InvalidRequest(_)));
}
