//! bleepd - run the censor pipeline against the default audio devices.

use bleep::asr::{SpeechRecognizer, WhisperConfig, WhisperRecognizer};
use bleep::audio::{DuplexHost, list_devices};
use bleep::{CensorMode, CensorPipeline, Config, SetLexicon};
use clap::Parser;
use crossbeam_channel::bounded;
use std::path::PathBuf;
use std::sync::Arc;
use std::thread;
use std::time::Duration;

#[derive(Parser, Debug)]
#[command(name = "bleepd", version, about = "Real-time audio profanity censor")]
struct Args {
    /// Path to a TOML configuration file
    #[arg(long)]
    config: Option<PathBuf>,

    /// Path to the lexicon file (one banned word or phrase per line)
    #[arg(long, default_value = "lexicon.txt")]
    lexicon: PathBuf,

    /// Path to the Whisper model (overrides the config)
    #[arg(long)]
    model: Option<PathBuf>,

    /// Censor mode (overrides the config)
    #[arg(long, value_parser = ["mute", "reverse"])]
    mode: Option<String>,

    /// Input device name (overrides the config)
    #[arg(long)]
    input_device: Option<String>,

    /// Output device name (overrides the config)
    #[arg(long)]
    output_device: Option<String>,

    /// List audio devices and exit
    #[arg(long)]
    list_devices: bool,
}

fn run(args: Args) -> bleep::Result<()> {
    if args.list_devices {
        let (inputs, outputs) = list_devices()?;
        println!("Input devices:");
        for name in inputs {
            println!("  {}", name);
        }
        println!("Output devices:");
        for name in outputs {
            println!("  {}", name);
        }
        return Ok(());
    }

    let mut config = match &args.config {
        Some(path) => Config::load(path)?,
        None => Config::default(),
    };
    if let Some(model) = args.model {
        config.asr.model = model;
    }
    if let Some(mode) = &args.mode {
        config.censor.mode = match mode.as_str() {
            "mute" => CensorMode::Mute,
            _ => CensorMode::Reverse,
        };
    }
    if args.input_device.is_some() {
        config.audio.input_device = args.input_device;
    }
    if args.output_device.is_some() {
        config.audio.output_device = args.output_device;
    }

    let lexicon = Arc::new(SetLexicon::load(&args.lexicon)?);
    eprintln!("bleepd: {} lexicon entries", bleep::Lexicon::len(lexicon.as_ref()));

    let recognizer = Arc::new(WhisperRecognizer::new(WhisperConfig {
        model_path: config.asr.model.clone(),
        language: config.asr.language.clone(),
        ..Default::default()
    })?);
    eprintln!("bleepd: model {} loaded", recognizer.model_name());

    let host_config = config.clone();
    let pipeline = CensorPipeline::new(config)?;
    let (scheduler, handle) =
        pipeline.start(recognizer as Arc<dyn SpeechRecognizer>, lexicon)?;
    let host = DuplexHost::start(&host_config, scheduler)?;

    eprintln!(
        "bleepd: running with {:.1}s delay; press Enter to stop",
        host_config.pipeline.target_delay_seconds
    );

    // Stdin watcher so the status loop below stays interruptible.
    let (quit_tx, quit_rx) = bounded(1);
    thread::spawn(move || {
        let mut line = String::new();
        let _ = std::io::stdin().read_line(&mut line);
        let _ = quit_tx.send(());
    });

    while handle.is_running() {
        if quit_rx.recv_timeout(Duration::from_secs(2)).is_ok() {
            break;
        }
        let snap = handle.snapshot();
        eprint!(
            "\rlevel {:>5.3}  fill {:>5.1}%  censored {}  missed {}  {:<8}",
            snap.input_level_rms,
            snap.fill_fraction * 100.0,
            snap.profanity_count,
            snap.window_missed,
            if snap.paused {
                "paused"
            } else if snap.playback_started {
                "playing"
            } else {
                "buffering"
            },
        );
    }
    eprintln!();

    host.stop();
    handle.stop();
    Ok(())
}

fn main() {
    let args = Args::parse();
    if let Err(e) = run(args) {
        eprintln!("bleepd: {}", e);
        std::process::exit(1);
    }
}
