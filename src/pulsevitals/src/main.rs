#[macro_use]
extern crate log;

use std::{
    fs, io,
    path::{Path, PathBuf},
    sync::{
        Arc,
        atomic::{AtomicBool, Ordering},
    },
    thread,
    time::{Duration, Instant},
};

use anyhow::{Context, anyhow};
use clap::{CommandFactory, Parser, Subcommand, ValueEnum};
use clap_complete::Shell;
use dotenv::dotenv;
use pulsevitals::{
    ClockedSource, DisplaySink, SampleSource, VitalsController,
    sink::{JsonSink, TerminalSink},
    source::{CaptureSource, FingerOff, PpgSynth, Recorder, SynthSource, channel},
};
use pulsevitals_codec::encode_capture;
use pulsevitals_types::{VitalsConfig, VitalsError};

const TICK: Duration = Duration::from_millis(10);
const CHANNEL_BOUND: usize = 1024;
const SPARKLINE_COLUMNS: usize = 64;

#[derive(Parser)]
#[command(version, about = "Heart rate and SpO2 from a red/IR PPG stream")]
pub struct PulseVitalsCli {
    /// JSON file with pipeline settings. Missing fields keep their defaults.
    #[arg(env = "PULSEVITALS_CONFIG", long)]
    pub config: Option<PathBuf>,
    #[arg(env, long)]
    pub finger_threshold: Option<u32>,
    #[arg(env, long)]
    pub compute_interval_ms: Option<u64>,
    #[arg(env, long)]
    pub draw_interval_ms: Option<u64>,
    #[arg(long, value_enum, default_value_t = OutputFormat::Terminal)]
    pub output: OutputFormat,
    /// Leave the waveform out of JSON output
    #[arg(long)]
    pub no_waveform: bool,
    #[clap(subcommand)]
    pub subcommand: PulseVitalsCommand,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Terminal,
    Json,
}

#[derive(Subcommand)]
pub enum PulseVitalsCommand {
    ///
    /// Run the pipeline on a synthetic finger
    ///
    Simulate {
        #[arg(long, default_value_t = 72.0)]
        bpm: f64,
        #[arg(long, default_value_t = 97.0)]
        spo2: f64,
        #[arg(long, default_value_t = 50)]
        sample_rate: u32,
        /// Noise bound in ADC counts
        #[arg(long, default_value_t = 20)]
        noise: u32,
        /// Seconds without a finger, e.g. `10-13`. May be repeated.
        #[arg(long)]
        finger_off: Vec<FingerOff>,
        /// Stop after this many seconds
        #[arg(long)]
        duration: Option<f64>,
        /// Run on a virtual clock instead of wall time
        #[arg(long, requires = "duration")]
        fast: bool,
        /// Write the generated samples to a capture file
        #[arg(long)]
        record: Option<PathBuf>,
        #[arg(long)]
        seed: Option<u64>,
    },
    ///
    /// Run the pipeline over a recorded capture file
    ///
    Replay { capture: PathBuf },
    ///
    /// Generate shell completions
    ///
    Completions { shell: Shell },
}

fn main() -> anyhow::Result<()> {
    if let Err(error) = dotenv() {
        println!("{}", error);
    }

    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = PulseVitalsCli::parse();
    let running = Arc::new(AtomicBool::new(true));
    {
        let running = running.clone();
        ctrlc::set_handler(move || running.store(false, Ordering::SeqCst))?;
    }

    match cli.subcommand {
        PulseVitalsCommand::Simulate {
            bpm,
            spo2,
            sample_rate,
            noise,
            ref finger_off,
            duration,
            fast,
            ref record,
            seed,
        } => {
            let config = load_config(&cli)?;
            let synth = PpgSynth {
                sample_rate_hz: sample_rate,
                bpm,
                spo2,
                noise,
                finger_off: finger_off.clone(),
                ..Default::default()
            };
            let seed = seed.unwrap_or_else(rand::random);
            debug!("synthetic source seed {}", seed);

            let mut source = SynthSource::new(synth, &config.spo2, seed)?;
            if let Some(duration) = duration {
                source = source.with_end((duration * 1000.0) as u64);
            }

            let sink = make_sink(&cli);
            if fast {
                let source = recorder(source, record.as_deref());
                let mut controller = VitalsController::new(config, source, sink)?;
                run_virtual(&mut controller, 0, &running)?;
                report(&controller);

                let (source, _) = controller.into_parts();
                write_capture(&source, record.as_deref())
            } else {
                simulate_realtime(config, source, sink, record.as_deref(), running)
            }
        }
        PulseVitalsCommand::Replay { ref capture } => {
            let config = load_config(&cli)?;
            let bytes = fs::read(capture)
                .with_context(|| format!("reading capture {}", capture.display()))?;
            let source = CaptureSource::from_bytes(&bytes)?;
            info!(
                "replaying {} samples from {}",
                source.len(),
                capture.display()
            );

            let start_ms = source.start_ms().unwrap_or_default();
            let mut controller = VitalsController::new(config, source, make_sink(&cli))?;
            run_virtual(&mut controller, start_ms, &running)?;
            report(&controller);
            Ok(())
        }
        PulseVitalsCommand::Completions { shell } => {
            let mut command = PulseVitalsCli::command();
            let name = command.get_name().to_owned();
            clap_complete::generate(shell, &mut command, name, &mut io::stdout());
            Ok(())
        }
    }
}

fn load_config(cli: &PulseVitalsCli) -> anyhow::Result<VitalsConfig> {
    let mut config = match &cli.config {
        Some(path) => {
            let text = fs::read_to_string(path)
                .with_context(|| format!("reading config {}", path.display()))?;
            serde_json::from_str(&text)
                .with_context(|| format!("parsing config {}", path.display()))?
        }
        None => VitalsConfig::default(),
    };

    if let Some(threshold) = cli.finger_threshold {
        config.finger.threshold = threshold;
    }
    if let Some(interval) = cli.compute_interval_ms {
        config.cadence.compute_interval_ms = interval;
    }
    if let Some(interval) = cli.draw_interval_ms {
        config.cadence.draw_interval_ms = interval;
    }

    config.validate()?;
    Ok(config)
}

fn make_sink(cli: &PulseVitalsCli) -> Box<dyn DisplaySink> {
    match cli.output {
        OutputFormat::Terminal => Box::new(TerminalSink::new(io::stdout(), SPARKLINE_COLUMNS)),
        OutputFormat::Json => Box::new(JsonSink::new(io::stdout(), !cli.no_waveform)),
    }
}

fn recorder<S>(source: S, record: Option<&Path>) -> Recorder<S> {
    match record {
        Some(_) => Recorder::new(source),
        None => Recorder::passthrough(source),
    }
}

fn run_virtual<S: ClockedSource, D: DisplaySink>(
    controller: &mut VitalsController<S, D>,
    start_ms: u64,
    running: &AtomicBool,
) -> anyhow::Result<()> {
    let step = TICK.as_millis() as u64;
    let mut now = start_ms;
    while running.load(Ordering::SeqCst) && !controller.source().is_exhausted() {
        controller.source_mut().advance_to(now);
        controller.tick(now)?;
        now += step;
    }
    Ok(())
}

fn simulate_realtime<D: DisplaySink>(
    config: VitalsConfig,
    mut synth: SynthSource,
    sink: D,
    record: Option<&Path>,
    running: Arc<AtomicBool>,
) -> anyhow::Result<()> {
    let (sender, source) = channel(CHANNEL_BOUND);

    let producer = {
        let running = running.clone();
        thread::spawn(move || -> Result<(), VitalsError> {
            let start = Instant::now();
            let mut batch = Vec::new();
            while running.load(Ordering::SeqCst) && !synth.is_exhausted() {
                thread::sleep(TICK);
                synth.advance_to(start.elapsed().as_millis() as u64);
                synth.drain(&mut batch)?;
                for sample in batch.drain(..) {
                    sender.send(sample)?;
                }
            }
            Ok(())
        })
    };

    let mut controller = VitalsController::new(config, recorder(source, record), sink)?;
    let start = Instant::now();
    while running.load(Ordering::SeqCst) {
        thread::sleep(TICK);
        match controller.tick(start.elapsed().as_millis() as u64) {
            Ok(()) => {}
            Err(VitalsError::SourceDisconnected) => break,
            Err(error) => return Err(error.into()),
        }
    }
    running.store(false, Ordering::SeqCst);

    report(&controller);
    let (source, _) = controller.into_parts();
    let result = write_capture(&source, record);

    match producer.join() {
        Ok(Ok(())) | Ok(Err(VitalsError::SourceDisconnected)) => {}
        Ok(Err(error)) => warn!("producer stopped: {}", error),
        Err(_) => return Err(anyhow!("producer thread panicked")),
    }
    result
}

fn report<S: SampleSource, D: DisplaySink>(controller: &VitalsController<S, D>) {
    println!();
    info!(
        "session ended in state {}, bpm {:?}, spo2 {:?}, {} samples rejected",
        controller.state(),
        controller.bpm(),
        controller.spo2(),
        controller.rejected_samples()
    );
}

fn write_capture<S>(recorder: &Recorder<S>, record: Option<&Path>) -> anyhow::Result<()> {
    let Some(path) = record else {
        return Ok(());
    };

    let bytes = encode_capture(recorder.samples())?;
    fs::write(path, &bytes).with_context(|| format!("writing capture {}", path.display()))?;
    info!(
        "recorded {} samples to {}",
        recorder.samples().len(),
        path.display()
    );
    Ok(())
}
