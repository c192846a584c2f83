//! Hybrid Scanner CLI
//!
//! Command-line interface for sealing secrets into payload pairs,
//! recovering them, and replaying a scripted scan session.

use clap::{Parser, Subcommand};
use hybrid_scanner::{
    batch::ScanMode,
    capture::{CaptureError, ConfigError, FileConfig, FrameSource, MockSource},
    decode::{DualCodeDecoder, InlineLinearDecoder, LinearDecoder, ScriptedScene, ThreadedLinearDecoder},
    keys::MasterKey,
    metrics::{MetricsError, MetricsRegistry, MetricsSnapshot},
    recovery::{seal, seal_with_salt_hex, RecoveryError, SealError, SecretRecoveryEngine},
    samples::SampleGenerator,
    sampler::Session,
};
use std::path::PathBuf;
use thiserror::Error;
use tracing::{info, warn};

#[derive(Parser)]
#[command(name = "hybrid-scanner")]
#[command(version = hybrid_scanner::VERSION)]
#[command(about = "Recover secrets split across a matrix code and a linear barcode")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Seal a secret into a matrix/linear payload pair
    Seal {
        /// Secret to seal
        #[arg(short, long)]
        secret: String,

        /// Salt as 32 hex digits (random if omitted)
        #[arg(long)]
        salt: Option<String>,
    },

    /// Recover a secret from a payload pair
    Open {
        /// Matrix payload (saltHex|ciphertextPart1)
        #[arg(short, long)]
        matrix: String,

        /// Linear payload (ciphertextPart2)
        #[arg(short, long)]
        linear: String,
    },

    /// Play generated samples through a full scan session
    Demo {
        /// TOML configuration file
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Accumulate results instead of keeping the latest one
        #[arg(long)]
        batch: bool,

        /// Stop after this many results (batch mode, 0 = unbounded)
        #[arg(long)]
        target: Option<usize>,

        /// Number of sample pairs to show
        #[arg(long, default_value_t = 3)]
        count: usize,

        /// Seed for reproducible samples
        #[arg(long)]
        seed: Option<u64>,

        /// Run linear decodes on a worker thread
        #[arg(long)]
        threaded: bool,

        /// Print Prometheus metrics when the session ends
        #[arg(long)]
        print_metrics: bool,
    },

    /// Print the assembled master key as UTF-8 hex
    MasterKey,
}

#[derive(Debug, Error)]
enum CliError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Capture(#[from] CaptureError),
    #[error(transparent)]
    Seal(#[from] SealError),
    #[error(transparent)]
    Recovery(#[from] RecoveryError),
    #[error(transparent)]
    Metrics(#[from] MetricsError),
    #[error("failed to install signal handler: {0}")]
    Signal(#[from] ctrlc::Error),
}

fn main() {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    let cli = Cli::parse();

    if let Err(e) = run(cli) {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> Result<(), CliError> {
    match cli.command {
        Commands::Seal { secret, salt } => {
            let master = MasterKey::global();
            let pair = match salt {
                Some(salt) => seal_with_salt_hex(master, &secret, &salt)?,
                None => seal(master, &secret),
            };
            println!("matrix: {}", pair.matrix);
            println!("linear: {}", pair.linear);
        }

        Commands::Open { matrix, linear } => {
            let engine = SecretRecoveryEngine::default();
            let secret = engine.recover(&matrix, &linear)?;
            println!("{}", secret);
        }

        Commands::Demo {
            config,
            batch,
            target,
            count,
            seed,
            threaded,
            print_metrics,
        } => {
            let mut file_config = match config {
                Some(path) => FileConfig::from_file(path)?,
                None => FileConfig::default(),
            };
            if batch {
                file_config.scan.batch = true;
            }
            if let Some(target) = target {
                file_config.scan.target = target;
            }

            let options = DemoOptions {
                count,
                seed,
                threaded,
                print_metrics,
            };
            demo(&file_config, &options)?;
        }

        Commands::MasterKey => {
            println!("{}", hex::encode(MasterKey::global().password()));
        }
    }

    Ok(())
}

struct DemoOptions {
    count: usize,
    seed: Option<u64>,
    threaded: bool,
    print_metrics: bool,
}

/// Frames between the start of two consecutive sample pairs.
const FRAMES_PER_SAMPLE: u64 = 3;

fn demo(config: &FileConfig, options: &DemoOptions) -> Result<(), CliError> {
    info!("Hybrid Scanner v{}", hybrid_scanner::VERSION);
    info!("This is a demonstration using mock video input and scripted decoders");

    let engine = SecretRecoveryEngine::default();
    let mut generator = match options.seed {
        Some(seed) => SampleGenerator::from_seed(seed, engine.master_key().clone()),
        None => SampleGenerator::from_os_entropy(engine.master_key().clone()),
    };

    let samples = generator.batch(options.count);
    let scene = samples
        .iter()
        .enumerate()
        .fold(ScriptedScene::new(), |scene, (i, sample)| {
            scene.present(1 + i as u64 * FRAMES_PER_SAMPLE, &sample.pair)
        });
    for sample in &samples {
        info!(matrix = %sample.pair.matrix, linear = %sample.pair.linear, "Showing sample");
    }
    let max_ticks = scene.last_sequence() + FRAMES_PER_SAMPLE;

    let (matrix, linear) = scene.into_decoders();
    let linear: Box<dyn LinearDecoder> = if options.threaded {
        Box::new(ThreadedLinearDecoder::new(linear))
    } else {
        Box::new(InlineLinearDecoder::new(linear))
    };

    let mut source = MockSource::new();
    source.open(&config.capture)?;

    let decoder = DualCodeDecoder::new(matrix, linear, config.linear.clone());
    let mut session = Session::new(source, decoder, engine).with_tick_interval(config.capture.tick_interval());
    let events = session.events();

    let stop = session.stop_handle();
    ctrlc::set_handler(move || stop.request_stop())?;

    let registry = MetricsRegistry::new()?;
    #[cfg(feature = "metrics")]
    let server_state = start_metrics_server(config.output.metrics_port)?;

    session.start(ScanMode::from_config(&config.scan));
    let ticks = session.run_with(Some(max_ticks), |session| {
        let snapshot = MetricsSnapshot::from_stats(&session.stats());
        registry.update(&snapshot);
        #[cfg(feature = "metrics")]
        if let Some(state) = &server_state {
            state.blocking_write().update(&snapshot);
        }
    });
    session.stop();
    registry.update(&MetricsSnapshot::from_stats(&session.stats()));

    for event in events.try_iter() {
        println!("{}", event);
    }

    let stats = session.stats();
    info!(
        ticks,
        frames = stats.frames,
        attempts = stats.recovery_attempts,
        failures = stats.failures(),
        found = stats.secrets_found,
        "Session finished"
    );
    if stats.secrets_found < samples.len() as u64 && !session.mode().is_batch() {
        warn!(
            shown = samples.len(),
            found = stats.secrets_found,
            "Not every sample was recovered"
        );
    }

    if options.print_metrics {
        print!("{}", registry.encode()?);
    }

    Ok(())
}

#[cfg(feature = "metrics")]
fn start_metrics_server(
    port: u16,
) -> Result<Option<std::sync::Arc<tokio::sync::RwLock<hybrid_scanner::metrics::MetricsState>>>, CliError> {
    use hybrid_scanner::metrics::{MetricsServer, MetricsServerConfig};

    if port == 0 {
        return Ok(None);
    }

    let server = MetricsServer::new(MetricsServerConfig::with_port(port), MetricsRegistry::new()?);
    let state = server.state();

    std::thread::spawn(move || {
        let runtime = match tokio::runtime::Builder::new_multi_thread().enable_all().build() {
            Ok(runtime) => runtime,
            Err(e) => {
                warn!(error = %e, "Failed to start metrics runtime");
                return;
            }
        };
        if let Err(e) = runtime.block_on(server.run()) {
            warn!(error = %e, "Metrics server stopped");
        }
    });

    Ok(Some(state))
}
