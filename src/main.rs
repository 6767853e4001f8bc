use std::{
    fs, io,
    path::{Path, PathBuf},
};

use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand, ValueEnum};
use log::{info, LevelFilter};

use parapose::{
    logging::Logger,
    runtime::{self, QuitFlag, RunSummary},
    sink::{format_frame, CsvSink, RecordingSink},
    Controller, ControllerConfig, Trace,
};

const DEFAULT_CONFIG_PATH: &str = "config/controller.toml";

#[derive(Debug, Parser)]
#[command(name = "parapose")]
#[command(about = "Pose and gesture driven joystick controller")]
struct Cli {
    #[arg(long = "log-level", value_enum, default_value_t = LogLevel::Info, global = true)]
    log_level: LogLevel,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum LogLevel {
    Off,
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl From<LogLevel> for LevelFilter {
    fn from(level: LogLevel) -> Self {
        match level {
            LogLevel::Off => LevelFilter::Off,
            LogLevel::Error => LevelFilter::Error,
            LogLevel::Warn => LevelFilter::Warn,
            LogLevel::Info => LevelFilter::Info,
            LogLevel::Debug => LevelFilter::Debug,
            LogLevel::Trace => LevelFilter::Trace,
        }
    }
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Replay a recorded trace tick by tick, as fast as possible.
    Replay(ReplayArgs),
    /// Feed a trace through producer threads in real time; `q` on stdin stops it.
    Run(RunArgs),
    /// Parse and validate a controller config.
    CheckConfig(CheckConfigArgs),
}

#[derive(Debug, Args)]
struct ReplayArgs {
    trace: PathBuf,
    #[arg(long)]
    config: Option<PathBuf>,
    /// Output frames file; stdout when omitted.
    #[arg(long)]
    output: Option<PathBuf>,
    /// Expected `output,...` lines to compare against.
    #[arg(long)]
    expect: Option<PathBuf>,
}

#[derive(Debug, Args)]
struct RunArgs {
    trace: PathBuf,
    #[arg(long)]
    config: Option<PathBuf>,
    #[arg(long)]
    output: Option<PathBuf>,
    #[arg(long = "max-ticks")]
    max_ticks: Option<u64>,
}

#[derive(Debug, Args)]
struct CheckConfigArgs {
    path: PathBuf,
}

fn load_config(path: Option<&Path>) -> Result<ControllerConfig> {
    match path {
        Some(path) => ControllerConfig::from_path(path)
            .with_context(|| format!("loading config {}", path.display())),
        None if Path::new(DEFAULT_CONFIG_PATH).exists() => {
            ControllerConfig::from_path(Path::new(DEFAULT_CONFIG_PATH))
                .with_context(|| format!("loading config {DEFAULT_CONFIG_PATH}"))
        }
        None => Ok(ControllerConfig::default()),
    }
}

fn open_sink(output: Option<&Path>) -> Result<CsvSink> {
    match output {
        Some(path) => CsvSink::create(path).context("opening output sink"),
        None => Ok(CsvSink::stdout()),
    }
}

fn load_trace(path: &Path) -> Result<Trace> {
    Trace::from_path(path).with_context(|| format!("loading trace {}", path.display()))
}

fn run_replay(args: ReplayArgs) -> Result<()> {
    let config = load_config(args.config.as_deref())?;
    let trace = load_trace(&args.trace)?;

    let summary = if let Some(expect_path) = &args.expect {
        let mut recording = RecordingSink::new();
        let summary = runtime::replay_trace(
            &trace,
            Controller::new(&config),
            &mut recording,
            &config.runtime,
        )?;
        let actual: Vec<String> = recording
            .frames()
            .iter()
            .enumerate()
            .map(|(seq, frame)| format_frame(seq as u64, frame))
            .collect();

        let mut sink = open_sink(args.output.as_deref())?;
        write_frames(&mut sink, &recording)?;
        compare_expected(expect_path, &actual)?;
        summary
    } else {
        let mut sink = open_sink(args.output.as_deref())?;
        let summary =
            runtime::replay_trace(&trace, Controller::new(&config), &mut sink, &config.runtime)?;
        info!("frames written={}", sink.frames_written());
        summary
    };

    log_summary(&summary);
    Ok(())
}

fn write_frames(sink: &mut CsvSink, recording: &RecordingSink) -> Result<()> {
    use parapose::OutputSink as _;

    for frame in recording.frames() {
        sink.write_frame(frame)?;
    }
    sink.release()?;
    info!("frames written={}", sink.frames_written());
    Ok(())
}

fn compare_expected(path: &Path, actual: &[String]) -> Result<()> {
    let raw = fs::read_to_string(path)
        .with_context(|| format!("reading expected output {}", path.display()))?;
    let expected: Vec<&str> = raw
        .lines()
        .map(str::trim)
        .filter(|line| line.starts_with("output,"))
        .collect();

    if let Some(idx) = expected
        .iter()
        .zip(actual)
        .position(|(expected, actual)| *expected != actual.as_str())
    {
        eprintln!("expected: {}", expected[idx]);
        eprintln!("actual:   {}", actual[idx]);
        bail!("output mismatch at frame {idx}");
    }
    if expected.len() != actual.len() {
        bail!(
            "output length mismatch: expected {} frames, got {}",
            expected.len(),
            actual.len()
        );
    }
    info!("output matches {} ({} frames)", path.display(), actual.len());
    Ok(())
}

fn run_live(args: RunArgs) -> Result<()> {
    let config = load_config(args.config.as_deref())?;
    let trace = load_trace(&args.trace)?;
    let mut sink = open_sink(args.output.as_deref())?;

    let quit = QuitFlag::new();
    // Never joined; it can stay blocked on stdin until exit.
    let _watcher = runtime::spawn_quit_watcher(io::BufReader::new(io::stdin()), quit.clone());
    info!("live run started; enter `q` to stop");
    let summary = runtime::run_live(
        &trace,
        Controller::new(&config),
        &mut sink,
        &config.runtime,
        &quit,
        args.max_ticks,
    )?;
    info!("frames written={}", sink.frames_written());
    log_summary(&summary);
    Ok(())
}

fn check_config(args: CheckConfigArgs) -> Result<()> {
    let config = ControllerConfig::from_path(&args.path)
        .with_context(|| format!("checking config {}", args.path.display()))?;
    println!("{config:#?}");
    Ok(())
}

fn log_summary(summary: &RunSummary) {
    info!(
        "session done ticks={} no_pose={} sink_failures={} baselines={}",
        summary.ticks,
        summary.telemetry.ticks_without_pose,
        summary.telemetry.sink_write_failures,
        summary.telemetry.baselines_installed
    );
}

fn run(cli: Cli) -> Result<()> {
    Logger::from_env(cli.log_level.into())
        .context("opening JSON log")?
        .install()
        .context("installing logger")?;

    match cli.command {
        Commands::Replay(args) => run_replay(args),
        Commands::Run(args) => run_live(args),
        Commands::CheckConfig(args) => check_config(args),
    }
}

fn main() {
    let cli = Cli::parse();
    if let Err(err) = run(cli) {
        eprintln!("error: {err:?}");
        std::process::exit(1);
    }
}
