use std::fs::{self, File};
use std::io::{self, BufWriter};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use glob::glob;
use linecap_core::{ByteSource, Event, ReaderSource, StreamSummary, spawn_decoder};

mod output;
mod render;
mod serial;

use output::EventLog;
use render::FrameWriter;
use serial::{BAUD_RATES, DEFAULT_BAUD_RATE, parse_baud_rate};

#[derive(Parser, Debug)]
#[command(name = "linecap")]
#[command(version)]
#[command(
    about = "Decode serial camera streams (new-frame / end-of-line framing, RGB565) into frames.",
    long_about = None,
    after_help = "Examples:\n  linecap decode capture.bin --frames-dir frames\n  linecap decode - --stdout < capture.bin\n  linecap capture --port /dev/ttyUSB0 --baud 1000000 --frames-dir frames\n  linecap ports"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Decode a recorded byte stream (file, glob matching one file, or `-` for stdin).
    Decode {
        /// Path to a raw capture, or `-` to read stdin
        input: PathBuf,

        #[command(flatten)]
        output: OutputArgs,
    },
    /// Decode live from a serial port.
    Capture {
        /// Serial port name (see `linecap ports`)
        #[arg(short, long)]
        port: String,

        /// Baud rate
        #[arg(short, long, default_value_t = DEFAULT_BAUD_RATE, value_parser = parse_baud_rate)]
        baud: u32,

        /// Stop once this many frames have completed
        #[arg(long)]
        max_frames: Option<u64>,

        #[command(flatten)]
        output: OutputArgs,
    },
    /// List serial ports and supported baud rates.
    Ports,
}

#[derive(Args, Debug)]
struct OutputArgs {
    /// Write events as JSON lines to this file
    #[arg(short = 'o', long)]
    events: Option<PathBuf>,

    /// Write events as JSON lines to stdout
    #[arg(long, conflicts_with = "events")]
    stdout: bool,

    /// Include decoded RGB triples in line events
    #[arg(long)]
    with_pixels: bool,

    /// Write each completed frame as frame-NNNNN.ppm into this directory
    #[arg(long)]
    frames_dir: Option<PathBuf>,

    /// Print the JSON stream summary to stderr
    #[arg(long)]
    summary: bool,

    /// Suppress non-error output
    #[arg(long, conflicts_with = "verbose")]
    quiet: bool,

    /// Log decoder diagnostics
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Decode { input, output } => {
            init_logging(&output);
            cmd_decode(input, output)
        }
        Commands::Capture {
            port,
            baud,
            max_frames,
            output,
        } => {
            init_logging(&output);
            cmd_capture(port, baud, max_frames, output)
        }
        Commands::Ports => {
            env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn"))
                .init();
            cmd_ports()
        }
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("error: {}", err.message);
            if let Some(hint) = err.hint {
                eprintln!("hint: {}", hint);
            }
            ExitCode::from(2)
        }
    }
}

fn init_logging(output: &OutputArgs) {
    let level = if output.quiet {
        "error"
    } else if output.verbose {
        "debug"
    } else {
        "warn"
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();
}

#[derive(Debug)]
struct CliError {
    message: String,
    hint: Option<String>,
}

impl CliError {
    fn new(message: impl Into<String>, hint: Option<String>) -> Self {
        Self {
            message: message.into(),
            hint,
        }
    }
}

impl std::fmt::Display for CliError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for CliError {}

impl From<anyhow::Error> for CliError {
    fn from(err: anyhow::Error) -> Self {
        CliError::new(format!("{:#}", err), None)
    }
}

fn cmd_decode(input: PathBuf, output: OutputArgs) -> Result<(), CliError> {
    let source: Box<dyn ByteSource + Send> = if input.as_os_str() == "-" {
        Box::new(ReaderSource::new(io::stdin()))
    } else {
        let resolved = resolve_input_path(&input)?;
        validate_input_file(&resolved)?;
        let source = ReaderSource::open(&resolved)
            .with_context(|| format!("Failed to open input: {}", resolved.display()))?;
        Box::new(source)
    };

    let summary = run_stream(source, &output, None)?;
    report(&summary, &output)
}

fn cmd_capture(
    port: String,
    baud: u32,
    max_frames: Option<u64>,
    output: OutputArgs,
) -> Result<(), CliError> {
    if max_frames == Some(0) {
        return Err(CliError::new(
            "--max-frames must be at least 1",
            Some("omit the option to capture until interrupted".to_string()),
        ));
    }
    let source = serial::open_port(&port, baud).map_err(|err| {
        CliError::new(
            format!("failed to open serial port '{}': {}", port, err),
            Some("run `linecap ports` to list available ports".to_string()),
        )
    })?;
    if !output.quiet {
        eprintln!("Listening on {} at {} baud", port, baud);
    }

    let summary = run_stream(source, &output, max_frames)?;
    report(&summary, &output)
}

fn cmd_ports() -> Result<(), CliError> {
    let ports = serial::list_ports()
        .map_err(|err| CliError::new(format!("failed to enumerate serial ports: {}", err), None))?;
    if ports.is_empty() {
        println!("No serial ports found.");
    } else {
        println!("Serial ports:");
        for port in ports {
            println!("  {} ({})", port.name, port.kind);
        }
    }
    println!(
        "Baud rates: {} (default {})",
        BAUD_RATES
            .iter()
            .map(u32::to_string)
            .collect::<Vec<_>>()
            .join(", "),
        DEFAULT_BAUD_RATE
    );
    Ok(())
}

/// Decode on a worker thread and feed events to the configured outputs.
fn run_stream<S>(
    source: S,
    output: &OutputArgs,
    max_frames: Option<u64>,
) -> Result<StreamSummary, CliError>
where
    S: ByteSource + Send + 'static,
{
    let mut event_log = open_event_log(output)?;
    let mut frames = output
        .frames_dir
        .as_deref()
        .map(FrameWriter::create)
        .transpose()?;

    let handle = spawn_decoder(source).context("failed to start decoder")?;
    let mut frames_started = 0u64;
    for event in handle.events().iter() {
        let at_limit = max_frames.is_some_and(|max| frames_started >= max);
        if at_limit && matches!(event, Event::FrameStarted { .. }) {
            break;
        }
        if let Event::FrameStarted { .. } = event {
            frames_started += 1;
        }
        if let Some(event_log) = event_log.as_mut() {
            event_log.write(&event)?;
        }
        if let Some(frames) = frames.as_mut() {
            frames.handle(&event)?;
        }
        // The last frame may never be followed by another; stop on its final line.
        if max_frames.is_some_and(|max| frames_started >= max) && is_final_line(&event) {
            break;
        }
    }
    let summary = handle.join().context("decoding failed")?;

    if let Some(event_log) = event_log {
        event_log.finish()?;
    }
    if let Some(mut frames) = frames {
        frames.flush()?;
        if !output.quiet {
            eprintln!("OK: {} frame(s) written", frames.written().len());
        }
    }
    Ok(summary)
}

fn is_final_line(event: &Event) -> bool {
    match event {
        Event::LineCompleted(line) => line.index + 1 >= usize::from(line.height),
        Event::FrameStarted { .. } => false,
    }
}

fn open_event_log(output: &OutputArgs) -> Result<Option<EventLog>, CliError> {
    if output.stdout {
        let out = Box::new(BufWriter::new(io::stdout()));
        return Ok(Some(EventLog::new(out, output.with_pixels)));
    }
    let Some(path) = output.events.as_ref() else {
        return Ok(None);
    };
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create output directory: {}", parent.display())
            })?;
        }
    }
    let file = File::create(path)
        .with_context(|| format!("Failed to create event log: {}", path.display()))?;
    Ok(Some(EventLog::new(
        Box::new(BufWriter::new(file)),
        output.with_pixels,
    )))
}

fn report(summary: &StreamSummary, output: &OutputArgs) -> Result<(), CliError> {
    if output.summary {
        let json = serde_json::to_string_pretty(summary).context("JSON serialization failed")?;
        eprintln!("{}", json);
    }
    if summary.pending_bytes > 0 {
        log::warn!(
            "stream ended inside a command or pixel ({} byte(s) discarded)",
            summary.pending_bytes
        );
    }
    if !output.quiet {
        eprintln!(
            "OK: {} frame(s), {} line(s), {} pixel(s) decoded",
            summary.stats.frames_started,
            summary.stats.lines_completed,
            summary.stats.pixels_decoded
        );
    }
    Ok(())
}

fn validate_input_file(input: &Path) -> Result<(), CliError> {
    if !input.exists() {
        return Err(CliError::new(
            format!("input file not found: {}", input.display()),
            Some("pass a raw capture file, or `-` to read stdin".to_string()),
        ));
    }
    if !input.is_file() {
        return Err(CliError::new(
            format!("input is not a file: {}", input.display()),
            Some("pass a raw capture file, or `-` to read stdin".to_string()),
        ));
    }
    Ok(())
}

fn resolve_input_path(input: &Path) -> Result<PathBuf, CliError> {
    let pattern = input.to_string_lossy();
    if !is_glob_pattern(&pattern) {
        return Ok(input.to_path_buf());
    }

    let mut matches = Vec::new();
    let paths = glob(&pattern).map_err(|err| {
        CliError::new(
            format!("invalid input pattern '{}'", pattern),
            Some(format!("pattern error: {}", err.msg)),
        )
    })?;
    for entry in paths {
        let path = entry.map_err(|err| {
            CliError::new(
                format!("invalid input pattern '{}'", pattern),
                Some(format!("pattern error: {}", err)),
            )
        })?;
        if path.is_file() {
            matches.push(path);
        }
    }

    if matches.is_empty() {
        return Err(CliError::new(
            format!("no files match pattern '{}'", pattern),
            Some("check the path or quote the pattern".to_string()),
        ));
    }
    if matches.len() > 1 {
        let listed = matches
            .iter()
            .take(3)
            .map(|p| p.display().to_string())
            .collect::<Vec<_>>()
            .join(", ");
        let more = if matches.len() > 3 { ", ..." } else { "" };
        return Err(CliError::new(
            format!(
                "multiple files match pattern '{}' ({} matches); matches: {}{}",
                pattern,
                matches.len(),
                listed,
                more
            ),
            Some("pass a single capture file, or run once per file".to_string()),
        ));
    }

    Ok(matches.remove(0))
}

fn is_glob_pattern(input: &str) -> bool {
    input.contains('*') || input.contains('?') || input.contains('[')
}
