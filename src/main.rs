#![forbid(unsafe_code)]

//! `jpm-relay`: console front end for the request relay.
//!
//! Reads one request per stdin line, runs it through the session controller,
//! and prints the resulting notifications. Logs go to stderr so stdout stays
//! a clean transcript.

use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use std::sync::Arc;

use clap::{ArgAction, Parser, ValueEnum};
use tokio::sync::mpsc::UnboundedReceiver;
use tracing::{error, info};
use tracing_subscriber::{fmt, EnvFilter};

use jpm_relay::models::session::SessionEvent;
use jpm_relay::runner::{CommandRunner, Interpreter};
use jpm_relay::session::SessionController;
use jpm_relay::supervisor::ProcessSupervisor;
use jpm_relay::{AppError, RelayConfig, Result};

#[derive(Debug, Copy, Clone, Eq, PartialEq, ValueEnum)]
enum LogFormat {
    Text,
    Json,
}

#[derive(Debug, Copy, Clone, Eq, PartialEq, ValueEnum)]
enum EventFormat {
    Text,
    Json,
}

#[derive(Debug, Parser)]
#[command(name = "jpm-relay", about = "Relay chat input to a jpm worker process", version, long_about = None)]
struct Cli {
    /// Path to the TOML configuration file.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Override the worker script path.
    #[arg(long)]
    script: Option<PathBuf>,

    /// Use this interpreter without probing candidates.
    #[arg(long)]
    interpreter: Option<String>,

    /// Log output format (text or json).
    #[arg(long, value_enum, default_value_t = LogFormat::Text)]
    log_format: LogFormat,

    /// Transcript format on stdout (text or json lines).
    #[arg(long, value_enum, default_value_t = EventFormat::Text)]
    events: EventFormat,

    /// Raise log verbosity (-v debug, -vv trace).
    #[arg(short, long, action = ArgAction::Count)]
    verbose: u8,
}

fn main() -> Result<()> {
    let args = Cli::parse();

    let mut config = match &args.config {
        Some(path) => RelayConfig::load_from_path(path)?,
        None => RelayConfig::default(),
    };
    if let Some(script) = args.script.clone() {
        config.script_path = script;
    }
    config.validate()?;

    init_tracing(args.log_format, &log_directive(&config.log_level, args.verbose))?;
    info!("jpm-relay bootstrap");

    let config = Arc::new(config);
    let supervisor = Arc::new(ProcessSupervisor::new(&config)?);
    let runner = match args.interpreter.clone() {
        Some(program) => CommandRunner::with_interpreter(
            Arc::clone(&config),
            Interpreter {
                program,
                available: true,
            },
        ),
        None => CommandRunner::new(Arc::clone(&config)),
    };
    let (controller, mut events) =
        SessionController::new(Arc::new(runner), Arc::clone(&supervisor));

    let result = run(&controller, &supervisor, &mut events, args.events);

    supervisor.shutdown();
    // Anything published during shutdown, such as an interrupted request.
    let mut out = io::stdout().lock();
    while let Ok(event) = events.try_recv() {
        print_event(&mut out, &event, args.events)?;
    }
    info!("jpm-relay shut down");

    result
}

fn run(
    controller: &SessionController,
    supervisor: &ProcessSupervisor,
    events: &mut UnboundedReceiver<SessionEvent>,
    format: EventFormat,
) -> Result<()> {
    let stdin = io::stdin();
    for line in stdin.lock().lines() {
        let line = line?;
        let seq = match controller.submit(&line) {
            Ok(seq) => seq,
            Err(AppError::InvalidInput(_)) => continue,
            Err(err) => {
                error!(%err, "submission rejected");
                continue;
            }
        };

        loop {
            let next = supervisor.block_on(async {
                tokio::select! {
                    event = events.recv() => event,
                    _ = tokio::signal::ctrl_c() => None,
                }
            });
            let Some(event) = next else {
                info!("interrupt received");
                return Ok(());
            };

            print_event(&mut io::stdout().lock(), &event, format)?;
            if matches!(event, SessionEvent::Finished { seq: done, .. } if done == seq) {
                break;
            }
        }
    }
    Ok(())
}

fn print_event(out: &mut impl Write, event: &SessionEvent, format: EventFormat) -> Result<()> {
    match format {
        EventFormat::Json => {
            let json = serde_json::to_string(event)
                .map_err(|err| AppError::Io(format!("failed to encode event: {err}")))?;
            writeln!(out, "{json}")?;
        }
        EventFormat::Text => match event {
            SessionEvent::Status { text } => writeln!(out, "... {text}")?,
            SessionEvent::Message { text } => writeln!(out, "jpm> {text}")?,
            SessionEvent::Finished { outcome, .. } if !outcome.is_success() => {
                writeln!(out, "[{outcome}]")?;
            }
            SessionEvent::Busy { .. } | SessionEvent::StatusCleared | SessionEvent::Finished { .. } => {}
        },
    }
    out.flush()?;
    Ok(())
}

fn log_directive(configured: &str, verbose: u8) -> String {
    match verbose {
        0 => configured.to_owned(),
        1 => "debug".to_owned(),
        _ => "trace".to_owned(),
    }
}

fn init_tracing(log_format: LogFormat, directive: &str) -> Result<()> {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(directive));
    let subscriber = fmt().with_env_filter(env_filter).with_writer(io::stderr);

    match log_format {
        LogFormat::Text => subscriber
            .try_init()
            .map_err(|err| AppError::Config(format!("failed to init tracing: {err}")))?,
        LogFormat::Json => subscriber
            .json()
            .try_init()
            .map_err(|err| AppError::Config(format!("failed to init tracing: {err}")))?,
    }

    Ok(())
}
