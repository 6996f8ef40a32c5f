//! CLI argument definitions using clap.

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

use contracts::SinkType;

/// A2DP Bridge - audio sink concurrency bridge driven by a mock protocol engine
#[derive(Parser, Debug)]
#[command(
    name = "a2dp-bridge",
    author,
    version,
    about = "A2DP sink event dispatch and audio streaming bridge",
    long_about = "Runs the profile event dispatch queue and the PCM audio stream \n\
                  against a simulated protocol engine, writing audio to the \n\
                  configured sink."
)]
pub struct Cli {
    /// Increase logging verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true, env = "A2DP_BRIDGE_VERBOSE")]
    pub verbose: u8,

    /// Suppress all output except warnings and errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Log output format
    #[arg(
        long,
        value_enum,
        default_value = "pretty",
        global = true,
        env = "A2DP_BRIDGE_LOG_FORMAT"
    )]
    pub log_format: LogFormat,

    #[command(subcommand)]
    pub command: Commands,
}

/// Available CLI commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run the bridge against the mock protocol engine
    Run(RunArgs),

    /// Validate configuration file without running
    Validate(ValidateArgs),
}

/// Arguments for the `run` command
#[derive(Parser, Debug, Clone)]
pub struct RunArgs {
    /// Path to configuration file (TOML or JSON); built-in defaults if omitted
    #[arg(short, long, env = "A2DP_BRIDGE_CONFIG")]
    pub config: Option<PathBuf>,

    /// Run time in seconds (0 = until Ctrl+C)
    #[arg(short, long, default_value = "0", env = "A2DP_BRIDGE_DURATION")]
    pub duration: u64,

    /// Frequency of the generated test tone (Hz)
    #[arg(long, default_value = "440", env = "A2DP_BRIDGE_TONE_HZ")]
    pub tone_hz: f64,

    /// Override the sink type from configuration
    #[arg(long, value_enum, env = "A2DP_BRIDGE_SINK")]
    pub sink: Option<SinkKind>,

    /// Output file for the file sink
    #[arg(short, long, env = "A2DP_BRIDGE_OUTPUT")]
    pub output: Option<PathBuf>,

    /// Send audio as fast as possible instead of in real time
    #[arg(long)]
    pub unpaced: bool,

    /// Buffer occupancy sampling interval in milliseconds
    #[arg(long, default_value = "100", env = "A2DP_BRIDGE_SAMPLE_INTERVAL_MS")]
    pub sample_interval_ms: u64,

    /// Metrics server port (0 = disabled)
    #[arg(long, default_value = "0", env = "A2DP_BRIDGE_METRICS_PORT")]
    pub metrics_port: u16,

    /// Validate configuration and exit without running
    #[arg(long)]
    pub dry_run: bool,
}

/// Arguments for the `validate` command
#[derive(Parser, Debug)]
pub struct ValidateArgs {
    /// Path to configuration file to validate
    #[arg(short, long, default_value = "bridge.toml")]
    pub config: PathBuf,

    /// Output validation result as JSON
    #[arg(long)]
    pub json: bool,
}

/// Sink selection on the command line
#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum SinkKind {
    /// Log every write
    Log,
    /// Raw PCM file
    File,
    /// Discard everything
    Null,
}

impl From<SinkKind> for SinkType {
    fn from(kind: SinkKind) -> Self {
        match kind {
            SinkKind::Log => SinkType::Log,
            SinkKind::File => SinkType::File,
            SinkKind::Null => SinkType::Null,
        }
    }
}

/// Log output format
#[derive(ValueEnum, Clone, Debug, Default)]
pub enum LogFormat {
    /// JSON structured logging
    Json,
    /// Human-readable pretty format
    #[default]
    Pretty,
    /// Compact single-line format
    Compact,
}

impl From<LogFormat> for observability::LogFormat {
    fn from(format: LogFormat) -> Self {
        match format {
            LogFormat::Json => Self::Json,
            LogFormat::Pretty => Self::Pretty,
            LogFormat::Compact => Self::Compact,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_run_overrides_parse() {
        let cli = Cli::try_parse_from([
            "a2dp-bridge",
            "-v",
            "run",
            "--duration",
            "3",
            "--sink",
            "file",
            "--output",
            "out.pcm",
            "--unpaced",
        ])
        .unwrap();

        assert_eq!(cli.verbose, 1);
        match cli.command {
            Commands::Run(args) => {
                assert_eq!(args.duration, 3);
                assert_eq!(args.sink, Some(SinkKind::File));
                assert_eq!(args.output, Some(PathBuf::from("out.pcm")));
                assert!(args.unpaced);
                assert!(args.config.is_none());
            }
            other => panic!("expected run command, got {other:?}"),
        }
    }

    #[test]
    fn test_quiet_conflicts_with_verbose() {
        assert!(Cli::try_parse_from(["a2dp-bridge", "-q", "-v", "validate"]).is_err());
    }
}
