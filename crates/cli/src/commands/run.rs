//! `run` command implementation.

use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::Result;
use bridge::{Bridge, MockEngineConfig, MockProtocolEngine, ProfileHandlers};
use config_loader::{BridgeConfig, ConfigLoader};
use contracts::SinkType;
use observability::RunningStats;
use tracing::{info, warn};

use crate::cli::RunArgs;
use crate::error::CliError;
use crate::stats::RunStats;

/// Execute the `run` command
pub async fn run_bridge(args: &RunArgs) -> Result<()> {
    let config = load_config(args)?;

    info!(
        queue_capacity = config.dispatch.queue_capacity,
        ring_capacity = config.audio.ring_capacity,
        max_chunk_len = config.audio.max_chunk_len,
        sink = %config.sink.name,
        sink_type = ?config.sink.sink_type,
        "Configuration loaded"
    );

    if args.dry_run {
        info!("Dry run mode - configuration is valid, exiting");
        print_config_summary(&config);
        return Ok(());
    }

    let bridge = Bridge::from_config(&config).map_err(CliError::from)?;
    bridge.start().map_err(CliError::from)?;

    let router = Arc::new(bridge.router(ProfileHandlers::default()));
    let engine = MockProtocolEngine::new(
        MockEngineConfig {
            tone_hz: args.tone_hz,
            paced: !args.unpaced,
            ..MockEngineConfig::default()
        },
        Arc::clone(&router),
    );
    engine.start().map_err(CliError::Engine)?;

    let started = Instant::now();
    let mut occupancy = RunningStats::default();
    let mut sampler = tokio::time::interval(Duration::from_millis(args.sample_interval_ms.max(1)));

    let deadline = run_deadline(args.duration);
    let shutdown = setup_shutdown_signal();
    tokio::pin!(deadline);
    tokio::pin!(shutdown);

    info!(duration_secs = args.duration, "Bridge running");

    loop {
        tokio::select! {
            _ = sampler.tick() => {
                occupancy.push(bridge.audio_stream().buffered_len() as f64);
            }
            _ = &mut deadline => {
                info!("Run duration elapsed, stopping bridge...");
                break;
            }
            _ = &mut shutdown => {
                warn!("Received shutdown signal, stopping bridge...");
                break;
            }
        }
    }

    let ring_capacity = config.audio.ring_capacity;
    // Stopping joins worker threads; keep it off the async executor.
    let stats = tokio::task::spawn_blocking(move || {
        engine.stop();
        bridge.stop();
        RunStats::new(
            started.elapsed(),
            engine.packets_sent(),
            ring_capacity,
            bridge.snapshot(),
            &occupancy,
        )
    })
    .await
    .map_err(|e| CliError::shutdown(e.to_string()))?;

    info!(
        packets_sent = stats.packets_sent,
        written_bytes = stats.snapshot.audio.written_bytes,
        dropped_chunks = stats.snapshot.audio.dropped_chunks,
        events_processed = stats.snapshot.queue.processed_count,
        duration_secs = stats.duration.as_secs_f64(),
        "Bridge finished"
    );
    stats.print_summary();

    Ok(())
}

/// Load the configuration file (or defaults) and apply command-line overrides
fn load_config(args: &RunArgs) -> Result<BridgeConfig, CliError> {
    let mut config = match &args.config {
        Some(path) => {
            if !path.exists() {
                return Err(CliError::config_not_found(path.display().to_string()));
            }
            info!(config = %path.display(), "Loading configuration");
            ConfigLoader::load_from_path(path)?
        }
        None => {
            info!("No configuration file given, using defaults");
            BridgeConfig::default()
        }
    };

    apply_overrides(&mut config, args)?;
    ConfigLoader::validate(&config)?;
    Ok(config)
}

fn apply_overrides(config: &mut BridgeConfig, args: &RunArgs) -> Result<(), CliError> {
    if let Some(kind) = args.sink {
        info!(sink_type = ?kind, "Overriding sink type from CLI");
        config.sink.sink_type = kind.into();
    }

    if let Some(ref output) = args.output {
        info!(output = %output.display(), "Overriding sink output path from CLI");
        config
            .sink
            .params
            .insert("path".to_string(), output.display().to_string());
    }

    if config.sink.sink_type == SinkType::File && !config.sink.params.contains_key("path") {
        return Err(CliError::invalid_override(
            "sink",
            "file sink requires --output or a 'path' parameter",
        ));
    }

    if !(args.tone_hz.is_finite() && args.tone_hz > 0.0) {
        return Err(CliError::invalid_override(
            "tone-hz",
            format!("must be a positive frequency, got {}", args.tone_hz),
        ));
    }

    Ok(())
}

/// Resolves after `secs` seconds, or never when `secs` is 0
async fn run_deadline(secs: u64) {
    if secs == 0 {
        std::future::pending::<()>().await;
    } else {
        tokio::time::sleep(Duration::from_secs(secs)).await;
    }
}

/// Setup Ctrl+C and SIGTERM signal handlers
///
/// A handler that cannot be installed never fires; the run then ends only
/// on its deadline or the other signal.
async fn setup_shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                warn!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}

/// Print configuration summary for dry-run mode
fn print_config_summary(config: &BridgeConfig) {
    println!("\n=== Configuration Summary ===\n");
    println!("Dispatch:");
    println!("  Queue capacity: {}", config.dispatch.queue_capacity);
    println!("  Send timeout: {} ms", config.dispatch.send_timeout_ms);
    println!("  Worker: {}", config.dispatch.worker_name);

    println!("\nAudio:");
    println!("  Ring capacity: {} bytes", config.audio.ring_capacity);
    println!("  Max chunk: {} bytes", config.audio.max_chunk_len);
    println!("  Max run: {} bytes", config.audio.max_run_len);
    println!("  Send timeout: {} ms", config.audio.send_timeout_ms);
    println!("  Writer: {}", config.audio.writer_name);

    println!("\nSink:");
    println!("  {} ({:?})", config.sink.name, config.sink.sink_type);
    if let Some(rate) = config.sink.paced_byte_rate {
        println!("  Paced at {} B/s", rate);
    }
    let mut params: Vec<_> = config.sink.params.iter().collect();
    params.sort();
    for (key, value) in params {
        println!("  {} = {}", key, value);
    }

    println!();
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::SinkKind;
    use std::path::PathBuf;

    fn args() -> RunArgs {
        RunArgs {
            config: None,
            duration: 1,
            tone_hz: 440.0,
            sink: None,
            output: None,
            unpaced: true,
            sample_interval_ms: 10,
            metrics_port: 0,
            dry_run: false,
        }
    }

    #[test]
    fn test_defaults_without_config_file() {
        let config = load_config(&args()).unwrap();
        assert_eq!(config.sink.sink_type, SinkType::Log);
        assert_eq!(config.audio.ring_capacity, 8192);
    }

    #[test]
    fn test_missing_config_file() {
        let args = RunArgs {
            config: Some(PathBuf::from("/nonexistent/bridge.toml")),
            ..args()
        };
        assert!(matches!(
            load_config(&args),
            Err(CliError::ConfigNotFound { .. })
        ));
    }

    #[test]
    fn test_file_sink_override_needs_output() {
        let args = RunArgs {
            sink: Some(SinkKind::File),
            ..args()
        };
        assert!(matches!(
            load_config(&args),
            Err(CliError::InvalidOverride { flag: "sink", .. })
        ));

        let args = RunArgs {
            output: Some(PathBuf::from("out.pcm")),
            ..args
        };
        let config = load_config(&args).unwrap();
        assert_eq!(config.sink.sink_type, SinkType::File);
        assert_eq!(config.sink.params["path"], "out.pcm");
    }

    #[test]
    fn test_invalid_tone() {
        let args = RunArgs {
            tone_hz: 0.0,
            ..args()
        };
        assert!(matches!(
            load_config(&args),
            Err(CliError::InvalidOverride { flag: "tone-hz", .. })
        ));
    }

    #[test]
    fn test_config_file_is_loaded() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bridge.toml");
        std::fs::write(
            &path,
            "[dispatch]\nqueue_capacity = 32\n\n[sink]\nname = \"discard\"\nsink_type = \"null\"\n",
        )
        .unwrap();

        let args = RunArgs {
            config: Some(path),
            ..args()
        };
        let config = load_config(&args).unwrap();
        assert_eq!(config.dispatch.queue_capacity, 32);
        assert_eq!(config.sink.sink_type, SinkType::Null);
    }

    #[tokio::test]
    async fn test_short_run_with_null_sink() {
        let args = RunArgs {
            sink: Some(SinkKind::Null),
            ..args()
        };
        run_bridge(&args).await.unwrap();
    }
}
