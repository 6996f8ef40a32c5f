//! `validate` command implementation.

use anyhow::{Context, Result};
use config_loader::{BridgeConfig, ConfigLoader};
use contracts::SinkType;
use serde::Serialize;
use tracing::info;

use crate::cli::ValidateArgs;

/// Validation result for JSON output
#[derive(Serialize)]
struct ValidationResult {
    valid: bool,
    config_path: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    warnings: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    summary: Option<ConfigSummary>,
}

#[derive(Serialize)]
struct ConfigSummary {
    version: String,
    queue_capacity: usize,
    ring_capacity: usize,
    max_chunk_len: usize,
    max_run_len: usize,
    sink_name: String,
    sink_type: String,
}

/// Execute the `validate` command
pub fn run_validate(args: &ValidateArgs) -> Result<()> {
    info!(config = %args.config.display(), "Validating configuration");

    let result = validate_config(args);

    if args.json {
        let json = serde_json::to_string_pretty(&result)
            .context("Failed to serialize validation result")?;
        println!("{}", json);
    } else {
        print_validation_result(&result);
    }

    if result.valid {
        Ok(())
    } else {
        anyhow::bail!("Configuration validation failed")
    }
}

fn validate_config(args: &ValidateArgs) -> ValidationResult {
    let config_path = args.config.display().to_string();

    if !args.config.exists() {
        return ValidationResult {
            valid: false,
            config_path,
            error: Some(format!("File not found: {}", args.config.display())),
            warnings: None,
            summary: None,
        };
    }

    match ConfigLoader::load_from_path(&args.config) {
        Ok(config) => {
            let warnings = collect_warnings(&config);
            ValidationResult {
                valid: true,
                config_path,
                error: None,
                warnings: if warnings.is_empty() {
                    None
                } else {
                    Some(warnings)
                },
                summary: Some(ConfigSummary {
                    version: format!("{:?}", config.version),
                    queue_capacity: config.dispatch.queue_capacity,
                    ring_capacity: config.audio.ring_capacity,
                    max_chunk_len: config.audio.max_chunk_len,
                    max_run_len: config.audio.max_run_len,
                    sink_name: config.sink.name.clone(),
                    sink_type: format!("{:?}", config.sink.sink_type),
                }),
            }
        }
        Err(e) => ValidationResult {
            valid: false,
            config_path,
            error: Some(e.to_string()),
            warnings: None,
            summary: None,
        },
    }
}

/// Collect configuration warnings (non-fatal issues)
fn collect_warnings(config: &BridgeConfig) -> Vec<String> {
    let mut warnings = Vec::new();

    if config.dispatch.send_timeout_ms == 0 {
        warnings.push(
            "dispatch.send_timeout_ms is 0 - events are rejected whenever the queue is full"
                .to_string(),
        );
    }

    if config.audio.send_timeout_ms == 0 {
        warnings.push(
            "audio.send_timeout_ms is 0 - chunks are dropped whenever the ring is full"
                .to_string(),
        );
    }

    if config.audio.ring_capacity < config.audio.max_chunk_len * 2 {
        warnings.push(format!(
            "audio.ring_capacity ({}) holds fewer than two max-size chunks ({})",
            config.audio.ring_capacity, config.audio.max_chunk_len
        ));
    }

    if config.sink.sink_type != SinkType::Null && config.sink.paced_byte_rate.is_none() {
        warnings.push(format!(
            "sink '{}' is not paced - the writer drains as fast as the sink accepts",
            config.sink.name
        ));
    }

    warnings
}

fn print_validation_result(result: &ValidationResult) {
    if result.valid {
        println!("✓ Configuration is valid: {}", result.config_path);

        if let Some(ref summary) = result.summary {
            println!("\n  Version: {}", summary.version);
            println!("  Queue capacity: {}", summary.queue_capacity);
            println!("  Ring capacity: {} bytes", summary.ring_capacity);
            println!("  Max chunk: {} bytes", summary.max_chunk_len);
            println!("  Max run: {} bytes", summary.max_run_len);
            println!("  Sink: {} ({})", summary.sink_name, summary.sink_type);
        }

        if let Some(ref warnings) = result.warnings {
            println!("\n⚠ Warnings:");
            for warning in warnings {
                println!("  - {}", warning);
            }
        }
    } else {
        println!("✗ Configuration is invalid: {}", result.config_path);
        if let Some(ref error) = result.error {
            println!("\n  Error: {}", error);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn validate_str(content: &str) -> ValidationResult {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bridge.toml");
        std::fs::write(&path, content).unwrap();
        validate_config(&ValidateArgs {
            config: path,
            json: false,
        })
    }

    #[test]
    fn test_missing_file() {
        let result = validate_config(&ValidateArgs {
            config: PathBuf::from("/nonexistent/bridge.toml"),
            json: true,
        });
        assert!(!result.valid);
        assert!(result.error.unwrap().contains("File not found"));
    }

    #[test]
    fn test_valid_config_summary() {
        let result = validate_str(
            "[sink]\nname = \"speaker\"\nsink_type = \"log\"\npaced_byte_rate = 176400\n",
        );
        assert!(result.valid);
        assert!(result.warnings.is_none());

        let summary = result.summary.unwrap();
        assert_eq!(summary.sink_name, "speaker");
        assert_eq!(summary.ring_capacity, 8192);
    }

    #[test]
    fn test_invalid_config_reports_error() {
        let result = validate_str("[audio]\nring_capacity = 1024\n");
        assert!(!result.valid);
        assert!(result.error.unwrap().contains("max_chunk_len"));
    }

    #[test]
    fn test_warnings() {
        let config = BridgeConfig::default();
        let warnings = collect_warnings(&config);
        assert_eq!(warnings.len(), 1);
        assert!(warnings[0].contains("not paced"));

        let mut config = BridgeConfig::default();
        config.sink.sink_type = SinkType::Null;
        config.dispatch.send_timeout_ms = 0;
        let warnings = collect_warnings(&config);
        assert_eq!(warnings.len(), 1);
        assert!(warnings[0].contains("dispatch.send_timeout_ms"));
    }

    #[test]
    fn test_json_shape() {
        let result = validate_str("[sink]\nsink_type = \"null\"\n");
        let json: serde_json::Value = serde_json::to_value(&result).unwrap();
        assert_eq!(json["valid"], true);
        assert!(json.get("error").is_none());
        assert_eq!(json["summary"]["sink_type"], "Null");
    }
}
