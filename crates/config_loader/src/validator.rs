//! 配置校验模块
//!
//! 校验规则：
//! - 字段级约束 (`validator` derive: 容量 >= 1, 名称非空)
//! - max_chunk_len / max_run_len <= ring_capacity
//! - 入队等待上限 <= 1000 ms
//! - file sink 必须提供 path 参数
//! - paced_byte_rate > 0

use contracts::{BridgeConfig, ContractError, SinkType};
use validator::{Validate, ValidationErrors, ValidationErrorsKind};

/// 入队等待上限 (ms)
///
/// 生产者运行在协议引擎的上下文中，等待必须保持在数十毫秒量级。
pub const MAX_SEND_TIMEOUT_MS: u64 = 1000;

/// 校验 BridgeConfig 配置
///
/// 返回第一个遇到的错误，或 Ok(())。
pub fn validate(config: &BridgeConfig) -> Result<(), ContractError> {
    validate_fields(config)?;
    validate_audio(config)?;
    validate_timeouts(config)?;
    validate_sink(config)?;
    Ok(())
}

/// 字段级约束
fn validate_fields(config: &BridgeConfig) -> Result<(), ContractError> {
    config.validate().map_err(|errors| {
        let (field, message) = first_error("", &errors);
        ContractError::config_validation(field, message)
    })
}

/// 取出第一个字段错误，字段路径用 `.` 连接
fn first_error(prefix: &str, errors: &ValidationErrors) -> (String, String) {
    let mut fields: Vec<_> = errors.errors().iter().collect();
    fields.sort_by_key(|(name, _)| name.to_string());

    for (name, kind) in fields {
        let path = if prefix.is_empty() {
            name.to_string()
        } else {
            format!("{prefix}.{name}")
        };
        match kind {
            ValidationErrorsKind::Field(list) => {
                if let Some(error) = list.first() {
                    let message = error
                        .message
                        .as_ref()
                        .map(|m| m.to_string())
                        .unwrap_or_else(|| format!("failed '{}' constraint", error.code));
                    return (path, message);
                }
            }
            ValidationErrorsKind::Struct(inner) => return first_error(&path, inner),
            ValidationErrorsKind::List(items) => {
                if let Some((idx, inner)) = items.iter().next() {
                    return first_error(&format!("{path}[{idx}]"), inner);
                }
            }
        }
    }

    (prefix.to_string(), "invalid value".to_string())
}

/// 校验音频缓冲区尺寸关系
fn validate_audio(config: &BridgeConfig) -> Result<(), ContractError> {
    let audio = &config.audio;

    if audio.max_chunk_len > audio.ring_capacity {
        return Err(ContractError::config_validation(
            "audio.max_chunk_len",
            format!(
                "max_chunk_len ({}) must be <= ring_capacity ({})",
                audio.max_chunk_len, audio.ring_capacity
            ),
        ));
    }

    if audio.max_run_len > audio.ring_capacity {
        return Err(ContractError::config_validation(
            "audio.max_run_len",
            format!(
                "max_run_len ({}) must be <= ring_capacity ({})",
                audio.max_run_len, audio.ring_capacity
            ),
        ));
    }

    Ok(())
}

/// 校验入队等待上限
fn validate_timeouts(config: &BridgeConfig) -> Result<(), ContractError> {
    let checks = [
        ("dispatch.send_timeout_ms", config.dispatch.send_timeout_ms),
        ("audio.send_timeout_ms", config.audio.send_timeout_ms),
    ];

    for (field, value) in checks {
        if value > MAX_SEND_TIMEOUT_MS {
            return Err(ContractError::config_validation(
                field,
                format!("must be <= {MAX_SEND_TIMEOUT_MS} ms, got {value}"),
            ));
        }
    }
    Ok(())
}

/// 校验 sink 配置
fn validate_sink(config: &BridgeConfig) -> Result<(), ContractError> {
    let sink = &config.sink;

    if sink.name.trim().is_empty() {
        return Err(ContractError::config_validation(
            "sink.name",
            "sink name cannot be empty",
        ));
    }

    if sink.sink_type == SinkType::File
        && sink.params.get("path").is_none_or(|p| p.trim().is_empty())
    {
        return Err(ContractError::config_validation(
            "sink.params.path",
            "file sink requires a 'path' parameter",
        ));
    }

    if sink.paced_byte_rate == Some(0) {
        return Err(ContractError::config_validation(
            "sink.paced_byte_rate",
            "paced_byte_rate must be > 0",
        ));
    }

    Ok(())
}
