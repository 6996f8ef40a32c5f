//! FileSink - writes raw PCM to disk

use std::collections::HashMap;
use std::fs::{self, File, OpenOptions};
use std::io::{self, BufWriter, Write};
use std::path::PathBuf;

use contracts::{AudioSink, ContractError};
use tracing::{debug, instrument};

/// Configuration for FileSink
#[derive(Debug, Clone)]
pub struct FileSinkConfig {
    /// Output file
    pub path: PathBuf,
    /// Append to an existing file instead of truncating it
    pub append: bool,
}

impl FileSinkConfig {
    /// Create config from params map
    pub fn from_params(params: &HashMap<String, String>) -> io::Result<Self> {
        let path = params.get("path").map(PathBuf::from).ok_or_else(|| {
            io::Error::new(io::ErrorKind::InvalidInput, "missing 'path' parameter")
        })?;

        let append = match params.get("append").map(String::as_str) {
            Some("true") => true,
            Some("false") | None => false,
            Some(other) => {
                return Err(io::Error::new(
                    io::ErrorKind::InvalidInput,
                    format!("invalid 'append' value '{}'", other),
                ))
            }
        };

        Ok(Self { path, append })
    }
}

/// Sink that appends every run to a raw PCM file
pub struct FileSink {
    name: String,
    path: PathBuf,
    writer: BufWriter<File>,
}

impl FileSink {
    /// Create a new FileSink, creating parent directories as needed
    #[instrument(name = "file_sink_new", skip(name, config), fields(path = %config.path.display()))]
    pub fn new(name: impl Into<String>, config: FileSinkConfig) -> io::Result<Self> {
        if let Some(parent) = config.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }

        let file = OpenOptions::new()
            .create(true)
            .write(true)
            .append(config.append)
            .truncate(!config.append)
            .open(&config.path)?;

        let name = name.into();
        debug!(sink = %name, append = config.append, "FileSink opened");

        Ok(Self {
            name,
            path: config.path,
            writer: BufWriter::new(file),
        })
    }

    /// Create from params map (for factory)
    pub fn from_params(
        name: impl Into<String>,
        params: &HashMap<String, String>,
    ) -> io::Result<Self> {
        let config = FileSinkConfig::from_params(params)?;
        Self::new(name, config)
    }
}

impl AudioSink for FileSink {
    fn name(&self) -> &str {
        &self.name
    }

    fn write(&mut self, pcm: &[u8]) -> Result<usize, ContractError> {
        self.writer
            .write_all(pcm)
            .map_err(|e| ContractError::sink_write(&self.name, e.to_string()))?;
        Ok(pcm.len())
    }

    #[instrument(
        name = "file_sink_flush",
        skip(self),
        fields(sink = %self.name, path = %self.path.display())
    )]
    fn flush(&mut self) -> Result<(), ContractError> {
        self.writer
            .flush()
            .map_err(|e| ContractError::sink_write(&self.name, e.to_string()))
    }
}
