//! Configuration structures and loading.

use crate::error::{ConfigError, ConfigResult};
use crate::paths::AppPaths;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::debug;

/// Main configuration structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub documents: DocumentsConfig,

    #[serde(default)]
    pub processing: ProcessingConfig,

    #[serde(default)]
    pub retrieval: RetrievalConfig,

    #[serde(default)]
    pub watch: WatchConfig,

    #[serde(default)]
    pub ollama: OllamaConfig,
}

impl Config {
    /// Load configuration from a specific path. A missing file yields the defaults.
    pub fn load_from(path: &Path) -> ConfigResult<Self> {
        if !path.exists() {
            debug!("No config file at {}, using defaults", path.display());
            return Ok(Self::default());
        }

        let contents = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&contents)?;
        Ok(config)
    }

    /// Render the configuration as TOML.
    pub fn to_toml_string(&self) -> ConfigResult<String> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Save configuration to a specific path.
    pub fn save_to(&self, path: &Path) -> ConfigResult<()> {
        let contents = self.to_toml_string()?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, contents)?;
        Ok(())
    }

    /// Create a default config file with comments.
    pub fn create_default_file(path: &Path) -> ConfigResult<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, Self::default_config_string())?;
        Ok(())
    }

    /// Generate a default config file with helpful comments.
    pub fn default_config_string() -> String {
        r#"# DocRAG Configuration
# Question answering over a folder of documents.

[documents]
# Root folder. Each sub-folder is a topic; files directly under the root
# belong to the "general" topic. Defaults to <data dir>/documents.
# root = "~/Documents/docrag"

[processing]
# Chunking, in whitespace-delimited tokens
chunk_size = 500
chunk_overlap = 100            # Must be smaller than chunk_size
min_chunk_chars = 5            # Trailing windows shorter than this are dropped
max_chunks = 10000             # Hard cap per file

[retrieval]
top_k = 5                      # Chunks retrieved per question
excerpt_chars = 300            # Preview length of each returned source
log_preview_chars = 120

[watch]
# Delay between a file event and reading the file
debounce_ms = 500

# File patterns to ignore
ignore_patterns = [
    "*.tmp",
    "*.part",
    "~$*",
]

[ollama]
host = "http://localhost:11434"
model = "llama3.1"
embedding_model = "nomic-embed-text"
timeout_seconds = 120
"#
        .to_string()
    }

    /// Check the values that would make a component misbehave at runtime.
    pub fn validate(&self) -> ConfigResult<()> {
        self.processing.validate()?;
        self.retrieval.validate()
    }

    /// The documents root, tilde-expanded, falling back to the data directory.
    pub fn documents_root(&self) -> ConfigResult<PathBuf> {
        match &self.documents.root {
            Some(root) => Ok(PathBuf::from(shellexpand::tilde(root).as_ref())),
            None => AppPaths::new()
                .map(|p| p.documents_dir)
                .ok_or(ConfigError::NoConfigDir),
        }
    }
}

/// Location of the documents tree.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct DocumentsConfig {
    pub root: Option<String>,
}

/// Chunking settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ProcessingConfig {
    pub chunk_size: usize,
    pub chunk_overlap: usize,
    pub min_chunk_chars: usize,
    pub max_chunks: usize,
}

impl Default for ProcessingConfig {
    fn default() -> Self {
        Self {
            chunk_size: 500,
            chunk_overlap: 100,
            min_chunk_chars: 5,
            max_chunks: 10_000,
        }
    }
}

impl ProcessingConfig {
    pub fn validate(&self) -> ConfigResult<()> {
        if self.chunk_size == 0 {
            return Err(ConfigError::Invalid {
                key: "processing.chunk_size",
                message: "must be greater than zero".to_string(),
            });
        }
        if self.chunk_overlap >= self.chunk_size {
            return Err(ConfigError::Invalid {
                key: "processing.chunk_overlap",
                message: format!(
                    "overlap ({}) must be smaller than chunk_size ({})",
                    self.chunk_overlap, self.chunk_size
                ),
            });
        }
        if self.max_chunks == 0 {
            return Err(ConfigError::Invalid {
                key: "processing.max_chunks",
                message: "must be greater than zero".to_string(),
            });
        }
        Ok(())
    }
}

/// Query-time settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RetrievalConfig {
    pub top_k: usize,
    pub excerpt_chars: usize,
    pub log_preview_chars: usize,
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            top_k: 5,
            excerpt_chars: 300,
            log_preview_chars: 120,
        }
    }
}

impl RetrievalConfig {
    pub fn validate(&self) -> ConfigResult<()> {
        if self.top_k == 0 {
            return Err(ConfigError::Invalid {
                key: "retrieval.top_k",
                message: "must be greater than zero".to_string(),
            });
        }
        Ok(())
    }
}

/// File watching settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WatchConfig {
    pub debounce_ms: u64,
    pub ignore_patterns: Vec<String>,
}

impl Default for WatchConfig {
    fn default() -> Self {
        Self {
            debounce_ms: 500,
            ignore_patterns: vec!["*.tmp".to_string(), "*.part".to_string(), "~$*".to_string()],
        }
    }
}

impl WatchConfig {
    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }
}

/// Ollama LLM settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OllamaConfig {
    pub host: String,
    pub model: String,
    pub embedding_model: String,
    pub timeout_seconds: u64,
}

impl Default for OllamaConfig {
    fn default() -> Self {
        Self {
            host: "http://localhost:11434".to_string(),
            model: "llama3.1".to_string(),
            embedding_model: "nomic-embed-text".to_string(),
            timeout_seconds: 120,
        }
    }
}
