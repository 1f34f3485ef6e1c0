//! CLI configuration.
//!
//! Loaded from a TOML file when one exists, otherwise defaults apply. Every
//! section and field is optional in the file.

use std::path::{Path, PathBuf};

use anyhow::Context;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub storage: StorageConfig,
    pub index: IndexConfig,
    pub chunking: ChunkingConfig,
    pub retrieval: RetrievalConfig,
    pub embedding: EmbeddingConfig,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Data directory; defaults to the platform data dir for "docrag"
    pub data_dir: Option<PathBuf>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct IndexConfig {
    /// "flat" (file-backed) or "memory"
    pub backend: String,
    pub dimension: usize,
}

impl Default for IndexConfig {
    fn default() -> Self {
        Self {
            backend: "flat".to_string(),
            dimension: 768,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ChunkingConfig {
    pub size: usize,
    pub overlap: usize,
}

impl Default for ChunkingConfig {
    fn default() -> Self {
        Self {
            size: 1000,
            overlap: 200,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RetrievalConfig {
    pub top_k: usize,
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            top_k: docrag_query::DEFAULT_TOP_K,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EmbeddingConfig {
    /// "gemini" (remote, needs GEMINI_API_KEY) or "hash" (local)
    pub provider: String,
    /// Concurrent embedding calls allowed through the pool
    pub max_concurrent: usize,
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            provider: "gemini".to_string(),
            max_concurrent: 4,
        }
    }
}

impl Config {
    /// Load from `path`, or defaults when the file is absent.
    pub fn load(path: Option<&Path>) -> anyhow::Result<Self> {
        match path {
            Some(path) => Self::load_from(path),
            None => Ok(Self::default()),
        }
    }

    pub fn load_from(path: &Path) -> anyhow::Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("reading config {}", path.display()))?;
        toml::from_str(&raw).with_context(|| format!("parsing config {}", path.display()))
    }

    /// Resolve the data directory, creating it if needed.
    pub fn data_dir(&self) -> anyhow::Result<PathBuf> {
        let dir = match &self.storage.data_dir {
            Some(dir) => dir.clone(),
            None => directories::ProjectDirs::from("", "", "docrag")
                .context("no home directory available")?
                .data_dir()
                .to_path_buf(),
        };
        std::fs::create_dir_all(&dir)
            .with_context(|| format!("creating data dir {}", dir.display()))?;
        Ok(dir)
    }

    /// An annotated config file with every default spelled out.
    pub fn sample_toml() -> String {
        let mut sample = String::new();
        sample.push_str("# docrag configuration\n\n");
        sample.push_str("[storage]\n# data_dir = \"/var/lib/docrag\"\n\n");
        sample.push_str("[index]\nbackend = \"flat\"   # or \"memory\"\ndimension = 768\n\n");
        sample.push_str("[chunking]\nsize = 1000\noverlap = 200\n\n");
        sample.push_str("[retrieval]\ntop_k = 3\n\n");
        sample.push_str("[embedding]\nprovider = \"gemini\"  # or \"hash\"\nmax_concurrent = 4\n");
        sample
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_the_pipeline_settings() {
        let config = Config::default();
        assert_eq!(config.index.backend, "flat");
        assert_eq!(config.index.dimension, 768);
        assert_eq!(config.chunking.size, 1000);
        assert_eq!(config.chunking.overlap, 200);
        assert_eq!(config.retrieval.top_k, 3);
        assert_eq!(config.embedding.provider, "gemini");
    }

    #[test]
    fn partial_files_fall_back_to_defaults() {
        let config: Config = toml::from_str("[retrieval]\ntop_k = 7\n").unwrap();
        assert_eq!(config.retrieval.top_k, 7);
        assert_eq!(config.chunking.size, 1000);
        assert_eq!(config.index.backend, "flat");
    }

    #[test]
    fn sample_config_parses() {
        let config: Config = toml::from_str(&Config::sample_toml()).unwrap();
        assert_eq!(config.index.dimension, 768);
    }

    #[test]
    fn load_missing_path_is_an_error() {
        assert!(Config::load_from(Path::new("/nonexistent/docrag.toml")).is_err());
    }
}
