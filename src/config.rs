//! # Configuration Management Module
//!
//! Questo modulo gestisce tutta la configurazione dell'applicazione.
//!
//! ## Responsabilità:
//! - Definisce la struct `OptimizerConfig` con tutti i parametri di ottimizzazione
//! - Fornisce validazione dei parametri prima di qualsiasi lavoro
//! - Supporta caricamento/salvataggio configurazione da/verso file JSON
//! - Fornisce valori di default sensati per tutti i parametri
//!
//! ## Parametri di configurazione:
//! - `api_key`: Credenziale del servizio di compressione (obbligatoria)
//! - `convert_to_webp`: Converte le immagini in WebP prima dell'ottimizzazione (default: false)
//! - `only_convert`: Solo conversione, senza ottimizzazione (default: false)
//! - `skip_size`: File con dimensione <= soglia vengono ignorati (default: 5 KB)
//! - `support_format`: Filtro formati (all, jpeg, png, webp; default: all)
//! - `compress_ratio_threshold`: Riduzione minima in % per accettare il risultato (0-100, default: 30)
//! - `append_mode`: Aggiunge le directory scoperte a `resource_dirs` (default: true)
//! - `white_list`: Nomi di file da non toccare mai
//! - `resource_dirs`: Directory esplicite da ottimizzare
//! - `scan_roots`: Radici per la discovery in append mode (default: convenzione moduli)
//! - `workers`: Chiamate remote concorrenti (default: 4)
//! - `deadline_secs`: Tempo massimo della run, poi nessun nuovo invio (default: nessuno)
//!
//! ## Esempio:
//! ```ignore
//! let config = OptimizerConfig {
//!     api_key: "key".to_string(),
//!     compress_ratio_threshold: 20,
//!     ..Default::default()
//! };
//! config.validate()?;
//! ```

use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::OptimizeError;
use crate::formats::FormatFilter;

/// Default config file name looked up in the project root
pub const CONFIG_FILE_NAME: &str = "optimizer.json";

pub const DEFAULT_ENDPOINT: &str = "https://api.tinify.com";

/// Configuration for asset optimization
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OptimizerConfig {
    /// Compression service API key
    pub api_key: String,
    /// Convert images to WebP before optimizing
    pub convert_to_webp: bool,
    /// Stop after conversion (only meaningful with `convert_to_webp`)
    pub only_convert: bool,
    /// Files of this size or smaller are skipped (bytes)
    pub skip_size: u64,
    /// Formats eligible for optimization
    pub support_format: FormatFilter,
    /// Minimum reduction (percent) to keep an optimized result
    pub compress_ratio_threshold: u8,
    /// Merge discovered directories with `resource_dirs`
    pub append_mode: bool,
    /// File names never touched
    pub white_list: Vec<String>,
    /// Explicit target directories
    pub resource_dirs: Vec<PathBuf>,
    /// Discovery roots for append mode (empty = module convention)
    pub scan_roots: Vec<PathBuf>,
    /// Number of concurrent remote calls
    pub workers: usize,
    /// Overall run deadline in seconds
    pub deadline_secs: Option<u64>,
    /// Compression service base URL
    pub endpoint: String,
    /// Per-request timeout for the compression service
    pub request_timeout_secs: u64,
}

impl Default for OptimizerConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            convert_to_webp: false,
            only_convert: false,
            skip_size: 5 * 1024,
            support_format: FormatFilter::All,
            compress_ratio_threshold: 30,
            append_mode: true,
            white_list: Vec::new(),
            resource_dirs: Vec::new(),
            scan_roots: Vec::new(),
            workers: 4,
            deadline_secs: None,
            endpoint: DEFAULT_ENDPOINT.to_string(),
            request_timeout_secs: 60,
        }
    }
}

impl OptimizerConfig {
    /// Validate configuration parameters
    pub fn validate(&self) -> std::result::Result<(), OptimizeError> {
        if self.api_key.trim().is_empty() {
            return Err(OptimizeError::Configuration("api_key is not configured".to_string()));
        }

        if !self.append_mode && self.resource_dirs.is_empty() {
            return Err(OptimizeError::Configuration(
                "resource_dirs can't be empty when append_mode is false".to_string(),
            ));
        }

        if self.compress_ratio_threshold > 100 {
            return Err(OptimizeError::Configuration(
                "compress_ratio_threshold must be between 0 and 100".to_string(),
            ));
        }

        if self.workers == 0 {
            return Err(OptimizeError::Configuration(
                "Number of workers must be greater than 0".to_string(),
            ));
        }

        if self.deadline_secs == Some(0) {
            return Err(OptimizeError::Configuration(
                "deadline_secs must be greater than 0".to_string(),
            ));
        }

        Ok(())
    }

    /// Check if a file name is whitelisted
    pub fn is_whitelisted(&self, file_name: &str) -> bool {
        self.white_list.iter().any(|name| name == file_name)
    }

    /// Load configuration from file; a missing file yields the defaults
    pub async fn from_file(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = tokio::fs::read_to_string(path).await?;
        let config: OptimizerConfig = serde_json::from_str(&content)
            .map_err(|e| anyhow::anyhow!("Invalid config file {}: {}", path.display(), e))?;
        Ok(config)
    }

    /// Save configuration to file
    pub async fn save_to_file(&self, path: &Path) -> Result<()> {
        let content = serde_json::to_string_pretty(self)?;
        tokio::fs::write(path, content).await?;
        Ok(())
    }
}
