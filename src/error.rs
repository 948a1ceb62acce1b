//! # Error Types Module
//!
//! Questo modulo definisce tutti i tipi di errore custom dell'applicazione.
//!
//! ## Categorie di errori:
//! - `Configuration`: configurazione non valida, la run viene interrotta prima di qualsiasi lavoro
//! - `QuotaExhausted`: quota del servizio remoto esaurita, fatale per il batch ma il ledger è salvo
//! - `Remote`: errore del servizio remoto per un singolo file
//! - `LedgerRead`: ledger illeggibile, recuperato come ledger vuoto
//! - `LedgerWrite`: scrittura del ledger fallita, deve essere riportata
//! - `Io`: errore di I/O locale su un asset
//!
//! ## Esempio:
//! ```ignore
//! if config.api_key.is_empty() {
//!     return Err(OptimizeError::Configuration("api_key is not configured".to_string()));
//! }
//! ```

use std::path::PathBuf;

use crate::service::ServiceError;

/// Custom error types for asset optimization
#[derive(thiserror::Error, Debug)]
pub enum OptimizeError {
    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Service quota exhausted: {0}")]
    QuotaExhausted(String),

    #[error("Remote operation failed for {path}: {source}")]
    Remote {
        path: PathBuf,
        #[source]
        source: ServiceError,
    },

    #[error("Ledger read error ({path}): {message}")]
    LedgerRead { path: PathBuf, message: String },

    #[error("Failed to write ledger {path}: {source}")]
    LedgerWrite {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("IO error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl OptimizeError {
    /// Wraps a service error for a given file, lifting quota exhaustion to its own variant
    pub fn remote(path: impl Into<PathBuf>, source: ServiceError) -> Self {
        match source {
            ServiceError::QuotaExceeded(message) => OptimizeError::QuotaExhausted(message),
            source => OptimizeError::Remote {
                path: path.into(),
                source,
            },
        }
    }

    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        OptimizeError::Io {
            path: path.into(),
            source,
        }
    }

    pub fn is_quota_exhausted(&self) -> bool {
        matches!(self, OptimizeError::QuotaExhausted(_))
    }
}

pub type Result<T> = std::result::Result<T, OptimizeError>;
