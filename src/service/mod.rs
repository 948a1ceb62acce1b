//! # Remote Compression Service
//!
//! Interfaccia verso il servizio esterno di compressione/conversione.
//! L'orchestratore dipende solo dal trait `CompressionService`; il client
//! HTTP (`TinifyClient`) è una delle implementazioni possibili.
//!
//! ## Errori:
//! - `QuotaExceeded`: quota esaurita, nessuna nuova chiamata ha senso
//! - `Failure`: errore per il singolo file, recuperabile

pub mod tinify;

use async_trait::async_trait;

use crate::formats::TargetFormat;

pub use tinify::TinifyClient;

/// Failure modes surfaced by the remote service
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum ServiceError {
    #[error("quota exceeded: {0}")]
    QuotaExceeded(String),

    #[error("{0}")]
    Failure(String),
}

/// Result of a remote optimization
#[derive(Debug, Clone)]
pub struct OptimizedImage {
    pub data: Vec<u8>,
    pub size: u64,
}

impl OptimizedImage {
    pub fn new(data: Vec<u8>) -> Self {
        let size = data.len() as u64;
        Self { data, size }
    }
}

/// Result of a remote format conversion
#[derive(Debug, Clone)]
pub struct ConvertedImage {
    pub data: Vec<u8>,
    /// File extension of the converted image, without the dot
    pub extension: String,
}

#[async_trait]
pub trait CompressionService: Send + Sync {
    /// Check the configured credential once, before any work
    async fn validate_credential(&self) -> Result<bool, ServiceError>;

    async fn optimize(&self, data: Vec<u8>) -> Result<OptimizedImage, ServiceError>;

    async fn convert(&self, data: Vec<u8>, target: TargetFormat) -> Result<ConvertedImage, ServiceError>;
}
