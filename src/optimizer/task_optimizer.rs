//! # Task Optimizer Module
//!
//! Worker per l'ottimizzazione di singoli file.
//! Separato dall'orchestratore principale per maggiore modularità.

use std::path::Path;
use std::sync::Arc;
use tokio::fs;
use tracing::debug;

use crate::{
    error::{OptimizeError, Result},
    file_manager::FileManager,
    fingerprint::fingerprint,
    ledger::AssetRecord,
    policy::{accept_result, compress_ratio},
    service::CompressionService,
};

/// Esito di un singolo file
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FileOutcome {
    /// Riscritto in place, da registrare nel ledger
    Accepted(AssetRecord),
    /// Guadagno sotto soglia, file intatto
    Discarded { before_size: u64, after_size: u64 },
}

/// Worker per elaborazione singoli file
pub struct TaskOptimizer {
    service: Arc<dyn CompressionService>,
    ratio_threshold: u8,
}

impl TaskOptimizer {
    /// Crea nuovo task optimizer
    pub fn new(service: Arc<dyn CompressionService>, ratio_threshold: u8) -> Self {
        Self {
            service,
            ratio_threshold,
        }
    }

    /// Processa un singolo file
    pub async fn process_single_file(&self, file: &Path, ledger_path: &str) -> Result<FileOutcome> {
        let data = fs::read(file).await.map_err(|e| OptimizeError::io(file, e))?;
        let before_size = data.len() as u64;

        let optimized = self
            .service
            .optimize(data)
            .await
            .map_err(|e| OptimizeError::remote(file, e))?;

        if !accept_result(before_size, optimized.size, self.ratio_threshold) {
            debug!(
                "Discarding result for {}: {:.2}% is below the {}% threshold",
                ledger_path,
                compress_ratio(before_size, optimized.size),
                self.ratio_threshold
            );
            return Ok(FileOutcome::Discarded {
                before_size,
                after_size: optimized.size,
            });
        }

        FileManager::replace_file(file, &optimized.data)
            .await
            .map_err(|e| OptimizeError::io(file, e))?;

        // Fingerprint the rewritten file so the next run sees it as unchanged
        let fingerprint = fingerprint(file, ledger_path)
            .await
            .map_err(|e| OptimizeError::io(file, e))?;

        debug!(
            "Optimized {}: {} -> {}",
            ledger_path,
            FileManager::format_size(before_size),
            FileManager::format_size(optimized.size)
        );

        Ok(FileOutcome::Accepted(AssetRecord::new(
            ledger_path.to_string(),
            before_size,
            optimized.size,
            fingerprint,
        )))
    }
}
