//! # Converter Module
//!
//! Fase opzionale che converte le immagini in WebP tramite il servizio remoto.
//! Un errore su un file viene loggato e la conversione prosegue; la quota
//! esaurita interrompe la fase.

use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::fs;
use tokio::time::Instant;
use tracing::{error, info, warn};

use crate::{
    error::{OptimizeError, Result},
    file_manager::FileManager,
    formats::TargetFormat,
    policy::SelectionPolicy,
    service::CompressionService,
};

/// Riepilogo della fase di conversione
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ConversionSummary {
    pub converted: Vec<PathBuf>,
    pub failures: usize,
    pub quota_exhausted: bool,
    pub deadline_reached: bool,
}

pub struct Converter {
    service: Arc<dyn CompressionService>,
    target: TargetFormat,
}

impl Converter {
    pub fn new(service: Arc<dyn CompressionService>) -> Self {
        Self {
            service,
            target: TargetFormat::Webp,
        }
    }

    /// Converte tutti i file idonei nelle directory
    pub async fn convert_dirs(
        &self,
        dirs: &[PathBuf],
        policy: &SelectionPolicy<'_>,
        deadline: Option<Instant>,
    ) -> ConversionSummary {
        let mut summary = ConversionSummary::default();

        'dirs: for dir in dirs {
            let files = match FileManager::list_files(dir).await {
                Ok(files) => files,
                Err(e) => {
                    warn!("Skipping directory {}: {}", dir.display(), e);
                    continue;
                }
            };

            for file in files {
                let eligible = FileManager::file_name(&file)
                    .map(|name| policy.should_convert(name))
                    .unwrap_or(false);
                if !eligible {
                    continue;
                }

                if deadline.is_some_and(|d| Instant::now() >= d) {
                    warn!("Run deadline reached, stopping conversion");
                    summary.deadline_reached = true;
                    break 'dirs;
                }

                match self.convert_file(&file).await {
                    Ok(converted) => {
                        info!("Converted {} -> {}", file.display(), converted.display());
                        summary.converted.push(converted);
                    }
                    Err(e) if e.is_quota_exhausted() => {
                        warn!("{} - stopping conversion", e);
                        summary.quota_exhausted = true;
                        break 'dirs;
                    }
                    Err(e) => {
                        error!("Conversion failed: {}", e);
                        summary.failures += 1;
                    }
                }
            }
        }

        summary
    }

    /// Converte un singolo file in `<stem>.<ext>`, rimuovendo l'originale se il nome cambia
    pub async fn convert_file(&self, file: &Path) -> Result<PathBuf> {
        let stem = file
            .file_stem()
            .map(|s| s.to_string_lossy().to_string())
            .ok_or_else(|| {
                OptimizeError::io(file, io::Error::new(io::ErrorKind::InvalidInput, "file has no name"))
            })?;

        let data = fs::read(file).await.map_err(|e| OptimizeError::io(file, e))?;

        let converted = self
            .service
            .convert(data, self.target)
            .await
            .map_err(|e| OptimizeError::remote(file, e))?;

        let target_path = file.with_file_name(format!("{}.{}", stem, converted.extension));

        FileManager::replace_file(&target_path, &converted.data)
            .await
            .map_err(|e| OptimizeError::io(&target_path, e))?;

        if target_path != file {
            fs::remove_file(file)
                .await
                .map_err(|e| OptimizeError::io(file, e))?;
        }

        Ok(target_path)
    }
}
