//! # Asset Optimizer Main Orchestrator
//!
//! Orchestratore principale che delega responsabilità ai moduli specializzati.
//!
//! ## Fasi della run:
//! 1. Validazione configurazione e credenziale (errori fatali, ledger intatto)
//! 2. Risoluzione delle directory target
//! 3. Conversione opzionale in WebP
//! 4. Ottimizzazione: worker pool limitato, stop globale su quota esaurita
//! 5. Merge e salvataggio atomico del ledger

use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Semaphore;
use tokio::time::Instant;
use tracing::{debug, error, info, warn};

use crate::{
    config::OptimizerConfig,
    error::{OptimizeError, Result},
    file_manager::FileManager,
    fingerprint::fingerprint,
    ledger::{AssetRecord, Ledger, LedgerStore},
    optimizer::{
        converter::Converter,
        path_resolver::PathResolver,
        task_optimizer::{FileOutcome, TaskOptimizer},
    },
    policy::{Candidate, Selection, SelectionPolicy},
    progress::{OptimizationStats, ProgressManager},
    service::CompressionService,
};

/// Risultato aggregato di una run
#[derive(Debug, Default, Clone)]
pub struct OptimizationOutcome {
    /// Record prodotti dalla run, in ordine di elaborazione
    pub records: Vec<AssetRecord>,
    pub stats: OptimizationStats,
    /// Directory risolte
    pub directories: Vec<PathBuf>,
    /// Quota del servizio esaurita: i file successivi non sono stati inviati
    pub quota_exhausted: bool,
    /// Deadline raggiunta, nessun nuovo invio
    pub deadline_reached: bool,
    pub ledger_written: bool,
}

impl OptimizationOutcome {
    pub fn before_size(&self) -> u64 {
        self.stats.total_before_size
    }

    pub fn after_size(&self) -> u64 {
        self.stats.total_after_size
    }
}

/// Orchestratore principale
pub struct AssetOptimizer {
    config: OptimizerConfig,
    project_root: PathBuf,
    service: Arc<dyn CompressionService>,
    store: LedgerStore,
    show_progress: bool,
}

impl AssetOptimizer {
    /// Crea nuova istanza dell'ottimizzatore
    pub fn new(project_root: &Path, config: OptimizerConfig, service: Arc<dyn CompressionService>) -> Self {
        Self {
            config,
            project_root: project_root.to_path_buf(),
            service,
            store: LedgerStore::for_project(project_root),
            show_progress: false,
        }
    }

    /// Mostra la progress bar durante l'ottimizzazione
    pub fn with_progress(mut self, show_progress: bool) -> Self {
        self.show_progress = show_progress;
        self
    }

    /// Esegue il processo di ottimizzazione
    pub async fn run(&self) -> Result<OptimizationOutcome> {
        self.config.validate()?;
        self.check_credential().await?;

        let ledger = self.store.load().await;
        let deadline = self
            .config
            .deadline_secs
            .map(|secs| Instant::now() + Duration::from_secs(secs));

        let mut outcome = OptimizationOutcome {
            directories: PathResolver::resolve_target_dirs(&self.project_root, &self.config),
            ..Default::default()
        };
        self.log_configuration(&ledger, &outcome.directories);

        let policy = SelectionPolicy::new(&self.config, &ledger);

        if self.config.convert_to_webp {
            let summary = Converter::new(self.service.clone())
                .convert_dirs(&outcome.directories, &policy, deadline)
                .await;
            outcome.stats.files_converted += summary.converted.len();
            outcome.stats.errors += summary.failures;
            outcome.quota_exhausted = summary.quota_exhausted;
            outcome.deadline_reached = summary.deadline_reached;
            info!("Converted {} files to WebP", summary.converted.len());

            if self.config.only_convert {
                info!("Conversion only: skipping optimization");
                return Ok(outcome);
            }
        }

        if !outcome.quota_exhausted && !outcome.deadline_reached {
            self.optimize_dirs(&policy, deadline, &mut outcome).await;
        }

        self.persist(&ledger, &mut outcome).await?;
        Ok(outcome)
    }

    async fn check_credential(&self) -> Result<()> {
        match self.service.validate_credential().await {
            Ok(true) => Ok(()),
            Ok(false) => Err(OptimizeError::Configuration("API key is invalid".to_string())),
            Err(e) => Err(OptimizeError::Configuration(format!(
                "could not validate API key: {}",
                e
            ))),
        }
    }

    fn log_configuration(&self, ledger: &Ledger, dirs: &[PathBuf]) {
        info!("Project root: {}", self.project_root.display());
        info!(
            "Mode: {} | formats: {} | skip size: {} | ratio threshold: {}% | workers: {}",
            if self.config.append_mode { "append" } else { "exclusive" },
            self.config.support_format,
            FileManager::format_size(self.config.skip_size),
            self.config.compress_ratio_threshold,
            self.config.workers
        );
        info!("Ledger: {} known assets", ledger.len());
        info!("Optimize target directories ({}):", dirs.len());
        for dir in dirs {
            info!("  • {}", dir.display());
        }
    }

    /// File di `dir` selezionati dalla policy, con il loro path nel ledger
    async fn select_files(
        &self,
        dir: &Path,
        policy: &SelectionPolicy<'_>,
        dispatched: &mut HashSet<String>,
    ) -> Vec<(PathBuf, String)> {
        let files = match FileManager::list_files(dir).await {
            Ok(files) => files,
            Err(e) => {
                warn!("Skipping directory {}: {}", dir.display(), e);
                return Vec::new();
            }
        };

        let mut selected = Vec::new();
        for file in files {
            let Some(file_name) = FileManager::file_name(&file) else {
                continue;
            };
            if let Some(reason) = policy.prefilter(file_name) {
                debug!("Skip {}: {:?}", file.display(), reason);
                continue;
            }

            let ledger_path = FileManager::ledger_path(&self.project_root, &file);
            let size = match tokio::fs::metadata(&file).await {
                Ok(metadata) => metadata.len(),
                Err(e) => {
                    warn!("Cannot read metadata of {}: {}", file.display(), e);
                    continue;
                }
            };
            let fingerprint = match fingerprint(&file, &ledger_path).await {
                Ok(fingerprint) => fingerprint,
                Err(e) => {
                    warn!("Cannot fingerprint {}: {}", file.display(), e);
                    continue;
                }
            };

            let candidate = Candidate {
                file_name,
                ledger_path: &ledger_path,
                size,
                fingerprint: &fingerprint,
            };
            match policy.select(&candidate) {
                Selection::Optimize => {
                    if dispatched.insert(ledger_path.clone()) {
                        selected.push((file.clone(), ledger_path));
                    }
                }
                Selection::Skip(reason) => debug!("Skip {}: {:?}", ledger_path, reason),
            }
        }

        selected
    }

    /// Processa le directory in ordine, i file con concorrenza limitata
    async fn optimize_dirs(
        &self,
        policy: &SelectionPolicy<'_>,
        deadline: Option<Instant>,
        outcome: &mut OptimizationOutcome,
    ) {
        info!("Start Optimize...");

        let task_optimizer = Arc::new(TaskOptimizer::new(
            self.service.clone(),
            self.config.compress_ratio_threshold,
        ));
        let semaphore = Arc::new(Semaphore::new(self.config.workers));
        let quota_exhausted = Arc::new(AtomicBool::new(false));
        let mut dispatched = HashSet::new();

        for dir in outcome.directories.clone() {
            if deadline_passed(deadline) {
                warn!("Run deadline reached, no further files will be submitted");
                outcome.deadline_reached = true;
                break;
            }

            let selected = self.select_files(&dir, policy, &mut dispatched).await;
            if selected.is_empty() {
                continue;
            }

            let progress = if self.show_progress {
                ProgressManager::new(selected.len() as u64)
            } else {
                ProgressManager::hidden()
            };
            let directory_failed = Arc::new(AtomicBool::new(false));
            let mut tasks = Vec::new();

            for (file, ledger_path) in selected {
                let Ok(permit) = semaphore.clone().acquire_owned().await else {
                    break;
                };

                if quota_exhausted.load(Ordering::SeqCst) || directory_failed.load(Ordering::SeqCst) {
                    break;
                }
                if deadline_passed(deadline) {
                    warn!("Run deadline reached, no further files will be submitted");
                    outcome.deadline_reached = true;
                    break;
                }

                info!("Find target picture -> {}", ledger_path);

                let task_optimizer = task_optimizer.clone();
                let quota_exhausted = quota_exhausted.clone();
                let directory_failed = directory_failed.clone();
                let progress = progress.clone();

                tasks.push(tokio::spawn(async move {
                    let _permit = permit;
                    let result = task_optimizer.process_single_file(&file, &ledger_path).await;
                    match &result {
                        Err(e) if e.is_quota_exhausted() => quota_exhausted.store(true, Ordering::SeqCst),
                        Err(_) => directory_failed.store(true, Ordering::SeqCst),
                        Ok(_) => {}
                    }
                    progress.update(&ledger_path);
                    result
                }));
            }

            // Quiesce the directory before moving on
            for joined in futures::future::join_all(tasks).await {
                match joined {
                    Ok(Ok(FileOutcome::Accepted(record))) => {
                        outcome.stats.add_optimized(record.before_size, record.after_size);
                        outcome.records.push(record);
                    }
                    Ok(Ok(FileOutcome::Discarded { .. })) => outcome.stats.add_discarded(),
                    Ok(Err(e)) if e.is_quota_exhausted() => warn!("{}", e),
                    Ok(Err(e)) => {
                        outcome.stats.add_error();
                        error!("{} - skipping remaining files in {}", e, dir.display());
                    }
                    Err(e) => {
                        outcome.stats.add_error();
                        error!("Optimization task panicked: {}", e);
                    }
                }
            }
            progress.clear();

            if quota_exhausted.load(Ordering::SeqCst) {
                warn!("Service quota exhausted, stopping optimization");
                outcome.quota_exhausted = true;
                break;
            }
        }
    }

    /// Merge dei nuovi record e salvataggio dello snapshot
    async fn persist(&self, ledger: &Ledger, outcome: &mut OptimizationOutcome) -> Result<()> {
        if outcome.records.is_empty() {
            if outcome.quota_exhausted {
                warn!("Quota exhausted before any picture was optimized");
            } else {
                info!("No picture needs to be optimized");
            }
            return Ok(());
        }

        let merged = ledger.merge(outcome.records.iter().cloned());
        self.store.save(&merged).await?;
        outcome.ledger_written = true;

        info!("Task finished! {}", outcome.stats.format_summary());
        info!(
            "Ledger: {} assets, {} saved overall",
            merged.len(),
            FileManager::format_size(merged.total_saved())
        );
        if outcome.quota_exhausted {
            warn!(
                "Run stopped early: quota exhausted after {} files",
                outcome.records.len()
            );
        }
        Ok(())
    }
}

fn deadline_passed(deadline: Option<Instant>) -> bool {
    deadline.is_some_and(|d| Instant::now() >= d)
}
