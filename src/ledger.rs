//! # Ledger Module
//!
//! Questo modulo gestisce il registro degli asset già ottimizzati per evitare rielaborazioni.
//!
//! ## Responsabilità:
//! - Traccia quali asset sono stati ottimizzati, con dimensioni e fingerprint
//! - Persiste il registro in un unico file JSON nella root del progetto
//! - Tollera file assente o corrotto (ledger vuoto + warning)
//! - Scrittura atomica: il file è sempre uno snapshot completo oppure assente
//!
//! ## Strutture dati:
//! - `AssetRecord`: un asset ottimizzato (path, dimensioni, fingerprint)
//! - `Ledger`: snapshot immutabile dei record, indicizzato per path
//! - `LedgerStore`: lettura/scrittura dello snapshot su disco
//!
//! ## Esempio file:
//! ```json
//! [
//!   {
//!     "path": "app/src/main/res/drawable/logo.png",
//!     "beforeSize": 48213,
//!     "afterSize": 15022,
//!     "md5": "9a0364b9e99bb480dd25e1f0284c8555",
//!     "ignore": false
//!   }
//! ]
//! ```

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{debug, warn};

use crate::error::{OptimizeError, Result};

/// Ledger file name, relative to the project root
pub const LEDGER_FILE_NAME: &str = "compressedList.json";

/// One optimized asset
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssetRecord {
    pub path: String,
    #[serde(default)]
    pub before_size: u64,
    #[serde(default)]
    pub after_size: u64,
    #[serde(rename = "md5", default)]
    pub fingerprint: String,
    #[serde(rename = "ignore", default)]
    pub ignored: bool,
}

impl AssetRecord {
    pub fn new(path: String, before_size: u64, after_size: u64, fingerprint: String) -> Self {
        Self {
            path,
            before_size,
            after_size,
            fingerprint,
            ignored: false,
        }
    }
}

/// Immutable snapshot of optimized assets, ordered, keyed by path
#[derive(Debug, Clone, Default)]
pub struct Ledger {
    records: Vec<AssetRecord>,
    index: HashMap<String, usize>,
}

impl Ledger {
    /// Build a snapshot; for duplicate paths the last record wins
    pub fn from_records(records: Vec<AssetRecord>) -> Self {
        let mut ledger = Self::default();
        for record in records {
            ledger.upsert(record);
        }
        ledger
    }

    fn upsert(&mut self, record: AssetRecord) {
        match self.index.get(&record.path) {
            Some(&position) => self.records[position] = record,
            None => {
                self.index.insert(record.path.clone(), self.records.len());
                self.records.push(record);
            }
        }
    }

    pub fn get(&self, path: &str) -> Option<&AssetRecord> {
        self.index.get(path).map(|&position| &self.records[position])
    }

    pub fn records(&self) -> &[AssetRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Produce a new snapshot with `additions` merged in.
    ///
    /// Records for known paths replace the stored one in place, new paths are appended.
    pub fn merge(&self, additions: impl IntoIterator<Item = AssetRecord>) -> Ledger {
        let mut merged = self.clone();
        for record in additions {
            merged.upsert(record);
        }
        merged
    }

    /// Total bytes saved across all records (growth counts as zero)
    pub fn total_saved(&self) -> u64 {
        self.records
            .iter()
            .map(|r| r.before_size.saturating_sub(r.after_size))
            .sum()
    }
}

/// Loads and persists the ledger snapshot
#[derive(Debug, Clone)]
pub struct LedgerStore {
    path: PathBuf,
}

impl LedgerStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Store located at the well-known ledger path of a project
    pub fn for_project(project_root: &Path) -> Self {
        Self::new(project_root.join(LEDGER_FILE_NAME))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load the snapshot; an absent or unreadable ledger is treated as empty
    pub async fn load(&self) -> Ledger {
        match self.try_load().await {
            Ok(ledger) => ledger,
            Err(e) => {
                warn!("{} - starting from an empty ledger", e);
                Ledger::default()
            }
        }
    }

    async fn try_load(&self) -> Result<Ledger> {
        let content = match fs::read_to_string(&self.path).await {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!("No ledger at {}", self.path.display());
                return Ok(Ledger::default());
            }
            Err(e) => {
                return Err(OptimizeError::LedgerRead {
                    path: self.path.clone(),
                    message: e.to_string(),
                })
            }
        };

        if content.trim().is_empty() {
            return Ok(Ledger::default());
        }

        let records: Vec<AssetRecord> =
            serde_json::from_str(&content).map_err(|e| OptimizeError::LedgerRead {
                path: self.path.clone(),
                message: e.to_string(),
            })?;

        debug!("Loaded {} ledger records from {}", records.len(), self.path.display());
        Ok(Ledger::from_records(records))
    }

    /// Overwrite the persisted snapshot: write a sibling temp file, then rename over the target
    pub async fn save(&self, ledger: &Ledger) -> Result<()> {
        let write_error = |source: std::io::Error| OptimizeError::LedgerWrite {
            path: self.path.clone(),
            source,
        };

        let content = serde_json::to_string_pretty(ledger.records())
            .map_err(|e| write_error(std::io::Error::new(std::io::ErrorKind::InvalidData, e)))?;

        let tmp_path = self.path.with_extension("json.tmp");
        fs::write(&tmp_path, content).await.map_err(write_error)?;
        if let Err(e) = fs::rename(&tmp_path, &self.path).await {
            let _ = fs::remove_file(&tmp_path).await;
            return Err(write_error(e));
        }

        debug!("Saved {} ledger records to {}", ledger.len(), self.path.display());
        Ok(())
    }
}
