//! # File Management Module
//!
//! Questo modulo gestisce tutte le operazioni sui file e la discovery delle directory di asset.
//!
//! ## Responsabilità:
//! - Discovery ricorsiva delle directory che contengono direttamente immagini
//! - Radici di discovery secondo la convenzione dei moduli (`src/main/assets`, `src/main/res`)
//! - Elenco ordinato dei file di una directory
//! - Sostituzione sicura di un file (file temporaneo + rename)
//! - Formattazione human-readable delle dimensioni
//!
//! ## Discovery:
//! - Ogni directory è giudicata da sola: la qualifica non si eredita dai figli
//! - Radici inesistenti o non directory vengono ignorate
//! - I symlink non vengono seguiti, quindi la visita termina sempre
//!
//! ## Esempio:
//! ```ignore
//! let dirs = FileManager::find_image_dirs(&roots, FormatFilter::All);
//! for dir in dirs {
//!     for file in FileManager::list_files(&dir).await? {
//!         // select / optimize
//!     }
//! }
//! ```

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::debug;
use walkdir::WalkDir;

use crate::formats::FormatFilter;

/// Module-relative directories that hold image assets
const MODULE_ASSET_DIRS: &[&str] = &["src/main/assets", "src/main/res"];

/// Manages file operations and discovery
pub struct FileManager;

impl FileManager {
    /// Find every directory under `roots` that directly contains a file accepted by `filter`
    pub fn find_image_dirs(roots: &[PathBuf], filter: FormatFilter) -> BTreeSet<PathBuf> {
        let mut dirs = BTreeSet::new();

        for root in roots {
            if !root.is_dir() {
                debug!("Skipping discovery root {}: not a directory", root.display());
                continue;
            }

            for entry in WalkDir::new(root)
                .follow_links(false)
                .into_iter()
                .filter_map(|e| e.ok())
                .filter(|e| e.file_type().is_file())
            {
                if filter.matches_path(entry.path()) {
                    if let Some(parent) = entry.path().parent() {
                        dirs.insert(parent.to_path_buf());
                    }
                }
            }
        }

        dirs
    }

    /// Discovery roots following the module layout convention.
    ///
    /// The project root and each of its immediate subdirectories are treated
    /// as modules; their `src/main/assets` and `src/main/res` folders are
    /// returned when they exist.
    pub fn module_asset_roots(project_root: &Path) -> Vec<PathBuf> {
        let mut modules = vec![project_root.to_path_buf()];
        if let Ok(entries) = std::fs::read_dir(project_root) {
            let mut children: Vec<PathBuf> = entries
                .filter_map(|e| e.ok())
                .map(|e| e.path())
                .filter(|p| p.is_dir())
                .collect();
            children.sort();
            modules.extend(children);
        }

        modules
            .iter()
            .flat_map(|module| MODULE_ASSET_DIRS.iter().map(move |dir| module.join(dir)))
            .filter(|candidate| candidate.is_dir())
            .collect()
    }

    /// Regular files directly inside `dir`, sorted by name
    pub async fn list_files(dir: &Path) -> std::io::Result<Vec<PathBuf>> {
        let mut entries = fs::read_dir(dir).await?;
        let mut files = Vec::new();
        while let Some(entry) = entries.next_entry().await? {
            if entry.file_type().await?.is_file() {
                files.push(entry.path());
            }
        }
        files.sort();
        Ok(files)
    }

    /// File name as UTF-8, if it has one
    pub fn file_name(path: &Path) -> Option<&str> {
        path.file_name().and_then(|name| name.to_str())
    }

    /// Key a file is tracked under: relative to the project root when inside it, absolute otherwise
    pub fn ledger_path(project_root: &Path, file: &Path) -> String {
        file.strip_prefix(project_root)
            .unwrap_or(file)
            .to_string_lossy()
            .replace('\\', "/")
    }

    /// Resolve a configured path against the project root
    pub fn resolve(project_root: &Path, path: &Path) -> PathBuf {
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            project_root.join(path)
        }
    }

    /// Replace `target` with `data`: write a sibling temp file, then rename over the target
    pub async fn replace_file(target: &Path, data: &[u8]) -> std::io::Result<()> {
        let file_name = target
            .file_name()
            .map(|name| name.to_string_lossy().to_string())
            .unwrap_or_default();
        let tmp_path = target.with_file_name(format!(".{}.tmp", file_name));

        fs::write(&tmp_path, data).await?;
        match fs::rename(&tmp_path, target).await {
            Ok(()) => Ok(()),
            Err(e) => {
                let _ = fs::remove_file(&tmp_path).await;
                Err(e)
            }
        }
    }

    /// Get human-readable file size
    pub fn format_size(size: u64) -> String {
        const UNITS: &[&str] = &["B", "KB", "MB", "GB", "TB"];
        let mut size = size as f64;
        let mut unit_index = 0;

        while size >= 1024.0 && unit_index < UNITS.len() - 1 {
            size /= 1024.0;
            unit_index += 1;
        }

        if unit_index == 0 {
            format!("{} {}", size as u64, UNITS[unit_index])
        } else {
            format!("{:.2} {}", size, UNITS[unit_index])
        }
    }

    /// Signed size delta, formatted
    pub fn format_delta(before: u64, after: u64) -> String {
        if after <= before {
            format!("-{}", Self::format_size(before - after))
        } else {
            format!("+{}", Self::format_size(after - before))
        }
    }
}
