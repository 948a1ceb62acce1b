//! # Path Resolution Module
//!
//! Centralizza il calcolo delle directory da elaborare.
//! In append mode le directory scoperte vengono prima, seguite da quelle esplicite;
//! in modalità esclusiva si usano solo quelle esplicite.

use std::collections::HashSet;
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::{config::OptimizerConfig, file_manager::FileManager};

/// Utility per calcolare le directory target in modo centralizzato
pub struct PathResolver;

impl PathResolver {
    /// Radici visitate dalla discovery
    pub fn discovery_roots(project_root: &Path, config: &OptimizerConfig) -> Vec<PathBuf> {
        if config.scan_roots.is_empty() {
            FileManager::module_asset_roots(project_root)
        } else {
            config
                .scan_roots
                .iter()
                .map(|root| FileManager::resolve(project_root, root))
                .collect()
        }
    }

    /// Lista ordinata e senza duplicati delle directory da elaborare
    pub fn resolve_target_dirs(project_root: &Path, config: &OptimizerConfig) -> Vec<PathBuf> {
        let mut dirs = Vec::new();

        if config.append_mode {
            let roots = Self::discovery_roots(project_root, config);
            debug!("Discovery roots: {:?}", roots);
            dirs.extend(FileManager::find_image_dirs(&roots, config.support_format));
        }

        dirs.extend(
            config
                .resource_dirs
                .iter()
                .map(|dir| FileManager::resolve(project_root, dir)),
        );

        let mut seen = HashSet::new();
        dirs.retain(|dir| seen.insert(dir.clone()));
        dirs
    }
}
