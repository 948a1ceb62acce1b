//! # Progress Tracking and Statistics Module
//!
//! Questo modulo gestisce il progress tracking e le statistiche di una run.
//!
//! ## Componenti principali:
//! - `ProgressManager`: progress bar `indicatif` sui file selezionati
//! - `OptimizationStats`: statistiche cumulative della run
//!
//! ## Statistiche tracciate:
//! - **files_optimized**: file riscritti e registrati nel ledger
//! - **files_discarded**: risultati scartati dal gate sul ratio
//! - **files_converted**: file convertiti in WebP
//! - **errors**: errori per singolo file
//! - **total_before_size** / **total_after_size**: byte prima/dopo dei file ottimizzati

use indicatif::{ProgressBar, ProgressStyle};
use std::time::Duration;

use crate::file_manager::FileManager;

/// Manages progress reporting for a batch of remote operations
#[derive(Clone)]
pub struct ProgressManager {
    bar: ProgressBar,
}

impl ProgressManager {
    pub fn new(total_files: u64) -> Self {
        let bar = ProgressBar::new(total_files);

        if let Ok(style) = ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({percent}%) {msg}")
        {
            bar.set_style(style.progress_chars("=>-"));
        }

        bar.enable_steady_tick(Duration::from_millis(100));

        Self { bar }
    }

    /// Progress manager that draws nothing
    pub fn hidden() -> Self {
        Self {
            bar: ProgressBar::hidden(),
        }
    }

    /// Update progress with a message
    pub fn update(&self, message: &str) {
        self.bar.inc(1);
        self.bar.set_message(message.to_string());
    }

    pub fn clear(&self) {
        self.bar.finish_and_clear();
    }
}

/// Statistics tracker for a run
#[derive(Debug, Default, Clone)]
pub struct OptimizationStats {
    pub files_optimized: usize,
    pub files_discarded: usize,
    pub files_converted: usize,
    pub errors: usize,
    pub total_before_size: u64,
    pub total_after_size: u64,
}

impl OptimizationStats {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_optimized(&mut self, before_size: u64, after_size: u64) {
        self.files_optimized += 1;
        self.total_before_size += before_size;
        self.total_after_size += after_size;
    }

    pub fn add_discarded(&mut self) {
        self.files_discarded += 1;
    }

    pub fn add_error(&mut self) {
        self.errors += 1;
    }

    pub fn overall_reduction_percent(&self) -> f64 {
        crate::policy::compress_ratio(self.total_before_size, self.total_after_size)
    }

    pub fn format_summary(&self) -> String {
        format!(
            "optimized {} files, before total size: {}, after total size: {}, delta {} ({:.2}%) | discarded: {} | errors: {}",
            self.files_optimized,
            FileManager::format_size(self.total_before_size),
            FileManager::format_size(self.total_after_size),
            FileManager::format_delta(self.total_before_size, self.total_after_size),
            self.overall_reduction_percent(),
            self.files_discarded,
            self.errors,
        )
    }
}
