//! # Selection Policy Module
//!
//! Decide quali file inviare al servizio remoto e se tenere il risultato.
//!
//! ## Selezione (tutte le condizioni):
//! - il nome rispetta il filtro formati
//! - la dimensione supera strettamente `skip_size`
//! - il nome non è in whitelist
//! - nessun record nel ledger, oppure fingerprint diverso (file modificato)
//!
//! ## Gate di accettazione:
//! `ratio = (before - after) * 100 / before`; se `0 <= ratio < soglia` il
//! risultato viene scartato. Un ratio negativo (file cresciuto) viene accettato.

use crate::config::OptimizerConfig;
use crate::formats::{has_target_format, FormatFilter, TargetFormat};
use crate::ledger::Ledger;

/// A file considered for optimization
#[derive(Debug, Clone)]
pub struct Candidate<'a> {
    pub file_name: &'a str,
    pub ledger_path: &'a str,
    pub size: u64,
    pub fingerprint: &'a str,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    UnsupportedFormat,
    BelowSizeThreshold,
    Whitelisted,
    AlreadyOptimized,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Selection {
    Optimize,
    Skip(SkipReason),
}

/// Selection rules bound to one configuration and one ledger snapshot
pub struct SelectionPolicy<'a> {
    config: &'a OptimizerConfig,
    ledger: &'a Ledger,
}

impl<'a> SelectionPolicy<'a> {
    pub fn new(config: &'a OptimizerConfig, ledger: &'a Ledger) -> Self {
        Self { config, ledger }
    }

    /// Cheap checks that need neither size nor fingerprint
    pub fn prefilter(&self, file_name: &str) -> Option<SkipReason> {
        if !self.config.support_format.matches(file_name) {
            return Some(SkipReason::UnsupportedFormat);
        }
        if self.config.is_whitelisted(file_name) {
            return Some(SkipReason::Whitelisted);
        }
        None
    }

    pub fn select(&self, candidate: &Candidate<'_>) -> Selection {
        if let Some(reason) = self.prefilter(candidate.file_name) {
            return Selection::Skip(reason);
        }

        if candidate.size <= self.config.skip_size {
            return Selection::Skip(SkipReason::BelowSizeThreshold);
        }

        match self.ledger.get(candidate.ledger_path) {
            Some(record) if record.fingerprint == candidate.fingerprint => {
                Selection::Skip(SkipReason::AlreadyOptimized)
            }
            _ => Selection::Optimize,
        }
    }

    /// Whether the optimized result is worth writing back
    pub fn accept(&self, before_size: u64, after_size: u64) -> bool {
        accept_result(before_size, after_size, self.config.compress_ratio_threshold)
    }

    /// Whether a file should be sent to the remote conversion
    pub fn should_convert(&self, file_name: &str) -> bool {
        FormatFilter::All.matches(file_name)
            && !has_target_format(file_name, TargetFormat::Webp)
            && !self.config.is_whitelisted(file_name)
    }
}

/// Percentage reduction; negative when the file grew, zero for an empty input
pub fn compress_ratio(before_size: u64, after_size: u64) -> f64 {
    if before_size == 0 {
        return 0.0;
    }
    (before_size as f64 - after_size as f64) * 100.0 / before_size as f64
}

/// Ratio-acceptance gate: reject only gains in `[0, threshold)`
pub fn accept_result(before_size: u64, after_size: u64, threshold: u8) -> bool {
    let ratio = compress_ratio(before_size, after_size);
    !(ratio >= 0.0 && ratio < f64::from(threshold))
}
