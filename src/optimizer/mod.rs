//! # Optimizer Module
//!
//! Separa le responsabilità in sottomoduli:
//! - `asset_optimizer`: orchestratore principale della run
//! - `task_optimizer`: ottimizzazione di un singolo file + gate sul ratio
//! - `converter`: fase opzionale di conversione in WebP
//! - `path_resolver`: risoluzione delle directory da elaborare

pub mod asset_optimizer;
pub mod converter;
pub mod path_resolver;
pub mod task_optimizer;

pub use asset_optimizer::{AssetOptimizer, OptimizationOutcome};
pub use converter::Converter;
pub use path_resolver::PathResolver;
pub use task_optimizer::{FileOutcome, TaskOptimizer};
