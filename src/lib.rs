//! # Asset Optimizer Library
//!
//! Questo è il modulo principale della libreria che espone tutte le API pubbliche.
//!
//! ## Architettura dei moduli:
//! - `config`: Gestione configurazione e validazione parametri
//! - `error`: Tipi di errore custom per diverse operazioni
//! - `formats`: Matching dei formati immagine (nine-patch esclusi)
//! - `fingerprint`: Identità economica di un file (path + mtime, MD5)
//! - `ledger`: Registro persistente degli asset già ottimizzati
//! - `file_manager`: Discovery directory e operazioni sui file
//! - `policy`: Regole di selezione e gate sul compression ratio
//! - `service`: Servizio remoto di compressione/conversione
//! - `optimizer`: Orchestratore principale del processo
//! - `progress`: Progress tracking e statistiche
//!
//! ## Utilizzo:
//! ```ignore
//! use asset_optimizer::{AssetOptimizer, OptimizerConfig, TinifyClient};
//!
//! let service = Arc::new(TinifyClient::new(&config.api_key, &config.endpoint, timeout)?);
//! let optimizer = AssetOptimizer::new(&project_root, config, service);
//! let outcome = optimizer.run().await?;
//! ```

pub mod config;
pub mod error;
pub mod file_manager;
pub mod fingerprint;
pub mod formats;
pub mod ledger;
pub mod optimizer;
pub mod policy;
pub mod progress;
pub mod service;

pub use config::OptimizerConfig;
pub use error::OptimizeError;
pub use formats::FormatFilter;
pub use ledger::{AssetRecord, Ledger, LedgerStore};
pub use optimizer::{AssetOptimizer, OptimizationOutcome};
pub use service::{CompressionService, ServiceError, TinifyClient};
