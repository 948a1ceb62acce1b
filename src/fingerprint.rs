//! # Fingerprint Module
//!
//! Identità economica della versione corrente di un file: MD5 di
//! `path + mtime (ms)`. Il contenuto non viene mai letto, quindi un `touch`
//! senza modifiche forza una nuova ottimizzazione.

use md5::{Digest, Md5};
use std::path::Path;
use std::time::{SystemTime, UNIX_EPOCH};
use tokio::fs;

/// Compute the fingerprint for `ledger_path` from a modification time in milliseconds
pub fn fingerprint_from(ledger_path: &str, modified_millis: u128) -> String {
    let mut hasher = Md5::new();
    hasher.update(format!("{}{}", ledger_path, modified_millis).as_bytes());
    hex::encode(hasher.finalize())
}

/// Compute the fingerprint of a file on disk.
///
/// `ledger_path` is the key the file is tracked under; `file` is where it
/// actually lives.
pub async fn fingerprint(file: &Path, ledger_path: &str) -> std::io::Result<String> {
    let metadata = fs::metadata(file).await?;
    Ok(fingerprint_from(ledger_path, modified_millis(metadata.modified()?)))
}

/// Milliseconds since the Unix epoch; times before the epoch collapse to 0
pub fn modified_millis(time: SystemTime) -> u128 {
    time.duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis())
        .unwrap_or(0)
}
