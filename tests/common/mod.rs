#![allow(dead_code)]

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::{Duration, SystemTime};
use tempfile::TempDir;

use asset_optimizer::formats::TargetFormat;
use asset_optimizer::service::{CompressionService, ConvertedImage, OptimizedImage, ServiceError};
use asset_optimizer::OptimizerConfig;

/// Payload prefix that makes the mock service fail for that file
pub const FAIL_MARKER: &[u8] = b"FAIL";

/// In-memory stand-in for the remote compression service
pub struct MockService {
    /// after / before size of every optimized result
    pub output_ratio: f64,
    /// Calls with index >= this value report quota exhaustion
    pub quota_after: Option<usize>,
    /// Convert calls with index >= this value report quota exhaustion
    pub convert_quota_after: Option<usize>,
    /// Simulated latency of every optimize call
    pub delay: Option<Duration>,
    pub credential_valid: bool,
    optimize_calls: AtomicUsize,
    convert_calls: AtomicUsize,
    submitted: Mutex<Vec<Vec<u8>>>,
}

impl MockService {
    pub fn new(output_ratio: f64) -> Self {
        Self {
            output_ratio,
            quota_after: None,
            convert_quota_after: None,
            delay: None,
            credential_valid: true,
            optimize_calls: AtomicUsize::new(0),
            convert_calls: AtomicUsize::new(0),
            submitted: Mutex::new(Vec::new()),
        }
    }

    pub fn with_quota_after(mut self, calls: usize) -> Self {
        self.quota_after = Some(calls);
        self
    }

    pub fn with_convert_quota_after(mut self, calls: usize) -> Self {
        self.convert_quota_after = Some(calls);
        self
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn with_invalid_credential(mut self) -> Self {
        self.credential_valid = false;
        self
    }

    pub fn optimize_calls(&self) -> usize {
        self.optimize_calls.load(Ordering::SeqCst)
    }

    pub fn convert_calls(&self) -> usize {
        self.convert_calls.load(Ordering::SeqCst)
    }

    pub fn submitted(&self) -> Vec<Vec<u8>> {
        self.submitted.lock().unwrap().clone()
    }
}

#[async_trait]
impl CompressionService for MockService {
    async fn validate_credential(&self) -> Result<bool, ServiceError> {
        Ok(self.credential_valid)
    }

    async fn optimize(&self, data: Vec<u8>) -> Result<OptimizedImage, ServiceError> {
        let index = self.optimize_calls.fetch_add(1, Ordering::SeqCst);
        self.submitted.lock().unwrap().push(data.clone());
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        if self.quota_after.is_some_and(|limit| index >= limit) {
            return Err(ServiceError::QuotaExceeded("Your monthly limit has been exceeded".to_string()));
        }
        if data.starts_with(FAIL_MARKER) {
            return Err(ServiceError::Failure("HTTP 415: Unsupported media type".to_string()));
        }

        let size = (data.len() as f64 * self.output_ratio).round() as usize;
        Ok(OptimizedImage::new(vec![b'o'; size]))
    }

    async fn convert(&self, _data: Vec<u8>, target: TargetFormat) -> Result<ConvertedImage, ServiceError> {
        let index = self.convert_calls.fetch_add(1, Ordering::SeqCst);
        if self.convert_quota_after.is_some_and(|limit| index >= limit) {
            return Err(ServiceError::QuotaExceeded("Your monthly limit has been exceeded".to_string()));
        }
        Ok(ConvertedImage {
            data: b"converted".to_vec(),
            extension: target.extension().to_string(),
        })
    }
}

pub fn create_temp_project() -> TempDir {
    TempDir::new().unwrap()
}

/// Write `size` bytes of image data at `relative` under `root`
pub fn write_image(root: &Path, relative: &str, size: usize) -> PathBuf {
    write_bytes(root, relative, &vec![b'x'; size])
}

pub fn write_bytes(root: &Path, relative: &str, data: &[u8]) -> PathBuf {
    let path = root.join(relative);
    std::fs::create_dir_all(path.parent().unwrap()).unwrap();
    std::fs::write(&path, data).unwrap();
    path
}

/// Move a file's modification time, simulating an edit
pub fn touch_at(path: &Path, secs_since_epoch: u64) {
    let file = std::fs::File::options().write(true).open(path).unwrap();
    file.set_modified(SystemTime::UNIX_EPOCH + Duration::from_secs(secs_since_epoch))
        .unwrap();
}

/// Config with a key, one worker and default thresholds
pub fn test_config() -> OptimizerConfig {
    OptimizerConfig {
        api_key: "test-key".to_string(),
        workers: 1,
        ..Default::default()
    }
}
