use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use async_trait::async_trait;

use super::{CdnError, CdnInvalidator};

/// Invalidator that records every call instead of talking to a CDN.
pub struct RecordingInvalidator {
    calls: Mutex<Vec<Vec<String>>>,
    max_paths: usize,
    fail: AtomicBool,
    counter: AtomicUsize,
}

impl RecordingInvalidator {
    pub fn new(max_paths: usize) -> Self {
        Self {
            calls: Mutex::new(Vec::new()),
            max_paths,
            fail: AtomicBool::new(false),
            counter: AtomicUsize::new(0),
        }
    }

    /// Make subsequent calls fail (they are still recorded).
    pub fn set_failing(&self, fail: bool) {
        self.fail.store(fail, Ordering::SeqCst);
    }

    pub fn calls(&self) -> Vec<Vec<String>> {
        self.calls
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }
}

impl Default for RecordingInvalidator {
    fn default() -> Self {
        Self::new(1000)
    }
}

#[async_trait]
impl CdnInvalidator for RecordingInvalidator {
    async fn invalidate(&self, paths: &[String]) -> Result<String, CdnError> {
        if paths.len() > self.max_paths {
            return Err(CdnError::TooManyPaths {
                actual: paths.len(),
                limit: self.max_paths,
            });
        }
        self.calls
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .push(paths.to_vec());

        if self.fail.load(Ordering::SeqCst) {
            return Err(CdnError::Request("injected failure".into()));
        }
        let n = self.counter.fetch_add(1, Ordering::SeqCst) + 1;
        Ok(format!("INV{n}"))
    }

    fn max_paths_per_call(&self) -> usize {
        self.max_paths
    }
}
