use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::SystemTime;

use parking_lot::RwLock;
use tracing::{info, warn};

use crate::dataset::Dataset;
use crate::error::DatasetError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct FileStamp {
    modified: Option<SystemTime>,
    len: u64,
}

impl FileStamp {
    fn read(path: &Path) -> Option<Self> {
        let meta = fs::metadata(path).ok()?;
        Some(Self {
            modified: meta.modified().ok(),
            len: meta.len(),
        })
    }
}

#[derive(Debug)]
struct Snapshot {
    stamp: Option<FileStamp>,
    dataset: Arc<Dataset>,
}

/// Process-wide, read-only view of the dataset file.
///
/// The parsed file is cached and handed out as a shared snapshot; it is
/// re-read only when the file's size or modification time changes. A failed
/// re-read keeps serving the previous snapshot.
#[derive(Debug)]
pub struct DatasetSource {
    path: Option<PathBuf>,
    current: RwLock<Option<Snapshot>>,
    loads: AtomicU64,
}

impl DatasetSource {
    /// Lazy source; the file is first read by [`DatasetSource::snapshot`].
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: Some(path.into()),
            current: RwLock::new(None),
            loads: AtomicU64::new(0),
        }
    }

    /// Reads the file once up front so a bad path fails at startup.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, DatasetError> {
        let source = Self::new(path);
        source.snapshot()?;
        Ok(source)
    }

    /// Fixed in-memory dataset with no backing file.
    pub fn from_dataset(dataset: Dataset) -> Self {
        Self {
            path: None,
            current: RwLock::new(Some(Snapshot {
                stamp: None,
                dataset: Arc::new(dataset),
            })),
            loads: AtomicU64::new(0),
        }
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Number of successful file reads so far.
    pub fn load_count(&self) -> u64 {
        self.loads.load(Ordering::Relaxed)
    }

    pub fn snapshot(&self) -> Result<Arc<Dataset>, DatasetError> {
        let Some(path) = self.path.as_deref() else {
            return self.current.read().as_ref().map(|s| s.dataset.clone()).ok_or_else(|| {
                DatasetError::InvalidInput("in-memory dataset source is empty".to_string())
            });
        };

        let stamp = FileStamp::read(path);
        if let Some(dataset) = self.fresh(stamp) {
            return Ok(dataset);
        }

        let mut current = self.current.write();
        // Another request may have reloaded while we waited for the lock.
        if let Some(snapshot) = current.as_ref() {
            if stamp.is_some() && snapshot.stamp == stamp {
                return Ok(snapshot.dataset.clone());
            }
        }

        match Dataset::load(path) {
            Ok(dataset) => {
                let dataset = Arc::new(dataset);
                let reload = current.is_some();
                *current = Some(Snapshot {
                    stamp,
                    dataset: dataset.clone(),
                });
                self.loads.fetch_add(1, Ordering::Relaxed);
                info!(
                    path = %path.display(),
                    packages = dataset.len(),
                    reload,
                    "dataset loaded"
                );
                Ok(dataset)
            }
            Err(err) => match current.as_ref() {
                Some(snapshot) => {
                    warn!(
                        path = %path.display(),
                        error = %err,
                        "dataset reload failed; serving previous snapshot"
                    );
                    Ok(snapshot.dataset.clone())
                }
                None => Err(err),
            },
        }
    }

    fn fresh(&self, stamp: Option<FileStamp>) -> Option<Arc<Dataset>> {
        let current = self.current.read();
        let snapshot = current.as_ref()?;
        (stamp.is_some() && snapshot.stamp == stamp).then(|| snapshot.dataset.clone())
    }
}
