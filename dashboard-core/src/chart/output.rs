use parking_lot::Mutex;
use serde::Serialize;
use std::{
    collections::HashMap,
    fs,
    path::{Path, PathBuf},
    sync::{Arc, OnceLock},
};
use tracing::info;

use crate::error::RenderError;

/// A rendered chart image.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChartArtifact {
    /// Path relative to the charts directory's parent, e.g. `charts/hourly_Oslo.png`.
    pub relative_path: String,
    #[serde(skip)]
    pub path: PathBuf,
}

type LockMap = Mutex<HashMap<PathBuf, Arc<Mutex<()>>>>;

/// One lock per output file, shared by every [`ChartOutput`] in the process.
/// Entries are dropped once no writer holds them.
static LOCKS: OnceLock<LockMap> = OnceLock::new();

/// The charts directory.
///
/// Writers of the same file are serialised, and every image is first written
/// to a temporary file and then renamed into place, so readers never observe a
/// half-written chart.
#[derive(Debug, Clone)]
pub struct ChartOutput {
    dir: PathBuf,
}

impl ChartOutput {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// `<charts dir name>/<file name>`, with forward slashes.
    pub fn relative_path(&self, file_name: &str) -> String {
        match self.dir.file_name() {
            Some(dir) => format!("{}/{}", dir.to_string_lossy(), file_name),
            None => file_name.to_owned(),
        }
    }

    /// Write `file_name` via `draw`, which receives a temporary path to fill.
    pub fn write<F>(&self, file_name: &str, draw: F) -> Result<ChartArtifact, RenderError>
    where
        F: FnOnce(&Path) -> Result<(), RenderError>,
    {
        fs::create_dir_all(&self.dir).map_err(|e| RenderError::io(&self.dir, e))?;

        let path = self.dir.join(file_name);
        let lock = acquire(&path);
        let written = {
            let _guard = lock.lock();
            self.replace(&path, draw)
        };
        release(&path, lock);
        written?;

        info!(path = %path.display(), "chart written");
        Ok(ChartArtifact { relative_path: self.relative_path(file_name), path })
    }

    fn replace<F>(&self, path: &Path, draw: F) -> Result<(), RenderError>
    where
        F: FnOnce(&Path) -> Result<(), RenderError>,
    {
        let tmp = tempfile::Builder::new()
            .prefix(".chart-")
            .suffix(".png")
            .tempfile_in(&self.dir)
            .map_err(|e| RenderError::io(&self.dir, e))?;

        draw(tmp.path())?;

        tmp.persist(path).map_err(|e| RenderError::io(path, e.error))?;
        Ok(())
    }
}

fn locks() -> &'static LockMap {
    LOCKS.get_or_init(Default::default)
}

fn acquire(path: &Path) -> Arc<Mutex<()>> {
    locks().lock().entry(path.to_path_buf()).or_default().clone()
}

fn release(path: &Path, lock: Arc<Mutex<()>>) {
    let mut map = locks().lock();
    // The map and this handle are the only owners left.
    if Arc::strong_count(&lock) == 2 {
        map.remove(path);
    }
}
