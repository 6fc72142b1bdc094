//! Path -> [`ArtifactKind`] classification, memoized per path.

use std::collections::HashMap;
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError};

use tracing::debug;

use super::ArtifactKind;

/// Bytes inspected when the extension is not recognized.
pub const SNIFF_LIMIT: usize = 4096;

/// Read-only filesystem access used by classification and existence checks.
pub trait ArtifactFs: Send + Sync {
    fn is_dir(&self, path: &Path) -> io::Result<bool>;

    /// Up to `limit` bytes from the start of the file.
    fn read_head(&self, path: &Path, limit: usize) -> io::Result<Vec<u8>>;

    fn exists(&self, path: &Path) -> bool;

    fn list_dir(&self, path: &Path) -> io::Result<Vec<PathBuf>>;
}

/// The real filesystem.
#[derive(Debug, Default, Clone, Copy)]
pub struct LocalFs;

impl ArtifactFs for LocalFs {
    fn is_dir(&self, path: &Path) -> io::Result<bool> {
        Ok(std::fs::metadata(path)?.is_dir())
    }

    fn read_head(&self, path: &Path, limit: usize) -> io::Result<Vec<u8>> {
        let file = std::fs::File::open(path)?;
        let mut buf = Vec::with_capacity(limit);
        file.take(limit as u64).read_to_end(&mut buf)?;
        Ok(buf)
    }

    fn exists(&self, path: &Path) -> bool {
        path.exists()
    }

    fn list_dir(&self, path: &Path) -> io::Result<Vec<PathBuf>> {
        let mut entries = std::fs::read_dir(path)?
            .filter_map(|e| e.ok().map(|e| e.path()))
            .collect::<Vec<_>>();
        entries.sort();
        Ok(entries)
    }
}

pub struct ArtifactClassifier {
    fs: Arc<dyn ArtifactFs>,
    memo: Mutex<HashMap<PathBuf, ArtifactKind>>,
}

impl Default for ArtifactClassifier {
    fn default() -> Self {
        Self::new(Arc::new(LocalFs))
    }
}

impl ArtifactClassifier {
    pub fn new(fs: Arc<dyn ArtifactFs>) -> Self {
        Self {
            fs,
            memo: Mutex::new(HashMap::new()),
        }
    }

    pub fn fs(&self) -> &dyn ArtifactFs {
        self.fs.as_ref()
    }

    /// Classify `path`. Never fails: unreadable paths are `Unknown`.
    ///
    /// Every result, `Unknown` included, is cached for the life of the
    /// classifier. Paths are assumed immutable once referenced.
    pub fn classify(&self, path: &Path) -> ArtifactKind {
        if let Some(kind) = self.lock().get(path) {
            return *kind;
        }

        let kind = self.inspect(path);
        debug!(path = %path.display(), %kind, "classified artifact");
        self.lock().insert(path.to_path_buf(), kind);
        kind
    }

    pub fn cached_len(&self) -> usize {
        self.lock().len()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<PathBuf, ArtifactKind>> {
        self.memo.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn inspect(&self, path: &Path) -> ArtifactKind {
        match self.fs.is_dir(path) {
            Ok(true) => return ArtifactKind::Folder,
            Ok(false) => {}
            Err(_) => return ArtifactKind::Unknown,
        }

        if let Some(kind) = kind_from_extension(path) {
            return kind;
        }

        match self.fs.read_head(path, SNIFF_LIMIT) {
            Ok(head) if head.contains(&0) => ArtifactKind::Binary,
            Ok(_) => ArtifactKind::Text,
            Err(_) => ArtifactKind::Unknown,
        }
    }
}

fn kind_from_extension(path: &Path) -> Option<ArtifactKind> {
    let ext = path.extension()?.to_str()?.to_ascii_lowercase();
    let kind = match ext.as_str() {
        "mp4" | "webm" | "mov" => ArtifactKind::Video,
        "png" | "jpg" | "jpeg" | "gif" => ArtifactKind::Image,
        "json" => ArtifactKind::Json,
        "xml" => ArtifactKind::Xml,
        "log" => ArtifactKind::Log,
        "feature" => ArtifactKind::Feature,
        _ => return None,
    };
    Some(kind)
}
