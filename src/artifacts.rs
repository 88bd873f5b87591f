//! ArtifactStore - on-disk layout and cache for generated media.
//!
//! Layout under the output root:
//!
//! ```text
//! images/{key}.jpg
//! audio/{key}.mp3
//! videos/{key}.mp4
//! ```
//!
//! A file that exists is a cache hit unless its `{file}.fingerprint` sidecar
//! records different inputs. Writes go through a temporary file in the same
//! directory that is renamed over the target, so readers never see a partial
//! artifact.

use sha2::{Digest, Sha256};
use std::collections::HashMap;
use std::fmt;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use tempfile::NamedTempFile;

/// Extension of the sidecar that records the inputs an artifact was built from.
const FINGERPRINT_EXT: &str = "fingerprint";

/// The three kinds of generated artifact.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ArtifactKind {
    Image,
    Audio,
    Video,
}

impl ArtifactKind {
    pub const ALL: [ArtifactKind; 3] = [ArtifactKind::Image, ArtifactKind::Audio, ArtifactKind::Video];

    /// Subdirectory of the output root holding this kind.
    pub fn dir_name(self) -> &'static str {
        match self {
            ArtifactKind::Image => "images",
            ArtifactKind::Audio => "audio",
            ArtifactKind::Video => "videos",
        }
    }

    pub fn extension(self) -> &'static str {
        match self {
            ArtifactKind::Image => "jpg",
            ArtifactKind::Audio => "mp3",
            ArtifactKind::Video => "mp4",
        }
    }
}

impl fmt::Display for ArtifactKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArtifactKind::Image => write!(f, "image"),
            ArtifactKind::Audio => write!(f, "audio"),
            ArtifactKind::Video => write!(f, "video"),
        }
    }
}

/// Information about a stored artifact.
#[derive(Debug, Clone)]
pub struct ArtifactEntry {
    pub kind: ArtifactKind,
    /// Sanitized key (file stem)
    pub key: String,
    /// Size of the artifact in bytes
    pub size_bytes: u64,
    /// Full path to the artifact
    pub path: PathBuf,
}

/// On-disk store for generated artifacts.
pub struct ArtifactStore {
    root: PathBuf,
    locks: Mutex<HashMap<(ArtifactKind, String), Arc<tokio::sync::Mutex<()>>>>,
}

impl ArtifactStore {
    /// Create a store rooted at `root`.
    /// Does not create any directory - call `ensure_dirs()` to create them.
    pub fn new(root: PathBuf) -> Self {
        Self {
            root,
            locks: Mutex::new(HashMap::new()),
        }
    }

    /// Create a store and its kind directories.
    pub fn new_initialized(root: PathBuf) -> Result<Self, std::io::Error> {
        let store = Self::new(root);
        store.ensure_dirs()?;
        Ok(store)
    }

    /// Ensure the root and every kind directory exist.
    pub fn ensure_dirs(&self) -> Result<(), std::io::Error> {
        for kind in ArtifactKind::ALL {
            std::fs::create_dir_all(self.kind_dir(kind))?;
        }
        Ok(())
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn kind_dir(&self, kind: ArtifactKind) -> PathBuf {
        self.root.join(kind.dir_name())
    }

    /// Path of the artifact of `kind` for `key`.
    pub fn path_for(&self, kind: ArtifactKind, key: &str) -> PathBuf {
        self.kind_dir(kind)
            .join(format!("{}.{}", key, kind.extension()))
    }

    /// Cached artifact for `key`, if present and built from matching inputs.
    ///
    /// Files without a fingerprint sidecar predate fingerprinting and are
    /// accepted as-is.
    pub fn get(&self, kind: ArtifactKind, key: &str, fingerprint: &str) -> Option<PathBuf> {
        let path = self.path_for(kind, key);
        if !path.is_file() {
            return None;
        }

        match read_fingerprint(&path) {
            Some(recorded) if recorded != fingerprint => {
                log::info!(
                    "Cached {} for '{}' was built from different inputs; regenerating",
                    kind,
                    key
                );
                None
            }
            _ => Some(path),
        }
    }

    /// Fingerprint recorded for the artifact at `path`, if any.
    pub fn recorded_fingerprint(&self, path: &Path) -> Option<String> {
        read_fingerprint(path)
    }

    /// Record the inputs the artifact at `path` was built from.
    pub fn record_fingerprint(&self, path: &Path, fingerprint: &str) -> Result<(), std::io::Error> {
        write_atomic(&fingerprint_path(path), fingerprint.as_bytes())
    }

    /// Acquire the exclusive generation lock for (`kind`, `key`).
    ///
    /// Holding the guard makes the check-then-create sequence for one artifact
    /// race-free within this process. Locks nobody holds or waits on are
    /// dropped from the map here, so it only grows with concurrent keys.
    pub async fn lock(&self, kind: ArtifactKind, key: &str) -> tokio::sync::OwnedMutexGuard<()> {
        let lock = {
            let mut locks = self.locks.lock().unwrap_or_else(|e| e.into_inner());
            // Guards and waiters each hold a clone
            locks.retain(|_, lock| Arc::strong_count(lock) > 1);
            locks
                .entry((kind, key.to_string()))
                .or_insert_with(|| Arc::new(tokio::sync::Mutex::new(())))
                .clone()
        };
        lock.lock_owned().await
    }

    #[cfg(test)]
    fn tracked_locks(&self) -> usize {
        self.locks.lock().unwrap_or_else(|e| e.into_inner()).len()
    }

    /// Generate a deterministic fingerprint of the inputs of an artifact.
    /// Returns a 32-character hex string (first 16 bytes of SHA256).
    pub fn fingerprint(parts: &[&str]) -> String {
        let mut hasher = Sha256::new();
        for part in parts {
            hasher.update((part.len() as u64).to_le_bytes());
            hasher.update(part.as_bytes());
        }
        let result = hasher.finalize();
        hex::encode(&result[..16])
    }

    /// List all stored artifacts, sorted by kind then key.
    pub fn list_entries(&self) -> Result<Vec<ArtifactEntry>, std::io::Error> {
        let mut entries = Vec::new();

        for kind in ArtifactKind::ALL {
            let dir = self.kind_dir(kind);
            if !dir.exists() {
                continue;
            }

            let mut kind_entries = Vec::new();
            for entry in std::fs::read_dir(&dir)? {
                let entry = entry?;
                let path = entry.path();

                if path.extension().and_then(|e| e.to_str()) != Some(kind.extension()) {
                    continue;
                }

                let metadata = entry.metadata()?;
                if !metadata.is_file() {
                    continue;
                }

                let key = path
                    .file_stem()
                    .and_then(|s| s.to_str())
                    .unwrap_or("")
                    .to_string();

                // In-flight temporaries are hidden files
                if key.starts_with('.') {
                    continue;
                }

                kind_entries.push(ArtifactEntry {
                    kind,
                    key,
                    size_bytes: metadata.len(),
                    path,
                });
            }

            kind_entries.sort_by(|a, b| a.key.cmp(&b.key));
            entries.extend(kind_entries);
        }

        Ok(entries)
    }

    /// Total size of all stored artifacts in bytes.
    pub fn total_size_bytes(&self) -> Result<u64, std::io::Error> {
        Ok(self.list_entries()?.iter().map(|e| e.size_bytes).sum())
    }
}

fn fingerprint_path(path: &Path) -> PathBuf {
    let mut name = path.as_os_str().to_os_string();
    name.push(".");
    name.push(FINGERPRINT_EXT);
    PathBuf::from(name)
}

fn read_fingerprint(path: &Path) -> Option<String> {
    std::fs::read_to_string(fingerprint_path(path))
        .ok()
        .map(|s| s.trim().to_string())
}

/// Create a hidden temporary file next to `dest`, keeping `dest`'s extension.
///
/// The file is deleted when dropped unless persisted with [`persist`].
pub fn temp_sibling(dest: &Path) -> Result<NamedTempFile, std::io::Error> {
    let dir = match dest.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    };
    std::fs::create_dir_all(&dir)?;

    let suffix = dest
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| format!(".{}", e))
        .unwrap_or_default();

    tempfile::Builder::new()
        .prefix(".partial-")
        .suffix(&suffix)
        .tempfile_in(dir)
}

/// Move a finished temporary file over `dest`.
pub fn persist(temp: NamedTempFile, dest: &Path) -> Result<(), std::io::Error> {
    temp.persist(dest).map(|_| ()).map_err(|e| e.error)
}

/// Write `bytes` to `dest` atomically.
pub fn write_atomic(dest: &Path, bytes: &[u8]) -> Result<(), std::io::Error> {
    let mut temp = temp_sibling(dest)?;
    temp.write_all(bytes)?;
    temp.flush()?;
    persist(temp, dest)
}
