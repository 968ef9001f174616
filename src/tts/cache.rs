use std::collections::HashMap;
use std::fmt;
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use parking_lot::Mutex;
use tempfile::{NamedTempFile, TempDir};

/// Maximum number of entries kept in memory. Entries beyond this are only
/// persisted to disk; nothing is ever evicted.
pub const MEMORY_CAPACITY: usize = 50;

/// Maximum number of characters sent to synthesis (and hashed).
pub const MAX_TEXT_CHARS: usize = 1000;

/// Marker appended to truncated text.
pub const TRUNCATION_MARKER: &str = "...";

const CACHE_DIR_PREFIX: &str = "tts_cache_";
const CACHE_FILE_EXTENSION: &str = "mp3";

/// Deterministic cache key for a (voice, text) pair: 32 lowercase hex chars.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Fingerprint(String);

impl Fingerprint {
    /// The hex digest.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    fn file_name(&self) -> String {
        format!("{}.{CACHE_FILE_EXTENSION}", self.0)
    }
}

impl fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Trim `text` and cap it at [`MAX_TEXT_CHARS`] characters, appending
/// [`TRUNCATION_MARKER`] when it was cut.
pub fn normalize_text(text: &str) -> String {
    let trimmed = text.trim();
    match trimmed.char_indices().nth(MAX_TEXT_CHARS) {
        Some((cut, _)) => format!("{}{TRUNCATION_MARKER}", &trimmed[..cut]),
        None => trimmed.to_string(),
    }
}

/// Fingerprint of `text` spoken by `voice_id`. The text is normalized first.
pub fn key_for(voice_id: &str, text: &str) -> Fingerprint {
    let normalized = normalize_text(text);
    let digest = md5::compute(format!("{voice_id}:{normalized}").as_bytes());
    Fingerprint(format!("{digest:x}"))
}

/// Two-tier cache of synthesized audio keyed by [`Fingerprint`].
///
/// The memory tier holds at most [`MEMORY_CAPACITY`] entries and refuses new
/// ones once full. The disk tier lives in a private temporary directory that
/// grows without bound and is removed when the cache is dropped.
pub struct ContentAddressedCache {
    memory: Mutex<HashMap<Fingerprint, Arc<[u8]>>>,
    dir: TempDir,
}

impl ContentAddressedCache {
    /// Create a cache backed by a fresh temporary directory.
    pub fn new() -> io::Result<Self> {
        let dir = tempfile::Builder::new()
            .prefix(CACHE_DIR_PREFIX)
            .tempdir()?;
        log::info!("Audio cache directory: {}", dir.path().display());
        Ok(Self {
            memory: Mutex::new(HashMap::new()),
            dir,
        })
    }

    /// Directory holding the disk tier.
    pub fn dir(&self) -> &Path {
        self.dir.path()
    }

    fn path_for(&self, fingerprint: &Fingerprint) -> PathBuf {
        self.dir.path().join(fingerprint.file_name())
    }

    /// Look up audio in memory, then on disk.
    ///
    /// A disk hit is promoted into memory if there is room.
    pub fn get(&self, fingerprint: &Fingerprint) -> Option<Arc<[u8]>> {
        if let Some(audio) = self.memory.lock().get(fingerprint) {
            return Some(Arc::clone(audio));
        }

        let path = self.path_for(fingerprint);
        let audio: Arc<[u8]> = match fs::read(&path) {
            Ok(bytes) => bytes.into(),
            Err(e) if e.kind() == io::ErrorKind::NotFound => return None,
            Err(e) => {
                log::warn!("Failed to read cached audio {}: {e}", path.display());
                return None;
            }
        };

        log::debug!("Disk cache hit for {fingerprint}");
        let mut memory = self.memory.lock();
        if let Some(existing) = memory.get(fingerprint) {
            return Some(Arc::clone(existing));
        }
        if memory.len() < MEMORY_CAPACITY {
            memory.insert(fingerprint.clone(), Arc::clone(&audio));
        }
        Some(audio)
    }

    /// Store audio under `fingerprint` and return the cached copy.
    ///
    /// The first bytes stored for a fingerprint win: a later `put` returns
    /// whatever memory or disk already holds instead of its own argument.
    /// Disk persistence is best effort: failures are logged and the memory
    /// tier stays authoritative.
    pub fn put(&self, fingerprint: &Fingerprint, audio: impl Into<Arc<[u8]>>) -> Arc<[u8]> {
        if let Some(existing) = self.memory.lock().get(fingerprint) {
            return Arc::clone(existing);
        }

        let stored = self.persist(fingerprint, audio.into());

        let mut memory = self.memory.lock();
        if let Some(existing) = memory.get(fingerprint) {
            return Arc::clone(existing);
        }
        if memory.len() < MEMORY_CAPACITY {
            memory.insert(fingerprint.clone(), Arc::clone(&stored));
        } else {
            log::debug!("Memory cache full, keeping {fingerprint} on disk only");
        }
        stored
    }

    /// Write `audio` to the disk tier unless the file already exists, and
    /// return the bytes the disk now holds.
    ///
    /// Files only appear through an atomic rename, so readers never see a
    /// partial write.
    fn persist(&self, fingerprint: &Fingerprint, audio: Arc<[u8]>) -> Arc<[u8]> {
        let path = self.path_for(fingerprint);
        let written = NamedTempFile::new_in(self.dir.path())
            .and_then(|mut file| {
                file.write_all(&audio)?;
                Ok(file)
            })
            .and_then(|file| file.persist_noclobber(&path).map_err(|e| e.error));

        match written {
            Ok(_) => audio,
            Err(e) if e.kind() == io::ErrorKind::AlreadyExists => match fs::read(&path) {
                Ok(existing) => {
                    log::debug!("{fingerprint} already on disk, keeping stored copy");
                    existing.into()
                }
                Err(e) => {
                    log::warn!("Failed to read cached audio {}: {e}", path.display());
                    audio
                }
            },
            Err(e) => {
                log::warn!("Failed to persist cached audio {}: {e}", path.display());
                audio
            }
        }
    }

    /// Number of entries in the memory tier.
    pub fn len(&self) -> usize {
        self.memory.lock().len()
    }

    /// Whether the memory tier is empty.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Drop every memory entry and delete every file in the disk tier.
    pub fn clear(&self) {
        self.memory.lock().clear();

        let entries = match fs::read_dir(self.dir.path()) {
            Ok(entries) => entries,
            Err(e) => {
                log::warn!("Failed to list cache directory: {e}");
                return;
            }
        };
        for entry in entries.flatten() {
            let path = entry.path();
            if let Err(e) = fs::remove_file(&path) {
                log::warn!("Failed to remove {}: {e}", path.display());
            }
        }
        log::info!("Audio cache cleared");
    }
}
