use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use log::{info, warn};
use rusqlite::{Connection, OpenFlags};
use sha2::{Digest, Sha256};

use super::blob::{BlobFetch, ReplicaLocation};
use super::clock::Clock;
use crate::errors::ReplicaError;

/// TTL-refreshed local mirror of a database file kept in remote blob
/// storage.
///
/// Read-only: there is no write-back path. Every open gets a fresh
/// connection against the (possibly just refreshed) local file. Freshness
/// races between independent processes are tolerated; a double download is
/// wasteful but harmless.
pub struct ReplicaCache {
    location: ReplicaLocation,
    local_path: PathBuf,
    ttl: Duration,
    fetcher: Box<dyn BlobFetch>,
    clock: Box<dyn Clock>,
    last_download_ms: Option<u64>,
}

impl ReplicaCache {
    pub fn new(
        location: ReplicaLocation,
        ttl: Duration,
        fetcher: Box<dyn BlobFetch>,
        clock: Box<dyn Clock>,
    ) -> Self {
        let local_path = derive_local_path(&location.key);
        Self {
            location,
            local_path,
            ttl,
            fetcher,
            clock,
            last_download_ms: None,
        }
    }

    /// Open a read-only connection against the local mirror, refreshing it
    /// first if the TTL has lapsed.
    pub async fn open(&mut self) -> Result<Connection, ReplicaError> {
        self.ensure_fresh().await?;

        Connection::open_with_flags(&self.local_path, OpenFlags::SQLITE_OPEN_READ_ONLY)
            .map_err(|e| ReplicaError::Open(e.to_string()))
    }

    pub fn local_path(&self) -> &Path {
        &self.local_path
    }

    /// Remove the local mirror file.
    pub fn cleanup(&mut self) {
        if self.local_path.exists() {
            match fs::remove_file(&self.local_path) {
                Ok(()) => info!("Removed replica file {}", self.local_path.display()),
                Err(e) => warn!(
                    "Failed to remove replica file {}: {}",
                    self.local_path.display(),
                    e
                ),
            }
        }
        self.last_download_ms = None;
    }

    async fn ensure_fresh(&mut self) -> Result<(), ReplicaError> {
        if !self.needs_download() {
            return Ok(());
        }

        match self.fetcher.fetch(&self.location, &self.local_path).await {
            Ok(()) => {
                self.last_download_ms = Some(self.clock.now_ms());
                Ok(())
            }
            Err(e) => {
                // No retry; a stale local copy beats failing the read.
                if self.local_path.exists() {
                    warn!("Replica refresh failed, serving stale copy: {}", e);
                    Ok(())
                } else {
                    Err(e)
                }
            }
        }
    }

    fn needs_download(&self) -> bool {
        if !self.local_path.exists() {
            return true;
        }
        match self.last_download_ms {
            Some(at) => self.clock.now_ms().saturating_sub(at) > self.ttl.as_millis() as u64,
            None => true,
        }
    }
}

impl Drop for ReplicaCache {
    fn drop(&mut self) {
        self.cleanup();
    }
}

// The path only depends on the key, so every process mirroring the same
// object converges on the same file.
fn derive_local_path(key: &str) -> PathBuf {
    let digest = hex::encode(Sha256::digest(key.as_bytes()));
    std::env::temp_dir().join(format!("replica_{}.db", &digest[..8]))
}
