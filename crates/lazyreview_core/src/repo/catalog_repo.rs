//! Catalog persistence contracts and JSON file implementation.
//!
//! # Responsibility
//! - Load and save the whole catalog as one document.
//! - Keep file layout, locking and atomic replacement inside the repo layer.
//!
//! # Invariants
//! - Saves replace the document atomically (write temp file, then rename).
//! - A save holds an exclusive lock file for its whole duration and releases
//!   it on every exit path.
//! - Loads reject documents that break model invariants instead of masking
//!   them.
//! - A missing document loads as the default catalog.

use crate::model::catalog::Catalog;
use log::{error, info};
use serde::Serialize;
use serde_json::ser::PrettyFormatter;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::fs::{self, File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, PoisonError};
use std::time::Instant;

pub type RepoResult<T> = Result<T, RepoError>;

/// Persistence failure for catalog load/save.
#[derive(Debug)]
pub enum RepoError {
    Io { path: PathBuf, source: io::Error },
    Serialize(serde_json::Error),
    InvalidData(String),
    /// Another writer holds the lock file.
    Locked(PathBuf),
    /// Backend refused the operation (used by non-file repositories).
    Unavailable(String),
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Io { path, source } => write!(f, "i/o error on `{}`: {source}", path.display()),
            Self::Serialize(err) => write!(f, "failed to encode catalog: {err}"),
            Self::InvalidData(message) => write!(f, "invalid persisted catalog data: {message}"),
            Self::Locked(path) => write!(
                f,
                "catalog is locked by another writer; remove `{}` if no other process is running",
                path.display()
            ),
            Self::Unavailable(message) => write!(f, "catalog storage unavailable: {message}"),
        }
    }
}

impl Error for RepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Io { source, .. } => Some(source),
            Self::Serialize(err) => Some(err),
            Self::InvalidData(_) | Self::Locked(_) | Self::Unavailable(_) => None,
        }
    }
}

/// Whole-document catalog storage.
pub trait CatalogRepository {
    fn load(&self) -> RepoResult<Catalog>;
    fn save(&self, catalog: &Catalog) -> RepoResult<()>;
}

impl<R: CatalogRepository + ?Sized> CatalogRepository for &R {
    fn load(&self) -> RepoResult<Catalog> {
        (**self).load()
    }

    fn save(&self, catalog: &Catalog) -> RepoResult<()> {
        (**self).save(catalog)
    }
}

/// JSON document on the local filesystem.
pub struct JsonFileCatalogRepository {
    path: PathBuf,
}

impl JsonFileCatalogRepository {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn sibling(&self, suffix: &str) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|name| name.to_os_string())
            .unwrap_or_default();
        name.push(suffix);
        self.path.with_file_name(name)
    }

    fn write_document(&self, catalog: &Catalog) -> RepoResult<()> {
        let _lock = LockGuard::acquire(self.sibling(".lock"))?;

        let mut buffer = Vec::new();
        let formatter = PrettyFormatter::with_indent(b"    ");
        let mut serializer = serde_json::Serializer::with_formatter(&mut buffer, formatter);
        catalog
            .serialize(&mut serializer)
            .map_err(RepoError::Serialize)?;
        buffer.push(b'\n');

        let pending = PendingFile::write(self.sibling(".tmp"), &buffer)?;
        pending.commit(&self.path)
    }
}

impl CatalogRepository for JsonFileCatalogRepository {
    fn load(&self) -> RepoResult<Catalog> {
        let started_at = Instant::now();
        let content = match fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(err) if err.kind() == io::ErrorKind::NotFound => {
                info!("event=catalog_load module=repo status=ok source=default");
                return Ok(Catalog::default());
            }
            Err(source) => {
                error!(
                    "event=catalog_load module=repo status=error error_code=catalog_read_failed error={}",
                    source
                );
                return Err(RepoError::Io {
                    path: self.path.clone(),
                    source,
                });
            }
        };

        let catalog = serde_json::from_str::<Catalog>(&content)
            .map_err(|err| RepoError::InvalidData(err.to_string()))
            .and_then(|catalog| {
                catalog
                    .validate()
                    .map_err(|err| RepoError::InvalidData(err.to_string()))?;
                Ok(catalog)
            });

        match &catalog {
            Ok(loaded) => info!(
                "event=catalog_load module=repo status=ok source=file subjects={} duration_ms={}",
                loaded.subjects().len(),
                started_at.elapsed().as_millis()
            ),
            Err(err) => error!(
                "event=catalog_load module=repo status=error error_code=catalog_invalid error={}",
                err
            ),
        }
        catalog
    }

    fn save(&self, catalog: &Catalog) -> RepoResult<()> {
        let started_at = Instant::now();
        match self.write_document(catalog) {
            Ok(()) => {
                info!(
                    "event=catalog_save module=repo status=ok subjects={} duration_ms={}",
                    catalog.subjects().len(),
                    started_at.elapsed().as_millis()
                );
                Ok(())
            }
            Err(err) => {
                error!(
                    "event=catalog_save module=repo status=error duration_ms={} error={}",
                    started_at.elapsed().as_millis(),
                    err
                );
                Err(err)
            }
        }
    }
}

fn io_error(path: &Path, source: io::Error) -> RepoError {
    RepoError::Io {
        path: path.to_path_buf(),
        source,
    }
}

/// Exclusive lock file removed on drop.
struct LockGuard {
    path: PathBuf,
}

impl LockGuard {
    fn acquire(path: PathBuf) -> RepoResult<Self> {
        match OpenOptions::new().write(true).create_new(true).open(&path) {
            Ok(_) => Ok(Self { path }),
            Err(err) if err.kind() == io::ErrorKind::AlreadyExists => Err(RepoError::Locked(path)),
            Err(source) => Err(RepoError::Io { path, source }),
        }
    }
}

impl Drop for LockGuard {
    fn drop(&mut self) {
        let _ = fs::remove_file(&self.path);
    }
}

/// Fully written temporary sibling; removed on drop unless renamed into place.
struct PendingFile {
    path: PathBuf,
    committed: bool,
}

impl PendingFile {
    fn write(path: PathBuf, bytes: &[u8]) -> RepoResult<Self> {
        let pending = Self {
            path,
            committed: false,
        };
        let mut file = File::create(&pending.path).map_err(|source| io_error(&pending.path, source))?;
        file.write_all(bytes)
            .and_then(|()| file.sync_all())
            .map_err(|source| io_error(&pending.path, source))?;
        Ok(pending)
    }

    fn commit(mut self, target: &Path) -> RepoResult<()> {
        fs::rename(&self.path, target).map_err(|source| io_error(target, source))?;
        self.committed = true;
        Ok(())
    }
}

impl Drop for PendingFile {
    fn drop(&mut self) {
        if !self.committed {
            let _ = fs::remove_file(&self.path);
        }
    }
}

/// Process-local repository keeping the last saved catalog.
#[derive(Default)]
pub struct InMemoryCatalogRepository {
    stored: Mutex<Option<Catalog>>,
    fail_saves: AtomicBool,
}

impl InMemoryCatalogRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_catalog(catalog: Catalog) -> Self {
        Self {
            stored: Mutex::new(Some(catalog)),
            fail_saves: AtomicBool::new(false),
        }
    }

    /// Makes subsequent saves fail with `RepoError::Unavailable`.
    pub fn set_fail_saves(&self, fail: bool) {
        self.fail_saves.store(fail, Ordering::SeqCst);
    }

    /// Last successfully saved catalog.
    pub fn snapshot(&self) -> Option<Catalog> {
        self.stored
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

impl CatalogRepository for InMemoryCatalogRepository {
    fn load(&self) -> RepoResult<Catalog> {
        Ok(self.snapshot().unwrap_or_default())
    }

    fn save(&self, catalog: &Catalog) -> RepoResult<()> {
        if self.fail_saves.load(Ordering::SeqCst) {
            return Err(RepoError::Unavailable("saves are disabled".to_string()));
        }
        *self.stored.lock().unwrap_or_else(PoisonError::into_inner) = Some(catalog.clone());
        Ok(())
    }
}
