//! Zip archives of serialized mapping models
//!
//! ## Archive Structure
//!
//! ```text
//! models.zip
//! ├── META-INF/
//! │   └── edimaps.json        # Manifest: which entries to index
//! └── edimaps/
//!     ├── ORDERS-D_96A.json   # Serialized Edimap (JSON)
//!     └── INVOIC-D_93A.yaml   # Serialized Edimap (YAML)
//! ```
//!
//! The manifest lists one entry per model with the message name and version
//! it is registered under. Entries are decoded by extension: `.json`, or
//! `.yaml`/`.yml`.

use std::fs::File;
use std::io::{BufReader, Cursor, Read, Seek, Write};
use std::path::Path;
use std::sync::Arc;

use indexmap::IndexMap;
use parking_lot::{Mutex, RwLock};
use rayon::prelude::*;
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use smol_str::SmolStr;
use tracing::debug;
use zip::write::SimpleFileOptions;
use zip::{ZipArchive, ZipWriter};

use super::{MappingRegistry, MessageKey};
use crate::model::Edimap;
use crate::parser::errors::{EdiError, Result};

/// Standard paths within a model archive.
pub mod paths {
    /// Manifest file location.
    pub const MANIFEST: &str = "META-INF/edimaps.json";
    /// Directory used by [`write_archive`](super::write_archive).
    pub const MODEL_DIR: &str = "edimaps/";
}

/// The archive manifest.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Manifest {
    pub models: Vec<ManifestEntry>,
}

/// One indexed model.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ManifestEntry {
    pub name: SmolStr,
    pub version: SmolStr,
    /// Path of the serialized model inside the archive.
    pub entry: String,
}

impl ManifestEntry {
    pub fn key(&self) -> MessageKey {
        MessageKey::new(self.name.clone(), self.version.clone())
    }
}

/// When archive entries are decoded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LoadMode {
    /// Decode every entry while building the registry.
    #[default]
    Eager,
    /// Decode entries on first request; the archive stays open until `close()`.
    Lazy,
}

trait ReadSeek: Read + Seek + Send {}

impl<T: Read + Seek + Send> ReadSeek for T {}

type Archive = ZipArchive<Box<dyn ReadSeek>>;

/// A registry backed by a zip archive.
pub struct ArchiveRegistry {
    entries: IndexMap<MessageKey, String>,
    cache: RwLock<FxHashMap<MessageKey, Arc<Edimap>>>,
    /// Open archive for lazy loading; `None` once closed or when loaded eagerly.
    archive: Mutex<Option<Archive>>,
}

impl ArchiveRegistry {
    /// Open the archive at `path`.
    pub fn open(path: impl AsRef<Path>, mode: LoadMode) -> Result<Self> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|e| {
            EdiError::archive(format!("Failed to open {}: {e}", path.display()))
        })?;
        Self::from_reader(Box::new(BufReader::new(file)), mode)
    }

    /// Use an archive held in memory.
    pub fn from_bytes(bytes: Vec<u8>, mode: LoadMode) -> Result<Self> {
        Self::from_reader(Box::new(Cursor::new(bytes)), mode)
    }

    fn from_reader(reader: Box<dyn ReadSeek>, mode: LoadMode) -> Result<Self> {
        let mut archive = ZipArchive::new(reader)
            .map_err(|e| EdiError::archive(format!("Failed to open archive: {e}")))?;
        let manifest: Manifest = {
            let bytes = read_entry(&mut archive, paths::MANIFEST)?;
            serde_json::from_slice(&bytes)
                .map_err(|e| EdiError::archive(format!("Invalid manifest: {e}")))?
        };

        let mut entries = IndexMap::new();
        for item in &manifest.models {
            if entries.insert(item.key(), item.entry.clone()).is_some() {
                return Err(EdiError::archive(format!(
                    "Manifest lists {} more than once",
                    item.key()
                )));
            }
        }

        let registry = Self {
            entries,
            cache: RwLock::new(FxHashMap::default()),
            archive: Mutex::new(None),
        };
        match mode {
            LoadMode::Eager => registry.load_all(&mut archive)?,
            LoadMode::Lazy => *registry.archive.lock() = Some(archive),
        }
        Ok(registry)
    }

    /// Read every entry, then decode them in parallel.
    fn load_all(&self, archive: &mut Archive) -> Result<()> {
        let raw: Vec<(MessageKey, &str, Vec<u8>)> = self
            .entries
            .iter()
            .map(|(key, entry)| -> Result<_> {
                Ok((key.clone(), entry.as_str(), read_entry(archive, entry)?))
            })
            .collect::<Result<_>>()?;

        let models: Vec<(MessageKey, Edimap)> = raw
            .par_iter()
            .map(|(key, entry, bytes)| -> Result<_> {
                Ok((key.clone(), decode_model(key, entry, bytes)?))
            })
            .collect::<Result<_>>()?;

        let mut cache = self.cache.write();
        for (key, model) in models {
            cache.insert(key, Arc::new(model));
        }
        debug!(count = cache.len(), "loaded archive models");
        Ok(())
    }

    /// Keys listed in the manifest, in manifest order.
    pub fn keys(&self) -> impl Iterator<Item = &MessageKey> {
        self.entries.keys()
    }

    /// Number of models decoded so far.
    pub fn loaded(&self) -> usize {
        self.cache.read().len()
    }
}

impl std::fmt::Debug for ArchiveRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ArchiveRegistry")
            .field("entries", &self.entries)
            .field("loaded", &self.loaded())
            .finish_non_exhaustive()
    }
}

impl MappingRegistry for ArchiveRegistry {
    fn resolve(&self, key: &MessageKey) -> Result<Arc<Edimap>> {
        if let Some(model) = self.cache.read().get(key) {
            return Ok(Arc::clone(model));
        }
        let Some(entry) = self.entries.get(key) else {
            return Err(EdiError::unresolved(key));
        };

        let mut archive = self.archive.lock();
        let Some(archive) = archive.as_mut() else {
            return Err(EdiError::unresolved(key));
        };
        if let Some(model) = self.cache.read().get(key) {
            return Ok(Arc::clone(model));
        }
        let bytes = read_entry(archive, entry)?;
        let model = Arc::new(decode_model(key, entry, &bytes)?);
        debug!(key = %key, entry = %entry, "loaded archive model");
        self.cache.write().insert(key.clone(), Arc::clone(&model));
        Ok(model)
    }

    fn close(&self) -> Result<()> {
        self.archive.lock().take();
        Ok(())
    }
}

fn read_entry(archive: &mut Archive, name: &str) -> Result<Vec<u8>> {
    let mut file = archive
        .by_name(name)
        .map_err(|e| EdiError::archive(format!("Failed to read {name}: {e}")))?;
    let mut bytes = Vec::new();
    file.read_to_end(&mut bytes)
        .map_err(|e| EdiError::archive(format!("Failed to read {name}: {e}")))?;
    Ok(bytes)
}

/// Deserialize and validate one model. Its description must match the manifest key.
fn decode_model(key: &MessageKey, entry: &str, bytes: &[u8]) -> Result<Edimap> {
    let lower = entry.to_ascii_lowercase();
    let model: Edimap = if lower.ends_with(".json") {
        serde_json::from_slice(bytes)
            .map_err(|e| EdiError::invalid_model(format!("{entry}: {e}")))?
    } else if lower.ends_with(".yaml") || lower.ends_with(".yml") {
        serde_yaml::from_slice(bytes)
            .map_err(|e| EdiError::invalid_model(format!("{entry}: {e}")))?
    } else {
        return Err(EdiError::archive(format!(
            "{entry}: unsupported model format"
        )));
    };
    if model.key() != *key {
        return Err(EdiError::invalid_model(format!(
            "{entry} describes {} but is listed as {key}",
            model.key()
        )));
    }
    model.validate()?;
    Ok(model)
}

// ============================================================================
// ARCHIVE WRITER
// ============================================================================

/// Serialize models as JSON into a new archive with a manifest.
pub fn write_archive(models: &[Edimap]) -> Result<Vec<u8>> {
    let mut buffer = Cursor::new(Vec::new());
    let mut zip = ZipWriter::new(&mut buffer);
    let options = SimpleFileOptions::default().compression_method(zip::CompressionMethod::Deflated);

    let mut manifest = Manifest::default();
    for model in models {
        let key = model.key();
        let entry = format!(
            "{}{}-{}.json",
            paths::MODEL_DIR,
            key.name,
            key.version.replace(':', "_")
        );
        let json = serde_json::to_vec_pretty(model)
            .map_err(|e| EdiError::archive(format!("Failed to serialize {key}: {e}")))?;
        zip.start_file(entry.as_str(), options)
            .map_err(|e| EdiError::archive(format!("Failed to create {entry}: {e}")))?;
        zip.write_all(&json)
            .map_err(|e| EdiError::archive(format!("Failed to write {entry}: {e}")))?;
        manifest.models.push(ManifestEntry {
            name: key.name,
            version: key.version,
            entry,
        });
    }

    let json = serde_json::to_vec_pretty(&manifest)
        .map_err(|e| EdiError::archive(format!("Failed to serialize manifest: {e}")))?;
    zip.start_file(paths::MANIFEST, options)
        .map_err(|e| EdiError::archive(format!("Failed to create manifest: {e}")))?;
    zip.write_all(&json)
        .map_err(|e| EdiError::archive(format!("Failed to write manifest: {e}")))?;
    zip.finish()
        .map_err(|e| EdiError::archive(format!("Failed to finalize archive: {e}")))?;

    Ok(buffer.into_inner())
}
