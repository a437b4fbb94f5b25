use crate::store::{atomic_write, WriteMode};
use crate::utils::error::{Result, StoreError};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

const FILE_NAME: &str = "Flowers.csv";
const LEGACY_FILE_NAME: &str = "Flowers.json";

/// Per-flower configuration. An empty size list means the flower is valid in
/// every globally known size; a non-empty list is a restriction allow-list.
/// Colors are never restricted per flower, they come from the global
/// [`ColorCatalog`](crate::store::ColorCatalog).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FlowerConfig {
    pub sizes: Vec<String>,
}

/// Catalog of known flower type names, backed by `Flowers.csv`
/// (columns `Name,Sizes`, sizes comma-joined inside the field).
#[derive(Debug)]
pub struct FlowerCatalog {
    path: PathBuf,
    entries: BTreeMap<String, FlowerConfig>,
    mode: WriteMode,
    dirty: bool,
}

impl FlowerCatalog {
    /// Loads the catalog from `data_dir`, trying loaders in priority order:
    /// the current CSV table, then the legacy JSON file (either a bare list
    /// of names or a `name -> {colors, sizes}` map), which is migrated and
    /// rewritten in CSV exactly once. With neither present the catalog
    /// starts empty and writes the CSV header.
    pub fn load(data_dir: &Path, mode: WriteMode) -> Result<Self> {
        let path = data_dir.join(FILE_NAME);
        let legacy_path = data_dir.join(LEGACY_FILE_NAME);

        let mut catalog = Self {
            path,
            entries: BTreeMap::new(),
            mode,
            dirty: false,
        };

        if catalog.path.exists() {
            catalog.entries = read_table(&catalog.path)?;
        } else if legacy_path.exists() {
            catalog.entries = read_legacy(&legacy_path)?;
            tracing::info!(
                "migrated {} flower entries from legacy {}",
                catalog.entries.len(),
                LEGACY_FILE_NAME
            );
            catalog.flush()?;
        } else {
            catalog.flush()?;
        }
        Ok(catalog)
    }

    /// Adds a flower name with an open (empty) size config. A duplicate add
    /// is a silent no-op; the return value reports whether anything changed.
    pub fn add(&mut self, name: &str) -> Result<bool> {
        if self.entries.contains_key(name) {
            return Ok(false);
        }
        self.entries
            .insert(name.to_string(), FlowerConfig::default());
        self.persist_after_mutation()?;
        Ok(true)
    }

    /// Removes a flower name. Removing an absent name is a silent no-op; the
    /// return value reports whether anything changed.
    pub fn remove(&mut self, name: &str) -> Result<bool> {
        if self.entries.remove(name).is_none() {
            return Ok(false);
        }
        self.persist_after_mutation()?;
        Ok(true)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    /// Replaces the size allow-list for `name`. Silent no-op when the name
    /// is unknown.
    pub fn update_config(&mut self, name: &str, sizes: Vec<String>) -> Result<()> {
        if let Some(config) = self.entries.get_mut(name) {
            config.sizes = sizes;
            self.persist_after_mutation()?;
        }
        Ok(())
    }

    /// Returns the config for `name`, or the default open-policy config when
    /// the name is unknown. Never fails.
    pub fn get_config(&self, name: &str) -> FlowerConfig {
        self.entries.get(name).cloned().unwrap_or_default()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Whether unflushed mutations exist (always false in eager mode).
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    fn persist_after_mutation(&mut self) -> Result<()> {
        match self.mode {
            WriteMode::Eager => self.flush(),
            WriteMode::Manual => {
                self.dirty = true;
                Ok(())
            }
        }
    }

    /// Rewrites the whole backing file from the in-memory table.
    pub fn flush(&mut self) -> Result<()> {
        let mut writer = csv::Writer::from_writer(Vec::new());
        writer.write_record(["Name", "Sizes"])?;
        for (name, config) in &self.entries {
            let sizes = config.sizes.join(",");
            writer.write_record([name.as_str(), sizes.as_str()])?;
        }
        let data = writer
            .into_inner()
            .map_err(|e| StoreError::validation(format!("flower table serialization: {e}")))?;
        atomic_write(&self.path, &data)?;
        self.dirty = false;
        Ok(())
    }
}

fn read_table(path: &Path) -> Result<BTreeMap<String, FlowerConfig>> {
    let mut reader = csv::Reader::from_path(path)?;
    let headers = reader.headers()?.clone();
    let name_idx = column_index(&headers, "Name", path)?;
    let sizes_idx = column_index(&headers, "Sizes", path)?;

    let mut entries = BTreeMap::new();
    for row in reader.records() {
        let row = row?;
        let name = row.get(name_idx).unwrap_or("").trim();
        if name.is_empty() {
            continue;
        }
        let sizes = row
            .get(sizes_idx)
            .unwrap_or("")
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(String::from)
            .collect();
        entries.insert(name.to_string(), FlowerConfig { sizes });
    }
    Ok(entries)
}

/// Legacy `Flowers.json` was first a bare list of names, later a
/// `name -> {colors, sizes}` map. Both migrate; per-flower colors were
/// abandoned in favor of the global color catalog and are dropped.
fn read_legacy(path: &Path) -> Result<BTreeMap<String, FlowerConfig>> {
    let content = std::fs::read_to_string(path)?;
    let value: serde_json::Value = serde_json::from_str(&content)?;

    let mut entries = BTreeMap::new();
    match value {
        serde_json::Value::Array(names) => {
            for name in names {
                if let Some(name) = name.as_str() {
                    entries.insert(name.to_string(), FlowerConfig::default());
                }
            }
        }
        serde_json::Value::Object(map) => {
            for (name, config) in map {
                let sizes = config
                    .get("sizes")
                    .and_then(|v| v.as_array())
                    .map(|sizes| {
                        sizes
                            .iter()
                            .filter_map(|s| s.as_str())
                            .map(String::from)
                            .collect()
                    })
                    .unwrap_or_default();
                entries.insert(name, FlowerConfig { sizes });
            }
        }
        _ => {
            return Err(StoreError::validation(format!(
                "unexpected legacy flower catalog shape in {}",
                path.display()
            )))
        }
    }
    Ok(entries)
}

fn column_index(headers: &csv::StringRecord, name: &str, path: &Path) -> Result<usize> {
    headers
        .iter()
        .position(|h| h == name)
        .ok_or_else(|| {
            StoreError::validation(format!("missing column '{}' in {}", name, path.display()))
        })
}
