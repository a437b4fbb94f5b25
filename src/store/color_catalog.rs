use crate::store::{atomic_write, WriteMode};
use crate::utils::error::{Result, StoreError};
use std::path::{Path, PathBuf};

const FILE_NAME: &str = "Colors.csv";
const LEGACY_FILE_NAME: &str = "Colors.json";

/// Global set of allowed color names, backed by `Colors.csv` (single
/// `Color` column). Insertion order is kept and persisted as-is.
#[derive(Debug)]
pub struct ColorCatalog {
    path: PathBuf,
    colors: Vec<String>,
    mode: WriteMode,
    dirty: bool,
}

impl ColorCatalog {
    /// Loads from `data_dir`: the CSV table first, else the legacy JSON list
    /// which is migrated and rewritten in CSV once.
    pub fn load(data_dir: &Path, mode: WriteMode) -> Result<Self> {
        let path = data_dir.join(FILE_NAME);
        let legacy_path = data_dir.join(LEGACY_FILE_NAME);

        let mut catalog = Self {
            path,
            colors: Vec::new(),
            mode,
            dirty: false,
        };

        if catalog.path.exists() {
            catalog.colors = read_table(&catalog.path)?;
        } else if legacy_path.exists() {
            catalog.colors = read_legacy(&legacy_path)?;
            tracing::info!(
                "migrated {} colors from legacy {}",
                catalog.colors.len(),
                LEGACY_FILE_NAME
            );
            catalog.flush()?;
        } else {
            catalog.flush()?;
        }
        Ok(catalog)
    }

    /// Adds a color. Duplicate add is a silent no-op; returns whether
    /// anything changed.
    pub fn add(&mut self, color: &str) -> Result<bool> {
        if self.colors.iter().any(|c| c == color) {
            return Ok(false);
        }
        self.colors.push(color.to_string());
        self.persist_after_mutation()?;
        Ok(true)
    }

    /// Removes a color. Absent color is a silent no-op; returns whether
    /// anything changed.
    pub fn remove(&mut self, color: &str) -> Result<bool> {
        let before = self.colors.len();
        self.colors.retain(|c| c != color);
        if self.colors.len() == before {
            return Ok(false);
        }
        self.persist_after_mutation()?;
        Ok(true)
    }

    pub fn contains(&self, color: &str) -> bool {
        self.colors.iter().any(|c| c == color)
    }

    pub fn colors(&self) -> &[String] {
        &self.colors
    }

    pub fn len(&self) -> usize {
        self.colors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.colors.is_empty()
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

    pub fn flush(&mut self) -> Result<()> {
        let mut writer = csv::Writer::from_writer(Vec::new());
        writer.write_record(["Color"])?;
        for color in &self.colors {
            writer.write_record([color.as_str()])?;
        }
        let data = writer
            .into_inner()
            .map_err(|e| StoreError::validation(format!("color table serialization: {e}")))?;
        atomic_write(&self.path, &data)?;
        self.dirty = false;
        Ok(())
    }
}

fn read_table(path: &Path) -> Result<Vec<String>> {
    let mut reader = csv::Reader::from_path(path)?;
    let headers = reader.headers()?.clone();
    let idx = headers.iter().position(|h| h == "Color").ok_or_else(|| {
        StoreError::validation(format!("missing column 'Color' in {}", path.display()))
    })?;

    let mut colors = Vec::new();
    for row in reader.records() {
        let row = row?;
        let color = row.get(idx).unwrap_or("").trim();
        if !color.is_empty() {
            colors.push(color.to_string());
        }
    }
    Ok(colors)
}

fn read_legacy(path: &Path) -> Result<Vec<String>> {
    let content = std::fs::read_to_string(path)?;
    let names: Vec<String> = serde_json::from_str(&content)?;
    Ok(names)
}
