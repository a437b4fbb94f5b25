use crate::utils::error::Result;
use chrono::Local;
use std::fs;
use std::path::{Path, PathBuf};

/// Data files covered by backup and remote sync.
pub const DATA_FILES: &[&str] = &[
    "Flowers.csv",
    "Colors.csv",
    "Bouquets.csv",
    "DefaultPricing.csv",
];

const BACKUP_DIR: &str = "backups";

/// Copies the data files into `backups/<YYYY-MM-DD_HH-MM-SS>/` under the
/// data dir. Files that do not exist yet are skipped. Returns the backup
/// directory path.
pub fn create_backup(data_dir: &Path) -> Result<PathBuf> {
    let stamp = Local::now().format("%Y-%m-%d_%H-%M-%S").to_string();
    let backup_dir = data_dir.join(BACKUP_DIR).join(&stamp);
    fs::create_dir_all(&backup_dir)?;

    for name in DATA_FILES {
        let src = data_dir.join(name);
        if src.exists() {
            fs::copy(&src, backup_dir.join(name))?;
        }
    }
    tracing::info!("backup created in {}", backup_dir.display());
    Ok(backup_dir)
}

/// Backup names under the data dir, newest first (the timestamp format sorts
/// lexicographically).
pub fn list_backups(data_dir: &Path) -> Result<Vec<String>> {
    let root = data_dir.join(BACKUP_DIR);
    if !root.exists() {
        return Ok(Vec::new());
    }
    let mut names = Vec::new();
    for entry in fs::read_dir(root)? {
        let entry = entry?;
        if entry.file_type()?.is_dir() {
            names.push(entry.file_name().to_string_lossy().into_owned());
        }
    }
    names.sort_by(|a, b| b.cmp(a));
    Ok(names)
}

/// Copies the files of `backups/<name>/` back over the live data files.
/// Current data is overwritten; files absent from the backup are left alone.
pub fn restore_backup(data_dir: &Path, name: &str) -> Result<()> {
    let backup_dir = data_dir.join(BACKUP_DIR).join(name);
    if !backup_dir.is_dir() {
        return Err(crate::utils::error::StoreError::validation(format!(
            "backup '{name}' not found"
        )));
    }
    for file in DATA_FILES {
        let src = backup_dir.join(file);
        if src.exists() {
            fs::copy(&src, data_dir.join(file))?;
        }
    }
    tracing::info!("restored backup '{}'", name);
    Ok(())
}
