pub mod backup;
pub mod bouquet_store;
pub mod color_catalog;
pub mod flower_catalog;
pub mod orders;
pub mod pricing;

pub use bouquet_store::{BouquetStore, ExternalLink};
pub use color_catalog::ColorCatalog;
pub use flower_catalog::{FlowerCatalog, FlowerConfig};
pub use orders::Order;
pub use pricing::PricingTable;

use crate::utils::error::Result;
use std::fs;
use std::path::Path;

/// When a store persists its in-memory table back to the backing file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum WriteMode {
    /// Rewrite the backing file after every mutation. Matches the historical
    /// behavior and is the default.
    #[default]
    Eager,
    /// Mutations only mark the store dirty; callers persist with `flush()`.
    Manual,
}

/// Writes `data` to `path` through a temp sibling plus rename, so a crash
/// mid-write never truncates the previous version of the file.
pub(crate) fn atomic_write(path: &Path, data: &[u8]) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }
    let tmp = path.with_extension("csv.tmp");
    fs::write(&tmp, data)?;
    fs::rename(&tmp, path)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn atomic_write_replaces_previous_content() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("table.csv");
        atomic_write(&path, b"first").unwrap();
        atomic_write(&path, b"second").unwrap();
        assert_eq!(fs::read_to_string(&path).unwrap(), "second");
        // No temp sibling left behind.
        assert!(!path.with_extension("csv.tmp").exists());
    }
}
