use crate::domain::{Bouquet, FlowerRecord};
use crate::store::{atomic_write, WriteMode};
use crate::utils::error::{Result, StoreError};
use chrono::Local;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

const FILE_NAME: &str = "DefaultPricing.csv";

/// Default per-flower pricing, keyed by (flower name, size) — color does not
/// affect price. Backed by `DefaultPricing.csv`; `snapshot` writes dated
/// copies next to it.
#[derive(Debug)]
pub struct PricingTable {
    path: PathBuf,
    prices: BTreeMap<(String, String), f64>,
    mode: WriteMode,
    dirty: bool,
}

impl PricingTable {
    pub fn load(data_dir: &Path, mode: WriteMode) -> Result<Self> {
        let path = data_dir.join(FILE_NAME);
        let mut table = Self {
            path,
            prices: BTreeMap::new(),
            mode,
            dirty: false,
        };
        if table.path.exists() {
            table.prices = read_table(&table.path)?;
        } else {
            table.flush()?;
        }
        Ok(table)
    }

    pub fn set_price(&mut self, flower_name: &str, size: &str, price: f64) -> Result<()> {
        self.prices
            .insert((flower_name.to_string(), size.to_string()), price);
        self.persist_after_mutation()
    }

    /// Price for one record. Unpriced records fall back to 0.0 with a
    /// warning so a partially filled table still produces a report.
    pub fn price_for(&self, record: &FlowerRecord) -> f64 {
        match self
            .prices
            .get(&(record.name.clone(), record.size.clone()))
        {
            Some(price) => *price,
            None => {
                tracing::warn!("no price for '{} / {}', using 0.0", record.name, record.size);
                0.0
            }
        }
    }

    /// Sum of record prices times counts for one bouquet.
    pub fn bouquet_price(&self, bouquet: &Bouquet) -> f64 {
        bouquet
            .flower_count()
            .iter()
            .map(|(record, count)| self.price_for(record) * f64::from(*count))
            .sum()
    }

    pub fn len(&self) -> usize {
        self.prices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.prices.is_empty()
    }

    /// Whether unflushed mutations exist (always false in eager mode).
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Writes a dated copy (`DefaultPricing_<YYYY-MM-DD_HH-MM-SS>.csv`) next
    /// to the main table and returns its path.
    pub fn snapshot(&self) -> Result<PathBuf> {
        let stamp = Local::now().format("%Y-%m-%d_%H-%M-%S");
        let path = self
            .path
            .with_file_name(format!("DefaultPricing_{stamp}.csv"));
        atomic_write(&path, &self.serialize()?)?;
        tracing::info!("pricing snapshot written to {}", path.display());
        Ok(path)
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
        let data = self.serialize()?;
        atomic_write(&self.path, &data)?;
        self.dirty = false;
        Ok(())
    }

    fn serialize(&self) -> Result<Vec<u8>> {
        let mut writer = csv::Writer::from_writer(Vec::new());
        writer.write_record(["Flower Name", "Size", "Price"])?;
        for ((name, size), price) in &self.prices {
            let price = price.to_string();
            writer.write_record([name.as_str(), size.as_str(), price.as_str()])?;
        }
        writer
            .into_inner()
            .map_err(|e| StoreError::validation(format!("pricing table serialization: {e}")))
    }
}

fn read_table(path: &Path) -> Result<BTreeMap<(String, String), f64>> {
    let mut reader = csv::Reader::from_path(path)?;
    let headers = reader.headers()?.clone();
    let col = |name: &str| -> Result<usize> {
        headers.iter().position(|h| h == name).ok_or_else(|| {
            StoreError::validation(format!("missing column '{}' in {}", name, path.display()))
        })
    };
    let name_idx = col("Flower Name")?;
    let size_idx = col("Size")?;
    let price_idx = col("Price")?;

    let mut prices = BTreeMap::new();
    for row in reader.records() {
        let row = row?;
        let get = |idx: usize| row.get(idx).unwrap_or("").trim().to_string();
        let name = get(name_idx);
        if name.is_empty() {
            continue;
        }
        let raw_price = get(price_idx);
        let price: f64 = raw_price.parse().map_err(|_| {
            StoreError::validation(format!(
                "bad Price value '{}' for '{}' in {}",
                raw_price,
                name,
                path.display()
            ))
        })?;
        prices.insert((name, get(size_idx)), price);
    }
    Ok(prices)
}
