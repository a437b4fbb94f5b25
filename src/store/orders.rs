use crate::domain::FlowerRecord;
use crate::store::{atomic_write, BouquetStore, PricingTable};
use crate::utils::error::{EntryKind, Result, StoreError};
use chrono::Local;
use std::collections::HashMap;
use std::path::{Path, PathBuf};

/// A customer order: an ordered list of (bouquet name, quantity) lines.
/// Adding a bouquet that is already on the order accumulates its quantity.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Order {
    lines: Vec<(String, u32)>,
}

impl Order {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, bouquet_name: &str, quantity: u32) {
        if let Some(line) = self.lines.iter_mut().find(|(n, _)| n == bouquet_name) {
            line.1 += quantity;
        } else {
            self.lines.push((bouquet_name.to_string(), quantity));
        }
    }

    pub fn remove(&mut self, bouquet_name: &str) -> Result<()> {
        let before = self.lines.len();
        self.lines.retain(|(n, _)| n != bouquet_name);
        if self.lines.len() == before {
            return Err(StoreError::not_found(EntryKind::Order, bouquet_name));
        }
        Ok(())
    }

    pub fn set_quantity(&mut self, bouquet_name: &str, quantity: u32) -> Result<()> {
        let line = self
            .lines
            .iter_mut()
            .find(|(n, _)| n == bouquet_name)
            .ok_or_else(|| StoreError::not_found(EntryKind::Order, bouquet_name))?;
        line.1 = quantity;
        Ok(())
    }

    pub fn lines(&self) -> &[(String, u32)] {
        &self.lines
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Total per-record flower counts across the order (bouquet counts times
    /// order quantity), sorted by record for the report, plus the grand
    /// total. Bouquets missing from the store are logged and skipped so one
    /// stale line does not sink the whole report.
    pub fn quantities(&self, store: &BouquetStore) -> (Vec<(FlowerRecord, u32)>, u32) {
        let mut totals: HashMap<FlowerRecord, u32> = HashMap::new();
        let mut grand_total = 0u32;

        for (name, quantity) in &self.lines {
            let bouquet = match store.open(name) {
                Ok(b) => b,
                Err(e) => {
                    tracing::warn!("skipping order line '{}': {}", name, e);
                    continue;
                }
            };
            for (record, count) in bouquet.flower_count() {
                let total = count * quantity;
                *totals.entry(record).or_default() += total;
                grand_total += total;
            }
        }

        let mut sorted: Vec<(FlowerRecord, u32)> = totals.into_iter().collect();
        sorted.sort_by(|a, b| a.0.cmp(&b.0));
        (sorted, grand_total)
    }
}

/// Default order file stem, the order's date as `DD_MM_YYYY`.
pub fn default_stem() -> String {
    Local::now().format("%d_%m_%Y").to_string()
}

/// Saves the order under `orders_dir/<stem>.csv` and writes the two derived
/// read-only reports next to it: `<stem>_quantities.csv` (flower totals) and
/// `<stem>_pricing.csv` (per-line pricing plus a grand-total row), both
/// computed from the current store and pricing data at save time. Returns
/// the order file path.
pub fn save_order(
    orders_dir: &Path,
    stem: &str,
    order: &Order,
    store: &BouquetStore,
    pricing: &PricingTable,
) -> Result<PathBuf> {
    let order_path = orders_dir.join(format!("{stem}.csv"));

    let mut writer = csv::Writer::from_writer(Vec::new());
    writer.write_record(["Bouquet Name", "Quantity"])?;
    for (name, quantity) in order.lines() {
        let quantity = quantity.to_string();
        writer.write_record([name.as_str(), quantity.as_str()])?;
    }
    atomic_write(&order_path, &into_bytes(writer)?)?;

    let (quantities, _) = order.quantities(store);
    let mut writer = csv::Writer::from_writer(Vec::new());
    writer.write_record(["Flower Name", "Color", "Size", "Count"])?;
    for (record, count) in quantities {
        let count = count.to_string();
        writer.write_record([
            record.name.as_str(),
            record.color.as_str(),
            record.size.as_str(),
            count.as_str(),
        ])?;
    }
    atomic_write(
        &orders_dir.join(format!("{stem}_quantities.csv")),
        &into_bytes(writer)?,
    )?;

    let mut writer = csv::Writer::from_writer(Vec::new());
    writer.write_record(["Bouquet Name", "Quantity", "Unit Price", "Total"])?;
    let mut grand_total = 0.0;
    for (name, quantity) in order.lines() {
        let unit_price = match store.open(name) {
            Ok(bouquet) => pricing.bouquet_price(&bouquet),
            Err(e) => {
                tracing::warn!("no pricing for order line '{}': {}", name, e);
                0.0
            }
        };
        let total = unit_price * f64::from(*quantity);
        grand_total += total;
        let quantity = quantity.to_string();
        let unit_price = format!("{unit_price:.2}");
        let total = format!("{total:.2}");
        writer.write_record([
            name.as_str(),
            quantity.as_str(),
            unit_price.as_str(),
            total.as_str(),
        ])?;
    }
    let grand_total = format!("{grand_total:.2}");
    writer.write_record(["Total", "", "", grand_total.as_str()])?;
    atomic_write(
        &orders_dir.join(format!("{stem}_pricing.csv")),
        &into_bytes(writer)?,
    )?;

    tracing::info!("order '{}' saved to {}", stem, order_path.display());
    Ok(order_path)
}

/// Loads `orders_dir/<stem>.csv`. Only the order table is read back; the
/// report files are derived output, never input.
pub fn load_order(orders_dir: &Path, stem: &str) -> Result<Order> {
    let path = orders_dir.join(format!("{stem}.csv"));
    if !path.exists() {
        return Err(StoreError::not_found(EntryKind::Order, stem));
    }
    let mut reader = csv::Reader::from_path(&path)?;
    let headers = reader.headers()?.clone();
    let name_idx = headers
        .iter()
        .position(|h| h == "Bouquet Name")
        .ok_or_else(|| {
            StoreError::validation(format!("missing column 'Bouquet Name' in {}", path.display()))
        })?;
    let qty_idx = headers
        .iter()
        .position(|h| h == "Quantity")
        .ok_or_else(|| {
            StoreError::validation(format!("missing column 'Quantity' in {}", path.display()))
        })?;

    let mut order = Order::new();
    for row in reader.records() {
        let row = row?;
        let name = row.get(name_idx).unwrap_or("").trim();
        if name.is_empty() {
            continue;
        }
        let raw_qty = row.get(qty_idx).unwrap_or("").trim();
        let quantity: u32 = raw_qty.parse().map_err(|_| {
            StoreError::validation(format!(
                "bad Quantity value '{}' in {}",
                raw_qty,
                path.display()
            ))
        })?;
        order.add(name, quantity);
    }
    Ok(order)
}

/// Order stems in `orders_dir`, newest first by modification time. Report
/// files are excluded.
pub fn list_orders(orders_dir: &Path) -> Result<Vec<String>> {
    if !orders_dir.exists() {
        return Ok(Vec::new());
    }
    let mut stems: Vec<(String, std::time::SystemTime)> = Vec::new();
    for entry in std::fs::read_dir(orders_dir)? {
        let entry = entry?;
        let name = entry.file_name().to_string_lossy().into_owned();
        let Some(stem) = name.strip_suffix(".csv") else {
            continue;
        };
        if stem.ends_with("_quantities") || stem.ends_with("_pricing") {
            continue;
        }
        let modified = entry.metadata()?.modified()?;
        stems.push((stem.to_string(), modified));
    }
    stems.sort_by(|a, b| b.1.cmp(&a.1));
    Ok(stems.into_iter().map(|(stem, _)| stem).collect())
}

fn into_bytes(writer: csv::Writer<Vec<u8>>) -> Result<Vec<u8>> {
    writer
        .into_inner()
        .map_err(|e| StoreError::validation(format!("order serialization: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::WriteMode;
    use tempfile::TempDir;

    fn store_with_bouquets(dir: &Path) -> BouquetStore {
        let mut store = BouquetStore::load(dir, WriteMode::Eager).unwrap();
        let mut spring = store.create("Spring").unwrap();
        spring.select_flower(FlowerRecord::new("Rose", "Red", "Medium"), 3);
        spring.select_flower(FlowerRecord::new("Lily", "White", "Small"), 1);
        store.save(&spring).unwrap();
        let mut summer = store.create("Summer").unwrap();
        summer.select_flower(FlowerRecord::new("Rose", "Red", "Medium"), 1);
        store.save(&summer).unwrap();
        store
    }

    #[test]
    fn add_accumulates_quantity() {
        let mut order = Order::new();
        order.add("Spring", 2);
        order.add("Spring", 3);
        assert_eq!(order.lines(), [("Spring".to_string(), 5)]);
    }

    #[test]
    fn quantities_scale_by_order_quantity() {
        let dir = TempDir::new().unwrap();
        let store = store_with_bouquets(dir.path());

        let mut order = Order::new();
        order.add("Spring", 2);
        order.add("Summer", 1);
        let (totals, grand_total) = order.quantities(&store);

        // Sorted by name: Lily before Rose.
        assert_eq!(totals[0].0.name, "Lily");
        assert_eq!(totals[0].1, 2);
        assert_eq!(totals[1].0.name, "Rose");
        assert_eq!(totals[1].1, 7);
        assert_eq!(grand_total, 9);
    }

    #[test]
    fn missing_bouquet_line_is_skipped() {
        let dir = TempDir::new().unwrap();
        let store = store_with_bouquets(dir.path());

        let mut order = Order::new();
        order.add("Gone", 5);
        order.add("Summer", 1);
        let (totals, grand_total) = order.quantities(&store);
        assert_eq!(grand_total, 1);
        assert_eq!(totals.len(), 1);
    }

    #[test]
    fn save_writes_order_and_reports() {
        let dir = TempDir::new().unwrap();
        let store = store_with_bouquets(dir.path());
        let mut pricing = PricingTable::load(dir.path(), WriteMode::Eager).unwrap();
        pricing.set_price("Rose", "Medium", 10.0).unwrap();
        pricing.set_price("Lily", "Small", 4.0).unwrap();

        let orders_dir = dir.path().join("orders");
        let mut order = Order::new();
        order.add("Spring", 2);

        save_order(&orders_dir, "01_06_2026", &order, &store, &pricing).unwrap();
        assert!(orders_dir.join("01_06_2026.csv").exists());
        assert!(orders_dir.join("01_06_2026_quantities.csv").exists());

        let pricing_report =
            std::fs::read_to_string(orders_dir.join("01_06_2026_pricing.csv")).unwrap();
        // Spring = 3x10 + 1x4 = 34 per unit, two units.
        assert!(pricing_report.contains("Spring,2,34.00,68.00"));
        assert!(pricing_report.contains("Total,,,68.00"));
    }

    #[test]
    fn order_roundtrip() {
        let dir = TempDir::new().unwrap();
        let store = store_with_bouquets(dir.path());
        let pricing = PricingTable::load(dir.path(), WriteMode::Eager).unwrap();
        let orders_dir = dir.path().join("orders");

        let mut order = Order::new();
        order.add("Spring", 2);
        order.add("Summer", 1);
        save_order(&orders_dir, "02_06_2026", &order, &store, &pricing).unwrap();

        let loaded = load_order(&orders_dir, "02_06_2026").unwrap();
        assert_eq!(loaded, order);
    }

    #[test]
    fn list_orders_skips_reports() {
        let dir = TempDir::new().unwrap();
        let store = store_with_bouquets(dir.path());
        let pricing = PricingTable::load(dir.path(), WriteMode::Eager).unwrap();
        let orders_dir = dir.path().join("orders");

        let mut order = Order::new();
        order.add("Spring", 1);
        save_order(&orders_dir, "03_06_2026", &order, &store, &pricing).unwrap();

        let stems = list_orders(&orders_dir).unwrap();
        assert_eq!(stems, ["03_06_2026"]);
    }

    #[test]
    fn load_missing_order_is_not_found() {
        let dir = TempDir::new().unwrap();
        let err = load_order(dir.path(), "nope").unwrap_err();
        assert!(err.is_not_found());
    }
}
