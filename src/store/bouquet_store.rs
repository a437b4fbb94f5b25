use crate::domain::{Bouquet, FlowerRecord};
use crate::store::{atomic_write, WriteMode};
use crate::utils::error::{EntryKind, Result, StoreError};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

const FILE_NAME: &str = "Bouquets.csv";
const LEGACY_FILE_NAME: &str = "Bouquets.json";

/// Identifiers tying a local bouquet to a record in the external store
/// catalog. Carried forward across unrelated saves; only the explicit
/// setters below change them.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExternalLink {
    pub wix_id: Option<String>,
    pub wix_category: Option<String>,
}

#[derive(Debug, Clone, Default)]
struct Entry {
    flowers: Vec<FlowerRecord>,
    link: ExternalLink,
}

/// The table of all bouquets, backed by `Bouquets.csv`. Rows are the compact
/// `name/flower/color/size/count` layout plus the optional `Wix ID` and
/// `Wix Category` columns; loading expands rows into flat multisets, saving
/// collapses each multiset back to one row per distinct record.
#[derive(Debug)]
pub struct BouquetStore {
    path: PathBuf,
    entries: BTreeMap<String, Entry>,
    mode: WriteMode,
    dirty: bool,
}

impl BouquetStore {
    /// Loads from `data_dir`: the CSV table first, else the legacy JSON map
    /// (`name -> [[flower, color, size], ...]`), migrated and rewritten in
    /// CSV once. With neither present the store starts empty.
    pub fn load(data_dir: &Path, mode: WriteMode) -> Result<Self> {
        let path = data_dir.join(FILE_NAME);
        let legacy_path = data_dir.join(LEGACY_FILE_NAME);

        let mut store = Self {
            path,
            entries: BTreeMap::new(),
            mode,
            dirty: false,
        };

        if store.path.exists() {
            store.entries = read_table(&store.path)?;
        } else if legacy_path.exists() {
            store.entries = read_legacy(&legacy_path)?;
            tracing::info!(
                "migrated {} bouquets from legacy {}",
                store.entries.len(),
                LEGACY_FILE_NAME
            );
            store.flush()?;
        } else {
            store.flush()?;
        }
        Ok(store)
    }

    /// Starts a brand-new bouquet. Fails with Conflict when the name is
    /// already stored; nothing is persisted until `save`.
    pub fn create(&self, name: &str) -> Result<Bouquet> {
        if self.entries.contains_key(name) {
            return Err(StoreError::conflict(EntryKind::Bouquet, name));
        }
        Ok(Bouquet::new(name))
    }

    /// Starts a bouquet copied from `base`, named to encode its lineage
    /// (`"{name} (based on {base})"`). Fails with NotFound when the base is
    /// absent, Conflict when the derived name is already stored.
    pub fn create_based_on(&self, name: &str, base: &str) -> Result<Bouquet> {
        let base_entry = self
            .entries
            .get(base)
            .ok_or_else(|| StoreError::not_found(EntryKind::Bouquet, base))?;
        let derived = format!("{name} (based on {base})");
        if self.entries.contains_key(&derived) {
            return Err(StoreError::conflict(EntryKind::Bouquet, derived));
        }
        Ok(Bouquet::with_flowers(derived, base_entry.flowers.clone()))
    }

    /// Loads an existing bouquet's current composition for editing.
    pub fn open(&self, name: &str) -> Result<Bouquet> {
        let entry = self
            .entries
            .get(name)
            .ok_or_else(|| StoreError::not_found(EntryKind::Bouquet, name))?;
        Ok(Bouquet::with_flowers(name, entry.flowers.clone()))
    }

    /// Writes the bouquet's composition into the store, fully replacing what
    /// was previously held under its name. External-link metadata already
    /// attached to the name is preserved untouched.
    pub fn save(&mut self, bouquet: &Bouquet) -> Result<()> {
        let entry = self.entries.entry(bouquet.name().to_string()).or_default();
        entry.flowers = bouquet.flowers().to_vec();
        self.persist_after_mutation()
    }

    pub fn delete(&mut self, name: &str) -> Result<()> {
        if self.entries.remove(name).is_none() {
            return Err(StoreError::not_found(EntryKind::Bouquet, name));
        }
        self.persist_after_mutation()
    }

    /// Moves the entry under `old` to `new`, multiset and metadata intact.
    /// Fails with NotFound when `old` is absent, Conflict when `new` already
    /// exists; both leave the store unchanged.
    pub fn rename(&mut self, old: &str, new: &str) -> Result<()> {
        if self.entries.contains_key(new) {
            return Err(StoreError::conflict(EntryKind::Bouquet, new));
        }
        let entry = self
            .entries
            .remove(old)
            .ok_or_else(|| StoreError::not_found(EntryKind::Bouquet, old))?;
        self.entries.insert(new.to_string(), entry);
        self.persist_after_mutation()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    pub fn names(&self) -> Vec<String> {
        self.entries.keys().cloned().collect()
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

    pub fn external_link(&self, name: &str) -> Option<&ExternalLink> {
        self.entries.get(name).map(|e| &e.link)
    }

    /// Binds `id` to `name`, enforcing at-most-one-bouquet-per-external-id:
    /// any other bouquet currently holding `id` has it cleared as a side
    /// effect, so the reverse mapping reflects only this association.
    pub fn set_external_id(&mut self, name: &str, id: &str) -> Result<()> {
        if !self.entries.contains_key(name) {
            return Err(StoreError::not_found(EntryKind::Bouquet, name));
        }
        for (other, entry) in self.entries.iter_mut() {
            if other != name && entry.link.wix_id.as_deref() == Some(id) {
                tracing::debug!("external id '{}' moved from '{}' to '{}'", id, other, name);
                entry.link.wix_id = None;
            }
        }
        // Checked above; unwrap-free lookup for the borrow checker's sake.
        if let Some(entry) = self.entries.get_mut(name) {
            entry.link.wix_id = Some(id.to_string());
        }
        self.persist_after_mutation()
    }

    pub fn clear_external_id(&mut self, name: &str) -> Result<()> {
        let entry = self
            .entries
            .get_mut(name)
            .ok_or_else(|| StoreError::not_found(EntryKind::Bouquet, name))?;
        entry.link.wix_id = None;
        self.persist_after_mutation()
    }

    pub fn set_external_category(&mut self, name: &str, category: &str) -> Result<()> {
        let entry = self
            .entries
            .get_mut(name)
            .ok_or_else(|| StoreError::not_found(EntryKind::Bouquet, name))?;
        entry.link.wix_category = Some(category.to_string());
        self.persist_after_mutation()
    }

    /// Reverse lookup over the external-id mapping.
    pub fn bouquet_by_external_id(&self, id: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(_, e)| e.link.wix_id.as_deref() == Some(id))
            .map(|(name, _)| name.as_str())
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

    /// Rewrites the whole table: one counted row per distinct record of each
    /// bouquet, metadata columns repeated on every row of that bouquet, and
    /// a single placeholder row (empty flower fields, count 0) for an empty
    /// bouquet so its existence round-trips.
    pub fn flush(&mut self) -> Result<()> {
        let mut writer = csv::Writer::from_writer(Vec::new());
        writer.write_record([
            "Bouquet Name",
            "Flower Name",
            "Color",
            "Size",
            "Count",
            "Wix ID",
            "Wix Category",
        ])?;

        for (name, entry) in &self.entries {
            let wix_id = entry.link.wix_id.as_deref().unwrap_or("");
            let wix_category = entry.link.wix_category.as_deref().unwrap_or("");

            let counts = Bouquet::with_flowers(name, entry.flowers.clone()).sorted_counts();
            if counts.is_empty() {
                writer.write_record([name.as_str(), "", "", "", "0", wix_id, wix_category])?;
                continue;
            }
            for (record, count) in counts {
                let count = count.to_string();
                writer.write_record([
                    name.as_str(),
                    record.name.as_str(),
                    record.color.as_str(),
                    record.size.as_str(),
                    count.as_str(),
                    wix_id,
                    wix_category,
                ])?;
            }
        }

        let data = writer
            .into_inner()
            .map_err(|e| StoreError::validation(format!("bouquet table serialization: {e}")))?;
        atomic_write(&self.path, &data)?;
        self.dirty = false;
        Ok(())
    }
}

fn read_table(path: &Path) -> Result<BTreeMap<String, Entry>> {
    let mut reader = csv::Reader::from_path(path)?;
    let headers = reader.headers()?.clone();

    let col = |name: &str| -> Result<usize> {
        headers.iter().position(|h| h == name).ok_or_else(|| {
            StoreError::validation(format!("missing column '{}' in {}", name, path.display()))
        })
    };
    let bouquet_idx = col("Bouquet Name")?;
    let flower_idx = col("Flower Name")?;
    let color_idx = col("Color")?;
    let size_idx = col("Size")?;
    let count_idx = col("Count")?;
    // Link columns are optional; files written before the store-link feature
    // simply do not have them.
    let wix_id_idx = headers.iter().position(|h| h == "Wix ID");
    let wix_category_idx = headers.iter().position(|h| h == "Wix Category");

    let mut entries: BTreeMap<String, Entry> = BTreeMap::new();
    for row in reader.records() {
        let row = row?;
        let get = |idx: usize| row.get(idx).unwrap_or("").trim();

        let bouquet_name = get(bouquet_idx);
        if bouquet_name.is_empty() {
            continue;
        }
        let entry = entries.entry(bouquet_name.to_string()).or_default();

        if let Some(idx) = wix_id_idx {
            let id = get(idx);
            if !id.is_empty() {
                entry.link.wix_id = Some(id.to_string());
            }
        }
        if let Some(idx) = wix_category_idx {
            let category = get(idx);
            if !category.is_empty() {
                entry.link.wix_category = Some(category.to_string());
            }
        }

        let flower_name = get(flower_idx);
        if flower_name.is_empty() {
            // Placeholder row for an empty bouquet.
            continue;
        }
        let count: u32 = get(count_idx).parse().map_err(|_| {
            StoreError::validation(format!(
                "bad Count value '{}' for bouquet '{}' in {}",
                get(count_idx),
                bouquet_name,
                path.display()
            ))
        })?;
        let record = FlowerRecord::new(flower_name, get(color_idx), get(size_idx));
        // Redundant duplicate rows for the same record simply accumulate.
        for _ in 0..count {
            entry.flowers.push(record.clone());
        }
    }
    Ok(entries)
}

/// Legacy `Bouquets.json`: `name -> [[flower, color, size], ...]`, one array
/// element per physical flower (no count field).
fn read_legacy(path: &Path) -> Result<BTreeMap<String, Entry>> {
    let content = std::fs::read_to_string(path)?;
    let map: BTreeMap<String, Vec<Vec<String>>> = serde_json::from_str(&content)?;

    let mut entries = BTreeMap::new();
    for (name, triples) in map {
        let mut entry = Entry::default();
        for triple in triples {
            if triple.len() != 3 {
                return Err(StoreError::validation(format!(
                    "bad flower triple for bouquet '{}' in {}",
                    name,
                    path.display()
                )));
            }
            entry.flowers.push(FlowerRecord::new(
                triple[0].clone(),
                triple[1].clone(),
                triple[2].clone(),
            ));
        }
        entries.insert(name, entry);
    }
    Ok(entries)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn rose() -> FlowerRecord {
        FlowerRecord::new("Rose", "Red", "Medium")
    }

    #[test]
    fn create_conflicts_with_saved_name() {
        let dir = TempDir::new().unwrap();
        let mut store = BouquetStore::load(dir.path(), WriteMode::Eager).unwrap();
        let spring = store.create("Spring").unwrap();
        store.save(&spring).unwrap();

        let err = store.create("Spring").unwrap_err();
        assert!(err.is_conflict());
        // load-existing still succeeds.
        assert!(store.open("Spring").is_ok());
    }

    #[test]
    fn based_on_copies_and_encodes_lineage() {
        let dir = TempDir::new().unwrap();
        let mut store = BouquetStore::load(dir.path(), WriteMode::Eager).unwrap();
        let mut spring = store.create("Spring").unwrap();
        spring.select_flower(rose(), 3);
        store.save(&spring).unwrap();

        let copy = store.create_based_on("Deluxe", "Spring").unwrap();
        assert_eq!(copy.name(), "Deluxe (based on Spring)");
        assert_eq!(copy.flower_count()[&rose()], 3);

        assert!(store.create_based_on("X", "Missing").unwrap_err().is_not_found());
    }

    #[test]
    fn rename_semantics() {
        let dir = TempDir::new().unwrap();
        let mut store = BouquetStore::load(dir.path(), WriteMode::Eager).unwrap();
        let mut a = store.create("A").unwrap();
        a.select_flower(rose(), 2);
        store.save(&a).unwrap();
        let b = store.create("B").unwrap();
        store.save(&b).unwrap();

        // Conflict leaves both untouched.
        assert!(store.rename("A", "B").unwrap_err().is_conflict());
        assert!(store.contains("A") && store.contains("B"));

        store.rename("A", "C").unwrap();
        assert!(!store.contains("A"));
        assert_eq!(store.open("C").unwrap().flower_count()[&rose()], 2);

        assert!(store.rename("Missing", "D").unwrap_err().is_not_found());
    }

    #[test]
    fn roundtrip_preserves_counts() {
        let dir = TempDir::new().unwrap();
        {
            let mut store = BouquetStore::load(dir.path(), WriteMode::Eager).unwrap();
            let mut spring = store.create("Spring").unwrap();
            spring.select_flower(rose(), 3);
            spring.select_flower(FlowerRecord::new("Lily", "White", "Small"), 2);
            store.save(&spring).unwrap();
            let empty = store.create("Empty").unwrap();
            store.save(&empty).unwrap();
        }
        let store = BouquetStore::load(dir.path(), WriteMode::Eager).unwrap();
        assert_eq!(store.len(), 2);
        let spring = store.open("Spring").unwrap();
        assert_eq!(spring.flower_count()[&rose()], 3);
        // Empty bouquet existence round-trips through its placeholder row.
        let empty = store.open("Empty").unwrap();
        assert!(empty.is_empty());
    }

    #[test]
    fn redundant_rows_collapse_on_load() {
        let dir = TempDir::new().unwrap();
        std::fs::write(
            dir.path().join("Bouquets.csv"),
            "Bouquet Name,Flower Name,Color,Size,Count\n\
             Spring,Rose,Red,Medium,2\n\
             Spring,Rose,Red,Medium,1\n",
        )
        .unwrap();
        let store = BouquetStore::load(dir.path(), WriteMode::Eager).unwrap();
        assert_eq!(store.open("Spring").unwrap().flower_count()[&rose()], 3);
    }

    #[test]
    fn save_preserves_unowned_metadata() {
        let dir = TempDir::new().unwrap();
        let mut store = BouquetStore::load(dir.path(), WriteMode::Eager).unwrap();
        let mut spring = store.create("Spring").unwrap();
        spring.select_flower(rose(), 1);
        store.save(&spring).unwrap();
        store.set_external_id("Spring", "123").unwrap();
        store.set_external_category("Spring", "Bouquets").unwrap();

        // Saving new contents must not clobber the link metadata.
        spring.select_flower(rose(), 4);
        store.save(&spring).unwrap();
        let link = store.external_link("Spring").unwrap();
        assert_eq!(link.wix_id.as_deref(), Some("123"));
        assert_eq!(link.wix_category.as_deref(), Some("Bouquets"));

        // And the metadata survives the file round-trip.
        let store = BouquetStore::load(dir.path(), WriteMode::Eager).unwrap();
        let link = store.external_link("Spring").unwrap();
        assert_eq!(link.wix_id.as_deref(), Some("123"));
    }

    #[test]
    fn external_id_is_unique_across_bouquets() {
        let dir = TempDir::new().unwrap();
        let mut store = BouquetStore::load(dir.path(), WriteMode::Eager).unwrap();
        for name in ["Spring", "Summer"] {
            let b = store.create(name).unwrap();
            store.save(&b).unwrap();
        }
        store.set_external_id("Summer", "123").unwrap();
        store.set_external_id("Spring", "123").unwrap();

        assert_eq!(
            store.external_link("Spring").unwrap().wix_id.as_deref(),
            Some("123")
        );
        assert_eq!(store.external_link("Summer").unwrap().wix_id, None);
        assert_eq!(store.bouquet_by_external_id("123"), Some("Spring"));
    }

    #[test]
    fn legacy_json_migrates_once() {
        let dir = TempDir::new().unwrap();
        std::fs::write(
            dir.path().join("Bouquets.json"),
            r#"{"Spring": [["Rose","Red","Medium"],["Rose","Red","Medium"]]}"#,
        )
        .unwrap();

        let store = BouquetStore::load(dir.path(), WriteMode::Eager).unwrap();
        assert_eq!(store.open("Spring").unwrap().flower_count()[&rose()], 2);
        assert!(dir.path().join("Bouquets.csv").exists());

        // Second load goes through the CSV, no re-migration.
        std::fs::remove_file(dir.path().join("Bouquets.json")).unwrap();
        let store = BouquetStore::load(dir.path(), WriteMode::Eager).unwrap();
        assert_eq!(store.open("Spring").unwrap().flower_count()[&rose()], 2);
    }

    #[test]
    fn table_without_link_columns_loads() {
        let dir = TempDir::new().unwrap();
        std::fs::write(
            dir.path().join("Bouquets.csv"),
            "Bouquet Name,Flower Name,Color,Size,Count\nSpring,Rose,Red,Medium,1\n",
        )
        .unwrap();
        let store = BouquetStore::load(dir.path(), WriteMode::Eager).unwrap();
        assert_eq!(store.external_link("Spring").unwrap().wix_id, None);
    }

    #[test]
    fn missing_required_column_is_a_validation_error() {
        let dir = TempDir::new().unwrap();
        std::fs::write(
            dir.path().join("Bouquets.csv"),
            "Bouquet Name,Flower Name,Color,Size\nSpring,Rose,Red,Medium\n",
        )
        .unwrap();
        let err = BouquetStore::load(dir.path(), WriteMode::Eager).unwrap_err();
        assert!(matches!(err, StoreError::Validation { .. }));
    }
}
