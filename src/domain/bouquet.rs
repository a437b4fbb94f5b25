use crate::domain::flower::FlowerRecord;
use crate::utils::error::{Result, StoreError};
use std::collections::HashMap;

/// A named multiset of flower records. Duplicates are allowed and insertion
/// order is kept so repeated edits display stably; order carries no other
/// meaning.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Bouquet {
    name: String,
    flowers: Vec<FlowerRecord>,
}

impl Bouquet {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            flowers: Vec::new(),
        }
    }

    pub fn with_flowers(name: impl Into<String>, flowers: Vec<FlowerRecord>) -> Self {
        Self {
            name: name.into(),
            flowers,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn flowers(&self) -> &[FlowerRecord] {
        &self.flowers
    }

    pub fn is_empty(&self) -> bool {
        self.flowers.is_empty()
    }

    /// Appends `count` copies of the record. No catalog validation happens
    /// here; callers restrict choices upstream.
    pub fn select_flower(&mut self, record: FlowerRecord, count: u32) {
        for _ in 0..count {
            self.flowers.push(record.clone());
        }
    }

    /// Removes `count` matching entries, all or nothing. Fails with
    /// `InsufficientQuantity` (reporting how many were available) when the
    /// bouquet holds fewer than `count`, leaving the bouquet unchanged.
    pub fn remove_flower(&mut self, record: &FlowerRecord, count: u32) -> Result<()> {
        let available = self.flowers.iter().filter(|f| *f == record).count() as u32;
        if available < count {
            return Err(StoreError::InsufficientQuantity {
                flower: record.to_string(),
                requested: count,
                available,
            });
        }
        let mut remaining = count;
        self.flowers.retain(|f| {
            if remaining > 0 && f == record {
                remaining -= 1;
                false
            } else {
                true
            }
        });
        Ok(())
    }

    /// Aggregates the multiset into per-record counts. Iteration order is
    /// unspecified; use `sorted_counts` for display.
    pub fn flower_count(&self) -> HashMap<FlowerRecord, u32> {
        let mut counts: HashMap<FlowerRecord, u32> = HashMap::new();
        for flower in &self.flowers {
            *counts.entry(flower.clone()).or_default() += 1;
        }
        counts
    }

    /// Counts sorted by record (name first), for list views and reports.
    pub fn sorted_counts(&self) -> Vec<(FlowerRecord, u32)> {
        let mut counts: Vec<(FlowerRecord, u32)> = self.flower_count().into_iter().collect();
        counts.sort_by(|a, b| a.0.cmp(&b.0));
        counts
    }
}
