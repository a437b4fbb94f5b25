use serde::{Deserialize, Serialize};

/// The size scale every shop starts with. A flower's catalog entry may
/// restrict it to a subset; an empty allow-list means the whole scale is
/// valid.
pub const DEFAULT_SIZES: &[&str] = &["Small", "Medium", "Large", "Regular"];

/// One kind of flower as stocked. Identity is the full (name, color, size)
/// value; there is no separate ID, two records with equal fields are the
/// same flower for counting purposes.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct FlowerRecord {
    pub name: String,
    pub color: String,
    pub size: String,
}

impl FlowerRecord {
    pub fn new(name: impl Into<String>, color: impl Into<String>, size: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            color: color.into(),
            size: size.into(),
        }
    }
}

impl std::fmt::Display for FlowerRecord {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} - {} - {}", self.name, self.color, self.size)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn records_compare_by_value() {
        let a = FlowerRecord::new("Rose", "Red", "Medium");
        let b = FlowerRecord::new("Rose", "Red", "Medium");
        let c = FlowerRecord::new("Rose", "White", "Medium");
        assert_eq!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn ordering_is_name_first() {
        let rose = FlowerRecord::new("Rose", "Red", "Large");
        let lily = FlowerRecord::new("Lily", "White", "Small");
        assert!(lily < rose);
    }
}
