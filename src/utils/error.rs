use thiserror::Error;

/// What kind of named entry an operation was aimed at, so NotFound/Conflict
/// messages name the table and not just the key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryKind {
    Flower,
    Color,
    Bouquet,
    Order,
}

impl std::fmt::Display for EntryKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            EntryKind::Flower => "flower",
            EntryKind::Color => "color",
            EntryKind::Bouquet => "bouquet",
            EntryKind::Order => "order",
        };
        f.write_str(s)
    }
}

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("{kind} '{name}' not found")]
    NotFound { kind: EntryKind, name: String },

    #[error("{kind} '{name}' already exists")]
    Conflict { kind: EntryKind, name: String },

    #[error("insufficient quantity of '{flower}': requested {requested}, available {available}")]
    InsufficientQuantity {
        flower: String,
        requested: u32,
        available: u32,
    },

    #[error("validation error: {message}")]
    Validation { message: String },

    #[error("configuration error in '{field}': {message}")]
    Config { field: String, message: String },

    #[error("remote API error: {message}")]
    Remote { message: String },

    #[error("API request failed: {0}")]
    Api(#[from] reqwest::Error),

    #[error("CSV processing error: {0}")]
    Csv(#[from] csv::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Json(#[from] serde_json::Error),
}

impl StoreError {
    pub fn not_found(kind: EntryKind, name: impl Into<String>) -> Self {
        StoreError::NotFound {
            kind,
            name: name.into(),
        }
    }

    pub fn conflict(kind: EntryKind, name: impl Into<String>) -> Self {
        StoreError::Conflict {
            kind,
            name: name.into(),
        }
    }

    pub fn validation(message: impl Into<String>) -> Self {
        StoreError::Validation {
            message: message.into(),
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, StoreError::NotFound { .. })
    }

    pub fn is_conflict(&self) -> bool {
        matches!(self, StoreError::Conflict { .. })
    }
}

pub type Result<T> = std::result::Result<T, StoreError>;
