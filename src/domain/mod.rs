pub mod bouquet;
pub mod flower;

pub use bouquet::Bouquet;
pub use flower::{FlowerRecord, DEFAULT_SIZES};
