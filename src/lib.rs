pub mod config;
pub mod domain;
pub mod store;
pub mod sync;
pub mod utils;

pub use config::{CliConfig, Settings};
pub use domain::{Bouquet, FlowerRecord};
pub use store::{BouquetStore, ColorCatalog, FlowerCatalog, Order, PricingTable, WriteMode};
pub use sync::{DriveFolder, RemoteFolder, WixClient};
pub use utils::error::{Result, StoreError};
