pub mod settings;

pub use settings::{DriveSettings, Settings, WixSettings};

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Port the single-instance guard binds when the config does not override it.
pub const DEFAULT_GUARD_PORT: u16 = 54321;

#[derive(Debug, Clone, Parser)]
#[command(name = "flowerstock")]
#[command(about = "Flower shop inventory and order data manager")]
pub struct CliConfig {
    /// Directory holding the catalog/bouquet/pricing tables.
    #[arg(long, default_value = ".")]
    pub data_dir: PathBuf,

    /// Directory holding saved order files, relative to the data dir unless
    /// absolute.
    #[arg(long, default_value = "orders")]
    pub orders_dir: PathBuf,

    /// TOML settings file with remote-sync credentials.
    #[arg(long, default_value = "flowerstock.toml")]
    pub settings: PathBuf,

    /// Single-instance guard port.
    #[arg(long, default_value_t = DEFAULT_GUARD_PORT)]
    pub port: u16,

    /// Enable verbose output.
    #[arg(long)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

impl CliConfig {
    pub fn orders_dir(&self) -> PathBuf {
        if self.orders_dir.is_absolute() {
            self.orders_dir.clone()
        } else {
            self.data_dir.join(&self.orders_dir)
        }
    }
}

#[derive(Debug, Clone, Subcommand)]
pub enum Command {
    /// Load every store and print entry counts.
    Status,
    /// Run the legacy-format loader chain across all stores.
    Migrate,
    /// Copy the data files into a timestamped backup directory.
    Backup,
    /// List available backups, newest first.
    Backups,
    /// Restore the data files from a named backup.
    Restore { name: String },
    /// Upload the data files and saved orders to the remote folder.
    Push,
    /// Download the remote folder's files over the local data files.
    Pull,
    /// Push the default pricing table to linked store products.
    WixPushPrices,
}
