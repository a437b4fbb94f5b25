pub mod drive;
pub mod wix;

pub use drive::DriveFolder;
pub use wix::WixClient;

use crate::store::backup::DATA_FILES;
use crate::store::orders;
use crate::utils::error::Result;
use async_trait::async_trait;
use std::path::Path;

/// A remote folder holding named files. Upload and download are upserts on
/// the remote/local side respectively; calls run sequentially with no retry,
/// failures surface as one error to the caller.
#[async_trait]
pub trait RemoteFolder: Send + Sync {
    async fn upload(&self, name: &str, local_path: &Path) -> Result<()>;
    async fn download(&self, name: &str, local_path: &Path) -> Result<()>;
    async fn list(&self) -> Result<Vec<String>>;
}

/// Uploads the data files plus every saved order file. Missing local files
/// are skipped.
pub async fn push_all(remote: &dyn RemoteFolder, data_dir: &Path, orders_dir: &Path) -> Result<()> {
    for name in DATA_FILES {
        let path = data_dir.join(name);
        if path.exists() {
            remote.upload(name, &path).await?;
        }
    }
    for stem in orders::list_orders(orders_dir)? {
        for suffix in ["", "_quantities", "_pricing"] {
            let file = format!("{stem}{suffix}.csv");
            let path = orders_dir.join(&file);
            if path.exists() {
                remote.upload(&format!("orders/{file}"), &path).await?;
            }
        }
    }
    Ok(())
}

/// Downloads every remote file into the data dir (order files under the
/// orders dir). Unknown remote names are fetched too; the remote folder is
/// the source of truth on pull.
pub async fn pull_all(remote: &dyn RemoteFolder, data_dir: &Path, orders_dir: &Path) -> Result<()> {
    for name in remote.list().await? {
        let local = match name.strip_prefix("orders/") {
            Some(order_file) => orders_dir.join(order_file),
            None => data_dir.join(&name),
        };
        remote.download(&name, &local).await?;
    }
    Ok(())
}
