use clap::Parser;
use flowerstock::config::{CliConfig, Command, Settings};
use flowerstock::store::{backup, orders};
use flowerstock::sync::{self, DriveFolder, WixClient};
use flowerstock::utils::{instance::InstanceGuard, logger};
use flowerstock::{BouquetStore, ColorCatalog, FlowerCatalog, PricingTable, WriteMode};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = CliConfig::parse();
    logger::init_cli_logger(config.verbose);

    let Some(_guard) = InstanceGuard::acquire(config.port)? else {
        eprintln!("flowerstock is already running (port {} is bound)", config.port);
        std::process::exit(1);
    };

    if let Err(e) = run(&config).await {
        tracing::error!("command failed: {e}");
        eprintln!("error: {e}");
        std::process::exit(1);
    }
    Ok(())
}

async fn run(config: &CliConfig) -> flowerstock::Result<()> {
    let data_dir = config.data_dir.as_path();
    let orders_dir = config.orders_dir();

    match &config.command {
        Command::Status => {
            let flowers = FlowerCatalog::load(data_dir, WriteMode::Eager)?;
            let colors = ColorCatalog::load(data_dir, WriteMode::Eager)?;
            let bouquets = BouquetStore::load(data_dir, WriteMode::Eager)?;
            let pricing = PricingTable::load(data_dir, WriteMode::Eager)?;
            let order_files = orders::list_orders(&orders_dir)?;
            println!("flowers:  {}", flowers.len());
            println!("colors:   {}", colors.len());
            println!("bouquets: {}", bouquets.len());
            println!("prices:   {}", pricing.len());
            println!("orders:   {}", order_files.len());
        }
        Command::Migrate => {
            // Loading runs the versioned loader chain; legacy files are
            // rewritten in the current format as a side effect.
            FlowerCatalog::load(data_dir, WriteMode::Eager)?;
            ColorCatalog::load(data_dir, WriteMode::Eager)?;
            BouquetStore::load(data_dir, WriteMode::Eager)?;
            PricingTable::load(data_dir, WriteMode::Eager)?;
            println!("migration complete");
        }
        Command::Backup => {
            let path = backup::create_backup(data_dir)?;
            println!("backup created in {}", path.display());
        }
        Command::Backups => {
            for name in backup::list_backups(data_dir)? {
                println!("{name}");
            }
        }
        Command::Restore { name } => {
            backup::restore_backup(data_dir, name)?;
            println!("restored backup '{name}'");
        }
        Command::Push => {
            let settings = Settings::from_file(&config.settings)?;
            let drive = settings.drive()?;
            let remote = DriveFolder::new(&drive.base_url, &drive.token, &drive.folder_name);
            sync::push_all(&remote, data_dir, &orders_dir).await?;
            println!("push complete");
        }
        Command::Pull => {
            let settings = Settings::from_file(&config.settings)?;
            let drive = settings.drive()?;
            let remote = DriveFolder::new(&drive.base_url, &drive.token, &drive.folder_name);
            sync::pull_all(&remote, data_dir, &orders_dir).await?;
            println!("pull complete");
        }
        Command::WixPushPrices => {
            let settings = Settings::from_file(&config.settings)?;
            let wix = settings.wix()?;
            let client = WixClient::new(
                &wix.base_url,
                &wix.api_key,
                &wix.site_id,
                wix.account_id.as_deref(),
            );

            let store = BouquetStore::load(data_dir, WriteMode::Eager)?;
            let pricing = PricingTable::load(data_dir, WriteMode::Eager)?;

            let mut pushed = 0;
            for name in store.names() {
                let Some(link) = store.external_link(&name) else {
                    continue;
                };
                let Some(product_id) = link.wix_id.as_deref() else {
                    continue;
                };
                let bouquet = store.open(&name)?;
                let price = pricing.bouquet_price(&bouquet);
                client.update_product_price(product_id, price).await?;
                pushed += 1;
            }
            println!("pushed prices for {pushed} linked bouquets");
        }
    }
    Ok(())
}
