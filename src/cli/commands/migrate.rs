//! Migrate command handler

use crate::config::Config;
use crate::db::Store;

pub async fn cmd_migrate(config: &Config) -> anyhow::Result<()> {
    // Connecting applies every pending migration.
    let store = Store::new(&config.general.database_url).await?;

    match store.latest_migration().await? {
        Some(name) => println!("Schema is up to date (latest migration: {name})"),
        None => println!("No migrations applied."),
    }
    Ok(())
}
