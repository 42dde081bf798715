mod config;
mod render;
mod ui;

use std::io;

use anyhow::Context;
use equal_db::{Database, KeyValueStore, MemoryStore, Persistence};
use equal_session::Session;
use tracing::info;

use crate::config::{Config, StorageKind};

fn main() -> anyhow::Result<()> {
    // Load .env if present
    let _ = dotenvy::dotenv();

    // Logs go to stderr so they never interleave with the screens on stdout
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "equal_democracy=info,equal_session=info,equal_store=info,equal_db=info".into()
            }),
        )
        .with_writer(io::stderr)
        .init();

    let config = Config::load();

    let kv: Box<dyn KeyValueStore> = match config.storage {
        StorageKind::Sqlite => Box::new(
            Database::open(&config.db_path)
                .with_context(|| format!("opening {}", config.db_path.display()))?,
        ),
        StorageKind::Memory => Box::new(MemoryStore::new()),
    };
    info!(storage = %config.storage, "Equal Democracy starting");

    let mut session = Session::start(Persistence::new(kv))?;

    let stdin = io::stdin();
    let mut stdout = io::stdout();
    ui::run(&mut session, stdin.lock(), &mut stdout)?;

    info!("Goodbye");
    Ok(())
}
