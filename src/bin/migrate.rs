//! CLI tool to apply database migrations
//!
//! Usage:
//!   DATABASE_URI=sqlite://musify.db cargo run --bin migrate

use anyhow::{Context, Result};
use clap::Parser;
use musify::{config::Settings, db::{Database, MIGRATOR}};

/// Apply pending migrations to DATABASE_URI
#[derive(Parser, Debug)]
#[command(name = "migrate")]
#[command(about = "Apply pending Musify database migrations")]
struct Args {
    /// Only list the embedded migrations
    #[arg(long)]
    list: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    if args.list {
        for migration in MIGRATOR.iter() {
            println!("{:>16}  {}", migration.version, migration.description);
        }
        return Ok(());
    }

    let settings = Settings::load()?;

    let database = Database::connect(&settings)
        .await
        .context("Failed to connect to DATABASE_URI")?;

    database
        .migrate()
        .await
        .context("Failed to apply migrations")?;

    println!("Migrations applied ({} embedded)", MIGRATOR.iter().count());

    database.close().await;

    Ok(())
}
