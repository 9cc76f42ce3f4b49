//! Schema commands
//!
//! Usage: userbook migrate [--to <VERSION>]
//!        userbook version

use clap::Args;
use std::path::Path;
use userbook_store::{db, migrations};

#[derive(Debug, Args)]
pub struct MigrateArgs {
    /// Target schema version (default: latest)
    #[arg(long)]
    pub to: Option<u32>,
}

pub fn execute(args: MigrateArgs, db_path: &Path) -> Result<(), Box<dyn std::error::Error>> {
    let mut conn = db::open(db_path)?;
    db::configure(&conn)?;

    let before = migrations::current_version(&conn)?;
    let after = match args.to {
        Some(target) => {
            migrations::verify_checksums(&conn)?;
            migrations::migrate(&mut conn, before, target)?
        }
        None => migrations::apply_migrations(&mut conn)?,
    };

    if after == before {
        println!("Schema already at version {}", after);
    } else {
        println!("Migrated schema from version {} to {}", before, after);
    }

    Ok(())
}

/// Reports the database's schema version without migrating it
pub fn execute_version(db_path: &Path) -> Result<(), Box<dyn std::error::Error>> {
    println!("userbook {}", env!("CARGO_PKG_VERSION"));
    println!("Supported schema version: {}", migrations::LATEST_VERSION);

    if db_path.exists() {
        let conn = rusqlite::Connection::open(db_path)?;
        println!(
            "Database schema version: {} ({})",
            migrations::current_version(&conn)?,
            db_path.display()
        );
    } else {
        println!("Database schema version: none ({} does not exist)", db_path.display());
    }

    Ok(())
}
