//! Administrative command-line tool (CLI binary).
//!
//! A thin wrapper around the `sitekit` library that handles:
//! - Command-line argument parsing
//! - Environment variable loading (.env file)
//! - Logger initialization
//! - User-facing output formatting
//!
//! All core functionality is implemented in the library crate.

use std::path::PathBuf;
use std::process;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};

use sitekit::db::{ConnectOptions, Database};
use sitekit::initialization::init_logger_with;
use sitekit::ip::{AddressResolver, RequestContext};
use sitekit::{DatabaseConfig, LogFormat, LogLevel};

#[derive(Debug, Parser)]
#[command(
    name = "sitekit",
    about = "Database maintenance and client address tools for web applications."
)]
struct Cli {
    /// Log level: error|warn|info|debug|trace
    #[arg(long, value_enum, default_value_t = LogLevel::Info)]
    log_level: LogLevel,

    /// Log format: plain|json
    #[arg(long, value_enum, default_value_t = LogFormat::Plain)]
    log_format: LogFormat,

    /// Data source name, URL form (mysql://host/db) or key form (mysql:host=h;dbname=db)
    #[arg(long, env = "DATABASE_URL")]
    dsn: Option<String>,

    /// Database user (overrides the DSN)
    #[arg(long, env = "DATABASE_USER")]
    user: Option<String>,

    /// Database password (overrides the DSN)
    #[arg(long, env = "DATABASE_PASSWORD", hide_env_values = true)]
    password: Option<String>,

    /// Table name prefix
    #[arg(long, env = "DATABASE_PREFIX")]
    prefix: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// List the tables of the database
    Tables,
    /// Run a query and print the rows as JSON
    Query {
        sql: String,
    },
    /// Run a statement and print the number of affected rows
    Exec {
        sql: String,
    },
    /// Optimize every table
    Optimize,
    /// Repair every table
    Repair,
    /// Dump the database to a file
    Backup {
        /// Backup engine
        #[arg(long, default_value = "MySQL")]
        kind: String,
        /// Output directory
        #[arg(long, default_value = ".")]
        path: PathBuf,
        /// Output format: sql|gz
        #[arg(long, default_value = sitekit::config::DEFAULT_BACKUP_FORMAT)]
        format: String,
    },
    /// Resolve a client address and print its lookup URL
    Ip {
        #[arg(long)]
        forwarded_for: Option<String>,
        #[arg(long)]
        client_ip: Option<String>,
        #[arg(long)]
        remote_addr: Option<String>,
        /// Base URL of the lookup service
        #[arg(long)]
        lookup: Option<String>,
    },
}

impl Cli {
    /// Database settings from the environment, overridden by explicit flags.
    fn database_config(&self) -> DatabaseConfig {
        let mut config = DatabaseConfig::from_env();
        if let Some(dsn) = &self.dsn {
            config.dsn = Some(dsn.clone());
        }
        if let Some(user) = &self.user {
            config.username = Some(user.clone());
        }
        if let Some(password) = &self.password {
            config.password = Some(password.clone());
        }
        if let Some(prefix) = &self.prefix {
            config.prefix = Some(prefix.clone());
        }
        config
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load environment variables from .env file (if it exists)
    let _ = dotenvy::dotenv();

    let cli = Cli::parse();

    init_logger_with(cli.log_level.clone().into(), cli.log_format.clone())
        .context("Failed to initialize logger")?;

    if let Err(e) = run(cli).await {
        eprintln!("sitekit error: {:#}", e);
        process::exit(1);
    }
    Ok(())
}

async fn run(cli: Cli) -> Result<()> {
    let config = cli.database_config();
    match cli.command {
        Command::Ip {
            forwarded_for,
            client_ip,
            remote_addr,
            lookup,
        } => {
            let ctx = RequestContext {
                forwarded_for,
                client_ip,
                remote_addr,
            };
            let resolver = match lookup {
                Some(base) => AddressResolver::with_base_url(base),
                None => AddressResolver::new(),
            };
            let address = resolver.resolve(Some(&ctx));
            println!("{address}");
            println!("{}", resolver.lookup_url(Some(&address)));
            Ok(())
        }
        // The dump tool connects on its own; the stored settings are enough
        Command::Backup { kind, path, format } => {
            let mut db = Database::from_config(&config);
            let file = db
                .backup(&kind, path, &format)
                .await
                .context("Backup failed")?;
            println!("Backup written to {}", file.display());
            Ok(())
        }
        command => {
            let mut db = Database::from_config(&config);
            db.get_instance(ConnectOptions::default())
                .await
                .context("Failed to connect to database")?;

            let outcome = run_database_command(&mut db, command).await;

            db.stats().log_summary();
            db.free(None, true)
                .await
                .context("Failed to close database connection")?;
            outcome
        }
    }
}

async fn run_database_command(db: &mut Database, command: Command) -> Result<()> {
    match command {
        Command::Tables => {
            for table in db.show_tables().await.context("Failed to list tables")? {
                println!("{table}");
            }
        }
        Command::Query { sql } => {
            let rows = db
                .query_fetch_all_assoc(&sql)
                .await
                .with_context(|| format!("Query failed: {sql}"))?;
            println!(
                "{}",
                serde_json::to_string_pretty(&rows).context("Failed to encode rows")?
            );
        }
        Command::Exec { sql } => {
            let affected = db
                .exec(&sql)
                .await
                .with_context(|| format!("Statement failed: {sql}"))?;
            println!(
                "{} row{} affected",
                affected,
                if affected == 1 { "" } else { "s" }
            );
        }
        Command::Optimize => {
            let tables = db.optimize().await.context("Failed to optimize tables")?;
            println!("Optimized {} table(s)", tables.len());
        }
        Command::Repair => {
            let tables = db.repair().await.context("Failed to repair tables")?;
            println!("Repaired {} table(s)", tables.len());
        }
        // Handled without a connection
        Command::Backup { .. } | Command::Ip { .. } => {}
    }
    Ok(())
}
