use anyhow::Result;
use clap::{Parser, Subcommand};
use serde::Serialize;
use std::path::PathBuf;
use tracing::{info, warn};

use content_index::config;
use content_index::db;
use content_index::fixtures;
use content_index::index::{self, PageRequest, RequestScope};
use content_index::store::SqliteStore;

#[derive(Debug, Parser)]
#[command(author, version, about = "Aggregate content-site views from a SQLite store")]
struct Args {
    /// Path to YAML config file
    #[arg(long, global = true, default_value = "config.yaml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Print an example configuration file and exit.
    ExampleConfig,
    /// Create the database and apply migrations.
    Migrate,
    /// Load categories, items, settings and subscribers from a YAML fixture.
    Seed { fixture: PathBuf },
    /// Print the home view.
    Home,
    /// Print one page of the listing, optionally for a single category.
    List {
        /// 1-indexed page; invalid values fall back to 1.
        #[arg(long)]
        page: Option<String>,
        /// Category name to scope the listing to.
        #[arg(long)]
        category: Option<String>,
    },
    /// Print item, category and subscriber totals.
    Dashboard,
    /// Print every item with its category name.
    Catalog,
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_target(false)
        .with_writer(std::io::stderr)
        .compact()
        .init();

    let args = Args::parse();
    if let Command::ExampleConfig = args.command {
        print!("{}", config::example());
        return Ok(());
    }

    let cfg = config::load(Some(&args.config))?;
    cfg.ensure_dirs()?;

    let database_url = cfg.database_url();
    let pool = db::init_pool(&database_url).await?;
    db::run_migrations(&pool).await?;

    let scope = RequestScope::new(cfg.request_timeout());
    // Ctrl-C cancels whatever view is being assembled.
    let ctrl_c_token = scope.token().clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("interrupt received; cancelling request");
            ctrl_c_token.cancel();
        }
    });
    let settings = cfg.index_settings();
    let store = SqliteStore::new(pool.clone());

    match args.command {
        Command::ExampleConfig => {}
        Command::Migrate => {
            info!(database_url = %database_url, "migrations applied");
        }
        Command::Seed { fixture } => {
            let fixture = fixtures::load(&fixture)?;
            let report = fixtures::seed(&pool, &fixture).await?;
            println!(
                "seeded {} categories, {} items, {} settings, {} subscribers",
                report.categories, report.items, report.settings, report.subscribers
            );
        }
        Command::Home => {
            print_json(&index::home_view(&store, &settings, &scope).await?)?;
        }
        Command::List { page, category } => {
            let view = index::listing_view(
                &store,
                &settings,
                &scope,
                PageRequest::parse(page.as_deref()),
                category.as_deref(),
            )
            .await?;
            print_json(&view)?;
        }
        Command::Dashboard => {
            print_json(&index::dashboard_view(&store, &scope).await?)?;
        }
        Command::Catalog => {
            print_json(&index::catalog_view(&store, &scope).await?)?;
        }
    }

    pool.close().await;
    Ok(())
}
