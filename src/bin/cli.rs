//! Vacancy grabber CLI
//!
//! `run` starts the scheduled crawl and the bulk read responder; the other
//! subcommands are one-shot helpers.

use std::path::PathBuf;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use vacancy_grabber::{
    error::Result,
    models::Config,
    pipeline::{Grabber, IntervalScheduler},
    services::{BulkReadResponder, HabrCareerDateTimeParser, HabrCareerParse, Parse},
    storage::{MemStore, PsqlStore, Store},
    utils::http::HttpFetcher,
};

/// Vacancy grabber - career.habr.com crawler
#[derive(Parser, Debug)]
#[command(name = "grabber", version, about = "Scheduled vacancy crawler")]
struct Cli {
    /// Path to the configuration file
    #[arg(short, long, default_value = "config.toml")]
    config: PathBuf,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Crawl on schedule and serve stored posts until Ctrl-C
    Run {
        /// Keep posts in memory instead of PostgreSQL
        #[arg(long)]
        memory: bool,
    },

    /// Crawl once and print the posts without storing them
    Crawl,

    /// Print stored posts
    Dump {
        /// Print only the post with this id
        #[arg(long)]
        id: Option<i32>,
    },

    /// Validate the configuration file
    Validate,
}

/// Initialize logging based on verbosity flag.
fn init_logging(verbose: bool) {
    let level = if verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level))
        .format_timestamp_secs()
        .init();
}

fn build_parser(config: &Config) -> Result<HabrCareerParse> {
    let fetcher = HttpFetcher::new(&config.crawler)?;
    HabrCareerParse::new(
        config.crawler.clone(),
        &config.selectors,
        Arc::new(fetcher),
        Arc::new(HabrCareerDateTimeParser),
    )
}

/// Main entry point for the CLI application.
#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let config = Config::load_or_default(&cli.config);
    log::info!("Loaded configuration from {}", cli.config.display());

    match cli.command {
        Command::Run { memory } => {
            config.validate()?;
            run(config, memory).await?;
        }

        Command::Crawl => {
            config.validate()?;
            let parser = build_parser(&config)?;
            for post in parser.list(&config.crawler.source_url).await? {
                println!("{post}");
            }
        }

        Command::Dump { id } => {
            let store = PsqlStore::connect(&config.database).await?;
            match id {
                Some(id) => match store.try_find_by_id(id).await? {
                    Some(post) => println!("{post}"),
                    None => log::warn!("No post with id {}", id),
                },
                None => {
                    for post in store.try_get_all().await? {
                        println!("{post}");
                    }
                }
            }
            store.close().await?;
        }

        Command::Validate => {
            log::info!("Validating configuration...");
            if let Err(e) = config.validate() {
                log::error!("Config validation failed: {}", e);
                return Err(e);
            }
            log::info!("Config OK");
        }
    }

    Ok(())
}

/// Schedule the crawl, serve reads, and wait for Ctrl-C.
async fn run(config: Config, memory: bool) -> Result<()> {
    let parser: Arc<dyn Parse> = Arc::new(build_parser(&config)?);

    let psql = if memory {
        None
    } else {
        Some(Arc::new(PsqlStore::connect(&config.database).await?))
    };
    let store: Arc<dyn Store> = match &psql {
        Some(psql) => psql.clone(),
        None => {
            log::warn!("Using in-memory store; posts are lost on exit");
            Arc::new(MemStore::new())
        }
    };

    let scheduler = IntervalScheduler::new();
    let mut grabber = Grabber::new(&config);
    grabber.init(parser, Arc::clone(&store), &scheduler)?;

    let responder = BulkReadResponder::bind(&config.server.bind_addr(), store).await?;
    let responder = responder.spawn();

    tokio::signal::ctrl_c().await?;
    log::info!("Shutting down...");

    scheduler.shutdown().await;
    responder.abort();
    let _ = responder.await;

    if let Some(psql) = psql {
        match Arc::try_unwrap(psql) {
            Ok(psql) => psql.close().await?,
            Err(_) => log::warn!("Database connection still in use; dropping it"),
        }
    }

    log::info!("Done!");
    Ok(())
}
