//! amz-reviews - Amazon review collection CLI
//!
//! Walks a product's review listing star filter by star filter with
//! browser-like pacing, extracts structured review records, and ships
//! them to an ingest backend.

use amz_reviews::amazon::Marketplace;
use amz_reviews::browser::SpeedMode;
use amz_reviews::commands::{CollectCommand, PreviewCommand, UploadCommand};
use amz_reviews::config::{Config, OutputFormat};
use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing::Level;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(
    name = "amz-reviews",
    version,
    about = "Amazon review collection CLI",
    long_about = "Collects product reviews star by star with human-like pacing, de-duplicates them, and uploads the batch to a review ingest backend."
)]
struct Cli {
    /// Amazon marketplace to collect from
    #[arg(short, long, default_value = "us", global = true, env = "AMZ_MARKETPLACE")]
    marketplace: Marketplace,

    /// Proxy URL (e.g., socks5://host:port)
    #[arg(long, global = true, env = "AMZ_PROXY")]
    proxy: Option<String>,

    /// Path to config file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Output format
    #[arg(short, long, default_value = "table", global = true)]
    format: OutputFormat,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Collect reviews for a product
    #[command(alias = "c")]
    Collect {
        /// ASIN to collect reviews for
        asin: String,

        /// Star ratings to collect (comma-separated, default all five)
        #[arg(long, value_delimiter = ',')]
        stars: Option<Vec<u8>>,

        /// Pages to walk per star rating
        #[arg(long, default_value = "10")]
        pages: u32,

        /// Collection pacing (stable or fast)
        #[arg(long, default_value = "stable")]
        speed: SpeedMode,

        /// Only collect reviews with images or video
        #[arg(long)]
        media_only: bool,

        /// Keep partial results if the run is stopped with Ctrl-C
        #[arg(long)]
        keep_partial: bool,

        /// Filter: verified purchases only
        #[arg(long)]
        verified_only: bool,

        /// Filter: minimum helpful votes
        #[arg(long)]
        min_votes: Option<u32>,

        /// Filter: required keywords (comma-separated)
        #[arg(long, value_delimiter = ',')]
        keywords: Option<Vec<String>>,

        /// Filter: excluded keywords (comma-separated)
        #[arg(long, value_delimiter = ',')]
        exclude: Option<Vec<String>>,

        /// Save the collected batch to a JSON file
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Upload the batch to the ingest backend after collection
        #[arg(long)]
        upload: bool,

        /// Ingest backend base URL
        #[arg(long, env = "AMZ_ENDPOINT")]
        endpoint: Option<String>,

        /// Bearer token for the ingest backend
        #[arg(long, env = "AMZ_TOKEN")]
        token: Option<String>,
    },

    /// Preview one page of a review listing
    #[command(alias = "p")]
    Preview {
        /// ASIN to preview
        asin: String,

        /// Star rating listing to fetch (1-5)
        #[arg(long, default_value = "5")]
        star: u8,

        /// Page number to fetch
        #[arg(long, default_value = "1")]
        page: u32,
    },

    /// Upload a previously saved batch file
    Upload {
        /// Path to the batch JSON file
        file: PathBuf,

        /// Ingest backend base URL
        #[arg(long, env = "AMZ_ENDPOINT")]
        endpoint: Option<String>,

        /// Bearer token for the ingest backend
        #[arg(long, env = "AMZ_TOKEN")]
        token: Option<String>,
    },

    /// List supported marketplaces
    Marketplaces,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let filter = if cli.verbose {
        EnvFilter::new(Level::DEBUG.to_string())
    } else {
        EnvFilter::from_default_env().add_directive(Level::WARN.into())
    };

    tracing_subscriber::fmt().with_env_filter(filter).with_target(false).init();

    // Load config with layered overrides
    let mut config = Config::load(cli.config.as_deref())?.with_env();

    // Apply CLI overrides
    config.marketplace = cli.marketplace;
    config.format = cli.format;

    if let Some(proxy) = cli.proxy {
        config.proxy = Some(proxy);
    }

    match cli.command {
        Commands::Collect {
            asin,
            stars,
            pages,
            speed,
            media_only,
            keep_partial,
            verified_only,
            min_votes,
            keywords,
            exclude,
            output,
            upload,
            endpoint,
            token,
        } => {
            // Apply collection-specific config
            config.pages_per_star = pages;
            config.speed = speed;
            config.media_only = media_only;
            config.keep_partial = keep_partial;
            config.verified_only = verified_only;
            config.min_votes = min_votes;

            if let Some(s) = stars {
                config.stars = s;
            }
            if let Some(kw) = keywords {
                config.keywords = kw;
            }
            if let Some(ex) = exclude {
                config.exclude_keywords = ex;
            }
            if let Some(e) = endpoint {
                config.endpoint = Some(e);
            }
            if let Some(t) = token {
                config.token = Some(t);
            }

            let cmd = CollectCommand::new(config);
            let result = cmd.execute(&asin, output.as_deref(), upload).await?;
            println!("{}", result);
        }

        Commands::Preview { asin, star, page } => {
            let cmd = PreviewCommand::new(config);
            let result = cmd.execute(&asin, star, page).await?;
            println!("{}", result);
        }

        Commands::Upload { file, endpoint, token } => {
            if let Some(e) = endpoint {
                config.endpoint = Some(e);
            }
            if let Some(t) = token {
                config.token = Some(t);
            }

            let cmd = UploadCommand::new(config);
            let result = cmd.execute(&file).await?;
            println!("{}", result);
        }

        Commands::Marketplaces => {
            println!("Supported Amazon marketplaces:\n");
            println!("{:<6} {:<22} {:<10}", "Code", "Domain", "Currency");
            println!("{:-<6} {:-<22} {:-<10}", "", "", "");

            for marketplace in Marketplace::all() {
                println!(
                    "{:<6} {:<22} {:<10}",
                    marketplace.to_string(),
                    marketplace.domain(),
                    marketplace.currency()
                );
            }
        }
    }

    Ok(())
}
