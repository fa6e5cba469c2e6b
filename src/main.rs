//! fbscrape main entry point
//!
//! This is the command-line interface for the fbscrape post scraper.

use anyhow::{bail, Context, Result};
use clap::Parser;
use fbscrape::config::{load_config_with_hash, resolve_password, Config};
use fbscrape::crawler::{BrowserFetcher, Credentials, Pacer, ScrapeOptions, Session};
use fbscrape::output::{convert_to_json, load_statistics, print_statistics};
use fbscrape::storage::open_store;
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

/// fbscrape: posts, comments and replies from public Facebook pages
///
/// fbscrape logs in through a headless browser, lists a page's posts, and
/// collects each post's comments (and optionally their replies) into an
/// append-only dump that can be converted to a JSON list.
#[derive(Parser, Debug)]
#[command(name = "fbscrape")]
#[command(version = "1.0.0")]
#[command(about = "Scrapes posts and comments from public Facebook pages", long_about = None)]
struct Cli {
    /// Path to TOML configuration file
    #[arg(value_name = "CONFIG")]
    config: PathBuf,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,

    /// Scrape this post URL instead of listing the page (repeatable)
    #[arg(long = "post", value_name = "URL")]
    posts: Vec<String>,

    /// Validate config and show what would be scraped without opening a browser
    #[arg(long, conflicts_with_all = ["stats", "export_json"])]
    dry_run: bool,

    /// Show statistics from the dump and exit
    #[arg(long, conflicts_with_all = ["dry_run", "export_json"])]
    stats: bool,

    /// Convert the dump to a JSON list at PATH and exit
    #[arg(long, value_name = "PATH", conflicts_with_all = ["dry_run", "stats"])]
    export_json: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Setup logging based on verbosity
    setup_logging(cli.verbose, cli.quiet);

    tracing::info!("Loading configuration from: {}", cli.config.display());
    let (config, config_hash) = load_config_with_hash(&cli.config)
        .with_context(|| format!("Failed to load configuration from {}", cli.config.display()))?;
    tracing::info!("Configuration loaded successfully (hash: {})", config_hash);

    if cli.dry_run {
        handle_dry_run(&config, &cli.posts);
    } else if cli.stats {
        handle_stats(&config)?;
    } else if let Some(path) = &cli.export_json {
        handle_export_json(&config, path)?;
    } else {
        handle_scrape(config, cli.posts).await?;
    }

    Ok(())
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("fbscrape=info,warn"),
            1 => EnvFilter::new("fbscrape=debug,info"),
            2 => EnvFilter::new("fbscrape=trace,debug"),
            _ => EnvFilter::new("trace"),
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .init();
}

/// Handles the --dry-run mode: shows the validated configuration
fn handle_dry_run(config: &Config, posts: &[String]) {
    println!("=== fbscrape Dry Run ===\n");

    println!("Session:");
    println!("  Email: {}", config.session.email);
    println!(
        "  Password: {}",
        if config.session.password.is_some() {
            "from config"
        } else {
            "from environment"
        }
    );

    println!("\nBrowser:");
    println!("  Headless: {}", config.browser.headless);
    println!(
        "  Window: {}x{}",
        config.browser.window_width, config.browser.window_height
    );
    println!("  Request timeout: {}ms", config.browser.request_timeout);
    if let Some(path) = &config.browser.chrome_path {
        println!("  Executable: {}", path);
    }

    println!("\nPacing:");
    println!(
        "  Pause after each navigation: {}-{}ms",
        config.pacing.min_delay, config.pacing.max_delay
    );

    println!("\nScrape:");
    if posts.is_empty() {
        println!("  Page: {} ({} scrolls)", config.scrape.page_id, config.scrape.scrolls);
    } else {
        println!("  Posts ({}):", posts.len());
        for post in posts {
            println!("    * {}", post);
        }
    }
    println!("  Comment limit: {}", describe_limit(config.scrape.comment_limit));
    println!("  Fetch replies: {}", config.scrape.fetch_replies);
    if config.scrape.fetch_replies {
        println!("  Reply limit: {}", describe_limit(config.scrape.reply_limit));
    }

    println!("\nOutput:");
    println!("  Dump: {}", config.output.dump_path);
    if let Some(json) = &config.output.json_path {
        println!("  JSON: {}", json);
    }

    println!("\n✓ Configuration is valid");
}

fn describe_limit(limit: Option<usize>) -> String {
    limit.map_or_else(|| "unbounded".to_string(), |n| n.to_string())
}

/// Handles the --stats mode: shows statistics from the dump
fn handle_stats(config: &Config) -> Result<()> {
    println!("Dump: {}\n", config.output.dump_path);

    let stats = load_statistics(Path::new(&config.output.dump_path))
        .with_context(|| format!("Failed to read dump {}", config.output.dump_path))?;
    print_statistics(&stats);

    Ok(())
}

/// Handles the --export-json mode: converts the dump to a JSON list
fn handle_export_json(config: &Config, destination: &Path) -> Result<()> {
    println!("=== Exporting Dump ===\n");
    println!("Dump: {}", config.output.dump_path);
    println!("Output: {}", destination.display());
    println!();

    let count = convert_to_json(Path::new(&config.output.dump_path), destination)
        .context("Failed to convert dump to JSON")?;

    println!("✓ {} posts exported to: {}", count, destination.display());

    Ok(())
}

/// Handles the main scrape operation
async fn handle_scrape(config: Config, posts: Vec<String>) -> Result<()> {
    let password = resolve_password(&config)?;
    let credentials = Credentials::new(config.session.email.clone(), password);

    let fetcher = BrowserFetcher::launch(&config.browser, Pacer::from(&config.pacing))
        .await
        .context("Failed to launch browser")?;
    let mut session = Session::new(fetcher);

    let outcome = scrape_with_session(&mut session, &config, &credentials, posts).await;

    if let Err(e) = session.close().await {
        tracing::warn!("Failed to close browser session: {}", e);
    }

    outcome?;

    if let Some(json_path) = &config.output.json_path {
        let count = convert_to_json(Path::new(&config.output.dump_path), Path::new(json_path))
            .context("Failed to convert dump to JSON")?;
        tracing::info!("Exported {} posts to {}", count, json_path);
    }

    Ok(())
}

async fn scrape_with_session(
    session: &mut Session<BrowserFetcher>,
    config: &Config,
    credentials: &Credentials,
    posts: Vec<String>,
) -> Result<()> {
    session.login(credentials).await.context("Login failed")?;

    let urls = if posts.is_empty() {
        session
            .list_post_urls(&config.scrape.page_id, config.scrape.scrolls)
            .await
            .context("Failed to list posts")?
            .into_iter()
            .map(String::from)
            .collect()
    } else {
        posts
    };

    if urls.is_empty() {
        bail!("No posts found for page {}", config.scrape.page_id);
    }

    let mut store = open_store(Path::new(&config.output.dump_path));
    let options = ScrapeOptions::from(&config.scrape);
    let report = session.scrape_all(&urls, &mut store, &options).await;

    tracing::info!(
        "Scraped {}/{} posts ({} comments, {} replies) into {}",
        report.scraped,
        report.attempted(),
        report.comments,
        report.replies,
        config.output.dump_path
    );
    for failure in &report.failed {
        tracing::warn!("Not scraped: {} ({})", failure.url, failure.error);
    }

    Ok(())
}
