//! Site-Mirror main entry point
//!
//! This is the command-line interface for the Site-Mirror website mirroring crawler.

use clap::Parser;
use site_mirror::config::{load_config_with_hash, validate, MirrorConfig};
use site_mirror::output::{format_file_size, print_summary, progress_bar};
use site_mirror::url::{validate_seed_url, DomainPolicy};
use site_mirror::MirrorSession;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// Width of the progress bar printed for each page
const PROGRESS_WIDTH: usize = 30;

/// Site-Mirror: a rendering-driven website mirroring crawler
///
/// Site-Mirror renders pages in headless Chrome, downloads their stylesheets,
/// scripts, images and fonts, rewrites the markup to use the local copies
/// and follows same-site links until the page budget is spent.
#[derive(Parser, Debug)]
#[command(name = "site-mirror")]
#[command(version = "1.0.0")]
#[command(about = "Mirror a website into a browsable local copy", long_about = None)]
struct Cli {
    /// URL of the first page to mirror
    #[arg(value_name = "URL")]
    url: String,

    /// Path to TOML configuration file
    #[arg(short, long, value_name = "CONFIG")]
    config: Option<PathBuf>,

    /// Directory the mirror is written to
    #[arg(short, long, value_name = "DIR", default_value = "mirror")]
    output: PathBuf,

    /// Maximum number of pages to render
    #[arg(long, value_name = "N")]
    max_pages: Option<u32>,

    /// Leave images remote
    #[arg(long)]
    no_images: bool,

    /// Leave stylesheets remote and inline styles in place
    #[arg(long)]
    no_css: bool,

    /// Leave scripts remote and inline scripts in place
    #[arg(long)]
    no_js: bool,

    /// Leave fonts remote
    #[arg(long)]
    no_fonts: bool,

    /// Follow links to other hosts (subject to the domain policy)
    #[arg(long)]
    follow_external: bool,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,

    /// Validate config and seed and show what would be mirrored without starting a browser
    #[arg(long)]
    dry_run: bool,
}

impl Cli {
    /// Applies command-line overrides on top of the file configuration
    fn apply_overrides(&self, config: &mut MirrorConfig) {
        if let Some(max_pages) = self.max_pages {
            config.crawler.max_pages = max_pages;
        }
        if self.follow_external {
            config.crawler.follow_external_links = true;
        }
        if self.no_images {
            config.downloads.images = false;
        }
        if self.no_css {
            config.downloads.css = false;
        }
        if self.no_js {
            config.downloads.js = false;
        }
        if self.no_fonts {
            config.downloads.fonts = false;
        }
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Setup logging based on verbosity
    setup_logging(cli.verbose, cli.quiet);

    let mut config = match &cli.config {
        Some(path) => {
            tracing::info!("Loading configuration from: {}", path.display());
            match load_config_with_hash(path) {
                Ok((cfg, hash)) => {
                    tracing::info!("Configuration loaded successfully (hash: {})", hash);
                    cfg
                }
                Err(e) => {
                    tracing::error!("Failed to load configuration: {}", e);
                    return Err(e.into());
                }
            }
        }
        None => MirrorConfig::default(),
    };

    cli.apply_overrides(&mut config);
    validate(&config)?;

    if cli.dry_run {
        handle_dry_run(&cli, &config)?;
    } else {
        handle_mirror(&cli, config).await?;
    }

    Ok(())
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("site_mirror=info,warn"),
            1 => EnvFilter::new("site_mirror=debug,info"),
            2 => EnvFilter::new("site_mirror=trace,debug"),
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

/// Handles the --dry-run mode: validates the seed and shows the effective settings
fn handle_dry_run(cli: &Cli, config: &MirrorConfig) -> Result<(), Box<dyn std::error::Error>> {
    let policy = DomainPolicy::from_config(&config.policy);
    let seed = validate_seed_url(&cli.url, &policy)?;

    println!("=== Site-Mirror Dry Run ===\n");

    println!("Seed: {}", seed);
    println!("Output: {}", cli.output.display());

    println!("\nCrawler:");
    println!("  Max pages: {}", config.crawler.max_pages);
    println!("  Delay: {}ms", config.crawler.delay_ms);
    println!("  Follow external links: {}", config.crawler.follow_external_links);

    println!("\nDownloads:");
    println!("  Images: {}", config.downloads.images);
    println!("  CSS: {}", config.downloads.css);
    println!("  JS: {}", config.downloads.js);
    println!("  Fonts: {}", config.downloads.fonts);

    println!("\nLimits:");
    println!("  Per file: {}", format_file_size(config.limits.max_file_size));
    println!("  Per session: {}", format_file_size(config.limits.max_total_size));

    println!("\nBlocked domains ({}):", config.policy.blocked_domains.len());
    for domain in &config.policy.blocked_domains {
        println!("  - {}", domain);
    }
    if !config.policy.allowed_domains.is_empty() {
        println!("\nAllowed domains ({}):", config.policy.allowed_domains.len());
        for domain in &config.policy.allowed_domains {
            println!("  - {}", domain);
        }
    }

    println!("\n✓ Configuration is valid");
    println!("✓ Would mirror up to {} pages from {}", config.crawler.max_pages, seed);

    Ok(())
}

/// Handles the main mirroring operation
async fn handle_mirror(cli: &Cli, config: MirrorConfig) -> Result<(), Box<dyn std::error::Error>> {
    let mut session = MirrorSession::launch(config, &cli.output).await?;

    let quiet = cli.quiet;
    session.set_progress_callback(move |progress| {
        if !quiet {
            eprintln!(
                "{} page {}/{}",
                progress_bar(progress.current_page, progress.total_pages, PROGRESS_WIDTH),
                progress.current_page,
                progress.total_pages
            );
        }
    });

    // The browser is released whether or not the crawl succeeded
    let result = session.start(&cli.url).await;
    session.shutdown().await;

    match result {
        Ok(()) => {
            if !cli.quiet {
                println!();
                print_summary(session.stats());
            }
            Ok(())
        }
        Err(e) => {
            tracing::error!("Mirror failed: {}", e);
            Err(e.into())
        }
    }
}
