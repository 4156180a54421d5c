//! Crawler module for rendering and mirroring pages
//!
//! This module contains the core mirroring logic, including:
//! - Asset downloads with retry logic and size caps
//! - Content-addressed file naming
//! - Headless page rendering
//! - DOM rewriting to local asset paths
//! - The depth-first crawl session

mod document;
mod fetcher;
mod naming;
mod renderer;
mod rewriter;
mod session;

pub use document::{AssetJob, MirrorDocument};
pub use fetcher::{
    backoff_delay, build_http_client, is_retryable_status, AssetFetcher, TransferCounters,
};
pub use naming::{
    asset_extension, content_name, extension_for_content_type, page_file_name, remote_file_name,
    sanitize_filename, MAX_FILENAME_LEN,
};
pub use renderer::{ChromeRenderer, PageRenderer};
pub use rewriter::{rewrite_assets, RewriteReport};
pub use session::{CrawlProgress, MirrorSession};

use crate::config::MirrorConfig;
use crate::output::MirrorStats;
use crate::MirrorError;
use std::path::PathBuf;

/// Runs a complete mirroring session
///
/// This is the main entry point for mirroring a site. It will:
/// 1. Validate the configuration and create the output tree
/// 2. Launch the headless browser
/// 3. Crawl from `seed` until the page budget is spent
/// 4. Release the browser, whether the crawl succeeded or not
///
/// # Returns
///
/// * `Ok(MirrorStats)` - Statistics of the finished session
/// * `Err(MirrorError)` - Session setup failed or the seed was rejected
pub async fn mirror(
    config: MirrorConfig,
    output_dir: impl Into<PathBuf>,
    seed: &str,
) -> Result<MirrorStats, MirrorError> {
    let mut session = MirrorSession::launch(config, output_dir).await?;
    let result = session.start(seed).await;
    session.shutdown().await;
    result.map(|()| session.stats().clone())
}
