//! Mirroring session: the crawl loop
//!
//! A session owns everything one mirroring run touches: the renderer, the
//! asset fetcher, the visited map and the counters. Pages are visited
//! depth-first from an explicit work stack, one at a time, until the page
//! budget is spent or no followable links remain.

use crate::config::{validate, MirrorConfig};
use crate::crawler::document::MirrorDocument;
use crate::crawler::fetcher::{AssetFetcher, TransferCounters};
use crate::crawler::naming::page_file_name;
use crate::crawler::renderer::{ChromeRenderer, PageRenderer};
use crate::crawler::rewriter::rewrite_assets;
use crate::output::{MirrorStats, OutputLayout};
use crate::state::VisitState;
use crate::url::{extract_netloc, resolve_reference, validate_seed_url, DomainPolicy};
use crate::MirrorError;
use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use url::Url;

/// Snapshot handed to the progress callback when a page is started
///
/// `total_pages` is the page budget, not an estimate of the site size.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CrawlProgress {
    pub current_page: u32,
    pub total_pages: u32,
}

impl CrawlProgress {
    /// Share of the page budget consumed, in percent
    pub fn percent(&self) -> f64 {
        if self.total_pages == 0 {
            return 100.0;
        }
        (self.current_page as f64 / self.total_pages as f64 * 100.0).min(100.0)
    }
}

type ProgressCallback = Box<dyn Fn(CrawlProgress) + Send + Sync>;

/// One mirroring run of a single seed URL
///
/// # Lifecycle
///
/// ```no_run
/// use site_mirror::{MirrorConfig, MirrorSession};
///
/// # async fn run() -> site_mirror::Result<()> {
/// let mut session = MirrorSession::launch(MirrorConfig::default(), "mirror").await?;
/// session.set_progress_callback(|p| println!("{}/{}", p.current_page, p.total_pages));
/// let result = session.start("https://example.com/").await;
/// session.shutdown().await;
/// result?;
/// println!("{} files, {} bytes", session.files_written(), session.bytes_written());
/// # Ok(())
/// # }
/// ```
pub struct MirrorSession {
    config: MirrorConfig,
    renderer: Box<dyn PageRenderer>,
    fetcher: AssetFetcher,
    policy: DomainPolicy,
    visited: HashMap<String, VisitState>,
    base_domain: Option<String>,
    current_page: u32,
    counters: TransferCounters,
    progress: Option<ProgressCallback>,
    stats: MirrorStats,
}

impl MirrorSession {
    /// Validates `config`, creates the output tree and starts headless Chrome
    ///
    /// Fails with `SessionFatal` when the browser cannot be started and
    /// `OutputDir` when the directories cannot be created.
    pub async fn launch(
        config: MirrorConfig,
        output_dir: impl Into<PathBuf>,
    ) -> Result<Self, MirrorError> {
        validate(&config)?;
        let layout = OutputLayout::create(output_dir)?;
        let renderer = ChromeRenderer::launch(&config).await?;
        Self::assemble(config, layout, Box::new(renderer))
    }

    /// Builds a session around a caller-supplied renderer
    pub fn with_renderer(
        config: MirrorConfig,
        output_dir: impl Into<PathBuf>,
        renderer: Box<dyn PageRenderer>,
    ) -> Result<Self, MirrorError> {
        validate(&config)?;
        let layout = OutputLayout::create(output_dir)?;
        Self::assemble(config, layout, renderer)
    }

    fn assemble(
        config: MirrorConfig,
        layout: OutputLayout,
        renderer: Box<dyn PageRenderer>,
    ) -> Result<Self, MirrorError> {
        let fetcher = AssetFetcher::new(&config, layout)?;
        let policy = DomainPolicy::from_config(&config.policy);

        Ok(Self {
            config,
            renderer,
            fetcher,
            policy,
            visited: HashMap::new(),
            base_domain: None,
            current_page: 0,
            counters: TransferCounters::default(),
            progress: None,
            stats: MirrorStats::new(""),
        })
    }

    /// Registers a callback invoked each time a page is started
    pub fn set_progress_callback<F>(&mut self, callback: F)
    where
        F: Fn(CrawlProgress) + Send + Sync + 'static,
    {
        self.progress = Some(Box::new(callback));
    }

    /// Mirrors the site reachable from `seed`
    ///
    /// Returns an error only when the seed itself is invalid or denied by
    /// the domain policy; page and asset failures are logged and counted.
    pub async fn start(&mut self, seed: &str) -> Result<(), MirrorError> {
        let seed = validate_seed_url(seed, &self.policy)?;
        self.stats = MirrorStats::new(seed.as_str());

        tracing::info!(
            "Mirroring {} into {} (budget {} pages)",
            seed,
            self.output_root().display(),
            self.config.crawler.max_pages
        );

        let mut stack = vec![seed];
        while let Some(url) = stack.pop() {
            if self.budget_exhausted() {
                tracing::debug!("Page budget exhausted with {} URLs pending", stack.len() + 1);
                break;
            }

            let links = self.scrape_page(&url).await;
            // Reverse so the first link on the page is visited next
            stack.extend(links.into_iter().rev());
        }

        self.sync_stats();
        self.stats.finish();
        self.stats.log_summary();

        Ok(())
    }

    /// Visits one URL and returns the followable links it contains
    ///
    /// A no-op returning no links when the URL was already visited or the
    /// page budget is spent. Never fails: render errors mark the page
    /// Skipped, any other error marks it Failed.
    pub async fn scrape_page(&mut self, url: &Url) -> Vec<Url> {
        let mut url = url.clone();
        url.set_fragment(None);
        let key = url.to_string();

        if self.state_of(&key).is_visited() || self.budget_exhausted() {
            return Vec::new();
        }

        if self.base_domain.is_none() {
            self.base_domain = extract_netloc(&url);
        }

        self.advance(&key, VisitState::Visiting);
        self.current_page += 1;
        self.emit_progress();
        tracing::info!(
            "[{}/{}] Mirroring {}",
            self.current_page,
            self.config.crawler.max_pages,
            url
        );

        let markup = match self.renderer.render(&url).await {
            Ok(markup) => markup,
            Err(e) => {
                tracing::warn!("Skipping {}: {}", url, e);
                self.advance(&key, VisitState::Skipped);
                self.stats.pages_skipped += 1;
                return Vec::new();
            }
        };

        let document = match self.save_page(&url, markup).await {
            Ok(document) => document,
            Err(e) => {
                tracing::error!("Failed to mirror {}: {}", url, e);
                self.advance(&key, VisitState::Failed);
                self.stats.pages_failed += 1;
                self.sync_stats();
                return Vec::new();
            }
        };

        self.advance(&key, VisitState::Saved);
        self.stats.pages_saved += 1;
        self.sync_stats();

        tokio::time::sleep(self.config.crawler.delay()).await;

        if self.budget_exhausted() {
            return Vec::new();
        }

        self.discover_links(&document, &url)
    }

    /// Rewrites the page's assets and writes the result under the root
    async fn save_page(&mut self, url: &Url, markup: String) -> Result<MirrorDocument, MirrorError> {
        let mut document = MirrorDocument::new(markup);

        let report = rewrite_assets(&self.fetcher, &mut document, url, &mut self.counters).await?;
        self.stats.inline_extracted += report.inline_extracted;
        self.stats.assets_localized += report.assets_localized;
        self.stats.assets_left_remote += report.assets_left_remote;

        let file_name = page_file_name(url);
        let local = self
            .fetcher
            .layout()
            .write_page(&file_name, &document.to_html())
            .await?;
        self.counters.files_written += 1;

        tracing::info!("Saved {} as {}", url, local.relative_path);
        Ok(document)
    }

    fn discover_links(&mut self, document: &MirrorDocument, page_url: &Url) -> Vec<Url> {
        let base_domain = self.base_domain.clone().unwrap_or_default();
        let follow_external = self.config.crawler.follow_external_links;

        let mut seen = HashSet::new();
        let mut links = Vec::new();

        for href in document.link_targets() {
            let Some(link) = resolve_reference(&href, page_url) else {
                continue;
            };

            if !self
                .policy
                .classify_link(&link, &base_domain, follow_external)
                .should_follow()
            {
                tracing::debug!("Not following {}", link);
                self.stats.links_denied += 1;
                continue;
            }

            let key = link.to_string();
            if !self.state_of(&key).is_visited() && seen.insert(key) {
                links.push(link);
            }
        }

        links
    }

    fn advance(&mut self, key: &str, next: VisitState) {
        match self.state_of(key).transition(next) {
            Ok(state) => {
                self.visited.insert(key.to_string(), state);
            }
            Err(e) => tracing::error!("{} for {}", e, key),
        }
    }

    fn state_of(&self, key: &str) -> VisitState {
        self.visited
            .get(key)
            .copied()
            .unwrap_or(VisitState::Unvisited)
    }

    fn budget_exhausted(&self) -> bool {
        self.current_page >= self.config.crawler.max_pages
    }

    fn emit_progress(&self) {
        if let Some(callback) = &self.progress {
            callback(CrawlProgress {
                current_page: self.current_page,
                total_pages: self.config.crawler.max_pages,
            });
        }
    }

    fn sync_stats(&mut self) {
        self.stats.files_written = self.counters.files_written;
        self.stats.bytes_written = self.counters.bytes_written;
    }

    /// Current state of `url` (fragment ignored)
    pub fn visit_state(&self, url: &Url) -> VisitState {
        let mut url = url.clone();
        url.set_fragment(None);
        self.state_of(url.as_str())
    }

    /// Number of pages taken from the work stack so far
    pub fn pages_visited(&self) -> u32 {
        self.current_page
    }

    /// Netloc of the first visited page
    pub fn base_domain(&self) -> Option<&str> {
        self.base_domain.as_deref()
    }

    pub fn output_root(&self) -> &Path {
        self.fetcher.layout().root()
    }

    pub fn files_written(&self) -> u64 {
        self.counters.files_written
    }

    pub fn bytes_written(&self) -> u64 {
        self.counters.bytes_written
    }

    pub fn stats(&self) -> &MirrorStats {
        &self.stats
    }

    /// Releases the renderer; safe to call more than once
    pub async fn shutdown(&mut self) {
        self.renderer.shutdown().await;
    }
}
