use serde::Deserialize;
use std::path::PathBuf;
use std::time::Duration;

/// User agent sent with every asset request
pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/91.0.4472.124 Safari/537.36";

/// Main configuration structure for Site-Mirror
///
/// Every section and field has a default, so an empty TOML document is a
/// valid configuration.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct MirrorConfig {
    pub crawler: CrawlerConfig,
    pub downloads: DownloadConfig,
    pub limits: LimitsConfig,
    pub http: HttpConfig,
    pub renderer: RendererConfig,
    pub policy: PolicyConfig,
}

/// Crawl loop behavior
#[derive(Debug, Clone, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct CrawlerConfig {
    /// Maximum number of distinct pages rendered in one session
    pub max_pages: u32,

    /// Pause after each saved page (milliseconds)
    pub delay_ms: u64,

    /// Follow links leaving the seed's domain (subject to the domain policy)
    pub follow_external_links: bool,
}

impl Default for CrawlerConfig {
    fn default() -> Self {
        Self {
            max_pages: 10,
            delay_ms: 1000,
            follow_external_links: false,
        }
    }
}

impl CrawlerConfig {
    pub fn delay(&self) -> Duration {
        Duration::from_millis(self.delay_ms)
    }
}

/// Per-asset-type download switches
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct DownloadConfig {
    pub images: bool,
    pub css: bool,
    pub js: bool,
    pub fonts: bool,
}

impl Default for DownloadConfig {
    fn default() -> Self {
        Self {
            images: true,
            css: true,
            js: true,
            fonts: true,
        }
    }
}

/// Byte budgets for downloaded assets
#[derive(Debug, Clone, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct LimitsConfig {
    /// Largest single asset accepted (bytes)
    pub max_file_size: u64,

    /// Cumulative downloaded bytes per session
    pub max_total_size: u64,
}

impl Default for LimitsConfig {
    fn default() -> Self {
        Self {
            max_file_size: 10 * 1024 * 1024,
            max_total_size: 100 * 1024 * 1024,
        }
    }
}

/// HTTP transport used for asset downloads
#[derive(Debug, Clone, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct HttpConfig {
    pub user_agent: String,

    /// Per-request timeout (seconds)
    pub timeout_secs: u64,

    /// Retries after the first attempt for retryable failures
    pub max_retries: u32,

    /// Base of the exponential backoff between retries (milliseconds)
    pub backoff_ms: u64,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            user_agent: DEFAULT_USER_AGENT.to_string(),
            timeout_secs: 10,
            max_retries: 3,
            backoff_ms: 1000,
        }
    }
}

impl HttpConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

/// Headless browser settings
#[derive(Debug, Clone, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct RendererConfig {
    pub navigation_timeout_secs: u64,

    /// How long to wait for the `<body>` element to appear
    pub element_timeout_secs: u64,

    /// Extra wait after `<body>` appears so deferred resources register
    pub settle_delay_ms: u64,

    pub window_width: u32,
    pub window_height: u32,

    /// Explicit Chrome/Chromium binary; auto-detected when absent
    pub chrome_executable: Option<PathBuf>,
}

impl Default for RendererConfig {
    fn default() -> Self {
        Self {
            navigation_timeout_secs: 30,
            element_timeout_secs: 10,
            settle_delay_ms: 2000,
            window_width: 1920,
            window_height: 1080,
            chrome_executable: None,
        }
    }
}

impl RendererConfig {
    pub fn navigation_timeout(&self) -> Duration {
        Duration::from_secs(self.navigation_timeout_secs)
    }

    pub fn element_timeout(&self) -> Duration {
        Duration::from_secs(self.element_timeout_secs)
    }

    pub fn settle_delay(&self) -> Duration {
        Duration::from_millis(self.settle_delay_ms)
    }
}

/// Domain allow/block lists (substring patterns, case-insensitive)
#[derive(Debug, Clone, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct PolicyConfig {
    pub blocked_domains: Vec<String>,

    /// When non-empty, only hosts containing one of these are allowed
    pub allowed_domains: Vec<String>,
}

impl Default for PolicyConfig {
    fn default() -> Self {
        Self {
            blocked_domains: ["facebook.com", "instagram.com", "twitter.com", "linkedin.com"]
                .iter()
                .map(|d| d.to_string())
                .collect(),
            allowed_domains: Vec::new(),
        }
    }
}
