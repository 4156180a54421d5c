//! Site-Mirror: a rendering-driven website mirroring crawler
//!
//! This crate renders pages with a headless browser, rewrites their DOM so that
//! stylesheets, scripts, images and fonts point at local copies, follows
//! same-site links up to a page budget, and writes a browsable local mirror.

pub mod config;
pub mod crawler;
pub mod output;
pub mod state;
pub mod url;

use std::path::PathBuf;
use thiserror::Error;

/// Main error type for Site-Mirror operations
///
/// Only session-level failures surface through this type. Failures that
/// concern a single page or a single asset are reported through
/// [`RenderError`] and [`FetchError`] and recovered by the crawl loop.
#[derive(Debug, Error)]
pub enum MirrorError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Session setup failed: {0}")]
    SessionFatal(String),

    #[error("Cannot create output directory {path}: {source}")]
    OutputDir {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("URL error: {0}")]
    UrlError(#[from] UrlError),

    #[error("HTTP client error: {0}")]
    Reqwest(#[from] reqwest::Error),

    #[error("Invalid state transition: {from:?} -> {to:?}")]
    InvalidTransition {
        from: state::VisitState,
        to: state::VisitState,
    },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid domain pattern: {0}")]
    InvalidPattern(String),
}

/// URL-specific errors
#[derive(Debug, Error)]
pub enum UrlError {
    #[error("URL is empty")]
    Empty,

    #[error("Failed to parse URL: {0}")]
    Parse(String),

    #[error("Invalid URL scheme: {0}")]
    InvalidScheme(String),

    #[error("Missing domain in URL")]
    MissingDomain,

    #[error("Domain not allowed: {0}")]
    DomainNotAllowed(String),
}

/// Page rendering errors; the affected page is skipped
#[derive(Debug, Error)]
pub enum RenderError {
    #[error("Timed out after {seconds}s waiting for {url}")]
    Timeout { url: String, seconds: u64 },

    #[error("Navigation to {url} failed: {message}")]
    Navigation { url: String, message: String },

    #[error("Browser engine error: {0}")]
    Engine(String),
}

/// Asset download errors; the asset reference is left pointing at the remote URL
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("Downloads of this asset type are disabled")]
    Disabled,

    #[error("Unsupported URL scheme: {0}")]
    UnsupportedScheme(String),

    #[error("File too large: {size} bytes (limit {limit})")]
    TooLarge { size: u64, limit: u64 },

    #[error("Total size limit reached: {total} + {size} bytes exceeds {limit}")]
    TotalLimitReached { total: u64, size: u64, limit: u64 },

    #[error("Unsupported content type: {0:?}")]
    UnsupportedType(String),

    #[error("HTTP status {0}")]
    Status(u16),

    #[error("Transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias for Site-Mirror operations
pub type Result<T> = std::result::Result<T, MirrorError>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

/// Result type alias for URL operations
pub type UrlResult<T> = std::result::Result<T, UrlError>;

// Re-export commonly used types
pub use crate::config::MirrorConfig;
pub use crate::crawler::{mirror, CrawlProgress, MirrorSession, PageRenderer};
pub use crate::state::VisitState;
pub use crate::url::{classify_link, DomainPolicy, LinkClass};
