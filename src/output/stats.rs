//! Session statistics and human-readable reporting

use chrono::{DateTime, Utc};
use std::time::Duration;

/// Counters collected by one mirroring session
#[derive(Debug, Clone)]
pub struct MirrorStats {
    /// Seed URL of the session
    pub seed_url: String,

    /// Pages rendered and written
    pub pages_saved: u32,

    /// Pages the renderer could not load
    pub pages_skipped: u32,

    /// Pages that failed after rendering (rewrite or write errors)
    pub pages_failed: u32,

    /// Inline `<style>`/`<script>` blocks extracted to files
    pub inline_extracted: u32,

    /// External references rewritten to local paths
    pub assets_localized: u32,

    /// External references left pointing at the remote URL
    pub assets_left_remote: u32,

    /// Links dropped by the domain policy
    pub links_denied: u32,

    /// New files created under the mirror root (pages included)
    pub files_written: u64,

    /// Bytes of downloaded assets written to disk
    pub bytes_written: u64,

    pub started_at: DateTime<Utc>,
    pub finished_at: Option<DateTime<Utc>>,
}

impl MirrorStats {
    pub fn new(seed_url: impl Into<String>) -> Self {
        Self {
            seed_url: seed_url.into(),
            pages_saved: 0,
            pages_skipped: 0,
            pages_failed: 0,
            inline_extracted: 0,
            assets_localized: 0,
            assets_left_remote: 0,
            links_denied: 0,
            files_written: 0,
            bytes_written: 0,
            started_at: Utc::now(),
            finished_at: None,
        }
    }

    /// Total number of pages taken from the work stack
    pub fn pages_visited(&self) -> u32 {
        self.pages_saved + self.pages_skipped + self.pages_failed
    }

    /// Wall-clock time between start and finish (or now, if still running)
    pub fn duration(&self) -> Duration {
        let end = self.finished_at.unwrap_or_else(Utc::now);
        (end - self.started_at).to_std().unwrap_or_default()
    }

    pub fn finish(&mut self) {
        self.finished_at = Some(Utc::now());
    }

    /// Emits the completion record through `tracing`
    pub fn log_summary(&self) {
        tracing::info!(
            seed = %self.seed_url,
            pages_saved = self.pages_saved,
            pages_skipped = self.pages_skipped,
            pages_failed = self.pages_failed,
            files = self.files_written,
            size = %format_file_size(self.bytes_written),
            duration = %format!("{:.2}s", self.duration().as_secs_f64()),
            "Mirror finished"
        );
    }
}

/// Prints statistics to stdout in a formatted manner
pub fn print_summary(stats: &MirrorStats) {
    println!("=== Mirror Summary ===\n");

    println!("Seed: {}", stats.seed_url);
    println!("Started: {}", stats.started_at.to_rfc3339());
    if let Some(finished) = stats.finished_at {
        println!("Finished: {}", finished.to_rfc3339());
    }
    println!("Duration: {:.2}s", stats.duration().as_secs_f64());
    println!();

    println!("Pages:");
    println!("  Saved: {}", stats.pages_saved);
    println!("  Skipped: {}", stats.pages_skipped);
    println!("  Failed: {}", stats.pages_failed);
    println!();

    println!("Assets:");
    println!("  Inline blocks extracted: {}", stats.inline_extracted);
    println!("  Localized: {}", stats.assets_localized);
    println!("  Left remote: {}", stats.assets_left_remote);
    println!("  Links denied by policy: {}", stats.links_denied);
    println!();

    println!(
        "Files written: {} ({} downloaded)",
        stats.files_written,
        format_file_size(stats.bytes_written)
    );
}

/// Formats a byte count with binary units
///
/// # Examples
///
/// ```
/// use site_mirror::output::format_file_size;
///
/// assert_eq!(format_file_size(0), "0 B");
/// assert_eq!(format_file_size(1536), "1.5 KB");
/// ```
pub fn format_file_size(size_bytes: u64) -> String {
    if size_bytes == 0 {
        return "0 B".to_string();
    }

    const UNITS: [&str; 5] = ["B", "KB", "MB", "GB", "TB"];
    let mut size = size_bytes as f64;
    let mut unit = 0;
    while size >= 1024.0 && unit < UNITS.len() - 1 {
        size /= 1024.0;
        unit += 1;
    }

    format!("{:.1} {}", size, UNITS[unit])
}

/// Renders an ASCII progress bar such as `[=====-----] 50%`
///
/// A zero total renders as complete.
pub fn progress_bar(current: u32, total: u32, width: usize) -> String {
    if total == 0 {
        return format!("[{}] 100%", "=".repeat(width));
    }

    let fraction = (current as f64 / total as f64).min(1.0);
    let filled = (width as f64 * fraction) as usize;
    format!(
        "[{}{}] {}%",
        "=".repeat(filled),
        "-".repeat(width - filled),
        (fraction * 100.0) as u32
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_file_size() {
        assert_eq!(format_file_size(0), "0 B");
        assert_eq!(format_file_size(512), "512.0 B");
        assert_eq!(format_file_size(1024), "1.0 KB");
        assert_eq!(format_file_size(10 * 1024 * 1024), "10.0 MB");
        assert_eq!(format_file_size(3 * 1024 * 1024 * 1024), "3.0 GB");
    }

    #[test]
    fn test_progress_bar() {
        assert_eq!(progress_bar(5, 10, 10), "[=====-----] 50%");
        assert_eq!(progress_bar(10, 10, 4), "[====] 100%");
        assert_eq!(progress_bar(0, 0, 4), "[====] 100%");
        assert_eq!(progress_bar(12, 10, 4), "[====] 100%");
    }

    #[test]
    fn test_pages_visited() {
        let mut stats = MirrorStats::new("https://example.com/");
        stats.pages_saved = 3;
        stats.pages_skipped = 1;
        stats.pages_failed = 2;
        assert_eq!(stats.pages_visited(), 6);
        assert!(stats.finished_at.is_none());

        stats.finish();
        assert!(stats.finished_at.is_some());
    }
}
