//! Asset localization for rendered pages
//!
//! Inline `<style>`/`<script>` blocks become content-addressed files, and
//! references to stylesheets, scripts, images and fonts are downloaded and
//! pointed at their local copies. A reference that cannot be localized is
//! left untouched.

use crate::crawler::document::{AssetJob, MirrorDocument};
use crate::crawler::fetcher::{AssetFetcher, TransferCounters};
use crate::crawler::naming::content_name;
use crate::output::AssetKind;
use crate::url::resolve_reference;
use crate::FetchError;
use url::Url;

/// What one page rewrite changed
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RewriteReport {
    pub inline_extracted: u32,
    pub assets_localized: u32,
    pub assets_left_remote: u32,
}

/// Localizes the assets of a document in place
///
/// Inline blocks of enabled kinds are replaced by a `<link>` or
/// `<script src>` element pointing at `css/<hash>.css` / `js/<hash>.js`;
/// a script keeps its `type`.
/// External references are resolved against `page_url` and fetched; on
/// success the attribute is replaced by the relative local path.
///
/// Only I/O errors while writing extracted inline content are returned;
/// download failures are logged and counted in the report.
pub async fn rewrite_assets(
    fetcher: &AssetFetcher,
    document: &mut MirrorDocument,
    page_url: &Url,
    counters: &mut TransferCounters,
) -> std::io::Result<RewriteReport> {
    let mut report = RewriteReport::default();

    for job in document.asset_jobs() {
        match job {
            AssetJob::Inline {
                node,
                kind,
                content,
                script_type,
            } => {
                if !fetcher.is_enabled(kind) {
                    continue;
                }

                let extension = match kind {
                    AssetKind::Js => ".js",
                    _ => ".css",
                };
                let file_name = content_name(content.as_bytes(), extension);
                let local = fetcher
                    .layout()
                    .write_asset(kind, &file_name, content.as_bytes())
                    .await?;
                if local.created {
                    counters.files_written += 1;
                }

                let replacement = match kind {
                    AssetKind::Js => {
                        let mut attrs = vec![("src".to_string(), local.relative_path)];
                        if let Some(script_type) = script_type {
                            attrs.push(("type".to_string(), script_type));
                        }
                        ("script", attrs)
                    }
                    _ => (
                        "link",
                        vec![
                            ("rel".to_string(), "stylesheet".to_string()),
                            ("href".to_string(), local.relative_path),
                        ],
                    ),
                };
                document.replace_with(node, replacement.0, replacement.1);
                report.inline_extracted += 1;
            }
            AssetJob::External {
                node,
                attr,
                reference,
                kind,
            } => {
                if !fetcher.is_enabled(kind) || document.is_replaced(node) {
                    continue;
                }

                let Some(url) = resolve_reference(&reference, page_url) else {
                    tracing::debug!("Ignoring {} reference {:?}", kind, reference);
                    continue;
                };

                match fetcher.fetch(&url, kind, counters).await {
                    Ok(local) => {
                        document.set_attr(node, attr, &local.relative_path);
                        report.assets_localized += 1;
                    }
                    Err(FetchError::Disabled) => {}
                    Err(e) => {
                        tracing::warn!("Keeping remote {} {}: {}", kind, url, e);
                        report.assets_left_remote += 1;
                    }
                }
            }
        }
    }

    Ok(report)
}
