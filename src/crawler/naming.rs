//! File naming for mirrored content
//!
//! Names are either taken from the URL or derived from the content hash.
//! Identical bytes always produce the identical name, which together with
//! write-once files gives deduplication without any index.

use sha2::{Digest, Sha256};
use url::Url;

/// Longest file name produced, extension included
pub const MAX_FILENAME_LEN: usize = 200;

/// Number of hex characters of the digest kept in content-addressed names
const HASH_PREFIX_LEN: usize = 8;

const FORBIDDEN_CHARS: &[char] = &['<', '>', ':', '"', '/', '\\', '|', '?', '*'];

/// Derives a content-addressed file name
///
/// # Examples
///
/// ```
/// use site_mirror::crawler::content_name;
///
/// let a = content_name(b"body { color: red }", ".css");
/// let b = content_name(b"body { color: red }", ".css");
/// assert_eq!(a, b);
/// assert_eq!(a.len(), 8 + ".css".len());
/// ```
pub fn content_name(bytes: &[u8], extension: &str) -> String {
    let digest = hex::encode(Sha256::digest(bytes));
    format!("{}{}", &digest[..HASH_PREFIX_LEN], extension)
}

/// Makes a file name safe for the local filesystem
///
/// Forbidden path characters become `_`, surrounding whitespace is
/// trimmed, and names longer than [`MAX_FILENAME_LEN`] characters are cut
/// while keeping their extension.
pub fn sanitize_filename(name: &str) -> String {
    let replaced: String = name
        .chars()
        .map(|c| if FORBIDDEN_CHARS.contains(&c) { '_' } else { c })
        .collect();
    let trimmed = replaced.trim();

    if trimmed.chars().count() <= MAX_FILENAME_LEN {
        return trimmed.to_string();
    }

    let (stem, extension) = split_extension(trimmed);
    let keep = MAX_FILENAME_LEN.saturating_sub(extension.chars().count());
    let mut shortened: String = stem.chars().take(keep).collect();
    shortened.push_str(extension);
    shortened
}

/// Splits `name` into stem and extension (with its dot)
///
/// A leading dot does not start an extension, so `.htaccess` has none.
fn split_extension(name: &str) -> (&str, &str) {
    match name.rfind('.') {
        Some(idx) if idx > 0 => name.split_at(idx),
        _ => (name, ""),
    }
}

/// Returns the URL's last path segment if it is usable as a file name
///
/// Usable means non-empty and containing a `.`.
pub fn remote_file_name(url: &Url) -> Option<String> {
    let last = url.path_segments()?.last()?;
    if last.is_empty() || !last.contains('.') {
        return None;
    }
    Some(last.to_string())
}

/// Maps a Content-Type to a file extension
///
/// Parameters such as `; charset=utf-8` are ignored.
pub fn extension_for_content_type(content_type: &str) -> Option<&'static str> {
    let essence = content_type
        .split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_ascii_lowercase();

    let extension = match essence.as_str() {
        "text/css" => ".css",
        "text/javascript" | "application/javascript" => ".js",
        "image/jpeg" | "image/jpg" => ".jpg",
        "image/png" => ".png",
        "image/gif" => ".gif",
        "image/webp" => ".webp",
        "image/svg+xml" => ".svg",
        "image/x-icon" => ".ico",
        "font/woff" | "application/font-woff" => ".woff",
        "font/woff2" | "application/font-woff2" => ".woff2",
        "font/truetype" | "font/ttf" => ".ttf",
        "font/opentype" | "font/otf" => ".otf",
        "application/vnd.ms-fontobject" => ".eot",
        "text/html" => ".html",
        "application/pdf" => ".pdf",
        "text/plain" => ".txt",
        _ => return None,
    };

    Some(extension)
}

/// Extension for an asset whose URL carries no usable name
///
/// Only script, stylesheet, image and font types are accepted; anything
/// else (HTML error pages, JSON, unknown images) returns None.
pub fn asset_extension(content_type: &str) -> Option<&'static str> {
    let lower = content_type.to_ascii_lowercase();

    if lower.contains("javascript") || lower.contains("ecmascript") {
        return Some(".js");
    }
    if lower.contains("css") {
        return Some(".css");
    }
    if lower.starts_with("image/") || lower.contains("font") {
        return extension_for_content_type(&lower);
    }

    None
}

/// Derives the page file name for a URL
///
/// The root path maps to `index.html`; any other path has its slashes
/// trimmed, segments joined with `_`, and `.html` appended unless it
/// already ends in `.html`/`.htm`.
///
/// # Examples
///
/// ```
/// use site_mirror::crawler::page_file_name;
/// use url::Url;
///
/// let url = Url::parse("https://example.com/").unwrap();
/// assert_eq!(page_file_name(&url), "index.html");
///
/// let url = Url::parse("https://example.com/docs/guide/").unwrap();
/// assert_eq!(page_file_name(&url), "docs_guide.html");
/// ```
pub fn page_file_name(url: &Url) -> String {
    let trimmed = url.path().trim_matches('/');
    if trimmed.is_empty() {
        return "index.html".to_string();
    }

    let mut name = trimmed.replace('/', "_");
    let lower = name.to_ascii_lowercase();
    if !lower.ends_with(".html") && !lower.ends_with(".htm") {
        name.push_str(".html");
    }

    sanitize_filename(&name)
}
