//! On-disk layout of a mirror
//!
//! A mirror root holds the page files directly and one subfolder per asset
//! type. Asset files are write-once: an existing path is reused, never
//! overwritten, which is what makes content-addressed names deduplicate.

use crate::MirrorError;
use std::fmt;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tokio::io::AsyncWriteExt;

/// Type of an external resource referenced by a page
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AssetKind {
    Css,
    Js,
    Image,
    Font,
}

impl AssetKind {
    /// Subfolder of the mirror root holding this asset type
    pub fn folder_name(&self) -> &'static str {
        match self {
            Self::Css => "css",
            Self::Js => "js",
            Self::Image => "images",
            Self::Font => "fonts",
        }
    }

    pub fn all() -> [AssetKind; 4] {
        [Self::Css, Self::Js, Self::Image, Self::Font]
    }
}

impl fmt::Display for AssetKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Css => "css",
            Self::Js => "js",
            Self::Image => "image",
            Self::Font => "font",
        };
        write!(f, "{}", name)
    }
}

/// A file written under the mirror root
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocalFile {
    /// Path relative to the mirror root, always `/`-separated
    pub relative_path: String,

    /// Whether this call created the file (false when it already existed)
    pub created: bool,

    pub size: u64,
}

/// Directory tree of one mirroring session
#[derive(Debug, Clone)]
pub struct OutputLayout {
    root: PathBuf,
}

impl OutputLayout {
    /// Creates the root and all asset subfolders
    ///
    /// # Returns
    ///
    /// * `Ok(OutputLayout)` - All directories exist
    /// * `Err(MirrorError::OutputDir)` - A directory could not be created
    pub fn create(root: impl Into<PathBuf>) -> Result<Self, MirrorError> {
        let layout = Self { root: root.into() };

        let mut folders = vec![layout.root.clone()];
        folders.extend(AssetKind::all().iter().map(|k| layout.folder(*k)));

        for folder in folders {
            std::fs::create_dir_all(&folder).map_err(|source| MirrorError::OutputDir {
                path: folder.clone(),
                source,
            })?;
        }

        Ok(layout)
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn folder(&self, kind: AssetKind) -> PathBuf {
        self.root.join(kind.folder_name())
    }

    /// Writes an asset file unless a file with that name already exists
    pub async fn write_asset(
        &self,
        kind: AssetKind,
        file_name: &str,
        bytes: &[u8],
    ) -> std::io::Result<LocalFile> {
        let path = self.folder(kind).join(file_name);
        let created = write_once(&path, bytes).await?;

        if created {
            tracing::info!("Wrote {} file: {}", kind, path.display());
        } else {
            tracing::debug!("Reusing existing {} file: {}", kind, path.display());
        }

        Ok(LocalFile {
            relative_path: format!("{}/{}", kind.folder_name(), file_name),
            created,
            size: bytes.len() as u64,
        })
    }

    /// Writes a page file at the root, replacing any previous version
    pub async fn write_page(&self, file_name: &str, markup: &str) -> std::io::Result<LocalFile> {
        let path = self.root.join(file_name);
        tokio::fs::write(&path, markup.as_bytes()).await?;

        Ok(LocalFile {
            relative_path: file_name.to_string(),
            created: true,
            size: markup.len() as u64,
        })
    }
}

/// Creates `path` with `bytes`; returns false without writing if it exists
///
/// Uses create-new semantics, so two racing writers of the same
/// content-addressed name cannot clobber each other.
pub async fn write_once(path: &Path, bytes: &[u8]) -> std::io::Result<bool> {
    let open = tokio::fs::OpenOptions::new()
        .write(true)
        .create_new(true)
        .open(path)
        .await;

    match open {
        Ok(mut file) => {
            file.write_all(bytes).await?;
            file.flush().await?;
            Ok(true)
        }
        Err(e) if e.kind() == ErrorKind::AlreadyExists => Ok(false),
        Err(e) => Err(e),
    }
}
