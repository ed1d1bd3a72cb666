// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

//! Image storage for minted assets.
//!
//! Files are content-addressed: the stored name is the SHA-256 of the bytes
//! plus the original extension, and the thumbnail is stored next to it as
//! `thumb-<name>`.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use image::imageops::FilterType;
use image::{DynamicImage, ImageFormat};
use sha2::{Digest, Sha256};
use tracing::{debug, warn};

use crate::error::{MarketError, Result};

/// Thumbnails fit inside a square of this many pixels.
pub const THUMBNAIL_SIZE: u32 = 200;
pub const ALLOWED_EXTENSIONS: [&str; 3] = ["png", "jpg", "jpeg"];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredFile {
    pub filename: String,
    pub hashed_name: String,
    pub thumbnail: String,
    /// False when identical content was already on disk; removing such a
    /// file would break the assets that already point at it.
    pub created: bool,
}

pub trait FileStore: Send + Sync {
    /// Persist `bytes` and a thumbnail derived from them.
    fn store(&self, filename: &str, bytes: &[u8]) -> Result<StoredFile>;

    fn read(&self, name: &str) -> Result<Vec<u8>>;

    /// Compensating delete for a `store` whose database row never landed.
    fn remove(&self, stored: &StoredFile) -> Result<()>;

    fn read_base64(&self, name: &str) -> Result<String> {
        Ok(STANDARD.encode(self.read(name)?))
    }
}

/// Lower-cased extension if it is one we accept.
pub fn allowed_extension(filename: &str) -> Result<String> {
    Path::new(filename)
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
        .filter(|e| ALLOWED_EXTENSIONS.contains(&e.as_str()))
        .ok_or_else(|| MarketError::bad_request("File extension not allowed"))
}

pub fn content_hash(bytes: &[u8]) -> String {
    Sha256::digest(bytes)
        .iter()
        .map(|b| format!("{:02x}", b))
        .collect()
}

fn thumbnail_of(img: &DynamicImage) -> DynamicImage {
    if img.width() <= THUMBNAIL_SIZE && img.height() <= THUMBNAIL_SIZE {
        img.clone()
    } else {
        img.resize(THUMBNAIL_SIZE, THUMBNAIL_SIZE, FilterType::Lanczos3)
    }
}

/// Stores files under a single directory on the local filesystem.
#[derive(Debug, Clone)]
pub struct LocalFileStore {
    root: PathBuf,
}

impl LocalFileStore {
    pub fn new(root: impl Into<PathBuf>) -> Result<Self> {
        let root = root.into();
        fs::create_dir_all(&root)?;
        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn path_of(&self, name: &str) -> Result<PathBuf> {
        // stored names never contain separators
        if name.is_empty() || name.contains(['/', '\\']) || name.starts_with('.') {
            return Err(MarketError::not_found("AssetFile", "name", name));
        }
        Ok(self.root.join(name))
    }

    fn remove_quietly(&self, path: &Path) {
        if let Err(e) = fs::remove_file(path) {
            if e.kind() != io::ErrorKind::NotFound {
                warn!(path = %path.display(), error = %e, "could not remove stored file");
            }
        }
    }
}

impl FileStore for LocalFileStore {
    fn store(&self, filename: &str, bytes: &[u8]) -> Result<StoredFile> {
        let ext = allowed_extension(filename)?;
        let img = image::load_from_memory(bytes)
            .map_err(|_| MarketError::bad_request("File is not a valid image"))?;

        let hashed_name = format!("{}.{}", content_hash(bytes), ext);
        let thumbnail = format!("thumb-{}", hashed_name);
        let original_path = self.root.join(&hashed_name);
        let thumb_path = self.root.join(&thumbnail);

        if original_path.exists() && thumb_path.exists() {
            debug!(%hashed_name, "content already stored");
            return Ok(StoredFile {
                filename: filename.to_string(),
                hashed_name,
                thumbnail,
                created: false,
            });
        }

        fs::write(&original_path, bytes)?;

        let format = ImageFormat::from_extension(&ext).unwrap_or(ImageFormat::Png);
        let thumb = match format {
            // jpeg has no alpha channel
            ImageFormat::Jpeg => DynamicImage::ImageRgb8(thumbnail_of(&img).to_rgb8()),
            _ => thumbnail_of(&img),
        };
        if let Err(e) = thumb.save_with_format(&thumb_path, format) {
            self.remove_quietly(&original_path);
            self.remove_quietly(&thumb_path);
            return Err(MarketError::internal_with("Error trying to process the file", e));
        }

        debug!(%hashed_name, %thumbnail, "stored file");
        Ok(StoredFile {
            filename: filename.to_string(),
            hashed_name,
            thumbnail,
            created: true,
        })
    }

    fn read(&self, name: &str) -> Result<Vec<u8>> {
        let path = self.path_of(name)?;
        fs::read(&path).map_err(|e| {
            MarketError::internal_with(format!("Could not read stored file {}", name), e)
        })
    }

    fn remove(&self, stored: &StoredFile) -> Result<()> {
        if !stored.created {
            return Ok(());
        }
        for name in [&stored.hashed_name, &stored.thumbnail] {
            let path = self.path_of(name)?;
            match fs::remove_file(&path) {
                Ok(()) => {}
                Err(e) if e.kind() == io::ErrorKind::NotFound => {}
                Err(e) => return Err(e.into()),
            }
        }
        Ok(())
    }
}
