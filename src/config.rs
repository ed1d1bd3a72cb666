// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

//! Runtime settings read from the environment (and `.env` via dotenvy).

use anyhow::{Context as _, Result};
use std::env;
use std::path::{Path, PathBuf};

use crate::db;

pub const DEFAULT_BIND: &str = "0.0.0.0:8000";
/// Uploads must be strictly smaller than this many bytes.
pub const DEFAULT_MAX_UPLOAD: usize = 1_500_000;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub db_path: PathBuf,
    pub static_dir: PathBuf,
    pub bind: String,
    pub max_upload: usize,
}

fn var(key: &str) -> Option<String> {
    env::var(key).ok().map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
}

/// Images live in `static/images` next to the database file.
pub fn default_static_dir(db_path: &Path) -> PathBuf {
    db_path
        .parent()
        .unwrap_or_else(|| Path::new("."))
        .join("static")
        .join("images")
}

impl Settings {
    pub fn from_env() -> Result<Self> {
        let db_path = match var("NFTMARKET_DB") {
            Some(p) => PathBuf::from(p),
            None => db::db_path()?,
        };
        let static_dir = var("NFTMARKET_STATIC_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|| default_static_dir(&db_path));
        let bind = var("NFTMARKET_BIND").unwrap_or_else(|| DEFAULT_BIND.to_string());
        let max_upload = match var("NFTMARKET_MAX_UPLOAD") {
            Some(raw) => raw
                .parse::<usize>()
                .with_context(|| format!("Invalid NFTMARKET_MAX_UPLOAD '{}'", raw))?,
            None => DEFAULT_MAX_UPLOAD,
        };
        Ok(Self {
            db_path,
            static_dir,
            bind,
            max_upload,
        })
    }

    /// Point at another database; the image directory follows unless it was
    /// set explicitly.
    pub fn with_db_path(mut self, path: PathBuf) -> Self {
        if var("NFTMARKET_STATIC_DIR").is_none() {
            self.static_dir = default_static_dir(&path);
        }
        self.db_path = path;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn static_dir_sits_next_to_database() {
        let dir = default_static_dir(Path::new("/var/lib/nftmarket/market.sqlite"));
        assert_eq!(dir, PathBuf::from("/var/lib/nftmarket/static/images"));
        let bare = default_static_dir(Path::new("market.sqlite"));
        assert_eq!(bare, PathBuf::from("static/images"));
    }
}
