// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

//! Acting identity for one unit of work.
//!
//! There is no real authentication layer: the caller says who they are and
//! the context carries that through every repository write so rows can be
//! stamped. It is always passed by reference, never stored globally.

use chrono::{DateTime, Utc};

use crate::models::Audit;

pub const DEFAULT_USER: &str = "default-user";
pub const DEFAULT_IP: &str = "127.0.0.1";
pub const SYSTEM_USER: &str = "root";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Context {
    pub username: String,
    pub system_date: DateTime<Utc>,
    pub user_ip: String,
}

impl Context {
    pub fn new(username: impl Into<String>, system_date: DateTime<Utc>, user_ip: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            system_date,
            user_ip: user_ip.into(),
        }
    }

    pub fn default_context() -> Self {
        Self::new(DEFAULT_USER, Utc::now(), DEFAULT_IP)
    }

    /// Context used by the bootstrap seeding.
    pub fn system() -> Self {
        Self::new(SYSTEM_USER, Utc::now(), DEFAULT_IP)
    }

    /// Switch the acting identity. Stands in for a login.
    pub fn impersonate(&mut self, username: impl Into<String>) {
        self.username = username.into();
    }

    /// Audit columns for a row created in this context.
    pub fn stamp(&self) -> Audit {
        Audit {
            created_by: self.username.clone(),
            created_at: self.system_date,
            modified_by: self.username.clone(),
            modified_at: self.system_date,
            version: 1,
        }
    }
}

impl Default for Context {
    fn default() -> Self {
        Self::default_context()
    }
}
