// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

pub mod balances;
pub mod doctor;
pub mod exporter;
pub mod nfts;
pub mod transactions;
pub mod users;

use anyhow::Result;

use crate::repo::Page;

/// `--offset`/`--limit` of a list subcommand.
pub(crate) fn page_from(m: &clap::ArgMatches) -> Result<Page> {
    let offset = m.get_one::<u32>("offset").copied().unwrap_or(0);
    let limit = m.get_one::<u32>("limit").copied().unwrap_or(Page::MAX_LIMIT);
    Ok(Page::new(offset, limit)?)
}
