// SPDX-FileCopyrightText: 2025 Caspar Water Company
//
// SPDX-License-Identifier: Apache-2.0

use std::ops::Range;

pub const PAGE_SIZE: usize = 20;

/// Total pages for `rows`; an empty result still has one page.
pub fn total_pages(rows: usize) -> usize {
    rows.div_ceil(PAGE_SIZE).max(1)
}

/// One-based page cursor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pager {
    page: usize,
}

impl Default for Pager {
    fn default() -> Self {
        Self { page: 1 }
    }
}

impl Pager {
    pub fn page(&self) -> usize {
        self.page
    }

    pub fn reset(&mut self) {
        self.page = 1;
    }

    /// Pull the cursor back inside `[1, total_pages(rows)]`.
    pub fn clamp(&mut self, rows: usize) {
        self.page = self.page.clamp(1, total_pages(rows));
    }

    /// Advance one page. Returns false, changing nothing, on the last page.
    pub fn next(&mut self, rows: usize) -> bool {
        if self.page >= total_pages(rows) {
            return false;
        }
        self.page += 1;
        true
    }

    /// Go back one page. Returns false, changing nothing, on the first page.
    pub fn prev(&mut self) -> bool {
        if self.page <= 1 {
            return false;
        }
        self.page -= 1;
        true
    }

    /// Row range of the current page.
    pub fn range(&self, rows: usize) -> Range<usize> {
        let start = ((self.page - 1) * PAGE_SIZE).min(rows);
        start..(start + PAGE_SIZE).min(rows)
    }
}
