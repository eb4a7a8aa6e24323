//! Caller-owned view parameters.

use crate::project::Projection;
use record_store_client::{Record, RecordId};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Rows per page when the caller does not say.
pub const DEFAULT_PAGE_SIZE: usize = 10;

/// Column the rows are ordered by.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortKey {
    #[default]
    Id,
    Name,
    Email,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    #[default]
    Asc,
    Desc,
}

impl SortDirection {
    pub fn flipped(self) -> Self {
        match self {
            SortDirection::Asc => SortDirection::Desc,
            SortDirection::Desc => SortDirection::Asc,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Unknown {kind}: {value}")]
pub struct ParseViewError {
    kind: &'static str,
    value: String,
}

impl FromStr for SortKey {
    type Err = ParseViewError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "id" => Ok(SortKey::Id),
            "name" => Ok(SortKey::Name),
            "email" => Ok(SortKey::Email),
            _ => Err(ParseViewError {
                kind: "sort key",
                value: s.to_string(),
            }),
        }
    }
}

impl fmt::Display for SortKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SortKey::Id => f.write_str("id"),
            SortKey::Name => f.write_str("name"),
            SortKey::Email => f.write_str("email"),
        }
    }
}

impl FromStr for SortDirection {
    type Err = ParseViewError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "asc" => Ok(SortDirection::Asc),
            "desc" => Ok(SortDirection::Desc),
            _ => Err(ParseViewError {
                kind: "sort direction",
                value: s.to_string(),
            }),
        }
    }
}

impl fmt::Display for SortDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SortDirection::Asc => f.write_str("asc"),
            SortDirection::Desc => f.write_str("desc"),
        }
    }
}

/// Everything the caller controls about what is on screen.
///
/// `page` is 1-based and may be out of range; projection clamps it.
/// A `page_size` of 0 is treated as 1.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ViewState {
    pub query: String,
    pub sort_key: SortKey,
    pub direction: SortDirection,
    pub page: usize,
    pub page_size: usize,
    pub selected_ids: BTreeSet<RecordId>,
}

impl Default for ViewState {
    fn default() -> Self {
        Self {
            query: String::new(),
            sort_key: SortKey::default(),
            direction: SortDirection::default(),
            page: 1,
            page_size: DEFAULT_PAGE_SIZE,
            selected_ids: BTreeSet::new(),
        }
    }
}

impl ViewState {
    /// New query; jumps back to the first page.
    pub fn set_query(&mut self, query: impl Into<String>) {
        self.query = query.into();
        self.page = 1;
    }

    /// Sort by `key`. Picking the current key again flips the direction.
    pub fn sort_by(&mut self, key: SortKey) {
        if self.sort_key == key {
            self.direction = self.direction.flipped();
        } else {
            self.sort_key = key;
            self.direction = SortDirection::Asc;
        }
    }

    pub fn is_selected(&self, id: RecordId) -> bool {
        self.selected_ids.contains(&id)
    }

    /// Flip one id in or out of the selection. Returns whether it is now selected.
    pub fn toggle_selected(&mut self, id: RecordId) -> bool {
        if self.selected_ids.remove(&id) {
            false
        } else {
            self.selected_ids.insert(id);
            true
        }
    }

    /// Select every row on the page, or clear them all if they already are.
    pub fn toggle_page_selection(&mut self, projection: &Projection) {
        if projection.all_on_page_selected {
            for record in &projection.rows {
                self.selected_ids.remove(&record.id);
            }
        } else {
            self.selected_ids
                .extend(projection.rows.iter().map(|record| record.id));
        }
    }

    pub fn clear_selection(&mut self) {
        self.selected_ids.clear();
    }

    /// Drop selected ids that are no longer among `records`.
    pub fn retain_existing<'a>(&mut self, records: impl IntoIterator<Item = &'a Record>) {
        let existing: BTreeSet<RecordId> = records.into_iter().map(|record| record.id).collect();
        self.selected_ids.retain(|id| existing.contains(id));
    }

    pub(crate) fn effective_page_size(&self) -> usize {
        self.page_size.max(1)
    }
}
