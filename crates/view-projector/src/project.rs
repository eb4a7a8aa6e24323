//! The projection itself.

use crate::collate::natural_cmp;
use crate::view::{SortDirection, SortKey, ViewState};
use record_store_client::Record;
use serde::Serialize;
use std::cmp::Ordering;

/// The slice of records on screen, plus what the pager and the header
/// checkbox need to know.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Projection {
    pub rows: Vec<Record>,
    /// Records matching the query, across all pages.
    pub total_count: usize,
    /// Always at least 1.
    pub page_count: usize,
    /// The requested page clamped into `1..=page_count`.
    pub page: usize,
    pub selected_on_page: usize,
    /// False on an empty page.
    pub all_on_page_selected: bool,
}

/// Derive what is on screen from the record set and the view.
///
/// Pure: the same inputs always give the same output, whatever order
/// `records` arrives in.
pub fn project<'a>(records: impl IntoIterator<Item = &'a Record>, view: &ViewState) -> Projection {
    let matching = filtered(records, view);

    let page_size = view.effective_page_size();
    let total_count = matching.len();
    let page_count = total_count.div_ceil(page_size).max(1);
    let page = view.page.clamp(1, page_count);

    let rows: Vec<Record> = matching
        .into_iter()
        .skip((page - 1) * page_size)
        .take(page_size)
        .collect();
    let selected_on_page = rows.iter().filter(|r| view.is_selected(r.id)).count();
    let all_on_page_selected = !rows.is_empty() && selected_on_page == rows.len();

    Projection {
        rows,
        total_count,
        page_count,
        page,
        selected_on_page,
        all_on_page_selected,
    }
}

/// Every record matching the query, in view order, ignoring pagination.
pub fn filtered<'a>(records: impl IntoIterator<Item = &'a Record>, view: &ViewState) -> Vec<Record> {
    let needle = view.query.trim().to_lowercase();
    let mut matching: Vec<Record> = records
        .into_iter()
        .filter(|record| matches_query(record, &needle))
        .cloned()
        .collect();

    matching.sort_by(|a, b| {
        let ordering = compare(a, b, view.sort_key);
        match view.direction {
            SortDirection::Asc => ordering,
            SortDirection::Desc => ordering.reverse(),
        }
    });
    matching
}

fn matches_query(record: &Record, needle: &str) -> bool {
    needle.is_empty()
        || record.name.to_lowercase().contains(needle)
        || record.email.to_lowercase().contains(needle)
}

/// Total order: the chosen column first, then id.
fn compare(a: &Record, b: &Record, key: SortKey) -> Ordering {
    let primary = match key {
        SortKey::Id => Ordering::Equal,
        SortKey::Name => natural_cmp(&a.name, &b.name),
        SortKey::Email => natural_cmp(&a.email, &b.email),
    };
    primary.then_with(|| a.id.cmp(&b.id))
}
