//! Derives the on-screen slice of the record set.
//!
//! [`project`] filters by a case-insensitive query over name and email,
//! sorts with a natural (case-insensitive, numeric-aware) collation, and
//! paginates with the requested page clamped into range. It holds no state,
//! so the same record set and [`ViewState`] always give the same
//! [`Projection`].

mod collate;
mod project;
mod view;

pub use collate::natural_cmp;
pub use project::{filtered, project, Projection};
pub use view::{ParseViewError, SortDirection, SortKey, ViewState, DEFAULT_PAGE_SIZE};
