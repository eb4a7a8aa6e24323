//! CLI command implementations.

mod interchange;
mod records;
mod watch;

pub use interchange::{records_export, records_import};
pub use records::{
    records_bulk_delete, records_create, records_delete, records_list, records_show,
    records_update, ListArgs,
};
pub use watch::records_watch;
