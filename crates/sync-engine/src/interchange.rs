//! CSV import and export through the engine.

use crate::engine::SyncEngine;
use crate::error::SyncError;
use record_store_client::{Record, RecordFields};
use tracing::{info, warn};

/// A CSV row that did not become a record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportIssue {
    /// 1-based line the row starts on.
    pub line: usize,
    pub reason: String,
}

/// Outcome of a CSV import. The three lists are disjoint.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ImportReport {
    pub created: Vec<Record>,
    /// Rejected locally: missing or invalid fields.
    pub skipped: Vec<ImportIssue>,
    /// Rejected by the service.
    pub failed: Vec<ImportIssue>,
}

impl ImportReport {
    pub fn is_clean(&self) -> bool {
        self.skipped.is_empty() && self.failed.is_empty()
    }
}

impl SyncEngine {
    /// Create one record per CSV row.
    ///
    /// Ids in the file are ignored; the service assigns new ones. Rows are
    /// created one after another so the service sees them in file order.
    pub async fn import_csv(&self, text: &str) -> ImportReport {
        let mut report = ImportReport::default();

        for row in csv_interchange::decode_rows(text) {
            let name = row.record.name.trim();
            let email = row.record.email.trim();
            if name.is_empty() || email.is_empty() {
                report.skipped.push(ImportIssue {
                    line: row.line,
                    reason: "missing name or email".to_string(),
                });
                continue;
            }

            match self.create(RecordFields::new(name, email)).await {
                Ok(record) => report.created.push(record),
                Err(SyncError::Validation(e)) => report.skipped.push(ImportIssue {
                    line: row.line,
                    reason: e.to_string(),
                }),
                Err(e) => {
                    warn!(line = row.line, error = %e, "Import row rejected by service");
                    report.failed.push(ImportIssue {
                        line: row.line,
                        reason: e.to_string(),
                    });
                }
            }
        }

        info!(
            created = report.created.len(),
            skipped = report.skipped.len(),
            failed = report.failed.len(),
            "CSV import finished"
        );
        report
    }

    /// The whole authoritative set as CSV, in id order.
    pub fn export_csv(&self) -> String {
        csv_interchange::encode(&self.records())
    }
}
