//! Time-boxed undo for single-record deletes.

use crate::clock::Clock;
use chrono::{DateTime, Duration, Utc};
use record_store_client::{Record, RecordId};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::debug;

/// Default length of the undo window.
pub const DEFAULT_UNDO_WINDOW_SECS: i64 = 4;

/// Handle to a deleted record that can still be restored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UndoToken {
    serial: u64,
    record_id: RecordId,
    expires_at: DateTime<Utc>,
}

impl UndoToken {
    pub fn record_id(&self) -> RecordId {
        self.record_id
    }

    pub fn expires_at(&self) -> DateTime<Utc> {
        self.expires_at
    }
}

#[derive(Debug)]
struct UndoEntry {
    serial: u64,
    record: Record,
    expires_at: DateTime<Utc>,
}

/// Holds at most one live undo entry per record id.
///
/// A token is redeemable while `now < expires_at`. Each entry leaves the
/// manager exactly once: through `redo`, `invalidate`, or `tick`.
pub struct UndoManager {
    window: Duration,
    clock: Arc<dyn Clock>,
    entries: HashMap<RecordId, UndoEntry>,
    next_serial: u64,
}

impl UndoManager {
    pub fn new(window: Duration, clock: Arc<dyn Clock>) -> Self {
        Self {
            window,
            clock,
            entries: HashMap::new(),
            next_serial: 1,
        }
    }

    pub fn window(&self) -> Duration {
        self.window
    }

    /// Remember `record` so it can be restored until the window closes.
    ///
    /// Capturing the same id again replaces the previous entry and
    /// supersedes its token.
    pub fn capture_for_undo(&mut self, record: Record) -> UndoToken {
        let serial = self.next_serial;
        self.next_serial += 1;
        let expires_at = self
            .clock
            .now()
            .checked_add_signed(self.window)
            .unwrap_or(DateTime::<Utc>::MAX_UTC);
        let token = UndoToken {
            serial,
            record_id: record.id,
            expires_at,
        };
        debug!(record_id = record.id, %expires_at, "Captured record for undo");
        self.entries.insert(
            record.id,
            UndoEntry {
                serial,
                record,
                expires_at,
            },
        );
        token
    }

    /// Replace the record held for `id`, keeping its token and expiry.
    ///
    /// Returns `false` when nothing is held for `id`.
    pub fn refresh(&mut self, id: RecordId, record: Record) -> bool {
        match self.entries.get_mut(&id) {
            Some(entry) => {
                entry.record = record;
                true
            }
            None => false,
        }
    }

    /// Consume `token` and hand back the captured record.
    ///
    /// Returns `None` when the token was already consumed, superseded,
    /// invalidated, or has expired. An expired entry is discarded here.
    pub fn redo(&mut self, token: &UndoToken) -> Option<Record> {
        let entry = self.entries.get(&token.record_id)?;
        if entry.serial != token.serial {
            return None;
        }
        let live = self.clock.now() < entry.expires_at;
        let entry = self.entries.remove(&token.record_id)?;
        if live {
            Some(entry.record)
        } else {
            debug!(record_id = token.record_id, "Undo token expired");
            None
        }
    }

    /// Whether `token` would still be honored right now.
    pub fn is_live(&self, token: &UndoToken) -> bool {
        self.entries
            .get(&token.record_id)
            .is_some_and(|entry| entry.serial == token.serial && self.clock.now() < entry.expires_at)
    }

    /// Drop the entry behind `token`, if it is still the current one.
    pub fn invalidate(&mut self, token: &UndoToken) -> bool {
        match self.entries.get(&token.record_id) {
            Some(entry) if entry.serial == token.serial => {
                self.entries.remove(&token.record_id);
                true
            }
            _ => false,
        }
    }

    /// Discard every expired entry and return the records they held.
    ///
    /// Calling this again without the clock moving returns nothing.
    pub fn tick(&mut self) -> Vec<Record> {
        let now = self.clock.now();
        let expired: Vec<RecordId> = self
            .entries
            .iter()
            .filter(|(_, entry)| now >= entry.expires_at)
            .map(|(id, _)| *id)
            .collect();

        let mut records: Vec<Record> = expired
            .into_iter()
            .filter_map(|id| self.entries.remove(&id))
            .map(|entry| entry.record)
            .collect();
        records.sort_by_key(|record| record.id);
        records
    }

    /// Number of entries not yet consumed or swept.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl std::fmt::Debug for UndoManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UndoManager")
            .field("window", &self.window)
            .field("entries", &self.entries.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;

    fn manager() -> (UndoManager, Arc<ManualClock>) {
        let clock = Arc::new(ManualClock::starting_now());
        let manager = UndoManager::new(Duration::seconds(DEFAULT_UNDO_WINDOW_SECS), clock.clone());
        (manager, clock)
    }

    fn ann() -> Record {
        Record::new(1, "Ann", "ann@x.com")
    }

    #[test]
    fn redo_inside_window_returns_record_once() {
        let (mut undo, clock) = manager();
        let token = undo.capture_for_undo(ann());

        clock.advance(Duration::seconds(3));
        assert_eq!(undo.redo(&token), Some(ann()));
        assert_eq!(undo.redo(&token), None);
        assert!(undo.is_empty());
    }

    #[test]
    fn redo_at_or_after_expiry_fails() {
        let (mut undo, clock) = manager();
        let token = undo.capture_for_undo(ann());

        clock.advance(Duration::seconds(4));
        assert!(!undo.is_live(&token));
        assert_eq!(undo.redo(&token), None);
        assert!(undo.is_empty());
    }

    #[test]
    fn refresh_swaps_record_but_keeps_token_and_expiry() {
        let (mut undo, clock) = manager();
        let token = undo.capture_for_undo(Record::new(1, "Anna", "ann@x.com"));

        assert!(undo.refresh(1, ann()));
        assert!(!undo.refresh(2, ann()));

        clock.advance(Duration::seconds(3));
        assert!(undo.is_live(&token));
        assert_eq!(undo.redo(&token), Some(ann()));
    }

    #[test]
    fn recapture_supersedes_previous_token() {
        let (mut undo, _clock) = manager();
        let first = undo.capture_for_undo(ann());
        let second = undo.capture_for_undo(Record::new(1, "Ann B", "ann@x.com"));

        assert_eq!(undo.len(), 1);
        assert_eq!(undo.redo(&first), None);
        assert_eq!(undo.redo(&second).map(|r| r.name), Some("Ann B".to_string()));
    }

    #[test]
    fn tick_reports_each_expiry_once() {
        let (mut undo, clock) = manager();
        undo.capture_for_undo(ann());
        clock.advance(Duration::seconds(2));
        undo.capture_for_undo(Record::new(2, "Bob", "bob@x.com"));

        clock.advance(Duration::seconds(2));
        let expired = undo.tick();
        assert_eq!(expired, vec![ann()]);
        assert!(undo.tick().is_empty());

        clock.advance(Duration::seconds(5));
        assert_eq!(undo.tick().len(), 1);
        assert!(undo.tick().is_empty());
    }

    #[test]
    fn invalidate_only_drops_matching_token() {
        let (mut undo, _clock) = manager();
        let stale = undo.capture_for_undo(ann());
        let current = undo.capture_for_undo(ann());

        assert!(!undo.invalidate(&stale));
        assert!(undo.is_live(&current));
        assert!(undo.invalidate(&current));
        assert!(!undo.is_live(&current));
    }
}
