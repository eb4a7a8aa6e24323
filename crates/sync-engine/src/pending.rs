//! Ledger of in-flight mutations.

use chrono::{DateTime, Utc};
use record_store_client::{Record, RecordId};
use std::collections::BTreeMap;
use std::fmt;

/// Kind of mutation awaiting the record service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MutationKind {
    Create,
    Update,
    Delete,
    BulkDelete,
}

impl fmt::Display for MutationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MutationKind::Create => f.write_str("create"),
            MutationKind::Update => f.write_str("update"),
            MutationKind::Delete => f.write_str("delete"),
            MutationKind::BulkDelete => f.write_str("bulk delete"),
        }
    }
}

/// Monotonic mutation sequence number. Higher means submitted later.
pub type MutationSeq = u64;

/// A mutation that has been applied locally but not yet confirmed.
///
/// `before` holds the pre-mutation value of every record the mutation
/// touched. Creates are not applied optimistically and carry nothing.
#[derive(Debug, Clone)]
pub struct PendingMutation {
    pub seq: MutationSeq,
    pub kind: MutationKind,
    pub before: BTreeMap<RecordId, Record>,
    pub submitted_at: DateTime<Utc>,
}

impl PendingMutation {
    pub fn touches(&self, id: RecordId) -> bool {
        self.before.contains_key(&id)
    }
}

/// Pending mutations keyed by sequence number.
#[derive(Debug, Default)]
pub(crate) struct PendingLedger {
    next_seq: MutationSeq,
    entries: BTreeMap<MutationSeq, PendingMutation>,
}

impl PendingLedger {
    pub fn register(
        &mut self,
        kind: MutationKind,
        before: BTreeMap<RecordId, Record>,
        submitted_at: DateTime<Utc>,
    ) -> MutationSeq {
        self.next_seq += 1;
        let seq = self.next_seq;
        self.entries.insert(
            seq,
            PendingMutation {
                seq,
                kind,
                before,
                submitted_at,
            },
        );
        seq
    }

    pub fn take(&mut self, seq: MutationSeq) -> Option<PendingMutation> {
        self.entries.remove(&seq)
    }

    /// The earliest mutation submitted after `seq` that also touches `id`.
    pub fn next_touching(&mut self, seq: MutationSeq, id: RecordId) -> Option<&mut PendingMutation> {
        self.entries
            .range_mut(seq + 1..)
            .map(|(_, mutation)| mutation)
            .find(|mutation| mutation.touches(id))
    }

    pub fn count(&self, kind: MutationKind) -> usize {
        self.entries.values().filter(|m| m.kind == kind).count()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn before(records: &[Record]) -> BTreeMap<RecordId, Record> {
        records.iter().map(|r| (r.id, r.clone())).collect()
    }

    #[test]
    fn sequence_numbers_increase() {
        let mut ledger = PendingLedger::default();
        let a = ledger.register(MutationKind::Create, BTreeMap::new(), Utc::now());
        let b = ledger.register(MutationKind::Create, BTreeMap::new(), Utc::now());
        assert!(b > a);
        assert_eq!(ledger.count(MutationKind::Create), 2);
    }

    #[test]
    fn next_touching_skips_earlier_and_unrelated() {
        let mut ledger = PendingLedger::default();
        let ann = Record::new(1, "Ann", "ann@x.com");
        let bob = Record::new(2, "Bob", "bob@x.com");

        let first = ledger.register(MutationKind::Update, before(&[ann.clone()]), Utc::now());
        ledger.register(MutationKind::Update, before(&[bob]), Utc::now());
        let third = ledger.register(MutationKind::Delete, before(&[ann]), Utc::now());

        assert_eq!(ledger.next_touching(first, 1).map(|m| m.seq), Some(third));
        assert!(ledger.next_touching(third, 1).is_none());
    }

    #[test]
    fn take_removes_entry() {
        let mut ledger = PendingLedger::default();
        let seq = ledger.register(MutationKind::Update, BTreeMap::new(), Utc::now());
        assert!(ledger.take(seq).is_some());
        assert!(ledger.take(seq).is_none());
        assert_eq!(ledger.len(), 0);
    }
}
