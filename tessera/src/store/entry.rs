use crate::key::prefix_end;
use crate::store::Versionstamp;
use std::ops::Bound;

/// A stored entry as returned by reads and scans.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct KvEntry {
    pub key: Vec<u8>,
    pub value: Vec<u8>,
    pub versionstamp: Versionstamp,
}

impl KvEntry {
    pub fn new(key: Vec<u8>, value: Vec<u8>, versionstamp: Versionstamp) -> Self {
        KvEntry {
            key,
            value,
            versionstamp,
        }
    }
}

/// A range of encoded keys.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct KeyRange {
    pub start: Bound<Vec<u8>>,
    pub end: Bound<Vec<u8>>,
}

impl KeyRange {
    pub fn new(start: Bound<Vec<u8>>, end: Bound<Vec<u8>>) -> Self {
        KeyRange { start, end }
    }

    /// Every key that strictly extends `prefix`.
    pub fn prefix(prefix: &[u8]) -> Self {
        KeyRange {
            start: Bound::Excluded(prefix.to_vec()),
            end: Bound::Excluded(prefix_end(prefix)),
        }
    }

    /// True when no key can satisfy both bounds.
    pub fn is_empty(&self) -> bool {
        match (&self.start, &self.end) {
            (Bound::Included(s), Bound::Included(e)) => s > e,
            (Bound::Included(s), Bound::Excluded(e))
            | (Bound::Excluded(s), Bound::Included(e))
            | (Bound::Excluded(s), Bound::Excluded(e)) => s >= e,
            _ => false,
        }
    }

    pub fn contains(&self, key: &[u8]) -> bool {
        let after_start = match &self.start {
            Bound::Included(s) => key >= s.as_slice(),
            Bound::Excluded(s) => key > s.as_slice(),
            Bound::Unbounded => true,
        };
        let before_end = match &self.end {
            Bound::Included(e) => key <= e.as_slice(),
            Bound::Excluded(e) => key < e.as_slice(),
            Bound::Unbounded => true,
        };
        after_start && before_end
    }

    /// Narrows the range so a scan resumes after `cursor` in the given direction.
    ///
    /// A cursor behind the leading bound leaves the range unchanged; one past the trailing
    /// bound empties it.
    pub fn resume_after(&self, cursor: &[u8], reverse: bool) -> KeyRange {
        let mut range = self.clone();
        let bound = Bound::Excluded(cursor.to_vec());
        if reverse {
            let below_end = match &self.end {
                Bound::Included(e) => cursor <= e.as_slice(),
                Bound::Excluded(e) => cursor < e.as_slice(),
                Bound::Unbounded => true,
            };
            if below_end {
                range.end = bound;
            }
        } else {
            let above_start = match &self.start {
                Bound::Included(s) => cursor >= s.as_slice(),
                Bound::Excluded(s) => cursor > s.as_slice(),
                Bound::Unbounded => true,
            };
            if above_start {
                range.start = bound;
            }
        }
        range
    }
}

/// Options of a single store scan call.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ScanOptions {
    pub limit: usize,
    pub reverse: bool,
}

impl ScanOptions {
    pub fn new(limit: usize, reverse: bool) -> Self {
        ScanOptions { limit, reverse }
    }
}

/// One page of a store scan.
///
/// `cursor` is the key of the last entry when the store stopped because of the limit and more
/// entries exist in the range; `None` means the range is exhausted.
#[derive(Clone, Debug, Default)]
pub struct ScanPage {
    pub entries: Vec<KvEntry>,
    pub cursor: Option<Vec<u8>>,
}
