//! # Range Scans
//!
//! A scan streams the record ids of every key in `low <low_op> key
//! <high_op> high`, in key order, one per `scan_next` call.
//!
//! ## Lifecycle
//!
//! ```text
//! start_scan:  validate operators and range, descend to the leaf that
//!              would hold the low bound, binary-search the starting slot
//! scan_next:   return the rid at the cursor and advance; hop to the right
//!              sibling when the current leaf is exhausted; fail with
//!              ScanExhausted once past the high bound or the last leaf
//! end_scan:    drop the scan state
//! ```
//!
//! The cursor holds the current leaf's page number, not a pin: each
//! `scan_next` re-pins the leaf for the duration of the call, so no page
//! stays pinned between public operations. Exhaustion keeps the state in
//! place, so further `scan_next` calls keep reporting `ScanExhausted`
//! until `end_scan` or a new `start_scan`.

use eyre::Result;

use crate::config::INVALID_PAGE_NO;
use crate::error::IndexError;
use crate::types::{Operator, RecordId};

use super::leaf::LeafNode;
use super::tree::BTreeIndex;

#[derive(Debug, Clone, Copy)]
pub(crate) struct ScanState {
    low: i32,
    low_op: Operator,
    high: i32,
    high_op: Operator,
    current_page: u32,
    next_entry: usize,
}

impl ScanState {
    fn low_satisfied(&self, key: i32) -> bool {
        match self.low_op {
            Operator::Gt => key > self.low,
            Operator::Ge => key >= self.low,
            _ => false,
        }
    }

    fn high_satisfied(&self, key: i32) -> bool {
        match self.high_op {
            Operator::Lt => key < self.high,
            Operator::Le => key <= self.high,
            _ => false,
        }
    }
}

enum Step {
    Entry(i32, RecordId),
    Advance(u32),
    Exhausted,
}

impl BTreeIndex {
    /// Begins a range scan. The low bound takes `Gt` or `Ge`, the high
    /// bound `Lt` or `Le`; anything else is `InvalidScanOperators`, and a
    /// low bound above the high bound is `InvalidScanRange`. A scan
    /// already in progress is ended implicitly.
    ///
    /// Inserting while a scan is open leaves the scan's position
    /// unspecified; finish the scan first.
    pub fn start_scan(
        &mut self,
        low: i32,
        low_op: Operator,
        high: i32,
        high_op: Operator,
    ) -> Result<()> {
        let low_ok = matches!(low_op, Operator::Gt | Operator::Ge);
        let high_ok = matches!(high_op, Operator::Lt | Operator::Le);
        if !low_ok || !high_ok {
            return Err(IndexError::InvalidScanOperators.into());
        }

        self.scan = None;

        if low > high {
            return Err(IndexError::InvalidScanRange.into());
        }

        let (leaf_no, _) = self.descend_to_leaf(low)?;

        let next_entry = {
            let guard = self.pool.fetch(&self.file, leaf_no)?;
            let leaf = LeafNode::from_page(guard.data())?;
            if low_op == Operator::Gt {
                leaf.upper_bound(low)?
            } else {
                leaf.lower_bound(low)?
            }
        };

        self.scan = Some(ScanState {
            low,
            low_op,
            high,
            high_op,
            current_page: leaf_no,
            next_entry,
        });

        Ok(())
    }

    /// Returns the next record id in the range, or `ScanNotInitialized` /
    /// `ScanExhausted`.
    pub fn scan_next(&mut self) -> Result<RecordId> {
        let scan = match self.scan.as_mut() {
            Some(scan) => scan,
            None => return Err(IndexError::ScanNotInitialized.into()),
        };

        loop {
            let step = {
                let guard = self.pool.fetch(&self.file, scan.current_page)?;
                let leaf = LeafNode::from_page(guard.data())?;

                if scan.next_entry < leaf.entry_count() as usize {
                    let entry = leaf.entry_at(scan.next_entry)?;
                    Step::Entry(entry.key(), entry.rid())
                } else if leaf.next_leaf() != INVALID_PAGE_NO {
                    Step::Advance(leaf.next_leaf())
                } else {
                    Step::Exhausted
                }
            };

            match step {
                Step::Exhausted => return Err(IndexError::ScanExhausted.into()),
                Step::Advance(next) => {
                    scan.current_page = next;
                    scan.next_entry = 0;
                }
                Step::Entry(key, rid) => {
                    if !scan.high_satisfied(key) {
                        return Err(IndexError::ScanExhausted.into());
                    }
                    debug_assert!(
                        scan.low_satisfied(key),
                        "scan positioned before its low bound"
                    );
                    scan.next_entry += 1;
                    return Ok(rid);
                }
            }
        }
    }

    /// Ends the scan; `ScanNotInitialized` if none is in progress.
    pub fn end_scan(&mut self) -> Result<()> {
        if self.scan.take().is_none() {
            return Err(IndexError::ScanNotInitialized.into());
        }
        Ok(())
    }
}
